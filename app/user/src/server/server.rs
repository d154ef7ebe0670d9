/*
 * @Descriptiono
 * http server: 绑定端口, 组装路由, 支持优雅关闭
*/

use std::sync::Arc;

use shared::config::ServerConfig;
use tracing::info;

use crate::biz::{UserRepo, UserUseCase};
use crate::service::UserService;
use crate::{error::UserError, Result};

pub struct HttpServer<R: UserRepo> {
    pub cfg: Arc<ServerConfig>,
    pub user_service: Arc<UserService<R>>,
}

impl<R: UserRepo + 'static> HttpServer<R> {
    pub fn new(cfg: Arc<ServerConfig>, uuc: Arc<UserUseCase<R>>) -> Self {
        let user_service = Arc::new(UserService::new(uuc));
        Self { cfg, user_service }
    }

    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(self.cfg.bind_addr()).await?;
        info!("Server is running on {}", listener.local_addr()?);

        let app = self.create_router();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| UserError::InternalError(e.to_string()))?;

        Ok(())
    }
}
