use std::sync::Arc;

use anyhow::{Context, Result};
use shared::config::ServerConfig;
use shared::TracingConfig;
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use user::biz::UserUseCase;
use user::data::{self, SqliteUserRepo};
use user::server::HttpServer;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 初始化环境变量
    shared::init_env();

    // 2. 加载配置, DATABASE_URL 为空直接退出
    let cfg = ServerConfig::load().context("Failed to load configuration")?;

    // 3. 初始化 tracing
    let tracing_cleanup =
        shared::init_tracing_with_config(TracingConfig::default().with_debug(cfg.debug))?;

    info!(
        addr = %cfg.bind_addr(),
        api_prefix = %cfg.route_prefix(),
        "User HTTP Server starting..."
    );

    // 4. 设置优雅关闭
    let cancel_token = CancellationToken::new();
    let signal_cancel_token = cancel_token.clone();
    let shutdown_future = cancel_token.cancelled_owned();

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, initiating graceful shutdown...");
        signal_cancel_token.cancel();
    });

    // 5. 构建主应用服务器
    let (app, pool) = init_app(cfg).await?;

    // 6. 启动主服务器
    let server_result = app.run_with_shutdown(shutdown_future).await;

    // 7. 清理资源
    info!("Cleaning up resources...");
    pool.close().await;
    tracing_cleanup.cleanup();

    if let Err(e) = server_result {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("User HTTP Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received CTRL+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}

async fn init_app(cfg: ServerConfig) -> Result<(HttpServer<SqliteUserRepo>, SqlitePool)> {
    // data
    let pool = data::connect(&cfg)
        .await
        .context("Failed to connect to database")?;
    let user_repo = SqliteUserRepo::new(pool.clone());
    user_repo.ensure_schema().await?;

    // biz
    let user_uc = Arc::new(UserUseCase::new(Arc::new(user_repo)));

    let server = HttpServer::new(Arc::new(cfg), user_uc);

    Ok((server, pool))
}
