use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::response::Json;
use http::StatusCode;
use tracing::instrument;

use super::response::Response;
use crate::biz::{User, UserInput, UserRepo, UserUseCase};
use crate::error::UserError;

type PathId = Result<Path<i64>, PathRejection>;
type InputBody = Result<Json<UserInput>, JsonRejection>;

/// HTTP 适配层: 提取并校验请求, 调用用例, 决定状态码
///
/// 提取失败在进入用例之前就转成 422
#[derive(Debug)]
pub struct UserService<R: UserRepo> {
    uuc: Arc<UserUseCase<R>>,
}

impl<R: UserRepo> UserService<R> {
    pub fn new(uuc: Arc<UserUseCase<R>>) -> Self {
        Self { uuc }
    }

    #[instrument(skip(self, payload), fields(operation = "create_user"))]
    pub async fn create_user(
        &self,
        payload: InputBody,
    ) -> Result<(StatusCode, Json<User>), UserError> {
        let Json(input) = payload?;
        let user = self.uuc.create(input).await?;
        Ok((StatusCode::CREATED, Json(user)))
    }

    #[instrument(skip(self), fields(operation = "list_users"))]
    pub async fn list_users(&self) -> Result<Json<Vec<User>>, UserError> {
        Ok(Json(self.uuc.list_all().await?))
    }

    #[instrument(skip(self, path), fields(operation = "get_user"))]
    pub async fn get_user(&self, path: PathId) -> Result<Json<User>, UserError> {
        let Path(id) = path?;
        Ok(Json(self.uuc.get_by_id(id).await?))
    }

    #[instrument(skip(self, path, payload), fields(operation = "update_user"))]
    pub async fn update_user(
        &self,
        path: PathId,
        payload: InputBody,
    ) -> Result<Json<User>, UserError> {
        let Path(id) = path?;
        let Json(input) = payload?;
        Ok(Json(self.uuc.update(id, input).await?))
    }

    #[instrument(skip(self, path), fields(operation = "delete_user"))]
    pub async fn delete_user(&self, path: PathId) -> Result<StatusCode, UserError> {
        let Path(id) = path?;
        self.uuc.delete(id).await?;
        Ok(StatusCode::NO_CONTENT)
    }
}

/// 健康检查端点
pub async fn health_check() -> Json<Response<serde_json::Value>> {
    Json(Response::success(Some(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "user-service",
        "version": env!("CARGO_PKG_VERSION")
    }))))
}
