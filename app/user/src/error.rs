use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::response::{IntoResponse, Json};
use http::StatusCode;
use thiserror::Error;
use tracing::error;

use crate::service::response::{ErrCode, Response};

pub const USER_NOT_FOUND_MSG: &str = "User not found in the database";

#[derive(Error, Debug, Clone)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Invalid user data: {0}")]
    InvalidData(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl UserError {
    pub fn status(&self) -> StatusCode {
        match self {
            UserError::NotFound(_) => StatusCode::NOT_FOUND,
            UserError::InvalidData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            UserError::DatabaseError(_) | UserError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body: Response<()> = match &self {
            UserError::NotFound(_) => Response::failed(ErrCode::NotFound, Some(USER_NOT_FOUND_MSG)),
            UserError::InvalidData(msg) => Response::failed(ErrCode::ValidationError, Some(msg)),
            UserError::DatabaseError(_) => {
                error!("storage failure: {}", self);
                Response::failed(ErrCode::DatabaseError, None::<String>)
            }
            UserError::InternalError(_) => {
                error!("internal failure: {}", self);
                Response::failed(ErrCode::InternalServerError, None::<String>)
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        UserError::DatabaseError(err.to_string())
    }
}

impl From<std::io::Error> for UserError {
    fn from(err: std::io::Error) -> Self {
        UserError::InternalError(err.to_string())
    }
}

impl From<JsonRejection> for UserError {
    fn from(rejection: JsonRejection) -> Self {
        UserError::InvalidData(rejection.body_text())
    }
}

impl From<PathRejection> for UserError {
    fn from(rejection: PathRejection) -> Self {
        UserError::InvalidData(rejection.body_text())
    }
}
