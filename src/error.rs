use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::codec::CryptoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("resource not found")]
    NotFound,
    #[error("credential codec failure: {0}")]
    Crypto(#[from] CryptoError),
    #[error("database error: {0}")]
    Database(sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("insufficient role")]
    Forbidden,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict(db.message().to_string())
            }
            _ => AppError::Database(err),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Crypto(_) | AppError::Database(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Crypto(e) => {
                tracing::error!(error = %e, "credential codec failure");
                "Credential processing failed".to_string()
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                "Database error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                "Internal error".to_string()
            }
            AppError::NotFound => "Resource not found".to_string(),
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::Forbidden => "Insufficient role".to_string(),
            AppError::Conflict(m) | AppError::BadRequest(m) => m.clone(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
