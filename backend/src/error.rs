use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Authentication error")]
    Password(#[from] bcrypt::BcryptError),

    #[error("{0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),
}

// The fault boundary: every error becomes a JSON body here, and nowhere
// below. Store failures keep their message untransformed.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::Store(e) => {
                tracing::error!("Store operation failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::Jwt(e) => {
                tracing::warn!("JWT error: {}", e);
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string())
            }
            AppError::Password(e) => {
                tracing::warn!("Password error: {}", e);
                (StatusCode::UNAUTHORIZED, "Invalid password".to_string())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Admin access required".to_string()),
            AppError::Validation(errors) => {
                let message = format!("Input validation failed: {errors}").replace('\n', ", ");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": message, "details": errors })),
                )
                    .into_response();
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
