use crate::{error::AppError, web_server::AppState};
use axum::{extract::FromRequestParts, http::request::Parts};
use common::UserDto;
use serde::Serialize;

/// The authenticated caller, resolved by the auth middleware before any
/// handler runs. Serializes to exactly `{ id, email }` and nothing else.
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

impl From<AuthUser> for UserDto {
    fn from(user: AuthUser) -> Self {
        UserDto {
            id: user.id,
            email: user.email,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // The middleware is responsible for putting AuthUser in extensions.
        // If it's not there, that's a 500, not a 401: the route was wired
        // without the auth layer.
        let user = parts.extensions.get::<AuthUser>().ok_or_else(|| {
            AppError::InternalServerError(
                "AuthUser not found in request extensions. Is the auth middleware missing?".into(),
            )
        })?;

        Ok(user.clone())
    }
}
