use axum::{extract::State, http::StatusCode, Json};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use common::{Credentials, LoginResponse};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::config::JwtConfig;
use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::web_server::AppState;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub exp: usize,  // Expiration time
}

/// Caller role, attached to the request next to `AuthUser` so the admin
/// route layer can check it without another store read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

fn issue_access_token(user_id: i64, jwt: &JwtConfig) -> Result<String, AppError> {
    let exp =
        (Utc::now() + Duration::minutes(jwt.access_token_expires_minutes)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_ref()),
    )?;
    Ok(token)
}

// --- API Handlers ---

/// ## Register a new user
/// Takes email and password, hashes the password, and stores the account.
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = Credentials,
    responses(
        (status = 201, description = "User created successfully"),
        (status = 409, description = "User with this email already exists"),
        (status = 400, description = "Invalid data provided"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;

    tracing::info!("Registering user with email: {}", &payload.email);
    if state
        .store
        .find_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "User with this email already exists".to_string(),
        ));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        AppError::InternalServerError("Password hashing error".to_string())
    })?;

    state
        .store
        .create_user(&payload.email, &password_hash)
        .await?;

    Ok(StatusCode::CREATED)
}

/// ## Login an existing user
/// Takes email and password, verifies them, and returns a JWT if successful.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = Credentials,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    tracing::info!("Logging in user with email: {}", &payload.email);
    let user = state
        .store
        .find_user_by_email(&payload.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let token = issue_access_token(user.id, &state.config.jwt)?;

    Ok(Json(LoginResponse { token }))
}

// --- Middleware ---

pub async fn auth_middleware(
    State(state): State<AppState>,
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = auth_header
        .ok_or(AppError::Unauthorized)?
        .token()
        .to_owned();

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.config.jwt.secret.as_ref()),
        &validation,
    )
    .map_err(|_| AppError::Unauthorized)?;

    let user_id: i64 = token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::InternalServerError("Invalid user ID in token".to_string()))?;

    // A token can outlive its account; a deleted user's token must not pass.
    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let role = if user.is_admin { Role::Admin } else { Role::User };

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        email: user.email,
    });
    request.extensions_mut().insert(role);

    Ok(next.run(request).await)
}

/// Layered after `auth_middleware` on admin routes.
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    match request.extensions().get::<Role>() {
        Some(Role::Admin) => Ok(next.run(request).await),
        Some(Role::User) => Err(AppError::Forbidden),
        None => Err(AppError::InternalServerError(
            "Role not found in request extensions. Is the auth middleware missing?".into(),
        )),
    }
}
