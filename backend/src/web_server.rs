use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    debug_handler,
    extract::State,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    routing::post,
    Json, Router,
};
use common::{ImageStatus, ImagesResponse, MessageResponse, ProfileResponse, UsersResponse};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::store::RecordStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub config: AppConfig,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        get_profile,
        delete_account,
        get_all_users,
        get_pending_images,
    ),
    components(schemas(
        common::Credentials,
        common::LoginResponse,
        common::UserDto,
        common::ImageDto,
        common::ImageOwner,
        common::ImageStatus,
        common::ProfileResponse,
        common::ImagesResponse,
        common::UsersResponse,
        common::MessageResponse,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn run_server(app_state: AppState) {
    let addr: SocketAddr = format!(
        "{}:{}",
        app_state.config.web.addr, app_state.config.web.port
    )
    .parse()
    .expect("Invalid web.addr / web.port configuration");

    let app = create_router(app_state);
    tracing::info!("Serving API at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app.into_make_service()).await.unwrap();
}

pub fn create_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            app_state
                .config
                .web
                .cors_origin
                .parse::<HeaderValue>()
                .expect("Invalid cors_origin configuration"),
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let account_routes = Router::new()
        .route("/profile", get(get_profile).delete(delete_account))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::auth_middleware,
        ));

    // Innermost layer first: auth resolves the caller, then the admin check
    // reads the attached role.
    let admin_routes = Router::new()
        .route("/admin/users", get(get_all_users))
        .route("/admin/images/pending", get(get_pending_images))
        .route_layer(middleware::from_fn(auth::require_admin))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .nest("/api/v1", auth_routes.merge(account_routes).merge(admin_routes))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

// --- API Handlers ---

/// ## Current account's profile
/// Echoes the authenticated identity. No store access happens here.
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The authenticated account", body = ProfileResponse),
        (status = 401, description = "Authentication required"),
    )
)]
async fn get_profile(user: AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse { user: user.into() })
}

/// ## Delete the caller's account
/// Removes exactly the account the token belongs to. Deleting an account
/// that is already gone still reports success.
#[utoipa::path(
    delete,
    path = "/api/v1/profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account deleted", body = MessageResponse),
        (status = 401, description = "Authentication required"),
    )
)]
#[debug_handler]
async fn delete_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    tracing::info!("Deleting account with id: {}", user.id);

    // Prior contents are returned by the store but not part of the response.
    let _prior = state.store.delete_user_by_id(user.id).await?;

    Ok(Json(MessageResponse {
        message: "User Deleted!".to_string(),
    }))
}

/// ## List all accounts (admin)
/// Passwords are projected away by the store; the wire type has no such
/// field to begin with.
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All accounts, password-free", body = UsersResponse),
        (status = 403, description = "Admin access required"),
    )
)]
#[debug_handler]
async fn get_all_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, AppError> {
    tracing::info!("Listing all user accounts");

    let users = state.store.find_all_users().await?;

    Ok(Json(UsersResponse { users }))
}

/// ## List images awaiting review (admin)
/// Each image carries its owner expanded to an email. A failed query is a
/// failed response: an empty list is never substituted for a broken store.
#[utoipa::path(
    get,
    path = "/api/v1/admin/images/pending",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending images with their owners", body = ImagesResponse),
        (status = 403, description = "Admin access required"),
    )
)]
#[debug_handler]
async fn get_pending_images(
    State(state): State<AppState>,
) -> Result<Json<ImagesResponse>, AppError> {
    tracing::info!("Listing pending images for review");

    let images = state.store.find_images_by_status(ImageStatus::Pending).await?;

    Ok(Json(ImagesResponse { images }))
}
