// backend/tests/helpers.rs
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use backend::config::{AppConfig, DatabaseConfig, JwtConfig, WebConfig};
use backend::sql_store::SqlStore;
use backend::web_server::AppState;
use common::{Credentials, LoginResponse};
use reqwest::StatusCode;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::net::TcpListener;

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Spawn the app against an in-memory database and return the address, a
/// client and the pool (for seeding rows directly).
pub async fn spawn_app() -> (SocketAddr, reqwest::Client, SqlitePool) {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    // A single connection keeps the in-memory schema alive for the whole
    // test; foreign keys are needed for the image cascade.
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .expect("Failed to create in-memory database pool.");

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run migrations on test database.");

    let config = AppConfig {
        web: WebConfig {
            addr: "127.0.0.1".to_string(),
            port: addr.port(),
            cors_origin: "http://localhost:5173".to_string(),
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expires_minutes: 15,
        },
    };

    let app_state = AppState {
        store: Arc::new(SqlStore::new(db_pool.clone())),
        config,
    };

    let app = backend::web_server::create_router(app_state);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    (addr, client, db_pool)
}

/// Register and login a user, returning the access token.
pub async fn register_and_login(
    addr: &SocketAddr,
    client: &reqwest::Client,
    email: &str,
) -> String {
    let credentials = Credentials {
        email: email.to_string(),
        password: "password123".to_string(),
    };

    let response = client
        .post(format!("http://{addr}/api/v1/register"))
        .json(&credentials)
        .send()
        .await
        .expect("Failed to register user");
    assert_eq!(response.status(), StatusCode::CREATED, "Registration failed");

    let response = client
        .post(format!("http://{addr}/api/v1/login"))
        .json(&credentials)
        .send()
        .await
        .expect("Failed to login user");
    assert_eq!(response.status(), StatusCode::OK, "Login failed");

    let login_response: LoginResponse = response
        .json()
        .await
        .expect("Failed to parse login response");

    login_response.token
}

/// Flip the admin flag on an already-registered account.
pub async fn promote_to_admin(db_pool: &SqlitePool, email: &str) {
    sqlx::query("UPDATE users SET is_admin = TRUE WHERE email = ?")
        .bind(email)
        .execute(db_pool)
        .await
        .expect("Failed to promote user to admin");
}

/// Seed an image row owned by the account with `email`.
pub async fn seed_image(db_pool: &SqlitePool, email: &str, file_name: &str, status: &str) {
    sqlx::query(
        "INSERT INTO images (file_name, status, user_id)
         SELECT ?, ?, id FROM users WHERE email = ?",
    )
    .bind(file_name)
    .bind(status)
    .bind(email)
    .execute(db_pool)
    .await
    .expect("Failed to seed image");
}
