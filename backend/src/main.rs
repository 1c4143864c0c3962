use std::str::FromStr;
use std::sync::Arc;

use backend::config::AppConfig;
use backend::db::DbPoolOptions;
use backend::sql_store::SqlStore;
use backend::web_server::{run_server, AppState};
use sqlx::sqlite::SqliteConnectOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::filter::LevelFilter::INFO)
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Foreign keys are off by default in SQLite; the image rows cascade on
    // account deletion only with them enabled.
    let connect_options = SqliteConnectOptions::from_str(&config.database.url)
        .expect("Invalid database URL")
        .create_if_missing(true)
        .foreign_keys(true);

    let db_pool = DbPoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
        .expect("Failed to connect to the database");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations complete.");

    let app_state = AppState {
        store: Arc::new(SqlStore::new(db_pool)),
        config,
    };

    tracing::info!("Initializing server...");
    run_server(app_state).await;
}
