// Aliases so the rest of the crate stays agnostic of the concrete driver.
pub use sqlx::sqlite::{Sqlite as Db, SqlitePool as DbPool, SqlitePoolOptions as DbPoolOptions};
