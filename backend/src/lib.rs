// Entry point for the `backend` library. Modules are public so the
// integration tests can drive the router and the store directly.
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod sql_store;
pub mod store;
pub mod web_server;
