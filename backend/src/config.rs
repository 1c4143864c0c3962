use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use dotenvy::dotenv;

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub addr: String,
    pub port: u16,
    pub cors_origin: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub web: WebConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, figment::Error> {
        dotenv().ok();

        // Config.toml carries non-sensitive defaults; anything can be
        // overridden via e.g. APP_JWT__SECRET or APP_DATABASE__URL.
        let config: Self = Figment::new()
            .merge(Toml::file("Config.toml"))
            .merge(Env::prefixed("APP_").split("__"))
            .extract()?;

        tracing::info!(
            "Configuration loaded: serving on {}:{}",
            config.web.addr,
            config.web.port
        );

        Ok(config)
    }
}
