//! Settings for the admin tool.
//!
//! Read from an optional `saldo.toml` in the working directory, then from
//! `SALDO__*` environment variables (`SALDO__DATABASE__URL`,
//! `SALDO__LOG__LEVEL`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./saldo.db?mode=rwc";

#[derive(Debug, Deserialize)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub log: Log,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("database.url", DEFAULT_DATABASE_URL)?
            .set_default("log.level", "info")?
            .add_source(File::with_name("saldo").required(false))
            .add_source(Environment::with_prefix("SALDO").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
