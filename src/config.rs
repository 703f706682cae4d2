// src/config.rs
//
// TOML configuration loading. Mirrors the original `config.py` module's
// shape (myems_system_db / myems_historical_db / myems_mqtt_broker /
// periods) without inventing fields the core never reads.

use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl DbConfig {
    /// Build a libpq-style connection string for tokio-postgres.
    pub fn to_connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            self.host, self.port, self.database, self.username, self.password
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttBrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Periods {
    pub save_to_database: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub myems_system_db: DbConfig,
    pub myems_historical_db: DbConfig,
    pub myems_mqtt_broker: MqttBrokerConfig,
    pub periods: Periods,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }
}
