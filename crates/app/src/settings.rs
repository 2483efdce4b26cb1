//! Handles settings for the application. Configuration is read from
//! `settings.toml` (optional) and overridden by `HYPERBANK__*` environment
//! variables, e.g. `HYPERBANK__SERVER__PORT=8080`.
//!
//! ```toml
//! [app]
//! level = "debug"
//!
//! [server]
//! port = 3000
//! database = { sqlite = "hyperbank.db" }
//! token_secret = "change-me"
//! public_url = "http://127.0.0.1:3000"
//!
//! [scheduler]
//! interval_secs = 30
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    pub token_secret: String,
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
    /// Prefix of the links sent in verification emails.
    #[serde(default)]
    pub public_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Scheduler {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Option<Server>,
    #[serde(default)]
    pub scheduler: Scheduler,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_token_ttl_minutes() -> i64 {
    60
}

fn default_interval_secs() -> u64 {
    60
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(
                    Environment::with_prefix("HYPERBANK")
                        .separator("__")
                        .try_parsing(true),
                )
                .build()?,
        )
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }
}
