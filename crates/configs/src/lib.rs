//! # configs
//!
//! Layered runtime settings: built-in defaults, then an optional TOML file,
//! then `CARS__*` environment variables (a `.env` file is loaded first).

use std::path::PathBuf;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Env var naming the config file (without extension is fine).
pub const CONFIG_PATH_VAR: &str = "CARS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/default";
const ENV_PREFIX: &str = "CARS";
const DEFAULT_SESSION_SALT: &str = "insecure-development-salt";
/// Ten years.
pub const MAX_SESSION_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub session: SessionSettings,
    /// Default `env_logger` filter when `RUST_LOG` is unset
    pub log_level: String,
    /// `.env` file that was read, if any
    #[serde(skip)]
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`
    pub static_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: SecretString,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    /// Mixed into stored session-token digests
    pub session_salt: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub ttl_secs: i64,
    pub secure_cookie: bool,
}

impl Settings {
    /// Reads `.env`, then the file named by `CARS_CONFIG` (or `config/default`), then the environment.
    /// Nothing is logged here; callers report [`Settings::startup_notes`] once a logger is installed.
    pub fn load() -> Result<Self, ConfigError> {
        let env_file = dotenvy::dotenv().ok();
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut settings = Self::build(Some(&path), Environment::with_prefix(ENV_PREFIX).separator("__"))?;
        settings.env_file = env_file;
        Ok(settings)
    }

    /// Things worth telling the operator about the loaded configuration.
    pub fn startup_notes(&self) -> Vec<(log::Level, String)> {
        let mut notes = Vec::new();
        if let Some(path) = &self.env_file {
            notes.push((log::Level::Debug, format!("loaded environment from {}", path.display())));
        }
        if self.auth.session_salt.expose_secret() == DEFAULT_SESSION_SALT {
            notes.push((
                log::Level::Warn,
                "auth.session_salt is the development default; set CARS__AUTH__SESSION_SALT".to_string(),
            ));
        }
        notes
    }

    fn build(file: Option<&str>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.static_dir", "./static")?
            .set_default("database.url", "sqlite:car_management.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.session_salt", DEFAULT_SESSION_SALT)?
            .set_default("session.cookie_name", "sessionid")?
            .set_default("session.ttl_secs", 60 * 60 * 24 * 14)?
            .set_default("session.secure_cookie", false)?
            .set_default("log_level", "info")?;

        if let Some(path) = file {
            builder = builder.add_source(File::with_name(path).required(false));
        }

        let settings: Settings = builder
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.session.ttl_secs <= 0 {
            return Err(ConfigError::Invalid("session.ttl_secs must be positive".into()));
        }
        if self.session.ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(ConfigError::Invalid(format!(
                "session.ttl_secs must not exceed {MAX_SESSION_TTL_SECS}"
            )));
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::Invalid("session.cookie_name must not be empty".into()));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("database.max_connections must be at least 1".into()));
        }
        Ok(())
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}
