use crate::utils::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_URL: &str = "https://tiny-random-concert-default-rtdb.firebaseio.com";

pub const ENV_DATABASE_URL: &str = "CONCERTDB_DATABASE_URL";
pub const ENV_AUTH_TOKEN: &str = "FIREBASE_AUTH_TOKEN";
pub const ENV_AUTH_UID: &str = "FIREBASE_AUTH_UID";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
    /// Database secret or ID token, sent as the `auth` query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Uid the rules engine sees, sent as `auth_variable_override`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_uid: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                auth_token: None,
                auth_uid: None,
                timeout_secs: default_timeout_secs(),
            },
        }
    }
}

impl Config {
    /// Load the file (or defaults when it does not exist), apply `.env` and
    /// process environment overrides, then validate.
    pub fn load_custom(config_path: &Path) -> AppResult<Self> {
        let mut config = Self::load_file(config_path)?;

        if let Some(warning) = dotenv_warning(&dotenvy::dotenv()) {
            tracing::warn!("{}", warning);
        }
        config.apply_env(|key| std::env::var(key).ok());

        config.validate()?;
        Ok(config)
    }

    /// File values only, without environment overrides or validation
    pub fn load_file(config_path: &Path) -> AppResult<Self> {
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "config file not found, using defaults");
            return Ok(Config::default());
        }

        let content =
            std::fs::read_to_string(config_path).map_err(|e| AppError::Io(e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Override file values with whatever `lookup` yields. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_DATABASE_URL) {
            self.database.url = url;
        }
        if let Some(token) = non_empty(ENV_AUTH_TOKEN) {
            self.database.auth_token = Some(token);
        }
        if let Some(uid) = non_empty(ENV_AUTH_UID) {
            self.database.auth_uid = Some(uid);
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        let url = self.database.url.trim();
        if url.is_empty() {
            return Err(AppError::Config("Database URL cannot be empty".to_string()));
        }

        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(AppError::Config(format!(
                "Database URL must start with http:// or https://, got '{}'",
                url
            )));
        }

        if self.database.timeout_secs == 0 {
            return Err(AppError::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Io(e.to_string()))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::System(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content).map_err(|e| AppError::Io(e.to_string()))?;

        Ok(())
    }

    pub fn config_file_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("concertdb")
            .join("config.toml")
    }
}

/// A missing `.env` is normal; anything else is worth a warning
fn dotenv_warning(result: &Result<PathBuf, dotenvy::Error>) -> Option<String> {
    match result {
        Err(e) if !e.not_found() => Some(format!("Failed to load .env file: {}", e)),
        _ => None,
    }
}
