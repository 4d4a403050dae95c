//! Configuration structures and loading.
//!
//! Precedence: built-in defaults, then the YAML file (when present), then
//! environment variables. The JWT secret has a default only so development
//! setups boot; deployments are expected to override it.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_yaml2 as serde_yaml;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use models::{AppError, AppResult};

use crate::auth::AuthConfig;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATA_PATH: &str = "./data/obstetra";
const DEFAULT_PYTHON_BIN: &str = "python3";
const DEFAULT_ML_SCRIPT: &str = "./ml_service/ml_model.py";
const DEFAULT_ML_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_EXPIRY_DAYS: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub data_path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_expiry_days: i64,
    pub secure_cookies: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me".to_string(),
            token_expiry_days: DEFAULT_TOKEN_EXPIRY_DAYS,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionSettings {
    pub python_bin: String,
    pub script_path: PathBuf,
    pub timeout_secs: u64,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            python_bin: DEFAULT_PYTHON_BIN.to_string(),
            script_path: PathBuf::from(DEFAULT_ML_SCRIPT),
            timeout_secs: DEFAULT_ML_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
    pub prediction: PredictionSettings,
}

impl AppConfig {
    /// Loads the config file when it exists, then applies env overrides.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path)?;
                let parsed: AppConfig = serde_yaml::from_str(&raw).map_err(|e| {
                    AppError::Internal(format!("Configuration error: {}", e))
                })?;
                info!("[CONFIG] Loaded configuration from {:?}", path);
                parsed
            }
            Some(path) => {
                warn!("[CONFIG] Config file {:?} not found, using defaults", path);
                AppConfig::default()
            }
            None => AppConfig::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("[CONFIG] Ignoring unparsable PORT value '{}'", port),
            }
        }
        if let Ok(path) = env::var("DATA_PATH") {
            self.storage.data_path = PathBuf::from(path);
        }
        if let Ok(secret) = env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(days) = env::var("JWT_EXPIRES_DAYS") {
            if let Ok(days) = days.parse() {
                self.auth.token_expiry_days = days;
            }
        }
        if let Ok(flag) = env::var("COOKIE_SECURE") {
            match flag.parse() {
                Ok(flag) => self.auth.secure_cookies = flag,
                Err(_) => warn!("[CONFIG] Ignoring unparsable COOKIE_SECURE value '{}'", flag),
            }
        }
        if let Ok(bin) = env::var("PYTHON_BIN") {
            self.prediction.python_bin = bin;
        }
        if let Ok(script) = env::var("ML_SCRIPT_PATH") {
            self.prediction.script_path = PathBuf::from(script);
        }
        if let Ok(secs) = env::var("ML_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                self.prediction.timeout_secs = secs;
            }
        }
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.auth.jwt_secret.clone(),
            token_expiry_days: self.auth.token_expiry_days,
            secure_cookies: self.auth.secure_cookies,
        }
    }

    pub fn prediction_timeout(&self) -> Duration {
        Duration::from_secs(self.prediction.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_fill_defaults_for_partial_yaml() {
        let yaml = "server:\n  port: 8080\nauth:\n  jwt_secret: topsecret\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.auth.jwt_secret, "topsecret");
        assert_eq!(config.auth.token_expiry_days, 30);
        assert!(!config.auth.secure_cookies);
        assert_eq!(config.prediction.python_bin, "python3");
    }

    #[test]
    fn should_apply_host_env_override() {
        env::set_var("HOST", "127.0.0.1");
        let config = AppConfig::load(None).unwrap();
        env::remove_var("HOST");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn should_default_everything_without_a_file() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.prediction.timeout_secs, DEFAULT_ML_TIMEOUT_SECS);
        assert_eq!(config.storage.data_path, PathBuf::from(DEFAULT_DATA_PATH));
    }
}
