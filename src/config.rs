//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `--config <path>` or `$XDG_CONFIG_HOME/hvac-stability/config.toml`
//! 3. Environment variables: `KUMO_*` prefix
//!
//! Settings are built once in `main` and handed to every service; nothing
//! reads configuration from global state.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;
use crate::infrastructure::kumo::DEFAULT_CLOUD_URL;

/// Default directory for credentials and device overrides.
pub const DEFAULT_DATA_PATH: &str = "~/.local/var/hvac_stability/";

/// Default bound on every cloud request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Environment variable prefix (`KUMO_DATA_PATH`, `KUMO_AUTH_USERNAME`, ...).
pub const ENV_PREFIX: &str = "KUMO";

const CREDENTIALS_FILE: &str = ".credentials";
const DEVICES_FILE: &str = "devices.json";

/// Raw settings for intermediate parsing of the config file.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_path: Option<PathBuf>,
    pub cloud_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Unified configuration for hvac-stability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding `.credentials` and `devices.json`
    pub data_path: PathBuf,
    /// Kumo Cloud base URL
    pub cloud_url: String,
    /// Timeout for each cloud request
    pub request_timeout_secs: u64,
    /// Username from `KUMO_AUTH_USERNAME`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_username: Option<String>,
    /// Password from `KUMO_AUTH_PASSWORD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_password: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            cloud_url: DEFAULT_CLOUD_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            auth_username: None,
            auth_password: None,
        }
    }
}

/// Get the XDG config directory for hvac-stability.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hvac-stability").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Path of the obfuscated credentials file.
    pub fn credentials_file(&self) -> PathBuf {
        self.data_path.join(CREDENTIALS_FILE)
    }

    /// Path of the device overrides file.
    pub fn devices_file(&self) -> PathBuf {
        self.data_path.join(DEVICES_FILE)
    }

    /// Both `KUMO_AUTH_USERNAME` and `KUMO_AUTH_PASSWORD` set.
    pub fn env_credentials(&self) -> Option<(&str, &str)> {
        match (&self.auth_username, &self.auth_password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }

    /// Expand `~`, `$VAR` and `${VAR}` in the data path.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.data_path.to_string_lossy().as_ref());
        self.data_path = PathBuf::from(expanded);
    }

    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_path: overlay
                .data_path
                .clone()
                .unwrap_or_else(|| self.data_path.clone()),
            cloud_url: overlay
                .cloud_url
                .clone()
                .unwrap_or_else(|| self.cloud_url.clone()),
            request_timeout_secs: overlay
                .request_timeout_secs
                .unwrap_or(self.request_timeout_secs),
            auth_username: self.auth_username.clone(),
            auth_password: self.auth_password.clone(),
        }
    }

    /// Load settings with layered precedence from the process environment.
    ///
    /// `config_file` replaces the global config path when given; unlike the
    /// global file it must exist.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_with_env(config_file, None)
    }

    /// Load settings, reading `KUMO_*` variables from `env` instead of the
    /// process environment when it is `Some`.
    pub fn load_with_env(
        config_file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Config file
        match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                if let Some(global_path) = global_config_path() {
                    if global_path.exists() {
                        current = current.merge_with(&load_raw_settings(&global_path)?);
                    }
                }
            }
        }

        // 3. Environment variables (explicit override)
        current = Self::apply_env_overrides(current, env)?;

        current.expand_paths();

        Ok(current)
    }

    /// Apply KUMO_* environment variables as explicit overrides.
    ///
    /// Empty values count as unset.
    fn apply_env_overrides(
        mut settings: Self,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(env),
        );
        let config = builder.build().map_err(config_err)?;
        let get = |key: &str| config.get_string(key).ok().filter(|v| !v.is_empty());

        if let Some(val) = get("data_path") {
            settings.data_path = PathBuf::from(val);
        }
        if let Some(val) = get("cloud_url") {
            settings.cloud_url = val;
        }
        if let Some(val) = get("request_timeout_secs") {
            settings.request_timeout_secs =
                val.parse().map_err(|_| ApplicationError::Config {
                    message: format!("KUMO_REQUEST_TIMEOUT_SECS must be a whole number, got {val:?}"),
                })?;
        }
        if let Some(val) = get("auth_username") {
            settings.auth_username = Some(val);
        }
        if let Some(val) = get("auth_password") {
            settings.auth_password = Some(val);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML, password masked.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        let mut shown = self.clone();
        if shown.auth_password.is_some() {
            shown.auth_password = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
