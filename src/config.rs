//! Application-level configuration loading, including the default tie-breaker question bank.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{
    game::{DEFAULT_PASS_SECONDS, DEFAULT_ROUND_SECONDS, TieBreakerBank},
    history::HISTORY_CAPACITY,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "NEON_QUIZ_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Undo snapshots kept before the oldest is dropped.
    pub history_capacity: usize,
    /// Base countdown proposed for rounds that omit one.
    pub default_round_seconds: u32,
    /// Pass-on countdown proposed for rounds that omit one.
    pub default_pass_seconds: u32,
    /// Bank used when a setup brings no tie-breaker questions.
    pub tie_breaker: TieBreakerBank,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        tie_breaker_questions = app_config.tie_breaker.questions.len(),
                        "loaded quiz config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document; absent fields take their defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    history_capacity: usize,
    default_round_seconds: u32,
    default_pass_seconds: u32,
    tie_breaker: TieBreakerBank,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            history_capacity: HISTORY_CAPACITY,
            default_round_seconds: DEFAULT_ROUND_SECONDS,
            default_pass_seconds: DEFAULT_PASS_SECONDS,
            tie_breaker: TieBreakerBank::default(),
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            history_capacity: value.history_capacity.max(1),
            default_round_seconds: value.default_round_seconds,
            default_pass_seconds: value.default_pass_seconds,
            tie_breaker: value.tie_breaker,
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
