//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::MonitorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment keys recognised as overrides.
pub const ENV_CLIENT_NAME: &str = "CLIENTNAME";
pub const ENV_URL: &str = "URL";
pub const ENV_PASSWORD: &str = "PASSWORD";
pub const ENV_INTERFACE: &str = "INTERFACE";
pub const ENV_MAX_MESSAGES_PER_SECOND: &str = "MAX_MESSAGES_PER_SECOND";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// process environment. The result is validated.
pub fn load_config(path: Option<&Path>) -> Result<MonitorConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<MonitorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => MonitorConfig::default(),
    };

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply environment overrides in place. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut MonitorConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(name) = get(ENV_CLIENT_NAME) {
        config.client_name = name;
    }
    if let Some(url) = get(ENV_URL) {
        config.url = url;
    }
    if let Some(password) = get(ENV_PASSWORD) {
        config.password = Some(password);
    }
    if let Some(interface) = get(ENV_INTERFACE) {
        config.interface = interface;
    }
    if let Some(raw) = get(ENV_MAX_MESSAGES_PER_SECOND) {
        config.max_messages_per_second =
            raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_MAX_MESSAGES_PER_SECOND,
                value: raw.clone(),
            })?;
    }

    Ok(())
}
