//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the collector URL and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::MonitorConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid collector url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("client_name must not be empty")]
    EmptyClientName,

    #[error("timing.ready_timeout_secs must be greater than zero")]
    ZeroReadyTimeout,

    #[error("unknown log_format '{0}' (expected 'pretty' or 'json')")]
    UnknownLogFormat(String),
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.url) {
        Ok(url) => {
            if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
                errors.push(ValidationError::InvalidUrl {
                    url: config.url.clone(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
        }
        Err(e) => errors.push(ValidationError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        }),
    }

    if config.client_name.trim().is_empty() {
        errors.push(ValidationError::EmptyClientName);
    }

    if config.timing.ready_timeout_secs == 0 {
        errors.push(ValidationError::ZeroReadyTimeout);
    }

    let format = config.observability.log_format.as_str();
    if format != "pretty" && format != "json" {
        errors.push(ValidationError::UnknownLogFormat(format.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
