//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the monitor relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Name presented to the collector and used to tag overflow notices.
    pub client_name: String,

    /// Collector base URL (e.g., "http://localhost:5000").
    pub url: String,

    /// Shared secret. `None` connects without authentication.
    pub password: Option<String>,

    /// Capture interface label. Display only.
    pub interface: String,

    /// Admission cap: messages forwarded per wall-clock second.
    pub max_messages_per_second: u32,

    /// Echo every classified message to stdout.
    pub echo: bool,

    /// Delays and timeouts.
    pub timing: TimingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            client_name: "Monitor".to_string(),
            url: "http://localhost".to_string(),
            password: None,
            interface: "eth0".to_string(),
            max_messages_per_second: 10,
            echo: true,
            timing: TimingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Delays and timeouts around the collector connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Upper bound for connect + handshake in seconds.
    pub connect_timeout_secs: u64,

    /// Delay after connect before the session counts as joined, in milliseconds.
    pub settle_delay_ms: u64,

    /// Maximum wait for readiness before forwarding anyway, in seconds.
    pub ready_timeout_secs: u64,

    /// Pause after each admitted send, in milliseconds.
    pub send_pacing_ms: u64,

    /// Pause before disconnecting on shutdown, in milliseconds.
    pub drain_delay_ms: u64,
}

impl TimingConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn send_pacing(&self) -> Duration {
        Duration::from_millis(self.send_pacing_ms)
    }

    pub fn drain_delay(&self) -> Duration {
        Duration::from_millis(self.drain_delay_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            settle_delay_ms: 2000,
            ready_timeout_secs: 15,
            send_pacing_ms: 100,
            drain_delay_ms: 500,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9091".to_string(),
        }
    }
}
