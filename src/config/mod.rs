//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment overrides: CLIENTNAME, URL, PASSWORD,
//!       INTERFACE, MAX_MESSAGES_PER_SECOND (loader.rs)
//!     → validation.rs (semantic checks)
//!     → MonitorConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so an empty environment is a valid setup
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{MonitorConfig, ObservabilityConfig, TimingConfig};
