//! Rate-limited event relay library.

pub mod classify;
pub mod config;
pub mod forwarder;
pub mod lifecycle;
pub mod observability;
pub mod rate_limit;
pub mod source;
pub mod transport;

pub use config::MonitorConfig;
pub use forwarder::Forwarder;
pub use lifecycle::Shutdown;
