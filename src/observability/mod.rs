//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Terminal or log collector
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every degraded path (connect failure, ready timeout, drops) leaves a log line
//! - Metrics are cheap and disabled unless an endpoint is configured

pub mod logging;
pub mod metrics;
