//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging → Reject tty stdin → Metrics → Forwarder
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Forwarder drains → Disconnect → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then input check, then connection
//! - Shutdown always goes through the forwarder's drain

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
