//! Startup orchestration.
//!
//! # Responsibilities
//! - Load configuration and initialize logging
//! - Reject interactive stdin before any connection attempt
//! - Start optional metrics and the signal listener
//! - Run the forwarder and map the outcome to an exit code
//!
//! # Design Decisions
//! - Fail fast: config and usage errors exit 1 before the loop starts
//! - Once the forwarder runs, every path ends in drain + disconnect and exit 0

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{load_config, ConfigError, MonitorConfig, ObservabilityConfig};
use crate::forwarder::{ForwardStats, Forwarder};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals;
use crate::observability::{logging, metrics};
use crate::rate_limit::{Clock, SystemClock};
use crate::source::{self, Source, SourceError};
use crate::transport::{SocketIoTransport, Transport};

/// Normal or interrupted shutdown.
pub const EXIT_OK: i32 = 0;
/// Usage error or failure before the loop began.
pub const EXIT_FAILURE: i32 = 1;

/// Errors that stop the relay before forwarding begins.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("usage error: {0}")]
    Usage(#[from] SourceError),
}

/// Run the relay end to end and return the process exit code.
pub async fn run(config_path: Option<&Path>) -> i32 {
    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            return exit_code(&Err(StartupError::from(e)));
        }
    };
    logging::init_logging(&config.observability);

    // Subscribe before the listener exists so an early signal is not lost.
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let listener = signals::spawn_signal_listener(shutdown.clone());

    let transport = SocketIoTransport::new(config.url.clone(), config.timing.connect_timeout());
    let result = relay(
        &config,
        source::stdin_is_terminal(),
        source::stdin(),
        transport,
        Box::new(SystemClock),
        receiver,
    )
    .await;

    listener.abort();
    exit_code(&result)
}

/// Check the input, then forward until the source ends or shutdown fires.
///
/// An interactive input is refused before any connection attempt.
pub async fn relay<S: Source, T: Transport>(
    config: &MonitorConfig,
    interactive: bool,
    source: S,
    transport: T,
    clock: Box<dyn Clock>,
    shutdown: broadcast::Receiver<()>,
) -> Result<ForwardStats, StartupError> {
    if let Err(e) = source::ensure_piped(interactive) {
        print_usage();
        return Err(e.into());
    }

    tracing::info!(
        client = %config.client_name,
        url = %config.url,
        interface = %config.interface,
        max_messages_per_second = config.max_messages_per_second,
        "Starting monitor client (reading from stdin, interface for display only)"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let forwarder = Forwarder::new(config, source, transport, clock);
    Ok(forwarder.run(shutdown).await)
}

/// Map a relay outcome to the process exit code, logging failures.
pub fn exit_code(result: &Result<ForwardStats, StartupError>) -> i32 {
    match result {
        Ok(_) => EXIT_OK,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start monitor client");
            EXIT_FAILURE
        }
    }
}

fn print_usage() {
    eprintln!("This program reads from stdin (piped input)");
    eprintln!("Usage: <data_source> | monitor-relay");
    eprintln!("Example: echo \"Hello World\" | URL=http://localhost:5000 PASSWORD=Test123 monitor-relay");
    eprintln!("Example: tail -f /var/log/app.log | URL=http://localhost:5000 monitor-relay");
}
