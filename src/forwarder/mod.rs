//! Forwarding loop.
//!
//! # Data Flow
//! ```text
//! Source line
//!     → classify (classify/)
//!     → echo to stdout (optional)
//!     → RateLimiter::admit (rate_limit/)
//!     → TransportGate::send for each outgoing message, report first
//!     → pacing delay after an admitted send
//! ```
//!
//! # Design Decisions
//! - Single task: the limiter and stats have exactly one owner
//! - Shutdown is raced against every wait (connect, readiness, read, pacing)
//! - Draining always ends in exactly one disconnect

pub mod state;
pub mod stats;

use std::io::{self, Write};
use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::sleep;

use crate::classify::classify;
use crate::config::MonitorConfig;
use crate::observability::metrics;
use crate::rate_limit::{Clock, RateLimiter, Verdict};
use crate::source::Source;
use crate::transport::{Credentials, Transport, TransportGate};

pub use state::{ForwarderState, StopCause};
pub use stats::ForwardStats;

/// Pulls lines from a source and relays them to the collector.
pub struct Forwarder<S, T> {
    source: S,
    gate: TransportGate<T>,
    limiter: RateLimiter,
    clock: Box<dyn Clock>,
    credentials: Credentials,
    send_pacing: Duration,
    drain_delay: Duration,
    echo: Option<Box<dyn Write + Send>>,
    state: ForwarderState,
    stats: ForwardStats,
}

impl<S: Source, T: Transport> Forwarder<S, T> {
    pub fn new(config: &MonitorConfig, source: S, transport: T, clock: Box<dyn Clock>) -> Self {
        let limiter = RateLimiter::new(
            config.max_messages_per_second,
            config.client_name.clone(),
            clock.now_second(),
        );

        Self {
            source,
            gate: TransportGate::new(transport, &config.timing),
            limiter,
            clock,
            credentials: Credentials::new(config.client_name.clone(), config.password.as_deref()),
            send_pacing: config.timing.send_pacing(),
            drain_delay: config.timing.drain_delay(),
            echo: config
                .echo
                .then(|| Box::new(io::stdout()) as Box<dyn Write + Send>),
            state: ForwarderState::Idle,
            stats: ForwardStats::default(),
        }
    }

    /// Echo classified messages to `writer` instead of stdout.
    pub fn with_echo(mut self, writer: impl Write + Send + 'static) -> Self {
        self.echo = Some(Box::new(writer));
        self
    }

    /// Run until the source ends, reading fails, or shutdown is signalled,
    /// then drain and disconnect.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> ForwardStats {
        let cause = self.run_session(&mut shutdown).await;

        self.transition(ForwarderState::Draining);
        tracing::info!(cause = %cause, "Stopping monitor client");
        sleep(self.drain_delay).await;

        self.gate.disconnect().await;
        self.transition(ForwarderState::Stopped);

        self.stats.log_summary();
        self.stats
    }

    async fn run_session(&mut self, shutdown: &mut broadcast::Receiver<()>) -> StopCause {
        self.transition(ForwarderState::Connecting);
        tokio::select! {
            biased;
            _ = shutdown_requested(shutdown) => return StopCause::Interrupted,
            _ = self.gate.connect(&self.credentials) => {}
        }

        self.transition(ForwarderState::AwaitingReady);
        tokio::select! {
            biased;
            _ = shutdown_requested(shutdown) => return StopCause::Interrupted,
            _ = self.gate.wait_ready() => {}
        }

        self.transition(ForwarderState::Forwarding);
        tracing::info!("Reading JSON and plain text from input");

        loop {
            let line = tokio::select! {
                biased;
                _ = shutdown_requested(shutdown) => return StopCause::Interrupted,
                line = self.source.next_line() => line,
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => return StopCause::EndOfInput,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read input");
                    return StopCause::SourceFailed;
                }
            };

            if self.process_line(&line).await {
                tokio::select! {
                    biased;
                    _ = shutdown_requested(shutdown) => return StopCause::Interrupted,
                    _ = sleep(self.send_pacing) => {}
                }
            }
        }
    }

    /// Classify, admit and send one line. Returns true when an ordinary
    /// message was delivered, which is what the pacing delay follows.
    async fn process_line(&mut self, raw: &str) -> bool {
        let line = raw.trim();
        if line.is_empty() {
            return false;
        }
        self.stats.lines_read += 1;
        metrics::record_line();

        let message = classify(line);
        if let Some(out) = self.echo.as_mut() {
            if let Err(e) = writeln!(out, "{}", message) {
                tracing::warn!(error = %e, "Console echo failed, disabling echo");
                self.echo = None;
            }
        }

        let admission = self.limiter.admit(message, self.clock.now_second());
        if admission.report.is_some() {
            self.stats.notices += 1;
            metrics::record_notice("report");
        }
        match &admission.verdict {
            Verdict::Send(_) => {}
            Verdict::SendThenDrop(_) => {
                self.stats.rate_limited += 1;
                self.stats.notices += 1;
                metrics::record_dropped("rate_limit");
                metrics::record_notice("reached");
            }
            Verdict::DropSilently => {
                self.stats.rate_limited += 1;
                metrics::record_dropped("rate_limit");
            }
        }

        let mut delivered = false;
        for outgoing in admission.into_outgoing() {
            let result = self.gate.send(outgoing.text()).await;
            if outgoing.is_notice() {
                if let Err(e) = result {
                    tracing::debug!(error = %e, "Overflow notice not delivered");
                }
                continue;
            }

            match result {
                Ok(()) => {
                    self.stats.forwarded += 1;
                    metrics::record_forwarded();
                    delivered = true;
                }
                Err(e) => {
                    self.stats.undelivered += 1;
                    metrics::record_dropped("disconnected");
                    tracing::debug!(error = %e, kind = %outgoing.kind(), "Message not delivered");
                }
            }
        }
        delivered
    }

    fn transition(&mut self, next: ForwarderState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(from = %self.state, to = %next, "Forwarder state change");
        self.state = next;
    }
}

/// Resolves when shutdown is signalled. A dropped coordinator never resolves.
async fn shutdown_requested(shutdown: &mut broadcast::Receiver<()>) {
    match shutdown.recv().await {
        Ok(()) | Err(RecvError::Lagged(_)) => {}
        Err(RecvError::Closed) => std::future::pending().await,
    }
}
