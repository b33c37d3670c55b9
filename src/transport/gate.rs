//! Connection lifecycle and readiness gate.
//!
//! # States
//! ```text
//! connect() ok  → connected → (settle delay) → authenticated + ready
//! connect() err → not connected ─────────────→ ready on timeout
//! wait_ready(): ready, or the ready timeout elapses (ready forced on)
//! ```
//!
//! # Design Decisions
//! - `ready` is a watch channel that only ever goes false → true
//! - The settle timer is a spawned task, aborted on disconnect
//! - A readiness timeout degrades to forwarding anyway, with a warning

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use crate::config::TimingConfig;
use crate::transport::credentials::Credentials;
use crate::transport::{Transport, TransportError};

/// Shared readiness flags for one client.
#[derive(Debug)]
pub struct ConnectionState {
    authenticated: AtomicBool,
    ready: watch::Sender<bool>,
}

impl ConnectionState {
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            authenticated: AtomicBool::new(false),
            ready,
        }
    }

    /// Raise the ready flag. Returns true only for the call that raised it.
    pub fn mark_ready(&self) -> bool {
        self.ready.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    fn mark_authenticated(&self) {
        self.authenticated.store(true, Ordering::SeqCst);
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// How the readiness wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// The settle timer fired first.
    Settled,
    /// The ready timeout elapsed; ready was forced on.
    TimedOut,
}

/// Owns the transport and gates forwarding on readiness.
pub struct TransportGate<T> {
    transport: T,
    state: Arc<ConnectionState>,
    settle_delay: Duration,
    ready_timeout: Duration,
    settle_task: Option<JoinHandle<()>>,
    disconnected: bool,
}

impl<T: Transport> TransportGate<T> {
    pub fn new(transport: T, timing: &TimingConfig) -> Self {
        Self {
            transport,
            state: Arc::new(ConnectionState::new()),
            settle_delay: timing.settle_delay(),
            ready_timeout: timing.ready_timeout(),
            settle_task: None,
            disconnected: false,
        }
    }

    /// Connect and start the settle timer. Failures are logged, not returned.
    pub async fn connect(&mut self, credentials: &Credentials) -> bool {
        if credentials.is_authenticated() {
            tracing::info!(username = %credentials.username(), "Logging in with password");
        } else {
            tracing::warn!(
                username = %credentials.username(),
                "Logging in with NO password set for authentication"
            );
        }

        match self.transport.connect(credentials).await {
            Ok(()) => {
                let state = Arc::clone(&self.state);
                let settle_delay = self.settle_delay;
                self.settle_task = Some(tokio::spawn(async move {
                    sleep(settle_delay).await;
                    state.mark_authenticated();
                    if state.mark_ready() {
                        tracing::info!("Session joined, ready to forward");
                    }
                }));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Connection to collector failed, proceeding anyway");
                false
            }
        }
    }

    /// Wait until ready or until the ready timeout elapses.
    pub async fn wait_ready(&self) -> ReadyOutcome {
        let mut ready = self.state.subscribe();
        let outcome = match timeout(self.ready_timeout, ready.wait_for(|ready| *ready)).await {
            Ok(Ok(_)) => ReadyOutcome::Settled,
            Ok(Err(_)) | Err(_) => {
                tracing::warn!(
                    timeout_secs = self.ready_timeout.as_secs_f64(),
                    "Collector setup timed out, proceeding anyway"
                );
                self.state.mark_ready();
                ReadyOutcome::TimedOut
            }
        };
        outcome
    }

    pub async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        self.transport.send(text).await
    }

    /// Cancel the settle timer and close the transport. Only the first call
    /// reaches the transport.
    pub async fn disconnect(&mut self) {
        if self.disconnected {
            return;
        }
        self.disconnected = true;

        if let Some(task) = self.settle_task.take() {
            task.abort();
        }
        self.transport.disconnect().await;
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn state(&self) -> &Arc<ConnectionState> {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
