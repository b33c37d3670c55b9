//! Collector transport subsystem.
//!
//! # Data Flow
//! ```text
//! MonitorConfig (client name, password)
//!     → credentials.rs (username + base64(sha256(password)))
//!     → gate.rs: connect → settle delay / ready timeout → ready
//!     → socketio.rs: WebSocket + Socket.IO handshake (packet.rs)
//!     → send("data", text) ... → disconnect
//! ```
//!
//! # Design Decisions
//! - Connect failures are not fatal; the relay keeps reading and sends become no-ops
//! - No reconnection: once the link is gone it stays gone
//! - Readiness is a single-assignment flag raised by whichever of the settle
//!   timer or the ready timeout completes first

pub mod credentials;
pub mod gate;
pub mod packet;
pub mod socketio;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub use credentials::Credentials;
pub use gate::{ConnectionState, ReadyOutcome, TransportGate};
pub use socketio::SocketIoTransport;

/// Errors raised by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid collector url: {0}")]
    InvalidUrl(String),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("rejected by collector: {0}")]
    Rejected(String),

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("not connected")]
    NotConnected,

    #[error("connection closed")]
    Closed,
}

/// A long-lived, best-effort connection to the collector.
pub trait Transport: Send {
    /// Establish the connection and present `credentials`.
    fn connect(
        &mut self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Fire-and-forget send. Fails with [`TransportError::NotConnected`]
    /// when there is no live connection.
    fn send(&mut self, text: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Close the connection. Idempotent, and safe without a prior connect.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;

    /// Whether the link is currently up.
    fn is_connected(&self) -> bool;
}
