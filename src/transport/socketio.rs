//! Socket.IO client over a WebSocket.
//!
//! # Responsibilities
//! - Map the collector URL to its `/socket.io/` WebSocket endpoint
//! - Run the Engine.IO open / Socket.IO connect handshake with credentials
//! - Answer server heartbeats in the background
//! - Emit `data` events and detect server-side disconnects
//!
//! # Design Decisions
//! - One writer task owns the sink; senders go through an unbounded channel
//! - One reader task owns the stream and flips `connected` off when the
//!   link dies, logging the reason
//! - A missed heartbeat (ping interval + ping timeout) counts as a disconnect

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

use crate::observability::metrics;
use crate::transport::credentials::Credentials;
use crate::transport::packet::{self, OpenInfo, Packet};
use crate::transport::{Transport, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Why a live connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The collector sent a Socket.IO disconnect.
    ServerDisconnect,
    /// We called `disconnect()`.
    ClientDisconnect,
    /// No heartbeat within the negotiated deadline.
    PingTimeout,
    /// The WebSocket closed.
    TransportClose,
    /// The WebSocket failed.
    TransportError,
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DisconnectReason::ServerDisconnect => "io server disconnect",
            DisconnectReason::ClientDisconnect => "io client disconnect",
            DisconnectReason::PingTimeout => "ping timeout",
            DisconnectReason::TransportClose => "transport close",
            DisconnectReason::TransportError => "transport error",
        };
        f.write_str(reason)
    }
}

struct Session {
    sid: String,
    outbound: mpsc::UnboundedSender<WsMessage>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// Transport speaking Socket.IO v4 to the collector.
pub struct SocketIoTransport {
    base_url: String,
    connect_timeout: Duration,
    connected: Arc<AtomicBool>,
    session: Option<Session>,
}

impl SocketIoTransport {
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            connect_timeout,
            connected: Arc::new(AtomicBool::new(false)),
            session: None,
        }
    }

    /// Session id assigned by the collector, while connected.
    pub fn sid(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.sid.as_str())
    }

    async fn handshake(
        &self,
        endpoint: Url,
        credentials: &Credentials,
    ) -> Result<(SplitSink<WsStream, WsMessage>, SplitStream<WsStream>, OpenInfo), TransportError>
    {
        let (ws, _) = connect_async(endpoint.as_str()).await?;
        let (mut sink, mut stream) = ws.split();

        let open = match next_packet(&mut stream).await? {
            Packet::Open(info) => info,
            other => {
                return Err(TransportError::Handshake(format!(
                    "expected open packet, got {:?}",
                    other
                )))
            }
        };

        sink.send(WsMessage::text(packet::encode_connect(credentials)?))
            .await?;

        loop {
            match next_packet(&mut stream).await? {
                Packet::Connect(_) => break,
                Packet::ConnectError(reason) => return Err(TransportError::Rejected(reason)),
                Packet::Ping => sink.send(WsMessage::text(packet::PONG)).await?,
                Packet::Disconnect | Packet::Close => {
                    return Err(TransportError::Handshake(
                        "collector closed the session during connect".to_string(),
                    ))
                }
                _ => continue,
            }
        }

        Ok((sink, stream, open))
    }
}

impl Transport for SocketIoTransport {
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError> {
        if self.session.is_some() {
            return Ok(());
        }

        let endpoint = endpoint_url(&self.base_url)?;
        tracing::debug!(endpoint = %endpoint, "Opening collector connection");

        let (sink, stream, open) = timeout(
            self.connect_timeout,
            self.handshake(endpoint, credentials),
        )
        .await
        .map_err(|_| TransportError::Timeout(self.connect_timeout))??;

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        self.connected.store(true, Ordering::SeqCst);

        let writer = tokio::spawn(write_loop(sink, outbound_rx));
        let reader = tokio::spawn(read_loop(
            stream,
            outbound.clone(),
            Arc::clone(&self.connected),
            open.heartbeat_deadline(),
        ));

        tracing::info!(
            client = %credentials.username(),
            sid = %open.sid,
            "Connected to collector"
        );
        metrics::record_transport_connected(true);

        self.session = Some(Session {
            sid: open.sid,
            outbound,
            reader,
            writer,
        });
        Ok(())
    }

    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        let session = match &self.session {
            Some(session) if self.connected.load(Ordering::SeqCst) => session,
            _ => return Err(TransportError::NotConnected),
        };

        let frame = packet::encode_event(packet::DATA_EVENT, text)?;
        session
            .outbound
            .send(WsMessage::text(frame))
            .map_err(|_| TransportError::Closed)
    }

    async fn disconnect(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        let was_connected = self.connected.swap(false, Ordering::SeqCst);
        session.reader.abort();

        if was_connected {
            let _ = session.outbound.send(WsMessage::text(packet::DISCONNECT));
            let _ = session.outbound.send(WsMessage::Close(None));
            tracing::info!(
                sid = %session.sid,
                reason = %DisconnectReason::ClientDisconnect,
                "Disconnected from collector"
            );
        }
        drop(session.outbound);

        if timeout(Duration::from_secs(1), session.writer).await.is_err() {
            tracing::debug!("Writer did not finish within 1s after disconnect");
        }
        metrics::record_transport_connected(false);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for SocketIoTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketIoTransport")
            .field("base_url", &self.base_url)
            .field("connected", &self.is_connected())
            .field("sid", &self.sid())
            .finish()
    }
}

/// `http://host:5000/` → `ws://host:5000/socket.io/?EIO=4&transport=websocket`.
pub fn endpoint_url(base: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(base).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| TransportError::InvalidUrl(format!("cannot use scheme '{}'", scheme)))?;

    url.set_path("/socket.io/");
    url.set_query(Some("EIO=4&transport=websocket"));
    Ok(url)
}

async fn next_packet(stream: &mut SplitStream<WsStream>) -> Result<Packet, TransportError> {
    loop {
        match stream.next().await {
            Some(Ok(WsMessage::Text(text))) => {
                return packet::decode(text.as_str())
                    .map_err(|e| TransportError::Handshake(e.to_string()))
            }
            Some(Ok(WsMessage::Close(_))) | None => return Err(TransportError::Closed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<WsStream, WsMessage>,
    mut outbound: mpsc::UnboundedReceiver<WsMessage>,
) {
    while let Some(frame) = outbound.recv().await {
        let closing = matches!(frame, WsMessage::Close(_));
        if let Err(e) = sink.send(frame).await {
            tracing::debug!(error = %e, "WebSocket write failed");
            return;
        }
        if closing {
            return;
        }
    }
    let _ = sink.close().await;
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    outbound: mpsc::UnboundedSender<WsMessage>,
    connected: Arc<AtomicBool>,
    heartbeat_deadline: Duration,
) {
    let reason = loop {
        let frame = match timeout(heartbeat_deadline, stream.next()).await {
            Ok(frame) => frame,
            Err(_) => break DisconnectReason::PingTimeout,
        };

        match frame {
            Some(Ok(WsMessage::Text(text))) => match packet::decode(text.as_str()) {
                Ok(Packet::Ping) => {
                    let _ = outbound.send(WsMessage::text(packet::PONG));
                }
                Ok(Packet::Disconnect) => break DisconnectReason::ServerDisconnect,
                Ok(Packet::Close) => break DisconnectReason::TransportClose,
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "Ignoring undecodable packet"),
            },
            Some(Ok(WsMessage::Close(_))) | None => break DisconnectReason::TransportClose,
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::debug!(error = %e, "WebSocket read failed");
                break DisconnectReason::TransportError;
            }
        }
    };

    if connected.swap(false, Ordering::SeqCst) {
        tracing::error!(reason = %reason, "Collector connection lost");
        metrics::record_transport_connected(false);
    }
}
