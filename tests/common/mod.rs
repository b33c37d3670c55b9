//! Shared utilities for integration tests.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use monitor_relay::config::MonitorConfig;
use monitor_relay::rate_limit::Clock;
use monitor_relay::source::Source;
use monitor_relay::transport::{Credentials, Transport, TransportError};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// Config with echo off and defaults everywhere else.
#[allow(dead_code)]
pub fn quiet_config(cap: u32) -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.max_messages_per_second = cap;
    config.echo = false;
    config
}

/// Clock whose second is set by the test.
#[derive(Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

#[allow(dead_code)]
impl ManualClock {
    pub fn at(second: u64) -> Self {
        Self(Arc::new(AtomicU64::new(second)))
    }

    pub fn set(&self, second: u64) {
        self.0.store(second, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_second(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// One scripted source event.
#[allow(dead_code)]
pub enum Step {
    /// Set the clock to `second`, then yield `text`.
    Line(u64, &'static str),
    /// Fail the read.
    Fail,
    /// Never yield.
    Hang,
}

/// Source replaying a fixed script, then reporting end of input.
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    clock: ManualClock,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new(clock: &ManualClock, steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            clock: clock.clone(),
        }
    }

    /// All lines in the same second.
    pub fn lines(clock: &ManualClock, second: u64, lines: &[&'static str]) -> Self {
        Self::new(clock, lines.iter().map(|l| Step::Line(second, l)).collect())
    }
}

impl Source for ScriptedSource {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        match self.steps.pop_front() {
            Some(Step::Line(second, text)) => {
                self.clock.set(second);
                Ok(Some(text.to_string()))
            }
            Some(Step::Fail) => Err(io::Error::other("pipe broke")),
            Some(Step::Hang) => std::future::pending().await,
            None => Ok(None),
        }
    }
}

/// What the mock transport saw.
#[derive(Default)]
pub struct Recorded {
    pub credentials: Vec<Credentials>,
    pub sent: Vec<(Instant, String)>,
    pub disconnects: usize,
}

#[allow(dead_code)]
impl Recorded {
    pub fn texts(&self) -> Vec<String> {
        self.sent.iter().map(|(_, text)| text.clone()).collect()
    }
}

/// In-memory transport recording every call.
#[derive(Clone, Default)]
pub struct MockTransport {
    pub recorded: Arc<Mutex<Recorded>>,
    pub refuse: bool,
    connected: bool,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }
}

impl Transport for MockTransport {
    async fn connect(&mut self, credentials: &Credentials) -> Result<(), TransportError> {
        self.recorded.lock().unwrap().credentials.push(credentials.clone());
        if self.refuse {
            return Err(TransportError::Rejected("refused by test".into()));
        }
        self.connected = true;
        Ok(())
    }

    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.recorded
            .lock()
            .unwrap()
            .sent
            .push((Instant::now(), text.to_string()));
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.recorded.lock().unwrap().disconnects += 1;
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Behaviour of the mock Socket.IO collector after the auth packet.
#[derive(Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum ServerMode {
    /// Ack the connect, ping once, record frames until the client leaves.
    Accept,
    /// Answer the connect with a connect error.
    Reject,
    /// Ack the connect, then disconnect the client.
    Kick,
}

/// Frames and request path seen by the mock collector.
#[allow(dead_code)]
pub enum ServerEvent {
    Path(String),
    Frame(String),
    Closed,
}

/// Start a one-connection mock Socket.IO collector.
#[allow(dead_code)]
pub async fn start_mock_collector(mode: ServerMode) -> (SocketAddr, mpsc::UnboundedReceiver<ServerEvent>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (events, events_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let path_events = events.clone();
        let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let path = req
                .uri()
                .path_and_query()
                .map(|p| p.to_string())
                .unwrap_or_default();
            let _ = path_events.send(ServerEvent::Path(path));
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(socket, callback).await.unwrap();

        ws.send(WsMessage::text(
            r#"0{"sid":"eio-1","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#,
        ))
        .await
        .unwrap();

        let mut acked = false;
        while let Some(Ok(frame)) = ws.next().await {
            let text = match frame {
                WsMessage::Text(text) => text.as_str().to_string(),
                WsMessage::Close(_) => break,
                _ => continue,
            };
            let _ = events.send(ServerEvent::Frame(text.clone()));

            if !acked && text.starts_with("40") {
                acked = true;
                match mode {
                    ServerMode::Accept => {
                        ws.send(WsMessage::text(r#"40{"sid":"sock-1"}"#)).await.unwrap();
                        ws.send(WsMessage::text("2")).await.unwrap();
                    }
                    ServerMode::Reject => {
                        ws.send(WsMessage::text(r#"44{"message":"invalid token"}"#))
                            .await
                            .unwrap();
                    }
                    ServerMode::Kick => {
                        ws.send(WsMessage::text(r#"40{"sid":"sock-1"}"#)).await.unwrap();
                        ws.send(WsMessage::text("41")).await.unwrap();
                    }
                }
            }
        }
        let _ = events.send(ServerEvent::Closed);
    });

    (addr, events_rx)
}

/// Drain frames until the server reports the connection closed.
#[allow(dead_code)]
pub async fn collect_frames(events: &mut mpsc::UnboundedReceiver<ServerEvent>) -> (Option<String>, Vec<String>) {
    let mut path = None;
    let mut frames = Vec::new();
    while let Some(event) = events.recv().await {
        match event {
            ServerEvent::Path(p) => path = Some(p),
            ServerEvent::Frame(f) => frames.push(f),
            ServerEvent::Closed => break,
        }
    }
    (path, frames)
}
