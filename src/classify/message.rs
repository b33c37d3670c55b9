//! Outgoing message type.

use std::fmt;

/// Where a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Structured ICMP record.
    Icmp,
    /// Structured HTTP access record.
    Http,
    /// Structured record without a recognised shape, or with a `message` field.
    Generic,
    /// Line that did not parse as JSON.
    Plain,
    /// Synthesized by the rate limiter.
    OverflowNotice,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Icmp => "icmp",
            MessageKind::Http => "http",
            MessageKind::Generic => "generic",
            MessageKind::Plain => "plain",
            MessageKind::OverflowNotice => "overflow-notice",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized, human-readable line ready to send to the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    text: String,
    kind: MessageKind,
}

impl Message {
    pub fn new(text: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    /// Notice emitted at the start of a window that follows one with drops.
    pub fn overflow_report(client_name: &str, dropped: u64) -> Self {
        Self::new(
            format!(
                "⚠️ [{}] Rate limit exceeded: {} messages dropped in the last second",
                client_name, dropped
            ),
            MessageKind::OverflowNotice,
        )
    }

    /// Notice emitted once per window when the cap is first exceeded.
    pub fn limit_reached(client_name: &str, cap: u32) -> Self {
        Self::new(
            format!(
                "⚠️ [{}] Rate limit reached ({}/sec), dropping messages...",
                client_name, cap
            ),
            MessageKind::OverflowNotice,
        )
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn is_notice(&self) -> bool {
        self.kind == MessageKind::OverflowNotice
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
