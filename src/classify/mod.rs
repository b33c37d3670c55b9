//! Record classification.
//!
//! # Data Flow
//! ```text
//! raw line
//!     → JSON parse
//!         ok  → object with src_ip/dst_ip/icmp_type → ICMP description (icmp.rs)
//!             → object with method/url             → HTTP access line
//!             → object with message                → message value
//!             → anything else                      → canonical string
//!         err → trimmed line as-is
//!     → Message (message.rs)
//! ```
//!
//! # Design Decisions
//! - Pure function, no state
//! - Malformed JSON is not an error; it degrades to plain text

pub mod icmp;
pub mod message;

use serde_json::{Map, Value};

pub use message::{Message, MessageKind};

/// Turn one raw input line into a display message.
pub fn classify(raw: &str) -> Message {
    let line = raw.trim();
    match serde_json::from_str::<Value>(line) {
        Ok(value) => classify_structured(&value),
        Err(_) => Message::new(line, MessageKind::Plain),
    }
}

fn classify_structured(value: &Value) -> Message {
    let Some(fields) = value.as_object() else {
        return Message::new(display_value(value), MessageKind::Generic);
    };

    if let (Some(src), Some(dst), Some(icmp_type)) = (
        fields.get("src_ip"),
        fields.get("dst_ip"),
        fields.get("icmp_type"),
    ) {
        let text = format!(
            "ICMP {} from {} to {} (code: {})",
            icmp::describe_type(icmp_type),
            display_value(src),
            display_value(dst),
            optional(fields, "icmp_code", ""),
        );
        return Message::new(text, MessageKind::Icmp);
    }

    if let (Some(method), Some(url)) = (fields.get("method"), fields.get("url")) {
        let text = format!(
            "HTTP {} {} {} from {}",
            display_value(method),
            display_value(url),
            optional(fields, "status", ""),
            optional(fields, "client_ip", "unknown"),
        );
        return Message::new(text, MessageKind::Http);
    }

    if let Some(message) = fields.get("message") {
        return Message::new(display_value(message), MessageKind::Generic);
    }

    Message::new(value.to_string(), MessageKind::Generic)
}

fn optional(fields: &Map<String, Value>, key: &str, default: &str) -> String {
    fields
        .get(key)
        .map(display_value)
        .unwrap_or_else(|| default.to_string())
}

/// Plain textual form of a JSON value: strings without quotes, composites
/// in their serialized form.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
