//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_lines_total` (counter): non-blank lines read from the source
//! - `relay_messages_forwarded_total` (counter): messages handed to the transport
//! - `relay_messages_dropped_total` (counter): by `reason` (rate_limit, disconnected)
//! - `relay_overflow_notices_total` (counter): by `kind` (reached, report)
//! - `relay_transport_connected` (gauge): 1=connected, 0=not connected
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_line() {
    counter!("relay_lines_total").increment(1);
}

pub fn record_forwarded() {
    counter!("relay_messages_forwarded_total").increment(1);
}

pub fn record_dropped(reason: &'static str) {
    counter!("relay_messages_dropped_total", "reason" => reason).increment(1);
}

pub fn record_notice(kind: &'static str) {
    counter!("relay_overflow_notices_total", "kind" => kind).increment(1);
}

pub fn record_transport_connected(connected: bool) {
    gauge!("relay_transport_connected").set(if connected { 1.0 } else { 0.0 });
}
