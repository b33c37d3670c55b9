//! Per-run counters.

/// Totals for one forwarder run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardStats {
    /// Non-blank lines read from the source.
    pub lines_read: u64,
    /// Messages accepted by the transport.
    pub forwarded: u64,
    /// Messages dropped by the rate limiter.
    pub rate_limited: u64,
    /// Messages admitted but not delivered (no connection or send failure).
    pub undelivered: u64,
    /// Overflow notices generated.
    pub notices: u64,
}

impl ForwardStats {
    pub fn log_summary(&self) {
        tracing::info!(
            lines_read = self.lines_read,
            forwarded = self.forwarded,
            rate_limited = self.rate_limited,
            undelivered = self.undelivered,
            notices = self.notices,
            "Forwarding summary"
        );
    }
}
