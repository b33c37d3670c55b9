//! Admission control and drop accounting.

use crate::classify::Message;
use crate::rate_limit::window::{RateWindow, WindowDecision};

/// Outcome for the offered message itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Under the cap: send the message.
    Send(Message),
    /// Over the cap for the first time this window: the message is dropped
    /// and the contained "limit reached" notice is sent instead.
    SendThenDrop(Message),
    /// Over the cap, notice already sent: nothing goes out.
    DropSilently,
}

/// Everything one call to [`RateLimiter::admit`] wants sent, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    /// Drop-count report for the previous window. Goes out first.
    pub report: Option<Message>,
    pub verdict: Verdict,
}

impl Admission {
    /// Whether the offered message was dropped.
    pub fn dropped(&self) -> bool {
        !matches!(self.verdict, Verdict::Send(_))
    }

    /// Messages to hand to the transport, in send order.
    pub fn into_outgoing(self) -> Vec<Message> {
        let mut outgoing = Vec::with_capacity(2);
        outgoing.extend(self.report);
        match self.verdict {
            Verdict::Send(message) | Verdict::SendThenDrop(message) => outgoing.push(message),
            Verdict::DropSilently => {}
        }
        outgoing
    }
}

/// Per-second sliding counter with overflow notices.
///
/// Notices travel the same outgoing path as ordinary messages but are not
/// charged against the cap, so `sent_in_window <= cap` always holds.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    cap: u32,
    client_name: String,
    window: RateWindow,
}

impl RateLimiter {
    pub fn new(cap: u32, client_name: impl Into<String>, start_second: u64) -> Self {
        Self {
            cap,
            client_name: client_name.into(),
            window: RateWindow::new(start_second),
        }
    }

    /// Admit or drop `message` for the window containing `now_second`.
    pub fn admit(&mut self, message: Message, now_second: u64) -> Admission {
        let report = self.window.roll(now_second).map(|dropped| {
            tracing::warn!(
                client = %self.client_name,
                dropped,
                "Messages dropped by rate limit in previous window"
            );
            Message::overflow_report(&self.client_name, dropped)
        });

        let verdict = match self.window.offer(self.cap) {
            WindowDecision::Admit => Verdict::Send(message),
            WindowDecision::FirstDrop => {
                tracing::warn!(
                    client = %self.client_name,
                    cap = self.cap,
                    "Rate limit reached, dropping messages"
                );
                Verdict::SendThenDrop(Message::limit_reached(&self.client_name, self.cap))
            }
            WindowDecision::Drop => Verdict::DropSilently,
        };

        Admission { report, verdict }
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    pub fn window(&self) -> &RateWindow {
        &self.window
    }
}
