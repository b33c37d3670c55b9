//! Per-second admission window.

/// What the window decided for one offered message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDecision {
    /// Under the cap; counted as sent.
    Admit,
    /// Over the cap and this is the first drop of the window.
    FirstDrop,
    /// Over the cap, notice already sent this window.
    Drop,
}

/// Mutable admission state for the current wall-clock second.
///
/// The window only advances when a message is offered, never on a timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateWindow {
    window_second: u64,
    sent_in_window: u32,
    dropped_in_window: u64,
    notice_sent: bool,
}

impl RateWindow {
    pub fn new(start_second: u64) -> Self {
        Self {
            window_second: start_second,
            sent_in_window: 0,
            dropped_in_window: 0,
            notice_sent: false,
        }
    }

    /// Move to `now_second` if it differs from the current window.
    ///
    /// Returns the number of drops carried by the window just closed, if any.
    /// The drop count is reset whenever it is returned.
    pub fn roll(&mut self, now_second: u64) -> Option<u64> {
        if now_second == self.window_second {
            return None;
        }

        self.window_second = now_second;
        self.sent_in_window = 0;
        self.notice_sent = false;

        match std::mem::take(&mut self.dropped_in_window) {
            0 => None,
            dropped => Some(dropped),
        }
    }

    /// Count one offered message against `cap`.
    pub fn offer(&mut self, cap: u32) -> WindowDecision {
        if self.sent_in_window < cap {
            self.sent_in_window += 1;
            return WindowDecision::Admit;
        }

        self.dropped_in_window += 1;
        if self.notice_sent {
            WindowDecision::Drop
        } else {
            self.notice_sent = true;
            WindowDecision::FirstDrop
        }
    }

    pub fn window_second(&self) -> u64 {
        self.window_second
    }

    pub fn sent_in_window(&self) -> u32 {
        self.sent_in_window
    }

    pub fn dropped_in_window(&self) -> u64 {
        self.dropped_in_window
    }

    pub fn notice_sent(&self) -> bool {
        self.notice_sent
    }
}
