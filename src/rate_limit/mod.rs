//! Rate limiting and drop accounting.
//!
//! # Data Flow
//! ```text
//! Message + now_second (clock.rs)
//!     → window.rs: roll to a new second if needed
//!         (previous window had drops → overflow report goes out first)
//!     → window.rs: sent_in_window < cap ? admit : drop
//!         (first drop of the window → "limit reached" notice)
//!     → limiter.rs: Admission { report, verdict }
//! ```
//!
//! # Design Decisions
//! - One owner: the forwarder holds the only RateLimiter
//! - Windows advance lazily on traffic, not on a ticker
//! - Notices are sent through the normal path but never charged to the cap

pub mod clock;
pub mod limiter;
pub mod window;

pub use clock::{Clock, SystemClock};
pub use limiter::{Admission, RateLimiter, Verdict};
pub use window::RateWindow;
