//! # Rate-Limited Logging
//!
//! A noisy bus (loose wiring, a second listener on the line) can produce a
//! checksum failure for every telegram. [`LogThrottle`] caps how many such
//! warnings reach the log per time window and remembers how many it held
//! back, so the next message that gets through can say so.
//!
//! ```rust
//! use ppsmon::util::logging::LogThrottle;
//!
//! let mut throttle = LogThrottle::new(1000, 5); // 5 messages per second
//! if throttle.allow() {
//!     log::warn!("CRC error in received telegram");
//! }
//! ```

use std::time::Instant;

/// Throttling structure for rate-limiting log messages
#[derive(Debug)]
pub struct LogThrottle {
    /// Time window for throttling (in milliseconds)
    window_ms: u64,
    /// Maximum messages allowed per window
    cap: u32,
    /// Current message count in window
    count: u32,
    /// Messages refused since the last allowed one
    suppressed: u64,
    /// Start time of current window
    t0: Instant,
}

impl LogThrottle {
    /// Create new throttle with time window and message cap
    pub fn new(window_ms: u64, cap: u32) -> Self {
        Self {
            window_ms,
            cap,
            count: 0,
            suppressed: 0,
            t0: Instant::now(),
        }
    }

    /// Check if logging is allowed (resets counter after window expires)
    pub fn allow(&mut self) -> bool {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.t0).as_millis() as u64;

        if elapsed_ms > self.window_ms {
            self.t0 = now;
            self.count = 0;
        }

        self.count += 1;
        if self.count <= self.cap {
            true
        } else {
            self.suppressed += 1;
            false
        }
    }

    /// Number of refused messages since the last call, resetting the tally
    pub fn take_suppressed(&mut self) -> u64 {
        std::mem::take(&mut self.suppressed)
    }

    /// Reset the throttle (start new window immediately)
    pub fn reset(&mut self) {
        self.t0 = Instant::now();
        self.count = 0;
    }
}

impl Default for LogThrottle {
    /// Five messages per ten seconds
    fn default() -> Self {
        Self::new(10_000, 5)
    }
}

/// Log telegram bytes in hex format for debugging
pub fn log_telegram_hex(prefix: &str, data: &[u8]) {
    if log::log_enabled!(log::Level::Debug) {
        log::debug!(
            target: "ppsmon::telegram",
            "{prefix}: {} ({} bytes)",
            crate::util::hex::format_hex_compact(data),
            data.len()
        );
    }
}

/// Log a warning with throttling
#[macro_export]
macro_rules! log_warn_throttled {
    ($throttle:expr, $($arg:tt)*) => {
        if $throttle.allow() {
            let held_back = $throttle.take_suppressed();
            if held_back > 0 {
                log::warn!("({} similar messages suppressed)", held_back);
            }
            log::warn!($($arg)*);
        }
    };
}
