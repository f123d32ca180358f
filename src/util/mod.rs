//! # Utility Modules
//!
//! Hex encoding for raw telegram display and rate-limited logging for
//! integrity failures.

pub mod hex;
pub mod logging;

pub use hex::{decode_hex, encode_hex, format_hex_compact};
pub use logging::{log_telegram_hex, LogThrottle};
