//! # ppsmon - Passive monitor for the PPS / H-Bus heating bus
//!
//! The ppsmon crate listens to the two-wire PPS bus that connects a heating
//! controller with its room unit. It reassembles the 9-byte telegrams
//! exchanged on the bus, verifies their checksums, decodes the values the
//! two peers report to each other (temperatures, operating mode, presence)
//! and keeps the latest value of each.
//!
//! ## Features
//!
//! - Receive-only access to the bus through a serial port (4800 baud, 8N1)
//! - Gap-based telegram framing with resynchronisation after corruption
//! - Decoding of the monitored room unit and controller values
//! - A shared store of the latest value per metric
//! - Text, CSV and netdata external-plugin output
//! - Optional power-up of the interface board on a Raspberry Pi
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! ppsmon-rs = "1.0.0"
//! ```
//!
//! ```rust,no_run
//! use ppsmon::{connect, Monitor, MonitorConfig, MonitorEvent};
//!
//! # async fn run() -> Result<(), ppsmon::PpsError> {
//! let mut monitor = Monitor::new(connect("/dev/serial0")?, MonitorConfig::default());
//! while let Some(event) = monitor.next_event().await? {
//!     if let MonitorEvent::Reading { reading, .. } = event {
//!         println!("{}: {}", reading.metric, reading.value);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod error;
#[cfg(feature = "raspberry-pi")]
pub mod gpio;
pub mod logging;
pub mod monitor;
pub mod output;
pub mod pps;
pub mod store;
pub mod util;

pub use crate::error::PpsError;
pub use crate::logging::{init_logger, log_info};

// Bus side
pub use pps::decode::{Classification, DecodeTable, DecodedValue, MetricId, Origin, Reading, UnknownTelegram};
pub use pps::serial::{SerialConfig, SerialSource};
pub use pps::telegram::{ValidatedTelegram, Verdict};

// Pipeline and state
pub use monitor::{Monitor, MonitorConfig, MonitorEvent, MonitorStats};
pub use store::{ValueSnapshot, ValueStore};

// Outputs
pub use output::{CsvEmitter, NetdataEmitter, ReadingSink, TextEmitter};

/// Open the bus interface on a serial port with the default line settings.
///
/// # Arguments
/// * `port` - Serial port path (e.g., "/dev/serial0" on a Raspberry Pi)
///
/// # Returns
/// * `Ok(SerialSource)` - Byte source ready to be handed to a [`Monitor`]
/// * `Err(PpsError)` - The port could not be opened
pub fn connect(port: &str) -> Result<SerialSource, PpsError> {
    pps::serial::open_serial(port, &SerialConfig::default())
}

/// Decode a single telegram given as raw bytes.
///
/// # Arguments
/// * `bytes` - Exactly the bytes of one telegram, checksum included
///
/// # Returns
/// * `Ok(Classification)` - The telegram passed its integrity checks
/// * `Err(PpsError)` - The bytes do not form a valid telegram
pub fn decode_telegram(bytes: &[u8]) -> Result<Classification, PpsError> {
    let telegram = pps::telegram::validate(pps::frame::RawTelegram::new(bytes.to_vec()));
    match telegram.verdict {
        Verdict::Valid => Ok(DecodeTable::standard().classify(&telegram)),
        Verdict::TooShort { length } => Err(PpsError::InvalidTelegram(format!(
            "length {length}, expected {}",
            constants::PPS_TELEGRAM_LEN
        ))),
        Verdict::ChecksumMismatch { expected, calculated } => Err(PpsError::InvalidTelegram(format!(
            "checksum {expected:02x}, calculated {calculated:02x}"
        ))),
    }
}
