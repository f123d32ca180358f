//! # PPS Serial Communication
//!
//! Opens the serial device that the bus interface board is wired to and
//! wraps it as a [`ByteSource`](crate::pps::source::ByteSource). The link is
//! receive-only; nothing is ever written to the port.

use crate::constants::{PPS_BAUDRATE, PPS_BITS_PER_CHAR, PPS_GAP_CHARS};
use crate::error::PpsError;
use crate::pps::source::StreamSource;
use std::time::Duration;
use tokio_serial::SerialPortBuilderExt;

/// Configuration for serial connection.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub baudrate: u32,
    /// Line silence that separates two telegrams
    pub gap: Duration,
}

impl SerialConfig {
    /// Configuration for the given line speed, with the gap set to ten
    /// character times.
    pub fn for_baudrate(baudrate: u32) -> Self {
        SerialConfig {
            baudrate,
            gap: gap_for_baudrate(baudrate),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::for_baudrate(PPS_BAUDRATE)
    }
}

/// Duration of [`PPS_GAP_CHARS`] characters at the given line speed
pub fn gap_for_baudrate(baudrate: u32) -> Duration {
    let chars_per_sec = (baudrate / PPS_BITS_PER_CHAR).max(1) as u64;
    Duration::from_micros(1_000_000 * PPS_GAP_CHARS as u64 / chars_per_sec)
}

/// Byte source reading from a serial device
pub type SerialSource = StreamSource<tokio_serial::SerialStream>;

/// Opens the serial port (8 data bits, no parity, one stop bit).
pub fn open_serial(port_name: &str, config: &SerialConfig) -> Result<SerialSource, PpsError> {
    let port = tokio_serial::new(port_name, config.baudrate)
        .data_bits(tokio_serial::DataBits::Eight)
        .stop_bits(tokio_serial::StopBits::One)
        .parity(tokio_serial::Parity::None)
        .flow_control(tokio_serial::FlowControl::None)
        .timeout(config.gap)
        .open_native_async()
        .map_err(|e| PpsError::SerialPortError(format!("{port_name}: {e}")))?;

    Ok(StreamSource::new(port, config.gap))
}
