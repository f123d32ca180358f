//! # PPS Error Handling
//!
//! This module defines the PpsError enum, which represents the different error
//! types that can occur in the ppsmon crate.
//!
//! Integrity failures of single telegrams are not errors: they are verdicts
//! (see [`crate::pps::telegram::Verdict`]) that the pipeline recovers from
//! locally. `PpsError` covers what cannot be recovered that way.

use thiserror::Error;

/// Represents the different error types that can occur in the PPS crate.
#[derive(Debug, Error)]
pub enum PpsError {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// Indicates a failure of the underlying byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Indicates bytes that cannot form a PPS telegram.
    #[error("Invalid telegram: {0}")]
    InvalidTelegram(String),

    /// Indicates a failure to drive the interface board supply pin.
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// Indicates a failure while writing decoded values to an output.
    #[error("Output error: {0}")]
    Output(String),
}
