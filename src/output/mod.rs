//! # Output Adapters
//!
//! Renderers for decoded bus values. The text and CSV emitters react to
//! every decoded reading; the netdata emitter is polled on its own schedule
//! and renders whatever the value store holds at that moment.

pub mod csv;
pub mod netdata;
pub mod text;

use crate::error::PpsError;
use crate::pps::decode::{Reading, UnknownTelegram};
use crate::pps::telegram::ValidatedTelegram;
use crate::store::ValueStore;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

pub use self::csv::CsvEmitter;
pub use self::netdata::NetdataEmitter;
pub use self::text::TextEmitter;

/// Receiver of pipeline results
pub trait ReadingSink {
    /// Called after `reading` has been stored
    fn on_reading(
        &mut self,
        reading: &Reading,
        telegram: &ValidatedTelegram,
        store: &ValueStore,
    ) -> Result<(), PpsError>;

    /// Called for telegrams outside the monitored set, when requested
    fn on_unknown(&mut self, _unknown: &UnknownTelegram) -> Result<(), PpsError> {
        Ok(())
    }
}

/// Destination of an emitter: stdout or a file opened for appending
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write + Send>, PpsError> {
    match path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| PpsError::Output(format!("{}: {e}", path.display())))?;
            Ok(Box::new(io::BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

pub(crate) fn write_err(e: io::Error) -> PpsError {
    PpsError::Output(e.to_string())
}

/// Diagnostic line for a telegram outside the monitored set, shared by the
/// text and CSV emitters
pub(crate) fn write_unknown_line<W: Write + ?Sized>(out: &mut W, unknown: &UnknownTelegram) -> Result<(), PpsError> {
    writeln!(out, "{:<11} {}", unknown.peer_label(), unknown.telegram.describe()).map_err(write_err)?;
    out.flush().map_err(write_err)
}
