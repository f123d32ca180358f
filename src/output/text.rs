//! Human-readable line per decoded telegram

use super::{write_err, write_unknown_line, ReadingSink};
use crate::error::PpsError;
use crate::pps::decode::{Reading, UnknownTelegram};
use crate::pps::telegram::ValidatedTelegram;
use crate::store::ValueStore;
use std::io::Write;

/// Writes `Room unit:  Actual room temp: 21.7` style lines
pub struct TextEmitter<W> {
    out: W,
    /// Also print every decoded telegram's bytes
    show_raw: bool,
}

impl<W: Write> TextEmitter<W> {
    pub fn new(out: W, show_raw: bool) -> Self {
        TextEmitter { out, show_raw }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReadingSink for TextEmitter<W> {
    fn on_reading(
        &mut self,
        reading: &Reading,
        telegram: &ValidatedTelegram,
        _store: &ValueStore,
    ) -> Result<(), PpsError> {
        let peer = reading.origin.label();
        writeln!(self.out, "{:<11} {}: {}", peer, reading.metric, reading.value).map_err(write_err)?;
        if self.show_raw {
            writeln!(self.out, "{:<11} {}", peer, telegram.describe()).map_err(write_err)?;
        }
        self.out.flush().map_err(write_err)
    }

    fn on_unknown(&mut self, unknown: &UnknownTelegram) -> Result<(), PpsError> {
        write_unknown_line(&mut self.out, unknown)
    }
}
