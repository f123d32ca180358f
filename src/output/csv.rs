//! CSV records of the value store
//!
//! A row is written whenever `record_size` distinct metrics have been
//! updated since the previous row. Each row carries the latest value of
//! every metric, however long ago it was received, so the columns stay
//! fixed: `time` (Unix seconds) followed by all metrics in name order.
//!
//! Unknown telegrams, when requested, are interleaved as diagnostic lines in
//! the text layout.

use super::{write_err, write_unknown_line, ReadingSink};
use crate::error::PpsError;
use crate::pps::decode::{MetricId, Reading, UnknownTelegram};
use crate::pps::telegram::ValidatedTelegram;
use crate::store::{ValueSnapshot, ValueStore};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::io::Write;

/// Distinct updates per row used by the command-line tool
pub const DEFAULT_RECORD_SIZE: usize = 11;

pub struct CsvEmitter<W> {
    out: W,
    columns: Vec<MetricId>,
    record_size: usize,
    header_pending: bool,
    updated: HashSet<MetricId>,
    rows_written: u64,
}

impl<W: Write> CsvEmitter<W> {
    /// `header` requests a header line before the first row
    pub fn new(out: W, header: bool) -> Self {
        Self::with_record_size(out, header, DEFAULT_RECORD_SIZE)
    }

    pub fn with_record_size(out: W, header: bool, record_size: usize) -> Self {
        CsvEmitter {
            out,
            columns: MetricId::sorted_by_name(),
            record_size: record_size.clamp(1, MetricId::ALL.len()),
            header_pending: header,
            updated: HashSet::new(),
            rows_written: 0,
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self) -> Result<(), PpsError> {
        let mut line = String::from("time");
        for metric in &self.columns {
            line.push(',');
            line.push_str(metric.name());
        }
        writeln!(self.out, "{line}").map_err(write_err)
    }

    /// Write one row from `snapshot`, stamped with `now`
    pub fn write_row(&mut self, snapshot: &ValueSnapshot, now: DateTime<Utc>) -> Result<(), PpsError> {
        if self.header_pending {
            self.write_header()?;
            self.header_pending = false;
        }
        let mut line = now.timestamp().to_string();
        for metric in &self.columns {
            line.push(',');
            if let Some(v) = snapshot.get(*metric) {
                line.push_str(&v.reading.value.to_string());
            }
        }
        writeln!(self.out, "{line}").map_err(write_err)?;
        self.out.flush().map_err(write_err)?;
        self.rows_written += 1;
        Ok(())
    }
}

impl<W: Write> ReadingSink for CsvEmitter<W> {
    fn on_reading(
        &mut self,
        reading: &Reading,
        _telegram: &ValidatedTelegram,
        store: &ValueStore,
    ) -> Result<(), PpsError> {
        self.updated.insert(reading.metric);
        if self.updated.len() >= self.record_size {
            self.updated.clear();
            self.write_row(&store.snapshot(), Utc::now())?;
        }
        Ok(())
    }

    fn on_unknown(&mut self, unknown: &UnknownTelegram) -> Result<(), PpsError> {
        write_unknown_line(&mut self.out, unknown)
    }
}
