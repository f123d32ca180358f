//! # PPS Monitor
//!
//! The monitor runs the receive pipeline: it pulls candidate telegrams from
//! a [`TelegramReader`], validates and classifies them, keeps the
//! [`ValueStore`] current and hands each decoded reading (and, on request,
//! each unknown telegram) to its caller.
//!
//! ```rust,no_run
//! use ppsmon::monitor::{Monitor, MonitorConfig, MonitorEvent};
//! use ppsmon::pps::serial::{open_serial, SerialConfig};
//!
//! # async fn run() -> Result<(), ppsmon::PpsError> {
//! let source = open_serial("/dev/serial0", &SerialConfig::default())?;
//! let mut monitor = Monitor::new(source, MonitorConfig::default());
//! while let Some(event) = monitor.next_event().await? {
//!     if let MonitorEvent::Reading { reading, .. } = event {
//!         println!("{} {}: {}", reading.origin.label(), reading.metric, reading.value);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::PpsError;
use crate::pps::decode::{Classification, DecodeTable, Reading, UnknownTelegram};
use crate::pps::frame::TelegramReader;
use crate::pps::source::ByteSource;
use crate::pps::telegram::{validate, ValidatedTelegram, Verdict};
use crate::store::ValueStore;
use crate::util::logging::{log_telegram_hex, LogThrottle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Pipeline options
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    /// Stop after this many valid telegrams
    pub limit: Option<u64>,
    /// Report telegrams outside the monitored set
    pub show_unknown: bool,
}

/// Counters kept by the monitor
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MonitorStats {
    pub telegrams_valid: u64,
    pub telegrams_decoded: u64,
    pub telegrams_unknown: u64,
    pub checksum_errors: u64,
    pub short_telegrams: u64,
}

/// Output of one pipeline step
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// A monitored value was decoded and stored
    Reading {
        reading: Reading,
        telegram: ValidatedTelegram,
    },
    /// A valid telegram outside the monitored set
    Unknown(UnknownTelegram),
}

/// Sequential receive pipeline over one byte source
pub struct Monitor<S> {
    reader: TelegramReader<S>,
    table: &'static DecodeTable,
    store: Arc<ValueStore>,
    config: MonitorConfig,
    stats: MonitorStats,
    shutdown: Arc<AtomicBool>,
    error_throttle: LogThrottle,
}

impl<S: ByteSource> Monitor<S> {
    pub fn new(source: S, config: MonitorConfig) -> Self {
        Self::with_store(source, config, Arc::new(ValueStore::new()))
    }

    /// Create a monitor that writes into an existing store
    pub fn with_store(source: S, config: MonitorConfig, store: Arc<ValueStore>) -> Self {
        Monitor {
            reader: TelegramReader::new(source),
            table: DecodeTable::standard(),
            store,
            config,
            stats: MonitorStats::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
            error_throttle: LogThrottle::default(),
        }
    }

    /// Shared handle to the value store
    pub fn store(&self) -> Arc<ValueStore> {
        Arc::clone(&self.store)
    }

    /// Flag that ends the event sequence at the next idle gap when set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    fn limit_reached(&self) -> bool {
        self.config
            .limit
            .is_some_and(|limit| self.stats.telegrams_valid >= limit)
    }

    /// Advance the pipeline to the next reportable event.
    ///
    /// Returns `Ok(None)` once the stream has ended, the telegram limit has
    /// been reached or shutdown was requested.
    pub async fn next_event(&mut self) -> Result<Option<MonitorEvent>, PpsError> {
        loop {
            if self.limit_reached() || self.shutdown.load(Ordering::Relaxed) {
                return Ok(None);
            }

            let shutdown = Arc::clone(&self.shutdown);
            let stop = move || shutdown.load(Ordering::Relaxed);
            let raw = match self.reader.next_raw_or_idle(&stop).await? {
                Some(raw) => raw,
                None => return Ok(None),
            };

            let telegram = validate(raw);
            match telegram.verdict {
                Verdict::Valid => {}
                Verdict::TooShort { length } => {
                    self.stats.short_telegrams += 1;
                    crate::log_warn_throttled!(
                        self.error_throttle,
                        "Invalid telegram length {}",
                        length
                    );
                    // Only a gap closes a short candidate, so the framer is
                    // already aligned with the next telegram.
                    log_telegram_hex("Short telegram", telegram.bytes());
                    continue;
                }
                Verdict::ChecksumMismatch {
                    expected,
                    calculated,
                } => {
                    self.stats.checksum_errors += 1;
                    crate::log_warn_throttled!(
                        self.error_throttle,
                        "CRC error in received telegram: expected {:02x}, calculated {:02x}",
                        expected,
                        calculated
                    );
                    log_telegram_hex("Corrupt telegram", telegram.bytes());
                    self.reader.resync_after(telegram.bytes());
                    continue;
                }
            }

            self.stats.telegrams_valid += 1;
            match self.table.classify(&telegram) {
                Classification::Known(reading) => {
                    self.stats.telegrams_decoded += 1;
                    self.store.update(reading);
                    return Ok(Some(MonitorEvent::Reading { reading, telegram }));
                }
                Classification::Unknown(unknown) => {
                    self.stats.telegrams_unknown += 1;
                    log::debug!("Unknown telegram ({}): {}", unknown.reason, telegram.describe());
                    if self.config.show_unknown {
                        return Ok(Some(MonitorEvent::Unknown(unknown)));
                    }
                }
            }
        }
    }

    /// Framer counters of the underlying reader
    pub fn framer_stats(&self) -> crate::pps::frame::FramerStats {
        self.reader.framer().stats()
    }
}
