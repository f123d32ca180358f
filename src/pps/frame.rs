//! # PPS Telegram Framing
//!
//! The bus has no start or stop markers. Telegrams are fixed nine-byte
//! units separated by idle time, with an occasional lone sync byte (`0x17`)
//! from the controller. [`Framer`] recovers telegram boundaries from a
//! stream of [`ByteEvent`]s:
//!
//! - an idle gap always closes the current candidate;
//! - a candidate is handed over as soon as it holds nine bytes, so
//!   back-to-back telegrams are split even when no gap is observed;
//! - after an integrity failure the framer rescans the failed candidate for
//!   a known device address, then hunts: bytes are discarded until one
//!   appears or the line goes idle;
//! - bytes still pending when the stream ends are dropped.
//!
//! [`Framer`] does no I/O. [`TelegramReader`] drives it from a
//! [`ByteSource`] and is what the monitor pulls candidates from.

use crate::constants::{
    PPS_ADDRESS_CONTROLLER, PPS_ADDRESS_ROOM_UNIT, PPS_SYNC_BYTE, PPS_TELEGRAM_LEN,
};
use crate::error::PpsError;
use crate::pps::source::{ByteEvent, ByteSource};
use crate::util::logging::log_telegram_hex;

/// A candidate telegram as received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTelegram {
    pub bytes: Vec<u8>,
    /// Set when an idle gap cut the candidate short of a full telegram
    pub truncated: bool,
}

impl RawTelegram {
    pub fn new(bytes: Vec<u8>) -> Self {
        RawTelegram {
            bytes,
            truncated: false,
        }
    }

    pub fn truncated(bytes: Vec<u8>) -> Self {
        RawTelegram {
            bytes,
            truncated: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramerState {
    /// Between telegrams; the next byte starts a candidate
    Idle,
    /// Inside a candidate
    Collecting,
    /// Discarding bytes until a plausible telegram start
    Hunting,
}

/// Counters kept by the framer
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FramerStats {
    pub candidates: u64,
    pub sync_bytes: u64,
    pub bytes_discarded: u64,
}

/// Sans-io telegram boundary recovery
#[derive(Debug)]
pub struct Framer {
    buf: Vec<u8>,
    state: FramerState,
    stats: FramerStats,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true for bytes that can start a telegram while hunting.
pub fn is_plausible_preamble(byte: u8) -> bool {
    byte == PPS_ADDRESS_ROOM_UNIT || byte == PPS_ADDRESS_CONTROLLER
}

impl Framer {
    pub fn new() -> Self {
        Framer {
            buf: Vec::with_capacity(PPS_TELEGRAM_LEN),
            state: FramerState::Idle,
            stats: FramerStats::default(),
        }
    }

    /// Feed one event; returns a candidate when one is complete.
    pub fn push(&mut self, event: ByteEvent) -> Option<RawTelegram> {
        match event {
            ByteEvent::Byte(b) => self.push_byte(b),
            ByteEvent::Gap => {
                if self.state == FramerState::Hunting {
                    self.state = FramerState::Idle;
                }
                if self.buf.is_empty() {
                    None
                } else {
                    self.state = FramerState::Idle;
                    Some(self.emit(true))
                }
            }
            ByteEvent::End => {
                if !self.buf.is_empty() {
                    log_telegram_hex("Discarding partial telegram at end of stream", &self.buf);
                    self.stats.bytes_discarded += self.buf.len() as u64;
                    self.buf.clear();
                }
                self.state = FramerState::Idle;
                None
            }
        }
    }

    fn push_byte(&mut self, b: u8) -> Option<RawTelegram> {
        match self.state {
            FramerState::Idle if b == PPS_SYNC_BYTE => {
                self.stats.sync_bytes += 1;
                None
            }
            FramerState::Hunting if !is_plausible_preamble(b) => {
                self.stats.bytes_discarded += 1;
                None
            }
            _ => {
                self.state = FramerState::Collecting;
                self.buf.push(b);
                if self.buf.len() == PPS_TELEGRAM_LEN {
                    self.state = FramerState::Idle;
                    Some(self.emit(false))
                } else {
                    None
                }
            }
        }
    }

    fn emit(&mut self, truncated: bool) -> RawTelegram {
        self.stats.candidates += 1;
        let bytes = std::mem::replace(&mut self.buf, Vec::with_capacity(PPS_TELEGRAM_LEN));
        RawTelegram { bytes, truncated }
    }

    /// Drop alignment after an integrity failure and hunt for the next
    /// telegram start.
    pub fn resync(&mut self) {
        self.stats.bytes_discarded += self.buf.len() as u64;
        self.buf.clear();
        self.state = FramerState::Hunting;
    }

    /// Resynchronise after `failed` did not pass its integrity check.
    ///
    /// The next telegram may already have started inside the failed
    /// candidate when a byte was lost or inserted on a gapless stream, so the
    /// candidate is rescanned from its second byte for a device address. The
    /// bytes from there on become the start of the next candidate; without
    /// one the framer hunts through new bytes.
    pub fn resync_after(&mut self, failed: &[u8]) {
        self.stats.bytes_discarded += self.buf.len() as u64;
        self.buf.clear();
        match failed.iter().skip(1).position(|b| is_plausible_preamble(*b)) {
            Some(i) => {
                let start = i + 1;
                self.stats.bytes_discarded += start as u64;
                self.buf.extend_from_slice(&failed[start..]);
                self.state = FramerState::Collecting;
            }
            None => {
                self.stats.bytes_discarded += failed.len() as u64;
                self.state = FramerState::Hunting;
            }
        }
    }

    /// True while hunting for a telegram start
    pub fn is_hunting(&self) -> bool {
        self.state == FramerState::Hunting
    }

    pub fn stats(&self) -> FramerStats {
        self.stats
    }
}

/// Pulls candidate telegrams out of a [`ByteSource`]
pub struct TelegramReader<S> {
    source: S,
    framer: Framer,
    ended: bool,
}

impl<S: ByteSource> TelegramReader<S> {
    pub fn new(source: S) -> Self {
        TelegramReader {
            source,
            framer: Framer::new(),
            ended: false,
        }
    }

    /// Wait for the next candidate. `Ok(None)` means the stream has ended.
    pub async fn next_raw(&mut self) -> Result<Option<RawTelegram>, PpsError> {
        self.next_raw_or_idle(&|| false).await
    }

    /// Like [`next_raw`](Self::next_raw), but gives up at the next gap once
    /// `stop` returns true. Used to honour shutdown on a silent bus.
    pub async fn next_raw_or_idle(
        &mut self,
        stop: &(dyn Fn() -> bool + Sync),
    ) -> Result<Option<RawTelegram>, PpsError> {
        if self.ended {
            return Ok(None);
        }
        loop {
            let event = self.source.next_event().await?;
            if event == ByteEvent::End {
                self.framer.push(event);
                self.ended = true;
                return Ok(None);
            }
            if let Some(raw) = self.framer.push(event) {
                return Ok(Some(raw));
            }
            if event == ByteEvent::Gap && stop() {
                return Ok(None);
            }
        }
    }

    /// See [`Framer::resync`]
    pub fn resync(&mut self) {
        self.framer.resync();
    }

    /// See [`Framer::resync_after`]
    pub fn resync_after(&mut self, failed: &[u8]) {
        self.framer.resync_after(failed);
    }

    pub fn framer(&self) -> &Framer {
        &self.framer
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}
