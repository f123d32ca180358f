//! # PPS Telegram Validation
//!
//! Every PPS telegram is nine bytes long:
//!
//! ```text
//! addr | type | b2 | b3 | b4 | b5 | value hi | value lo | checksum
//! ```
//!
//! The checksum is the two's complement of the byte sum of the first eight
//! bytes, so the wrapping sum over a complete, intact telegram is zero.
//!
//! ```rust
//! use ppsmon::pps::telegram::{pack_telegram, validate, Verdict};
//! use ppsmon::pps::RawTelegram;
//!
//! let bytes = pack_telegram(0xFD, 0x28, 1389);
//! let checked = validate(RawTelegram::new(bytes.to_vec()));
//! assert_eq!(checked.verdict, Verdict::Valid);
//! ```

use crate::constants::{PPS_PAYLOAD_LEN, PPS_TELEGRAM_LEN, PPS_VALUE_OFFSET};
use crate::pps::frame::RawTelegram;
use crate::util::hex::format_hex_compact;

/// Integrity verdict for one candidate telegram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    ChecksumMismatch { expected: u8, calculated: u8 },
    TooShort { length: usize },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    /// Whether the framer has to realign after this verdict. A short
    /// candidate was closed by a gap, so the framer is aligned already.
    pub fn needs_resync(&self) -> bool {
        matches!(self, Verdict::ChecksumMismatch { .. })
    }
}

/// A candidate telegram together with its integrity verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTelegram {
    pub raw: RawTelegram,
    pub verdict: Verdict,
}

impl ValidatedTelegram {
    /// All received bytes, checksum included
    pub fn bytes(&self) -> &[u8] {
        &self.raw.bytes
    }

    /// The checksummed part of the telegram (empty unless valid)
    pub fn payload(&self) -> &[u8] {
        if self.verdict.is_valid() {
            &self.raw.bytes[..PPS_PAYLOAD_LEN]
        } else {
            &[]
        }
    }

    /// Address byte of the transmitting device
    pub fn address(&self) -> Option<u8> {
        self.raw.bytes.first().copied()
    }

    /// Telegram type byte
    pub fn telegram_type(&self) -> Option<u8> {
        self.raw.bytes.get(1).copied()
    }

    /// Big-endian 16-bit value field
    pub fn value_field(&self) -> Option<u16> {
        let hi = *self.raw.bytes.get(PPS_VALUE_OFFSET)?;
        let lo = *self.raw.bytes.get(PPS_VALUE_OFFSET + 1)?;
        Some(u16::from_be_bytes([hi, lo]))
    }

    /// Raw rendering used by the diagnostic outputs: the checksummed bytes
    /// in hex followed by the value field read as a temperature.
    pub fn describe(&self) -> String {
        let shown = if self.verdict.is_valid() {
            self.payload()
        } else {
            self.bytes()
        };
        match self.value_field() {
            Some(v) => format!(
                "{} (T={})",
                format_hex_compact(shown),
                crate::pps::decode::format_temperature(v as i16)
            ),
            None => format_hex_compact(shown),
        }
    }
}

/// Calculates the checksum byte for the given telegram payload.
pub fn checksum(payload: &[u8]) -> u8 {
    payload
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b))
        .wrapping_neg()
}

/// Checks a candidate telegram: length first, then checksum.
pub fn validate(raw: RawTelegram) -> ValidatedTelegram {
    let verdict = if raw.bytes.len() < PPS_TELEGRAM_LEN {
        Verdict::TooShort {
            length: raw.bytes.len(),
        }
    } else {
        let expected = raw.bytes[PPS_PAYLOAD_LEN];
        let calculated = checksum(&raw.bytes[..PPS_PAYLOAD_LEN]);
        if expected == calculated {
            Verdict::Valid
        } else {
            Verdict::ChecksumMismatch {
                expected,
                calculated,
            }
        }
    };
    ValidatedTelegram { raw, verdict }
}

/// Packs a telegram with the given address, type and 16-bit value field,
/// zero filler bytes and a correct checksum.
pub fn pack_telegram(address: u8, telegram_type: u8, value: u16) -> [u8; PPS_TELEGRAM_LEN] {
    let mut t = [0u8; PPS_TELEGRAM_LEN];
    t[0] = address;
    t[1] = telegram_type;
    t[PPS_VALUE_OFFSET..PPS_VALUE_OFFSET + 2].copy_from_slice(&value.to_be_bytes());
    t[PPS_PAYLOAD_LEN] = checksum(&t[..PPS_PAYLOAD_LEN]);
    t
}
