//! # PPS Telegram Classification and Decoding
//!
//! A valid telegram is identified by its first two bytes: the address of the
//! transmitting device and the telegram type. The [`DecodeTable`] maps each
//! monitored (address, type) pair to a metric, the transmitting device and
//! the rule that turns the value field into a [`DecodedValue`].
//!
//! Value rules:
//!
//! - temperatures are a big-endian signed 16-bit field (bytes 6 and 7) in
//!   1/64 °C, reported with one decimal place;
//! - flow and boiler temperatures read `0x8001` when the sensor is not
//!   fitted;
//! - authority, mode, presence and absence days live in byte 7.
//!
//! Anything else is classified [`Classification::Unknown`] and carries the
//! telegram for diagnostic display.

use crate::constants::*;
use crate::pps::telegram::ValidatedTelegram;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// The values monitored on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetricId {
    SetDefaultRoomTemp,
    SetAbsentRoomTemp,
    SetDhwTemp,
    SetRoomTemp,
    ActualRoomTemp,
    OutsideTemp,
    ActualFlowTemp,
    ActualDhwTemp,
    ActualBoilerTemp,
    Authority,
    Mode,
    Present,
    RemainingAbsenceDays,
}

impl MetricId {
    pub const ALL: [MetricId; 13] = [
        MetricId::SetDefaultRoomTemp,
        MetricId::SetAbsentRoomTemp,
        MetricId::SetDhwTemp,
        MetricId::SetRoomTemp,
        MetricId::ActualRoomTemp,
        MetricId::OutsideTemp,
        MetricId::ActualFlowTemp,
        MetricId::ActualDhwTemp,
        MetricId::ActualBoilerTemp,
        MetricId::Authority,
        MetricId::Mode,
        MetricId::Present,
        MetricId::RemainingAbsenceDays,
    ];

    /// Human-readable name, also used as CSV column header
    pub fn name(&self) -> &'static str {
        match self {
            MetricId::SetDefaultRoomTemp => "Set present room temp",
            MetricId::SetAbsentRoomTemp => "Set absent room temp",
            MetricId::SetDhwTemp => "Set DHW temp",
            MetricId::SetRoomTemp => "Set room temp",
            MetricId::ActualRoomTemp => "Actual room temp",
            MetricId::OutsideTemp => "Outside temp",
            MetricId::ActualFlowTemp => "Actual flow temp",
            MetricId::ActualDhwTemp => "Actual DHW temp",
            MetricId::ActualBoilerTemp => "Actual boiler temp",
            MetricId::Authority => "Authority",
            MetricId::Mode => "Mode",
            MetricId::Present => "Present",
            MetricId::RemainingAbsenceDays => "Remaining absence days",
        }
    }

    /// Telegram type byte carrying this metric
    pub fn telegram_type(&self) -> u8 {
        match self {
            MetricId::SetDefaultRoomTemp => PPS_TYPE_SET_DEFAULT_ROOM_TEMP,
            MetricId::SetAbsentRoomTemp => PPS_TYPE_SET_ABSENT_ROOM_TEMP,
            MetricId::SetDhwTemp => PPS_TYPE_SET_DHW_TEMP,
            MetricId::SetRoomTemp => PPS_TYPE_SET_ROOM_TEMP,
            MetricId::ActualRoomTemp => PPS_TYPE_ACTUAL_ROOM_TEMP,
            MetricId::OutsideTemp => PPS_TYPE_OUTSIDE_TEMP,
            MetricId::ActualFlowTemp => PPS_TYPE_ACTUAL_FLOW_TEMP,
            MetricId::ActualDhwTemp => PPS_TYPE_ACTUAL_DHW_TEMP,
            MetricId::ActualBoilerTemp => PPS_TYPE_ACTUAL_BOILER_TEMP,
            MetricId::Authority => PPS_TYPE_AUTHORITY,
            MetricId::Mode => PPS_TYPE_MODE,
            MetricId::Present => PPS_TYPE_PRESENT,
            MetricId::RemainingAbsenceDays => PPS_TYPE_REMAINING_ABSENCE_DAYS,
        }
    }

    fn rule(&self) -> DecodeRule {
        match self {
            MetricId::ActualFlowTemp | MetricId::ActualBoilerTemp => DecodeRule::CheckedTemperature,
            MetricId::Authority => DecodeRule::Authority,
            MetricId::Mode => DecodeRule::Mode,
            MetricId::Present => DecodeRule::Present,
            MetricId::RemainingAbsenceDays => DecodeRule::Count,
            _ => DecodeRule::Temperature,
        }
    }

    /// Metrics ordered by name
    pub fn sorted_by_name() -> Vec<MetricId> {
        let mut all = Self::ALL.to_vec();
        all.sort_by_key(|m| m.name());
        all
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The device that transmitted a telegram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    RoomUnit,
    Controller,
}

impl Origin {
    pub fn from_address(address: u8) -> Option<Origin> {
        match address {
            PPS_ADDRESS_ROOM_UNIT => Some(Origin::RoomUnit),
            PPS_ADDRESS_CONTROLLER => Some(Origin::Controller),
            _ => None,
        }
    }

    pub fn address(&self) -> u8 {
        match self {
            Origin::RoomUnit => PPS_ADDRESS_ROOM_UNIT,
            Origin::Controller => PPS_ADDRESS_CONTROLLER,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Origin::RoomUnit => "Room unit:",
            Origin::Controller => "Controller:",
        }
    }
}

/// A decoded telegram value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedValue {
    /// Degrees Celsius, rounded to one decimal place
    Temperature(f64),
    Enum(&'static str),
    Boolean(bool),
    Count(u8),
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Temperature(t) => write!(f, "{t:.1}"),
            DecodedValue::Enum(label) => f.write_str(label),
            DecodedValue::Boolean(b) => write!(f, "{b}"),
            DecodedValue::Count(n) => write!(f, "{n}"),
        }
    }
}

/// One decoded metric value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub metric: MetricId,
    pub origin: Origin,
    pub value: DecodedValue,
    /// Undecoded field: the 1/64 °C count for temperatures, byte 7 otherwise
    pub raw: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeRule {
    Temperature,
    /// Temperature that reads [`PPS_TEMP_UNAVAILABLE`] when not fitted
    CheckedTemperature,
    Authority,
    Mode,
    Present,
    Count,
}

/// Entry of the decode table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeEntry {
    pub metric: MetricId,
    pub origin: Origin,
    rule: DecodeRule,
}

/// Why a valid telegram was not decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownReason {
    UnknownPeer(u8),
    UnknownType(u8),
    SensorUnavailable(MetricId),
    ValueOutOfRange { metric: MetricId, value: u8 },
    NotValid,
}

impl fmt::Display for UnknownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownReason::UnknownPeer(a) => write!(f, "unknown peer 0x{a:02x}"),
            UnknownReason::UnknownType(t) => write!(f, "unknown telegram type 0x{t:02x}"),
            UnknownReason::SensorUnavailable(m) => write!(f, "{m} sensor unavailable"),
            UnknownReason::ValueOutOfRange { metric, value } => {
                write!(f, "{metric} value {value} out of range")
            }
            UnknownReason::NotValid => f.write_str("telegram failed validation"),
        }
    }
}

/// A telegram outside the monitored set, kept for diagnostic display
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownTelegram {
    pub telegram: ValidatedTelegram,
    pub reason: UnknownReason,
    pub received_at: DateTime<Utc>,
}

impl UnknownTelegram {
    /// Device label, or the address in hex for unknown devices
    pub fn peer_label(&self) -> String {
        let address = self.telegram.address().unwrap_or_default();
        match Origin::from_address(address) {
            Some(origin) => origin.label().to_string(),
            None => format!("0x{address:02x}:"),
        }
    }
}

/// Result of classifying a valid telegram
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Known(Reading),
    Unknown(UnknownTelegram),
}

/// Static map from (address, type) to decode rule
#[derive(Debug, Clone)]
pub struct DecodeTable {
    entries: HashMap<(u8, u8), DecodeEntry>,
}

static STANDARD_TABLE: Lazy<DecodeTable> = Lazy::new(DecodeTable::new);

impl Default for DecodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeTable {
    /// Build the table for all monitored metrics and both devices
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        for origin in [Origin::RoomUnit, Origin::Controller] {
            for metric in MetricId::ALL {
                entries.insert(
                    (origin.address(), metric.telegram_type()),
                    DecodeEntry {
                        metric,
                        origin,
                        rule: metric.rule(),
                    },
                );
            }
        }
        DecodeTable { entries }
    }

    /// The process-wide table, built on first use
    pub fn standard() -> &'static DecodeTable {
        &STANDARD_TABLE
    }

    pub fn lookup(&self, address: u8, telegram_type: u8) -> Option<&DecodeEntry> {
        self.entries.get(&(address, telegram_type))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Classify a validated telegram and decode its value.
    pub fn classify(&self, telegram: &ValidatedTelegram) -> Classification {
        match self.decode(telegram) {
            Ok(reading) => Classification::Known(reading),
            Err(reason) => Classification::Unknown(UnknownTelegram {
                telegram: telegram.clone(),
                reason,
                received_at: Utc::now(),
            }),
        }
    }

    fn decode(&self, telegram: &ValidatedTelegram) -> Result<Reading, UnknownReason> {
        if !telegram.verdict.is_valid() {
            return Err(UnknownReason::NotValid);
        }
        let payload = telegram.payload();
        let (address, telegram_type) = (payload[0], payload[1]);
        let entry = self.lookup(address, telegram_type).ok_or_else(|| {
            if Origin::from_address(address).is_none() {
                UnknownReason::UnknownPeer(address)
            } else {
                UnknownReason::UnknownType(telegram_type)
            }
        })?;

        let field = u16::from_be_bytes([payload[PPS_VALUE_OFFSET], payload[PPS_VALUE_OFFSET + 1]]);
        let low = payload[PPS_VALUE_LOW_OFFSET];

        let (value, raw) = match entry.rule {
            DecodeRule::CheckedTemperature if field == PPS_TEMP_UNAVAILABLE => {
                return Err(UnknownReason::SensorUnavailable(entry.metric));
            }
            DecodeRule::Temperature | DecodeRule::CheckedTemperature => {
                let raw = field as i16;
                (DecodedValue::Temperature(temperature_from_raw(raw)), raw as i32)
            }
            DecodeRule::Authority => {
                let label = if low == 0 { "remote" } else { "controller" };
                (DecodedValue::Enum(label), low as i32)
            }
            DecodeRule::Mode => {
                let label = PPS_MODE_LABELS.get(low as usize).ok_or(
                    UnknownReason::ValueOutOfRange {
                        metric: entry.metric,
                        value: low,
                    },
                )?;
                (DecodedValue::Enum(*label), low as i32)
            }
            DecodeRule::Present => (DecodedValue::Boolean(low != 0), low as i32),
            DecodeRule::Count => (DecodedValue::Count(low), low as i32),
        };

        Ok(Reading {
            metric: entry.metric,
            origin: entry.origin,
            value,
            raw,
        })
    }
}

/// Convert a 1/64 °C count to degrees, rounded to one decimal place.
///
/// Rounding is done on the exact fraction with ties to even, so the result
/// matches printing `raw / 64` with one decimal.
pub fn temperature_from_raw(raw: i16) -> f64 {
    let n = raw as i32 * 10;
    let scale = PPS_TEMP_SCALE as i32;
    let (q, r) = (n.div_euclid(scale), n.rem_euclid(scale));
    let tenths = if r * 2 > scale || (r * 2 == scale && q.rem_euclid(2) == 1) {
        q + 1
    } else {
        q
    };
    tenths as f64 / 10.0
}

/// Formats a 1/64 °C count with one decimal place
pub fn format_temperature(raw: i16) -> String {
    format!("{:.1}", temperature_from_raw(raw))
}

/// Nearest 1/64 °C count for a temperature in degrees
pub fn encode_temperature(celsius: f64) -> i16 {
    (celsius * PPS_TEMP_SCALE)
        .round()
        .clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pps::frame::RawTelegram;
    use crate::pps::telegram::{pack_telegram, validate};

    fn valid(address: u8, telegram_type: u8, value: u16) -> ValidatedTelegram {
        validate(RawTelegram::new(pack_telegram(address, telegram_type, value).to_vec()))
    }

    fn known(c: Classification) -> Reading {
        match c {
            Classification::Known(r) => r,
            Classification::Unknown(u) => panic!("expected known telegram, got {}", u.reason),
        }
    }

    #[test]
    fn test_table_covers_all_metrics_for_both_devices() {
        let table = DecodeTable::new();
        assert_eq!(table.len(), 26);
        for metric in MetricId::ALL {
            let entry = table.lookup(0xFD, metric.telegram_type()).unwrap();
            assert_eq!(entry.metric, metric);
            assert_eq!(entry.origin, Origin::RoomUnit);
        }
    }

    #[test]
    fn test_decode_room_temperature() {
        let r = known(DecodeTable::standard().classify(&valid(0xFD, 0x28, 1389)));
        assert_eq!(r.metric, MetricId::ActualRoomTemp);
        assert_eq!(r.origin, Origin::RoomUnit);
        assert_eq!(r.value, DecodedValue::Temperature(21.7));
        assert_eq!(r.raw, 1389);
        assert_eq!(r.value.to_string(), "21.7");
    }

    #[test]
    fn test_decode_negative_outside_temperature() {
        let raw = encode_temperature(-7.5) as u16;
        let r = known(DecodeTable::standard().classify(&valid(0x1D, 0x29, raw)));
        assert_eq!(r.metric, MetricId::OutsideTemp);
        assert_eq!(r.origin, Origin::Controller);
        assert_eq!(r.value, DecodedValue::Temperature(-7.5));
        assert_eq!(r.raw, -480);
    }

    #[test]
    fn test_temperature_rounding_ties_to_even() {
        // 0.25 and 0.75 are exact ties
        assert_eq!(temperature_from_raw(16), 0.2);
        assert_eq!(temperature_from_raw(48), 0.8);
        assert_eq!(format_temperature(1414), "22.1");
        assert_eq!(format_temperature(1280), "20.0");
    }

    #[test]
    fn test_unavailable_flow_sensor() {
        let c = DecodeTable::standard().classify(&valid(0x1D, 0x2C, 0x8001));
        match c {
            Classification::Unknown(u) => {
                assert_eq!(u.reason, UnknownReason::SensorUnavailable(MetricId::ActualFlowTemp))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_authority() {
        let table = DecodeTable::standard();
        let r = known(table.classify(&valid(0x1D, 0x48, 0)));
        assert_eq!(r.value, DecodedValue::Enum("remote"));
        let r = known(table.classify(&valid(0x1D, 0x48, 1)));
        assert_eq!(r.value, DecodedValue::Enum("controller"));
    }

    #[test]
    fn test_mode_labels_and_range() {
        let table = DecodeTable::standard();
        for (i, label) in ["timed", "manual", "off"].iter().enumerate() {
            let r = known(table.classify(&valid(0xFD, 0x49, i as u16)));
            assert_eq!(r.metric, MetricId::Mode);
            assert_eq!(r.value, DecodedValue::Enum(*label));
        }
        let c = table.classify(&valid(0xFD, 0x49, 3));
        assert!(matches!(
            c,
            Classification::Unknown(UnknownTelegram {
                reason: UnknownReason::ValueOutOfRange { value: 3, .. },
                ..
            })
        ));
    }

    #[test]
    fn test_present_and_absence_days() {
        let table = DecodeTable::standard();
        let r = known(table.classify(&valid(0xFD, 0x4C, 1)));
        assert_eq!(r.value, DecodedValue::Boolean(true));
        assert_eq!(r.value.to_string(), "true");
        let r = known(table.classify(&valid(0xFD, 0x4C, 0)));
        assert_eq!(r.value, DecodedValue::Boolean(false));
        let r = known(table.classify(&valid(0xFD, 0x7C, 12)));
        assert_eq!(r.value, DecodedValue::Count(12));
        assert_eq!(r.value.to_string(), "12");
    }

    #[test]
    fn test_unknown_type_and_peer() {
        let table = DecodeTable::standard();
        match table.classify(&valid(0xFD, 0x60, 0)) {
            Classification::Unknown(u) => {
                assert_eq!(u.reason, UnknownReason::UnknownType(0x60));
                assert_eq!(u.peer_label(), "Room unit:");
            }
            other => panic!("unexpected {other:?}"),
        }
        match table.classify(&valid(0x3D, 0x28, 0)) {
            Classification::Unknown(u) => {
                assert_eq!(u.reason, UnknownReason::UnknownPeer(0x3D));
                assert_eq!(u.peer_label(), "0x3d:");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_telegram_is_not_decoded() {
        let mut t = pack_telegram(0xFD, 0x28, 1389);
        t[8] ^= 0x80;
        let v = validate(RawTelegram::new(t.to_vec()));
        assert!(matches!(
            DecodeTable::standard().classify(&v),
            Classification::Unknown(UnknownTelegram {
                reason: UnknownReason::NotValid,
                ..
            })
        ));
    }

    #[test]
    fn test_sorted_by_name() {
        let names: Vec<_> = MetricId::sorted_by_name().iter().map(|m| m.name()).collect();
        assert_eq!(names.first(), Some(&"Actual DHW temp"));
        assert_eq!(names.last(), Some(&"Set room temp"));
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
