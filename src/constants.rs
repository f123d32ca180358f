//! PPS / H-Bus Protocol Constants
//!
//! This module defines constants used in the PPS bus implementation, as
//! observed on the two-wire link between a heating controller and its room
//! unit.

/// Line speed of the bus interface
pub const PPS_BAUDRATE: u32 = 4800;

/// Bits per character on the wire (8 data bits plus start and stop)
pub const PPS_BITS_PER_CHAR: u32 = 10;

/// Idle characters that separate two telegrams
pub const PPS_GAP_CHARS: u32 = 10;

/// Length of every telegram, checksum included
pub const PPS_TELEGRAM_LEN: usize = 9;

/// Length of the checksummed part of a telegram
pub const PPS_PAYLOAD_LEN: usize = PPS_TELEGRAM_LEN - 1;

/// Lone byte sent by the controller to mark bus synchronisation
pub const PPS_SYNC_BYTE: u8 = 0x17;

// ----------------------------------------------------------------------------
// Address bytes (byte 0)
// ----------------------------------------------------------------------------

pub const PPS_ADDRESS_ROOM_UNIT: u8 = 0xFD;
pub const PPS_ADDRESS_CONTROLLER: u8 = 0x1D;

// ----------------------------------------------------------------------------
// Telegram type bytes (byte 1)
// ----------------------------------------------------------------------------

pub const PPS_TYPE_SET_DEFAULT_ROOM_TEMP: u8 = 0x08;
pub const PPS_TYPE_SET_ABSENT_ROOM_TEMP: u8 = 0x09;
pub const PPS_TYPE_SET_DHW_TEMP: u8 = 0x0B;
pub const PPS_TYPE_SET_ROOM_TEMP: u8 = 0x19;
pub const PPS_TYPE_ACTUAL_ROOM_TEMP: u8 = 0x28;
pub const PPS_TYPE_OUTSIDE_TEMP: u8 = 0x29;
pub const PPS_TYPE_ACTUAL_DHW_TEMP: u8 = 0x2B;
pub const PPS_TYPE_ACTUAL_FLOW_TEMP: u8 = 0x2C;
pub const PPS_TYPE_ACTUAL_BOILER_TEMP: u8 = 0x2E;
pub const PPS_TYPE_AUTHORITY: u8 = 0x48;
pub const PPS_TYPE_MODE: u8 = 0x49;
pub const PPS_TYPE_PRESENT: u8 = 0x4C;
pub const PPS_TYPE_REMAINING_ABSENCE_DAYS: u8 = 0x7C;

// ----------------------------------------------------------------------------
// Payload layout
// ----------------------------------------------------------------------------

/// Offset of the big-endian 16-bit value field
pub const PPS_VALUE_OFFSET: usize = 6;

/// Offset of the single-byte value used by enumerations and counters
pub const PPS_VALUE_LOW_OFFSET: usize = 7;

/// Temperature fields count in 1/64 degree Celsius
pub const PPS_TEMP_SCALE: f64 = 64.0;

/// Value field content of a sensor that is not fitted
pub const PPS_TEMP_UNAVAILABLE: u16 = 0x8001;

/// Labels of the room unit operating mode, indexed by the value byte
pub const PPS_MODE_LABELS: [&str; 3] = ["timed", "manual", "off"];
