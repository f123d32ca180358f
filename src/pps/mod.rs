//! The pps module contains the bus side of the monitor: byte sources,
//! telegram framing and validation, and the decode table that turns valid
//! telegrams into readings.

pub mod decode;
pub mod frame;
pub mod serial;
pub mod serial_mock;
pub mod source;
pub mod telegram;

pub use decode::{Classification, DecodeTable, DecodedValue, MetricId, Origin, Reading, UnknownTelegram};
pub use frame::{Framer, RawTelegram, TelegramReader};
pub use serial::{open_serial, SerialConfig, SerialSource};
pub use source::{ByteEvent, ByteSource, StreamSource};
pub use telegram::{validate, ValidatedTelegram, Verdict};
