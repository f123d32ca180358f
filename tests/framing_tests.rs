//! Framing and validation of byte streams as they arrive from the bus.

use ppsmon::pps::frame::{Framer, TelegramReader};
use ppsmon::pps::serial_mock::{MockSerialPort, ScriptedSource};
use ppsmon::pps::source::{ByteEvent, StreamSource};
use ppsmon::pps::telegram::{pack_telegram, validate, Verdict};
use std::time::Duration;

fn bytes(data: &[u8]) -> impl Iterator<Item = ByteEvent> + '_ {
    data.iter().map(|b| ByteEvent::Byte(*b))
}

#[test]
fn test_back_to_back_telegrams_without_gap() {
    let a = pack_telegram(0xFD, 0x28, 1389);
    let b = pack_telegram(0x1D, 0x29, 320);
    let mut framer = Framer::new();

    let out: Vec<_> = bytes(&a).chain(bytes(&b)).filter_map(|e| framer.push(e)).collect();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].bytes, a.to_vec());
    assert_eq!(out[1].bytes, b.to_vec());
    assert!(out.iter().all(|t| !t.truncated));
}

#[test]
fn test_sync_byte_between_telegrams_is_skipped() {
    let a = pack_telegram(0xFD, 0x4C, 1);
    let mut framer = Framer::new();
    let mut events = vec![ByteEvent::Byte(0x17), ByteEvent::Gap];
    events.extend(bytes(&a));

    let out: Vec<_> = events.into_iter().filter_map(|e| framer.push(e)).collect();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].bytes, a.to_vec());
    assert_eq!(framer.stats().sync_bytes, 1);
}

#[test]
fn test_sync_value_inside_telegram_is_data() {
    // 0x17 as the value's low byte
    let a = pack_telegram(0x1D, 0x7C, 0x0017);
    let mut framer = Framer::new();
    let out: Vec<_> = bytes(&a).filter_map(|e| framer.push(e)).collect();
    assert_eq!(out.len(), 1);
    assert!(validate(out[0].clone()).verdict.is_valid());
}

#[test]
fn test_gap_cuts_short_candidate() {
    let mut framer = Framer::new();
    let out: Vec<_> = bytes(&[0xFD, 0x28, 0x00, 0x00])
        .chain(std::iter::once(ByteEvent::Gap))
        .filter_map(|e| framer.push(e))
        .collect();
    assert_eq!(out.len(), 1);
    assert!(out[0].truncated);
    assert_eq!(validate(out[0].clone()).verdict, Verdict::TooShort { length: 4 });
}

#[test]
fn test_resync_hunts_for_device_address() {
    let good = pack_telegram(0x1D, 0x2C, 1414);
    let mut framer = Framer::new();
    framer.resync();
    assert!(framer.is_hunting());

    let out: Vec<_> = bytes(&[0x00, 0x42, 0x99])
        .chain(bytes(&good))
        .filter_map(|e| framer.push(e))
        .collect();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].bytes, good.to_vec());
    assert_eq!(framer.stats().bytes_discarded, 3);
}

#[tokio::test]
async fn test_reader_over_scripted_source() {
    let a = pack_telegram(0xFD, 0x19, 1280);
    let b = pack_telegram(0x1D, 0x0B, 3200);
    let mut reader = TelegramReader::new(ScriptedSource::from_telegrams([&a[..], &b[..]]));

    assert_eq!(reader.next_raw().await.unwrap().unwrap().bytes, a.to_vec());
    assert_eq!(reader.next_raw().await.unwrap().unwrap().bytes, b.to_vec());
    assert!(reader.next_raw().await.unwrap().is_none());
    assert!(reader.is_ended());
    assert!(reader.next_raw().await.unwrap().is_none());
}

#[tokio::test]
async fn test_reader_over_mock_serial_port() {
    let port = MockSerialPort::new();
    port.set_chunk_size(2);
    port.queue_telegram(0xFD, 0x28, 1389);
    port.queue_telegram(0x1D, 0x29, 320);

    let source = StreamSource::new(port, Duration::from_millis(20));
    let mut reader = TelegramReader::new(source);

    let first = validate(reader.next_raw().await.unwrap().unwrap());
    let second = validate(reader.next_raw().await.unwrap().unwrap());
    assert!(first.verdict.is_valid());
    assert!(second.verdict.is_valid());
    assert_eq!(first.address(), Some(0xFD));
    assert_eq!(second.address(), Some(0x1D));
    assert!(reader.next_raw().await.unwrap().is_none());
}
