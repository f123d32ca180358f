//! End-to-end scenarios: bytes in, emitter output out.

use ppsmon::output::{CsvEmitter, ReadingSink, TextEmitter};
use ppsmon::pps::decode::MetricId;
use ppsmon::pps::serial_mock::{MockSerialPort, ScriptedSource};
use ppsmon::pps::source::{ByteEvent, ByteSource, StreamSource};
use ppsmon::pps::telegram::pack_telegram;
use ppsmon::{Monitor, MonitorConfig, MonitorEvent};
use std::time::Duration;

async fn drive<S: ByteSource>(monitor: &mut Monitor<S>, sink: &mut dyn ReadingSink) {
    let store = monitor.store();
    while let Some(event) = monitor.next_event().await.unwrap() {
        match event {
            MonitorEvent::Reading { reading, telegram } => sink.on_reading(&reading, &telegram, &store).unwrap(),
            MonitorEvent::Unknown(unknown) => sink.on_unknown(&unknown).unwrap(),
        }
    }
}

#[tokio::test]
async fn test_alternating_devices_text_output() {
    let room = pack_telegram(0xFD, 0x28, 1389);
    let controller = pack_telegram(0x1D, 0x2C, 1414);
    let telegrams: Vec<&[u8]> = (0..10)
        .map(|i| if i % 2 == 0 { &room[..] } else { &controller[..] })
        .collect();

    let mut monitor = Monitor::new(ScriptedSource::from_telegrams(telegrams), MonitorConfig::default());
    let mut text = TextEmitter::new(Vec::new(), false);
    drive(&mut monitor, &mut text).await;

    let out = String::from_utf8(text.into_inner()).unwrap();
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 10);
    for (i, line) in lines.iter().enumerate() {
        let expected = if i % 2 == 0 {
            "Room unit:  Actual room temp: 21.7"
        } else {
            "Controller: Actual flow temp: 22.1"
        };
        assert_eq!(*line, expected);
    }
    assert_eq!(monitor.stats().telegrams_decoded, 10);
}

#[tokio::test]
async fn test_csv_rows_with_limit() {
    // Remaining absence days is sent once; every other metric cycles
    let absence = pack_telegram(0xFD, MetricId::RemainingAbsenceDays.telegram_type(), 3);
    let cycle: Vec<[u8; 9]> = MetricId::ALL
        .iter()
        .filter(|m| **m != MetricId::RemainingAbsenceDays)
        .map(|m| pack_telegram(0x1D, m.telegram_type(), 1))
        .collect();
    let mut telegrams: Vec<&[u8]> = vec![&absence[..]];
    telegrams.extend((0..199).map(|i| &cycle[i % cycle.len()][..]));

    let config = MonitorConfig {
        limit: Some(150),
        show_unknown: false,
    };
    let mut monitor = Monitor::new(ScriptedSource::from_telegrams(telegrams), config);
    let mut csv = CsvEmitter::new(Vec::new(), true);
    drive(&mut monitor, &mut csv).await;

    assert_eq!(monitor.stats().telegrams_valid, 150);
    assert_eq!(monitor.stats().telegrams_decoded, 150);
    assert_eq!(monitor.store().len(), MetricId::ALL.len());
    // First row after 11 telegrams, then one per 11 further distinct updates
    let rows = 1 + (150 - 11) / 11;
    assert_eq!(csv.rows_written(), rows as u64);

    let out = String::from_utf8(csv.into_inner()).unwrap();
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 1 + rows);
    assert!(lines[0].starts_with("time,"));
    assert_eq!(lines.iter().filter(|l| l.starts_with("time,")).count(), 1);

    let absence_column = 1 + MetricId::sorted_by_name()
        .iter()
        .position(|m| *m == MetricId::RemainingAbsenceDays)
        .unwrap();
    let header: Vec<_> = lines[0].split(',').collect();
    assert_eq!(header[absence_column], "Remaining absence days");
    for row in &lines[1..] {
        let cells: Vec<_> = row.split(',').collect();
        assert_eq!(cells.len(), 1 + MetricId::ALL.len());
        assert_eq!(cells[absence_column], "3");
    }
    // The last row has seen every cycled metric
    let last: Vec<_> = lines[rows].split(',').collect();
    assert!(last.iter().all(|c| !c.is_empty()));
}

#[tokio::test]
async fn test_dropped_byte_does_not_lose_next_telegram() {
    let room = pack_telegram(0xFD, 0x28, 1389);
    let flow = pack_telegram(0x1D, 0x2C, 1414);
    let outside = pack_telegram(0x1D, 0x29, 320);
    let mut stream = room[..4].to_vec();
    stream.extend_from_slice(&room[5..]);
    stream.extend_from_slice(&flow);
    stream.extend_from_slice(&outside);

    let mut monitor = Monitor::new(ScriptedSource::from_bytes(&stream), MonitorConfig::default());
    let mut text = TextEmitter::new(Vec::new(), false);
    drive(&mut monitor, &mut text).await;

    let out = String::from_utf8(text.into_inner()).unwrap();
    assert_eq!(
        out,
        "Controller: Actual flow temp: 22.1\nController: Outside temp: 5.0\n"
    );
    assert_eq!(monitor.stats().checksum_errors, 1);
}

#[tokio::test]
async fn test_noise_byte_does_not_lose_next_telegram() {
    let room = pack_telegram(0xFD, 0x28, 1389);
    let flow = pack_telegram(0x1D, 0x2C, 1414);
    let mut stream = vec![0x00];
    stream.extend_from_slice(&room);
    stream.extend_from_slice(&flow);

    let mut monitor = Monitor::new(ScriptedSource::from_bytes(&stream), MonitorConfig::default());
    let mut text = TextEmitter::new(Vec::new(), false);
    drive(&mut monitor, &mut text).await;

    let out = String::from_utf8(text.into_inner()).unwrap();
    assert_eq!(
        out,
        "Room unit:  Actual room temp: 21.7\nController: Actual flow temp: 22.1\n"
    );
    assert_eq!(monitor.stats().checksum_errors, 1);
}

#[tokio::test]
async fn test_corrupted_telegram_between_valid_ones() {
    let first = pack_telegram(0xFD, 0x28, 1389);
    let mut corrupt = pack_telegram(0x1D, 0x2B, 3200);
    corrupt[4] ^= 0x10;
    let last = pack_telegram(0x1D, 0x29, 320);

    let mut monitor = Monitor::new(
        ScriptedSource::from_telegrams([&first[..], &corrupt[..], &last[..]]),
        MonitorConfig::default(),
    );
    let mut text = TextEmitter::new(Vec::new(), false);
    drive(&mut monitor, &mut text).await;

    let out = String::from_utf8(text.into_inner()).unwrap();
    assert_eq!(
        out,
        "Room unit:  Actual room temp: 21.7\nController: Outside temp: 5.0\n"
    );
    assert_eq!(monitor.stats().checksum_errors, 1);
    assert!(monitor.store().get(MetricId::ActualDhwTemp).is_none());
}

#[tokio::test]
async fn test_corrupted_telegram_without_gaps() {
    let mut corrupt = pack_telegram(0xFD, 0x19, 1280);
    corrupt[8] ^= 0xFF;
    let good = pack_telegram(0x1D, 0x2C, 1414);
    let mut stream = corrupt.to_vec();
    stream.extend_from_slice(&good);

    let mut monitor = Monitor::new(ScriptedSource::from_bytes(&stream), MonitorConfig::default());
    let mut text = TextEmitter::new(Vec::new(), false);
    drive(&mut monitor, &mut text).await;

    let out = String::from_utf8(text.into_inner()).unwrap();
    assert_eq!(out, "Controller: Actual flow temp: 22.1\n");
}

#[tokio::test]
async fn test_unknown_telegrams_shown_on_request() {
    let unknown = pack_telegram(0x3D, 0x28, 320);
    let known = pack_telegram(0xFD, 0x49, 1);
    let config = MonitorConfig {
        limit: None,
        show_unknown: true,
    };
    let mut monitor = Monitor::new(ScriptedSource::from_telegrams([&unknown[..], &known[..]]), config);
    let mut text = TextEmitter::new(Vec::new(), false);
    drive(&mut monitor, &mut text).await;

    let out = String::from_utf8(text.into_inner()).unwrap();
    assert_eq!(
        out,
        "0x3d:       3d 28 00 00 00 00 01 40 (T=5.0)\nRoom unit:  Mode: manual\n"
    );
}

#[tokio::test]
async fn test_serial_stream_pipeline() {
    let port = MockSerialPort::new();
    port.queue_rx_data(&[0x17]);
    port.queue_telegram(0xFD, 0x4C, 1);
    port.queue_telegram(0x1D, 0x48, 0);

    let source = StreamSource::new(port, Duration::from_millis(20));
    let mut monitor = Monitor::new(source, MonitorConfig::default());
    let mut text = TextEmitter::new(Vec::new(), false);
    drive(&mut monitor, &mut text).await;

    let out = String::from_utf8(text.into_inner()).unwrap();
    assert_eq!(out, "Room unit:  Present: true\nController: Authority: remote\n");
}

#[tokio::test]
async fn test_short_fragment_then_telegram() {
    let good = pack_telegram(0xFD, 0x0B, 3072);
    let mut events = vec![ByteEvent::Byte(0xFD), ByteEvent::Byte(0x0B), ByteEvent::Gap];
    events.extend(good.iter().map(|b| ByteEvent::Byte(*b)));

    let mut monitor = Monitor::new(ScriptedSource::new(events), MonitorConfig::default());
    let mut text = TextEmitter::new(Vec::new(), false);
    drive(&mut monitor, &mut text).await;

    let out = String::from_utf8(text.into_inner()).unwrap();
    assert_eq!(out, "Room unit:  Set DHW temp: 48.0\n");
    assert_eq!(monitor.stats().short_telegrams, 1);
}

#[tokio::test]
async fn test_captured_bus_traffic() {
    // Room unit and controller exchange, as logged in raw mode
    let capture = ppsmon::util::decode_hex(
        "17 fd 28 00 00 00 00 05 6d 69 17 1d 2c 00 00 00 00 05 86 2c 17 1d 2e 80 01 80 01 80 01 32",
    )
    .unwrap();
    let mut monitor = Monitor::new(ScriptedSource::from_bytes(&capture), MonitorConfig::default());
    let mut text = TextEmitter::new(Vec::new(), false);
    drive(&mut monitor, &mut text).await;

    let out = String::from_utf8(text.into_inner()).unwrap();
    assert_eq!(out, "Room unit:  Actual room temp: 21.7\nController: Actual flow temp: 22.1\n");
    assert_eq!(monitor.stats().telegrams_unknown, 1);
}
