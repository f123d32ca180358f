//! Unit tests for the `PpsError` enum and its associated `Display` trait implementation.

use ppsmon::error::PpsError;

/// Tests that the `SerialPortError` variant is correctly formatted.
#[test]
fn test_serial_port_error() {
    let err = PpsError::SerialPortError("Test error".to_string());
    assert_eq!(err.to_string(), "Serial port error: Test error");
}

/// Tests that I/O errors convert and keep their message.
#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "line dropped");
    let err: PpsError = io.into();
    assert!(matches!(err, PpsError::Io(_)));
    assert_eq!(err.to_string(), "I/O error: line dropped");
}

/// Tests that the `InvalidTelegram` variant is correctly formatted.
#[test]
fn test_invalid_telegram_error() {
    let err = PpsError::InvalidTelegram("length 4, expected 9".to_string());
    assert_eq!(err.to_string(), "Invalid telegram: length 4, expected 9");
}

/// Tests that the `Gpio` variant is correctly formatted.
#[test]
fn test_gpio_error() {
    let err = PpsError::Gpio("pin busy".to_string());
    assert_eq!(err.to_string(), "GPIO error: pin busy");
}

/// Tests that the `Output` variant is correctly formatted.
#[test]
fn test_output_error() {
    let err = PpsError::Output("disk full".to_string());
    assert_eq!(err.to_string(), "Output error: disk full");
}

fn category(err: &PpsError) -> &'static str {
    match err {
        PpsError::SerialPortError(_) => "serial",
        PpsError::Io(_) => "io",
        PpsError::InvalidTelegram(_) => "telegram",
        PpsError::Gpio(_) => "gpio",
        PpsError::Output(_) => "output",
    }
}

/// Tests that the library operations report their failures through the
/// dedicated variants.
#[tokio::test]
async fn test_operations_raise_categorised_errors() {
    let dir = tempfile::tempdir().unwrap();
    let err = ppsmon::output::open_output(Some(dir.path())).err().unwrap();
    assert_eq!(category(&err), "output");

    let err = ppsmon::connect("/dev/ppsmon-missing-port").err().unwrap();
    assert_eq!(category(&err), "serial");

    let err = ppsmon::decode_telegram(&[0xFD, 0x28]).unwrap_err();
    assert_eq!(category(&err), "telegram");
}

/// Tests that a corrupted telegram is reported through `decode_telegram`.
#[test]
fn test_decode_telegram_reports_checksum() {
    let mut t = ppsmon::pps::telegram::pack_telegram(0xFD, 0x28, 1389);
    t[8] = t[8].wrapping_add(1);
    let err = ppsmon::decode_telegram(&t).unwrap_err();
    assert!(err.to_string().starts_with("Invalid telegram: checksum"));
}
