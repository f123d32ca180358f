//! # Hex Encoding/Decoding Utilities
//!
//! Hex helpers used for raw telegram display and for writing captured bus
//! traffic into tests.
//!
//! ```rust
//! use ppsmon::util::hex::{decode_hex, format_hex_compact};
//!
//! let data = decode_hex("fd 28 00 00 00 00 05 6d 69").unwrap();
//! assert_eq!(format_hex_compact(&data[..2]), "fd 28");
//! ```

use thiserror::Error;

/// Errors that can occur during hex operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HexError {
    #[error("Odd number of hex characters: {0}")]
    OddLength(usize),

    #[error("Empty hex string")]
    EmptyString,

    #[error("Hex decoding error: {0}")]
    DecodeError(String),
}

/// Encode bytes to lowercase hex string
pub fn encode_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Decode hex string to bytes
///
/// Accepts both uppercase and lowercase hex characters.
/// Whitespace is automatically stripped.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, HexError> {
    let cleaned: String = hex_str.chars().filter(|c| !c.is_whitespace()).collect();

    if cleaned.is_empty() {
        return Err(HexError::EmptyString);
    }

    if cleaned.len() % 2 != 0 {
        return Err(HexError::OddLength(cleaned.len()));
    }

    hex::decode(&cleaned).map_err(|e| HexError::DecodeError(e.to_string()))
}

/// Format hex data for compact display (useful for logs)
///
/// Formats data as "fd 28 00 00" with spaces between bytes.
pub fn format_hex_compact(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_case() {
        let data = vec![0xAB, 0xCD, 0xEF];
        assert_eq!(encode_hex(&data), "abcdef");
    }

    #[test]
    fn test_decode_with_whitespace() {
        let hex = "FD 28 00 00";
        let expected = vec![0xFD, 0x28, 0x00, 0x00];
        assert_eq!(decode_hex(hex).unwrap(), expected);
    }

    #[test]
    fn test_format_compact() {
        let data = vec![0x1d, 0x2c, 0x05, 0x86];
        assert_eq!(format_hex_compact(&data), "1d 2c 05 86");
        assert_eq!(format_hex_compact(&[]), "");
    }

    #[test]
    fn test_errors() {
        assert_eq!(decode_hex(""), Err(HexError::EmptyString));
        assert_eq!(decode_hex("1"), Err(HexError::OddLength(1)));
        assert!(matches!(decode_hex("GG"), Err(HexError::DecodeError(_))));
    }
}
