//! Hex helpers
//!
//! Uppercase encoding is used for frame dumps in debug logs; decoding parses
//! device constants written by hand in configuration files.

use std::fmt::Write;

use crate::error::{Error, Result};

/// Encode bytes to uppercase hex string
/// Example: [0x12, 0x34, 0xAB] -> "1234AB"
pub fn encode_upper(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len() * 2);
    for byte in data {
        // Writing to String buffer is infallible
        let _ = write!(&mut result, "{:02X}", byte);
    }
    result
}

/// Decode a hex string into bytes
///
/// ASCII whitespace between digits is ignored, so `"55 AA 01"` and
/// `"55aa01"` decode to the same bytes. Case-insensitive.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    if digits.len() % 2 != 0 {
        return Err(Error::Parse(format!(
            "odd number of hex digits ({})",
            digits.len()
        )));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let hi = nibble(pair[0])?;
            let lo = nibble(pair[1])?;
            Ok((hi << 4) | lo)
        })
        .collect()
}

fn nibble(digit: u8) -> Result<u8> {
    match digit {
        b'0'..=b'9' => Ok(digit - b'0'),
        b'a'..=b'f' => Ok(digit - b'a' + 10),
        b'A'..=b'F' => Ok(digit - b'A' + 10),
        other => Err(Error::Parse(format!(
            "invalid hex digit '{}'",
            other as char
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_encode_upper_basic() {
        assert_eq!(encode_upper(&[0x12, 0x34, 0xAB]), "1234AB");
    }

    #[test]
    fn test_encode_upper_empty() {
        assert_eq!(encode_upper(&[]), "");
    }

    #[test]
    fn test_encode_upper_single_byte() {
        assert_eq!(encode_upper(&[0xFF]), "FF");
        assert_eq!(encode_upper(&[0x00]), "00");
        assert_eq!(encode_upper(&[0x0F]), "0F");
    }

    #[test]
    fn test_decode_spaced_and_mixed_case() {
        assert_eq!(decode("55 AA 0f").unwrap(), vec![0x55, 0xAA, 0x0F]);
        assert_eq!(decode("55aa0F").unwrap(), vec![0x55, 0xAA, 0x0F]);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("   ").unwrap().is_empty());
    }

    #[test]
    fn test_decode_odd_length() {
        let err = decode("ABC").unwrap_err();
        assert!(err.to_string().contains("odd number"));
    }

    #[test]
    fn test_decode_invalid_digit() {
        let err = decode("0G").unwrap_err();
        assert!(err.to_string().contains("invalid hex digit 'G'"));
    }

    #[test]
    fn test_decode_inverts_encode() {
        let bytes = [0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF];
        assert_eq!(decode(&encode_upper(&bytes)).unwrap(), bytes);
    }
}
