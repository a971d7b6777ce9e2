// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Conversions between byte sequences and lowercase hexadecimal strings.

use crate::error::Error;

/// Returns exactly `2 * bytes.len()` lowercase hex characters.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    ::hex::encode(bytes)
}

/// Parses a hex string back into bytes.
/// Odd-length input and non-hex characters are rejected.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, Error> {
    Ok(::hex::decode(hex)?)
}

/// Renders `number` in lowercase hex, zero-padded on the left to at least `width` characters.
/// The width is a minimum: wider values are never truncated.
pub fn number_to_hex(number: u64, width: usize) -> String {
    format!("{:0width$x}", number, width = width)
}

/// Formats a hardware address as `11-22-33-44-55-66`.
pub fn format_mac(mac: &[u8]) -> String {
    mac.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_hex() {
        assert_eq!(bytes_to_hex(&[]), "");
        assert_eq!(bytes_to_hex(&[0x00, 0x0f, 0xa0, 0xff]), "000fa0ff");
    }

    #[test]
    fn test_hex_to_bytes() {
        assert_eq!(hex_to_bytes("000fa0ff").unwrap(), vec![0x00, 0x0f, 0xa0, 0xff]);
        assert_eq!(hex_to_bytes("ABcd").unwrap(), vec![0xab, 0xcd]);
        assert!(matches!(hex_to_bytes("abc"), Err(Error::InvalidHex(_))));
        assert!(matches!(hex_to_bytes("zz"), Err(Error::InvalidHex(_))));
    }

    #[test]
    fn test_number_to_hex() {
        assert_eq!(number_to_hex(0, 3), "000");
        assert_eq!(number_to_hex(0xabc, 3), "abc");
        assert_eq!(number_to_hex(0x1b21dd213814000, 15), "1b21dd213814000");
        // width is a minimum, not a cap
        assert_eq!(number_to_hex(0x12345, 3), "12345");
    }

    #[test]
    fn test_format_mac() {
        assert_eq!(
            format_mac(&[0x11, 0x22, 0x33, 0xaa, 0xbb, 0x0c]),
            "11-22-33-AA-BB-0C"
        );
    }
}
