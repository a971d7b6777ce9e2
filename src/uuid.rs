// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::error::Error;
use crate::node::NodeId;
use std::{fmt, str};

/// Length of the 8-4-4-4-12 canonical form.
const CANONICAL_LEN: usize = 36;
/// Positions of the dashes in the canonical form.
const DASHES: [usize; 4] = [8, 13, 18, 23];
const DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Represents a Universally Unique IDentifier as 16 big-endian bytes.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Uuid([u8; 16]);

impl Uuid {
    /// Nil UUID (00000000-0000-0000-0000-000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Max UUID (ffffffff-ffff-ffff-ffff-ffffffffffff)
    pub const MAX: Self = Self([0xff; 16]);

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Creates a UUID from the RFC 4122 fields. `time_hi_and_version` and
    /// `clock_seq` are taken as is, including their version and variant bits.
    pub const fn from_fields(
        time_low: u32,
        time_mid: u16,
        time_hi_and_version: u16,
        clock_seq: u16,
        node: &[u8; 6],
    ) -> Self {
        Self([
            (time_low >> 24) as u8,
            (time_low >> 16) as u8,
            (time_low >> 8) as u8,
            time_low as u8,
            (time_mid >> 8) as u8,
            time_mid as u8,
            (time_hi_and_version >> 8) as u8,
            time_hi_and_version as u8,
            (clock_seq >> 8) as u8,
            clock_seq as u8,
            node[0],
            node[1],
            node[2],
            node[3],
            node[4],
            node[5],
        ])
    }

    /// First group: 8 hex digits.
    pub const fn time_low(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Second group: 4 hex digits.
    pub const fn time_mid(&self) -> u16 {
        u16::from_be_bytes([self.0[4], self.0[5]])
    }

    /// Third group, version nibble included.
    pub const fn time_hi_and_version(&self) -> u16 {
        u16::from_be_bytes([self.0[6], self.0[7]])
    }

    /// Fourth group, variant bits included.
    pub const fn clock_seq(&self) -> u16 {
        u16::from_be_bytes([self.0[8], self.0[9]])
    }

    /// Fifth group: 12 hex digits.
    pub const fn node(&self) -> NodeId {
        NodeId::from_bytes([
            self.0[10], self.0[11], self.0[12], self.0[13], self.0[14], self.0[15],
        ])
    }

    /// Returns the version nibble, i.e. the first hex digit of the third group.
    pub const fn version(&self) -> u8 {
        self.0[6] >> 4
    }

    /// Returns the two most significant bits of the fourth group.
    /// `0b10` is rendered as a leading hex digit in `8..=b`.
    pub const fn variant(&self) -> u8 {
        self.0[8] >> 6
    }

    /// Overwrites the version nibble and sets the variant to `0b10`, keeping every other bit.
    pub const fn with_version(self, version: u8) -> Self {
        let mut bytes = self.0;
        bytes[6] = (version << 4) | (bytes[6] & 0x0f);
        bytes[8] = 0x80 | (bytes[8] & 0x3f);
        Self(bytes)
    }

    /// Returns the 36-byte 8-4-4-4-12 lowercase representation.
    fn encode(&self) -> [u8; CANONICAL_LEN] {
        let mut buffer = [b'-'; CANONICAL_LEN];
        let mut pos = 0;
        for (i, e) in self.0.iter().enumerate() {
            if i == 4 || i == 6 || i == 8 || i == 10 {
                pos += 1;
            }
            buffer[pos] = DIGITS[(e >> 4) as usize];
            buffer[pos + 1] = DIGITS[(e & 15) as usize];
            pos += 2;
        }
        buffer
    }
}

impl fmt::Display for Uuid {
    /// Returns the 8-4-4-4-12 canonical hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buffer = self.encode();
        // the buffer only holds ascii hex digits and dashes
        f.write_str(str::from_utf8(&buffer).map_err(|_| fmt::Error)?)
    }
}

impl str::FromStr for Uuid {
    type Err = Error;

    /// Creates an object from the 8-4-4-4-12 hexadecimal string representation.
    /// Upper case digits are accepted.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let err = || Error::InvalidFormat(src.to_string());
        let text = src.as_bytes();
        if text.len() != CANONICAL_LEN || DASHES.iter().any(|&i| text[i] != b'-') {
            return Err(err());
        }

        let mut digits = text
            .iter()
            .enumerate()
            .filter(|(i, _)| !DASHES.contains(i))
            .map(|(_, c)| (*c as char).to_digit(16).map(|d| d as u8));

        let mut dst = [0u8; 16];
        for e in dst.iter_mut() {
            let hi = digits.next().flatten().ok_or_else(err)?;
            let lo = digits.next().flatten().ok_or_else(err)?;
            *e = (hi << 4) | lo;
        }
        Ok(Self(dst))
    }
}

impl From<Uuid> for String {
    fn from(src: Uuid) -> Self {
        src.to_string()
    }
}

impl TryFrom<&str> for Uuid {
    type Error = Error;

    fn try_from(src: &str) -> Result<Self, Self::Error> {
        src.parse()
    }
}

impl From<Uuid> for [u8; 16] {
    fn from(src: Uuid) -> Self {
        src.0
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl AsRef<[u8]> for Uuid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Uuid> for u128 {
    fn from(src: Uuid) -> Self {
        Self::from_be_bytes(src.0)
    }
}

impl From<u128> for Uuid {
    fn from(src: u128) -> Self {
        Self(src.to_be_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a collection of prepared cases
    fn prepare_cases() -> &'static [((u32, u16, u16, u16, [u8; 6]), &'static str)] {
        &[
            ((0, 0, 0, 0, [0; 6]), "00000000-0000-0000-0000-000000000000"),
            (
                (0x13814000, 0x1dd2, 0x11b2, 0x8000, [0x01, 0x23, 0x45, 0x67, 0x89, 0xab]),
                "13814000-1dd2-11b2-8000-0123456789ab",
            ),
            (
                (0xffffffff, 0xffff, 0xffff, 0xffff, [0xff; 6]),
                "ffffffff-ffff-ffff-ffff-ffffffffffff",
            ),
        ]
    }

    #[test]
    fn test_encodes_and_decodes_prepared_cases() {
        for (fs, text) in prepare_cases() {
            let from_fields = Uuid::from_fields(fs.0, fs.1, fs.2, fs.3, &fs.4);
            assert_eq!(&from_fields.to_string(), text);
            assert_eq!(text.parse::<Uuid>().unwrap(), from_fields);
            assert_eq!(text.to_uppercase().parse::<Uuid>().unwrap(), from_fields);

            assert_eq!(from_fields.time_low(), fs.0);
            assert_eq!(from_fields.time_mid(), fs.1);
            assert_eq!(from_fields.time_hi_and_version(), fs.2);
            assert_eq!(from_fields.clock_seq(), fs.3);
            assert_eq!(from_fields.node().as_bytes(), &fs.4);
        }
    }

    #[test]
    fn test_returns_error_to_invalid_string_representation() {
        let cases = [
            "",
            " 0180a8f0-5b82-75b4-9fef-ecad657c30bb",
            "0180a8f0-5b84-7438-ab50-f0626f78002b ",
            "0180a8f05b847438ab50f068decfbfd7",
            "0180a8f0-5b847438-ab50-f06991838802",
            "{0180a8f0-5b84-7438-ab50-f06ac2e5e082}",
            "0180a8f0-5b84-74 8-ab50-f06bed27bdc7",
            "0180a8g0-5b84-7438-ab50-f06c91175b8a",
            "0180a8f0-5b84-7438-ab50_f06d3ea24429",
            "0180a8f0-5b84-7438-ab50-f06d3ea2442é",
        ];

        for e in cases {
            assert!(matches!(e.parse::<Uuid>(), Err(Error::InvalidFormat(_))), "{}", e);
        }
    }

    #[test]
    fn test_version_and_variant() {
        let uuid: Uuid = "13814000-1dd2-11b2-a123-0123456789ab".parse().unwrap();
        assert_eq!(uuid.version(), 1);
        assert_eq!(uuid.variant(), 0b10);

        let nil = Uuid::NIL.with_version(4);
        assert_eq!(nil.to_string(), "00000000-0000-4000-8000-000000000000");
        let max = Uuid::MAX.with_version(4);
        assert_eq!(max.to_string(), "ffffffff-ffff-4fff-bfff-ffffffffffff");
    }

    #[test]
    fn test_has_symmetric_converters() {
        for (fs, _) in prepare_cases() {
            let e = Uuid::from_fields(fs.0, fs.1, fs.2, fs.3, &fs.4);
            assert_eq!(Uuid::from(<[u8; 16]>::from(e)), e);
            assert_eq!(Uuid::from(u128::from(e)), e);
            assert_eq!(Uuid::try_from(String::from(e).as_str()).unwrap(), e);
        }
    }
}
