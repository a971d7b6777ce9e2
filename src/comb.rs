// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! COMB identifiers: random identifiers whose most significant bits carry the
//! creation time, so that sorting them as 128-bit values sorts them by time.

use crate::random::apply_version;
use crate::uuid::Uuid;
use rand::RngCore;

/// bit length of the millisecond prefix
pub(crate) const BIT_LEN_PREFIX: u32 = 48;
/// bit length of the short prefix
pub(crate) const BIT_LEN_SHORT_PREFIX: u32 = 16;
/// mask for the millisecond prefix
const MASK_PREFIX: u64 = (1 << BIT_LEN_PREFIX) - 1;
/// mask for the short prefix
const MASK_SHORT_PREFIX: u64 = (1 << BIT_LEN_SHORT_PREFIX) - 1;
/// Default bucket width of the short prefix: one minute.
pub const DEFAULT_COMB_INTERVAL_MILLIS: u64 = 60_000;

/// Where and how coarsely the creation time is embedded.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CombLayout {
    /// Unix milliseconds in the first 48 bits.
    Prefix,
    /// Unix time divided by an interval, wrapped to 16 bits, in the first 16 bits.
    /// With the default one-minute interval the prefix wraps every ~45 days.
    ShortPrefix { interval_millis: u64 },
}

impl CombLayout {
    /// Returns the value written in the prefix for a creation time.
    pub fn prefix(&self, unix_millis: u64) -> u64 {
        match *self {
            CombLayout::Prefix => unix_millis & MASK_PREFIX,
            CombLayout::ShortPrefix { interval_millis } => {
                (unix_millis / interval_millis.max(1)) & MASK_SHORT_PREFIX
            }
        }
    }

    /// bit length of the prefix
    pub const fn bit_len(&self) -> u32 {
        match self {
            CombLayout::Prefix => BIT_LEN_PREFIX,
            CombLayout::ShortPrefix { .. } => BIT_LEN_SHORT_PREFIX,
        }
    }
}

/// Generates a COMB identifier created at `unix_millis`. Version 4, variant `10`.
pub fn comb_uuid<R: RngCore + ?Sized>(layout: CombLayout, unix_millis: u64, rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);

    let prefix_bytes = (layout.bit_len() / 8) as usize;
    let prefix = layout.prefix(unix_millis).to_be_bytes();
    bytes[..prefix_bytes].copy_from_slice(&prefix[8 - prefix_bytes..]);
    apply_version(bytes)
}

/// Returns the prefix carried by a COMB identifier.
pub fn extract_prefix(layout: CombLayout, uuid: Uuid) -> u64 {
    (u128::from(uuid) >> (128 - layout.bit_len())) as u64
}
