// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Layout of time-based identifiers.
//!
//! The 60-bit timestamp is written as 15 hex digits and split over the first
//! three groups. In standard (RFC 4122) order the low 8 digits come first, then
//! the middle 4, then the version digit `1` and the high 3. In natural order the
//! digits stay most-significant first and the version digit is `4`:
//!
//! ```text
//! standard: LLLLLLLL-MMMM-1HHH-Vxxx-NNNNNNNNNNNN
//! natural:  HHHHHHHH-MMMM-4LLL-Vxxx-NNNNNNNNNNNN
//! ```
//!
//! Natural-order identifiers share their version digit with random ones; only
//! the caller knows which encoding produced a given value.

use crate::clock::{from_gregorian_timestamp, out_of_range, MAX_TIMESTAMP};
use crate::error::Error;
use crate::node::NodeId;
use crate::sequence::Tick;
use crate::uuid::Uuid;
use chrono::{DateTime, Utc};

/// version digit of standard time-based identifiers
pub const VERSION_STANDARD: u8 = 1;
/// version digit of natural-order time-based identifiers, shared with random identifiers
pub const VERSION_NATURAL: u8 = 4;

/// mask for the 12 timestamp bits of the third group
const MASK_TIME_HI: u64 = 0x0fff;
const MASK_TIME_MID: u64 = 0xffff;
const MASK_TIME_LOW: u64 = 0xffff_ffff;

/// Byte arrangement of the timestamp inside the identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum TimestampOrder {
    /// RFC 4122 time-low, time-mid, time-hi-and-version
    #[default]
    Standard,
    /// Most significant digits first; sorts by creation time as text.
    Natural,
}

impl TimestampOrder {
    /// Returns the version digit written for this order.
    pub const fn version(self) -> u8 {
        match self {
            TimestampOrder::Standard => VERSION_STANDARD,
            TimestampOrder::Natural => VERSION_NATURAL,
        }
    }

    /// Returns the order a version digit stands for, if any.
    pub const fn from_version(version: u8) -> Option<Self> {
        match version {
            VERSION_STANDARD => Some(TimestampOrder::Standard),
            VERSION_NATURAL => Some(TimestampOrder::Natural),
            _ => None,
        }
    }
}

/// Assembles a time-based identifier from a tick of the clock sequence and a node id.
/// Fails if the timestamp does not fit in 60 bits.
pub fn encode(order: TimestampOrder, tick: Tick, node: NodeId) -> Result<Uuid, Error> {
    let ts = tick.timestamp;
    if ts > MAX_TIMESTAMP {
        return Err(out_of_range(ts));
    }
    let version = (order.version() as u16) << 12;
    Ok(match order {
        TimestampOrder::Standard => Uuid::from_fields(
            (ts & MASK_TIME_LOW) as u32,
            ((ts >> 32) & MASK_TIME_MID) as u16,
            version | ((ts >> 48) & MASK_TIME_HI) as u16,
            tick.clock_seq,
            node.as_bytes(),
        ),
        TimestampOrder::Natural => Uuid::from_fields(
            (ts >> 28) as u32,
            ((ts >> 12) & MASK_TIME_MID) as u16,
            version | (ts & MASK_TIME_HI) as u16,
            tick.clock_seq,
            node.as_bytes(),
        ),
    })
}

/// DecomposedUuid is the parts of a time-based identifier.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct DecomposedUuid {
    pub uuid: Uuid,
    pub order: TimestampOrder,
    pub timestamp: u64,
    pub clock_seq: u16,
    pub node: NodeId,
}

impl DecomposedUuid {
    /// Returns the instant the timestamp stands for.
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        from_gregorian_timestamp(self.timestamp)
    }

    /// Returns the node id if it may identify the host: standard order and multicast bit clear.
    pub fn hardware_node(&self) -> Option<NodeId> {
        if self.order == TimestampOrder::Standard && !self.node.is_synthetic() {
            Some(self.node)
        } else {
            None
        }
    }
}

/// Break a time-based identifier up into its parts.
/// Returns `None` if the version digit is neither 1 nor 4.
pub fn decompose(uuid: Uuid) -> Option<DecomposedUuid> {
    let order = TimestampOrder::from_version(uuid.version())?;
    let low = uuid.time_low() as u64;
    let mid = uuid.time_mid() as u64;
    let hi = uuid.time_hi_and_version() as u64 & MASK_TIME_HI;

    let timestamp = match order {
        TimestampOrder::Standard => hi << 48 | mid << 32 | low,
        TimestampOrder::Natural => low << 28 | mid << 12 | hi,
    };

    Some(DecomposedUuid {
        uuid,
        order,
        timestamp,
        clock_seq: uuid.clock_seq(),
        node: uuid.node(),
    })
}

/// Returns the 60-bit timestamp embedded in a time-based identifier.
pub fn extract_timestamp(uuid: Uuid) -> Option<u64> {
    decompose(uuid).map(|parts| parts.timestamp)
}

/// Returns the creation instant embedded in a time-based identifier.
pub fn extract_instant(uuid: Uuid) -> Option<DateTime<Utc>> {
    decompose(uuid)?.instant()
}

/// Returns the hardware node id, or `None` for synthetic nodes and non-standard layouts.
pub fn extract_node_id(uuid: Uuid) -> Option<NodeId> {
    decompose(uuid)?.hardware_node()
}

/// Parses `text` and returns its creation instant.
///
/// Malformed text is an error; an unknown version digit is `Ok(None)`.
pub fn decode_instant(text: &str) -> Result<Option<DateTime<Utc>>, Error> {
    Ok(extract_instant(text.parse()?))
}

/// Parses `text` and returns its hardware node id.
///
/// Malformed text is an error; an unknown version digit or a synthetic node is `Ok(None)`.
pub fn decode_node_id(text: &str) -> Result<Option<NodeId>, Error> {
    Ok(extract_node_id(text.parse()?))
}
