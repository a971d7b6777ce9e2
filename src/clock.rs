// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::error::Error;
use chrono::prelude::*;
use std::time::Instant;

/// Seconds between 1582-10-15T00:00:00Z and 1970-01-01T00:00:00Z.
pub(crate) const GREGORIAN_OFFSET_SECONDS: i64 = 12_219_292_800;
/// Number of 100 nsec intervals in a second.
pub(crate) const TICKS_PER_SECOND: u64 = 10_000_000;
const TICKS_PER_MILLI: u64 = 10_000;
/// nanoseconds, i.e. 100 nsec
const NANOS_PER_TICK: u32 = 100;
/// The largest timestamp a time-based UUID can carry.
pub const MAX_TIMESTAMP: u64 = (1 << 60) - 1;

/// A source of wall-clock time and a monotonic tick counter.
///
/// The wall clock feeds the timestamp embedded in an identifier. The
/// monotonic counter is only used to measure elapsed intervals between
/// calls that observe the same timestamp.
pub trait Clock: Send + Sync {
    /// Returns the current calendar time.
    fn now(&self) -> DateTime<Utc>;

    /// Returns nanoseconds elapsed since an arbitrary, fixed origin.
    /// Never decreases within a process.
    fn monotonic_nanos(&self) -> u64;
}

/// The host clock: `Utc::now()` and `std::time::Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn monotonic_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Converts an instant into the count of 100 nsec intervals since 1582-10-15T00:00:00Z.
///
/// Instants before the Gregorian epoch, or too far in the future to fit in 60 bits,
/// are rejected.
pub fn to_gregorian_timestamp(instant: DateTime<Utc>) -> Result<u64, Error> {
    let seconds = instant
        .timestamp()
        .checked_add(GREGORIAN_OFFSET_SECONDS)
        .filter(|s| *s >= 0)
        .ok_or(Error::TimestampOutOfRange(instant))? as u64;
    // leap seconds are reported as nanos >= 1_000_000_000
    let nanos = instant.timestamp_subsec_nanos().min(999_999_999);

    seconds
        .checked_mul(TICKS_PER_SECOND)
        .and_then(|t| t.checked_add((nanos / NANOS_PER_TICK) as u64))
        .filter(|t| *t <= MAX_TIMESTAMP)
        .ok_or(Error::TimestampOutOfRange(instant))
}

/// Converts a Gregorian timestamp back into an instant.
/// Returns `None` only if the value is outside the range chrono can represent.
pub fn from_gregorian_timestamp(timestamp: u64) -> Option<DateTime<Utc>> {
    let seconds = (timestamp / TICKS_PER_SECOND) as i64 - GREGORIAN_OFFSET_SECONDS;
    let nanos = (timestamp % TICKS_PER_SECOND) as u32 * NANOS_PER_TICK;
    DateTime::from_timestamp(seconds, nanos)
}

/// Converts Unix epoch milliseconds into a Gregorian timestamp.
pub fn from_unix_millis(millis: i64) -> Result<u64, Error> {
    let instant = DateTime::from_timestamp_millis(millis).unwrap_or(if millis < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    });
    to_gregorian_timestamp(instant)
}

/// Converts a Gregorian timestamp into Unix epoch milliseconds, rounding down.
pub fn to_unix_millis(timestamp: u64) -> i64 {
    (timestamp / TICKS_PER_MILLI) as i64 - GREGORIAN_OFFSET_SECONDS * 1_000
}

pub(crate) fn out_of_range(timestamp: u64) -> Error {
    Error::TimestampOutOfRange(
        from_gregorian_timestamp(timestamp).unwrap_or(DateTime::<Utc>::MAX_UTC),
    )
}
