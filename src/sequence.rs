// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::clock::{out_of_range, Clock, MAX_TIMESTAMP};
use crate::error::Error;
use log::debug;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// bit length of the counter part of the clock sequence
pub(crate) const BIT_LEN_COUNTER: u16 = 12;
/// mask for the counter
pub(crate) const MASK_COUNTER: u16 = (1 << BIT_LEN_COUNTER) - 1;
/// Leading hex digit of the clock sequence, picked by `(timestamp % 16) / 4`.
const VARIANT_DIGITS: [u16; 4] = [0x8, 0x9, 0xa, 0xb];
/// nanoseconds, i.e. 1 usec
const COUNTER_UNIT: u64 = 1_000;
/// number of timestamps whose last counter is remembered
pub(crate) const HISTORY_CAPACITY: usize = 4096;

/// Counter state of one issued timestamp.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Slot {
    /// last counter handed out for the timestamp
    pub(crate) counter: u16,
    /// monotonic reading taken when the timestamp was first issued
    pub(crate) baseline: u64,
}

/// Internals of ClockSequence.
/// This struct is not exposed to the public.
#[derive(Debug, Default)]
pub(crate) struct Internals {
    /// wall-clock timestamp seen by the previous clock-driven call, and the
    /// timestamp it was actually issued under
    pub(crate) live: Option<(u64, u64)>,
    /// recently issued timestamps
    pub(crate) slots: BTreeMap<u64, Slot>,
    /// timestamps at or below this value were forgotten and cannot be reissued safely
    pub(crate) floor: Option<u64>,
}

impl Internals {
    /// Hands out the next counter of `timestamp`, or `None` when every counter
    /// of it may already be in use.
    fn reserve(&mut self, timestamp: u64, now: u64) -> Option<u16> {
        if let Some(slot) = self.slots.get_mut(&timestamp) {
            let elapsed = ((now.saturating_sub(slot.baseline) / COUNTER_UNIT)
                % (MASK_COUNTER as u64 + 1)) as u16;
            let counter = elapsed.max(slot.counter + 1);
            if counter > MASK_COUNTER {
                return None;
            }
            slot.counter = counter;
            return Some(counter);
        }
        if self.floor.map_or(false, |floor| timestamp <= floor) {
            return None;
        }

        self.slots.insert(
            timestamp,
            Slot {
                counter: 0,
                baseline: now,
            },
        );
        if self.slots.len() > HISTORY_CAPACITY {
            if let Some((oldest, _)) = self.slots.pop_first() {
                self.floor = Some(self.floor.map_or(oldest, |floor| floor.max(oldest)));
            }
        }
        Some(0)
    }
}

/// The timestamp and clock sequence to embed in one identifier.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Tick {
    pub timestamp: u64,
    pub clock_seq: u16,
    /// False when the pair may have been handed out before. The identifier then
    /// needs a fresh synthetic node id to stay unique.
    pub exclusive: bool,
}

/// Disambiguates identifiers generated within the same timestamp.
///
/// The first call for a timestamp gets counter 0 and takes a monotonic
/// baseline. Repeated calls for it use the microseconds elapsed since that
/// baseline (modulo 4096), bumped to at least the previous counter plus one, so
/// two callers never share a `(timestamp, counter)` pair. The last counter of
/// each recent timestamp is remembered: coming back to one, after a clock
/// regression or an explicit instant, continues where it stopped.
///
/// [`next`] serves the wall clock and borrows the next 100 nsec timestamp when
/// the counter runs out. [`next_at`] never moves the timestamp; an exhausted or
/// forgotten timestamp yields a non-exclusive tick instead.
///
/// [`next`]: ClockSequence::next
/// [`next_at`]: ClockSequence::next_at
#[derive(Debug, Default)]
pub struct ClockSequence {
    pub(crate) internals: Mutex<Internals>,
}

impl ClockSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the timestamp and clock sequence for an identifier observed at
    /// `timestamp` on the wall clock.
    pub fn next(&self, timestamp: u64, clock: &dyn Clock) -> Result<Tick, Error> {
        if timestamp > MAX_TIMESTAMP {
            return Err(out_of_range(timestamp));
        }
        let mut internals = self.internals.lock().map_err(|_| Error::MutexPoisoned)?;
        let now = clock.monotonic_nanos();

        // resume from the timestamp borrowed by the previous call of this tick
        let mut issued = match internals.live {
            Some((last, issued)) if last == timestamp => issued,
            Some((last, _)) => {
                if timestamp < last {
                    debug!("clock moved backwards from {} to {}", last, timestamp);
                }
                timestamp
            }
            None => timestamp,
        };

        let counter = loop {
            match internals.reserve(issued, now) {
                Some(counter) => break Some(counter),
                None if internals.slots.contains_key(&issued) => {
                    if issued >= MAX_TIMESTAMP {
                        return Err(out_of_range(issued + 1));
                    }
                    issued += 1;
                    debug!(
                        "clock sequence exhausted at {}, borrowing timestamp {}",
                        timestamp, issued
                    );
                }
                // forgotten after a long regression: borrowing could run far ahead
                None => break None,
            }
        };
        internals.live = Some((timestamp, issued));

        Ok(make_tick(issued, counter, now))
    }

    /// Returns the clock sequence for an identifier at the explicit `timestamp`.
    /// The timestamp is always returned unchanged.
    pub fn next_at(&self, timestamp: u64, clock: &dyn Clock) -> Result<Tick, Error> {
        if timestamp > MAX_TIMESTAMP {
            return Err(out_of_range(timestamp));
        }
        let mut internals = self.internals.lock().map_err(|_| Error::MutexPoisoned)?;
        let now = clock.monotonic_nanos();
        let counter = internals.reserve(timestamp, now);
        if counter.is_none() {
            debug!("no clock sequence left for timestamp {}", timestamp);
        }
        Ok(make_tick(timestamp, counter, now))
    }
}

fn make_tick(timestamp: u64, counter: Option<u16>, now: u64) -> Tick {
    let exclusive = counter.is_some();
    let counter = counter.unwrap_or((now / COUNTER_UNIT % (MASK_COUNTER as u64 + 1)) as u16);
    Tick {
        timestamp,
        clock_seq: clock_seq(timestamp, counter),
        exclusive,
    }
}

/// Builds the 16-bit clock sequence block: a variant digit derived from the
/// timestamp followed by the 12-bit counter.
pub(crate) fn clock_seq(timestamp: u64, counter: u16) -> u16 {
    let variant = VARIANT_DIGITS[((timestamp % 16) / 4) as usize];
    variant << BIT_LEN_COUNTER | (counter & MASK_COUNTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::prelude::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// A clock whose monotonic counter advances by `step` nanoseconds per reading.
    struct SteppingClock {
        nanos: AtomicU64,
        step: u64,
    }

    impl SteppingClock {
        fn new(step: u64) -> Self {
            Self {
                nanos: AtomicU64::new(0),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
        }

        fn monotonic_nanos(&self) -> u64 {
            self.nanos.fetch_add(self.step, Ordering::SeqCst)
        }
    }

    fn counter(tick: &Tick) -> u16 {
        tick.clock_seq & MASK_COUNTER
    }

    #[test]
    fn test_clock_seq_variant_digit() {
        assert_eq!(clock_seq(0, 0) >> 12, 0x8);
        assert_eq!(clock_seq(4, 0) >> 12, 0x9);
        assert_eq!(clock_seq(8, 0) >> 12, 0xa);
        assert_eq!(clock_seq(15, 0xfff), 0xbfff);
        assert_eq!(clock_seq(0x1b21dd213814000, 0x123), 0x8123);
    }

    #[test]
    fn test_first_of_tick_starts_at_zero() -> Result<(), Error> {
        let clock = SteppingClock::new(5_000);
        let seq = ClockSequence::new();

        let tick = seq.next(1_000, &clock)?;
        assert_eq!(tick.timestamp, 1_000);
        assert_eq!(counter(&tick), 0);
        assert!(tick.exclusive);

        seq.next(1_000, &clock)?;
        let tick = seq.next(1_001, &clock)?;
        assert_eq!(tick.timestamp, 1_001);
        assert_eq!(counter(&tick), 0);
        Ok(())
    }

    #[test]
    fn test_repeat_within_tick_uses_elapsed_micros() -> Result<(), Error> {
        let clock = SteppingClock::new(5_000);
        let seq = ClockSequence::new();

        let first = seq.next(42, &clock)?;
        let second = seq.next(42, &clock)?;
        let third = seq.next(42, &clock)?;
        assert_eq!(counter(&first), 0);
        assert_eq!(counter(&second), 5);
        assert_eq!(counter(&third), 10);
        assert_eq!(second.timestamp, 42);
        Ok(())
    }

    #[test]
    fn test_repeat_within_tick_is_strictly_increasing() -> Result<(), Error> {
        // monotonic clock frozen: elapsed is always 0
        let clock = SteppingClock::new(0);
        let seq = ClockSequence::new();

        let mut last = seq.next(7, &clock)?;
        for _ in 0..MASK_COUNTER {
            let tick = seq.next(7, &clock)?;
            assert_eq!(tick.timestamp, 7);
            assert!(counter(&tick) > counter(&last));
            last = tick;
        }
        assert_eq!(counter(&last), MASK_COUNTER);
        Ok(())
    }

    #[test]
    fn test_exhausted_counter_borrows_next_timestamp() -> Result<(), Error> {
        let clock = SteppingClock::new(0);
        let seq = ClockSequence::new();

        for _ in 0..=MASK_COUNTER {
            seq.next(100, &clock)?;
        }
        let borrowed = seq.next(100, &clock)?;
        assert_eq!(borrowed.timestamp, 101);
        assert_eq!(counter(&borrowed), 0);
        let again = seq.next(100, &clock)?;
        assert_eq!(again.timestamp, 101);
        assert_eq!(counter(&again), 1);

        // the real clock reaching the borrowed timestamp continues its counter
        let next = seq.next(101, &clock)?;
        assert_eq!(next.timestamp, 101);
        assert_eq!(counter(&next), 2);
        Ok(())
    }

    #[test]
    fn test_borrowing_past_the_last_timestamp_fails() -> Result<(), Error> {
        let clock = SteppingClock::new(0);
        let seq = ClockSequence::new();

        for _ in 0..=MASK_COUNTER {
            seq.next(MAX_TIMESTAMP, &clock)?;
        }
        assert!(matches!(
            seq.next(MAX_TIMESTAMP, &clock),
            Err(Error::TimestampOutOfRange(_))
        ));
        assert!(matches!(
            seq.next_at(MAX_TIMESTAMP + 1, &clock),
            Err(Error::TimestampOutOfRange(_))
        ));
        Ok(())
    }

    #[test]
    fn test_clock_regression_restarts_tick() -> Result<(), Error> {
        let clock = SteppingClock::new(1_000);
        let seq = ClockSequence::new();

        seq.next(500, &clock)?;
        seq.next(500, &clock)?;
        let regressed = seq.next(400, &clock)?;
        assert_eq!(regressed.timestamp, 400);
        assert_eq!(counter(&regressed), 0);

        let repeat = seq.next(400, &clock)?;
        assert_eq!(repeat.timestamp, 400);
        assert!(counter(&repeat) > 0);
        Ok(())
    }

    #[test]
    fn test_returning_to_an_issued_timestamp_continues_its_counter() -> Result<(), Error> {
        let clock = SteppingClock::new(0);
        let seq = ClockSequence::new();

        let first = seq.next(900, &clock)?;
        seq.next_at(10, &clock)?;
        let back = seq.next(900, &clock)?;
        assert_eq!(back.timestamp, 900);
        assert!(counter(&back) > counter(&first));

        // regression onto an issued timestamp
        seq.next(901, &clock)?;
        let regressed = seq.next(900, &clock)?;
        assert!(counter(&regressed) > counter(&back));
        Ok(())
    }

    #[test]
    fn test_explicit_timestamp_is_never_moved() -> Result<(), Error> {
        let clock = SteppingClock::new(0);
        let seq = ClockSequence::new();

        for _ in 0..=MASK_COUNTER {
            let tick = seq.next_at(3_000, &clock)?;
            assert_eq!(tick.timestamp, 3_000);
            assert!(tick.exclusive);
        }
        let exhausted = seq.next_at(3_000, &clock)?;
        assert_eq!(exhausted.timestamp, 3_000);
        assert!(!exhausted.exclusive);
        Ok(())
    }

    #[test]
    fn test_forgotten_timestamps_are_not_exclusive() -> Result<(), Error> {
        let clock = SteppingClock::new(0);
        let seq = ClockSequence::new();

        for ts in 0..=HISTORY_CAPACITY as u64 {
            assert!(seq.next(1_000 + ts, &clock)?.exclusive);
        }
        // 1_000 was evicted: it may hold any counter
        assert!(!seq.next_at(1_000, &clock)?.exclusive);
        assert!(!seq.next_at(999, &clock)?.exclusive);
        let regressed = seq.next(1_000, &clock)?;
        assert_eq!(regressed.timestamp, 1_000);
        assert!(!regressed.exclusive);

        // still remembered
        assert!(seq.next_at(1_001, &clock)?.exclusive);
        Ok(())
    }
}
