// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::builder::Builder;
use crate::clock::{to_gregorian_timestamp, Clock};
use crate::comb::{self, CombLayout};
use crate::error::Error;
use crate::host::HostInfo;
use crate::machine;
use crate::node::{NodeCache, NodeId};
use crate::random;
use crate::sequence::{ClockSequence, Tick};
use crate::timestamp::{self, TimestampOrder};
use crate::uuid::Uuid;
use chrono::prelude::*;
use log::debug;
use rand::RngCore;
use std::sync::{Arc, Mutex};

/// SharedGenerator is shared between UuidGenerator instances.
/// This struct is not exposed to the public.
pub(crate) struct SharedGenerator {
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) rng: Mutex<Box<dyn RngCore + Send>>,
    pub(crate) host: Box<dyn HostInfo>,
    pub(crate) sequence: ClockSequence,
    pub(crate) node: NodeCache,
    pub(crate) comb_interval_millis: u64,
}

/// UuidGenerator owns the clock sequence, the cached node id and the random source.
/// It is thread-safe and can be cloned to be used in multiple threads; clones share
/// the same state.
pub struct UuidGenerator(pub(crate) Arc<SharedGenerator>);

impl UuidGenerator {
    /// Create a new UuidGenerator with the default configuration.
    /// For custom configuration see [`builder`].
    ///
    /// [`builder`]: struct.UuidGenerator.html#method.builder
    pub fn new() -> Result<Self, Error> {
        Builder::new().finalize()
    }

    /// Create a new [`Builder`] to construct a UuidGenerator.
    ///
    /// [`Builder`]: struct.Builder.html
    pub fn builder<'a>() -> Builder<'a> {
        Builder::new()
    }

    pub(crate) fn new_inner(shared: Arc<SharedGenerator>) -> Self {
        Self(shared)
    }

    /// Generates a time-based identifier for `instant`.
    ///
    /// With `hardware_node` the host's hardware address is embedded when one can
    /// be resolved; otherwise, and always without it, a synthetic node id with the
    /// multicast bit set is drawn.
    ///
    /// The embedded timestamp is exactly `instant` truncated to 100 nsec. Once
    /// every clock sequence of that timestamp has been handed out, or it is too
    /// old to be tracked, a synthetic node id keeps the identifier unique even
    /// when `hardware_node` is set.
    pub fn generate_timestamp(
        &self,
        instant: DateTime<Utc>,
        order: TimestampOrder,
        hardware_node: bool,
    ) -> Result<Uuid, Error> {
        let timestamp = to_gregorian_timestamp(instant)?;
        let tick = self.0.sequence.next_at(timestamp, &*self.0.clock)?;
        self.assemble(order, tick, hardware_node)
    }

    /// Like [`generate_timestamp`] for the current time of the clock, except that
    /// an exhausted clock sequence borrows the next 100 nsec timestamp.
    ///
    /// [`generate_timestamp`]: UuidGenerator::generate_timestamp
    fn generate_now(&self, order: TimestampOrder, hardware_node: bool) -> Result<Uuid, Error> {
        let timestamp = to_gregorian_timestamp(self.0.clock.now())?;
        let tick = self.0.sequence.next(timestamp, &*self.0.clock)?;
        self.assemble(order, tick, hardware_node)
    }

    fn assemble(
        &self,
        order: TimestampOrder,
        tick: Tick,
        hardware_node: bool,
    ) -> Result<Uuid, Error> {
        let node = match hardware_node.then(|| self.node_id()).flatten() {
            Some(node) if tick.exclusive => node,
            Some(_) => {
                debug!(
                    "clock sequence of timestamp {} unavailable, using a synthetic node id",
                    tick.timestamp
                );
                self.with_rng(|rng| NodeId::synthetic(rng))?
            }
            None => {
                if hardware_node {
                    debug!("no hardware address available, using a synthetic node id");
                }
                self.with_rng(|rng| NodeId::synthetic(rng))?
            }
        };

        timestamp::encode(order, tick, node)
    }

    /// Version 1, standard order, synthetic node.
    pub fn timestamp_uuid(&self) -> Result<Uuid, Error> {
        self.generate_now(TimestampOrder::Standard, false)
    }

    /// Version 1, standard order, synthetic node, for an explicit instant.
    /// See [`generate_timestamp`](UuidGenerator::generate_timestamp).
    pub fn timestamp_uuid_at(&self, instant: DateTime<Utc>) -> Result<Uuid, Error> {
        self.generate_timestamp(instant, TimestampOrder::Standard, false)
    }

    /// Version 1, standard order, hardware node when available.
    pub fn timestamp_and_machine_uuid(&self) -> Result<Uuid, Error> {
        self.generate_now(TimestampOrder::Standard, true)
    }

    /// Version 1, standard order, hardware node when available, for an explicit instant.
    /// See [`generate_timestamp`](UuidGenerator::generate_timestamp).
    pub fn timestamp_and_machine_uuid_at(&self, instant: DateTime<Utc>) -> Result<Uuid, Error> {
        self.generate_timestamp(instant, TimestampOrder::Standard, true)
    }

    /// Version 4, natural order, synthetic node.
    pub fn natural_timestamp_uuid(&self) -> Result<Uuid, Error> {
        self.generate_now(TimestampOrder::Natural, false)
    }

    pub fn natural_timestamp_uuid_at(&self, instant: DateTime<Utc>) -> Result<Uuid, Error> {
        self.generate_timestamp(instant, TimestampOrder::Natural, false)
    }

    /// Version 4, natural order, hardware node when available.
    pub fn natural_timestamp_and_machine_uuid(&self) -> Result<Uuid, Error> {
        self.generate_now(TimestampOrder::Natural, true)
    }

    pub fn natural_timestamp_and_machine_uuid_at(
        &self,
        instant: DateTime<Utc>,
    ) -> Result<Uuid, Error> {
        self.generate_timestamp(instant, TimestampOrder::Natural, true)
    }

    /// Version 4, random.
    pub fn random_uuid(&self) -> Result<Uuid, Error> {
        self.with_rng(|rng| random::random_uuid(rng))
    }

    /// Version 4, SHA-256 of random data.
    pub fn random_hash_uuid(&self) -> Result<Uuid, Error> {
        self.with_rng(|rng| random::random_hash_uuid(rng))
    }

    /// COMB with the current Unix milliseconds in the first 48 bits.
    pub fn prefix_comb(&self) -> Result<Uuid, Error> {
        self.comb_at(CombLayout::Prefix, self.0.clock.now())
    }

    /// COMB with the current `comb_interval` bucket, wrapped to 16 bits, in the first 16 bits.
    pub fn short_prefix_comb(&self) -> Result<Uuid, Error> {
        self.comb_at(self.short_prefix_layout(), self.0.clock.now())
    }

    /// Returns the short-prefix layout configured for this generator.
    pub fn short_prefix_layout(&self) -> CombLayout {
        CombLayout::ShortPrefix {
            interval_millis: self.0.comb_interval_millis,
        }
    }

    /// Generates a COMB identifier for `instant`. Instants before 1970 use a zero prefix.
    pub fn comb_at(&self, layout: CombLayout, instant: DateTime<Utc>) -> Result<Uuid, Error> {
        let unix_millis = instant.timestamp_millis().max(0) as u64;
        self.with_rng(|rng| comb::comb_uuid(layout, unix_millis, rng))
    }

    /// Returns the host's hardware address. The host is queried on first use only.
    pub fn node_id(&self) -> Option<NodeId> {
        self.0.node.get_or_resolve(&*self.0.host)
    }

    pub fn machine_string(&self) -> String {
        machine::machine_string(&*self.0.host)
    }

    pub fn machine_hash(&self) -> [u8; 32] {
        machine::machine_hash(&*self.0.host)
    }

    pub fn machine_hexa(&self) -> String {
        machine::machine_hexa(&*self.0.host)
    }

    pub fn machine_id(&self) -> u64 {
        machine::machine_id(&*self.0.host)
    }

    pub fn machine_uuid(&self) -> Uuid {
        machine::machine_uuid(&*self.0.host)
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut (dyn RngCore + Send)) -> T) -> Result<T, Error> {
        let mut rng = self.0.rng.lock().map_err(|_| Error::MutexPoisoned)?;
        Ok(f(&mut **rng))
    }
}

/// Returns a new `UuidGenerator` referencing the same state as `self`.
/// This is used for concurrent use.
impl Clone for UuidGenerator {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
