// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::clock::{Clock, SystemClock};
use crate::comb::DEFAULT_COMB_INTERVAL_MILLIS;
use crate::error::{BoxDynError, Error};
use crate::generator::{SharedGenerator, UuidGenerator};
use crate::host::{HostInfo, SystemHostInfo};
use crate::node::{NodeCache, NodeId};
use crate::sequence::ClockSequence;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A builder for building the [`UuidGenerator`].
///
/// [`UuidGenerator`]: struct.UuidGenerator.html
pub struct Builder<'a> {
    clock: Option<Box<dyn Clock>>,
    rng: Option<Box<dyn RngCore + Send>>,
    host_info: Option<Box<dyn HostInfo>>,
    node_id: Option<&'a dyn Fn() -> Result<[u8; 6], BoxDynError>>,
    comb_interval: Duration,
}

impl<'a> Default for Builder<'a> {
    fn default() -> Self {
        Builder::new()
    }
}

impl<'a> Builder<'a> {
    /// Construct a new builder for the build of [`UuidGenerator`].
    ///
    /// [`UuidGenerator`]: struct.UuidGenerator.html
    pub fn new() -> Self {
        Self {
            clock: None,
            rng: None,
            host_info: None,
            node_id: None,
            comb_interval: Duration::from_millis(DEFAULT_COMB_INTERVAL_MILLIS),
        }
    }

    /// Set the clock source. Defaults to [`SystemClock`].
    ///
    /// [`SystemClock`]: struct.SystemClock.html
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Set the random number generator. Defaults to an OS-seeded `StdRng`.
    pub fn rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Use a `StdRng` seeded with `seed`, for reproducible output.
    pub fn seed(self, seed: u64) -> Self {
        self.rng(StdRng::seed_from_u64(seed))
    }

    /// Set the host queries used for the node id and the machine identity.
    /// Defaults to [`SystemHostInfo`].
    ///
    /// [`SystemHostInfo`]: struct.SystemHostInfo.html
    pub fn host_info(mut self, host_info: impl HostInfo + 'static) -> Self {
        self.host_info = Some(Box::new(host_info));
        self
    }

    /// Pin the node id instead of resolving the host's hardware address.
    /// If the provided closure returns an error, 'finalize' will fail.
    pub fn node_id(mut self, node_id: &'a dyn Fn() -> Result<[u8; 6], BoxDynError>) -> Self {
        self.node_id = Some(node_id);
        self
    }

    /// Set the bucket width of short-prefix COMB identifiers. Defaults to one minute.
    /// Anything below one millisecond makes 'finalize' fail.
    pub fn comb_interval(mut self, comb_interval: Duration) -> Self {
        self.comb_interval = comb_interval;
        self
    }

    /// Finish building and create a UuidGenerator instance.
    /// This method will return an error if the node id closure fails or the comb interval is invalid.
    pub fn finalize(self) -> Result<UuidGenerator, Error> {
        let comb_interval_millis = self.comb_interval.as_millis() as u64;
        if comb_interval_millis == 0 {
            return Err(Error::InvalidCombInterval);
        }

        let node = if let Some(node_id_fn) = self.node_id {
            let node_id = node_id_fn().map_err(Error::NodeIdFailed)?;
            NodeCache::pinned(NodeId::from_bytes(node_id))
        } else {
            NodeCache::default()
        };

        let shared = Arc::new(SharedGenerator {
            clock: self.clock.unwrap_or_else(|| Box::new(SystemClock::new())),
            rng: Mutex::new(
                self.rng
                    .unwrap_or_else(|| Box::new(StdRng::from_entropy())),
            ),
            host: self.host_info.unwrap_or_else(|| Box::new(SystemHostInfo)),
            sequence: ClockSequence::new(),
            node,
            comb_interval_millis,
        });
        Ok(UuidGenerator::new_inner(shared))
    }
}
