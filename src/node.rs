// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::codec;
use crate::error::Error;
use crate::host::HostInfo;
use log::{debug, warn};
use rand::RngCore;
use std::{fmt, str::FromStr, sync::OnceLock};

/// The multicast bit: least significant bit of the first byte.
const MULTICAST_BIT: u8 = 0x01;

/// A 48-bit node identifier.
///
/// Either a real hardware address, or a random value with the multicast bit
/// forced on. A set multicast bit marks the value as synthetic so that it is
/// never reported as host-identifying.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId([u8; 6]);

impl NodeId {
    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Draws 48 random bits and forces the multicast bit on.
    pub fn synthetic<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 6];
        rng.fill_bytes(&mut bytes);
        bytes[0] |= MULTICAST_BIT;
        Self(bytes)
    }

    /// Returns true if the multicast bit is set, i.e. not a genuine hardware address.
    pub const fn is_synthetic(&self) -> bool {
        self.0[0] & MULTICAST_BIT != 0
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl fmt::Display for NodeId {
    /// Returns the 12 lowercase hex digits of the node block.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::bytes_to_hex(&self.0))
    }
}

impl TryFrom<&[u8]> for NodeId {
    type Error = Error;

    fn try_from(src: &[u8]) -> Result<Self, Self::Error> {
        <[u8; 6]>::try_from(src)
            .map(Self)
            .map_err(|_| Error::InvalidNodeId(src.len()))
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Self::try_from(codec::hex_to_bytes(src)?.as_slice())
    }
}

impl From<NodeId> for [u8; 6] {
    fn from(src: NodeId) -> Self {
        src.0
    }
}

/// Returns the first usable hardware address of the host: an interface that is
/// up, not a loopback, and carries a non-zero 6-byte MAC.
pub fn resolve_real_node_id(host: &dyn HostInfo) -> Option<NodeId> {
    let interfaces = match host.interfaces() {
        Ok(interfaces) => interfaces,
        Err(e) => {
            warn!("could not enumerate network interfaces: {}", e);
            return None;
        }
    };

    interfaces
        .iter()
        .filter(|iface| iface.is_up && !iface.is_loopback)
        .find_map(|iface| iface.hardware_address())
        .map(NodeId)
}

/// Caches the outcome of the hardware address lookup.
///
/// The host is queried once; a host without a usable interface is remembered
/// as such. Concurrent initializers race on `OnceLock::get_or_init` and only
/// one of them queries the host.
#[derive(Debug, Default)]
pub(crate) struct NodeCache {
    real: OnceLock<Option<NodeId>>,
}

impl NodeCache {
    /// Creates a cache already holding `node_id`; the host is never queried.
    pub(crate) fn pinned(node_id: NodeId) -> Self {
        Self {
            real: OnceLock::from(Some(node_id)),
        }
    }

    pub(crate) fn get_or_resolve(&self, host: &dyn HostInfo) -> Option<NodeId> {
        *self.real.get_or_init(|| {
            let resolved = resolve_real_node_id(host);
            match resolved {
                Some(node_id) => debug!("resolved hardware node id {}", node_id),
                None => debug!("no hardware node id, synthetic node ids will be used"),
            }
            resolved
        })
    }
}
