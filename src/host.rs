// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::error::BoxDynError;

/// A network interface as seen by the node and machine resolvers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub mac: Option<Vec<u8>>,
    pub ips: Vec<String>,
    pub is_up: bool,
    pub is_loopback: bool,
}

impl Interface {
    /// Returns the 6-byte hardware address if the interface carries a usable one.
    pub fn hardware_address(&self) -> Option<[u8; 6]> {
        let mac = self.mac.as_deref()?;
        let mac: [u8; 6] = mac.try_into().ok()?;
        if mac == [0u8; 6] {
            None
        } else {
            Some(mac)
        }
    }
}

/// Host queries consumed by the generator.
///
/// Both calls are best effort: a failure or an empty answer makes the caller
/// fall back rather than fail.
pub trait HostInfo: Send + Sync {
    /// Returns the host name, if it can be determined.
    fn host_name(&self) -> Option<String>;

    /// Enumerates the network interfaces of the host.
    fn interfaces(&self) -> Result<Vec<Interface>, BoxDynError>;
}

/// Queries the running host.
///
/// Without the `host-info` feature nothing is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHostInfo;

#[cfg(feature = "host-info")]
impl HostInfo for SystemHostInfo {
    fn host_name(&self) -> Option<String> {
        hostname::get()
            .ok()
            .map(|h| h.to_string_lossy().to_string())
            .filter(|h| !h.is_empty())
    }

    fn interfaces(&self) -> Result<Vec<Interface>, BoxDynError> {
        Ok(pnet_datalink::interfaces()
            .into_iter()
            .map(|iface| {
                let mac = iface.mac.map(|mac| mac.octets().to_vec());
                Interface {
                    is_up: iface.is_up(),
                    is_loopback: iface.is_loopback(),
                    ips: iface.ips.iter().map(|n| n.ip().to_string()).collect(),
                    name: iface.name,
                    mac,
                }
            })
            .collect())
    }
}

#[cfg(not(feature = "host-info"))]
impl HostInfo for SystemHostInfo {
    fn host_name(&self) -> Option<String> {
        None
    }

    fn interfaces(&self) -> Result<Vec<Interface>, BoxDynError> {
        Ok(Vec::new())
    }
}
