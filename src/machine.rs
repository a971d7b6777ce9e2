// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Stable, host-specific identifiers derived from host name, MAC and IP.
//!
//! The machine string is hashed with SHA-256. If the host name, the MAC or the
//! IP addresses change, every derived identifier changes too.

use crate::codec;
use crate::host::HostInfo;
use crate::uuid::Uuid;
use log::{trace, warn};
use sha2::{Digest, Sha256};

/// version digit applied to the machine UUID
pub const VERSION_MACHINE: u8 = 4;

/// Returns `"<host name> <MAC> <IP> [<IP>...]"`, e.g.
/// `"hostname123 11-22-33-44-55-66 192.168.0.10"`.
///
/// Only one interface is used: the first non-loopback one with a 6-byte MAC and
/// at least one IP. Unavailable components are left out.
pub fn machine_string(host: &dyn HostInfo) -> String {
    let mut parts = Vec::with_capacity(3);
    if let Some(host_name) = host.host_name() {
        parts.push(host_name);
    }

    match host.interfaces() {
        Ok(interfaces) => {
            let nic = interfaces.iter().find(|iface| {
                !iface.is_loopback
                    && iface.mac.as_ref().map_or(false, |mac| mac.len() == 6)
                    && !iface.ips.is_empty()
            });
            if let Some(nic) = nic {
                if let Some(mac) = nic.mac.as_deref() {
                    parts.push(codec::format_mac(mac));
                }
                parts.push(nic.ips.join(" "));
            }
        }
        Err(e) => warn!("could not enumerate network interfaces: {}", e),
    }

    let string = parts.join(" ");
    trace!("machine string: {:?}", string);
    string
}

/// Returns the SHA-256 digest of the machine string.
pub fn machine_hash(host: &dyn HostInfo) -> [u8; 32] {
    Sha256::digest(machine_string(host).as_bytes()).into()
}

/// Returns the machine hash as 64 lowercase hex digits.
pub fn machine_hexa(host: &dyn HostInfo) -> String {
    codec::bytes_to_hex(&machine_hash(host))
}

/// Returns the first 8 bytes of the machine hash as a big-endian number.
pub fn machine_id(host: &dyn HostInfo) -> u64 {
    let hash = machine_hash(host);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[..8]);
    u64::from_be_bytes(bytes)
}

/// Returns the first 16 bytes of the machine hash with version 4 and variant `10` applied.
pub fn machine_uuid(host: &dyn HostInfo) -> Uuid {
    let hash = machine_hash(host);
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);
    Uuid::from(bytes).with_version(VERSION_MACHINE)
}
