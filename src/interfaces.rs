// SPDX-License-Identifier: EUPL-1.2-or-later
// Copyright © 2026-present facemgr Contributors

//! Local network interface enumeration
//!
//! Used to expand a wildcard listening endpoint into the concrete local
//! addresses it covers. Every call is a point-in-time snapshot.

use std::fmt;
use std::net::IpAddr;
use tracing::warn;

/// Source of local interface addresses
pub trait NetworkInterfaces: Send + Sync + fmt::Debug {
    /// Every address currently configured on a local interface
    fn addresses(&self) -> Vec<IpAddr>;
}

/// Enumerates the host's interfaces
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl NetworkInterfaces for SystemInterfaces {
    fn addresses(&self) -> Vec<IpAddr> {
        match get_if_addrs::get_if_addrs() {
            Ok(interfaces) => interfaces.iter().map(|iface| iface.ip()).collect(),
            Err(e) => {
                warn!(error = %e, "cannot enumerate network interfaces");
                Vec::new()
            }
        }
    }
}

/// A fixed list of addresses
#[derive(Debug, Default, Clone)]
pub struct StaticInterfaces {
    addresses: Vec<IpAddr>,
}

impl StaticInterfaces {
    pub fn new(addresses: Vec<IpAddr>) -> Self {
        Self { addresses }
    }
}

impl NetworkInterfaces for StaticInterfaces {
    fn addresses(&self) -> Vec<IpAddr> {
        self.addresses.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_interfaces() {
        let addrs: Vec<IpAddr> = vec!["127.0.0.1".parse().unwrap(), "::1".parse().unwrap()];
        let ifaces = StaticInterfaces::new(addrs.clone());
        assert_eq!(ifaces.addresses(), addrs);
    }

    #[test]
    fn test_system_interfaces_snapshot() {
        // Content depends on the host; enumeration itself must not panic.
        let _ = SystemInterfaces.addresses();
    }
}
