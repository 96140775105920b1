//! DNS server snapshot.
//!
//! The native connection manager clears the DNS server slots when the
//! station (re)connects. Legacy code configures DNS once and expects it to
//! survive reconnects, so the compatibility object snapshots the slots
//! before a reconnect-triggering call and writes them back afterwards.
//!
//! # Example
//!
//! ```
//! use esp8266_wifi_compat::dns::DnsSnapshot;
//! use esp8266_wifi_compat::native::{HostPlatform, WifiDriver};
//!
//! let mut platform = HostPlatform::new();
//! platform.set_dns_server(0, "1.1.1.1".parse().unwrap());
//!
//! let mut snapshot = DnsSnapshot::new();
//! snapshot.save(&platform);
//! platform.clear_dns_servers();
//! snapshot.restore(&mut platform);
//!
//! assert_eq!(platform.dns_server(0), Some("1.1.1.1".parse().unwrap()));
//! ```

use std::net::IpAddr;

use log::debug;

use crate::native::{WifiDriver, DNS_MAX_SERVERS};

/// Point-in-time copy of the native DNS server slots.
///
/// Slot order is resolution order (primary first). Empty slots are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsSnapshot {
    servers: [Option<IpAddr>; DNS_MAX_SERVERS],
}

impl DnsSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every native DNS slot, overwriting the previous snapshot.
    pub fn save<D: WifiDriver + ?Sized>(&mut self, driver: &D) {
        for (slot, server) in self.servers.iter_mut().enumerate() {
            *server = driver.dns_server(slot);
        }
        debug!("DNS snapshot saved: {:?}", self.servers);
    }

    /// Write the saved servers back into the native slots.
    ///
    /// Slots that were empty at save time are left untouched, so servers the
    /// native side learned since (e.g. from DHCP) survive. Returns the number
    /// of slots written.
    pub fn restore<D: WifiDriver + ?Sized>(&self, driver: &mut D) -> usize {
        let mut written = 0;
        for (slot, server) in self.servers.iter().enumerate() {
            if let Some(server) = server {
                driver.set_dns_server(slot, *server);
                written += 1;
            }
        }
        debug!("DNS snapshot restored ({} slots)", written);
        written
    }

    /// Drop saved slots that still hold what the connection manager handed
    /// out last time, so the next connection's own answer is not overwritten.
    ///
    /// Returns the number of slots dropped.
    pub fn forget_learned(&mut self, learned: &DnsSnapshot) -> usize {
        let mut dropped = 0;
        for (server, learned) in self.servers.iter_mut().zip(learned.servers.iter()) {
            if server.is_some() && server == learned {
                *server = None;
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!("Dropped {} connection-learned DNS slot(s)", dropped);
        }
        dropped
    }

    /// Saved server for `slot`.
    pub fn server(&self, slot: usize) -> Option<IpAddr> {
        self.servers.get(slot).copied().flatten()
    }

    /// All saved slots in resolution order.
    pub fn servers(&self) -> &[Option<IpAddr>] {
        &self.servers
    }

    /// True if no slot holds a server.
    pub fn is_empty(&self) -> bool {
        self.servers.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::HostPlatform;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn native_servers(platform: &HostPlatform) -> Vec<Option<IpAddr>> {
        (0..DNS_MAX_SERVERS).map(|i| platform.dns_server(i)).collect()
    }

    #[test]
    fn test_new_snapshot_is_empty() {
        let snapshot = DnsSnapshot::new();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.servers().len(), DNS_MAX_SERVERS);
    }

    #[test]
    fn test_save_records_every_slot() {
        let mut platform = HostPlatform::new();
        platform.set_dns_server(0, ip("8.8.8.8"));
        platform.set_dns_server(2, ip("2001:4860:4860::8888"));

        let mut snapshot = DnsSnapshot::new();
        snapshot.save(&platform);

        assert_eq!(snapshot.server(0), Some(ip("8.8.8.8")));
        assert_eq!(snapshot.server(1), None);
        assert_eq!(snapshot.server(2), Some(ip("2001:4860:4860::8888")));
        assert_eq!(snapshot.server(DNS_MAX_SERVERS), None);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let mut platform = HostPlatform::new();
        platform.set_dns_server(0, ip("8.8.8.8"));
        platform.set_dns_server(1, ip("8.8.4.4"));

        let mut snapshot = DnsSnapshot::new();
        snapshot.save(&platform);

        platform.clear_dns_servers();
        platform.set_dns_server(0, ip("9.9.9.9"));
        snapshot.save(&platform);

        assert_eq!(snapshot.server(0), Some(ip("9.9.9.9")));
        assert_eq!(snapshot.server(1), None);
    }

    #[test]
    fn test_save_then_restore_is_identity() {
        let mut platform = HostPlatform::new();
        platform.set_dns_server(0, ip("1.1.1.1"));
        platform.set_dns_server(1, ip("1.0.0.1"));
        let before = native_servers(&platform);

        let mut snapshot = DnsSnapshot::new();
        snapshot.save(&platform);
        snapshot.restore(&mut platform);

        assert_eq!(native_servers(&platform), before);
    }

    #[test]
    fn test_restore_after_native_clear() {
        let mut platform = HostPlatform::new();
        platform.set_dns_server(0, ip("1.1.1.1"));
        platform.set_dns_server(1, ip("1.0.0.1"));

        let mut snapshot = DnsSnapshot::new();
        snapshot.save(&platform);
        platform.clear_dns_servers();

        assert_eq!(snapshot.restore(&mut platform), 2);
        assert_eq!(platform.dns_server(0), Some(ip("1.1.1.1")));
        assert_eq!(platform.dns_server(1), Some(ip("1.0.0.1")));
    }

    #[test]
    fn test_restore_is_idempotent() {
        let mut platform = HostPlatform::new();
        platform.set_dns_server(0, ip("1.1.1.1"));

        let mut snapshot = DnsSnapshot::new();
        snapshot.save(&platform);
        platform.clear_dns_servers();

        snapshot.restore(&mut platform);
        let first = native_servers(&platform);
        snapshot.restore(&mut platform);
        assert_eq!(native_servers(&platform), first);
    }

    #[test]
    fn test_restore_keeps_servers_in_empty_slots() {
        let mut platform = HostPlatform::new();
        platform.set_dns_server(0, ip("1.1.1.1"));

        let mut snapshot = DnsSnapshot::new();
        snapshot.save(&platform);

        // Native side learns a secondary server after the snapshot
        platform.set_dns_server(1, ip("192.168.1.1"));
        snapshot.restore(&mut platform);

        assert_eq!(platform.dns_server(0), Some(ip("1.1.1.1")));
        assert_eq!(platform.dns_server(1), Some(ip("192.168.1.1")));
    }

    #[test]
    fn test_forget_learned_keeps_configured_slots() {
        let mut platform = HostPlatform::new();
        platform.set_dns_server(0, ip("192.168.1.1"));
        let mut learned = DnsSnapshot::new();
        learned.save(&platform);

        platform.set_dns_server(1, ip("1.1.1.1"));
        let mut snapshot = DnsSnapshot::new();
        snapshot.save(&platform);

        assert_eq!(snapshot.forget_learned(&learned), 1);
        assert_eq!(snapshot.server(0), None);
        assert_eq!(snapshot.server(1), Some(ip("1.1.1.1")));
        assert_eq!(snapshot.forget_learned(&learned), 0);
    }

    #[test]
    fn test_forget_learned_ignores_overridden_slot() {
        let mut platform = HostPlatform::new();
        platform.set_dns_server(0, ip("192.168.1.1"));
        let mut learned = DnsSnapshot::new();
        learned.save(&platform);

        platform.set_dns_server(0, ip("8.8.8.8"));
        let mut snapshot = DnsSnapshot::new();
        snapshot.save(&platform);

        assert_eq!(snapshot.forget_learned(&learned), 0);
        assert_eq!(snapshot.server(0), Some(ip("8.8.8.8")));
    }

    #[test]
    fn test_restore_empty_snapshot_writes_nothing() {
        let mut platform = HostPlatform::new();
        platform.set_dns_server(0, ip("1.1.1.1"));
        let snapshot = DnsSnapshot::new();
        assert_eq!(snapshot.restore(&mut platform), 0);
        assert_eq!(platform.dns_server(0), Some(ip("1.1.1.1")));
    }
}
