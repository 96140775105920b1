//! Legacy-shaped WiFi object.
//!
//! [`WiFi32`] re-exposes the legacy entry points on top of any [`NativeWifi`]
//! implementation. Most calls forward directly; enumerations go through the
//! mappers in [`crate::enums`], connection calls are bracketed by a DNS
//! snapshot, and hostname lookups go through the bounded-wait resolver.

use std::net::IpAddr;
use std::time::Duration;

use log::{debug, error, info, warn};

use super::credentials::{ConnectParams, EnterpriseCredentials, StationCredentials};
use crate::config::CompatConfig;
use crate::dns::{DnsSnapshot, HostResolver, LookupPhase};
use crate::enums::{legacy_encryption_code, tx_power_from_dbm, PhyMode, SleepMode, WlStatus};
use crate::error::{CompatError, NativeError};
use crate::native::{ConnectRequest, NativeStatus, NativeWifi, StationAuth};

/// One entry of the last scan, in legacy terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub ssid: String,
    /// Legacy `ENC_TYPE_*` code, or the native code for kinds without one.
    pub enc_type: u8,
    pub rssi: i32,
    pub bssid: [u8; 6],
    pub channel: i32,
    /// Always `false`; the native scan cache does not flag hidden networks.
    pub hidden: bool,
}

/// WiFi compatibility object.
pub struct WiFi32<N: NativeWifi> {
    native: N,
    config: CompatConfig,
    dns: DnsSnapshot,
    /// Servers the last bracketed connect produced before the restore.
    learned_dns: DnsSnapshot,
    resolver: HostResolver,
}

impl<N: NativeWifi> WiFi32<N> {
    /// Wrap `native` with the default configuration.
    pub fn new(native: N) -> Self {
        Self {
            native,
            config: CompatConfig::default(),
            dns: DnsSnapshot::new(),
            learned_dns: DnsSnapshot::new(),
            resolver: HostResolver::new(),
        }
    }

    /// Wrap `native` with a validated configuration.
    pub fn with_config(native: N, config: CompatConfig) -> Result<Self, CompatError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(native)
        })
    }

    pub fn config(&self) -> &CompatConfig {
        &self.config
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    pub fn native_mut(&mut self) -> &mut N {
        &mut self.native
    }

    // ==================== Connection ====================

    /// Connect to a personal or open network.
    ///
    /// `None` or an empty passphrase selects an open network. Rejected
    /// credentials and native failures are reported as
    /// [`WlStatus::ConnectFailed`].
    pub fn begin(
        &mut self,
        ssid: &str,
        passphrase: Option<&str>,
        params: ConnectParams,
    ) -> WlStatus {
        let credentials = match StationCredentials::new(ssid, passphrase.unwrap_or_default()) {
            Ok(c) => c,
            Err(e) => {
                error!("Rejected credentials for '{}': {}", ssid, e);
                return WlStatus::ConnectFailed;
            }
        };

        info!(
            "Connecting to '{}' ({})",
            ssid,
            if credentials.is_open() { "open" } else { "WPA" }
        );
        let request = ConnectRequest {
            ssid,
            auth: credentials.auth(),
            channel: params.native_channel(),
            bssid: params.bssid,
            connect: params.connect,
        };
        self.connect_with(|native| native.begin(&request))
    }

    /// Connect to a WPA2-Enterprise network.
    pub fn begin_enterprise(
        &mut self,
        ssid: &str,
        credentials: &EnterpriseCredentials,
        params: ConnectParams,
    ) -> WlStatus {
        let checked = super::credentials::validate_ssid(ssid).and_then(|_| credentials.validate());
        if let Err(e) = checked {
            error!("Rejected enterprise credentials for '{}': {}", ssid, e);
            return WlStatus::ConnectFailed;
        }

        info!(
            "Connecting to '{}' (enterprise, {:?})",
            ssid, credentials.method
        );
        let request = ConnectRequest {
            ssid,
            auth: StationAuth::Enterprise(credentials),
            channel: params.native_channel(),
            bssid: params.bssid,
            connect: params.connect,
        };
        self.connect_with(|native| native.begin(&request))
    }

    /// Reconnect with the stored station configuration.
    pub fn begin_stored(&mut self) -> WlStatus {
        info!("Reconnecting with stored configuration");
        self.connect_with(|native| native.reconnect())
    }

    fn connect_with<F>(&mut self, connect: F) -> WlStatus
    where
        F: FnOnce(&mut N) -> Result<NativeStatus, NativeError>,
    {
        if self.config.abandon_lookup_on_begin && self.resolver.abandon(&mut self.native) {
            info!("Pending hostname lookup abandoned by connect");
        }

        // Servers the previous connection learned belong to that network;
        // only configured ones are carried across
        let preserve = self.config.preserve_dns_on_begin;
        if preserve {
            self.save_dns();
            self.dns.forget_learned(&self.learned_dns);
        }
        let result = connect(&mut self.native);
        if preserve {
            self.learned_dns.save(&self.native);
            self.restore_dns();
        }

        match result {
            Ok(native) => {
                let status = WlStatus::from(native);
                info!("Connect result: {} ({:?})", status, native);
                status
            }
            Err(e) => {
                warn!("Connect failed: {}", e);
                WlStatus::ConnectFailed
            }
        }
    }

    /// Current connection status.
    pub fn status(&self) -> WlStatus {
        WlStatus::from(self.native.status())
    }

    /// Drop the current association (`wifi_station_disconnect`).
    pub fn station_disconnect(&mut self) -> Result<(), CompatError> {
        info!("Disconnecting station");
        self.native.disconnect()?;
        Ok(())
    }

    /// Restart the station DHCP client (`wifi_station_dhcpc_start`).
    pub fn station_dhcpc_start(&mut self) -> Result<(), CompatError> {
        self.native.start_dhcp_client()?;
        Ok(())
    }

    // ==================== Radio ====================

    pub fn hostname(&mut self, name: &str) -> Result<(), CompatError> {
        self.native.set_hostname(name)?;
        debug!("Hostname set to '{}'", name);
        Ok(())
    }

    /// Set the radio sleep mode from a legacy `WIFI_*_SLEEP` value.
    pub fn set_sleep_mode(&mut self, mode: i32) -> Result<(), CompatError> {
        let mode = SleepMode::try_from(mode)?;
        self.native.set_power_save(mode.to_native())?;
        debug!("Sleep mode {:?} -> {:?}", mode, mode.to_native());
        Ok(())
    }

    pub fn get_phy_mode(&self) -> Result<PhyMode, CompatError> {
        let protocols = self.native.protocols()?;
        PhyMode::from_native(protocols)
    }

    pub fn set_phy_mode(&mut self, mode: PhyMode) -> Result<(), CompatError> {
        self.native.set_protocols(mode.to_native())?;
        debug!("PHY mode {:?} -> {:?}", mode, mode.to_native());
        Ok(())
    }

    /// Set transmit power in whole dBm, snapped down to a native step.
    pub fn set_output_power(&mut self, dbm: i32) -> Result<(), CompatError> {
        let power = tx_power_from_dbm(dbm);
        self.native.set_max_tx_power(power)?;
        debug!("Output power {} dBm -> {} quarter-dBm", dbm, power.quarter_dbm());
        Ok(())
    }

    /// No native WPS state to tear down.
    pub fn wps_disable(&mut self) {
        debug!("wps_disable: no-op");
    }

    /// No native forced-sleep equivalent; use [`set_sleep_mode`](Self::set_sleep_mode).
    pub fn force_sleep_begin(&mut self) {
        debug!("force_sleep_begin: no-op");
    }

    pub fn force_sleep_wake(&mut self) {
        debug!("force_sleep_wake: no-op");
    }

    // ==================== Scanning ====================

    /// Run a scan and return the number of networks found.
    pub fn scan_networks(&mut self) -> Result<usize, CompatError> {
        let count = self.native.scan_networks()?;
        info!("Scan found {} network(s)", count);
        Ok(count)
    }

    /// Entry `index` of the last scan, `None` if out of range.
    pub fn get_network_info(&self, index: u8) -> Option<NetworkInfo> {
        let index = usize::from(index);
        if index >= self.native.scan_result_count() {
            return None;
        }
        let record = self.native.scan_result(index)?;
        Some(NetworkInfo {
            enc_type: legacy_encryption_code(record.auth_code),
            rssi: record.rssi,
            bssid: record.bssid,
            channel: i32::from(record.channel),
            hidden: false,
            ssid: record.ssid,
        })
    }

    // ==================== Hostname resolution ====================

    /// Resolve `name`, waiting at most `timeout_ms`.
    ///
    /// `out` is written only on success.
    pub fn host_by_name(
        &mut self,
        name: &str,
        out: &mut IpAddr,
        timeout_ms: u32,
    ) -> Result<(), CompatError> {
        let timeout = Duration::from_millis(u64::from(timeout_ms));
        self.lookup(name, out, timeout)
    }

    /// Resolve `name` with the configured default timeout.
    pub fn host_by_name_default(
        &mut self,
        name: &str,
        out: &mut IpAddr,
    ) -> Result<(), CompatError> {
        let timeout = self.config.dns_timeout;
        self.lookup(name, out, timeout)
    }

    fn lookup(
        &mut self,
        name: &str,
        out: &mut IpAddr,
        timeout: Duration,
    ) -> Result<(), CompatError> {
        let result = self.resolver.host_by_name(&mut self.native, name, out, timeout);
        match &result {
            Ok(()) => debug!("Resolved '{}' to {}", name, out),
            Err(e) => warn!("Lookup of '{}' failed: {}", name, e),
        }
        result
    }

    /// Start a lookup without waiting.
    ///
    /// `Ok(Some(addr))` when the answer is immediate, `Ok(None)` when the
    /// lookup is pending; collect it with [`poll_host_lookup`](Self::poll_host_lookup).
    pub fn start_host_lookup(
        &mut self,
        name: &str,
        timeout_ms: u32,
    ) -> Result<Option<IpAddr>, CompatError> {
        let timeout = Duration::from_millis(u64::from(timeout_ms));
        self.resolver.start(&mut self.native, name, timeout)
    }

    /// Yield once to the native dispatcher and check the pending lookup.
    pub fn poll_host_lookup(&mut self) -> Option<Result<IpAddr, CompatError>> {
        if let Some(outcome) = self.resolver.poll(&mut self.native) {
            return Some(outcome);
        }
        self.native.poll();
        self.resolver.poll(&mut self.native)
    }

    pub fn lookup_phase(&self) -> LookupPhase {
        self.resolver.phase()
    }

    // ==================== DNS servers ====================

    /// Snapshot the native DNS server slots.
    pub fn save_dns(&mut self) {
        self.dns.save(&self.native);
        debug!("Saved DNS servers: {:?}", self.dns.servers());
    }

    /// Write the snapshot back. Returns the number of slots written.
    pub fn restore_dns(&mut self) -> usize {
        let written = self.dns.restore(&mut self.native);
        debug!("Restored {} DNS server(s)", written);
        written
    }

    pub fn dns_snapshot(&self) -> &DnsSnapshot {
        &self.dns
    }
}
