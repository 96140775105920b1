//! Host platform.
//!
//! A deterministic, in-memory stand-in for the native WiFi subsystem so the
//! compatibility layer can run and be tested without hardware. Time is
//! simulated: every [`EventLoop::poll`] advances the clock by one tick and
//! then delivers whatever resolver answers and timer expiries became due.
//!
//! The simulated connection manager clears the DNS server slots on every
//! connect, the same way the real one does, and optionally hands out a DHCP
//! DNS server in slot 0.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

use log::{debug, info};

use super::{
    AuthMode, ConnectRequest, DeadlineTimer, EventLoop, LookupStart, NameResolver,
    NativeStatus, PowerSaveMode, ProtocolSet, ScanRecord, StationAuth, TxPower, WifiDriver,
    DNS_MAX_SERVERS,
};
use crate::dns::{Completion, Expiry};
use crate::error::NativeError;
use crate::wifi::EnterpriseMethod;

/// Latency of the negative answer for names the host table does not know.
pub const DEFAULT_NXDOMAIN_LATENCY_MS: u64 = 50;

/// Native error code for a reconnect without stored configuration.
const ERR_NO_STORED_CONFIG: i32 = 0x300A;

/// Native error code for an invalid argument.
const ERR_INVALID_ARG: i32 = 0x102;

#[derive(Debug, Clone)]
enum Answer {
    Address(IpAddr),
    NotFound,
    Silent,
}

#[derive(Debug, Clone)]
struct HostEntry {
    answer: Answer,
    latency_ms: u64,
}

#[derive(Debug)]
struct PendingAnswer {
    name: String,
    /// `None` for names that never answer.
    due_ms: Option<u64>,
    answer: Option<IpAddr>,
    completion: Completion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoredAuth {
    Open,
    Passphrase(String),
    Enterprise(EnterpriseMethod),
}

#[derive(Debug, Clone)]
struct StoredStation {
    ssid: String,
    auth: StoredAuth,
    bssid: Option<[u8; 6]>,
}

#[derive(Debug, Clone)]
struct AccessPoint {
    record: ScanRecord,
    passphrase: Option<String>,
}

/// Simulated native WiFi subsystem.
#[derive(Debug)]
pub struct HostPlatform {
    now_ms: u64,
    tick_ms: u64,

    status: NativeStatus,
    station: Option<StoredStation>,
    access_points: Vec<AccessPoint>,
    scan_cache: Vec<ScanRecord>,
    hostname: Option<String>,
    dns: [Option<IpAddr>; DNS_MAX_SERVERS],
    dhcp_dns: Option<IpAddr>,
    dhcp_starts: usize,
    power_save: PowerSaveMode,
    tx_power: Option<TxPower>,
    protocols: ProtocolSet,
    begin_error: Option<NativeError>,

    hosts: HashMap<String, HostEntry>,
    cache: HashMap<String, IpAddr>,
    pending: Vec<PendingAnswer>,
    supports_cancel: bool,
    delivered: usize,
    discarded: usize,

    timer: Option<(u64, Expiry)>,
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl HostPlatform {
    /// Create a platform with a 1 ms tick and cancellable lookups.
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            tick_ms: 1,
            status: NativeStatus::Idle,
            station: None,
            access_points: Vec::new(),
            scan_cache: Vec::new(),
            hostname: None,
            dns: [None; DNS_MAX_SERVERS],
            dhcp_dns: None,
            dhcp_starts: 0,
            power_save: PowerSaveMode::default(),
            tx_power: None,
            protocols: ProtocolSet::from_bits(ProtocolSet::B | ProtocolSet::G | ProtocolSet::N),
            begin_error: None,
            hosts: HashMap::new(),
            cache: HashMap::new(),
            pending: Vec::new(),
            supports_cancel: true,
            delivered: 0,
            discarded: 0,
            timer: None,
        }
    }

    /// Advance the clock by `tick_ms` per poll.
    pub fn with_tick_ms(mut self, tick_ms: u64) -> Self {
        self.tick_ms = tick_ms.max(1);
        self
    }

    /// Model a resolver without cancellation support.
    pub fn without_cancellation(mut self) -> Self {
        self.supports_cancel = false;
        self
    }

    // ==================== Scenario setup ====================

    /// Register an access point. `passphrase` is ignored for open and
    /// enterprise networks.
    pub fn add_access_point(&mut self, record: ScanRecord, passphrase: Option<&str>) {
        self.access_points.push(AccessPoint {
            record,
            passphrase: passphrase.map(str::to_string),
        });
    }

    /// DNS server handed out by DHCP on connect.
    pub fn set_dhcp_dns(&mut self, server: IpAddr) {
        self.dhcp_dns = Some(server);
    }

    /// Make the next connect calls fail natively.
    pub fn fail_begin_with(&mut self, error: NativeError) {
        self.begin_error = Some(error);
    }

    /// Simulate the link dropping.
    pub fn drop_link(&mut self) {
        self.status = NativeStatus::ConnectionLost;
    }

    /// `name` resolves to `addr` after `latency_ms`.
    pub fn add_host(&mut self, name: &str, addr: IpAddr, latency_ms: u64) {
        self.hosts.insert(
            name.to_string(),
            HostEntry {
                answer: Answer::Address(addr),
                latency_ms,
            },
        );
    }

    /// `name` is answered negatively after `latency_ms`.
    pub fn add_unresolvable(&mut self, name: &str, latency_ms: u64) {
        self.hosts.insert(
            name.to_string(),
            HostEntry {
                answer: Answer::NotFound,
                latency_ms,
            },
        );
    }

    /// `name` never gets an answer.
    pub fn add_silent_host(&mut self, name: &str) {
        self.hosts.insert(
            name.to_string(),
            HostEntry {
                answer: Answer::Silent,
                latency_ms: 0,
            },
        );
    }

    /// Seed the resolver cache so lookups of `name` complete immediately.
    pub fn cache_host(&mut self, name: &str, addr: IpAddr) {
        self.cache.insert(name.to_string(), addr);
    }

    /// Clear every DNS server slot.
    pub fn clear_dns_servers(&mut self) {
        self.dns = [None; DNS_MAX_SERVERS];
    }

    /// Poll until the clock has advanced by at least `ms`.
    pub fn advance(&mut self, ms: u64) {
        let target = self.now_ms.saturating_add(ms);
        while self.now_ms < target {
            self.poll();
        }
    }

    // ==================== Observation ====================

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn power_save(&self) -> PowerSaveMode {
        self.power_save
    }

    pub fn tx_power(&self) -> Option<TxPower> {
        self.tx_power
    }

    pub fn dhcp_starts(&self) -> usize {
        self.dhcp_starts
    }

    /// SSID of the stored station configuration.
    pub fn stored_ssid(&self) -> Option<&str> {
        self.station.as_ref().map(|s| s.ssid.as_str())
    }

    /// EAP method of the stored station configuration, if enterprise.
    pub fn stored_enterprise_method(&self) -> Option<EnterpriseMethod> {
        match self.station.as_ref().map(|s| &s.auth) {
            Some(StoredAuth::Enterprise(method)) => Some(*method),
            _ => None,
        }
    }

    /// True while a deadline timer is armed.
    pub fn timer_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Lookups whose completion the resolver still holds.
    pub fn pending_lookups(&self) -> usize {
        self.pending.len()
    }

    /// Answers accepted by a pending request.
    pub fn delivered_answers(&self) -> usize {
        self.delivered
    }

    /// Answers that arrived after their request had settled.
    pub fn discarded_answers(&self) -> usize {
        self.discarded
    }

    fn join(&mut self) -> NativeStatus {
        let Some(station) = &self.station else {
            return NativeStatus::Idle;
        };

        let ap = self.access_points.iter().find(|ap| {
            ap.record.ssid == station.ssid
                && station.bssid.map_or(true, |b| b == ap.record.bssid)
        });
        let Some(ap) = ap else {
            return NativeStatus::NoApFound;
        };

        let accepted = match (ap.record.auth_mode(), &station.auth) {
            (Some(AuthMode::Open), StoredAuth::Open) => true,
            (Some(AuthMode::Wpa2Enterprise), StoredAuth::Enterprise(_)) => true,
            (Some(AuthMode::Open), _) | (Some(AuthMode::Wpa2Enterprise), _) => false,
            (_, StoredAuth::Passphrase(given)) => ap.passphrase.as_deref() == Some(given.as_str()),
            _ => false,
        };
        if !accepted {
            return NativeStatus::AuthFailed;
        }

        if let Some(server) = self.dhcp_dns {
            self.dns[0] = Some(server);
        }
        NativeStatus::Connected
    }

    fn deliver_due_answers(&mut self) {
        let now = self.now_ms;
        let mut due: Vec<PendingAnswer> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due_ms.map_or(false, |d| d <= now) {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|p| p.due_ms);

        for answer in due {
            if let Some(addr) = answer.answer {
                self.cache.insert(answer.name.clone(), addr);
            }
            if answer.completion.complete(answer.answer) {
                self.delivered += 1;
            } else {
                self.discarded += 1;
            }
        }
    }

    fn fire_due_timer(&mut self) {
        if self.timer.as_ref().map_or(false, |(due, _)| *due <= self.now_ms) {
            if let Some((_, expiry)) = self.timer.take() {
                expiry.fire();
            }
        }
    }
}

impl WifiDriver for HostPlatform {
    fn begin(&mut self, request: &ConnectRequest<'_>) -> Result<NativeStatus, NativeError> {
        if let Some(e) = &self.begin_error {
            return Err(e.clone());
        }

        let auth = match request.auth {
            StationAuth::Open => StoredAuth::Open,
            StationAuth::Passphrase(p) => StoredAuth::Passphrase(p.to_string()),
            StationAuth::Enterprise(credentials) => StoredAuth::Enterprise(credentials.method),
        };
        self.station = Some(StoredStation {
            ssid: request.ssid.to_string(),
            auth,
            bssid: request.bssid,
        });

        // The connection manager resets DNS on every (re)configuration
        self.clear_dns_servers();

        self.status = if request.connect {
            self.join()
        } else {
            NativeStatus::Disconnected
        };
        info!("Host station '{}': {:?}", request.ssid, self.status);
        Ok(self.status)
    }

    fn reconnect(&mut self) -> Result<NativeStatus, NativeError> {
        if let Some(e) = &self.begin_error {
            return Err(e.clone());
        }
        if self.station.is_none() {
            return Err(NativeError::new("reconnect", ERR_NO_STORED_CONFIG));
        }
        self.clear_dns_servers();
        self.status = self.join();
        Ok(self.status)
    }

    fn status(&self) -> NativeStatus {
        self.status
    }

    fn disconnect(&mut self) -> Result<(), NativeError> {
        self.status = NativeStatus::Disconnected;
        Ok(())
    }

    fn start_dhcp_client(&mut self) -> Result<(), NativeError> {
        self.dhcp_starts += 1;
        Ok(())
    }

    fn set_hostname(&mut self, hostname: &str) -> Result<(), NativeError> {
        if hostname.is_empty() {
            return Err(NativeError::new("set_hostname", ERR_INVALID_ARG));
        }
        self.hostname = Some(hostname.to_string());
        Ok(())
    }

    fn dns_server(&self, slot: usize) -> Option<IpAddr> {
        self.dns.get(slot).copied().flatten()
    }

    fn set_dns_server(&mut self, slot: usize, server: IpAddr) {
        if let Some(entry) = self.dns.get_mut(slot) {
            *entry = Some(server);
        }
    }

    fn set_power_save(&mut self, mode: PowerSaveMode) -> Result<(), NativeError> {
        self.power_save = mode;
        Ok(())
    }

    fn set_max_tx_power(&mut self, power: TxPower) -> Result<(), NativeError> {
        self.tx_power = Some(power);
        Ok(())
    }

    fn protocols(&self) -> Result<ProtocolSet, NativeError> {
        Ok(self.protocols)
    }

    fn set_protocols(&mut self, protocols: ProtocolSet) -> Result<(), NativeError> {
        if protocols.bits() == 0 {
            return Err(NativeError::new("set_protocols", ERR_INVALID_ARG));
        }
        self.protocols = protocols;
        Ok(())
    }

    fn scan_networks(&mut self) -> Result<usize, NativeError> {
        self.scan_cache = self.access_points.iter().map(|ap| ap.record.clone()).collect();
        if self.status != NativeStatus::Connected {
            self.status = NativeStatus::ScanDone;
        }
        Ok(self.scan_cache.len())
    }

    fn scan_result_count(&self) -> usize {
        self.scan_cache.len()
    }

    fn scan_result(&self, index: usize) -> Option<ScanRecord> {
        self.scan_cache.get(index).cloned()
    }
}

impl NameResolver for HostPlatform {
    fn start_lookup(
        &mut self,
        name: &str,
        completion: Completion,
    ) -> Result<LookupStart, NativeError> {
        if let Some(addr) = self.cache.get(name) {
            return Ok(LookupStart::Ready(*addr));
        }

        let entry = self.hosts.get(name).cloned().unwrap_or(HostEntry {
            answer: Answer::NotFound,
            latency_ms: DEFAULT_NXDOMAIN_LATENCY_MS,
        });
        let due_ms = self.now_ms.saturating_add(entry.latency_ms);
        let (due_ms, answer) = match entry.answer {
            Answer::Address(addr) => (Some(due_ms), Some(addr)),
            Answer::NotFound => (Some(due_ms), None),
            Answer::Silent => (None, None),
        };
        self.pending.push(PendingAnswer {
            name: name.to_string(),
            due_ms,
            answer,
            completion,
        });
        Ok(LookupStart::InProgress)
    }

    fn cancel_lookup(&mut self, name: &str) -> bool {
        if !self.supports_cancel {
            return false;
        }
        let before = self.pending.len();
        self.pending.retain(|p| p.name != name);
        debug!(
            "Host resolver cancelled {} lookup(s) for '{}'",
            before - self.pending.len(),
            name
        );
        true
    }
}

impl DeadlineTimer for HostPlatform {
    fn arm(&mut self, after: Duration, expiry: Expiry) -> Result<(), NativeError> {
        let after_ms = u64::try_from(after.as_millis()).unwrap_or(u64::MAX);
        self.timer = Some((self.now_ms.saturating_add(after_ms), expiry));
        Ok(())
    }

    fn cancel(&mut self) {
        self.timer = None;
    }
}

impl EventLoop for HostPlatform {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn poll(&mut self) {
        self.now_ms = self.now_ms.saturating_add(self.tick_ms);
        self.deliver_due_answers();
        self.fire_due_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ssid: &str, auth: AuthMode) -> ScanRecord {
        ScanRecord {
            ssid: ssid.to_string(),
            bssid: [0x24, 0x0a, 0xc4, 0x00, 0x00, 0x01],
            rssi: -55,
            channel: 6,
            auth_code: auth.code(),
        }
    }

    fn request<'a>(ssid: &'a str, auth: StationAuth<'a>) -> ConnectRequest<'a> {
        ConnectRequest {
            ssid,
            auth,
            channel: None,
            bssid: None,
            connect: true,
        }
    }

    #[test]
    fn test_connect_with_correct_passphrase() {
        let mut platform = HostPlatform::new();
        platform.add_access_point(record("HomeNet", AuthMode::Wpa2Psk), Some("password123"));
        let status = platform
            .begin(&request("HomeNet", StationAuth::Passphrase("password123")))
            .unwrap();
        assert_eq!(status, NativeStatus::Connected);
    }

    #[test]
    fn test_connect_with_wrong_passphrase() {
        let mut platform = HostPlatform::new();
        platform.add_access_point(record("HomeNet", AuthMode::Wpa2Psk), Some("password123"));
        let status = platform
            .begin(&request("HomeNet", StationAuth::Passphrase("wrongpass")))
            .unwrap();
        assert_eq!(status, NativeStatus::AuthFailed);
    }

    #[test]
    fn test_connect_unknown_ssid() {
        let mut platform = HostPlatform::new();
        let status = platform.begin(&request("Nowhere", StationAuth::Open)).unwrap();
        assert_eq!(status, NativeStatus::NoApFound);
    }

    #[test]
    fn test_connect_clears_dns_and_applies_dhcp() {
        let mut platform = HostPlatform::new();
        platform.add_access_point(record("Cafe", AuthMode::Open), None);
        platform.set_dhcp_dns("192.168.0.1".parse().unwrap());
        platform.set_dns_server(1, "1.1.1.1".parse().unwrap());

        platform.begin(&request("Cafe", StationAuth::Open)).unwrap();

        assert_eq!(platform.dns_server(0), Some("192.168.0.1".parse().unwrap()));
        assert_eq!(platform.dns_server(1), None);
    }

    #[test]
    fn test_reconnect_without_config_fails() {
        let mut platform = HostPlatform::new();
        assert!(platform.reconnect().is_err());
    }

    #[test]
    fn test_unknown_host_answers_negatively() {
        let mut platform = HostPlatform::new();
        let mut resolver = crate::dns::HostResolver::new();
        resolver
            .start(&mut platform, "unknown.example", Duration::from_secs(1))
            .unwrap();
        platform.advance(DEFAULT_NXDOMAIN_LATENCY_MS);
        assert_eq!(platform.delivered_answers(), 1);
        assert_eq!(
            resolver.poll(&mut platform),
            Some(Err(crate::error::CompatError::HostNotFound(
                "unknown.example".to_string()
            )))
        );
    }

    #[test]
    fn test_timer_fires_once() {
        let mut platform = HostPlatform::new();
        platform.add_silent_host("quiet.example");
        let mut resolver = crate::dns::HostResolver::new();
        resolver
            .start(&mut platform, "quiet.example", Duration::from_millis(10))
            .unwrap();
        assert!(platform.timer_armed());
        platform.advance(10);
        assert!(!platform.timer_armed());
    }

    #[test]
    fn test_huge_latency_saturates() {
        let mut platform = HostPlatform::new();
        platform.advance(5);
        platform.add_host("far.example", "10.0.0.9".parse().unwrap(), u64::MAX);
        let mut resolver = crate::dns::HostResolver::new();
        resolver
            .start(&mut platform, "far.example", Duration::from_millis(10))
            .unwrap();
        platform.advance(10);
        assert_eq!(
            resolver.poll(&mut platform),
            Some(Err(crate::error::CompatError::Timeout))
        );
        assert_eq!(platform.delivered_answers(), 0);
    }

    #[test]
    fn test_tick_is_at_least_one() {
        let mut platform = HostPlatform::new().with_tick_ms(0);
        platform.poll();
        assert_eq!(platform.now_ms(), 1);
    }
}
