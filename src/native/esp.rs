//! ESP-IDF platform.
//!
//! Connection management goes through `esp-idf-svc`'s blocking WiFi wrapper.
//! DNS server slots, the resolver, power management and the protocol bitmap
//! are only reachable through `esp-idf-sys`.

use std::ffi::{c_char, c_void, CStr, CString};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::{Duration, Instant};

use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::handle::RawHandle;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use esp_idf_sys::{self as sys, esp, EspError};
use log::{debug, info, warn};
use zeroize::Zeroizing;

use super::{
    ConnectRequest, DeadlineTimer, EventLoop, LookupStart, NameResolver, NativeStatus,
    PowerSaveMode, ProtocolSet, ScanRecord, StationAuth, TxPower, WifiDriver, DNS_MAX_SERVERS,
};
use crate::dns::{Completion, Expiry};
use crate::error::NativeError;
use crate::wifi::{EnterpriseCredentials, EnterpriseMethod};

/// lwIP `ERR_OK`.
const LWIP_ERR_OK: i8 = 0;
/// lwIP `ERR_INPROGRESS`.
const LWIP_ERR_INPROGRESS: i8 = -5;

/// Certificate material handed to the EAP client, which keeps raw pointers.
#[derive(Default)]
struct EapBuffers {
    ca_pem: Option<Zeroizing<Vec<u8>>>,
    client_cert: Option<Zeroizing<Vec<u8>>>,
    client_key: Option<Zeroizing<Vec<u8>>>,
}

/// ESP-IDF implementation of the native boundary.
pub struct EspPlatform {
    wifi: BlockingWifi<EspWifi<'static>>,
    timers: EspTaskTimerService,
    timer: Option<EspTimer<'static>>,
    scan_cache: Vec<ScanRecord>,
    status: NativeStatus,
    eap: EapBuffers,
    started: Instant,
}

impl EspPlatform {
    /// Take the modem and bring up the station driver.
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, EspError> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)?;
        let wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        Ok(Self {
            wifi,
            timers: EspTaskTimerService::new()?,
            timer: None,
            scan_cache: Vec::new(),
            status: NativeStatus::Stopped,
            eap: EapBuffers::default(),
            started: Instant::now(),
        })
    }

    fn ensure_started(&mut self) -> Result<(), NativeError> {
        let started = self
            .wifi
            .is_started()
            .map_err(|e| NativeError::esp("esp_wifi_start", e))?;
        if !started {
            self.wifi
                .start()
                .map_err(|e| NativeError::esp("esp_wifi_start", e))?;
            info!("WiFi driver started");
        }
        Ok(())
    }

    fn configure_enterprise(
        &mut self,
        credentials: &EnterpriseCredentials,
    ) -> Result<(), NativeError> {
        fn set_text(
            operation: &'static str,
            value: Option<&str>,
            setter: unsafe extern "C" fn(*const u8, i32) -> sys::esp_err_t,
        ) -> Result<(), NativeError> {
            let Some(value) = value else {
                return Ok(());
            };
            let len = i32::try_from(value.len())
                .map_err(|_| NativeError::new(operation, sys::ESP_ERR_INVALID_SIZE as i32))?;
            esp!(unsafe { setter(value.as_ptr(), len) }).map_err(|e| NativeError::esp(operation, e))
        }

        set_text(
            "esp_eap_client_set_identity",
            credentials.identity.as_deref(),
            sys::esp_eap_client_set_identity,
        )?;
        set_text(
            "esp_eap_client_set_username",
            credentials.username.as_deref(),
            sys::esp_eap_client_set_username,
        )?;
        set_text(
            "esp_eap_client_set_password",
            credentials.password.as_deref(),
            sys::esp_eap_client_set_password,
        )?;

        // PEM parsing needs the terminating NUL counted in the length
        self.eap.ca_pem = credentials.ca_pem.as_deref().map(pem_buffer);
        self.eap.client_cert = credentials.client_cert.as_deref().map(pem_buffer);
        self.eap.client_key = credentials.client_key.as_deref().map(pem_buffer);

        if let Some(ca) = &self.eap.ca_pem {
            esp!(unsafe { sys::esp_eap_client_set_ca_cert(ca.as_ptr(), ca.len() as i32) })
                .map_err(|e| NativeError::esp("esp_eap_client_set_ca_cert", e))?;
        }
        if let (Some(cert), Some(key)) = (&self.eap.client_cert, &self.eap.client_key) {
            esp!(unsafe {
                sys::esp_eap_client_set_certificate_and_key(
                    cert.as_ptr(),
                    cert.len() as i32,
                    key.as_ptr(),
                    key.len() as i32,
                    std::ptr::null(),
                    0,
                )
            })
            .map_err(|e| NativeError::esp("esp_eap_client_set_certificate_and_key", e))?;
        }

        // TLS and PEAP are negotiated from the material above; TTLS needs
        // its inner method named
        if credentials.method == EnterpriseMethod::Ttls {
            esp!(unsafe {
                sys::esp_eap_client_set_ttls_phase2_method(
                    sys::esp_eap_ttls_phase2_types_ESP_EAP_TTLS_PHASE2_MSCHAPV2,
                )
            })
            .map_err(|e| NativeError::esp("esp_eap_client_set_ttls_phase2_method", e))?;
        }
        debug!("EAP client configured for {:?}", credentials.method);

        esp!(unsafe { sys::esp_wifi_sta_enterprise_enable() })
            .map_err(|e| NativeError::esp("esp_wifi_sta_enterprise_enable", e))
    }

    fn join(&mut self, ssid: &str) -> NativeStatus {
        if let Err(e) = self.wifi.connect() {
            warn!("esp_wifi_connect failed: {:?}", e);
            let seen = self.scan_cache.iter().any(|ap| ap.ssid == ssid);
            return if self.scan_cache.is_empty() || seen {
                NativeStatus::AuthFailed
            } else {
                NativeStatus::NoApFound
            };
        }
        match self.wifi.wait_netif_up() {
            Ok(()) => NativeStatus::Connected,
            Err(e) => {
                warn!("DHCP did not complete: {:?}", e);
                NativeStatus::Connecting
            }
        }
    }

    fn sta_handle(&self) -> *mut sys::esp_netif_t {
        self.wifi.wifi().sta_netif().handle()
    }
}

fn pem_buffer(pem: &str) -> Zeroizing<Vec<u8>> {
    let mut buffer = Vec::with_capacity(pem.len() + 1);
    buffer.extend_from_slice(pem.as_bytes());
    buffer.push(0);
    Zeroizing::new(buffer)
}

fn auth_method(auth: &StationAuth<'_>) -> AuthMethod {
    match auth {
        StationAuth::Open => AuthMethod::None,
        StationAuth::Passphrase(_) => AuthMethod::WPA2Personal,
        StationAuth::Enterprise(_) => AuthMethod::WPA2Enterprise,
    }
}

/// Scan cache entry with the raw `authmode`, which `esp-idf-svc` folds to
/// `None` for modes it has no name for.
fn scan_record(ap: &sys::wifi_ap_record_t) -> ScanRecord {
    let ssid = CStr::from_bytes_until_nul(&ap.ssid)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(&ap.ssid).into_owned());
    ScanRecord {
        ssid,
        bssid: ap.bssid,
        rssi: i32::from(ap.rssi),
        channel: ap.primary,
        // Out-of-range codes stay unnamed rather than aliasing a real mode
        auth_code: u8::try_from(ap.authmode).unwrap_or(u8::MAX),
    }
}

fn ip_from_netif(addr: &sys::esp_ip_addr_t) -> Option<IpAddr> {
    let ip = if u32::from(addr.type_) == sys::ESP_IPADDR_TYPE_V6 {
        let words = unsafe { addr.u_addr.ip6.addr };
        IpAddr::V6(ipv6_from_words(words))
    } else {
        let raw = unsafe { addr.u_addr.ip4.addr };
        IpAddr::V4(Ipv4Addr::from(raw.to_ne_bytes()))
    };
    (!ip.is_unspecified()).then_some(ip)
}

fn ip_to_netif(ip: IpAddr) -> sys::esp_ip_addr_t {
    let mut addr = sys::esp_ip_addr_t::default();
    match ip {
        IpAddr::V4(v4) => {
            addr.type_ = sys::ESP_IPADDR_TYPE_V4 as u8;
            addr.u_addr.ip4.addr = u32::from_ne_bytes(v4.octets());
        }
        IpAddr::V6(v6) => {
            addr.type_ = sys::ESP_IPADDR_TYPE_V6 as u8;
            addr.u_addr.ip6.addr = ipv6_to_words(v6);
        }
    }
    addr
}

fn ip_from_lwip(addr: &sys::ip_addr_t) -> Option<IpAddr> {
    let ip = if u32::from(addr.type_) == sys::lwip_ip_addr_type_IPADDR_TYPE_V6 {
        let words = unsafe { addr.u_addr.ip6.addr };
        IpAddr::V6(ipv6_from_words(words))
    } else {
        let raw = unsafe { addr.u_addr.ip4.addr };
        IpAddr::V4(Ipv4Addr::from(raw.to_ne_bytes()))
    };
    (!ip.is_unspecified()).then_some(ip)
}

fn ipv6_from_words(words: [u32; 4]) -> Ipv6Addr {
    let mut octets = [0u8; 16];
    for (chunk, word) in octets.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_ne_bytes());
    }
    Ipv6Addr::from(octets)
}

fn ipv6_to_words(ip: Ipv6Addr) -> [u32; 4] {
    let octets = ip.octets();
    let mut words = [0u32; 4];
    for (word, chunk) in words.iter_mut().zip(octets.chunks_exact(4)) {
        *word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    words
}

/// Lookup handed to the tcpip thread.
struct DnsRequest {
    name: CString,
    completion: Completion,
}

/// Runs on the tcpip thread; reclaims the boxed request.
unsafe extern "C" fn dns_request(ctx: *mut c_void) {
    if ctx.is_null() {
        return;
    }
    let DnsRequest { name, completion } = *Box::from_raw(ctx as *mut DnsRequest);
    let mut addr = sys::ip_addr_t::default();
    let arg = Box::into_raw(Box::new(completion)) as *mut c_void;

    match sys::dns_gethostbyname(name.as_ptr(), &mut addr, Some(dns_found), arg) {
        LWIP_ERR_INPROGRESS => {}
        LWIP_ERR_OK => {
            // Answered from the lwIP cache, the callback will not run
            let completion = Box::from_raw(arg as *mut Completion);
            completion.complete(ip_from_lwip(&addr));
        }
        other => {
            warn!(
                "dns_gethostbyname('{}') failed: {}",
                name.to_string_lossy(),
                other
            );
            let completion = Box::from_raw(arg as *mut Completion);
            completion.complete(None);
        }
    }
}

/// lwIP `dns_found_callback`; reclaims the boxed completion.
unsafe extern "C" fn dns_found(
    name: *const c_char,
    ipaddr: *const sys::ip_addr_t,
    callback_arg: *mut c_void,
) {
    if callback_arg.is_null() {
        return;
    }
    let completion = Box::from_raw(callback_arg as *mut Completion);
    let answer = ipaddr.as_ref().and_then(ip_from_lwip);
    if !name.is_null() {
        debug!(
            "lwIP answer for '{}': {:?}",
            CStr::from_ptr(name).to_string_lossy(),
            answer
        );
    }
    completion.complete(answer);
}

impl WifiDriver for EspPlatform {
    fn begin(&mut self, request: &ConnectRequest<'_>) -> Result<NativeStatus, NativeError> {
        let password = match request.auth {
            StationAuth::Passphrase(p) => p,
            _ => "",
        };
        let invalid = |code: u32| NativeError::new("esp_wifi_set_config", code as i32);
        let config = Configuration::Client(ClientConfiguration {
            ssid: request
                .ssid
                .try_into()
                .map_err(|_| invalid(sys::ESP_ERR_WIFI_SSID))?,
            password: password
                .try_into()
                .map_err(|_| invalid(sys::ESP_ERR_WIFI_PASSWORD))?,
            auth_method: auth_method(&request.auth),
            bssid: request.bssid,
            channel: request.channel,
            ..Default::default()
        });

        if self.wifi.is_connected().unwrap_or(false) {
            self.wifi
                .disconnect()
                .map_err(|e| NativeError::esp("esp_wifi_disconnect", e))?;
        }
        self.wifi
            .set_configuration(&config)
            .map_err(|e| NativeError::esp("esp_wifi_set_config", e))?;

        match request.auth {
            StationAuth::Enterprise(credentials) => self.configure_enterprise(credentials)?,
            _ => {
                esp!(unsafe { sys::esp_wifi_sta_enterprise_disable() })
                    .map_err(|e| NativeError::esp("esp_wifi_sta_enterprise_disable", e))?;
            }
        }

        self.ensure_started()?;
        self.status = if request.connect {
            self.join(request.ssid)
        } else {
            NativeStatus::Disconnected
        };
        info!("Station '{}': {:?}", request.ssid, self.status);
        Ok(self.status)
    }

    fn reconnect(&mut self) -> Result<NativeStatus, NativeError> {
        let ssid = match self
            .wifi
            .get_configuration()
            .map_err(|e| NativeError::esp("esp_wifi_get_config", e))?
        {
            Configuration::Client(client) | Configuration::Mixed(client, _) => client.ssid,
            _ => Default::default(),
        };
        if ssid.is_empty() {
            return Err(NativeError::new("esp_wifi_connect", sys::ESP_ERR_WIFI_SSID as i32));
        }

        self.ensure_started()?;
        if self.wifi.is_connected().unwrap_or(false) {
            self.wifi
                .disconnect()
                .map_err(|e| NativeError::esp("esp_wifi_disconnect", e))?;
        }
        self.status = self.join(ssid.as_str());
        Ok(self.status)
    }

    fn status(&self) -> NativeStatus {
        if !self.wifi.is_started().unwrap_or(false) {
            return NativeStatus::Stopped;
        }
        let connected = self.wifi.is_connected().unwrap_or(false);
        match (self.status, connected) {
            (NativeStatus::Connected, false) => NativeStatus::ConnectionLost,
            (NativeStatus::Connecting, true) => NativeStatus::Connected,
            (status, _) => status,
        }
    }

    fn disconnect(&mut self) -> Result<(), NativeError> {
        self.wifi
            .disconnect()
            .map_err(|e| NativeError::esp("esp_wifi_disconnect", e))?;
        self.status = NativeStatus::Disconnected;
        Ok(())
    }

    fn start_dhcp_client(&mut self) -> Result<(), NativeError> {
        let err = unsafe { sys::esp_netif_dhcpc_start(self.sta_handle()) };
        if err == sys::ESP_ERR_ESP_NETIF_DHCP_ALREADY_STARTED as sys::esp_err_t {
            return Ok(());
        }
        esp!(err).map_err(|e| NativeError::esp("esp_netif_dhcpc_start", e))
    }

    fn set_hostname(&mut self, hostname: &str) -> Result<(), NativeError> {
        self.wifi
            .wifi_mut()
            .sta_netif_mut()
            .set_hostname(hostname)
            .map_err(|e| NativeError::esp("esp_netif_set_hostname", e))
    }

    fn dns_server(&self, slot: usize) -> Option<IpAddr> {
        if slot >= DNS_MAX_SERVERS {
            return None;
        }
        let mut info = sys::esp_netif_dns_info_t::default();
        let err = unsafe {
            sys::esp_netif_get_dns_info(
                self.sta_handle(),
                slot as sys::esp_netif_dns_type_t,
                &mut info,
            )
        };
        if err != sys::ESP_OK as sys::esp_err_t {
            return None;
        }
        ip_from_netif(&info.ip)
    }

    fn set_dns_server(&mut self, slot: usize, server: IpAddr) {
        if slot >= DNS_MAX_SERVERS {
            return;
        }
        let mut info = sys::esp_netif_dns_info_t {
            ip: ip_to_netif(server),
        };
        let result = esp!(unsafe {
            sys::esp_netif_set_dns_info(
                self.sta_handle(),
                slot as sys::esp_netif_dns_type_t,
                &mut info,
            )
        });
        if let Err(e) = result {
            warn!("Failed to set DNS server {} to {}: {:?}", slot, server, e);
        }
    }

    fn set_power_save(&mut self, mode: PowerSaveMode) -> Result<(), NativeError> {
        let raw = match mode {
            PowerSaveMode::None => sys::wifi_ps_type_t_WIFI_PS_NONE,
            PowerSaveMode::MinModem => sys::wifi_ps_type_t_WIFI_PS_MIN_MODEM,
            PowerSaveMode::MaxModem => sys::wifi_ps_type_t_WIFI_PS_MAX_MODEM,
        };
        esp!(unsafe { sys::esp_wifi_set_ps(raw) })
            .map_err(|e| NativeError::esp("esp_wifi_set_ps", e))
    }

    fn set_max_tx_power(&mut self, power: TxPower) -> Result<(), NativeError> {
        esp!(unsafe { sys::esp_wifi_set_max_tx_power(power.quarter_dbm()) })
            .map_err(|e| NativeError::esp("esp_wifi_set_max_tx_power", e))
    }

    fn protocols(&self) -> Result<ProtocolSet, NativeError> {
        let mut bits = 0u8;
        esp!(unsafe { sys::esp_wifi_get_protocol(sys::wifi_interface_t_WIFI_IF_STA, &mut bits) })
            .map_err(|e| NativeError::esp("esp_wifi_get_protocol", e))?;
        Ok(ProtocolSet::from_bits(bits))
    }

    fn set_protocols(&mut self, protocols: ProtocolSet) -> Result<(), NativeError> {
        esp!(unsafe {
            sys::esp_wifi_set_protocol(sys::wifi_interface_t_WIFI_IF_STA, protocols.bits())
        })
        .map_err(|e| NativeError::esp("esp_wifi_set_protocol", e))
    }

    fn scan_networks(&mut self) -> Result<usize, NativeError> {
        self.ensure_started()?;
        esp!(unsafe { sys::esp_wifi_scan_start(std::ptr::null(), true) })
            .map_err(|e| NativeError::esp("esp_wifi_scan_start", e))?;

        let mut count: u16 = 0;
        esp!(unsafe { sys::esp_wifi_scan_get_ap_num(&mut count) })
            .map_err(|e| NativeError::esp("esp_wifi_scan_get_ap_num", e))?;
        let mut records: Vec<sys::wifi_ap_record_t> =
            (0..count).map(|_| Default::default()).collect();
        esp!(unsafe { sys::esp_wifi_scan_get_ap_records(&mut count, records.as_mut_ptr()) })
            .map_err(|e| NativeError::esp("esp_wifi_scan_get_ap_records", e))?;
        records.truncate(usize::from(count));

        self.scan_cache = records.iter().map(scan_record).collect();
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

impl NameResolver for EspPlatform {
    fn start_lookup(
        &mut self,
        name: &str,
        completion: Completion,
    ) -> Result<LookupStart, NativeError> {
        let name = CString::new(name)
            .map_err(|_| NativeError::new("dns_gethostbyname", sys::ESP_ERR_INVALID_ARG as i32))?;
        let ctx = Box::into_raw(Box::new(DnsRequest { name, completion })) as *mut c_void;

        // The raw DNS API belongs to the tcpip thread; even a cache hit is
        // delivered through the completion from there
        let err = unsafe { sys::tcpip_callback(Some(dns_request), ctx) };
        if err != LWIP_ERR_OK {
            drop(unsafe { Box::from_raw(ctx as *mut DnsRequest) });
            return Err(NativeError::new("tcpip_callback", i32::from(err)));
        }
        Ok(LookupStart::InProgress)
    }

    fn cancel_lookup(&mut self, _name: &str) -> bool {
        // lwIP has no cancellation; the late callback is discarded
        false
    }
}

impl DeadlineTimer for EspPlatform {
    fn arm(&mut self, after: Duration, expiry: Expiry) -> Result<(), NativeError> {
        let mut expiry = Some(expiry);
        let timer = self
            .timers
            .timer(move || {
                if let Some(expiry) = expiry.take() {
                    expiry.fire();
                }
            })
            .map_err(|e| NativeError::esp("esp_timer_create", e))?;
        timer
            .after(after)
            .map_err(|e| NativeError::esp("esp_timer_start_once", e))?;
        self.timer = Some(timer);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            if let Err(e) = timer.cancel() {
                warn!("Failed to cancel deadline timer: {:?}", e);
            }
        }
    }
}

impl EventLoop for EspPlatform {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn poll(&mut self) {
        FreeRtos::delay_ms(1);
    }
}
