//! WiFi compatibility demo.
//!
//! Connects with ESP8266-style calls and resolves a hostname. On ESP32 the
//! credentials come from `WIFI_SSID` / `WIFI_PASS` at build time; on the host
//! the same flow runs against the simulated platform.

use std::net::{IpAddr, Ipv4Addr};

use log::{error, info, warn};

use esp8266_wifi_compat::enums::WIFI_MODEM_SLEEP;
use esp8266_wifi_compat::{ConnectParams, NativeWifi, WiFi32, WlStatus};

const LOOKUP_HOST: &str = "example.com";
const LOOKUP_TIMEOUT_MS: u32 = 5000;

fn run<N: NativeWifi>(wifi: &mut WiFi32<N>, ssid: &str, passphrase: Option<&str>) {
    if let Err(e) = wifi.hostname("esp-compat") {
        warn!("Hostname not set: {}", e);
    }

    let status = wifi.begin(ssid, passphrase, ConnectParams::default());
    info!("begin('{}') -> {}", ssid, status);
    if status != WlStatus::Connected {
        error!("Not connected, skipping lookup");
        return;
    }

    if let Err(e) = wifi.set_sleep_mode(WIFI_MODEM_SLEEP) {
        warn!("Sleep mode not applied: {}", e);
    }

    let mut addr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    match wifi.host_by_name(LOOKUP_HOST, &mut addr, LOOKUP_TIMEOUT_MS) {
        Ok(()) => info!("{} -> {}", LOOKUP_HOST, addr),
        Err(e) => error!("{} lookup failed: {}", LOOKUP_HOST, e),
    }
}

#[cfg(feature = "esp32")]
fn main() {
    use esp8266_wifi_compat::{EspPlatform, WIFI32};
    use esp_idf_hal::peripherals::Peripherals;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use std::time::Duration;

    esp_idf_sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    info!("=== WiFi compat starting ===");

    let platform = Peripherals::take()
        .and_then(|p| {
            let sysloop = EspSystemEventLoop::take()?;
            let nvs = EspDefaultNvsPartition::take()?;
            EspPlatform::new(p.modem, sysloop, Some(nvs))
        });
    let platform = match platform {
        Ok(p) => p,
        Err(e) => {
            error!("WiFi init failed: {:?}", e);
            return;
        }
    };
    if let Err(e) = WIFI32.install(WiFi32::new(platform)) {
        error!("{}", e);
        return;
    }

    let ssid = option_env!("WIFI_SSID").unwrap_or("");
    let passphrase = option_env!("WIFI_PASS");
    if let Err(e) = WIFI32.with(|wifi| run(wifi, ssid, passphrase)) {
        error!("{}", e);
    }

    loop {
        std::thread::sleep(Duration::from_secs(10));
        if let Ok(status) = WIFI32.with(|wifi| wifi.status()) {
            info!("Status: {}", status);
        }
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    use esp8266_wifi_compat::native::{AuthMode, ScanRecord};
    use esp8266_wifi_compat::HostPlatform;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("=== WiFi compat (host simulation) ===");

    let mut platform = HostPlatform::new();
    platform.add_access_point(
        ScanRecord {
            ssid: "MyNetwork".to_string(),
            bssid: [0x24, 0x0a, 0xc4, 0x12, 0x34, 0x56],
            rssi: -48,
            channel: 6,
            auth_code: AuthMode::Wpa2Psk.code(),
        },
        Some("MyPassword"),
    );
    platform.set_dhcp_dns(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)));
    platform.add_host(LOOKUP_HOST, IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)), 25);

    let mut wifi = WiFi32::new(platform);
    run(&mut wifi, "MyNetwork", Some("MyPassword"));
}
