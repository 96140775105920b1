//! Station credentials.
//!
//! Platform-independent credential types with the validation the native
//! connect routine applies before touching the radio. Secret material is
//! zeroed when the value is dropped.
//!
//! # Example
//!
//! ```
//! use esp8266_wifi_compat::wifi::{EnterpriseCredentials, EnterpriseMethod, StationCredentials};
//!
//! let home = StationCredentials::new("MyNetwork", "MyPassword").unwrap();
//! assert!(!home.is_open());
//!
//! let office = EnterpriseCredentials::new(EnterpriseMethod::Peap)
//!     .with_identity("anonymous")
//!     .with_username("alice")
//!     .with_password("correct horse");
//! assert!(office.validate().is_ok());
//! ```

use std::fmt;

use zeroize::Zeroize;

use crate::error::{CompatError, EnumFamily};
use crate::native::StationAuth;

/// Maximum SSID length per IEEE 802.11 standard.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum passphrase length for WPA2.
pub const MAX_PASSPHRASE_LEN: usize = 64;

/// Minimum passphrase length for WPA2.
pub const MIN_PASSPHRASE_LEN: usize = 8;

pub const WPA2_AUTH_TLS: i32 = 0;
pub const WPA2_AUTH_PEAP: i32 = 1;
pub const WPA2_AUTH_TTLS: i32 = 2;

/// SSID and passphrase for a personal (or open) network.
#[derive(Clone, PartialEq, Eq, Zeroize)]
pub struct StationCredentials {
    ssid: String,
    passphrase: String,
}

impl StationCredentials {
    /// Create credentials; an empty passphrase means an open network.
    pub fn new(
        ssid: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let credentials = Self {
            ssid: ssid.into(),
            passphrase: passphrase.into(),
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Create credentials for an open network.
    pub fn open(ssid: impl Into<String>) -> Result<Self, CredentialsError> {
        Self::new(ssid, String::new())
    }

    /// Validate SSID and passphrase lengths.
    pub fn validate(&self) -> Result<(), CredentialsError> {
        validate_ssid(&self.ssid)?;

        if !self.passphrase.is_empty() && self.passphrase.len() < MIN_PASSPHRASE_LEN {
            return Err(CredentialsError::PassphraseTooShort {
                len: self.passphrase.len(),
                min: MIN_PASSPHRASE_LEN,
            });
        }
        if self.passphrase.len() > MAX_PASSPHRASE_LEN {
            return Err(CredentialsError::PassphraseTooLong {
                len: self.passphrase.len(),
                max: MAX_PASSPHRASE_LEN,
            });
        }

        Ok(())
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn is_open(&self) -> bool {
        self.passphrase.is_empty()
    }

    /// Native authentication for these credentials.
    pub fn auth(&self) -> StationAuth<'_> {
        if self.is_open() {
            StationAuth::Open
        } else {
            StationAuth::Passphrase(&self.passphrase)
        }
    }
}

impl Drop for StationCredentials {
    fn drop(&mut self) {
        self.passphrase.zeroize();
    }
}

impl fmt::Debug for StationCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StationCredentials")
            .field("ssid", &self.ssid)
            .field("open", &self.is_open())
            .finish()
    }
}

pub(crate) fn validate_ssid(ssid: &str) -> Result<(), CredentialsError> {
    if ssid.is_empty() {
        return Err(CredentialsError::SsidEmpty);
    }
    if ssid.len() > MAX_SSID_LEN {
        return Err(CredentialsError::SsidTooLong {
            len: ssid.len(),
            max: MAX_SSID_LEN,
        });
    }
    Ok(())
}

/// Legacy `wpa2_auth_method_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnterpriseMethod {
    #[default]
    Tls,
    Peap,
    Ttls,
}

impl EnterpriseMethod {
    pub fn code(self) -> i32 {
        match self {
            Self::Tls => WPA2_AUTH_TLS,
            Self::Peap => WPA2_AUTH_PEAP,
            Self::Ttls => WPA2_AUTH_TTLS,
        }
    }
}

impl TryFrom<i32> for EnterpriseMethod {
    type Error = CompatError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            WPA2_AUTH_TLS => Ok(Self::Tls),
            WPA2_AUTH_PEAP => Ok(Self::Peap),
            WPA2_AUTH_TTLS => Ok(Self::Ttls),
            other => Err(CompatError::unsupported(EnumFamily::EnterpriseMethod, other)),
        }
    }
}

/// WPA2-Enterprise identity and certificate material.
///
/// PEM blobs are kept as text; the native side receives them verbatim.
#[derive(Clone, Default, Zeroize)]
pub struct EnterpriseCredentials {
    #[zeroize(skip)]
    pub method: EnterpriseMethod,
    pub identity: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ca_pem: Option<String>,
    pub client_cert: Option<String>,
    pub client_key: Option<String>,
}

impl EnterpriseCredentials {
    pub fn new(method: EnterpriseMethod) -> Self {
        Self {
            method,
            identity: None,
            username: None,
            password: None,
            ca_pem: None,
            client_cert: None,
            client_key: None,
        }
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_ca_pem(mut self, pem: impl Into<String>) -> Self {
        self.ca_pem = Some(pem.into());
        self
    }

    pub fn with_client_cert(mut self, cert: impl Into<String>, key: impl Into<String>) -> Self {
        self.client_cert = Some(cert.into());
        self.client_key = Some(key.into());
        self
    }

    /// Check that the material required by `method` is present.
    ///
    /// TLS needs a client certificate and key; PEAP and TTLS need a username
    /// and password. Fields that are given must not be empty.
    pub fn validate(&self) -> Result<(), CredentialsError> {
        let fields = [
            ("identity", &self.identity),
            ("username", &self.username),
            ("password", &self.password),
            ("ca_pem", &self.ca_pem),
            ("client_cert", &self.client_cert),
            ("client_key", &self.client_key),
        ];
        for (name, value) in fields {
            if value.as_deref() == Some("") {
                return Err(CredentialsError::EmptyField(name));
            }
        }

        let required = match self.method {
            EnterpriseMethod::Tls => [
                ("client_cert", &self.client_cert),
                ("client_key", &self.client_key),
            ],
            EnterpriseMethod::Peap | EnterpriseMethod::Ttls => [
                ("username", &self.username),
                ("password", &self.password),
            ],
        };
        for (name, value) in required {
            if value.is_none() {
                return Err(CredentialsError::MissingField(name));
            }
        }

        Ok(())
    }
}

impl Drop for EnterpriseCredentials {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for EnterpriseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnterpriseCredentials")
            .field("method", &self.method)
            .field("identity", &self.identity)
            .field("username", &self.username)
            .field("has_password", &self.password.is_some())
            .field("has_ca_pem", &self.ca_pem.is_some())
            .field("has_client_cert", &self.client_cert.is_some())
            .finish()
    }
}

/// Connection arguments shared by the `begin` overloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectParams {
    /// Channel to use, 0 for any.
    pub channel: i32,
    /// Access point to join, `None` for any.
    pub bssid: Option<[u8; 6]>,
    /// Start connecting immediately.
    pub connect: bool,
}

impl Default for ConnectParams {
    fn default() -> Self {
        Self {
            channel: 0,
            bssid: None,
            connect: true,
        }
    }
}

impl ConnectParams {
    /// Native channel, `None` when any channel is allowed.
    pub fn native_channel(&self) -> Option<u8> {
        u8::try_from(self.channel).ok().filter(|c| *c != 0)
    }
}

/// Credentials rejected before reaching the native driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    /// SSID is empty.
    SsidEmpty,
    /// SSID exceeds maximum length.
    SsidTooLong { len: usize, max: usize },
    /// Passphrase is too short for WPA2.
    PassphraseTooShort { len: usize, min: usize },
    /// Passphrase exceeds maximum length.
    PassphraseTooLong { len: usize, max: usize },
    /// Enterprise field required by the method is missing.
    MissingField(&'static str),
    /// Enterprise field is present but empty.
    EmptyField(&'static str),
}

impl fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SsidEmpty => write!(f, "SSID cannot be empty"),
            Self::SsidTooLong { len, max } => {
                write!(f, "SSID too long: {} bytes (max {})", len, max)
            }
            Self::PassphraseTooShort { len, min } => {
                write!(f, "passphrase too short: {} bytes (min {})", len, min)
            }
            Self::PassphraseTooLong { len, max } => {
                write!(f, "passphrase too long: {} bytes (max {})", len, max)
            }
            Self::MissingField(name) => write!(f, "missing enterprise field: {}", name),
            Self::EmptyField(name) => write!(f, "empty enterprise field: {}", name),
        }
    }
}

impl std::error::Error for CredentialsError {}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== StationCredentials Tests ====================

    #[test]
    fn test_valid_credentials() {
        let creds = StationCredentials::new("TestNetwork", "password123").unwrap();
        assert_eq!(creds.ssid(), "TestNetwork");
        assert!(!creds.is_open());
        assert!(matches!(creds.auth(), StationAuth::Passphrase("password123")));
    }

    #[test]
    fn test_open_network() {
        let creds = StationCredentials::open("OpenNetwork").unwrap();
        assert!(creds.is_open());
        assert!(matches!(creds.auth(), StationAuth::Open));
    }

    #[test]
    fn test_empty_ssid() {
        let result = StationCredentials::new("", "password123");
        assert_eq!(result, Err(CredentialsError::SsidEmpty));
    }

    #[test]
    fn test_ssid_length_limits() {
        assert!(StationCredentials::open("a".repeat(32)).is_ok());
        assert!(matches!(
            StationCredentials::open("a".repeat(33)),
            Err(CredentialsError::SsidTooLong { len: 33, max: 32 })
        ));
    }

    #[test]
    fn test_passphrase_length_limits() {
        assert!(matches!(
            StationCredentials::new("Net", "short"),
            Err(CredentialsError::PassphraseTooShort { .. })
        ));
        assert!(StationCredentials::new("Net", "12345678").is_ok());
        assert!(StationCredentials::new("Net", "a".repeat(64)).is_ok());
        assert!(matches!(
            StationCredentials::new("Net", "a".repeat(65)),
            Err(CredentialsError::PassphraseTooLong { .. })
        ));
    }

    #[test]
    fn test_debug_hides_passphrase() {
        let creds = StationCredentials::new("Net", "supersecret").unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("Net"));
        assert!(!debug.contains("supersecret"));
    }

    // ==================== EnterpriseCredentials Tests ====================

    #[test]
    fn test_peap_requires_username_and_password() {
        let creds = EnterpriseCredentials::new(EnterpriseMethod::Peap).with_username("alice");
        assert_eq!(
            creds.validate(),
            Err(CredentialsError::MissingField("password"))
        );
        let creds = creds.with_password("hunter22");
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn test_tls_requires_client_cert() {
        let creds = EnterpriseCredentials::new(EnterpriseMethod::Tls).with_identity("device-17");
        assert_eq!(
            creds.validate(),
            Err(CredentialsError::MissingField("client_cert"))
        );
        let creds = creds.with_client_cert("-----BEGIN CERTIFICATE-----", "-----BEGIN KEY-----");
        assert!(creds.validate().is_ok());
    }

    #[test]
    fn test_empty_field_rejected() {
        let creds = EnterpriseCredentials::new(EnterpriseMethod::Ttls)
            .with_identity("")
            .with_username("alice")
            .with_password("pw");
        assert_eq!(creds.validate(), Err(CredentialsError::EmptyField("identity")));
    }

    #[test]
    fn test_enterprise_debug_hides_secrets() {
        let creds = EnterpriseCredentials::new(EnterpriseMethod::Peap)
            .with_username("alice")
            .with_password("topsecret");
        assert!(!format!("{:?}", creds).contains("topsecret"));
    }

    #[test]
    fn test_enterprise_method_codes() {
        for method in [EnterpriseMethod::Tls, EnterpriseMethod::Peap, EnterpriseMethod::Ttls] {
            assert_eq!(EnterpriseMethod::try_from(method.code()), Ok(method));
        }
        assert!(EnterpriseMethod::try_from(3).is_err());
    }

    // ==================== ConnectParams Tests ====================

    #[test]
    fn test_connect_params_channel() {
        assert_eq!(ConnectParams::default().native_channel(), None);
        let params = ConnectParams {
            channel: 11,
            ..Default::default()
        };
        assert_eq!(params.native_channel(), Some(11));
        let params = ConnectParams {
            channel: -3,
            ..Default::default()
        };
        assert_eq!(params.native_channel(), None);
    }
}
