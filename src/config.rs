//! Compatibility layer configuration.
//!
//! Values are plain data and validated once, when the compatibility object
//! is created.

use std::time::Duration;

use crate::error::CompatError;

/// Hostname lookup timeout used by the legacy overload without one.
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_millis(1000);

/// Longest accepted default lookup timeout.
pub const MAX_DNS_TIMEOUT: Duration = Duration::from_secs(60);

/// Behavior switches of [`WiFi32`](crate::WiFi32).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatConfig {
    /// Timeout for `host_by_name_default`.
    pub dns_timeout: Duration,
    /// Save the DNS servers before `begin*` and restore them afterwards.
    pub preserve_dns_on_begin: bool,
    /// Force a pending lookup to time out when `begin*` is called.
    pub abandon_lookup_on_begin: bool,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            dns_timeout: DEFAULT_DNS_TIMEOUT,
            preserve_dns_on_begin: true,
            abandon_lookup_on_begin: true,
        }
    }
}

impl CompatConfig {
    pub fn with_dns_timeout(mut self, timeout: Duration) -> Self {
        self.dns_timeout = timeout;
        self
    }

    pub fn with_dns_preservation(mut self, enabled: bool) -> Self {
        self.preserve_dns_on_begin = enabled;
        self
    }

    pub fn with_lookup_abandon(mut self, enabled: bool) -> Self {
        self.abandon_lookup_on_begin = enabled;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), CompatError> {
        if self.dns_timeout.is_zero() {
            return Err(CompatError::InvalidConfig("dns_timeout must be at least 1 ms"));
        }
        if self.dns_timeout > MAX_DNS_TIMEOUT {
            return Err(CompatError::InvalidConfig("dns_timeout exceeds 60 s"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = CompatConfig::default();
        assert_eq!(config.dns_timeout, Duration::from_millis(1000));
        assert!(config.preserve_dns_on_begin);
        assert!(config.abandon_lookup_on_begin);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_range() {
        let zero = CompatConfig::default().with_dns_timeout(Duration::ZERO);
        assert!(matches!(zero.validate(), Err(CompatError::InvalidConfig(_))));

        let max = CompatConfig::default().with_dns_timeout(MAX_DNS_TIMEOUT);
        assert!(max.validate().is_ok());

        let over = CompatConfig::default().with_dns_timeout(Duration::from_secs(61));
        assert!(over.validate().is_err());
    }

    #[test]
    fn test_builders() {
        let config = CompatConfig::default()
            .with_dns_preservation(false)
            .with_lookup_abandon(false);
        assert!(!config.preserve_dns_on_begin);
        assert!(!config.abandon_lookup_on_begin);
    }
}
