//! Process-wide compatibility object.
//!
//! Legacy code reaches the WiFi API through a single global instance. The
//! instance is installed once at startup and accessed through [`Global::with`]
//! so that every caller goes through the same lock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, warn};

use crate::error::CompatError;

/// Lazily installed singleton.
pub struct Global<T> {
    inner: Mutex<Option<T>>,
}

impl<T> Default for Global<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Global<T> {
    /// Empty slot, usable in a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install the instance. Fails if one is already installed; the new
    /// value is dropped in that case.
    pub fn install(&self, value: T) -> Result<(), CompatError> {
        let mut slot = self.lock();
        if slot.is_some() {
            warn!("Compatibility object already installed");
            return Err(CompatError::AlreadyInstalled);
        }
        *slot = Some(value);
        info!("Compatibility object installed");
        Ok(())
    }

    pub fn is_installed(&self) -> bool {
        self.lock().is_some()
    }

    /// Run `f` with exclusive access to the instance.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, CompatError> {
        let mut slot = self.lock();
        let value = slot.as_mut().ok_or(CompatError::NotInstalled)?;
        Ok(f(value))
    }

    /// Remove and return the instance.
    pub fn teardown(&self) -> Option<T> {
        let value = self.lock().take();
        if value.is_some() {
            info!("Compatibility object torn down");
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::HostPlatform;
    use crate::wifi::WiFi32;

    static SHARED: Global<WiFi32<HostPlatform>> = Global::new();

    #[test]
    fn test_install_once() {
        let global = Global::new();
        assert!(!global.is_installed());
        assert_eq!(global.install(1u32), Ok(()));
        assert_eq!(global.install(2u32), Err(CompatError::AlreadyInstalled));
        assert_eq!(global.with(|v| *v), Ok(1));
    }

    #[test]
    fn test_with_before_install() {
        let global: Global<u32> = Global::new();
        assert_eq!(global.with(|v| *v), Err(CompatError::NotInstalled));
    }

    #[test]
    fn test_teardown_allows_reinstall() {
        let global = Global::new();
        global.install(String::from("first")).unwrap();
        assert_eq!(global.teardown().as_deref(), Some("first"));
        assert!(global.teardown().is_none());
        global.install(String::from("second")).unwrap();
        assert_eq!(global.with(|v| v.clone()).unwrap(), "second");
    }

    #[test]
    fn test_static_wifi_instance() {
        SHARED.install(WiFi32::new(HostPlatform::new())).unwrap();
        let status = SHARED.with(|wifi| wifi.status()).unwrap();
        assert!(!status.is_connected());
        assert!(SHARED.teardown().is_some());
    }
}
