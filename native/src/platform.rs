/**
 * Platform detection helpers
 *
 * Picks the native secure store for the running platform.
 */

use std::sync::Arc;

use crate::error::Result;
use crate::store::SecureStore;

/// Get platform name
pub fn platform_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "ios") {
        "ios"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// Check if a native secure store is compiled in for this platform
pub fn is_secure_storage_available() -> bool {
    cfg!(any(target_os = "macos", target_os = "ios"))
        || cfg!(all(
            feature = "keyring-backend",
            any(target_os = "windows", target_os = "linux")
        ))
}

/// The native secure store for this platform
pub fn default_store() -> Result<Arc<dyn SecureStore>> {
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    {
        Ok(Arc::new(crate::store::AppleKeychainStore::new()))
    }

    #[cfg(all(
        not(any(target_os = "macos", target_os = "ios")),
        feature = "keyring-backend",
        any(target_os = "windows", target_os = "linux")
    ))]
    {
        Ok(Arc::new(crate::store::KeyringStore::new()))
    }

    #[cfg(not(any(
        target_os = "macos",
        target_os = "ios",
        all(
            feature = "keyring-backend",
            any(target_os = "windows", target_os = "linux")
        )
    )))]
    {
        log::warn!("no secure store available on {}", platform_name());
        Err(crate::error::KeychainError::Store(
            crate::status::Status::NotAvailable,
        ))
    }
}
