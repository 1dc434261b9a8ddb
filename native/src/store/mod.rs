// @fileoverview Secure store backends
//
// `SecureStore` is the request/response contract of the platform credential
// service. `Keychain` only ever talks to a store through this trait.

use crate::accessibility::Accessibility;
use crate::attributes::Attributes;
use crate::status::Status;

pub mod memory;

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub mod security_framework;

#[cfg(feature = "keyring-backend")]
pub mod credential_store;

pub use memory::{DeviceState, MemoryStore};

#[cfg(any(target_os = "macos", target_os = "ios"))]
pub use self::security_framework::AppleKeychainStore;

#[cfg(feature = "keyring-backend")]
pub use credential_store::KeyringStore;

/// One blocking call per method, answered with a store status
pub trait SecureStore: Send + Sync {
    /// Backend name used in logs and errors
    fn name(&self) -> &'static str;

    /// Whether items with this policy can be stored faithfully
    fn supports(&self, accessibility: Accessibility) -> bool;

    /// Create an item from a full attribute mapping
    fn add(&self, attributes: &Attributes) -> Status;

    /// Replace attributes of the items matching `query`
    fn update(&self, query: &Attributes, changes: &Attributes) -> Status;

    /// Delete the items matching `query`
    fn delete(&self, query: &Attributes) -> Status;

    /// Look up one item; the result carries the account and, if asked for,
    /// the secret payload
    fn copy_matching(&self, query: &Attributes) -> Result<Attributes, Status>;
}
