// @fileoverview Object model over the platform secure credential store
//
// A `Keychain` is bound to a service and an accessibility policy; an
// `Account` is one identifier/secret pair. Each operation becomes a single
// call against a `SecureStore` backend.

pub mod accessibility;
pub mod account;
pub mod async_keychain;
pub mod attributes;
pub mod config;
pub mod error;
pub mod keychain;
pub mod platform;
pub mod status;
pub mod store;

pub use accessibility::{Accessibility, AccessibilityToken};
pub use account::Account;
pub use async_keychain::AsyncKeychain;
pub use attributes::{AttrKey, AttrValue, Attributes};
pub use config::KeychainConfig;
pub use error::{KeychainError, Result};
pub use keychain::{Keychain, KeychainRef};
pub use status::Status;
pub use store::{MemoryStore, SecureStore};

/// Initialize `env_logger` at `level` unless `RUST_LOG` says otherwise
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: &str) {
    init_logging_with(level.parse().unwrap_or(log::LevelFilter::Info));
}

pub(crate) fn init_logging_with(filter: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .try_init()
        .ok();
}
