use std::env;
use std::sync::Arc;

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::accessibility::Accessibility;
use crate::error::{KeychainError, Result};
use crate::keychain::Keychain;
use crate::store::SecureStore;

pub const ENV_SERVICE: &str = "KEYCHAIN_SERVICE";
pub const ENV_ACCESSIBILITY: &str = "KEYCHAIN_ACCESSIBILITY";
pub const ENV_LOG: &str = "KEYCHAIN_LOG";

/// Settings for opening a keychain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeychainConfig {
    pub service: String,
    pub accessibility: Accessibility,
    pub log_level: String,
}

impl Default for KeychainConfig {
    fn default() -> Self {
        Self {
            service: env!("CARGO_PKG_NAME").to_string(),
            accessibility: Accessibility::WhenUnlocked,
            log_level: "info".to_string(),
        }
    }
}

impl KeychainConfig {
    pub fn new(service: impl Into<String>, accessibility: Accessibility) -> Self {
        Self {
            service: service.into(),
            accessibility,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `KEYCHAIN_SERVICE`, `KEYCHAIN_ACCESSIBILITY`
    /// and `KEYCHAIN_LOG`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(service) = lookup(ENV_SERVICE) {
            config.service = service;
        }
        if let Some(accessibility) = lookup(ENV_ACCESSIBILITY) {
            config.accessibility = accessibility.parse()?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            config.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.trim().is_empty() {
            return Err(KeychainError::Config("service must not be empty".to_string()));
        }

        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.log_level
            .parse()
            .map_err(|_| KeychainError::Config(format!("invalid log level `{}`", self.log_level)))
    }

    /// Install `env_logger` at the configured level; `RUST_LOG` still wins
    pub fn init_logging(&self) -> Result<()> {
        crate::init_logging_with(self.level_filter()?);
        Ok(())
    }

    pub fn open(&self, store: Arc<dyn SecureStore>) -> Result<Keychain> {
        self.validate()?;
        Keychain::new(self.service.clone(), self.accessibility, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = KeychainConfig::default();
        assert_eq!(config.accessibility, Accessibility::WhenUnlocked);
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            KeychainConfig::from_json(r#"{"service":"com.example.app","accessibility":"always_this_device_only"}"#)
                .unwrap();
        assert_eq!(config.service, "com.example.app");
        assert_eq!(config.accessibility, Accessibility::AlwaysThisDeviceOnly);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_json_rejects_empty_service() {
        let err = KeychainConfig::from_json(r#"{"service":"  "}"#).unwrap_err();
        assert!(matches!(err, KeychainError::Config(_)));
    }

    #[test]
    fn test_from_json_rejects_unknown_policy() {
        let err = KeychainConfig::from_json(r#"{"accessibility":"sometimes"}"#).unwrap_err();
        assert!(matches!(err, KeychainError::Json(_)));
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            (ENV_SERVICE, "ns.env"),
            (ENV_ACCESSIBILITY, "AfterFirstUnlock"),
            (ENV_LOG, "debug"),
        ]
        .into_iter()
        .collect();

        let config =
            KeychainConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string())).unwrap();
        assert_eq!(config.service, "ns.env");
        assert_eq!(config.accessibility, Accessibility::AfterFirstUnlock);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_from_lookup_rejects_bad_level() {
        let err = KeychainConfig::from_lookup(|key| (key == ENV_LOG).then(|| "loud".to_string()))
            .unwrap_err();
        assert!(matches!(err, KeychainError::Config(_)));
    }

    #[test]
    fn test_level_filter() {
        let mut config = KeychainConfig::default();
        config.log_level = "TRACE".to_string();
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Trace);

        config.log_level = "loud".to_string();
        assert!(matches!(config.init_logging(), Err(KeychainError::Config(_))));
    }

    #[test]
    fn test_init_logging_applies_level() {
        let mut config = KeychainConfig::default();
        config.log_level = "debug".to_string();
        config.init_logging().unwrap();

        if env::var_os("RUST_LOG").is_none() {
            assert_eq!(log::max_level(), LevelFilter::Debug);
        }
        // A second install is ignored.
        config.init_logging().unwrap();
    }

    #[test]
    fn test_open() {
        let keychain = KeychainConfig::new("ns.open", Accessibility::Always)
            .open(Arc::new(MemoryStore::new()))
            .unwrap();
        assert_eq!(keychain.service(), "ns.open");
        assert_eq!(keychain.accessibility(), Accessibility::Always);
    }
}
