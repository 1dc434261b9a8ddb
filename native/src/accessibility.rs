// @fileoverview Accessibility policies for stored secrets
//
// Each policy combines a lock-state condition with device portability and
// maps to one opaque `kSecAttrAccessible*` constant of the store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeychainError;

/// When the store may release an item's secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    /// Item data can only be accessed while the device is unlocked
    #[default]
    WhenUnlocked,
    /// Item data can be accessed once the device has been unlocked after a restart
    AfterFirstUnlock,
    /// Item data can always be accessed regardless of the lock state
    Always,
    /// Unlocked device with a passcode set; never leaves the device
    PasscodeSetThisDeviceOnly,
    /// Item data can only be accessed while unlocked (this device only)
    WhenUnlockedThisDeviceOnly,
    /// After first unlock until next reboot (this device only)
    AfterFirstUnlockThisDeviceOnly,
    /// Always accessible (this device only)
    AlwaysThisDeviceOnly,
}

/// Opaque store constant for an accessibility policy
///
/// The wrapped value is the string behind the matching `kSecAttrAccessible*`
/// constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccessibilityToken(&'static str);

impl AccessibilityToken {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for AccessibilityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Accessibility {
    pub const ALL: [Accessibility; 7] = [
        Accessibility::WhenUnlocked,
        Accessibility::AfterFirstUnlock,
        Accessibility::Always,
        Accessibility::PasscodeSetThisDeviceOnly,
        Accessibility::WhenUnlockedThisDeviceOnly,
        Accessibility::AfterFirstUnlockThisDeviceOnly,
        Accessibility::AlwaysThisDeviceOnly,
    ];

    /// The store constant for this policy
    pub fn token(self) -> AccessibilityToken {
        AccessibilityToken(match self {
            Accessibility::WhenUnlocked => "ak",
            Accessibility::AfterFirstUnlock => "ck",
            Accessibility::Always => "dk",
            Accessibility::PasscodeSetThisDeviceOnly => "akpu",
            Accessibility::WhenUnlockedThisDeviceOnly => "aku",
            Accessibility::AfterFirstUnlockThisDeviceOnly => "cku",
            Accessibility::AlwaysThisDeviceOnly => "dku",
        })
    }

    pub fn from_token(token: AccessibilityToken) -> Self {
        Self::ALL
            .into_iter()
            .find(|policy| policy.token() == token)
            .unwrap_or_default()
    }

    /// Secret is released only while the device is unlocked
    pub fn requires_unlock(self) -> bool {
        matches!(
            self,
            Accessibility::WhenUnlocked
                | Accessibility::PasscodeSetThisDeviceOnly
                | Accessibility::WhenUnlockedThisDeviceOnly
        )
    }

    /// Secret is released once the device was unlocked since boot
    pub fn requires_first_unlock(self) -> bool {
        matches!(
            self,
            Accessibility::AfterFirstUnlock | Accessibility::AfterFirstUnlockThisDeviceOnly
        )
    }

    pub fn requires_passcode(self) -> bool {
        self == Accessibility::PasscodeSetThisDeviceOnly
    }

    /// Item is excluded from backups and never migrates to another device
    pub fn is_device_bound(self) -> bool {
        matches!(
            self,
            Accessibility::PasscodeSetThisDeviceOnly
                | Accessibility::WhenUnlockedThisDeviceOnly
                | Accessibility::AfterFirstUnlockThisDeviceOnly
                | Accessibility::AlwaysThisDeviceOnly
        )
    }

    pub fn describe(self) -> String {
        let condition = if self.requires_passcode() {
            "when unlocked with a passcode set"
        } else if self.requires_unlock() {
            "when unlocked"
        } else if self.requires_first_unlock() {
            "after first unlock"
        } else {
            "always"
        };

        if self.is_device_bound() {
            format!("accessible {} (this device only)", condition)
        } else {
            format!("accessible {}", condition)
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Accessibility::WhenUnlocked => "when_unlocked",
            Accessibility::AfterFirstUnlock => "after_first_unlock",
            Accessibility::Always => "always",
            Accessibility::PasscodeSetThisDeviceOnly => "passcode_set_this_device_only",
            Accessibility::WhenUnlockedThisDeviceOnly => "when_unlocked_this_device_only",
            Accessibility::AfterFirstUnlockThisDeviceOnly => "after_first_unlock_this_device_only",
            Accessibility::AlwaysThisDeviceOnly => "always_this_device_only",
        }
    }
}

impl fmt::Display for Accessibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts `when_unlocked`, `WhenUnlocked`, `when-unlocked` and the like
impl FromStr for Accessibility {
    type Err = KeychainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        Self::ALL
            .into_iter()
            .find(|policy| policy.name().replace('_', "") == normalized)
            .ok_or_else(|| KeychainError::Config(format!("unknown accessibility policy `{}`", s)))
    }
}
