// @fileoverview Security framework keychain store
//
// Translates attribute mappings into CoreFoundation dictionaries and issues
// the `SecItem*` calls directly, so the accessibility constant and class
// travel with every request.
//
// On macOS every request targets the data protection keychain. The legacy
// file keychain ignores `kSecAttrAccessible`, so items written there would
// not be held to their policy. The data protection keychain needs a signed
// binary with a keychain access group; without one calls fail with
// `MissingEntitlement`.

use core_foundation::base::{CFType, CFTypeRef, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::data::CFData;
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::string::{CFString, CFStringRef};
use log::debug;

use super::SecureStore;
use crate::accessibility::{Accessibility, AccessibilityToken};
use crate::attributes::{AttrKey, AttrValue, Attributes, ItemClass, MatchLimit};
use crate::status::Status;

type OSStatus = i32;

#[link(name = "Security", kind = "framework")]
extern "C" {
    static kSecClass: CFStringRef;
    static kSecClassGenericPassword: CFStringRef;
    static kSecAttrService: CFStringRef;
    static kSecAttrAccount: CFStringRef;
    static kSecAttrAccessible: CFStringRef;
    static kSecValueData: CFStringRef;
    static kSecReturnData: CFStringRef;
    static kSecReturnAttributes: CFStringRef;
    static kSecMatchLimit: CFStringRef;
    static kSecMatchLimitOne: CFStringRef;
    #[cfg(target_os = "macos")]
    static kSecUseDataProtectionKeychain: CFStringRef;

    static kSecAttrAccessibleWhenUnlocked: CFStringRef;
    static kSecAttrAccessibleAfterFirstUnlock: CFStringRef;
    static kSecAttrAccessibleAlways: CFStringRef;
    static kSecAttrAccessibleWhenPasscodeSetThisDeviceOnly: CFStringRef;
    static kSecAttrAccessibleWhenUnlockedThisDeviceOnly: CFStringRef;
    static kSecAttrAccessibleAfterFirstUnlockThisDeviceOnly: CFStringRef;
    static kSecAttrAccessibleAlwaysThisDeviceOnly: CFStringRef;

    fn SecItemAdd(attributes: CFDictionaryRef, result: *mut CFTypeRef) -> OSStatus;
    fn SecItemUpdate(query: CFDictionaryRef, attributes_to_update: CFDictionaryRef) -> OSStatus;
    fn SecItemDelete(query: CFDictionaryRef) -> OSStatus;
    fn SecItemCopyMatching(query: CFDictionaryRef, result: *mut CFTypeRef) -> OSStatus;
}

/// The login keychain on macOS, the app keychain on iOS
#[derive(Debug, Default, Clone, Copy)]
pub struct AppleKeychainStore;

impl AppleKeychainStore {
    pub fn new() -> Self {
        Self
    }
}

fn constant(value: CFStringRef) -> CFString {
    unsafe { CFString::wrap_under_get_rule(value) }
}

fn key_constant(key: AttrKey) -> CFString {
    unsafe {
        constant(match key {
            AttrKey::Class => kSecClass,
            AttrKey::Service => kSecAttrService,
            AttrKey::Account => kSecAttrAccount,
            AttrKey::Accessible => kSecAttrAccessible,
            AttrKey::ValueData => kSecValueData,
            AttrKey::ReturnData => kSecReturnData,
            AttrKey::ReturnAttributes => kSecReturnAttributes,
            AttrKey::MatchLimit => kSecMatchLimit,
        })
    }
}

fn accessible_constant(token: AccessibilityToken) -> CFString {
    unsafe {
        constant(match Accessibility::from_token(token) {
            Accessibility::WhenUnlocked => kSecAttrAccessibleWhenUnlocked,
            Accessibility::AfterFirstUnlock => kSecAttrAccessibleAfterFirstUnlock,
            Accessibility::Always => kSecAttrAccessibleAlways,
            Accessibility::PasscodeSetThisDeviceOnly => {
                kSecAttrAccessibleWhenPasscodeSetThisDeviceOnly
            }
            Accessibility::WhenUnlockedThisDeviceOnly => {
                kSecAttrAccessibleWhenUnlockedThisDeviceOnly
            }
            Accessibility::AfterFirstUnlockThisDeviceOnly => {
                kSecAttrAccessibleAfterFirstUnlockThisDeviceOnly
            }
            Accessibility::AlwaysThisDeviceOnly => kSecAttrAccessibleAlwaysThisDeviceOnly,
        })
    }
}

fn value_object(value: &AttrValue) -> CFType {
    match value {
        AttrValue::Class(ItemClass::GenericPassword) => unsafe {
            constant(kSecClassGenericPassword).as_CFType()
        },
        AttrValue::Text(text) => CFString::new(text).as_CFType(),
        AttrValue::Data(data) => CFData::from_buffer(data).as_CFType(),
        AttrValue::Accessible(token) => accessible_constant(*token).as_CFType(),
        AttrValue::Bool(true) => CFBoolean::true_value().as_CFType(),
        AttrValue::Bool(false) => CFBoolean::false_value().as_CFType(),
        AttrValue::Limit(MatchLimit::One) => unsafe { constant(kSecMatchLimitOne).as_CFType() },
    }
}

fn pairs(attributes: &Attributes) -> Vec<(CFString, CFType)> {
    attributes
        .iter()
        .map(|(key, value)| (key_constant(key), value_object(value)))
        .collect()
}

/// Replacement attributes for `SecItemUpdate`
fn dictionary(attributes: &Attributes) -> CFDictionary<CFString, CFType> {
    CFDictionary::from_CFType_pairs(&pairs(attributes))
}

/// Query or new item, pinned to the data protection keychain on macOS
fn request(attributes: &Attributes) -> CFDictionary<CFString, CFType> {
    #[allow(unused_mut)]
    let mut pairs = pairs(attributes);

    #[cfg(target_os = "macos")]
    pairs.push((
        unsafe { constant(kSecUseDataProtectionKeychain) },
        CFBoolean::true_value().as_CFType(),
    ));

    CFDictionary::from_CFType_pairs(&pairs)
}

/// Read back account and payload from a `SecItemCopyMatching` result
fn from_result(result: CFTypeRef, query: &Attributes) -> Attributes {
    let mut found = Attributes::new();
    if result.is_null() {
        return found;
    }

    let object = unsafe { CFType::wrap_under_create_rule(result) };
    let wants_attributes = query.flag(AttrKey::ReturnAttributes);

    if !wants_attributes {
        if let Some(data) = object.downcast::<CFData>() {
            found.insert(AttrKey::ValueData, AttrValue::Data(data.bytes().to_vec()));
        }
        return found;
    }

    let Some(dict) = object.downcast::<CFDictionary>() else {
        return found;
    };
    let dict: CFDictionary<CFString, CFType> =
        unsafe { CFDictionary::wrap_under_get_rule(dict.as_concrete_TypeRef()) };

    for key in [AttrKey::Account, AttrKey::Service] {
        if let Some(text) = dict
            .find(&key_constant(key))
            .and_then(|value| value.downcast::<CFString>())
        {
            found.insert(key, AttrValue::Text(text.to_string()));
        }
    }

    if let Some(data) = dict
        .find(&key_constant(AttrKey::ValueData))
        .and_then(|value| value.downcast::<CFData>())
    {
        found.insert(AttrKey::ValueData, AttrValue::Data(data.bytes().to_vec()));
    }

    found
}

fn status(code: OSStatus) -> Status {
    let status = Status::from_code(code);
    if let Status::Other(code) = status {
        let message = security_framework::base::Error::from_code(code).message();
        debug!("unmapped keychain status {}: {:?}", code, message);
    }
    status
}

impl SecureStore for AppleKeychainStore {
    fn name(&self) -> &'static str {
        "security-framework"
    }

    fn supports(&self, _accessibility: Accessibility) -> bool {
        true
    }

    fn add(&self, attributes: &Attributes) -> Status {
        let dict = request(attributes);
        status(unsafe { SecItemAdd(dict.as_concrete_TypeRef(), std::ptr::null_mut()) })
    }

    fn update(&self, query: &Attributes, changes: &Attributes) -> Status {
        let query = request(query);
        let changes = dictionary(changes);
        status(unsafe { SecItemUpdate(query.as_concrete_TypeRef(), changes.as_concrete_TypeRef()) })
    }

    fn delete(&self, query: &Attributes) -> Status {
        let dict = request(query);
        status(unsafe { SecItemDelete(dict.as_concrete_TypeRef()) })
    }

    fn copy_matching(&self, query: &Attributes) -> Result<Attributes, Status> {
        let dict = request(query);
        let mut result: CFTypeRef = std::ptr::null();
        let code = unsafe { SecItemCopyMatching(dict.as_concrete_TypeRef(), &mut result) };

        match status(code) {
            Status::Success => Ok(from_result(result, query)),
            failure => Err(failure),
        }
    }
}
