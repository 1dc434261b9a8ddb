// @fileoverview In-memory credential record
//
// An `Account` is one identifier plus an optional secret. It knows how to
// express itself as store attributes and how to rebuild itself from a
// lookup result; persistence is the store's job.

use std::fmt;

use crate::attributes::{AttrKey, AttrValue, Attributes, ItemClass};
use crate::error::{KeychainError, Result};
use crate::keychain::KeychainRef;

#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    /// Unique key within a service, e.g. a user name
    pub identifier: String,
    pub secret: Option<String>,
    keychain: Option<KeychainRef>,
}

impl Account {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: Some(secret.into()),
            keychain: None,
        }
    }

    /// Account carrying no secret material
    pub fn identifier_only(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: None,
            keychain: None,
        }
    }

    pub fn with_keychain(mut self, keychain: KeychainRef) -> Self {
        self.keychain = Some(keychain);
        self
    }

    /// The keychain this account was fetched from or bound to
    pub fn keychain(&self) -> Option<&KeychainRef> {
        self.keychain.as_ref()
    }

    pub fn set_secret(&mut self, secret: impl Into<String>) {
        self.secret = Some(secret.into());
    }

    pub fn is_valid(&self) -> bool {
        !self.identifier.is_empty()
    }

    /// Item attributes for this account. Performs no validation.
    pub fn attributes(&self) -> Attributes {
        let mut attributes = Attributes::new()
            .with(AttrKey::Class, AttrValue::Class(ItemClass::GenericPassword))
            .with(AttrKey::Account, AttrValue::Text(self.identifier.clone()));

        if let Some(secret) = &self.secret {
            attributes.insert(AttrKey::ValueData, AttrValue::Data(secret.as_bytes().to_vec()));
        }

        attributes
    }

    /// Rebuild an account from the mapping a lookup returned
    pub fn from_attributes(attributes: &Attributes) -> Result<Self> {
        let identifier = attributes
            .text(AttrKey::Account)
            .ok_or(KeychainError::MissingAttribute(AttrKey::Account))?
            .to_string();

        let secret = match attributes.data(AttrKey::ValueData) {
            Some(bytes) => Some(String::from_utf8(bytes.to_vec()).map_err(|source| {
                KeychainError::Decode {
                    identifier: identifier.clone(),
                    source,
                }
            })?),
            None => None,
        };

        Ok(Self {
            identifier,
            secret,
            keychain: None,
        })
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("identifier", &self.identifier)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("keychain", &self.keychain)
            .finish()
    }
}
