// @fileoverview Keychain facade
//
// A `Keychain` is bound to one service and one accessibility policy. Each
// operation stamps those onto the account's attributes and issues a single
// call against the backing store.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::accessibility::Accessibility;
use crate::account::Account;
use crate::attributes::{AttrKey, AttrValue, Attributes, MatchLimit};
use crate::error::{KeychainError, Result};
use crate::status::Status;
use crate::store::SecureStore;

/// Non-owning handle naming the keychain an account belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeychainRef {
    service: String,
    accessibility: Accessibility,
}

impl KeychainRef {
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn accessibility(&self) -> Accessibility {
        self.accessibility
    }
}

#[derive(Clone)]
pub struct Keychain {
    service: String,
    accessibility: Accessibility,
    store: Arc<dyn SecureStore>,
}

impl fmt::Debug for Keychain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keychain")
            .field("service", &self.service)
            .field("accessibility", &self.accessibility)
            .field("store", &self.store.name())
            .finish()
    }
}

impl Keychain {
    /// Bind a keychain to `service` with the given policy
    ///
    /// Fails if the store cannot honour `accessibility`; a weaker policy is
    /// never substituted.
    pub fn new(
        service: impl Into<String>,
        accessibility: Accessibility,
        store: Arc<dyn SecureStore>,
    ) -> Result<Self> {
        if !store.supports(accessibility) {
            return Err(KeychainError::UnsupportedAccessibility {
                policy: accessibility,
                backend: store.name(),
            });
        }

        Ok(Self {
            service: service.into(),
            accessibility,
            store,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn accessibility(&self) -> Accessibility {
        self.accessibility
    }

    pub fn reference(&self) -> KeychainRef {
        KeychainRef {
            service: self.service.clone(),
            accessibility: self.accessibility,
        }
    }

    /// Whether `account` was produced by or bound to this keychain
    pub fn owns(&self, account: &Account) -> bool {
        account
            .keychain()
            .is_some_and(|keychain| *keychain == self.reference())
    }

    /// Store a new account. Returns false if the store refused it, e.g. when
    /// the identifier already exists.
    ///
    /// # Panics
    ///
    /// If `account` is not valid.
    pub fn add(&self, account: &Account) -> bool {
        self.try_add(account).is_ok()
    }

    /// Replace the stored secret of an existing account
    ///
    /// # Panics
    ///
    /// If `account` is not valid.
    pub fn update(&self, account: &Account) -> bool {
        self.try_update(account).is_ok()
    }

    /// Delete an account. Deleting an identifier that is not stored succeeds.
    pub fn remove(&self, account: &Account) -> bool {
        self.try_remove(account).is_ok()
    }

    /// # Panics
    ///
    /// If `account` is not valid.
    pub fn try_add(&self, account: &Account) -> Result<()> {
        assert!(account.is_valid(), "Can only add a valid account to keychain");

        let attributes = self.stamp(account.attributes());
        debug!("adding `{}` to {}", account.identifier, self.service);
        self.check("add", &account.identifier, self.store.add(&attributes))
    }

    /// # Panics
    ///
    /// If `account` is not valid.
    pub fn try_update(&self, account: &Account) -> Result<()> {
        assert!(account.is_valid(), "Can only update a valid account in keychain");

        let existing = match self.account_for(&account.identifier) {
            Ok(Some(existing)) => existing,
            Ok(None) => {
                debug!("not updating `{}`: no such account", account.identifier);
                return Err(KeychainError::NotFound);
            }
            Err(err) => {
                warn!("lookup before update of `{}` failed: {}", account.identifier, err);
                return Err(err);
            }
        };

        let query = self.stamp(existing.attributes()).predicate();
        let changes = self.stamp(account.attributes()).without(AttrKey::Class);
        debug!("updating `{}` in {}", account.identifier, self.service);
        self.check(
            "update",
            &account.identifier,
            self.store.update(&query, &changes),
        )
    }

    pub fn try_remove(&self, account: &Account) -> Result<()> {
        let query = self.stamp(account.attributes()).predicate();
        debug!("removing `{}` from {}", account.identifier, self.service);

        match self.store.delete(&query) {
            Status::ItemNotFound => Ok(()),
            status => self.check("remove", &account.identifier, status),
        }
    }

    /// Fetch the stored account for `identifier`
    ///
    /// Returns `Ok(None)` if nothing is stored under that identifier.
    pub fn account_for(&self, identifier: &str) -> Result<Option<Account>> {
        let query = self
            .lookup(identifier)
            .with(AttrKey::ReturnData, AttrValue::Bool(true))
            .with(AttrKey::ReturnAttributes, AttrValue::Bool(true));

        match self.store.copy_matching(&query) {
            Ok(found) => {
                let account = Account::from_attributes(&found)?.with_keychain(self.reference());
                Ok(Some(account))
            }
            Err(Status::ItemNotFound) => Ok(None),
            Err(status) => {
                warn!("lookup of `{}` in {} failed: {}", identifier, self.service, status);
                Err(KeychainError::Store(status))
            }
        }
    }

    /// Whether an account is stored under `identifier`, without reading its secret
    pub fn contains(&self, identifier: &str) -> Result<bool> {
        match self.store.copy_matching(&self.lookup(identifier)) {
            Ok(_) => Ok(true),
            Err(Status::ItemNotFound) => Ok(false),
            Err(status) => Err(KeychainError::Store(status)),
        }
    }

    fn lookup(&self, identifier: &str) -> Attributes {
        self.stamp(Account::identifier_only(identifier).attributes())
            .with(AttrKey::MatchLimit, AttrValue::Limit(MatchLimit::One))
    }

    /// Scope an account mapping to this keychain's service and policy
    fn stamp(&self, attributes: Attributes) -> Attributes {
        attributes
            .with(AttrKey::Service, AttrValue::Text(self.service.clone()))
            .with(
                AttrKey::Accessible,
                AttrValue::Accessible(self.accessibility.token()),
            )
    }

    fn check(&self, operation: &str, identifier: &str, status: Status) -> Result<()> {
        if status.is_success() {
            return Ok(());
        }

        warn!(
            "{} of `{}` in {} failed: {}",
            operation, identifier, self.service, status
        );
        Err(status.into())
    }
}
