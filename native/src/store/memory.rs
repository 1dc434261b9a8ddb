// @fileoverview In-process secure store
//
// Follows the item semantics of the platform keychain: one item per
// (class, service, account), predicate matching on descriptive attributes,
// and reads gated by each item's accessibility policy against the simulated
// device lock state. Nothing is persisted beyond the process.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use super::SecureStore;
use crate::accessibility::Accessibility;
use crate::attributes::{AttrKey, AttrValue, Attributes};
use crate::status::Status;

/// Simulated lock state of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceState {
    #[default]
    Unlocked,
    /// Locked, but unlocked at least once since boot
    Locked,
    /// Booted and never unlocked
    BeforeFirstUnlock,
}

#[derive(Debug)]
struct Inner {
    items: Vec<Attributes>,
    device_state: DeviceState,
    passcode_set: bool,
}

#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    unsupported: HashSet<Accessibility>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Unlocked device with a passcode set; every policy supported
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: Vec::new(),
                device_state: DeviceState::Unlocked,
                passcode_set: true,
            }),
            unsupported: HashSet::new(),
        }
    }

    /// Model a platform that lacks `policy`
    pub fn without_support_for(mut self, policy: Accessibility) -> Self {
        self.unsupported.insert(policy);
        self
    }

    pub fn set_device_state(&self, state: DeviceState) {
        self.lock().device_state = state;
    }

    pub fn set_passcode(&self, passcode_set: bool) {
        self.lock().passcode_set = passcode_set;
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn readable(&self, item: &Attributes) -> bool {
        let policy = match item.accessible() {
            Some(token) => Accessibility::from_token(token),
            None => Accessibility::default(),
        };

        if policy.requires_unlock() {
            self.device_state == DeviceState::Unlocked
        } else if policy.requires_first_unlock() {
            self.device_state != DeviceState::BeforeFirstUnlock
        } else {
            true
        }
    }

    fn collides(&self, candidate: &Attributes, skip: Option<usize>) -> bool {
        self.items.iter().enumerate().any(|(index, item)| {
            Some(index) != skip
                && [AttrKey::Class, AttrKey::Service, AttrKey::Account]
                    .into_iter()
                    .all(|key| item.get(key) == candidate.get(key))
        })
    }
}

fn well_formed(query: &Attributes) -> bool {
    query.contains(AttrKey::Class)
}

impl SecureStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn supports(&self, accessibility: Accessibility) -> bool {
        !self.unsupported.contains(&accessibility)
    }

    fn add(&self, attributes: &Attributes) -> Status {
        if !well_formed(attributes) || attributes.text(AttrKey::Account).is_none() {
            return Status::Param;
        }

        let mut inner = self.lock();

        let requires_passcode = attributes
            .accessible()
            .map(Accessibility::from_token)
            .is_some_and(Accessibility::requires_passcode);
        if requires_passcode && !inner.passcode_set {
            return Status::AuthFailed;
        }

        if inner.collides(attributes, None) {
            return Status::DuplicateItem;
        }

        inner.items.push(stored_form(attributes));
        debug!("memory store holds {} items", inner.items.len());
        Status::Success
    }

    fn update(&self, query: &Attributes, changes: &Attributes) -> Status {
        if !well_formed(query) || changes.contains(AttrKey::Class) {
            return Status::Param;
        }

        let mut inner = self.lock();
        let matched: Vec<usize> = inner
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.matches(query))
            .map(|(index, _)| index)
            .collect();

        if matched.is_empty() {
            return Status::ItemNotFound;
        }

        for &index in &matched {
            if !inner.readable(&inner.items[index]) {
                return Status::InteractionNotAllowed;
            }
            let mut updated = inner.items[index].clone();
            updated.merge(changes);
            if inner.collides(&updated, Some(index)) {
                return Status::DuplicateItem;
            }
        }

        for index in matched {
            inner.items[index].merge(changes);
        }
        Status::Success
    }

    fn delete(&self, query: &Attributes) -> Status {
        if !well_formed(query) {
            return Status::Param;
        }

        let mut inner = self.lock();
        let before = inner.items.len();
        inner.items.retain(|item| !item.matches(query));

        if inner.items.len() == before {
            Status::ItemNotFound
        } else {
            Status::Success
        }
    }

    fn copy_matching(&self, query: &Attributes) -> Result<Attributes, Status> {
        if !well_formed(query) {
            return Err(Status::Param);
        }

        let inner = self.lock();
        let item = inner
            .items
            .iter()
            .find(|item| item.matches(query))
            .ok_or(Status::ItemNotFound)?;

        if !inner.readable(item) {
            return Err(Status::InteractionNotAllowed);
        }

        let mut result = if query.flag(AttrKey::ReturnAttributes) {
            item.predicate()
        } else {
            Attributes::new()
        };

        if query.flag(AttrKey::ReturnData) {
            if let Some(data) = item.data(AttrKey::ValueData) {
                result.insert(AttrKey::ValueData, AttrValue::Data(data.to_vec()));
            }
        }

        Ok(result)
    }
}

fn stored_form(attributes: &Attributes) -> Attributes {
    attributes
        .iter()
        .filter(|(key, _)| !key.is_search_control())
        .fold(Attributes::new(), |stored, (key, value)| stored.with(key, value.clone()))
}
