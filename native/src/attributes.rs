// @fileoverview Attribute dictionaries exchanged with the secure store
//
// Every store call takes one or two of these mappings: item attributes for
// creation, a match predicate for lookups, updates and deletions, and a
// replacement mapping for modifications.

use std::collections::BTreeMap;
use std::fmt;

use crate::accessibility::AccessibilityToken;

/// Attribute keys understood by the store (`kSec*` constants)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttrKey {
    Class,
    Service,
    Account,
    Accessible,
    ValueData,
    ReturnData,
    ReturnAttributes,
    MatchLimit,
}

impl AttrKey {
    /// Keys that steer a search rather than describe an item
    pub fn is_search_control(self) -> bool {
        matches!(
            self,
            AttrKey::ReturnData | AttrKey::ReturnAttributes | AttrKey::MatchLimit
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemClass {
    GenericPassword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLimit {
    One,
}

#[derive(Clone, PartialEq, Eq)]
pub enum AttrValue {
    Class(ItemClass),
    Text(String),
    Data(Vec<u8>),
    Accessible(AccessibilityToken),
    Bool(bool),
    Limit(MatchLimit),
}

// Payload bytes never reach logs.
impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Class(class) => f.debug_tuple("Class").field(class).finish(),
            AttrValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            AttrValue::Data(data) => write!(f, "Data(<{} bytes>)", data.len()),
            AttrValue::Accessible(token) => f.debug_tuple("Accessible").field(token).finish(),
            AttrValue::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            AttrValue::Limit(limit) => f.debug_tuple("Limit").field(limit).finish(),
        }
    }
}

/// An ordered attribute mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: BTreeMap<AttrKey, AttrValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: AttrKey, value: AttrValue) -> Option<AttrValue> {
        self.entries.insert(key, value)
    }

    pub fn with(mut self, key: AttrKey, value: AttrValue) -> Self {
        self.entries.insert(key, value);
        self
    }

    pub fn without(mut self, key: AttrKey) -> Self {
        self.entries.remove(&key);
        self
    }

    pub fn remove(&mut self, key: AttrKey) -> Option<AttrValue> {
        self.entries.remove(&key)
    }

    pub fn get(&self, key: AttrKey) -> Option<&AttrValue> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: AttrKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn text(&self, key: AttrKey) -> Option<&str> {
        match self.entries.get(&key) {
            Some(AttrValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn data(&self, key: AttrKey) -> Option<&[u8]> {
        match self.entries.get(&key) {
            Some(AttrValue::Data(data)) => Some(data),
            _ => None,
        }
    }

    pub fn flag(&self, key: AttrKey) -> bool {
        matches!(self.entries.get(&key), Some(AttrValue::Bool(true)))
    }

    pub fn accessible(&self) -> Option<AccessibilityToken> {
        match self.entries.get(&AttrKey::Accessible) {
            Some(AttrValue::Accessible(token)) => Some(*token),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttrKey, &AttrValue)> {
        self.entries.iter().map(|(key, value)| (*key, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if every descriptive attribute of `predicate` equals ours
    pub fn matches(&self, predicate: &Attributes) -> bool {
        predicate
            .iter()
            .filter(|(key, _)| !key.is_search_control())
            .all(|(key, value)| self.get(key) == Some(value))
    }

    /// Apply a replacement mapping on top of these attributes
    pub fn merge(&mut self, changes: &Attributes) {
        for (key, value) in changes.iter() {
            self.entries.insert(key, value.clone());
        }
    }

    /// Copy of the mapping without payload or search keys, usable as a predicate
    pub fn predicate(&self) -> Attributes {
        Attributes {
            entries: self
                .entries
                .iter()
                .filter(|(key, _)| **key != AttrKey::ValueData && !key.is_search_control())
                .map(|(key, value)| (*key, value.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessibility::Accessibility;

    fn item() -> Attributes {
        Attributes::new()
            .with(AttrKey::Class, AttrValue::Class(ItemClass::GenericPassword))
            .with(AttrKey::Service, AttrValue::Text("svc".into()))
            .with(AttrKey::Account, AttrValue::Text("bob".into()))
            .with(AttrKey::ValueData, AttrValue::Data(b"hunter2".to_vec()))
    }

    #[test]
    fn test_predicate_drops_payload_and_controls() {
        let query = item()
            .with(AttrKey::ReturnData, AttrValue::Bool(true))
            .predicate();

        assert!(!query.contains(AttrKey::ValueData));
        assert!(!query.contains(AttrKey::ReturnData));
        assert_eq!(query.text(AttrKey::Account), Some("bob"));
        assert_eq!(query.len(), 3);
    }

    #[test]
    fn test_matches_ignores_search_controls() {
        let query = item()
            .predicate()
            .with(AttrKey::MatchLimit, AttrValue::Limit(MatchLimit::One));
        assert!(item().matches(&query));

        let other = query.with(AttrKey::Account, AttrValue::Text("eve".into()));
        assert!(!item().matches(&other));
    }

    #[test]
    fn test_matches_requires_every_predicate_key() {
        let query = item().predicate().with(
            AttrKey::Accessible,
            AttrValue::Accessible(Accessibility::Always.token()),
        );
        assert!(!item().matches(&query));
    }

    #[test]
    fn test_merge_replaces_values() {
        let mut stored = item();
        let changes =
            Attributes::new().with(AttrKey::ValueData, AttrValue::Data(b"swordfish".to_vec()));
        stored.merge(&changes);
        assert_eq!(stored.data(AttrKey::ValueData), Some(&b"swordfish"[..]));
        assert_eq!(stored.text(AttrKey::Account), Some("bob"));
    }

    #[test]
    fn test_debug_redacts_payload() {
        let rendered = format!("{:?}", item());
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<7 bytes>"));
    }
}
