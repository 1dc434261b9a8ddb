// @fileoverview OS credential store via the `keyring` crate
//
// Windows Credential Manager and the Linux Secret Service (fronted by the
// kernel keyring as a session cache) key entries by (service, user) and hold
// an opaque blob. Neither knows about lock-state policies, so only
// `WhenUnlocked` (released to the logged-in session) is accepted.
//
// The blob starts with a presence tag, so a record with no secret is stored
// as a single byte rather than as an empty secret, which Secret Service
// rejects.
//
// `add` reads the entry and then writes it. The backends offer no
// create-if-absent primitive, so two processes adding the same identifier at
// once can both see success, with the last write kept.

use keyring::Entry;
use log::warn;

use super::SecureStore;
use crate::accessibility::Accessibility;
use crate::attributes::{AttrKey, AttrValue, Attributes};
use crate::status::Status;

/// errSecInternalComponent
const ERR_SEC_INTERNAL_COMPONENT: i32 = -2070;

const TAG_NO_SECRET: u8 = 0x00;
const TAG_SECRET: u8 = 0x01;

#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    fn entry(query: &Attributes) -> Result<Entry, Status> {
        let (Some(service), Some(account)) =
            (query.text(AttrKey::Service), query.text(AttrKey::Account))
        else {
            return Err(Status::Param);
        };

        Entry::new(service, account).map_err(map_error)
    }
}

fn map_error(err: keyring::Error) -> Status {
    let status = match &err {
        keyring::Error::NoEntry => return Status::ItemNotFound,
        keyring::Error::NoStorageAccess(_) => Status::NotAvailable,
        keyring::Error::BadEncoding(_) => Status::Decode,
        keyring::Error::TooLong(_, _) | keyring::Error::Invalid(_, _) => Status::Param,
        _ => Status::Other(ERR_SEC_INTERNAL_COMPONENT),
    };
    warn!("credential store failure: {}", err);
    status
}

fn encode_payload(secret: Option<&[u8]>) -> Vec<u8> {
    match secret {
        Some(secret) => {
            let mut blob = Vec::with_capacity(secret.len() + 1);
            blob.push(TAG_SECRET);
            blob.extend_from_slice(secret);
            blob
        }
        None => vec![TAG_NO_SECRET],
    }
}

/// Split a stored blob back into the secret it carries, if any
fn decode_payload(mut blob: Vec<u8>) -> Result<Option<Vec<u8>>, Status> {
    match blob.first() {
        Some(&TAG_SECRET) => {
            blob.remove(0);
            Ok(Some(blob))
        }
        Some(&TAG_NO_SECRET) if blob.len() == 1 => Ok(None),
        _ => {
            warn!("credential store entry has no presence tag");
            Err(Status::Decode)
        }
    }
}

fn status_of(result: keyring::Result<()>) -> Status {
    match result {
        Ok(()) => Status::Success,
        Err(err) => map_error(err),
    }
}

impl SecureStore for KeyringStore {
    fn name(&self) -> &'static str {
        "credential-store"
    }

    fn supports(&self, accessibility: Accessibility) -> bool {
        accessibility == Accessibility::WhenUnlocked
    }

    fn add(&self, attributes: &Attributes) -> Status {
        let entry = match Self::entry(attributes) {
            Ok(entry) => entry,
            Err(status) => return status,
        };

        match entry.get_secret() {
            Ok(_) => Status::DuplicateItem,
            Err(keyring::Error::NoEntry) => {
                let payload = encode_payload(attributes.data(AttrKey::ValueData));
                status_of(entry.set_secret(&payload))
            }
            Err(err) => map_error(err),
        }
    }

    fn update(&self, query: &Attributes, changes: &Attributes) -> Status {
        // Entries cannot be renamed in place.
        if changes.text(AttrKey::Account) != query.text(AttrKey::Account)
            || changes.text(AttrKey::Service) != query.text(AttrKey::Service)
        {
            return Status::Param;
        }

        let entry = match Self::entry(query) {
            Ok(entry) => entry,
            Err(status) => return status,
        };

        if let Err(err) = entry.get_secret() {
            return map_error(err);
        }

        match changes.data(AttrKey::ValueData) {
            Some(secret) => status_of(entry.set_secret(&encode_payload(Some(secret)))),
            None => Status::Success,
        }
    }

    fn delete(&self, query: &Attributes) -> Status {
        match Self::entry(query) {
            Ok(entry) => status_of(entry.delete_credential()),
            Err(status) => status,
        }
    }

    fn copy_matching(&self, query: &Attributes) -> Result<Attributes, Status> {
        let entry = Self::entry(query)?;
        let secret = decode_payload(entry.get_secret().map_err(map_error)?)?;

        let mut found = Attributes::new();
        if query.flag(AttrKey::ReturnAttributes) {
            for key in [AttrKey::Service, AttrKey::Account] {
                if let Some(text) = query.text(key) {
                    found.insert(key, AttrValue::Text(text.to_string()));
                }
            }
        }
        if let (true, Some(secret)) = (query.flag(AttrKey::ReturnData), secret) {
            found.insert(AttrKey::ValueData, AttrValue::Data(secret));
        }

        Ok(found)
    }
}
