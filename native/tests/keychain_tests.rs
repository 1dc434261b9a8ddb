use keychain_api::store::DeviceState;
use keychain_api::*;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

const SERVICE: &str = "com.secondgear.keychainapi.tests";
const DEFAULT_USER: &str = "justinw@me.com";

fn setup_test_environment() {
    INIT.call_once(|| {
        init_logging("debug");
    });
}

fn keychain_with(store: &Arc<MemoryStore>, service: &str, accessibility: Accessibility) -> Keychain {
    Keychain::new(service, accessibility, store.clone()).unwrap()
}

fn default_keychain() -> (Arc<MemoryStore>, Keychain) {
    setup_test_environment();
    let store = Arc::new(MemoryStore::new());
    let keychain = keychain_with(&store, SERVICE, Accessibility::WhenUnlocked);
    assert!(keychain.add(&Account::new(DEFAULT_USER, "lovesecretsexgod")));
    (store, keychain)
}

#[test]
fn test_concrete_lifecycle() {
    setup_test_environment();
    let store = Arc::new(MemoryStore::new());
    let keychain = keychain_with(&store, "ns.test", Accessibility::WhenUnlocked);

    assert!(keychain.add(&Account::new("alice", "pw1")));
    let fetched = keychain.account_for("alice").unwrap().unwrap();
    assert_eq!(fetched.secret.as_deref(), Some("pw1"));

    assert!(keychain.update(&Account::new("alice", "pw2")));
    let fetched = keychain.account_for("alice").unwrap().unwrap();
    assert_eq!(fetched.secret.as_deref(), Some("pw2"));

    assert!(keychain.remove(&fetched));
    assert!(keychain.account_for("alice").unwrap().is_none());
    assert!(store.is_empty());
}

#[test]
fn test_creating_new_account() {
    let (_store, keychain) = default_keychain();
    let account = Account::new("jdoe@keychain.io", "s3kr37");

    assert!(keychain.add(&account));
    assert!(keychain.remove(&account));
}

#[test]
fn test_fetching_existing_account() {
    let (_store, keychain) = default_keychain();
    let account = keychain.account_for(DEFAULT_USER).unwrap().unwrap();

    assert_eq!(account.identifier, DEFAULT_USER);
    assert_eq!(account.secret.as_deref(), Some("lovesecretsexgod"));
    assert!(keychain.owns(&account));
}

#[test]
fn test_updating_fetched_account() {
    let (_store, keychain) = default_keychain();
    let mut account = keychain.account_for(DEFAULT_USER).unwrap().unwrap();
    account.set_secret("newpassword");

    assert!(keychain.update(&account));
    let refetched = keychain.account_for(DEFAULT_USER).unwrap().unwrap();
    assert_eq!(refetched.secret, account.secret);
}

#[test]
fn test_round_trip_is_byte_exact() {
    let (_store, keychain) = default_keychain();
    let secrets = ["", " padded ", "ünïcödé", "日本語のパスワード", "emoji 🔐🗝️", "line\nbreak\ttab", "nul\0byte"];

    for (index, secret) in secrets.iter().enumerate() {
        let identifier = format!("user{}", index);
        assert!(keychain.add(&Account::new(identifier.clone(), *secret)));

        let fetched = keychain.account_for(&identifier).unwrap().unwrap();
        assert_eq!(fetched.secret.as_deref().map(str::as_bytes), Some(secret.as_bytes()));
    }
}

#[test]
fn test_duplicate_add_keeps_existing_secret() {
    let (_store, keychain) = default_keychain();

    assert!(!keychain.add(&Account::new(DEFAULT_USER, "intruder")));
    let account = keychain.account_for(DEFAULT_USER).unwrap().unwrap();
    assert_eq!(account.secret.as_deref(), Some("lovesecretsexgod"));
}

#[test]
fn test_removing_missing_account_succeeds() {
    let (store, keychain) = default_keychain();

    assert!(keychain.remove(&Account::identifier_only("nobody")));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_removing_twice_succeeds() {
    let (_store, keychain) = default_keychain();
    let account = Account::identifier_only(DEFAULT_USER);

    assert!(keychain.remove(&account));
    assert!(keychain.remove(&account));
    assert!(keychain.account_for(DEFAULT_USER).unwrap().is_none());
}

#[test]
fn test_updating_missing_account_creates_nothing() {
    let (store, keychain) = default_keychain();

    assert!(!keychain.update(&Account::new("ghost", "boo")));
    assert!(keychain.account_for("ghost").unwrap().is_none());
    assert_eq!(store.len(), 1);
}

#[test]
fn test_services_are_isolated() {
    setup_test_environment();
    let store = Arc::new(MemoryStore::new());
    let first = keychain_with(&store, "ns.first", Accessibility::WhenUnlocked);
    let second = keychain_with(&store, "ns.second", Accessibility::WhenUnlocked);
    let account = Account::new("alice", "pw1");

    assert!(first.add(&account));
    assert!(second.account_for("alice").unwrap().is_none());

    assert!(second.add(&Account::new("alice", "other")));
    assert!(second.remove(&account));
    assert_eq!(
        first.account_for("alice").unwrap().unwrap().secret.as_deref(),
        Some("pw1")
    );
}

#[test]
fn test_lookup_is_scoped_by_accessibility() {
    setup_test_environment();
    let store = Arc::new(MemoryStore::new());
    let unlocked = keychain_with(&store, SERVICE, Accessibility::WhenUnlocked);
    let always = keychain_with(&store, SERVICE, Accessibility::Always);

    assert!(unlocked.add(&Account::new("alice", "pw1")));
    assert!(always.account_for("alice").unwrap().is_none());
    // Uniqueness is per service and identifier, whatever the policy.
    assert!(!always.add(&Account::new("alice", "pw2")));
}

#[test]
fn test_locked_device_is_a_store_error_not_absence() {
    let (store, keychain) = default_keychain();
    store.set_device_state(DeviceState::Locked);

    let err = keychain.account_for(DEFAULT_USER).unwrap_err();
    assert_eq!(err.status(), Some(Status::InteractionNotAllowed));
    assert!(err.is_recoverable());
    assert!(!keychain.update(&Account::new(DEFAULT_USER, "new")));

    store.set_device_state(DeviceState::Unlocked);
    assert_eq!(
        keychain.account_for(DEFAULT_USER).unwrap().unwrap().secret.as_deref(),
        Some("lovesecretsexgod")
    );
}

#[test]
fn test_after_first_unlock_survives_locking() {
    setup_test_environment();
    let store = Arc::new(MemoryStore::new());
    let keychain = keychain_with(&store, SERVICE, Accessibility::AfterFirstUnlockThisDeviceOnly);
    assert!(keychain.add(&Account::new("daemon", "token")));

    store.set_device_state(DeviceState::Locked);
    assert!(keychain.account_for("daemon").unwrap().is_some());

    store.set_device_state(DeviceState::BeforeFirstUnlock);
    assert!(keychain.account_for("daemon").is_err());
}

#[test]
fn test_passcode_policy_fails_without_passcode() {
    setup_test_environment();
    let store = Arc::new(MemoryStore::new());
    store.set_passcode(false);
    let keychain = keychain_with(&store, SERVICE, Accessibility::PasscodeSetThisDeviceOnly);

    let err = keychain.try_add(&Account::new("alice", "pw1")).unwrap_err();
    assert_eq!(err.status(), Some(Status::AuthFailed));
}

#[test]
fn test_unsupported_policy_fails_construction() {
    setup_test_environment();
    let store = Arc::new(MemoryStore::new().without_support_for(Accessibility::PasscodeSetThisDeviceOnly));

    let result = Keychain::new(SERVICE, Accessibility::PasscodeSetThisDeviceOnly, store.clone());
    assert!(matches!(result, Err(KeychainError::UnsupportedAccessibility { .. })));
    assert!(Keychain::new(SERVICE, Accessibility::Always, store).is_ok());
}

#[test]
fn test_identifier_only_account_has_no_secret() {
    let (_store, keychain) = default_keychain();

    assert!(keychain.add(&Account::identifier_only("bare")));
    let fetched = keychain.account_for("bare").unwrap().unwrap();
    assert_eq!(fetched.identifier, "bare");
    assert!(fetched.secret.is_none());
}

#[test]
fn test_non_utf8_payload_is_a_decode_error() {
    setup_test_environment();
    let store = Arc::new(MemoryStore::new());
    let keychain = keychain_with(&store, SERVICE, Accessibility::WhenUnlocked);

    // Another writer put raw bytes under the same service.
    let raw = Account::identifier_only("binary")
        .attributes()
        .with(AttrKey::Service, AttrValue::Text(SERVICE.into()))
        .with(AttrKey::Accessible, AttrValue::Accessible(Accessibility::WhenUnlocked.token()))
        .with(AttrKey::ValueData, AttrValue::Data(vec![0xc3, 0x28]));
    assert!(store.add(&raw).is_success());

    let err = keychain.account_for("binary").unwrap_err();
    assert!(matches!(err, KeychainError::Decode { ref identifier, .. } if identifier == "binary"));
    assert!(!keychain.update(&Account::new("binary", "text")));
}

#[test]
#[should_panic(expected = "Can only add a valid account")]
fn test_adding_invalid_account_panics() {
    let (_store, keychain) = default_keychain();
    keychain.add(&Account::new("", "lovesecretsexgod"));
}

#[test]
fn test_keychain_is_shareable_across_threads() {
    let (_store, keychain) = default_keychain();
    let keychain = Arc::new(keychain);

    let handles: Vec<_> = (0..8)
        .map(|index| {
            let keychain = Arc::clone(&keychain);
            std::thread::spawn(move || keychain.add(&Account::new(format!("worker{}", index), "pw")))
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert!(keychain.contains("worker7").unwrap());
}

#[test]
fn test_config_opens_keychain() {
    setup_test_environment();
    let config = KeychainConfig::from_json(r#"{"service":"ns.config","accessibility":"always"}"#).unwrap();
    let keychain = config.open(Arc::new(MemoryStore::new())).unwrap();

    assert!(keychain.add(&Account::new("alice", "pw1")));
    let fetched = keychain.account_for("alice").unwrap().unwrap();
    assert_eq!(fetched.keychain().map(KeychainRef::accessibility), Some(Accessibility::Always));
}
