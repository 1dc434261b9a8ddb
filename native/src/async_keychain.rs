// @fileoverview Async wrapper around `Keychain`
//
// Store calls block, so each one runs on tokio's blocking pool. The wrapper
// holds nothing but the shared keychain.

use std::panic;
use std::sync::Arc;

use tokio::task;

use crate::account::Account;
use crate::error::Result;
use crate::keychain::Keychain;

#[derive(Debug, Clone)]
pub struct AsyncKeychain {
    inner: Arc<Keychain>,
}

impl AsyncKeychain {
    pub fn new(keychain: Keychain) -> Self {
        Self {
            inner: Arc::new(keychain),
        }
    }

    pub fn keychain(&self) -> &Keychain {
        &self.inner
    }

    pub async fn add(&self, account: Account) -> Result<bool> {
        self.run(move |keychain| keychain.add(&account)).await
    }

    pub async fn update(&self, account: Account) -> Result<bool> {
        self.run(move |keychain| keychain.update(&account)).await
    }

    pub async fn remove(&self, account: Account) -> Result<bool> {
        self.run(move |keychain| keychain.remove(&account)).await
    }

    pub async fn account_for(&self, identifier: impl Into<String>) -> Result<Option<Account>> {
        let identifier = identifier.into();
        self.run(move |keychain| keychain.account_for(&identifier))
            .await?
    }

    async fn run<T, F>(&self, call: F) -> Result<T>
    where
        F: FnOnce(&Keychain) -> T + Send + 'static,
        T: Send + 'static,
    {
        let keychain = Arc::clone(&self.inner);
        match task::spawn_blocking(move || call(keychain.as_ref())).await {
            Ok(value) => Ok(value),
            // Invalid accounts stay fatal on this side of the pool too.
            Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
            Err(err) => Err(err.into()),
        }
    }
}

impl From<Keychain> for AsyncKeychain {
    fn from(keychain: Keychain) -> Self {
        Self::new(keychain)
    }
}
