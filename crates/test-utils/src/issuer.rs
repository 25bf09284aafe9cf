use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use serde::Serialize;
use serde::de::DeserializeOwned;
use unicred_oid4vci::jose::PublicKeyJwk;
use unicred_oid4vci::keystore::Keyring;
use unicred_oid4vci::provider::{Metadata, Registrar, Signer, StateStore};
use unicred_oid4vci::state::{Lifetimes, State};
use unicred_oid4vci::store::MemoryStore;
use unicred_oid4vci::types::Registration;

#[derive(Clone)]
pub struct Issuer {
    store: MemoryStore,
    keyring: Keyring,
    lifetimes: Lifetimes,
    registrations: Arc<Mutex<Vec<Registration>>>,
    signing_fails: Arc<AtomicBool>,
    registrar_fails: Arc<AtomicBool>,
}

impl Default for Issuer {
    fn default() -> Self {
        Self::new()
    }
}

impl Issuer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            keyring: Keyring::ephemeral().expect("should generate key"),
            lifetimes: Lifetimes::default(),
            registrations: Arc::new(Mutex::new(Vec::new())),
            signing_fails: Arc::new(AtomicBool::new(false)),
            registrar_fails: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub const fn with_lifetimes(mut self, lifetimes: Lifetimes) -> Self {
        self.lifetimes = lifetimes;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Offers registered with the ledger so far.
    #[must_use]
    pub fn registrations(&self) -> Vec<Registration> {
        self.registrations.lock().expect("should lock").clone()
    }

    pub fn fail_signing(&self, fail: bool) {
        self.signing_fails.store(fail, Ordering::SeqCst);
    }

    pub fn fail_registrar(&self, fail: bool) {
        self.registrar_fails.store(fail, Ordering::SeqCst);
    }
}

impl Metadata for Issuer {
    fn display_name(&self) -> String {
        "Test University".to_string()
    }

    fn lifetimes(&self) -> Lifetimes {
        self.lifetimes
    }
}

impl StateStore for Issuer {
    async fn put<T: Serialize + Sync>(&self, key: &str, state: &State<T>) -> Result<()> {
        self.store.put(key, state).await
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<State<T>>> {
        self.store.get(key).await
    }

    async fn take<T: DeserializeOwned>(&self, key: &str) -> Result<Option<State<T>>> {
        self.store.take(key).await
    }

    async fn purge(&self, key: &str) -> Result<()> {
        self.store.purge(key).await
    }

    async fn sweep(&self) -> Result<usize> {
        self.store.sweep().await
    }
}

impl Signer for Issuer {
    async fn try_sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        if self.signing_fails.load(Ordering::SeqCst) {
            bail!("signer unavailable");
        }
        self.keyring.try_sign(msg).await
    }

    async fn public_jwk(&self) -> Result<PublicKeyJwk> {
        self.keyring.public_jwk().await
    }
}

impl Registrar for Issuer {
    async fn register(&self, record: &Registration) -> Result<String> {
        if self.registrar_fails.load(Ordering::SeqCst) {
            bail!("ledger unavailable");
        }
        let mut registrations = self.registrations.lock().expect("should lock");
        registrations.push(record.clone());
        Ok(format!("tx-{}", registrations.len()))
    }
}
