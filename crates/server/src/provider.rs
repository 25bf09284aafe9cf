//! # Issuer Provider
//!
//! The [`Provider`](unicred_oid4vci::provider::Provider) used by the server:
//! an in-memory offer store, the persisted signing key, and an HTTP ledger
//! registrar.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use unicred_oid4vci::jose::PublicKeyJwk;
use unicred_oid4vci::keystore::Keyring;
use unicred_oid4vci::provider::{Metadata, Registrar, Signer, StateStore};
use unicred_oid4vci::state::{Lifetimes, State};
use unicred_oid4vci::store::MemoryStore;
use unicred_oid4vci::types::Registration;

/// Provider backing the HTTP issuer.
#[derive(Clone, Debug)]
pub struct IssuerProvider {
    store: MemoryStore,
    keyring: Keyring,
    lifetimes: Lifetimes,
    display_name: String,
    registrar: HttpRegistrar,
}

impl IssuerProvider {
    /// Create a provider with an empty offer store.
    #[must_use]
    pub fn new(
        keyring: Keyring, lifetimes: Lifetimes, display_name: impl Into<String>,
        registrar: HttpRegistrar,
    ) -> Self {
        Self {
            store: MemoryStore::new(),
            keyring,
            lifetimes,
            display_name: display_name.into(),
            registrar,
        }
    }
}

impl Metadata for IssuerProvider {
    fn display_name(&self) -> String {
        self.display_name.clone()
    }

    fn lifetimes(&self) -> Lifetimes {
        self.lifetimes
    }
}

impl StateStore for IssuerProvider {
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

impl Signer for IssuerProvider {
    async fn try_sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        self.keyring.try_sign(msg).await
    }

    async fn public_jwk(&self) -> Result<PublicKeyJwk> {
        self.keyring.public_jwk().await
    }
}

impl Registrar for IssuerProvider {
    async fn register(&self, record: &Registration) -> Result<String> {
        self.registrar.register(record)
    }
}

/// Posts offer registrations to a ledger service.
///
/// Requests run on their own task so offer creation never waits on the
/// ledger. Without a URL, registrations are only logged.
#[derive(Clone, Debug)]
pub struct HttpRegistrar {
    client: reqwest::Client,
    url: Option<String>,
}

impl HttpRegistrar {
    /// Create a registrar posting to `url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building ledger client")?;
        Ok(Self { client, url })
    }

    // Returns a local reference for the registration. The ledger's own
    // transaction id is only logged, once the request completes.
    fn register(&self, record: &Registration) -> Result<String> {
        let reference = record.claims_hash.chars().take(16).collect::<String>();

        let Some(url) = self.url.clone() else {
            tracing::info!(
                subject_id = %record.subject_id,
                %reference,
                "ledger registration (log only)"
            );
            return Ok(reference);
        };

        let client = self.client.clone();
        let record = record.clone();
        let task_ref = reference.clone();
        tokio::spawn(async move {
            let result =
                client.post(&url).json(&record).send().await.and_then(|r| r.error_for_status());
            match result {
                Ok(resp) => tracing::debug!(
                    reference = %task_ref,
                    status = %resp.status(),
                    "offer registered with ledger"
                ),
                Err(e) => tracing::warn!(reference = %task_ref, "ledger registration failed: {e}"),
            }
        });

        Ok(reference)
    }
}
