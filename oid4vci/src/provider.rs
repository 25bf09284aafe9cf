//! # Provider Traits
//!
//! This module defines the `Provider` trait and its associated traits, which
//! are implemented by library users to supply issuer settings, pending-offer
//! storage, signing, and ledger registration to the issuance flow.
//!
//! [`MemoryStore`](crate::store::MemoryStore) and
//! [`Keyring`](crate::keystore::Keyring) are ready-made implementations of
//! `StateStore` and `Signer` that a provider can delegate to.

use std::future::Future;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::jose::{Algorithm, PublicKeyJwk};
use crate::state::{Lifetimes, State};
use crate::types::Registration;

/// Issuer Provider trait.
pub trait Provider: Metadata + StateStore + Signer + Registrar + Clone {}

/// A blanket implementation for `Provider` trait so that any type implementing
/// the required super traits is considered a `Provider`.
impl<T> Provider for T where T: Metadata + StateStore + Signer + Registrar + Clone {}

/// Issuer settings that are not protocol constants.
pub trait Metadata: Send + Sync {
    /// Human-readable issuer name, used in credential `issuer` objects and
    /// metadata `display` entries.
    fn display_name(&self) -> String {
        "University".to_string()
    }

    /// Lifetimes for offers, access tokens, credentials, and nonces.
    fn lifetimes(&self) -> Lifetimes {
        Lifetimes::default()
    }
}

/// Keyed store for state shared between requests.
///
/// Implementations must be safe for concurrent use and provide per-key
/// atomicity: an expiry-triggered removal in `get` must not race a
/// concurrent `put`, `take`, or `purge` of the same key into a lost or
/// duplicated entry.
pub trait StateStore: Send + Sync {
    /// Store state under `key`. Keys are unique: storing over a live entry is
    /// an error.
    fn put<T: Serialize + Sync>(
        &self, key: &str, state: &State<T>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Retrieve unexpired state. Expired state is removed as a side effect
    /// and reported as `None`.
    fn get<T: DeserializeOwned>(
        &self, key: &str,
    ) -> impl Future<Output = Result<Option<State<T>>>> + Send;

    /// Atomically retrieve and remove unexpired state. At most one of any
    /// number of concurrent callers receives `Some`.
    fn take<T: DeserializeOwned>(
        &self, key: &str,
    ) -> impl Future<Output = Result<Option<State<T>>>> + Send;

    /// Remove state. Removing a missing key is not an error.
    fn purge(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Remove every expired entry, returning how many were removed.
    fn sweep(&self) -> impl Future<Output = Result<usize>> + Send;
}

/// Key provider used to sign access tokens and credentials.
pub trait Signer: Send + Sync {
    /// Sign `msg`, returning the raw (JWS-encoded) signature bytes.
    fn try_sign(&self, msg: &[u8]) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// The signing algorithm.
    fn algorithm(&self) -> Algorithm {
        Algorithm::ES256
    }

    /// Public half of the signing key. Its `kid` is referenced by every JWS
    /// the signer produces.
    fn public_jwk(&self) -> impl Future<Output = Result<PublicKeyJwk>> + Send;
}

/// Best-effort registration of issued offers with an external ledger.
///
/// Failures are logged by the caller and never affect the issuance flow, so
/// implementations should not block on slow back ends.
pub trait Registrar: Send + Sync {
    /// Register `record`, returning a transaction identifier.
    fn register(&self, record: &Registration) -> impl Future<Output = Result<String>> + Send;
}
