//! # State
//!
//! State is used to persist offer information between the steps of the
//! pre-authorized code flow: it is written when an offer is created, read
//! when the code is exchanged for a token, and consumed when the credential
//! is issued.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A stored value together with the time it stops being valid.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct State<T> {
    /// Body holds data relevant to the current state.
    pub body: T,

    /// Time state should expire.
    pub expires_at: DateTime<Utc>,
}

impl<T> State<T> {
    /// Wrap `body` so that it expires `ttl` from now.
    pub fn new(body: T, ttl: TimeDelta) -> Self {
        Self { body, expires_at: Utc::now() + ttl }
    }

    /// Determines whether state has expired. State is still valid at the
    /// instant of `expires_at`.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Time remaining before the state expires (zero once expired).
    #[must_use]
    pub fn remaining(&self) -> TimeDelta {
        (self.expires_at - Utc::now()).max(TimeDelta::zero())
    }
}

/// Claim data waiting to be redeemed by a wallet, keyed in the store by its
/// pre-authorized code.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PendingOffer {
    /// Identifies the claim owner (e.g. student id). The credential subject
    /// identifier is derived from it.
    pub subject_id: String,

    /// Credential subject attributes.
    pub claims: BTreeMap<String, String>,

    /// When the offer was created.
    pub created_at: DateTime<Utc>,

    /// Transaction code the wallet must present at the token endpoint, if
    /// the offer was created with one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_code: Option<String>,
}

/// Lifetimes applied to the artefacts produced by the issuance flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifetimes {
    /// How long an offer (and its pre-authorized code) stays redeemable.
    pub offer: TimeDelta,

    /// Upper bound on access token lifetime. Tokens never outlive the offer
    /// they were issued against.
    pub access: TimeDelta,

    /// Validity period of issued credentials.
    pub credential: TimeDelta,

    /// Advertised lifetime of the `c_nonce` returned with a credential.
    pub c_nonce: TimeDelta,
}

impl Default for Lifetimes {
    fn default() -> Self {
        Self {
            offer: TimeDelta::seconds(600),
            access: TimeDelta::seconds(600),
            credential: TimeDelta::days(365),
            c_nonce: TimeDelta::seconds(86_400),
        }
    }
}
