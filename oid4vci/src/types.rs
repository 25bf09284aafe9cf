//! # `OpenID` for Verifiable Credential Issuance
//!
//! Request and response types for the pre-authorized code flow.

mod credential;
mod credential_offer;
mod metadata;
mod token;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use self::credential::*;
pub use self::credential_offer::*;
pub use self::metadata::*;
pub use self::token::*;

/// The sole credential configuration offered by the issuer.
pub const UNIVERSITY_CREDENTIAL: &str = "UniversityCredential";

/// Grant type identifier for the pre-authorized code flow.
pub const PRE_AUTHORIZED_GRANT: &str = "urn:ietf:params:oauth:grant-type:pre-authorized_code";

/// Scope granted to access tokens.
pub const CREDENTIAL_SCOPE: &str = "credential_issuance";

/// A record of a created offer, passed to the ledger registrar.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Registration {
    /// Claim owner id.
    pub subject_id: String,

    /// Claims that will be issued.
    pub claims: BTreeMap<String, String>,

    /// Hex-encoded SHA-256 of the claim set serialized as canonical JSON.
    pub claims_hash: String,
}
