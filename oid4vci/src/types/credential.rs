use serde::{Deserialize, Serialize};

use crate::params::Params;

/// A Credential Request. The access token is carried in the `Authorization`
/// header; see [`CredentialHeaders`](crate::CredentialHeaders).
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialRequest {
    /// Identifies the requested credential configuration. Defaults to the
    /// issuer's sole configuration when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_configuration_id: Option<String>,
}

impl From<Params> for CredentialRequest {
    fn from(params: Params) -> Self {
        Self { credential_configuration_id: params.credential_configuration_id }
    }
}

/// The Credential Response.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialResponse {
    /// The issued credential as a signed JWT.
    pub credential: String,

    /// A fresh nonce for use in a subsequent proof of possession.
    pub c_nonce: String,

    /// Lifetime in seconds of the `c_nonce`.
    pub c_nonce_expires_in: i64,
}
