use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::jose::Algorithm;

/// Request to retrieve the Credential Issuer's configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct MetadataRequest;

/// Credential Issuer Metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct IssuerMetadata {
    /// The Credential Issuer's identifier.
    pub credential_issuer: String,

    /// URL of the Credential Endpoint.
    pub credential_endpoint: String,

    /// URL of the Token Endpoint.
    pub token_endpoint: String,

    /// URL of the issuer's JSON Web Key Set.
    pub jwks_uri: String,

    /// Authorization servers trusted by the issuer.
    pub authorization_servers: Vec<String>,

    /// Credentials the issuer can issue, keyed by configuration id.
    pub credential_configurations_supported: BTreeMap<String, CredentialConfiguration>,

    /// Display properties of the issuer.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub display: Vec<Display>,
}

/// A supported credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialConfiguration {
    /// Credential format.
    pub format: String,

    /// Scope value a wallet can use to request the credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Algorithms the issuer signs the credential with.
    pub credential_signing_alg_values_supported: Vec<Algorithm>,

    /// W3C credential definition.
    pub credential_definition: CredentialDefinition,

    /// Display properties of the credential.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub display: Vec<Display>,
}

/// Type and context of a `jwt_vc_json` credential.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialDefinition {
    /// JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// Credential types.
    #[serde(rename = "type")]
    pub type_: Vec<String>,
}

/// Display properties.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Display {
    /// Display name.
    pub name: String,

    /// Language tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Background color (CSS value).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,

    /// Text color (CSS value).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

/// Request to retrieve the Authorization Server's configuration.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ServerRequest;

/// OAuth 2.0 Authorization Server Metadata ([RFC8414]).
///
/// [RFC8414]: (https://www.rfc-editor.org/rfc/rfc8414.html)
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServerMetadata {
    /// The authorization server's issuer identifier.
    pub issuer: String,

    /// URL of the Token Endpoint.
    pub token_endpoint: String,

    /// URL of the server's JSON Web Key Set.
    pub jwks_uri: String,

    /// Supported grant types.
    pub grant_types_supported: Vec<String>,

    /// Client authentication methods accepted at the token endpoint.
    pub token_endpoint_auth_methods_supported: Vec<String>,

    /// Whether a wallet can redeem a pre-authorized code without
    /// authenticating.
    #[serde(rename = "pre-authorized_grant_anonymous_access_supported")]
    pub pre_authorized_grant_anonymous_access_supported: bool,
}

/// Request to retrieve the issuer's public keys.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct JwksRequest;

