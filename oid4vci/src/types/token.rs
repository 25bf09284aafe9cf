use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::error::invalid;
use crate::params::Params;
use crate::types::{CREDENTIAL_SCOPE, PRE_AUTHORIZED_GRANT};

impl TokenRequest {
    /// Create a pre-authorized code token request.
    #[must_use]
    pub fn pre_authorized(code: impl Into<String>) -> Self {
        Self {
            grant_type: PRE_AUTHORIZED_GRANT.to_string(),
            pre_authorized_code: code.into(),
            tx_code: None,
        }
    }

    /// Add a transaction code.
    #[must_use]
    pub fn with_tx_code(mut self, tx_code: impl Into<String>) -> Self {
        self.tx_code = Some(tx_code.into());
        self
    }
}

/// A Token Request as defined in [RFC6749] with the Pre-Authorized Code
/// Flow extensions.
///
/// [RFC6749]: (https://www.rfc-editor.org/rfc/rfc6749.html)
#[derive(Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenRequest {
    /// Authorization grant type.
    pub grant_type: String,

    /// The code representing the authorization to obtain Credentials.
    #[serde(rename = "pre-authorized_code", alias = "pre_authorized_code")]
    pub pre_authorized_code: String,

    /// Transaction Code provided by the End-User, if one was required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_code: Option<String>,
}

// The code and transaction code redeem a credential, so neither is printed.
impl Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("pre_authorized_code", &"[redacted]")
            .field("tx_code", &self.tx_code.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl TryFrom<Params> for TokenRequest {
    type Error = crate::Error;

    fn try_from(params: Params) -> Result<Self, Self::Error> {
        let Some(grant_type) = params.grant_type else {
            return Err(invalid!("missing grant_type"));
        };
        let Some(pre_authorized_code) = params.pre_authorized_code else {
            return Err(invalid!("missing pre-authorized_code"));
        };
        Ok(Self { grant_type, pre_authorized_code, tx_code: params.tx_code })
    }
}

/// Token Response as defined in [RFC6749].
///
/// [RFC6749]: (https://www.rfc-editor.org/rfc/rfc6749.html)
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TokenResponse {
    /// An OAuth 2.0 Access Token that can subsequently be used to request one
    /// or more Credentials.
    pub access_token: String,

    /// The type of the token issued. Always `Bearer`.
    pub token_type: TokenType,

    /// The lifetime in seconds of the access token.
    pub expires_in: i64,

    /// The scope of the access token.
    pub scope: String,
}

/// Access token type.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum TokenType {
    /// Bearer token type as defined in [RFC6750].
    ///
    /// [RFC6750]: (https://www.rfc-editor.org/rfc/rfc6750.html)
    #[default]
    Bearer,
}

/// Claims carried by an access token. The embedded `pre_auth_code` binds the
/// token to exactly one pending offer.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// Issuer URL.
    pub iss: String,

    /// Claim owner id.
    pub sub: String,

    /// Audience: the issuer URL.
    pub aud: String,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Expiry (Unix seconds).
    pub exp: i64,

    /// The pre-authorized code the token was issued against.
    pub pre_auth_code: String,

    /// Granted scope.
    pub scope: String,
}

impl AccessTokenClaims {
    /// Whether the token grants credential issuance.
    #[must_use]
    pub fn allows_issuance(&self) -> bool {
        self.scope.split(' ').any(|s| s == CREDENTIAL_SCOPE)
    }
}
