//! # Token Handler
//!
//! The Token Endpoint exchanges a pre-authorized code for an access token.
//! The access token is a signed JWT that embeds the code, binding it to
//! exactly one pending offer.
//!
//! The code is not consumed here: it stays redeemable for further token
//! requests until the credential is issued or the offer expires.
//!
//! ```http
//! POST /token HTTP/1.1
//!     Host: server.example.com
//!     Content-Type: application/x-www-form-urlencoded
//!
//!     grant_type=urn:ietf:params:oauth:grant-type:pre-authorized_code
//!     &pre-authorized_code=SplxlOBeZQQYbYS6WxSbIA
//!     &tx_code=493536
//! ```
//!
//! See <https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html#name-token-endpoint>

use anyhow::Context as _;
use chrono::Utc;

use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::jose::{self, JwtType};
use crate::provider::{Metadata, Provider, StateStore};
use crate::state::{PendingOffer, State};
use crate::types::{
    AccessTokenClaims, CREDENTIAL_SCOPE, PRE_AUTHORIZED_GRANT, TokenRequest, TokenResponse,
    TokenType,
};

/// Token request handler.
async fn token(
    issuer: &str, provider: &impl Provider, request: TokenRequest,
) -> Result<TokenResponse> {
    let state = request.verify(provider).await?;

    // tokens never outlive the offer
    let ttl = Metadata::lifetimes(provider).access.min(state.remaining());
    let now = Utc::now();

    let claims = AccessTokenClaims {
        iss: issuer.to_string(),
        sub: state.body.subject_id,
        aud: issuer.to_string(),
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
        pre_auth_code: request.pre_authorized_code,
        scope: CREDENTIAL_SCOPE.to_string(),
    };
    let access_token = jose::encode(JwtType::AccessToken, &claims, provider)
        .await
        .context("signing access token")?;

    Ok(TokenResponse {
        access_token,
        token_type: TokenType::Bearer,
        expires_in: ttl.num_seconds(),
        scope: CREDENTIAL_SCOPE.to_string(),
    })
}

impl<P: Provider> Handler<TokenResponse, P> for Request<TokenRequest> {
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<TokenResponse>>, Self::Error> {
        token(issuer, provider, self.body).await
    }
}

impl Body for TokenRequest {}

impl TokenRequest {
    // Verify the token request, returning the pending offer the code refers
    // to.
    async fn verify(&self, provider: &impl Provider) -> Result<State<PendingOffer>> {
        tracing::debug!("token::verify");

        if self.grant_type != PRE_AUTHORIZED_GRANT {
            return Err(Error::UnsupportedGrantType(format!(
                "unsupported grant_type: {}",
                self.grant_type
            )));
        }
        if self.pre_authorized_code.is_empty() {
            return Err(Error::InvalidRequest("missing pre-authorized_code".to_string()));
        }

        // unknown, expired, and consumed codes are indistinguishable
        let Some(state) = StateStore::get::<PendingOffer>(provider, &self.pre_authorized_code)
            .await
            .context("retrieving state")?
        else {
            return Err(Error::InvalidGrant("invalid or expired pre-authorized code".to_string()));
        };

        if let Some(expected) = &state.body.tx_code {
            if self.tx_code.as_ref() != Some(expected) {
                return Err(Error::InvalidGrant("invalid tx_code".to_string()));
            }
        }

        Ok(state)
    }
}
