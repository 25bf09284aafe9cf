//! # Credential Handler
//!
//! The Credential Endpoint issues a credential to the holder of a valid
//! access token. The claims come from the pending offer named by the code
//! embedded in the token, which is consumed: a code yields at most one
//! credential.
//!
//! See <https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html#name-credential-endpoint>

use anyhow::Context as _;
use chrono::Utc;

use crate::error::server;
use crate::generate;
use crate::handlers::{Body, CredentialHeaders, Error, Handler, Request, Response, Result};
use crate::jose::{self, JwtType};
use crate::provider::{Metadata, Provider, Signer, StateStore};
use crate::state::PendingOffer;
use crate::types::{AccessTokenClaims, CredentialRequest, CredentialResponse, UNIVERSITY_CREDENTIAL};
use crate::w3c_vc::VcClaims;

/// Credential request handler.
async fn credential(
    issuer: &str, provider: &impl Provider, request: Request<CredentialRequest, CredentialHeaders>,
) -> Result<CredentialResponse> {
    let token = verify_token(issuer, provider, &request.headers.authorization).await?;
    request.body.verify()?;

    let code = token.pre_auth_code;
    let Some(state) =
        StateStore::take::<PendingOffer>(provider, &code).await.context("retrieving state")?
    else {
        return Err(Error::CredentialDataNotFound(
            "credential data not found or expired".to_string(),
        ));
    };

    let lifetimes = Metadata::lifetimes(provider);
    let issuer_name = Metadata::display_name(provider);
    let claims = VcClaims::new(issuer, &issuer_name, &code, &state.body, lifetimes.credential);

    let credential = match jose::encode(JwtType::Jwt, &claims, provider).await {
        Ok(credential) => credential,
        Err(e) => {
            // put the offer back so the wallet can retry
            if let Err(restore) = StateStore::put(provider, &code, &state).await {
                tracing::error!("cannot restore offer after signing failure: {restore}");
            }
            return Err(server!("signing credential: {e}"));
        }
    };

    tracing::info!(jti = %claims.jti, "credential issued");

    Ok(CredentialResponse {
        credential,
        c_nonce: generate::nonce(),
        c_nonce_expires_in: lifetimes.c_nonce.num_seconds(),
    })
}

impl<P: Provider> Handler<CredentialResponse, P> for Request<CredentialRequest, CredentialHeaders> {
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<CredentialResponse>>, Self::Error> {
        credential(issuer, provider, self).await
    }
}

impl Body for CredentialRequest {}

impl CredentialRequest {
    fn verify(&self) -> Result<()> {
        tracing::debug!("credential::verify");

        let config_id =
            self.credential_configuration_id.as_deref().unwrap_or(UNIVERSITY_CREDENTIAL);
        if config_id != UNIVERSITY_CREDENTIAL {
            return Err(Error::UnsupportedCredentialType(format!(
                "unsupported credential_configuration_id: {config_id}"
            )));
        }
        Ok(())
    }
}

// Verify the bearer token's signature, issuer, audience, expiry, and scope.
async fn verify_token(
    issuer: &str, provider: &impl Provider, authorization: &str,
) -> Result<AccessTokenClaims> {
    let invalid_token = |msg: &str| Error::InvalidToken(msg.to_string());

    let Some((scheme, token)) = authorization.trim().split_once(' ') else {
        return Err(invalid_token("missing bearer token"));
    };
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(invalid_token("authorization header must use the Bearer scheme"));
    }

    let jwk = Signer::public_jwk(provider).await.context("getting public key")?;
    let jwt = jose::decode::<AccessTokenClaims>(token.trim(), &jwk)
        .map_err(|e| Error::InvalidToken(format!("invalid access token: {e}")))?;
    if jwt.header.typ != JwtType::AccessToken {
        return Err(invalid_token("not an access token"));
    }

    let claims = jwt.claims;
    if claims.iss != issuer || claims.aud != issuer {
        return Err(invalid_token("access token issued for another audience"));
    }
    if Utc::now().timestamp() >= claims.exp {
        return Err(invalid_token("access token expired"));
    }
    if !claims.allows_issuance() {
        return Err(invalid_token("access token does not grant credential issuance"));
    }

    Ok(claims)
}
