//! # Endpoint
//!
//! `handle` is the entry point for issuance requests. Requests are routed to
//! the appropriate handler for processing, returning a response that can be
//! serialized to a JSON object.

mod create_offer;
mod credential;
mod jwks;
mod metadata;
mod server;
mod token;

use std::fmt::{self, Debug};

use http::HeaderMap;
use http::header::AUTHORIZATION;
use tracing::instrument;
pub use unicred_core::api::{Body, Handler, Headers, NoHeaders, Request, Response};

pub use crate::error::Error;
use crate::provider::Provider;

/// Result type for `OpenID` for Verifiable Credential Issuance.
pub type Result<T, E = Error> = anyhow::Result<T, E>;

/// Handle incoming messages.
///
/// # Errors
///
/// This method can fail for a number of reasons related to the incoming
/// message's viability. Expected failures include an unknown or expired
/// pre-authorized code, an invalid access token, and invalid message content.
///
/// Implementers should look to the Error type and description for more
/// information on the reason for failure.
#[instrument(level = "debug", skip(request, provider))]
pub async fn handle<B, H, P, U>(
    issuer: &str, request: impl Into<Request<B, H>> + Debug, provider: &P,
) -> Result<Response<U>>
where
    B: Body,
    H: Headers,
    P: Provider,
    Request<B, H>: Handler<U, P, Error = Error>,
{
    let request: Request<B, H> = request.into();
    Ok(request.handle(issuer, provider).await?.into())
}

/// Credential request headers.
pub type CredentialHeaders = AuthorizationHeader;

/// An authorization-only header for use by handlers that solely require
/// authorization.
#[derive(Clone, Default)]
pub struct AuthorizationHeader {
    /// The authorization header (`Bearer <access token>`).
    pub authorization: String,
}

impl AuthorizationHeader {
    /// Header carrying `token` as a bearer token.
    #[must_use]
    pub fn bearer(token: &str) -> Self {
        Self { authorization: format!("Bearer {token}") }
    }
}

// Only the scheme is printed: the credential is a live bearer token.
impl Debug for AuthorizationHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = self.authorization.split_once(' ').map_or("", |(scheme, _)| scheme);
        f.debug_struct("AuthorizationHeader")
            .field("authorization", &format_args!("{scheme} [redacted]"))
            .finish()
    }
}

impl From<&HeaderMap> for AuthorizationHeader {
    fn from(headers: &HeaderMap) -> Self {
        let authorization = headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Self { authorization }
    }
}

impl Headers for AuthorizationHeader {}
