//! # JWKS Endpoint
//!
//! Publishes the public half of the issuer's signing key. The `kid` of each
//! key matches the `kid` header of the tokens and credentials it signed.

use anyhow::Context as _;

use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::jose::Jwks;
use crate::provider::{Provider, Signer};
use crate::types::JwksRequest;

async fn jwks(provider: &impl Provider) -> Result<Jwks> {
    let jwk = Signer::public_jwk(provider).await.context("getting public key")?;
    Ok(Jwks { keys: vec![jwk] })
}

impl<P: Provider> Handler<Jwks, P> for Request<JwksRequest> {
    type Error = Error;

    async fn handle(self, _: &str, provider: &P) -> Result<impl Into<Response<Jwks>>, Self::Error> {
        jwks(provider).await
    }
}

impl Body for JwksRequest {}
