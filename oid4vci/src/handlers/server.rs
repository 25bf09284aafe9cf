//! # Authorization Server Metadata Endpoint
//!
//! The metadata for an authorization server is retrieved from a well-known
//! location as a JSON [RFC8414] document, which declares its endpoint
//! locations and authorization server capabilities. The issuer acts as its
//! own authorization server, so the document lives at
//! `/.well-known/oauth-authorization-server` relative to the issuer URL.
//!
//! [RFC8414]: (https://www.rfc-editor.org/rfc/rfc8414.html)

use crate::endpoint;
use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::Provider;
use crate::types::{PRE_AUTHORIZED_GRANT, ServerMetadata, ServerRequest};

/// OAuth server metadata request handler.
async fn metadata(issuer: &str, _: &impl Provider, _: ServerRequest) -> Result<ServerMetadata> {
    Ok(ServerMetadata {
        issuer: issuer.to_string(),
        token_endpoint: format!("{issuer}{}", endpoint::TOKEN),
        jwks_uri: format!("{issuer}{}", endpoint::JWKS),
        grant_types_supported: vec![PRE_AUTHORIZED_GRANT.to_string()],
        token_endpoint_auth_methods_supported: vec!["none".to_string()],
        pre_authorized_grant_anonymous_access_supported: true,
    })
}

impl<P: Provider> Handler<ServerMetadata, P> for Request<ServerRequest> {
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<ServerMetadata>>, Self::Error> {
        metadata(issuer, provider, self.body).await
    }
}

impl Body for ServerRequest {}
