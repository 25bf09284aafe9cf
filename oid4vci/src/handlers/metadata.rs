//! # Metadata Endpoint
//!
//! The Credential Issuer Metadata contains information on the Credential
//! Issuer's technical capabilities, supported Credentials, and display
//! information. It is published at `/.well-known/openid-credential-issuer`
//! relative to the Credential Issuer Identifier.
//!
//! ```http
//! GET /.well-known/openid-credential-issuer HTTP/1.1
//!     Host: server.example.com
//! ```

use std::collections::BTreeMap;

use crate::endpoint;
use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::jose::Algorithm;
use crate::provider::{Metadata, Provider, Signer};
use crate::types::{
    CredentialConfiguration, CredentialDefinition, Display, IssuerMetadata, MetadataRequest,
    UNIVERSITY_CREDENTIAL,
};

/// Metadata request handler.
async fn metadata(
    issuer: &str, provider: &impl Provider, _: MetadataRequest,
) -> Result<IssuerMetadata> {
    let alg: Algorithm = Signer::algorithm(provider);
    let name = Metadata::display_name(provider);

    let configuration = CredentialConfiguration {
        format: "jwt_vc_json".to_string(),
        scope: Some(UNIVERSITY_CREDENTIAL.to_string()),
        credential_signing_alg_values_supported: vec![alg],
        credential_definition: CredentialDefinition {
            context: vec![
                "https://www.w3.org/2018/credentials/v1".to_string(),
                "https://www.w3.org/2018/credentials/examples/v1".to_string(),
            ],
            type_: vec!["VerifiableCredential".to_string(), UNIVERSITY_CREDENTIAL.to_string()],
        },
        display: vec![Display {
            name: format!("{name} Credential"),
            locale: Some("en-US".to_string()),
            background_color: Some("#1976d2".to_string()),
            text_color: Some("#FFFFFF".to_string()),
        }],
    };

    Ok(IssuerMetadata {
        credential_issuer: issuer.to_string(),
        credential_endpoint: format!("{issuer}{}", endpoint::CREDENTIAL),
        token_endpoint: format!("{issuer}{}", endpoint::TOKEN),
        jwks_uri: format!("{issuer}{}", endpoint::JWKS),
        authorization_servers: vec![issuer.to_string()],
        credential_configurations_supported: BTreeMap::from([(
            UNIVERSITY_CREDENTIAL.to_string(),
            configuration,
        )]),
        display: vec![Display { name, locale: Some("en-US".to_string()), ..Display::default() }],
    })
}

impl<P: Provider> Handler<IssuerMetadata, P> for Request<MetadataRequest> {
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<IssuerMetadata>>, Self::Error> {
        metadata(issuer, provider, self.body).await
    }
}

impl Body for MetadataRequest {}
