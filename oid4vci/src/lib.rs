//! An API for the issuance of Verifiable Credentials using the
//! pre-authorized code flow of [OpenID for Verifiable Credential Issuance].
//!
//! [OpenID for Verifiable Credential Issuance]: https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html
//!
//! The flow has three steps:
//!
//! 1. The issuer creates a Credential Offer for a claim set
//!    ([`CreateOfferRequest`]). The offer carries a single-use
//!    pre-authorized code.
//! 2. The wallet exchanges the code for an access token ([`TokenRequest`]).
//! 3. The wallet presents the access token to obtain a signed credential
//!    ([`CredentialRequest`]), consuming the code.
//!
//! Every request is processed by [`handle`], using a [`provider::Provider`]
//! supplied by the host for storage, signing, and ledger registration.

pub mod jose;
pub mod keystore;
pub mod params;
pub mod provider;
pub mod state;
pub mod store;
pub mod types;
pub mod w3c_vc;

mod error;
mod generate;
mod handlers;

pub use unicred_core::urlencode;

pub use self::error::Error;
pub use self::handlers::*;
pub use self::types::*;

/// Endpoint paths, relative to the issuer URL.
pub mod endpoint {
    /// Create Credential Offer.
    pub const CREDENTIAL_OFFER: &str = "/credential-offer";

    /// Token Endpoint.
    pub const TOKEN: &str = "/token";

    /// Credential Endpoint.
    pub const CREDENTIAL: &str = "/credential";

    /// Credential Issuer Metadata.
    pub const ISSUER_METADATA: &str = "/.well-known/openid-credential-issuer";

    /// Authorization Server Metadata.
    pub const SERVER_METADATA: &str = "/.well-known/oauth-authorization-server";

    /// JSON Web Key Set.
    pub const JWKS: &str = "/.well-known/jwks.json";
}
