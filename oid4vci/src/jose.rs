//! # JOSE
//!
//! Compact JWS encoding and verification for the ES256 tokens the issuer
//! produces: access tokens and JWT-encoded Verifiable Credentials.
//!
//! Signing is delegated to a [`Signer`] so that key material never leaves
//! the key provider. Verification takes the issuer's public [`PublicKeyJwk`].

use std::fmt::{self, Display};

use anyhow::{Result, anyhow, bail};
use base64ct::{Base64UrlUnpadded, Encoding};
use p256::EncodedPoint;
use p256::ecdsa::signature::Verifier as _;
use p256::ecdsa::{Signature, VerifyingKey};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::provider::Signer;

/// Signing algorithms supported by the issuer.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum Algorithm {
    /// ECDSA using P-256 and SHA-256.
    #[default]
    ES256,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ES256 => write!(f, "ES256"),
        }
    }
}

/// The JWT `typ` header parameter.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum JwtType {
    /// General purpose JWT type, used for credentials.
    #[default]
    #[serde(rename = "JWT")]
    Jwt,

    /// OAuth 2.0 access token.
    #[serde(rename = "at+jwt")]
    AccessToken,
}

/// JOSE header.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Header {
    /// Signing algorithm.
    pub alg: Algorithm,

    /// Token type.
    pub typ: JwtType,

    /// Identifies the signing key.
    pub kid: String,
}

/// A decoded and verified JWT.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jwt<T> {
    /// JOSE header.
    pub header: Header,

    /// Token claims.
    pub claims: T,
}

/// Public P-256 key in JWK form.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublicKeyJwk {
    /// Key type. Always `EC`.
    pub kty: String,

    /// Curve. Always `P-256`.
    pub crv: String,

    /// Base64url-encoded x coordinate.
    pub x: String,

    /// Base64url-encoded y coordinate.
    pub y: String,

    /// Key identifier: the key's RFC 7638 thumbprint.
    pub kid: String,

    /// Intended use.
    #[serde(rename = "use")]
    pub use_: String,

    /// Algorithm the key is used with.
    pub alg: Algorithm,
}

impl PublicKeyJwk {
    /// Build a JWK from a verifying key. The `kid` is set to the key's
    /// thumbprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is the identity point.
    pub fn from_verifying_key(key: &VerifyingKey) -> Result<Self> {
        let point = key.to_encoded_point(false);
        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            bail!("verifying key has no affine coordinates");
        };

        let mut jwk = Self {
            kty: "EC".to_string(),
            crv: "P-256".to_string(),
            x: Base64UrlUnpadded::encode_string(x),
            y: Base64UrlUnpadded::encode_string(y),
            kid: String::new(),
            use_: "sig".to_string(),
            alg: Algorithm::ES256,
        };
        jwk.kid = jwk.thumbprint();
        Ok(jwk)
    }

    /// RFC 7638 thumbprint: base64url SHA-256 of the required members in
    /// lexicographic order.
    #[must_use]
    pub fn thumbprint(&self) -> String {
        let canonical = format!(
            r#"{{"crv":"{}","kty":"{}","x":"{}","y":"{}"}}"#,
            self.crv, self.kty, self.x, self.y
        );
        Base64UrlUnpadded::encode_string(&Sha256::digest(canonical.as_bytes()))
    }

    /// Convert to a verifying key.
    ///
    /// # Errors
    ///
    /// Returns an error if the JWK is not a valid P-256 public key.
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        if self.kty != "EC" || self.crv != "P-256" {
            bail!("unsupported key type {} {}", self.kty, self.crv);
        }
        let x = Base64UrlUnpadded::decode_vec(&self.x).map_err(|e| anyhow!("invalid x: {e}"))?;
        let y = Base64UrlUnpadded::decode_vec(&self.y).map_err(|e| anyhow!("invalid y: {e}"))?;
        if x.len() != 32 || y.len() != 32 {
            bail!("invalid coordinate length");
        }

        let point = EncodedPoint::from_affine_coordinates(
            p256::FieldBytes::from_slice(&x),
            p256::FieldBytes::from_slice(&y),
            false,
        );
        VerifyingKey::from_encoded_point(&point).map_err(|e| anyhow!("invalid public key: {e}"))
    }
}

/// JSON Web Key Set.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Jwks {
    /// Public keys.
    pub keys: Vec<PublicKeyJwk>,
}

/// Encode and sign `claims` as a compact JWS.
///
/// # Errors
///
/// Returns an error if the claims cannot be serialized or the signer fails.
pub async fn encode<T>(typ: JwtType, claims: &T, signer: &impl Signer) -> Result<String>
where
    T: Serialize + Sync,
{
    let jwk = signer.public_jwk().await?;
    let header = Header { alg: signer.algorithm(), typ, kid: jwk.kid };

    let header = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?);
    let payload = Base64UrlUnpadded::encode_string(&serde_json::to_vec(claims)?);
    let signature = signer.try_sign(format!("{header}.{payload}").as_bytes()).await?;

    Ok(format!("{header}.{payload}.{}", Base64UrlUnpadded::encode_string(&signature)))
}

/// Decode a compact JWS and verify its signature against `jwk`.
///
/// Only the signature, algorithm, and key id are checked here. Time-based and
/// audience claims are the caller's concern.
///
/// # Errors
///
/// Returns an error if the token is malformed, was signed with another key,
/// or fails signature verification.
pub fn decode<T: DeserializeOwned>(token: &str, jwk: &PublicKeyJwk) -> Result<Jwt<T>> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        bail!("token is not a compact JWS");
    };

    let header_bytes =
        Base64UrlUnpadded::decode_vec(header).map_err(|e| anyhow!("invalid header: {e}"))?;
    let decoded: Header = serde_json::from_slice(&header_bytes)?;
    if decoded.alg != jwk.alg {
        bail!("unexpected algorithm {}", decoded.alg);
    }
    if decoded.kid != jwk.kid {
        bail!("unknown key id");
    }

    let sig_bytes =
        Base64UrlUnpadded::decode_vec(signature).map_err(|e| anyhow!("invalid signature: {e}"))?;
    let sig = Signature::from_slice(&sig_bytes).map_err(|e| anyhow!("invalid signature: {e}"))?;
    jwk.verifying_key()?
        .verify(format!("{header}.{payload}").as_bytes(), &sig)
        .map_err(|_| anyhow!("signature verification failed"))?;

    let claims_bytes =
        Base64UrlUnpadded::decode_vec(payload).map_err(|e| anyhow!("invalid payload: {e}"))?;
    let claims = serde_json::from_slice(&claims_bytes)?;

    Ok(Jwt { header: decoded, claims })
}
