//! # W3C Verifiable Credentials
//!
//! Payload of a `jwt_vc_json` credential (W3C VC Data Model 1.1 encoded as a
//! JWT) and the identifiers it carries.

use std::collections::BTreeMap;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use unicred_core::urlencode;

use crate::state::PendingOffer;
use crate::types::UNIVERSITY_CREDENTIAL;

const BASE_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
const EXAMPLES_CONTEXT: &str = "https://www.w3.org/2018/credentials/examples/v1";

/// JWT claims of an issued credential.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VcClaims {
    /// Issuer URL.
    pub iss: String,

    /// Credential subject identifier.
    pub sub: String,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Not before (Unix seconds).
    pub nbf: i64,

    /// Expiry (Unix seconds).
    pub exp: i64,

    /// Credential identifier.
    pub jti: String,

    /// The credential.
    pub vc: VerifiableCredential,
}

/// A W3C Verifiable Credential.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// Credential types.
    #[serde(rename = "type")]
    pub type_: Vec<String>,

    /// Credential identifier.
    pub id: String,

    /// The issuing institution.
    pub issuer: Issuer,

    /// When the credential was issued.
    pub issuance_date: DateTime<Utc>,

    /// When the credential stops being valid.
    pub expiration_date: DateTime<Utc>,

    /// Claims about the subject, including its `id`.
    pub credential_subject: BTreeMap<String, String>,
}

/// Credential issuer.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Issuer {
    /// Issuer URL.
    pub id: String,

    /// Display name.
    pub name: String,
}

impl VcClaims {
    /// Build the credential for a consumed offer.
    #[must_use]
    pub fn new(
        issuer: &str, issuer_name: &str, code: &str, offer: &PendingOffer, ttl: TimeDelta,
    ) -> Self {
        let issued = Utc::now().trunc_subsecs(0);
        let expires = issued + ttl;
        let subject = did_web(issuer, &offer.subject_id);
        let id = credential_id(code);

        let mut credential_subject = offer.claims.clone();
        credential_subject.insert("student_id".to_string(), offer.subject_id.clone());
        credential_subject.insert("id".to_string(), subject.clone());

        Self {
            iss: issuer.to_string(),
            sub: subject,
            iat: issued.timestamp(),
            nbf: issued.timestamp(),
            exp: expires.timestamp(),
            jti: id.clone(),
            vc: VerifiableCredential {
                context: vec![BASE_CONTEXT.to_string(), EXAMPLES_CONTEXT.to_string()],
                type_: vec!["VerifiableCredential".to_string(), UNIVERSITY_CREDENTIAL.to_string()],
                id,
                issuer: Issuer { id: issuer.to_string(), name: issuer_name.to_string() },
                issuance_date: issued,
                expiration_date: expires,
                credential_subject,
            },
        }
    }
}

/// Credential identifier derived from the pre-authorized code. The code
/// itself cannot be recovered from it.
#[must_use]
pub fn credential_id(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    format!("urn:credential:{}", Base64UrlUnpadded::encode_string(&digest))
}

/// A `did:web` subject identifier under the issuer's domain, with the owner
/// id as fragment.
///
/// The port separator is encoded as `%3A` and path segments are joined with
/// `:`, so `https://uni.example:8443/vc` and owner `s 1` give
/// `did:web:uni.example%3A8443:vc#s%201`.
#[must_use]
pub fn did_web(issuer: &str, owner: &str) -> String {
    let rest = issuer
        .strip_prefix("https://")
        .or_else(|| issuer.strip_prefix("http://"))
        .unwrap_or(issuer);
    let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));

    let mut did = format!("did:web:{}", authority.replace(':', "%3A"));
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        did.push(':');
        did.push_str(segment);
    }
    format!("{did}#{}", urlencode::escape(owner))
}
