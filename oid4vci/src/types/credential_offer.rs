use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicred_core::urlencode;

use crate::types::UNIVERSITY_CREDENTIAL;

/// URI scheme wallets register to receive credential offers.
pub const OFFER_SCHEME: &str = "openid-credential-offer://";

/// Build a Create Offer request.
#[derive(Debug, Default)]
pub struct CreateOfferRequestBuilder<S> {
    subject_id: S,
    claims: BTreeMap<String, Value>,
    expires_in: Option<i64>,
    tx_code_required: bool,
}

/// No subject id is set.
#[doc(hidden)]
#[derive(Debug, Default)]
pub struct NoSubjectId;
/// Subject id is set.
#[doc(hidden)]
#[derive(Debug)]
pub struct SubjectId(String);

impl CreateOfferRequestBuilder<NoSubjectId> {
    /// Create a new `CreateOfferRequestBuilder`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify the claim owner (e.g. student id).
    #[must_use]
    pub fn subject_id(self, subject_id: impl Into<String>) -> CreateOfferRequestBuilder<SubjectId> {
        CreateOfferRequestBuilder {
            subject_id: SubjectId(subject_id.into()),
            claims: self.claims,
            expires_in: self.expires_in,
            tx_code_required: self.tx_code_required,
        }
    }
}

impl<S> CreateOfferRequestBuilder<S> {
    /// Add a credential subject claim.
    #[must_use]
    pub fn claim(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.insert(name.into(), Value::String(value.into()));
        self
    }

    /// Override the offer lifetime, in seconds.
    #[must_use]
    pub const fn expires_in(mut self, seconds: i64) -> Self {
        self.expires_in = Some(seconds);
        self
    }

    /// Specify whether a Transaction Code will be required by the token
    /// endpoint.
    #[must_use]
    pub const fn use_tx_code(mut self, tx_code_required: bool) -> Self {
        self.tx_code_required = tx_code_required;
        self
    }
}

impl CreateOfferRequestBuilder<SubjectId> {
    /// Build the Create Offer request.
    #[must_use]
    pub fn build(self) -> CreateOfferRequest {
        CreateOfferRequest {
            subject_id: self.subject_id.0,
            claims: self.claims,
            expires_in: self.expires_in,
            tx_code_required: self.tx_code_required,
        }
    }
}

/// Request a Credential Offer for a claim owner.
///
/// Every field other than the ones below is treated as a credential subject
/// claim:
///
/// ```json
/// {
///   "student_id": "s1",
///   "student_name": "Ada",
///   "course_name": "Intro",
///   "tx_code_required": true
/// }
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CreateOfferRequest {
    /// Identifies the claim owner. The credential subject identifier is
    /// derived from it.
    #[serde(default, rename = "student_id", alias = "subject_id")]
    pub subject_id: String,

    /// Credential subject claims. Scalar values are stored as strings.
    #[serde(flatten)]
    pub claims: BTreeMap<String, Value>,

    /// Offer lifetime in seconds, overriding the issuer's default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Specifies whether a Transaction Code is required by the `token`
    /// endpoint.
    #[serde(default)]
    pub tx_code_required: bool,
}

impl CreateOfferRequest {
    /// Create a new `CreateOfferRequestBuilder`.
    #[must_use]
    pub fn builder() -> CreateOfferRequestBuilder<NoSubjectId> {
        CreateOfferRequestBuilder::new()
    }
}

/// The response to a Create Offer request.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CreateOfferResponse {
    /// The offer as an `openid-credential-offer://` URI, suitable for a QR
    /// code.
    pub qr_url: String,

    /// The pre-authorized code, also carried in the offer's grant.
    pub pre_authorized_code: String,

    /// The Credential Offer object.
    pub offer: CredentialOffer,

    /// When the offer stops being redeemable.
    pub expires_at: DateTime<Utc>,

    /// Transaction code to pass to the End-User out of band.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_code: Option<String>,
}

/// A Credential Offer object that can be sent to a Wallet.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialOffer {
    /// The URL of the Credential Issuer.
    pub credential_issuer: String,

    /// Credentials offered to the Wallet, as keys into
    /// `credential_configurations_supported`.
    pub credential_configuration_ids: Vec<String>,

    /// Grants the issuer is prepared to process for this offer.
    pub grants: Grants,
}

impl CredentialOffer {
    /// Create an offer of the issuer's credential redeemable with `code`.
    #[must_use]
    pub fn pre_authorized(issuer: &str, code: &str, tx_code: Option<TxCode>) -> Self {
        Self {
            credential_issuer: issuer.to_string(),
            credential_configuration_ids: vec![UNIVERSITY_CREDENTIAL.to_string()],
            grants: Grants {
                pre_authorized_code: PreAuthorizedCodeGrant {
                    pre_authorized_code: code.to_string(),
                    tx_code,
                },
            },
        }
    }

    /// The offer as an `openid-credential-offer://?credential_offer=...`
    /// URI, with the offer serialized as compact, percent-encoded JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the offer cannot be serialized.
    pub fn to_uri(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Param<'a> {
            credential_offer: &'a CredentialOffer,
        }
        let qs = urlencode::encode(&Param { credential_offer: self })?;
        Ok(format!("{OFFER_SCHEME}?{qs}"))
    }
}

/// Grant Types the Credential Issuer is prepared to process.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Grants {
    /// Pre-authorized code grant.
    #[serde(rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code")]
    pub pre_authorized_code: PreAuthorizedCodeGrant,
}

/// The pre-authorized code grant.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PreAuthorizedCodeGrant {
    /// The code representing the issuer's authorization for the Wallet to
    /// obtain credentials.
    #[serde(rename = "pre-authorized_code")]
    pub pre_authorized_code: String,

    /// Present when the token request must carry a Transaction Code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_code: Option<TxCode>,
}

/// Describes the Transaction Code the Wallet should ask the End-User for.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TxCode {
    /// `numeric` or `text`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_mode: Option<String>,

    /// Length of the code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    /// Guidance for the End-User.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TxCode {
    /// A numeric code of `length` digits.
    #[must_use]
    pub fn numeric(length: usize) -> Self {
        Self { input_mode: Some("numeric".to_string()), length: Some(length), description: None }
    }
}
