//! # Create Offer Handler
//!
//! The `create_offer` handler records a claim set against a fresh
//! pre-authorized code and returns a Credential Offer for use in invoking
//! the issuance flow with a wallet.
//!
//! See <https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html#name-credential-offer>

use std::collections::BTreeMap;

use anyhow::Context as _;
use chrono::{TimeDelta, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::invalid;
use crate::generate;
use crate::handlers::{Body, Error, Handler, Request, Response, Result};
use crate::provider::{Metadata, Provider, Registrar, StateStore};
use crate::state::{PendingOffer, State};
use crate::types::{CreateOfferRequest, CreateOfferResponse, CredentialOffer, Registration, TxCode};

// Longest offer URI most wallets scan reliably from a QR code.
const MAX_QR_URL: usize = 1800;
const MAX_OFFER_TTL: i64 = 86_400;
const TX_CODE_LEN: usize = 6;

/// Create Offer request handler.
async fn create_offer(
    issuer: &str, provider: &impl Provider, request: CreateOfferRequest,
) -> Result<CreateOfferResponse> {
    let (subject_id, claims) = request.verify()?;
    let ttl = match request.expires_in {
        None => Metadata::lifetimes(provider).offer,
        Some(secs) if (1..=MAX_OFFER_TTL).contains(&secs) => TimeDelta::seconds(secs),
        Some(secs) => {
            return Err(invalid!("expires_in must be between 1 and {MAX_OFFER_TTL}, got {secs}"));
        }
    };

    let code = generate::code();
    let tx_code = request.tx_code_required.then(generate::tx_code);

    let state = State::new(
        PendingOffer {
            subject_id: subject_id.clone(),
            claims: claims.clone(),
            created_at: Utc::now(),
            tx_code: tx_code.clone(),
        },
        ttl,
    );
    StateStore::put(provider, &code, &state).await.context("saving state")?;

    let offer = CredentialOffer::pre_authorized(
        issuer,
        &code,
        tx_code.as_ref().map(|_| TxCode::numeric(TX_CODE_LEN)),
    );
    let qr_url = offer.to_uri().context("encoding offer")?;
    if qr_url.len() > MAX_QR_URL {
        tracing::warn!(len = qr_url.len(), "offer URI may be too long for some wallets to scan");
    }

    register(provider, subject_id, claims).await;

    Ok(CreateOfferResponse {
        qr_url,
        pre_authorized_code: code,
        offer,
        expires_at: state.expires_at,
        tx_code,
    })
}

// Ledger registration is best-effort: failure is logged and otherwise
// ignored.
async fn register(provider: &impl Provider, subject_id: String, claims: BTreeMap<String, String>) {
    let claims_hash = match serde_json::to_vec(&claims) {
        Ok(bytes) => format!("{:x}", Sha256::digest(&bytes)),
        Err(e) => {
            tracing::warn!("cannot hash claims for ledger registration: {e}");
            return;
        }
    };
    let record = Registration { subject_id, claims, claims_hash };

    match Registrar::register(provider, &record).await {
        Ok(tx_id) => tracing::debug!(%tx_id, "offer registered"),
        Err(e) => tracing::warn!("ledger registration failed: {e}"),
    }
}

impl<P: Provider> Handler<CreateOfferResponse, P> for Request<CreateOfferRequest> {
    type Error = Error;

    async fn handle(
        self, issuer: &str, provider: &P,
    ) -> Result<impl Into<Response<CreateOfferResponse>>, Self::Error> {
        create_offer(issuer, provider, self.body).await
    }
}

impl Body for CreateOfferRequest {}

impl CreateOfferRequest {
    // Check the claim owner and claims, returning the trimmed owner id and
    // the claims as strings.
    fn verify(&self) -> Result<(String, BTreeMap<String, String>)> {
        tracing::debug!("create_offer::verify");

        let subject_id = self.subject_id.trim();
        if subject_id.is_empty() {
            return Err(invalid!("student_id is required"));
        }
        if subject_id.chars().count() > 100 {
            return Err(invalid!("student_id must be at most 100 characters"));
        }

        let mut claims = BTreeMap::new();
        for (name, value) in &self.claims {
            if name == "id" {
                return Err(invalid!("claim name `id` is reserved"));
            }
            let value = match value {
                Value::Null => continue,
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(invalid!("claim `{name}` must be a string"));
                }
            };

            let max = match name.as_str() {
                "grade" => 10,
                "student_name" => 200,
                _ => 300,
            };
            let len = value.chars().count();
            if len == 0 {
                return Err(invalid!("claim `{name}` must not be empty"));
            }
            if len > max {
                return Err(invalid!("claim `{name}` must be at most {max} characters"));
            }
            if name == "student_email" && !is_email(&value) {
                return Err(invalid!("student_email is not a valid email address"));
            }

            claims.insert(name.clone(), value);
        }

        Ok((subject_id.to_string(), claims))
    }
}

// local@domain.tld, with the character classes commonly accepted by address
// forms.
fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local.chars().all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let host_ok = !host.is_empty()
        && host.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    local_ok && host_ok && tld_ok
}
