//! # Parameter Normalizer
//!
//! Wallets do not agree on how token and credential parameters are sent:
//! some use a form-encoded body, some the query string, some a JSON body.
//! [`Params::collect`] reads all three and resolves each field
//! independently, taking the first non-empty value in the order
//! form body, query string, JSON body.

use std::collections::HashMap;

use serde_json::{Map, Value};

const PRE_AUTHORIZED_CODE: [&str; 2] = ["pre-authorized_code", "pre_authorized_code"];

/// Protocol parameters gathered from every part of a request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Params {
    /// `grant_type`.
    pub grant_type: Option<String>,

    /// `pre-authorized_code`, also accepted as `pre_authorized_code`.
    pub pre_authorized_code: Option<String>,

    /// `tx_code`.
    pub tx_code: Option<String>,

    /// `credential_configuration_id`.
    pub credential_configuration_id: Option<String>,
}

impl Params {
    /// Gather parameters from the request's query string and body.
    ///
    /// The body is read as a form when `content_type` is
    /// `application/x-www-form-urlencoded`, and as JSON when it is
    /// `application/json` (or a `+json` type), or when no content type was
    /// sent and the body looks like a JSON object. A source that fails to
    /// parse is skipped.
    #[must_use]
    pub fn collect(query: Option<&str>, content_type: Option<&str>, body: &[u8]) -> Self {
        let media_type = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|mt| mt.trim().to_ascii_lowercase());

        let form = match media_type.as_deref() {
            Some("application/x-www-form-urlencoded") => Source::form(body),
            _ => Source::default(),
        };
        let query = query.map(|q| Source::form(q.as_bytes())).unwrap_or_default();
        let json = match media_type.as_deref() {
            Some(mt) if mt == "application/json" || mt.ends_with("+json") => Source::json(body),
            None if body.trim_ascii_start().starts_with(b"{") => Source::json(body),
            _ => Source::default(),
        };

        let sources = [&form, &query, &json];
        let first = |names: &[&str]| sources.iter().find_map(|s| s.lookup(names));

        Self {
            grant_type: first(&["grant_type"]),
            pre_authorized_code: first(&PRE_AUTHORIZED_CODE),
            tx_code: first(&["tx_code"]),
            credential_configuration_id: first(&["credential_configuration_id"]),
        }
    }
}

#[derive(Debug, Default)]
struct Source(HashMap<String, String>);

impl Source {
    fn form(bytes: &[u8]) -> Self {
        let pairs: Vec<(String, String)> = match serde_urlencoded::from_bytes(bytes) {
            Ok(pairs) => pairs,
            Err(e) => {
                tracing::debug!("ignoring malformed form data: {e}");
                return Self::default();
            }
        };

        let mut fields = HashMap::new();
        for (key, value) in pairs {
            fields.entry(key).or_insert(value);
        }
        Self(fields)
    }

    fn json(bytes: &[u8]) -> Self {
        let object: Map<String, Value> = match serde_json::from_slice(bytes) {
            Ok(object) => object,
            Err(e) => {
                tracing::debug!("ignoring malformed JSON body: {e}");
                return Self::default();
            }
        };

        let fields = object
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(s) => Some((key, s)),
                Value::Number(n) => Some((key, n.to_string())),
                _ => None,
            })
            .collect();
        Self(fields)
    }

    // The first name with a non-empty value wins, so the hyphenated
    // `pre-authorized_code` is preferred over its underscore alias.
    fn lookup(&self, names: &[&str]) -> Option<String> {
        names
            .iter()
            .filter_map(|name| self.0.get(*name))
            .find(|value| !value.trim().is_empty())
            .cloned()
    }
}
