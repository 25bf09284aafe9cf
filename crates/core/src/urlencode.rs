//! # Url Encoder
//!
//! Encoding of `application/x-www-form-urlencoded` query strings
//! where object-valued fields travel as percent-encoded compact JSON (as
//! required for `credential_offer` URIs).

use anyhow::{Result, anyhow};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use serde_json::Value;

/// Everything but RFC 3986 unreserved characters is escaped.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'.').remove(b'_').remove(b'-').remove(b'~');

/// Percent-encode a single component.
#[must_use]
pub fn escape(s: &str) -> String {
    utf8_percent_encode(s, UNRESERVED).to_string()
}

/// Create an `application/x-www-form-urlencoded` representation of the
/// provided value. Object and array fields are serialized to compact JSON
/// before being percent-encoded.
///
/// # Errors
///
/// Will return an error if the value does not serialize to a JSON object or
/// string.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    let encoded = match serde_json::to_value(value)? {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let s = if let Value::String(s) = v { s.clone() } else { v.to_string() };
                format!("{k}={}", escape(&s))
            })
            .collect::<Vec<String>>(),
        Value::String(s) => vec![escape(&s)],
        _ => return Err(anyhow!("unsupported value")),
    };
    Ok(encoded.join("&"))
}
