//! # `OpenID4VCI` Errors
//!
//! Errors returned by the issuance endpoints. Every failure inside the crate
//! is mapped to one of these before reaching the transport layer, which
//! serializes it as an OAuth 2.0 error object:
//!
//! ```json
//! {"error": "invalid_grant", "error_description": "..."}
//! ```

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `OpenID` error codes for the pre-authorized code issuance flow.
#[derive(Error, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "error", content = "error_description")]
pub enum Error {
    /// The request is missing a required parameter, includes an invalid
    /// parameter value, or is otherwise malformed.
    #[error(r#"{{"error": "invalid_request", "error_description": "{0}"}}"#)]
    InvalidRequest(String),

    /// The provided pre-authorized code is invalid, expired, or already
    /// consumed, or the transaction code does not match.
    ///
    /// The token endpoint deliberately does not distinguish between these
    /// cases.
    #[error(r#"{{"error": "invalid_grant", "error_description": "{0}"}}"#)]
    InvalidGrant(String),

    /// The authorization grant type is not supported by the authorization
    /// server.
    #[error(r#"{{"error": "unsupported_grant_type", "error_description": "{0}"}}"#)]
    UnsupportedGrantType(String),

    /// The access token is missing, malformed, expired, has an invalid
    /// signature, or was issued for another audience.
    #[error(r#"{{"error": "invalid_token", "error_description": "{0}"}}"#)]
    InvalidToken(String),

    /// Requested credential type is not supported.
    #[error(r#"{{"error": "unsupported_credential_type", "error_description": "{0}"}}"#)]
    UnsupportedCredentialType(String),

    /// The access token is valid but the claim data it refers to has been
    /// consumed or has expired.
    #[error(r#"{{"error": "credential_data_not_found", "error_description": "{0}"}}"#)]
    CredentialDataNotFound(String),

    /// The server encountered an unexpected condition that prevented it from
    /// fulfilling the request.
    #[error(r#"{{"error": "server_error", "error_description": "{0}"}}"#)]
    ServerError(String),
}

impl Error {
    /// The HTTP status code the error should be returned with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidGrant(_)
            | Self::UnsupportedGrantType(_)
            | Self::UnsupportedCredentialType(_) => StatusCode::BAD_REQUEST,
            Self::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            Self::CredentialDataNotFound(_) => StatusCode::NOT_FOUND,
            Self::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The OAuth 2.0 `error` code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::InvalidToken(_) => "invalid_token",
            Self::UnsupportedCredentialType(_) => "unsupported_credential_type",
            Self::CredentialDataNotFound(_) => "credential_data_not_found",
            Self::ServerError(_) => "server_error",
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<Self>() {
            Some(Self::InvalidRequest(e)) => Self::InvalidRequest(format!("{err}: {e}")),
            Some(Self::InvalidGrant(e)) => Self::InvalidGrant(format!("{err}: {e}")),
            Some(Self::UnsupportedGrantType(e)) => {
                Self::UnsupportedGrantType(format!("{err}: {e}"))
            }
            Some(Self::InvalidToken(e)) => Self::InvalidToken(format!("{err}: {e}")),
            Some(Self::UnsupportedCredentialType(e)) => {
                Self::UnsupportedCredentialType(format!("{err}: {e}"))
            }
            Some(Self::CredentialDataNotFound(e)) => {
                Self::CredentialDataNotFound(format!("{err}: {e}"))
            }
            Some(Self::ServerError(e)) => Self::ServerError(format!("{err}: {e}")),
            None => {
                let source = err.source().map_or_else(String::new, ToString::to_string);
                Self::ServerError(format!("{err}: {source}"))
            }
        }
    }
}

/// Construct an `Error::InvalidRequest` error from a string or existing error
/// value.
macro_rules! invalid {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::InvalidRequest(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::InvalidRequest(format!($err))
    };
}
pub(crate) use invalid;

/// Construct an `Error::ServerError` error from a string or existing error
/// value.
macro_rules! server {
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::ServerError(format!($fmt, $($arg)*))
    };
     ($err:expr $(,)?) => {
        $crate::Error::ServerError(format!($err))
    };
}
pub(crate) use server;
