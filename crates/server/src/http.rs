//! # Axum Response

use axum::body::Body;
use http::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use http::{HeaderValue, Response, StatusCode};
use serde::Serialize;
use unicred_oid4vci::{Error, Result};

/// Trait for converting a handler `Result` into an HTTP response.
pub trait IntoHttp {
    /// Convert into an HTTP response.
    fn into_http(self) -> Response<Body>;
}

impl<T: Serialize> IntoHttp for Result<unicred_oid4vci::Response<T>> {
    fn into_http(self) -> Response<Body> {
        match self {
            Ok(r) => json(r.status, &r.body),
            Err(e) => e.into_http(),
        }
    }
}

impl IntoHttp for Error {
    fn into_http(self) -> Response<Body> {
        if let Self::ServerError(description) = &self {
            tracing::error!("{description}");
        }

        let mut response = json(self.status(), &self);
        if self.status() == StatusCode::UNAUTHORIZED {
            let challenge = HeaderValue::from_static(r#"Bearer error="invalid_token""#);
            response.headers_mut().insert(WWW_AUTHENTICATE, challenge);
        }
        response
    }
}

fn json(status: StatusCode, body: &impl Serialize) -> Response<Body> {
    let Ok(bytes) = serde_json::to_vec(body) else {
        let mut response = Response::new(Body::from(r#"{"error":"server_error"}"#));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        return response;
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
