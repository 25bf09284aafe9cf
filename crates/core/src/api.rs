//! # API
//!
//! Entry-point types for the issuer API. Transport layers convert an inbound
//! HTTP exchange into a [`Request`], hand it to a [`Handler`], and turn the
//! resulting [`Response`] (or error) back into HTTP.

use std::fmt::Debug;
use std::ops::Deref;

use http::StatusCode;

/// A request to process, made up of an endpoint-specific body and the
/// headers that endpoint cares about.
#[derive(Clone, Debug)]
pub struct Request<B, H = NoHeaders>
where
    B: Body,
    H: Headers,
{
    /// The request to process.
    pub body: B,

    /// Headers associated with this request.
    pub headers: H,
}

impl<B: Body, H: Headers> Request<B, H> {
    /// Create a request from a body and its headers.
    pub const fn new(body: B, headers: H) -> Self {
        Self { body, headers }
    }
}

impl<B: Body> From<B> for Request<B> {
    fn from(body: B) -> Self {
        Self { body, headers: NoHeaders }
    }
}

/// Successful handler output.
#[derive(Clone, Debug)]
pub struct Response<T> {
    /// HTTP status code to respond with.
    pub status: StatusCode,

    /// The endpoint-specific response.
    pub body: T,
}

impl<T> From<T> for Response<T> {
    fn from(body: T) -> Self {
        Self { status: StatusCode::OK, body }
    }
}

impl<T> Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.body
    }
}

/// Request handler.
///
/// Implemented for each `Request<XxxRequest, _>` so that requests can be
/// dispatched through a single generic `handle` function.
pub trait Handler<U, P> {
    /// The error type returned by the handler.
    type Error;

    /// Process the request on behalf of `issuer` using the capabilities
    /// supplied by `provider`.
    fn handle(
        self, issuer: &str, provider: &P,
    ) -> impl Future<Output = Result<impl Into<Response<U>>, Self::Error>> + Send;
}

/// Restricts the types able to act as a request body. Implemented by every
/// `xxxRequest` type.
pub trait Body: Clone + Debug + Send + Sync {}

/// Restricts the types able to act as request headers.
pub trait Headers: Clone + Debug + Send + Sync {}

/// Empty headers for endpoints that do not need any.
#[derive(Clone, Debug, Default)]
pub struct NoHeaders;
impl Headers for NoHeaders {}
