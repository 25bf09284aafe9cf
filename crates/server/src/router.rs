//! # Issuance API
//!
//! HTTP routes for the pre-authorized code flow.

use axum::body::{Body, Bytes};
use axum::extract::{RawQuery, State};
use axum::http::header::{
    CACHE_CONTROL, CONTENT_TYPE, PRAGMA, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS,
};
use axum::http::{HeaderMap, HeaderValue, Request as HttpRequest};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use unicred_oid4vci::params::Params;
use unicred_oid4vci::{
    CreateOfferRequest, CredentialHeaders, CredentialRequest, Error, JwksRequest,
    MetadataRequest, Request, ServerRequest, TokenRequest, endpoint,
};

use crate::http::IntoHttp;
use crate::provider::IssuerProvider;

/// Health check path.
pub const HEALTH: &str = "/health";

/// Shared state for the issuer routes.
#[derive(Clone, Debug)]
pub struct AppState {
    issuer: String,
    provider: IssuerProvider,
}

impl AppState {
    /// State for an issuer published at `issuer` (no trailing slash).
    #[must_use]
    pub fn new(issuer: impl Into<String>, provider: IssuerProvider) -> Self {
        Self { issuer: issuer.into(), provider }
    }
}

/// Build the issuer router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(endpoint::CREDENTIAL_OFFER, post(create_offer))
        .route(endpoint::TOKEN, post(token))
        .route(endpoint::CREDENTIAL, post(credential))
        .route(endpoint::ISSUER_METADATA, get(metadata))
        .route(endpoint::SERVER_METADATA, get(oauth_server))
        .route(endpoint::JWKS, get(jwks))
        .route(HEALTH, get(health))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_headers(Any))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::overriding(PRAGMA, HeaderValue::from_static("no-cache")))
        .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}

#[axum::debug_handler]
async fn create_offer(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let request = match serde_json::from_slice::<CreateOfferRequest>(&body) {
        Ok(request) => request,
        Err(e) => return Error::InvalidRequest(format!("invalid offer request: {e}")).into_http(),
    };
    unicred_oid4vci::handle(&state.issuer, request, &state.provider).await.into_http()
}

// Wallets send token parameters as form data, query parameters, or JSON.
#[axum::debug_handler]
async fn token(
    State(state): State<AppState>, RawQuery(query): RawQuery, headers: HeaderMap, body: Bytes,
) -> impl IntoResponse {
    let params = Params::collect(query.as_deref(), content_type(&headers), &body);
    let request = match TokenRequest::try_from(params) {
        Ok(request) => request,
        Err(e) => return e.into_http(),
    };
    unicred_oid4vci::handle(&state.issuer, request, &state.provider).await.into_http()
}

#[axum::debug_handler]
async fn credential(
    State(state): State<AppState>, RawQuery(query): RawQuery, headers: HeaderMap, body: Bytes,
) -> impl IntoResponse {
    let params = Params::collect(query.as_deref(), content_type(&headers), &body);
    let request = Request::new(CredentialRequest::from(params), CredentialHeaders::from(&headers));
    unicred_oid4vci::handle(&state.issuer, request, &state.provider).await.into_http()
}

#[axum::debug_handler]
async fn metadata(State(state): State<AppState>) -> impl IntoResponse {
    unicred_oid4vci::handle(&state.issuer, MetadataRequest, &state.provider).await.into_http()
}

// OAuth Server metadata endpoint
#[axum::debug_handler]
async fn oauth_server(State(state): State<AppState>) -> impl IntoResponse {
    unicred_oid4vci::handle(&state.issuer, ServerRequest, &state.provider).await.into_http()
}

#[axum::debug_handler]
async fn jwks(State(state): State<AppState>) -> impl IntoResponse {
    unicred_oid4vci::handle(&state.issuer, JwksRequest, &state.provider).await.into_http()
}

#[axum::debug_handler]
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let issuer = &state.issuer;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "issuer": issuer,
        "endpoints": {
            "credential_offer": format!("{issuer}{}", endpoint::CREDENTIAL_OFFER),
            "token": format!("{issuer}{}", endpoint::TOKEN),
            "credential": format!("{issuer}{}", endpoint::CREDENTIAL),
            "metadata": format!("{issuer}{}", endpoint::ISSUER_METADATA),
            "jwks": format!("{issuer}{}", endpoint::JWKS),
        },
    }))
}

// Query strings carry pre-authorized codes, so spans record the path only.
fn request_span(request: &HttpRequest<Body>) -> tracing::Span {
    tracing::debug_span!("request", method = %request.method(), path = %request.uri().path())
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}
