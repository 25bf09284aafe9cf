//! HTTP surface tests, driving the router directly.

use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use unicred_oid4vci::keystore::Keyring;
use unicred_oid4vci::state::Lifetimes;
use unicred_server::{AppState, HttpRegistrar, IssuerProvider, router};

const ISSUER: &str = "http://localhost:8080";
const GRANT: &str = "urn:ietf:params:oauth:grant-type:pre-authorized_code";

fn app() -> Router {
    let keyring = Keyring::ephemeral().expect("should generate key");
    let registrar = HttpRegistrar::new(None, Duration::from_secs(1)).expect("should build");
    let provider = IssuerProvider::new(keyring, Lifetimes::default(), "Test University", registrar);
    router(AppState::new(ISSUER, provider))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, http::HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.expect("should respond");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("should be json")
    };
    (status, headers, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("should build request")
}

fn post_form(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .expect("should build request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("should build request")
}

fn credential_request(token: Option<&str>, query: &str) -> Request<Body> {
    let mut builder = Request::builder().method(Method::POST).uri(format!("/credential{query}"));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("should build request")
}

async fn offer(app: &Router) -> String {
    let (status, _, body) = send(
        app,
        post_json("/credential-offer", &json!({"student_id": "s1", "course_name": "Intro"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["pre_authorized_code"].as_str().expect("should have code").to_string()
}

fn form_token_request(code: &str) -> Request<Body> {
    let form = serde_urlencoded::to_string([("grant_type", GRANT), ("pre-authorized_code", code)])
        .expect("should encode");
    post_form("/token", form)
}

#[tokio::test]
async fn issuance_flow() {
    let app = app();
    let code = offer(&app).await;

    let (status, _, token) = send(&app, form_token_request(&code)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token["token_type"], "Bearer");
    let access_token = token["access_token"].as_str().expect("should have token");

    let query = "?credential_configuration_id=UniversityCredential";
    let (status, _, body) = send(&app, credential_request(Some(access_token), query)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["credential"].as_str().is_some_and(|c| c.split('.').count() == 3));
    assert!(body["c_nonce"].is_string());

    let (status, _, body) = send(&app, credential_request(Some(access_token), "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "credential_data_not_found");
}

#[tokio::test]
async fn offer_response_shape() {
    let app = app();
    let (status, headers, body) = send(
        &app,
        post_json("/credential-offer", &json!({"student_id": "s1", "tx_code_required": true})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    let qr_url = body["qr_url"].as_str().expect("should have qr_url");
    assert!(qr_url.starts_with("openid-credential-offer://?credential_offer="));
    assert_eq!(body["offer"]["credential_issuer"], ISSUER);
    assert!(body["expires_at"].is_string());
    assert_eq!(body["tx_code"].as_str().map(str::len), Some(6));
}

#[tokio::test]
async fn token_from_query_and_json() {
    let app = app();
    let code = offer(&app).await;

    let query =
        serde_urlencoded::to_string([("grant_type", GRANT), ("pre-authorized_code", code.as_str())])
            .expect("should encode");
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/token?{query}"))
        .body(Body::empty())
        .expect("should build request");
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let body = json!({"grant_type": GRANT, "pre_authorized_code": code});
    let (status, _, _) = send(&app, post_json("/token", &body)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn token_errors() {
    let app = app();

    let (status, _, body) =
        send(&app, post_form("/token", "pre-authorized_code=abc".to_string())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (status, _, body) = send(&app, form_token_request("unknown")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_grant");
    assert!(body["error_description"].is_string());

    let form = "grant_type=authorization_code&pre-authorized_code=abc".to_string();
    let (status, _, body) = send(&app, post_form("/token", form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_grant_type");
}

#[tokio::test]
async fn invalid_offer_body() {
    let app = app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/credential-offer")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("should build request");
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let offer = json!({"student_id": "s1", "student_email": "nope"});
    let (status, _, body) = send(&app, post_json("/credential-offer", &offer)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn credential_requires_bearer() {
    let app = app();

    let (status, headers, body) = send(&app, credential_request(None, "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");
    assert_eq!(headers[header::WWW_AUTHENTICATE], r#"Bearer error="invalid_token""#);

    let (status, _, _) = send(&app, credential_request(Some("a.b.c"), "")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unsupported_credential_type() {
    let app = app();
    let code = offer(&app).await;
    let (_, _, token) = send(&app, form_token_request(&code)).await;
    let access_token = token["access_token"].as_str().expect("should have token");

    let query = "?credential_configuration_id=Diploma";
    let (status, _, body) = send(&app, credential_request(Some(access_token), query)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "unsupported_credential_type");
}

#[tokio::test]
async fn security_headers() {
    let app = app();
    let (_, headers, _) = send(&app, get("/health")).await;

    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert_eq!(headers[header::PRAGMA], "no-cache");
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    assert_eq!(headers[header::REFERRER_POLICY], "strict-origin-when-cross-origin");

    let request = Request::builder()
        .uri("/.well-known/jwks.json")
        .header(header::ORIGIN, "https://wallet.example")
        .body(Body::empty())
        .expect("should build request");
    let (_, headers, _) = send(&app, request).await;
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn well_known_documents() {
    let app = app();

    let (status, _, health) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["endpoints"]["token"], format!("{ISSUER}/token"));

    let (status, _, metadata) = send(&app, get("/.well-known/openid-credential-issuer")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metadata["credential_issuer"], ISSUER);
    assert_eq!(metadata["credential_endpoint"], format!("{ISSUER}/credential"));

    // no proof of possession is checked, so none is advertised
    let config = &metadata["credential_configurations_supported"]["UniversityCredential"];
    assert_eq!(config["credential_signing_alg_values_supported"], json!(["ES256"]));
    assert!(config.get("proof_types_supported").is_none());
    assert!(config.get("cryptographic_binding_methods_supported").is_none());

    let (status, _, server) = send(&app, get("/.well-known/oauth-authorization-server")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(server["token_endpoint"], metadata["token_endpoint"]);
    assert_eq!(server["pre-authorized_grant_anonymous_access_supported"], true);

    let (status, _, jwks) = send(&app, get("/.well-known/jwks.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(jwks["keys"][0]["kty"], "EC");
    assert_eq!(jwks["keys"][0]["crv"], "P-256");
    assert!(jwks["keys"][0]["kid"].is_string());
}
