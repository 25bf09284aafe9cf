//! Pre-Authorized Code Flow Tests

use std::time::Duration;

use chrono::TimeDelta;
use test_utils::issuer::Issuer;
use unicred_oid4vci::jose::{self, Jwks, JwtType, PublicKeyJwk};
use unicred_oid4vci::params::Params;
use unicred_oid4vci::provider::{Signer, StateStore};
use unicred_oid4vci::state::{Lifetimes, PendingOffer};
use unicred_oid4vci::types::{
    AccessTokenClaims, CreateOfferRequest, CreateOfferResponse, CredentialRequest,
    CredentialResponse, IssuerMetadata, JwksRequest, MetadataRequest, PRE_AUTHORIZED_GRANT,
    ServerMetadata, ServerRequest, TokenRequest, TokenResponse, UNIVERSITY_CREDENTIAL,
};
use unicred_oid4vci::w3c_vc::VcClaims;
use unicred_oid4vci::{AuthorizationHeader, Error, Request, Response};

const ISSUER: &str = "http://localhost:8080";

async fn create_offer(provider: &Issuer, request: CreateOfferRequest) -> CreateOfferResponse {
    unicred_oid4vci::handle(ISSUER, request, provider).await.expect("should create offer").body
}

async fn offer_for(provider: &Issuer, student: &str, course: &str) -> String {
    let request = CreateOfferRequest::builder()
        .subject_id(student)
        .claim("student_name", "Ada Lovelace")
        .claim("course_name", course)
        .build();
    create_offer(provider, request).await.pre_authorized_code
}

async fn token(provider: &Issuer, request: TokenRequest) -> Result<TokenResponse, Error> {
    let response: Response<TokenResponse> =
        unicred_oid4vci::handle(ISSUER, request, provider).await?;
    Ok(response.body)
}

async fn credential(
    provider: &Issuer, access_token: &str, config_id: Option<&str>,
) -> Result<String, Error> {
    let request = Request::new(
        CredentialRequest { credential_configuration_id: config_id.map(ToString::to_string) },
        AuthorizationHeader::bearer(access_token),
    );
    let response: Response<CredentialResponse> =
        unicred_oid4vci::handle(ISSUER, request, provider).await?;
    Ok(response.body.credential)
}

async fn issuer_jwk(provider: &Issuer) -> PublicKeyJwk {
    provider.public_jwk().await.expect("should get jwk")
}

// Offer, token, and credential in sequence. A second credential request with
// the same token finds nothing.
#[tokio::test]
async fn end_to_end() {
    let provider = Issuer::new();

    let offer = create_offer(
        &provider,
        CreateOfferRequest::builder().subject_id("s1").claim("course_name", "Intro").build(),
    )
    .await;
    assert!(offer.qr_url.starts_with("openid-credential-offer://?credential_offer="));
    assert_eq!(offer.offer.credential_issuer, ISSUER);
    assert_eq!(offer.offer.credential_configuration_ids, vec![UNIVERSITY_CREDENTIAL]);
    assert_eq!(
        offer.offer.grants.pre_authorized_code.pre_authorized_code,
        offer.pre_authorized_code
    );
    assert!(offer.tx_code.is_none());

    let token = token(&provider, TokenRequest::pre_authorized(&offer.pre_authorized_code))
        .await
        .expect("should return token");
    assert_eq!(token.scope, "credential_issuance");
    assert!(token.expires_in > 0 && token.expires_in <= 600);

    let vc = credential(&provider, &token.access_token, Some(UNIVERSITY_CREDENTIAL))
        .await
        .expect("should return credential");

    let jwt = jose::decode::<VcClaims>(&vc, &issuer_jwk(&provider).await).expect("should verify");
    assert_eq!(jwt.header.typ, JwtType::Jwt);
    assert_eq!(jwt.claims.iss, ISSUER);
    assert_eq!(jwt.claims.sub, "did:web:localhost%3A8080#s1");

    let subject = &jwt.claims.vc.credential_subject;
    assert_eq!(subject.get("course_name").map(String::as_str), Some("Intro"));
    assert_eq!(subject.get("student_id").map(String::as_str), Some("s1"));
    assert_eq!(jwt.claims.vc.issuer.name, "Test University");

    let err = credential(&provider, &token.access_token, Some(UNIVERSITY_CREDENTIAL))
        .await
        .expect_err("should be consumed");
    let expected = "credential data not found or expired".to_string();
    assert_eq!(err, Error::CredentialDataNotFound(expected));
}

// The same code can be exchanged for a token more than once while the offer
// is live.
#[tokio::test]
async fn token_reusable() {
    let provider = Issuer::new();
    let code = offer_for(&provider, "s1", "Intro").await;

    let first =
        token(&provider, TokenRequest::pre_authorized(&code)).await.expect("should return token");
    let second =
        token(&provider, TokenRequest::pre_authorized(&code)).await.expect("should return token");

    credential(&provider, &first.access_token, None).await.expect("should issue");
    let err =
        credential(&provider, &second.access_token, None).await.expect_err("should be consumed");
    assert_eq!(err.code(), "credential_data_not_found");
}

#[tokio::test]
async fn offer_expiry() {
    let provider = Issuer::new();
    let request = CreateOfferRequest::builder().subject_id("s1").expires_in(1).build();
    let code = create_offer(&provider, request).await.pre_authorized_code;

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let state = StateStore::get::<PendingOffer>(&provider, &code).await.expect("should query");
    assert!(state.is_none());

    let err = token(&provider, TokenRequest::pre_authorized(&code)).await.expect_err("should fail");
    assert_eq!(err.code(), "invalid_grant");
}

// Tokens never outlive the offer they were issued against.
#[tokio::test]
async fn token_ttl_capped() {
    let provider = Issuer::new();
    let request = CreateOfferRequest::builder().subject_id("s1").expires_in(30).build();
    let code = create_offer(&provider, request).await.pre_authorized_code;

    let token =
        token(&provider, TokenRequest::pre_authorized(&code)).await.expect("should return token");
    assert!(token.expires_in <= 30);

    let jwk = issuer_jwk(&provider).await;
    let claims =
        jose::decode::<AccessTokenClaims>(&token.access_token, &jwk).expect("should verify").claims;
    assert!(claims.exp - claims.iat <= 30);
    assert_eq!(claims.pre_auth_code, code);
}

// Form body, query string, and JSON body all produce a token.
#[tokio::test]
async fn parameter_sources() {
    let provider = Issuer::new();
    let code = offer_for(&provider, "s1", "Intro").await;
    let grant = PRE_AUTHORIZED_GRANT.replace(':', "%3A");

    let form = format!("grant_type={grant}&pre-authorized_code={code}");
    let json =
        format!(r#"{{"grant_type":"{PRE_AUTHORIZED_GRANT}","pre_authorized_code":"{code}"}}"#);
    let sources = [
        Params::collect(None, Some("application/x-www-form-urlencoded"), form.as_bytes()),
        Params::collect(Some(&form), None, b""),
        Params::collect(None, Some("application/json"), json.as_bytes()),
    ];

    for params in sources {
        let request = TokenRequest::try_from(params).expect("should have parameters");
        let response = token(&provider, request).await.expect("should return token");
        let claims =
            jose::decode::<AccessTokenClaims>(&response.access_token, &issuer_jwk(&provider).await)
                .expect("should verify")
                .claims;
        assert_eq!(claims.pre_auth_code, code);
    }
}

// The code embedded in the token decides which claims are issued.
#[tokio::test]
async fn token_bound_to_code() {
    let provider = Issuer::new();
    let c1 = offer_for(&provider, "s1", "Course One").await;
    let c2 = offer_for(&provider, "s2", "Course Two").await;

    let t1 =
        token(&provider, TokenRequest::pre_authorized(&c1)).await.expect("should return token");
    let vc = credential(&provider, &t1.access_token, None).await.expect("should issue");
    let claims =
        jose::decode::<VcClaims>(&vc, &issuer_jwk(&provider).await).expect("should verify").claims;
    assert_eq!(
        claims.vc.credential_subject.get("course_name").map(String::as_str),
        Some("Course One")
    );

    // c2 is untouched
    let state = StateStore::get::<PendingOffer>(&provider, &c2).await.expect("should query");
    assert_eq!(state.map(|s| s.body.subject_id), Some("s2".to_string()));

    // t1 cannot reach c2's data
    let err = credential(&provider, &t1.access_token, None).await.expect_err("should be consumed");
    assert_eq!(err.code(), "credential_data_not_found");
}

#[tokio::test]
async fn tx_code_enforced() {
    let provider = Issuer::new();
    let request = CreateOfferRequest::builder().subject_id("s1").use_tx_code(true).build();
    let offer = create_offer(&provider, request).await;

    let tx_code = offer.tx_code.clone().expect("should have tx_code");
    assert_eq!(tx_code.len(), 6);
    let advertised =
        offer.offer.grants.pre_authorized_code.tx_code.expect("should advertise tx_code");
    assert_eq!(advertised.input_mode.as_deref(), Some("numeric"));
    assert_eq!(advertised.length, Some(6));

    let code = &offer.pre_authorized_code;
    let err = token(&provider, TokenRequest::pre_authorized(code)).await.expect_err("should fail");
    assert_eq!(err.code(), "invalid_grant");

    let wrong = if tx_code == "000000" { "111111" } else { "000000" };
    let err = token(&provider, TokenRequest::pre_authorized(code).with_tx_code(wrong))
        .await
        .expect_err("should fail");
    assert_eq!(err.code(), "invalid_grant");

    token(&provider, TokenRequest::pre_authorized(code).with_tx_code(tx_code))
        .await
        .expect("should return token");
}

#[tokio::test]
async fn unsupported_grant() {
    let provider = Issuer::new();
    let code = offer_for(&provider, "s1", "Intro").await;

    let mut request = TokenRequest::pre_authorized(code);
    request.grant_type = "authorization_code".to_string();
    let err = token(&provider, request).await.expect_err("should fail");
    assert_eq!(err.code(), "unsupported_grant_type");
}

#[tokio::test]
async fn unknown_code() {
    let provider = Issuer::new();
    let err =
        token(&provider, TokenRequest::pre_authorized("nope")).await.expect_err("should fail");
    assert_eq!(err.code(), "invalid_grant");
}

// An unsupported credential type is rejected without consuming the offer.
#[tokio::test]
async fn unsupported_credential_type() {
    let provider = Issuer::new();
    let code = offer_for(&provider, "s1", "Intro").await;
    let token =
        token(&provider, TokenRequest::pre_authorized(&code)).await.expect("should return token");

    let err = credential(&provider, &token.access_token, Some("DriverLicense"))
        .await
        .expect_err("should fail");
    assert_eq!(err.code(), "unsupported_credential_type");

    credential(&provider, &token.access_token, None).await.expect("should still issue");
}

#[tokio::test]
async fn invalid_tokens() {
    let provider = Issuer::new();
    let code = offer_for(&provider, "s1", "Intro").await;

    let err = credential(&provider, "not-a-jwt", None).await.expect_err("should fail");
    assert_eq!(err.code(), "invalid_token");
    assert_eq!(err.status(), http::StatusCode::UNAUTHORIZED);

    // signed by another issuer's key
    let other = Issuer::new();
    let foreign = token(&other, TokenRequest::pre_authorized(offer_for(&other, "s1", "x").await))
        .await
        .expect("should return token");
    let err = credential(&provider, &foreign.access_token, None).await.expect_err("should fail");
    assert_eq!(err.code(), "invalid_token");

    // issued for another audience
    let claims = AccessTokenClaims {
        iss: "https://elsewhere.example".to_string(),
        sub: "s1".to_string(),
        aud: "https://elsewhere.example".to_string(),
        iat: chrono::Utc::now().timestamp(),
        exp: chrono::Utc::now().timestamp() + 60,
        pre_auth_code: code.clone(),
        scope: "credential_issuance".to_string(),
    };
    let wrong_aud =
        jose::encode(JwtType::AccessToken, &claims, &provider).await.expect("should sign");
    let err = credential(&provider, &wrong_aud, None).await.expect_err("should fail");
    assert_eq!(err.code(), "invalid_token");

    // expired
    let claims = AccessTokenClaims {
        iss: ISSUER.to_string(),
        aud: ISSUER.to_string(),
        exp: chrono::Utc::now().timestamp() - 1,
        ..claims
    };
    let expired =
        jose::encode(JwtType::AccessToken, &claims, &provider).await.expect("should sign");
    let err = credential(&provider, &expired, None).await.expect_err("should fail");
    assert_eq!(err.code(), "invalid_token");

    // none of the above consumed the offer
    let restored = StateStore::get::<PendingOffer>(&provider, &code).await.expect("should query");
    assert!(restored.is_some());
}

// A failed signature leaves the offer redeemable.
#[tokio::test]
async fn signing_failure_restores_offer() {
    let provider = Issuer::new();
    let code = offer_for(&provider, "s1", "Intro").await;
    let token =
        token(&provider, TokenRequest::pre_authorized(&code)).await.expect("should return token");

    provider.fail_signing(true);
    let err = credential(&provider, &token.access_token, None).await.expect_err("should fail");
    assert_eq!(err.code(), "server_error");

    provider.fail_signing(false);
    credential(&provider, &token.access_token, None).await.expect("should issue after restore");
}

// Concurrent credential requests for one code issue exactly one credential.
#[tokio::test]
async fn single_use_under_contention() {
    let provider = Issuer::new();
    let code = offer_for(&provider, "s1", "Intro").await;
    let token =
        token(&provider, TokenRequest::pre_authorized(&code)).await.expect("should return token");

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let provider = provider.clone();
        let access_token = token.access_token.clone();
        tasks.push(tokio::spawn(async move {
            credential(&provider, &access_token, None).await.is_ok()
        }));
    }

    let mut issued = 0;
    for task in tasks {
        if task.await.expect("task should complete") {
            issued += 1;
        }
    }
    assert_eq!(issued, 1);
}

#[tokio::test]
async fn ledger_registration() {
    let provider = Issuer::new();
    let code = offer_for(&provider, "s1", "Intro").await;

    let registrations = provider.registrations();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].subject_id, "s1");
    assert_eq!(registrations[0].claims.get("course_name").map(String::as_str), Some("Intro"));
    assert_eq!(registrations[0].claims_hash.len(), 64);
    assert!(!registrations[0].claims_hash.contains(&code));

    // registrar failures do not block the flow
    provider.fail_registrar(true);
    let code = offer_for(&provider, "s2", "Intro").await;
    token(&provider, TokenRequest::pre_authorized(&code)).await.expect("should return token");
    assert_eq!(provider.registrations().len(), 1);
}

// Surrounding whitespace in the owner id is not carried into the offer.
#[tokio::test]
async fn subject_id_trimmed() {
    let provider = Issuer::new();
    let code = offer_for(&provider, " s1 ", "Intro").await;
    assert_eq!(provider.registrations()[0].subject_id, "s1");

    let token =
        token(&provider, TokenRequest::pre_authorized(&code)).await.expect("should return token");
    let vc =
        credential(&provider, &token.access_token, None).await.expect("should return credential");

    let jwt = jose::decode::<VcClaims>(&vc, &issuer_jwk(&provider).await).expect("should verify");
    assert_eq!(jwt.claims.sub, "did:web:localhost%3A8080#s1");
    let subject = &jwt.claims.vc.credential_subject;
    assert_eq!(subject.get("student_id").map(String::as_str), Some("s1"));
}

#[tokio::test]
async fn invalid_offer_request() {
    let provider = Issuer::new();

    let request = CreateOfferRequest::builder().subject_id("").build();
    let result: Result<Response<CreateOfferResponse>, Error> =
        unicred_oid4vci::handle(ISSUER, request, &provider).await;
    let err = result.expect_err("should fail");
    assert_eq!(err.code(), "invalid_request");

    let request = CreateOfferRequest::builder().subject_id("s1").expires_in(0).build();
    let result: Result<Response<CreateOfferResponse>, Error> =
        unicred_oid4vci::handle(ISSUER, request, &provider).await;
    let err = result.expect_err("should fail");
    assert_eq!(err.code(), "invalid_request");

    assert!(provider.store().is_empty());
}

// The JWKS `kid` is the one referenced by issued tokens.
#[tokio::test]
async fn jwks_matches_tokens() {
    let provider = Issuer::new();
    let jwks: Response<Jwks> =
        unicred_oid4vci::handle(ISSUER, JwksRequest, &provider).await.expect("should return jwks");
    assert_eq!(jwks.keys.len(), 1);
    let jwk = &jwks.keys[0];
    assert_eq!(jwk.kid, jwk.thumbprint());

    let code = offer_for(&provider, "s1", "Intro").await;
    let token =
        token(&provider, TokenRequest::pre_authorized(&code)).await.expect("should return token");
    let jwt = jose::decode::<AccessTokenClaims>(&token.access_token, jwk).expect("should verify");
    assert_eq!(jwt.header.kid, jwk.kid);
    assert_eq!(jwt.header.typ, JwtType::AccessToken);
}

// Metadata documents agree with each other and with the issuer URL.
#[tokio::test]
async fn metadata_consistent() {
    let provider = Issuer::new();

    let issuer: Response<IssuerMetadata> =
        unicred_oid4vci::handle(ISSUER, MetadataRequest, &provider).await.expect("should return");
    assert_eq!(issuer.credential_issuer, ISSUER);
    assert_eq!(issuer.token_endpoint, format!("{ISSUER}/token"));
    assert_eq!(issuer.credential_endpoint, format!("{ISSUER}/credential"));
    assert!(issuer.credential_configurations_supported.contains_key(UNIVERSITY_CREDENTIAL));

    let server: Response<ServerMetadata> =
        unicred_oid4vci::handle(ISSUER, ServerRequest, &provider).await.expect("should return");
    assert_eq!(server.issuer, ISSUER);
    assert_eq!(server.token_endpoint, issuer.token_endpoint);
    assert_eq!(server.jwks_uri, issuer.jwks_uri);
    assert_eq!(server.grant_types_supported, vec![PRE_AUTHORIZED_GRANT]);
}

#[tokio::test]
async fn configured_lifetimes() {
    let lifetimes = Lifetimes {
        access: TimeDelta::seconds(60),
        credential: TimeDelta::days(30),
        c_nonce: TimeDelta::seconds(300),
        ..Lifetimes::default()
    };
    let provider = Issuer::new().with_lifetimes(lifetimes);
    let code = offer_for(&provider, "s1", "Intro").await;

    let token =
        token(&provider, TokenRequest::pre_authorized(&code)).await.expect("should return token");
    assert!(token.expires_in <= 60);

    let headers = AuthorizationHeader::bearer(&token.access_token);
    let request = Request::new(CredentialRequest::default(), headers);
    let response: Response<CredentialResponse> =
        unicred_oid4vci::handle(ISSUER, request, &provider).await.expect("should issue");
    assert_eq!(response.c_nonce_expires_in, 300);

    let claims = jose::decode::<VcClaims>(&response.credential, &issuer_jwk(&provider).await)
        .expect("should verify")
        .claims;
    assert_eq!(claims.exp - claims.iat, 30 * 86_400);
}
