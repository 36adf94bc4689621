use extauth_core::{AuthError, Email, OAuthProvider, OAuthToken, ProviderConfig};
use extauth_providers_descope::DescopeProvider;
use url::form_urlencoded::byte_serialize;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REDIRECT_URI: &str = "http://localhost:9999/callback";
const CODE: &str = "authcode";

fn config(url: Option<String>) -> ProviderConfig {
    ProviderConfig {
        enabled: true,
        url,
        client_id: vec!["testclientid".into()],
        secret: "testsecret".into(),
        redirect_uri: REDIRECT_URI.into(),
        scopes: None,
    }
}

fn provider(server: &MockServer, url: Option<String>) -> DescopeProvider {
    DescopeProvider::with_default_base(&config(url), "", reqwest::Client::new(), &server.uri())
        .unwrap()
}

fn encoded(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

fn token() -> OAuthToken {
    OAuthToken {
        access_token: "DS_TOKEN".into(),
        token_type: "Bearer".into(),
        expires_in: Some(100000),
        refresh_token: Some("DSR_TOKEN".into()),
        scope: None,
        id_token: None,
    }
}

async fn mount_token_endpoint(server: &MockServer, prefix: &str) {
    Mock::given(method("POST"))
        .and(path(format!("{prefix}/oauth2/v1/token")))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains(format!("code={CODE}")))
        .and(body_string_contains(format!("redirect_uri={}", encoded(REDIRECT_URI))))
        .and(body_string_contains("client_id=testclientid"))
        .and(body_string_contains("client_secret=testsecret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "DS_TOKEN",
            "refresh_token": "DSR_TOKEN",
            "expires_in": 100000
        })))
        .with_priority(1)
        .up_to_n_times(1)
        .expect(1)
        .mount(server)
        .await;

    // Codes are single-use: anything after the first exchange is rejected.
    Mock::given(method("POST"))
        .and(path(format!("{prefix}/oauth2/v1/token")))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "authorization code already used"
        })))
        .with_priority(2)
        .mount(server)
        .await;
}

async fn mount_userinfo(server: &MockServer, prefix: &str, user: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("{prefix}/oauth2/v1/userinfo")))
        .and(header("authorization", "Bearer DS_TOKEN"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn exchange_posts_expected_form() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "").await;

    let token = provider(&server, None).exchange_code(CODE).await.unwrap();

    assert_eq!(token.access_token, "DS_TOKEN");
    assert_eq!(token.refresh_token.as_deref(), Some("DSR_TOKEN"));
    assert_eq!(token.expires_in, Some(100000));
}

#[tokio::test]
async fn exchanging_the_same_code_twice_fails() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "").await;
    let provider = provider(&server, None);

    assert!(provider.exchange_code(CODE).await.is_ok());
    let second = provider.exchange_code(CODE).await;
    match second {
        Err(AuthError::TokenExchangeFailed(msg)) => assert!(msg.contains("invalid_grant")),
        other => panic!("expected TokenExchangeFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn verified_email_becomes_primary() {
    let server = MockServer::start().await;
    mount_userinfo(
        &server,
        "",
        serde_json::json!({
            "sub": "123",
            "name": "Descope Test",
            "email": "a@b.com",
            "email_verified": true,
            "given_name": "Descope",
            "family_name": "Test",
            "picture": "http://example.com/avatar",
            "phone_number": "+15555550100",
            "phone_verified": false,
            "loginIds": ["a@b.com"]
        }),
    )
    .await;

    let data = provider(&server, None)
        .fetch_user_data(&token())
        .await
        .unwrap();

    assert_eq!(data.emails, vec![Email::new("a@b.com", true, true)]);
    assert_eq!(data.metadata.subject, "123");
    assert_eq!(data.metadata.provider_id, "123");
    assert_eq!(data.metadata.issuer, server.uri());
    assert_eq!(data.metadata.name.as_deref(), Some("Descope Test"));
    assert_eq!(data.metadata.given_name.as_deref(), Some("Descope"));
    assert_eq!(data.metadata.family_name.as_deref(), Some("Test"));
    assert_eq!(data.metadata.phone.as_deref(), Some("+15555550100"));
    assert!(data.metadata.email_verified);
    assert!(!data.metadata.phone_verified);
}

#[tokio::test]
async fn missing_email_yields_no_emails() {
    let server = MockServer::start().await;
    mount_userinfo(&server, "", serde_json::json!({ "sub": "123", "name": "No Mail" })).await;

    let data = provider(&server, None)
        .fetch_user_data(&token())
        .await
        .unwrap();

    assert!(data.emails.is_empty());
    assert!(data.metadata.email.is_none());
    assert!(!data.metadata.email_verified);
    assert_eq!(data.metadata.subject, "123");
}

#[tokio::test]
async fn missing_verification_flag_defaults_to_unverified() {
    let server = MockServer::start().await;
    mount_userinfo(&server, "", serde_json::json!({ "sub": "123", "email": "a@b.com" })).await;

    let data = provider(&server, None)
        .fetch_user_data(&token())
        .await
        .unwrap();

    assert_eq!(data.emails, vec![Email::new("a@b.com", false, true)]);
}

#[tokio::test]
async fn profile_without_subject_is_rejected() {
    let server = MockServer::start().await;
    mount_userinfo(&server, "", serde_json::json!({ "email": "a@b.com" })).await;

    let result = provider(&server, None).fetch_user_data(&token()).await;
    assert!(matches!(result, Err(AuthError::ProfileFetchFailed(_))));
}

#[tokio::test]
async fn rejected_access_token_is_profile_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth2/v1/userinfo"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = provider(&server, None).fetch_user_data(&token()).await;
    assert!(matches!(result, Err(AuthError::ProfileFetchFailed(_))));
}

#[tokio::test]
async fn project_id_is_routed_to_default_base() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "/P2project").await;
    mount_userinfo(&server, "/P2project", serde_json::json!({ "sub": "123" })).await;

    // The configured host is never contacted; only its project segment is kept.
    let provider = provider(&server, Some("https://auth.example.com/P2project".into()));
    assert_eq!(provider.api_host(), format!("{}/P2project", server.uri()));

    let token = provider.exchange_code(CODE).await.unwrap();
    let data = provider.fetch_user_data(&token).await.unwrap();
    assert_eq!(data.metadata.issuer, format!("{}/P2project", server.uri()));
}
