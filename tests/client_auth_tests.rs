mod support;

use livly::api::{ApiError, LivlyClient};
use livly::auth::credentials::unix_now;
use livly::auth::AuthError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{client_for, fresh_entry, packages_body, packages_path, token_body, PHONE};

fn auth_client(server: &MockServer) -> LivlyClient {
    LivlyClient::new()
        .with_auth_base_url(server.uri())
        .with_api_base_url(server.uri())
}

#[tokio::test]
async fn request_otp_posts_sms_start() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/passwordless/start"))
        .and(body_partial_json(json!({
            "client_id": "ubEvB5okpRuQswblDO2MPYyDScnI2hGn",
            "phone_number": PHONE,
            "send": "code",
            "connection": "sms",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_id": "x"})))
        .expect(1)
        .mount(&server)
        .await;

    auth_client(&server).request_otp(PHONE).await.unwrap();
}

#[tokio::test]
async fn request_otp_rejected_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/passwordless/start"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let err = auth_client(&server).request_otp(PHONE).await.unwrap_err();
    assert!(matches!(err, AuthError::Status { status: 400, .. }));
    assert_eq!(err.to_string(), "Send OTP failed: 400");
}

#[tokio::test]
async fn verify_otp_installs_token_set() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_partial_json(json!({
            "username": PHONE,
            "otp": "123456",
            "realm": "sms",
            "grant_type": "http://auth0.com/oauth/grant-type/passwordless/otp",
            "scope": "openid profile email offline_access",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_body("tokA", "tokR", "tokI", 3600)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut client = auth_client(&server);
    let before = unix_now();
    let bundle = client.verify_otp(PHONE, "123456").await.unwrap();

    assert_eq!(bundle.access_token, "tokA");
    assert_eq!(client.access_token(), Some("tokA"));
    assert_eq!(client.refresh_token(), Some("tokR"));
    assert_eq!(client.id_token(), Some("tokI"));
    let expected = before + 3600.0;
    assert!((client.token_expires_at() - expected).abs() < 5.0);
}

#[tokio::test]
async fn verify_otp_failure_leaves_credentials_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "invalid_grant"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = auth_client(&server);
    client.set_tokens("old-access", "old-refresh", "old-id", 1234.0);
    let err = client.verify_otp(PHONE, "000000").await.unwrap_err();

    assert!(matches!(err, AuthError::Status { status: 403, .. }));
    assert_eq!(client.access_token(), Some("old-access"));
    assert_eq!(client.refresh_token(), Some("old-refresh"));
    assert_eq!(client.token_expires_at(), 1234.0);
}

#[tokio::test]
async fn verify_otp_partial_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tokA",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let mut client = auth_client(&server);
    let err = client.verify_otp(PHONE, "123456").await.unwrap_err();

    assert!(matches!(err, AuthError::InvalidResponse(_)));
    assert!(client.access_token().is_none());
}

#[tokio::test]
async fn refresh_without_refresh_token_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = auth_client(&server);
    let err = client.refresh_access_token().await.unwrap_err();
    assert!(matches!(err, AuthError::MissingRefreshToken));
    assert_eq!(err.to_string(), "No refresh token available");
}

#[tokio::test]
async fn refresh_keeps_tokens_the_response_omits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_partial_json(json!({
            "grant_type": "refresh_token",
            "refresh_token": "refresh-1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server, &fresh_entry());
    let before = unix_now();
    client.refresh_access_token().await.unwrap();

    assert_eq!(client.access_token(), Some("access-2"));
    assert_eq!(client.refresh_token(), Some("refresh-1"));
    assert_eq!(client.id_token(), Some("id-1"));
    assert!((client.token_expires_at() - (before + 7200.0)).abs() < 5.0);
}

#[tokio::test]
async fn refresh_takes_rotated_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("access-2", "refresh-2", "id-2", 3600)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server, &fresh_entry());
    client.refresh_access_token().await.unwrap();

    assert_eq!(client.refresh_token(), Some("refresh-2"));
    assert_eq!(client.id_token(), Some("id-2"));
}

#[tokio::test]
async fn refresh_rejected_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server, &fresh_entry());
    let err = client.refresh_access_token().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(client.access_token(), Some("access-1"));
}

#[tokio::test]
async fn ensure_valid_token_skips_refresh_when_fresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut entry = fresh_entry();
    entry.token_expires_at = unix_now() + 301.0 + 60.0;
    let mut client = client_for(&server, &entry);
    client.ensure_valid_token().await.unwrap();
    assert_eq!(client.access_token(), Some("access-1"));
}

#[tokio::test]
async fn ensure_valid_token_refreshes_inside_margin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("access-2", "refresh-1", "id-1", 3600)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut entry = fresh_entry();
    entry.token_expires_at = unix_now() + 120.0;
    let mut client = client_for(&server, &entry);
    client.ensure_valid_token().await.unwrap();
    assert_eq!(client.access_token(), Some("access-2"));
}

#[tokio::test]
async fn ensure_valid_token_refreshes_expired_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("access-2", "refresh-1", "id-1", 3600)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut entry = fresh_entry();
    entry.token_expires_at = unix_now() - 60.0;
    let mut client = client_for(&server, &entry);
    client.ensure_valid_token().await.unwrap();
    assert_eq!(client.access_token(), Some("access-2"));
}

#[tokio::test]
async fn ensure_valid_token_requires_login() {
    let server = MockServer::start().await;
    let mut client = auth_client(&server);
    let err = client.ensure_valid_token().await.unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated));
}

#[tokio::test]
async fn unauthenticated_fetch_fails_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut client = auth_client(&server);
    let err = client.get_pending_packages().await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::NotAuthenticated)));
}

#[tokio::test]
async fn api_calls_carry_bearer_and_app_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(packages_path()))
        .and(header("authorization", "Bearer access-1"))
        .and(header("x-app-id", "com.livly.android.livly_resident"))
        .and(header("user-agent", "okhttp/4.12.0"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(packages_body(1)))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server, &fresh_entry());
    let packages = client.get_pending_packages().await.unwrap();
    assert_eq!(packages.len(), 1);
}

const UNREACHABLE: &str = "http://127.0.0.1:1";

fn unreachable_client() -> LivlyClient {
    LivlyClient::new()
        .with_auth_base_url(UNREACHABLE)
        .with_api_base_url(UNREACHABLE)
}

#[tokio::test]
async fn request_otp_unreachable_host_is_network_error() {
    let err = unreachable_client().request_otp(PHONE).await.unwrap_err();
    assert!(matches!(err, AuthError::Network(_)), "{err:?}");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn refresh_unreachable_host_is_network_error() {
    let mut client = unreachable_client();
    client.set_credentials(fresh_entry().credentials());

    let err = client.refresh_access_token().await.unwrap_err();

    assert!(matches!(err, AuthError::Network(_)), "{err:?}");
    assert_eq!(client.access_token(), Some("access-1"));
}

#[tokio::test]
async fn refresh_accepts_fractional_lifetime() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "expires_in": 3600.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = client_for(&server, &fresh_entry());
    let before = unix_now();
    client.refresh_access_token().await.unwrap();

    assert_eq!(client.access_token(), Some("access-2"));
    assert!((client.token_expires_at() - (before + 3600.0)).abs() < 5.0);
}
