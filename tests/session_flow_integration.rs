mod common;

use common::{build_client, file_store_yaml, load_test_config, memory_store_yaml, CountingNotifier};
use http::StatusCode;
use metascan_client::auth::SessionEvent;
use metascan_client::error::AuthError;
use mockito::{Matcher, Server};
use serde_json::json;

/// A signed JWT whose payload carries role/user_id/email claims, built the
/// way the backend would.
fn signed_token(role: &str, user_id: u64, email: &str) -> String {
    let claims = json!({
        "role": role,
        "user_id": user_id,
        "email": email,
        "exp": 4102444800i64
    });
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"test-secret"),
    )
    .expect("failed to sign test token")
}

/// Full happy path: login, then an authenticated request carrying the
/// issued bearer token.
#[tokio::test]
async fn test_login_then_authenticated_request() {
    let mut server = Server::new_async().await;
    let token = signed_token("admin", 7, "alice@example.com");

    let login = server
        .mock("POST", "/login/")
        .match_body(Matcher::Json(json!({"email": "alice", "password": "pw"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(r#"{{"access":"{token}","refresh":"R1"}}"#))
        .create_async()
        .await;
    let list = server
        .mock("GET", "/cavaletes/")
        .match_header("authorization", format!("Bearer {token}").as_str())
        .with_status(200)
        .with_body(r#"[{"id":1,"nome":"CAV-01"}]"#)
        .create_async()
        .await;

    let config = load_test_config(&server.url(), &memory_store_yaml());
    let notifier = CountingNotifier::new();
    let (client, session) = build_client(&config, notifier.clone());

    session.login("alice", "pw").await.expect("login should succeed");
    login.assert_async().await;

    // Claims were not in the login body, so they come from the token payload.
    assert_eq!(session.user_role().as_deref(), Some("admin"));
    assert_eq!(session.user_id().as_deref(), Some("7"));
    assert_eq!(session.user_email().as_deref(), Some("alice@example.com"));

    let response = client
        .get("cavaletes/")
        .await
        .expect("request should succeed")
        .expect("response should be present");
    list.assert_async().await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(notifier.count(), 0);
}

/// Mid-session expiry recovered silently: 401, one refresh, one retry with
/// the new token, and the store updated.
#[tokio::test]
async fn test_expired_token_is_refreshed_transparently() {
    let mut server = Server::new_async().await;

    let stale = server
        .mock("GET", "/slots/")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/token/refresh/")
        .match_body(Matcher::Json(json!({"refresh": "R1"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access":"A2","refresh":"R2"}"#)
        .expect(1)
        .create_async()
        .await;
    let retried = server
        .mock("GET", "/slots/")
        .match_header("authorization", "Bearer A2")
        .with_status(200)
        .with_body(r#"[]"#)
        .expect(1)
        .create_async()
        .await;

    let config = load_test_config(&server.url(), &memory_store_yaml());
    let notifier = CountingNotifier::new();
    let (client, session) = build_client(&config, notifier.clone());
    session.save_tokens("A1", "R1", None);

    let response = client
        .get("slots/")
        .await
        .expect("request should succeed")
        .expect("response should be present");

    stale.assert_async().await;
    refresh.assert_async().await;
    retried.assert_async().await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(session.access_token().as_deref(), Some("A2"));
    assert_eq!(session.refresh_token().as_deref(), Some("R2"));
    assert_eq!(notifier.count(), 0);
}

/// Two requests failing with 401 at the same time share a single refresh
/// call and both retry against the new token.
#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let mut server = Server::new_async().await;

    let stale = server
        .mock("GET", "/cavaletes/")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(2)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/token/refresh/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access":"A2"}"#)
        .expect(1)
        .create_async()
        .await;
    let retried = server
        .mock("GET", "/cavaletes/")
        .match_header("authorization", "Bearer A2")
        .with_status(200)
        .with_body(r#"[]"#)
        .expect(2)
        .create_async()
        .await;

    let config = load_test_config(&server.url(), &memory_store_yaml());
    let notifier = CountingNotifier::new();
    let (client, session) = build_client(&config, notifier.clone());
    session.save_tokens("A1", "R1", None);

    let (first, second) = futures::future::join(
        client.get("cavaletes/"),
        client.get("cavaletes/"),
    )
    .await;

    stale.assert_async().await;
    refresh.assert_async().await;
    retried.assert_async().await;

    let first = first.expect("first request should succeed").expect("present");
    let second = second.expect("second request should succeed").expect("present");
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(session.access_token().as_deref(), Some("A2"));
    assert_eq!(notifier.count(), 0);
}

/// Unrecoverable 401 (refresh rejected): notice, logout, empty resolution,
/// logged-out event for the UI.
#[tokio::test]
async fn test_dead_session_is_expired_and_cleared() {
    let mut server = Server::new_async().await;

    let stale = server
        .mock("GET", "/users/")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/token/refresh/")
        .with_status(401)
        .with_body(r#"{"detail":"Token is invalid or expired"}"#)
        .expect(1)
        .create_async()
        .await;

    let config = load_test_config(&server.url(), &memory_store_yaml());
    let notifier = CountingNotifier::new();
    let (client, session) = build_client(&config, notifier.clone());
    session.save_tokens("A1", "R1", None);
    let mut events = session.subscribe();

    let result = client.get("users/").await.expect("no error surfaces");

    stale.assert_async().await;
    refresh.assert_async().await;

    assert!(result.is_none());
    assert_eq!(notifier.count(), 1);
    assert!(!session.is_authenticated());
    assert!(matches!(events.try_recv(), Ok(SessionEvent::LoggedOut)));
}

/// A 401 from the Sankhya proxy is the ERP's credential problem, not ours:
/// it surfaces as an upstream error and the session survives.
#[tokio::test]
async fn test_sankhya_401_does_not_end_session() {
    let mut server = Server::new_async().await;

    let upstream = server
        .mock("GET", "/sankhya/produtos/")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail":"usuário ou senha ausente"}"#)
        .expect(1)
        .create_async()
        .await;

    let config = load_test_config(&server.url(), &memory_store_yaml());
    let notifier = CountingNotifier::new();
    let (client, session) = build_client(&config, notifier.clone());
    session.save_tokens("A1", "R1", None);

    let error = client
        .get("sankhya/produtos/")
        .await
        .expect_err("upstream failure should surface");
    upstream.assert_async().await;

    match error {
        AuthError::Upstream { message } => assert_eq!(message, "usuário ou senha ausente"),
        other => panic!("expected upstream error, got {:?}", other),
    }
    assert!(session.is_authenticated());
    assert_eq!(notifier.count(), 0);

    // The user-facing message names the integration.
    let user_message = AuthError::Upstream {
        message: "usuário ou senha ausente".to_string(),
    }
    .user_message();
    assert!(user_message.contains("Sankhya"));
}

/// A session persisted to a file store survives a full rebuild of the
/// client stack, the way a page reload would.
#[tokio::test]
async fn test_file_store_session_survives_restart() {
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/login/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access":"A1","refresh":"R1","role":"manager"}"#)
        .create_async()
        .await;

    let mut path = std::env::temp_dir();
    path.push(format!("metascan-it-{}.json", uuid::Uuid::new_v4()));
    let store_yaml = file_store_yaml(&path.to_string_lossy());

    let config = load_test_config(&server.url(), &store_yaml);
    {
        let notifier = CountingNotifier::new();
        let (_client, session) = build_client(&config, notifier);
        session.login("alice", "pw").await.expect("login should succeed");
        login.assert_async().await;
    }

    // Rebuild everything from the same config: the session is still there.
    let notifier = CountingNotifier::new();
    let (_client, session) = build_client(&config, notifier);
    assert!(session.is_authenticated());
    assert_eq!(session.access_token().as_deref(), Some("A1"));
    assert_eq!(session.user_role().as_deref(), Some("manager"));

    session.logout();
    assert!(!session.is_authenticated());

    let _ = std::fs::remove_file(&path);
}
