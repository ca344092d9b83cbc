//! Integration tests for registration, token issue and bearer authentication.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{body_json, test_config, TestHarness};
use tower::ServiceExt;
use typeshift::auth::{Claims, TokenSigner};

fn register_request(username: &str, password: &str) -> Request<Body> {
    Request::post("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({
                "username": username,
                "password": password,
                "email": format!("{username}@example.com"),
            })
            .to_string(),
        ))
        .unwrap()
}

fn token_request(username: &str, password: &str) -> Request<Body> {
    Request::post("/token")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))
        .unwrap()
}

fn me_request(token: &str) -> Request<Body> {
    Request::get("/users/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn register_then_duplicate() {
    let h = TestHarness::new();

    let response = h.app().oneshot(register_request("alice", "pw")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["message"], "User alice registered successfully");

    let response = h.app().oneshot(register_request("alice", "other")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["detail"], "Username already registered");
}

#[tokio::test]
async fn register_rejects_malformed_body() {
    let h = TestHarness::new();

    let response = h
        .app()
        .oneshot(
            Request::post("/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"username": "bob"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert!(json["detail"].is_string());
}

#[tokio::test]
async fn login_issues_bearer_token() {
    let h = TestHarness::new();
    h.app().oneshot(register_request("alice", "pw")).await.unwrap();

    let response = h.app().oneshot(token_request("alice", "pw")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["token_type"], "bearer");
    let token = json["access_token"].as_str().unwrap().to_string();

    let response = h.app().oneshot(me_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    assert_eq!(json["username"], "alice");
    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["disabled"], false);
    assert!(json.get("password_hash").is_none());
}

#[tokio::test]
async fn wrong_password_is_401_with_challenge() {
    let h = TestHarness::new();
    h.app().oneshot(register_request("alice", "pw")).await.unwrap();

    for (user, pass) in [("alice", "wrong"), ("nobody", "pw")] {
        let response = h.app().oneshot(token_request(user, pass)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        let json = body_json(response.into_body()).await;
        assert_eq!(json["detail"], "Incorrect username or password");
    }
}

#[tokio::test]
async fn users_me_requires_token() {
    let h = TestHarness::new();

    let response = h
        .app()
        .oneshot(Request::get("/users/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    let json = body_json(response.into_body()).await;
    assert_eq!(json["detail"], "Could not validate credentials");
}

#[tokio::test]
async fn users_me_requires_token_even_when_auth_disabled() {
    let mut config = test_config();
    config.server.auth.enabled = false;
    let h = TestHarness::with_config(config);

    let response = h
        .app()
        .oneshot(Request::get("/users/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tampered_token_rejected() {
    let h = TestHarness::new();
    let token = h.user_token("alice");

    let mut tampered = token.clone().into_bytes();
    let first_sig = token.rfind('.').unwrap() + 1;
    tampered[first_sig] = if tampered[first_sig] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(tampered).unwrap();

    let response = h.app().oneshot(me_request(&tampered)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = h.app().oneshot(me_request("not-a-token")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_rejected() {
    let h = TestHarness::new();
    h.user_token("alice");

    let token = h.ctx.auth.issue_at("alice", 1_000).access_token;
    let response = h.app().oneshot(me_request(&token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_from_previous_secret_accepted() {
    let mut config = test_config();
    config.server.auth.secret = Some("new-secret".into());
    config.server.auth.previous_secrets = vec!["old-secret".into()];
    let h = TestHarness::with_config(config);
    h.user_token("alice");

    let exp = chrono::Utc::now().timestamp() as u64 + 600;
    let old = TokenSigner::new("old-secret", &[]).sign(&Claims {
        sub: "alice".into(),
        exp,
    });
    let response = h.app().oneshot(me_request(&old)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let unknown = TokenSigner::new("other-secret", &[]).sign(&Claims {
        sub: "alice".into(),
        exp,
    });
    let response = h.app().oneshot(me_request(&unknown)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_flow_over_http() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/register"))
        .json(&serde_json::json!({"username": "carol", "password": "pw", "email": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("http://{addr}/token"))
        .form(&[("username", "carol"), ("password", "pw")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    let token = json["access_token"].as_str().unwrap();

    let resp = client
        .get(format!("http://{addr}/users/me"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["username"], "carol");
}
