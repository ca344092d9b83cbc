//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds a full [`AppContext`] over a
//! temporary scratch directory with cheap bcrypt. The [`TestHarness::with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use typeshift::config::Config;
use typeshift::server::{create_router, AppContext};

pub const BOUNDARY: &str = "typeshift-test-boundary";

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub scratch: TempDir,
}

/// Default test config: fixed secret, bcrypt cost 4, auth on.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server.auth.secret = Some("integration-test-secret".into());
    config.server.auth.bcrypt_cost = 4;
    config
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Build a harness over `config`, pointing scratch at a fresh temp dir.
    pub fn with_config(mut config: Config) -> Self {
        let scratch = TempDir::new().expect("failed to create scratch dir");
        config.scratch.dir = Some(scratch.path().to_path_buf());
        let ctx = AppContext::from_config(config).expect("failed to build context");
        Self { ctx, scratch }
    }

    pub fn app(&self) -> Router {
        create_router(self.ctx.clone())
    }

    /// Start an Axum server on a random port.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(test_config()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let harness = Self::with_config(config);
        let app = harness.app();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Register `username` directly and return a bearer token for it.
    pub fn user_token(&self, username: &str) -> String {
        self.ctx
            .auth
            .register(username, "password", &format!("{username}@example.com"))
            .expect("failed to register user");
        self.ctx
            .auth
            .login(username, "password")
            .expect("failed to log in")
            .access_token
    }

    /// Files currently present in the scratch directory.
    pub fn scratch_entries(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.scratch.path())
            .expect("failed to read scratch dir")
            .map(|e| e.expect("bad dir entry").path())
            .collect()
    }
}

/// Encode a `file` + `target_format` multipart body.
pub fn multipart_body(filename: &str, data: &[u8], target_format: &str) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(
        format!(
            "\r\n--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"target_format\"\r\n\r\n{target_format}\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );
    body
}

/// Build a `POST /convert` request, optionally authenticated.
pub fn convert_request(
    filename: &str,
    data: &[u8],
    target_format: &str,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::post("/convert").header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(multipart_body(filename, data, target_format)))
        .unwrap()
}

/// Helper to get a response body as bytes
pub async fn body_bytes(body: Body) -> Vec<u8> {
    body.collect().await.unwrap().to_bytes().to_vec()
}

/// Helper to get a response body as JSON
pub async fn body_json(body: Body) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(body).await).unwrap()
}
