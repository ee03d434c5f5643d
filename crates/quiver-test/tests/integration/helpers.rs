#![allow(clippy::unused_async, clippy::expect_used, unused_must_use, dead_code)]
//! Test helpers for integration tests.
//!
//! Provides utilities for:
//! - Creating an isolated test server (fresh store and version keys per test)
//! - Making HTTP requests
//! - Asserting on responses
//! - Seeding accounts and spaces through the public API

use salvo::http::header::HeaderName;
use salvo::http::{Method, ReqBody, StatusCode};
use salvo::prelude::*;
use salvo::test::{RequestBuilder, ResponseExt};
use serde_json::{Value, json};

pub use quiver_test::{TestServer, test_config};
pub use tracing;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Test request builder for constructing HTTP requests.
pub struct TestRequest {
    method: Method,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl TestRequest {
    /// Creates a new test request with the given method and path.
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Adds a header to the request.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Sets `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", &format!("Bearer {token}"))
    }

    #[must_use]
    pub fn api_key(self, key: &str) -> Self {
        self.header("x-api-key", key)
    }

    #[must_use]
    pub fn space_password(self, password: &str) -> Self {
        self.header("x-space-password", password)
    }

    /// Sets a JSON request body.
    #[must_use]
    pub fn json(mut self, value: &Value) -> Self {
        self.body = Some(serde_json::to_vec(value).expect("serialize request body"));
        self.header("Content-Type", "application/json")
    }

    /// Sets a JSON content type with a body sent verbatim, well-formed or not.
    #[must_use]
    pub fn raw_json(mut self, body: &str) -> Self {
        self.body = Some(body.as_bytes().to_vec());
        self.header("Content-Type", "application/json")
    }

    /// Sends the request to the test service and returns the response.
    ///
    /// ## Panics
    /// Panics if the response cannot be read.
    pub async fn send(self, service: &Service) -> TestResponse {
        let url = format!("http://127.0.0.1:8787{}", self.path);
        let mut client = RequestBuilder::new(&url, self.method.clone());

        for (name, value) in self.headers {
            if let Ok(header_name) = HeaderName::try_from(name.as_str()) {
                client = client.add_header(header_name, value, true);
            }
        }

        if let Some(body_bytes) = self.body {
            client = client.body(ReqBody::Once(body_bytes.into()));
        }

        let mut response = client.send(service).await;

        let status = response.status_code.unwrap_or(StatusCode::OK);

        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let body: Vec<u8> = response.take_bytes(None).await.unwrap_or_default().to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Represents an HTTP test response for assertions.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Asserts that the response status matches the expected code.
    #[must_use]
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {expected} but got {}: {}",
            self.status,
            self.body_string()
        );
        self
    }

    /// Asserts that a header has exactly the expected value.
    #[must_use]
    pub fn assert_header(self, name: &str, expected: &str) -> Self {
        let actual = self.get_header(name);
        assert_eq!(
            actual,
            Some(expected),
            "Expected header {name}: {expected} but got {actual:?}"
        );
        self
    }

    #[must_use]
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parses the body as JSON.
    ///
    /// ## Panics
    /// Panics if the body is not valid JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("Body is not JSON ({e}): {}", self.body_string()))
    }

    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// ============================================================================
// Seeding Helpers
// ============================================================================

/// Reads a string field from a JSON document by pointer.
#[must_use]
pub fn json_str(value: &Value, pointer: &str) -> String {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("Missing string at {pointer} in {value}"))
        .to_string()
}

/// Initializes the installation with the standard admin and returns its token.
pub async fn init_admin(server: &TestServer) -> String {
    let response = TestRequest::post("/auth/init")
        .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK);
    json_str(&response.json(), "/token")
}

/// Logs in and returns the bearer token.
pub async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = TestRequest::post("/auth/login")
        .json(&json!({ "username": username, "password": password }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK);
    json_str(&response.json(), "/token")
}

/// Registers a member through the admin and returns the member's token.
pub async fn register_member(server: &TestServer, admin_token: &str, username: &str) -> String {
    TestRequest::post("/auth/register")
        .bearer(admin_token)
        .json(&json!({ "username": username, "password": "member-pass" }))
        .send(&server.service)
        .await
        .assert_status(StatusCode::CREATED);
    login(server, username, "member-pass").await
}

/// Creates a space for the token's owner and returns its id.
pub async fn create_space(
    server: &TestServer,
    token: &str,
    name: &str,
    password: Option<&str>,
) -> String {
    let body = match password {
        Some(password) => json!({ "name": name, "isEncrypted": true, "password": password }),
        None => json!({ "name": name }),
    };
    let response = TestRequest::post("/spaces")
        .bearer(token)
        .json(&body)
        .send(&server.service)
        .await
        .assert_status(StatusCode::CREATED);
    json_str(&response.json(), "/data/id")
}

/// Current token of a version category, as served by `GET /version`.
pub async fn version_of(server: &TestServer, category: &str) -> String {
    let response = TestRequest::get("/version")
        .send(&server.service)
        .await
        .assert_status(StatusCode::OK);
    json_str(&response.json(), &format!("/data/{category}"))
}

/// Builds an isolated server.
///
/// ## Panics
/// Panics if the test configuration is rejected.
#[must_use]
pub fn server() -> TestServer {
    TestServer::new().expect("Failed to build test server")
}

/// Builds an isolated server whose anonymous callers read `username`'s spaces.
///
/// ## Panics
/// Panics if the test configuration is rejected.
#[must_use]
pub fn public_server(username: &str) -> TestServer {
    TestServer::with_public_owner(username).expect("Failed to build test server")
}
