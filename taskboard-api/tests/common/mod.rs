/// Common test utilities for integration tests
///
/// Every test gets its own router over a fresh in-memory store, so tests run
/// in parallel without a database.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskboard_shared::auth::jwt::{create_token, Claims};
use taskboard_shared::auth::password::Argon2Encoder;
use taskboard_shared::service::Services;
use taskboard_shared::store::memory::MemoryStore;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// A response with its body already read
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("response body is not UTF-8")
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// Test context holding the router
pub struct TestContext {
    pub app: Router,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let config = test_config();
        // Low argon2 cost keeps registration fast
        let services = Services::new(
            Arc::new(MemoryStore::new()),
            Arc::new(Argon2Encoder::with_cost(1024, 1, 1)),
        );
        let app = build_router(AppState::new(services, config.clone()));
        Self { app, config }
    }

    /// Mints a token for `user_id` without going through `/api/login`
    pub fn token_for(&self, user_id: i64, email: &str) -> String {
        create_token(&Claims::new(user_id, email), &self.config.jwt.secret)
            .expect("failed to create token")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body")
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Registers a user through the public endpoint and returns its id and a token
    pub async fn register(&self, email: &str, password: &str) -> (i64, String) {
        let response = self
            .send(
                Method::POST,
                "/api/users",
                None,
                Some(serde_json::json!({
                    "firstName": "Test",
                    "lastName": "User",
                    "email": email,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());

        let id = response.json()["id"].as_i64().expect("user id");
        let token = self.token_for(id, email);
        (id, token)
    }

    /// Creates a status and returns its id
    pub async fn create_status(&self, token: &str, name: &str, slug: &str) -> i64 {
        let response = self
            .post(
                "/api/task_statuses",
                token,
                serde_json::json!({ "name": name, "slug": slug }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json()["id"].as_i64().expect("status id")
    }

    /// Creates a label and returns its id
    pub async fn create_label(&self, token: &str, name: &str) -> i64 {
        let response = self
            .post("/api/labels", token, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text());
        response.json()["id"].as_i64().expect("label id")
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
            auto_create: false,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            ttl_hours: 1,
        },
    }
}
