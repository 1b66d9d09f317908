//! Shared fixtures for router-level tests.

use crate::chat::Relay;
use crate::server::{create_router, AppState};
use crate::services::{LlmClient, LocalObjectStore};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use lib_auth::encode_jwt;
use lib_core::config::LlmConfig;
use lib_core::model::store::{ConnectionRepository, ProfileForCreate, ProfileRepository, UserRepository};
use lib_core::{create_memory_pool, Config};
use serde_json::Value;
use shared::dto::{ConnectionStatus, UserRole};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-must-be-at-least-32-characters-long!";
pub const TEST_BASE_URL: &str = "http://127.0.0.1:3001";

pub struct TestApp {
    pub state: AppState,
    _attachments: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let attachments = tempfile::tempdir().unwrap();
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: TEST_SECRET.to_string(),
            jwt_expiration_hours: 24,
            attachments_dir: attachments.path().to_path_buf(),
            public_base_url: TEST_BASE_URL.to_string(),
            llm: LlmConfig::default(),
        };

        let state = AppState {
            db: create_memory_pool().await.unwrap(),
            objects: Arc::new(LocalObjectStore::new(attachments.path())),
            llm: Arc::new(LlmClient::new(config.llm.clone()).unwrap()),
            config: Arc::new(config),
            relay: Arc::new(Relay::new()),
        };

        Self { state, _attachments: attachments }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone(), &[])
    }

    /// Create an account directly in the store and return `(user_id, token)`.
    pub async fn user(&self, email: &str, name: &str, role: UserRole) -> (i64, String) {
        let user = UserRepository::create(&self.state.db, email, "not-a-real-hash").await.unwrap();
        let profile = ProfileForCreate {
            full_name: name.to_string(),
            institution: "State University".to_string(),
            role,
        };
        ProfileRepository::create(&self.state.db, user.id, &profile).await.unwrap();

        let token = encode_jwt(user.id, email, &role.to_string(), TEST_SECRET, 1).unwrap();
        (user.id, token)
    }

    /// A connection from `requester` to `receiver`, moved to `status` when not pending.
    pub async fn connection(&self, requester: i64, receiver: i64, status: ConnectionStatus) -> i64 {
        let conn = ConnectionRepository::create(&self.state.db, requester, receiver).await.unwrap();
        if status != ConnectionStatus::Pending {
            ConnectionRepository::update_status_if_pending(&self.state.db, conn.id, status)
                .await
                .unwrap();
        }
        conn.id
    }

    /// Send a JSON request and return the status and the parsed body (`Null` when empty).
    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.dispatch(request).await
    }

    pub async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }
}
