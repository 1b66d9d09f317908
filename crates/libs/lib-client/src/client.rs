//! # API Client
//!
//! Typed HTTP client for the IntelliConnect backend.

use crate::error::{ClientError, Result};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::dto::{
    Attachment, AuthResponse, ConnectionStatus, ConnectionView, ConnectionsListResponse, ConversationsListResponse,
    CreateConnectionRequest, LoginRequest, MarkReadResponse, MentorRecommendationsResponse, MentorSearchRequest,
    MentorSearchResponse, MessageDto, MessagesListResponse, ProfileDto, ProfileUpdateRequest, SendMessageRequest,
    SignupRequest, UpdateStatusRequest,
};
use std::time::Duration;
use tracing::debug;

/// Default backend address
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3001";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the backend API.
///
/// Regular calls time out after 10 seconds. Event streams use a second client with
/// only a connect timeout, since they stay open indefinitely.
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) client: Client,
    pub(crate) stream_client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        let stream_client = Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            stream_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.authorize(builder).send().await?;
        parse(response).await
    }

    // ========== Auth ==========

    /// Create an account. The returned token is stored on the client.
    pub async fn signup(&mut self, request: &SignupRequest) -> Result<AuthResponse> {
        let auth: AuthResponse = self
            .execute(self.client.post(self.url("/api/auth/signup")).json(request))
            .await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    /// Log in. The returned token is stored on the client.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<AuthResponse> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let auth: AuthResponse = self
            .execute(self.client.post(self.url("/api/auth/login")).json(&request))
            .await?;
        self.token = Some(auth.token.clone());
        Ok(auth)
    }

    // ========== Profiles ==========

    pub async fn my_profile(&self) -> Result<ProfileDto> {
        self.execute(self.client.get(self.url("/api/profiles/me"))).await
    }

    pub async fn update_my_profile(&self, update: &ProfileUpdateRequest) -> Result<ProfileDto> {
        self.execute(self.client.put(self.url("/api/profiles/me")).json(update)).await
    }

    pub async fn profile(&self, user_id: i64) -> Result<ProfileDto> {
        self.execute(self.client.get(self.url(&format!("/api/profiles/{}", user_id))))
            .await
    }

    // ========== Connections ==========

    pub async fn create_connection(&self, receiver_id: i64) -> Result<ConnectionView> {
        let request = CreateConnectionRequest { receiver_id };
        self.execute(self.client.post(self.url("/api/connections")).json(&request))
            .await
    }

    pub async fn list_connections(&self, status: Option<ConnectionStatus>) -> Result<Vec<ConnectionView>> {
        let mut builder = self.client.get(self.url("/api/connections"));
        if let Some(status) = status {
            builder = builder.query(&[("status", status.as_str())]);
        }
        let list: ConnectionsListResponse = self.execute(builder).await?;
        Ok(list.connections)
    }

    pub async fn update_connection_status(&self, connection_id: i64, status: ConnectionStatus) -> Result<ConnectionView> {
        let request = UpdateStatusRequest { status };
        self.execute(
            self.client
                .post(self.url(&format!("/api/connections/{}/status", connection_id)))
                .json(&request),
        )
        .await
    }

    pub async fn list_conversations(&self) -> Result<ConversationsListResponse> {
        self.execute(self.client.get(self.url("/api/conversations"))).await
    }

    // ========== Chat ==========

    pub async fn list_messages(&self, connection_id: i64) -> Result<Vec<MessageDto>> {
        let list: MessagesListResponse = self
            .execute(
                self.client
                    .get(self.url(&format!("/api/connections/{}/messages", connection_id))),
            )
            .await?;
        Ok(list.messages)
    }

    pub async fn send_message(&self, connection_id: i64, request: &SendMessageRequest) -> Result<MessageDto> {
        self.execute(
            self.client
                .post(self.url(&format!("/api/connections/{}/messages", connection_id)))
                .json(request),
        )
        .await
    }

    pub async fn mark_read(&self, connection_id: i64) -> Result<u64> {
        let response: MarkReadResponse = self
            .execute(
                self.client
                    .post(self.url(&format!("/api/connections/{}/read", connection_id))),
            )
            .await?;
        Ok(response.updated)
    }

    /// Upload raw bytes. Size limits are checked by [`ChatSession`](crate::ChatSession)
    /// before calling this.
    pub async fn upload_attachment(
        &self,
        connection_id: i64,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Attachment> {
        debug!("Uploading {} ({} bytes) to connection {}", name, bytes.len(), connection_id);
        self.execute(
            self.client
                .post(self.url(&format!("/api/connections/{}/attachments", connection_id)))
                .query(&[("name", name)])
                .header(header::CONTENT_TYPE, mime_type)
                .body(bytes),
        )
        .await
    }

    // ========== Mentors ==========

    pub async fn search_mentors(&self, query: &str, skill: Option<&str>) -> Result<MentorSearchResponse> {
        let request = MentorSearchRequest {
            query: query.to_string(),
            skill: skill.map(str::to_string),
        };
        self.execute(self.client.post(self.url("/api/mentors/search")).json(&request))
            .await
    }

    pub async fn mentor_recommendations(&self) -> Result<MentorRecommendationsResponse> {
        self.execute(self.client.get(self.url("/api/mentors/recommendations")))
            .await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Decode a success body or turn the error body into a [`ClientError::Api`].
pub(crate) async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_response(status.as_u16(), &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Json, Router};
    use serde_json::json;

    async fn mock_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = ApiClient::new("http://localhost:3001/");
        assert_eq!(client.url("/health"), "http://localhost:3001/health");
        assert!(client.token().is_none());
        assert_eq!(client.with_token("t").token(), Some("t"));
    }

    #[tokio::test]
    async fn test_gate_failure_carries_code() {
        let router = Router::new().route(
            "/api/connections/{id}/messages",
            get(|| async {
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({"error": "Chat is available once the connection is accepted", "code": "NotAccepted"})),
                )
            }),
        );
        let client = ApiClient::new(mock_server(router).await).with_token("token");

        let err = client.list_messages(3).await.unwrap_err();

        assert!(err.is_gate_failure());
        assert!(matches!(err, ClientError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_list_messages_decodes() {
        let router = Router::new().route(
            "/api/connections/{id}/messages",
            get(|| async {
                Json(json!({"messages": [{
                    "id": 1, "connection_id": 3, "sender_id": 7, "content": "hello",
                    "created_at": "2025-01-01T00:00:00Z", "read": false
                }]}))
            }),
        );
        let client = ApiClient::new(mock_server(router).await).with_token("token");

        let messages = client.list_messages(3).await.unwrap();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hello");
        assert!(messages[0].attachment.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let client = ApiClient::new("http://127.0.0.1:1");
        let err = client.list_conversations().await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }
}
