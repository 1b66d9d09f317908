//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! [`start_server`] loads the configuration, opens the database, runs the embedded
//! migrations, builds the shared [`AppState`] and serves [`create_router`].

// region: --- Imports
use crate::chat::{self, Relay};
use crate::handlers;
use crate::middleware::{log_requests, stamp_req, RequestStamp};
use crate::services::{LlmClient, LocalObjectStore, ObjectStore};
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use lib_core::{create_pool, run_migrations, AppError, Config, DbPool};
use lib_utils::envs::{get_env_list, get_env_or};
use shared::dto::MAX_ATTACHMENT_BYTES;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub relay: Arc<Relay>,
    pub objects: Arc<dyn ObjectStore>,
    pub llm: Arc<LlmClient>,
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Arc<Config> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<Relay> {
    fn from_ref(state: &AppState) -> Self {
        state.relay.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ObjectStore> {
    fn from_ref(state: &AppState) -> Self {
        state.objects.clone()
    }
}

impl FromRef<AppState> for Arc<LlmClient> {
    fn from_ref(state: &AppState) -> Self {
        state.llm.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Listener and CORS settings. Everything else lives in [`Config`].
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3001")
    pub bind_address: String,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    /// `BIND_ADDRESS` and `ALLOWED_ORIGINS` (comma separated) override the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let allowed_origins = get_env_list("ALLOWED_ORIGINS");

        Self {
            bind_address: get_env_or("BIND_ADDRESS", &defaults.bind_address),
            allowed_origins: if allowed_origins.is_empty() {
                defaults.allowed_origins
            } else {
                allowed_origins
            },
        }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Install the global tracing subscriber. `LOG_LEVEL` accepts any `EnvFilter`
/// directive and defaults to `info`.
pub fn init_tracing() -> anyhow::Result<()> {
    let log_level = get_env_or("LOG_LEVEL", "info").to_lowercase();
    let filter = tracing_subscriber::EnvFilter::try_new(&log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .with_file(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global tracing subscriber: {}", e))?;

    info!(" Log level: {}", log_level);
    Ok(())
}

/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading fails
/// - Database connection or migrations fail
/// - The attachment directory cannot be created
/// - Server binding fails
pub async fn start_server(server_config: ServerConfig) -> anyhow::Result<()> {
    info!(" INTELLICONNECT BACKEND STARTING");

    info!("Loading configuration...");
    let config = Config::load().map_err(|e| anyhow::anyhow!(e))?;

    info!("Connecting to database: {}", config.database_url);
    let pool = create_pool(&config.database_url).await?;

    info!(" Running database migrations...");
    run_migrations(&pool).await?;
    info!(" Migrations complete");

    tokio::fs::create_dir_all(&config.attachments_dir).await?;
    info!(" Attachments stored in {}", config.attachments_dir.display());

    let llm = LlmClient::new(config.llm.clone())?;
    if llm.is_enabled() {
        info!(" Mentor search: AI ranking with model {}", config.llm.model);
    } else {
        info!(" Mentor search: LLM_API_URL unset, text matching only");
    }

    let state = AppState {
        db: pool,
        objects: Arc::new(LocalObjectStore::new(&config.attachments_dir)),
        config: Arc::new(config),
        relay: Arc::new(Relay::new()),
        llm: Arc::new(llm),
    };

    let app = create_router(state, &server_config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&server_config.bind_address).await?;
    info!(" SERVER READY: http://{}", server_config.bind_address);
    log_server_info();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the main application router with all routes
pub fn create_router(state: AppState, allowed_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::HeaderName::from_static("x-request-id")]);

    // Room for the largest attachment; the handler reports anything above the cap itself.
    let upload_limit = DefaultBodyLimit::max(MAX_ATTACHMENT_BYTES + 1024 * 1024);

    let attachments = ServeDir::new(&state.config.attachments_dir);

    Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/profiles/me",
            get(handlers::profiles::get_my_profile).put(handlers::profiles::update_my_profile),
        )
        .route("/api/profiles/{user_id}", get(handlers::profiles::get_profile))
        .route(
            "/api/connections",
            post(handlers::connections::create_connection).get(handlers::connections::list_connections),
        )
        .route(
            "/api/connections/{id}/status",
            post(handlers::connections::update_connection_status),
        )
        .route("/api/conversations", get(handlers::connections::list_conversations))
        .route(
            "/api/connections/{id}/messages",
            get(chat::handlers::list_messages).post(chat::handlers::send_message),
        )
        .route("/api/connections/{id}/read", post(chat::handlers::mark_read))
        .route(
            "/api/connections/{id}/attachments",
            post(chat::handlers::upload_attachment).layer(upload_limit),
        )
        .route("/api/connections/{id}/stream", get(chat::handlers::connection_stream))
        .route("/api/notifications/stream", get(chat::handlers::notification_stream))
        .route("/api/mentors/search", post(handlers::mentors::search_mentors))
        .route("/api/mentors/recommendations", get(handlers::mentors::recommend_mentors))
        .route("/health", get(|| async { "OK" }))
        .nest_service("/attachments", attachments)
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route - returning 404");
            AppError::NotFound("Route not found".to_string())
        })
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .extensions()
                        .get::<RequestStamp>()
                        .map(|s| s.id.clone())
                        .unwrap_or_else(|| "unknown".to_string());
                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                })
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::error!(
                            error = ?error,
                            latency_ms = latency.as_millis(),
                            "[HTTP FAILURE] Error: {:?}, Latency: {}ms",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        )
        // Outermost, so the id is set before logging and tracing see the request.
        .layer(axum::middleware::from_fn(stamp_req))
        .layer(cors)
}

fn log_server_info() {
    info!(" AUTH:");
    info!("   • POST /api/auth/signup");
    info!("   • POST /api/auth/login");
    info!(" PROFILES:");
    info!("   • GET|PUT /api/profiles/me");
    info!("   • GET  /api/profiles/{{user_id}}");
    info!(" CONNECTIONS:");
    info!("   • POST /api/connections");
    info!("   • GET  /api/connections?status=pending|accepted|rejected");
    info!("   • POST /api/connections/{{id}}/status");
    info!("   • GET  /api/conversations");
    info!(" CHAT:");
    info!("   • GET|POST /api/connections/{{id}}/messages");
    info!("   • POST /api/connections/{{id}}/read");
    info!("   • POST /api/connections/{{id}}/attachments?name={{file_name}}");
    info!("   • GET  /api/connections/{{id}}/stream (SSE)");
    info!("   • GET  /api/notifications/stream (SSE)");
    info!(" MENTORS:");
    info!("   • POST /api/mentors/search");
    info!("   • GET  /api/mentors/recommendations");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestApp;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_and_fallback() {
        let app = TestApp::new().await;

        let res = app.router().oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));

        let (status, body) = app.dispatch(Request::get("/nope").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NotFound");
        assert_eq!(body["error"], "Route not found");
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let app = TestApp::new().await;

        let res = app
            .router()
            .oneshot(Request::get("/api/connections").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["code"], "Unauthenticated");
    }
}
