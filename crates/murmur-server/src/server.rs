//! Router assembly and server lifecycle.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use murmur_engine::{EngineConfig, EngineRegistry};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::transcribe;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Engine cache shared across requests.
    pub registry: Arc<EngineRegistry>,
    /// When the process started, for the health endpoint.
    pub start_time: Instant,
}

impl AppState {
    /// Build the state for `config`, including an empty engine registry.
    pub fn new(config: ServerConfig) -> Self {
        let engine_config = EngineConfig {
            models_root: config.models_dir.clone(),
            whisperx_url: config.whisperx_url.clone(),
            faster_whisper_url: config.faster_whisper_url.clone(),
            hf_token: config.hf_token.clone(),
            max_splits: config.max_splits,
        };
        Self {
            config: Arc::new(config),
            registry: Arc::new(EngineRegistry::new(engine_config)),
            start_time: Instant::now(),
        }
    }
}

/// The murmur HTTP server.
pub struct MurmurServer {
    state: AppState,
}

impl MurmurServer {
    /// Create a server for `config`.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    /// The engine registry, for startup prefetching.
    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.state.registry
    }

    /// Build the application router.
    pub fn router(&self) -> Router {
        // Slack over the upload bound so the handler can return its own
        // 413 with a `detail` body instead of axum's bare one.
        let body_limit = self.state.config.max_upload_bytes.saturating_add(64 * 1024);
        Router::new()
            .route("/transcription", post(transcribe::transcription_handler))
            .route("/healthcheck", get(healthcheck))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind and serve until ctrl-c.
    pub async fn serve(self) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.state.config.host, self.state.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("listening on {addr}");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn healthcheck(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(state.start_time))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, draining connections");
}
