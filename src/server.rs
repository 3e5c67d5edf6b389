//! HTTP server for scoring recorded composition sessions.
//!
//! The web editor records the event stream while a writer composes and ships
//! the recording here. The server replays it through the full controller
//! pipeline and answers with the finalized submission, its metrics, and the
//! recomputed trust classification. When a backend is configured, the scored
//! chapter is also forwarded to the moderation queue.
//!
//! # Architecture
//!
//! ```text
//! Web Editor ──→ POST /ingest ──→ integrity-agent ──→ story backend
//!                                       ↓
//!                                 [Session Replay]
//! ```

use crate::audit::SharedAuditLog;
use crate::backend::{BackendConfig, SubmissionEnvelope, SubmissionMeta, SubmissionPayload};
use crate::core::trust::TrustReport;
use crate::session::controller::SubmissionPolicy;
use crate::session::replay::{RecordedSession, ReplayError, SessionReplayer};
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Submission validation policy
    pub policy: SubmissionPolicy,
    /// Backend to forward scored chapters to; None scores without forwarding
    pub backend: Option<BackendConfig>,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16, policy: SubmissionPolicy, backend: Option<BackendConfig>) -> Self {
        Self {
            port,
            policy,
            backend,
        }
    }
}

/// Shared server state
pub struct ServerState {
    /// Session replayer
    replayer: SessionReplayer,
    /// Backend configuration for forwarding
    backend: Option<BackendConfig>,
    /// HTTP client for the backend
    http_client: reqwest::Client,
    /// Audit counters, shared with the replayer
    audit: SharedAuditLog,
}

impl ServerState {
    /// Create new server state
    pub fn new(config: &ServerConfig, audit: SharedAuditLog) -> Self {
        let replayer = SessionReplayer::new()
            .with_policy(config.policy)
            .with_audit(audit.clone());

        Self {
            replayer,
            backend: config.backend.clone(),
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            audit,
        }
    }
}

/// Inbound envelope from the editor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    /// The recorded session to score
    pub session: RecordedSession,
}

/// Response from ingest endpoint
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub status: String,
    pub message: String,
    pub trust: TrustReport,
    pub dropped_edits: u32,
    pub pastes_blocked: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writing_metadata: Option<serde_json::Value>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /stats
async fn stats(State(state): State<Arc<ServerState>>) -> Json<serde_json::Value> {
    Json(serde_json::to_value(state.audit.stats()).unwrap_or_default())
}

/// POST /ingest
///
/// Replays a recorded session, scores it, and forwards the scored chapter to
/// the story backend when one is configured.
async fn ingest(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, (StatusCode, Json<ErrorResponse>)> {
    let outcome = state.replayer.replay(&request.session).map_err(|e| {
        let (status, code) = match &e {
            ReplayError::EmptySession => (StatusCode::BAD_REQUEST, "INVALID_SESSION"),
            ReplayError::Submit(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED"),
        };
        (
            status,
            Json(ErrorResponse {
                error: e.to_string(),
                code: code.to_string(),
            }),
        )
    })?;

    tracing::info!(
        session_id = %request.session.session_id,
        trust = %outcome.trust.level,
        score = outcome.trust.score,
        "Session scored"
    );

    // Forward to the moderation queue when a backend is configured.
    let message = if let Some(backend) = &state.backend {
        let envelope = SubmissionEnvelope {
            submission: SubmissionPayload {
                session_id: request.session.session_id.to_string(),
                client_id: "integrity-server".to_string(),
                timezone: request
                    .session
                    .timezone
                    .clone()
                    .unwrap_or_else(|| chrono_tz::Tz::UTC.to_string()),
                submitted_at: chrono::Utc::now().to_rfc3339(),
                chapter: outcome.submission.clone(),
                meta: SubmissionMeta {
                    source: "writing-integrity-agent-server".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
        };

        let response = state
            .http_client
            .post(backend.submit_url())
            .header("Authorization", format!("Bearer {}", backend.token))
            .header("Content-Type", "application/json")
            .json(&envelope)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to forward to backend: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(ErrorResponse {
                        error: format!("Backend forwarding failed: {e}"),
                        code: "BACKEND_ERROR".to_string(),
                    }),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!("Backend returned error {}: {}", status, body);
            return Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: format!("Backend returned error: {body}"),
                    code: "BACKEND_ERROR".to_string(),
                }),
            ));
        }

        "Scored and forwarded to backend".to_string()
    } else {
        "Scored".to_string()
    };

    Ok(Json(IngestResponse {
        status: "ok".to_string(),
        message,
        trust: outcome.trust.clone(),
        dropped_edits: outcome.dropped_edits,
        pastes_blocked: outcome.pastes_blocked,
        writing_metadata: outcome
            .submission
            .writing_metadata
            .as_ref()
            .and_then(|m| serde_json::to_value(m).ok()),
    }))
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
    audit: SharedAuditLog,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::new(&config, audit));

    let app = Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/ingest", post(ingest))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Integrity agent server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
