//! Client for the story backend's submission endpoint.
//!
//! The agent's only obligation to the backend is a well-formed submission
//! envelope: the validated chapter draft plus its writing metadata. The
//! backend queues it for moderation and answers with a review status.

use crate::session::controller::ChapterSubmission;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Backend configuration.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend host (default: 127.0.0.1)
    pub host: String,
    /// Backend port
    pub port: u16,
    /// Bearer authentication token
    pub token: String,
}

impl BackendConfig {
    /// Create a new backend configuration.
    pub fn new(host: impl Into<String>, port: u16, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            token: token.into(),
        }
    }

    /// Load configuration from the Inkfeed runtime directory.
    ///
    /// Reads port from `<state>/runtime/backend.port` and token from
    /// `<state>/runtime/backend.token`, written by the platform when it
    /// starts the local stack.
    pub fn from_runtime_dir() -> Result<Self, BackendError> {
        let state_dir = Self::default_state_dir()?;
        let runtime_dir = state_dir.join("runtime");

        let port_path = runtime_dir.join("backend.port");
        let token_path = runtime_dir.join("backend.token");

        let port_str = std::fs::read_to_string(&port_path).map_err(|e| {
            BackendError::Config(format!("Failed to read backend port from {port_path:?}: {e}"))
        })?;

        let port: u16 = port_str.trim().parse().map_err(|e| {
            BackendError::Config(format!("Invalid port number '{}': {}", port_str.trim(), e))
        })?;

        let token = std::fs::read_to_string(&token_path)
            .map_err(|e| {
                BackendError::Config(format!(
                    "Failed to read backend token from {token_path:?}: {e}"
                ))
            })?
            .trim()
            .to_string();

        Ok(Self {
            host: "127.0.0.1".to_string(),
            port,
            token,
        })
    }

    /// Get the default Inkfeed state directory.
    fn default_state_dir() -> Result<PathBuf, BackendError> {
        #[cfg(target_os = "macos")]
        {
            if let Some(home) = dirs::home_dir() {
                return Ok(home.join("Library/Application Support/Inkfeed"));
            }
        }

        #[cfg(target_os = "linux")]
        {
            if let Some(data_dir) = dirs::data_dir() {
                return Ok(data_dir.join("Inkfeed"));
            }
        }

        Err(BackendError::Config(
            "Could not determine Inkfeed state directory".to_string(),
        ))
    }

    /// Get the full backend URL.
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get the chapter submission endpoint URL.
    pub fn submit_url(&self) -> String {
        format!("{}/v1/chapters/submit", self.url())
    }

    /// Get the health check endpoint URL.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.url())
    }
}

/// Backend client error types.
#[derive(Debug)]
pub enum BackendError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Server returned an error response
    Server { status: u16, message: String },
    /// JSON serialization error
    Serialization(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Config(msg) => write!(f, "Backend config error: {msg}"),
            BackendError::Network(msg) => write!(f, "Backend network error: {msg}"),
            BackendError::Server { status, message } => {
                write!(f, "Backend server error ({status}): {message}")
            }
            BackendError::Serialization(msg) => write!(f, "Backend serialization error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// Envelope for the chapter submission endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionEnvelope {
    pub submission: SubmissionPayload,
}

/// Submission payload structure matching backend expectations.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload {
    /// Composition session identifier
    pub session_id: String,
    /// Submitting client identifier
    pub client_id: String,
    /// Timezone
    pub timezone: String,
    /// Submission time (RFC3339)
    pub submitted_at: String,
    /// The validated chapter with its writing metadata
    pub chapter: ChapterSubmission,
    /// Metadata
    pub meta: SubmissionMeta,
}

/// Submission metadata.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionMeta {
    /// Source identifier
    pub source: String,
    /// Version
    pub version: String,
}

/// Backend response from the submission endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendResponse {
    /// Identifier assigned to the queued chapter
    #[serde(default)]
    pub chapter_id: Option<String>,
    /// Review queue status (e.g. "pending")
    #[serde(default)]
    pub review_status: Option<String>,
    /// Scheduled release time, if the backend already timed it
    #[serde(default)]
    pub release_at: Option<String>,
}

impl std::fmt::Display for BackendResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let id = self.chapter_id.as_deref().unwrap_or("unknown");
        let status = self.review_status.as_deref().unwrap_or("unknown");
        write!(f, "chapter: {id}, review: {status}")
    }
}

/// Client for the story backend.
#[cfg(feature = "submit")]
pub struct BackendClient {
    config: BackendConfig,
    client: reqwest::Client,
    client_id: String,
}

#[cfg(feature = "submit")]
impl BackendClient {
    /// Create a new backend client.
    pub fn new(config: BackendConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        // Generate client ID from hostname + instance
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let client_id = format!(
            "integrity-{}-{}",
            hostname,
            &uuid::Uuid::new_v4().to_string()[..8]
        );

        Self {
            config,
            client,
            client_id,
        }
    }

    /// Create a new backend client from runtime directory configuration.
    pub fn from_runtime() -> Result<Self, BackendError> {
        let config = BackendConfig::from_runtime_dir()?;
        Ok(Self::new(config))
    }

    /// Test connection to the backend.
    pub async fn test_connection(&self) -> Result<bool, BackendError> {
        let response = self
            .client
            .get(self.config.health_url())
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }

    /// Submit a validated chapter to the backend.
    pub async fn submit_chapter(
        &self,
        chapter: &ChapterSubmission,
        session_id: &str,
    ) -> Result<BackendResponse, BackendError> {
        let timezone = chrono_tz::Tz::UTC.to_string();

        let envelope = SubmissionEnvelope {
            submission: SubmissionPayload {
                session_id: session_id.to_string(),
                client_id: self.client_id.clone(),
                timezone,
                submitted_at: chrono::Utc::now().to_rfc3339(),
                chapter: chapter.clone(),
                meta: SubmissionMeta {
                    source: "writing-integrity-agent".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
        };

        let response = self
            .client
            .post(self.config.submit_url())
            .header("Authorization", format!("Bearer {}", self.config.token))
            .header("Content-Type", "application/json")
            .json(&envelope)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(BackendError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let backend_response: BackendResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))?;

        Ok(backend_response)
    }

    /// Get the client ID.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

/// Blocking backend client for use in synchronous contexts.
#[cfg(feature = "submit")]
pub struct BlockingBackendClient {
    inner: BackendClient,
    runtime: tokio::runtime::Runtime,
}

#[cfg(feature = "submit")]
impl BlockingBackendClient {
    /// Create a new blocking backend client.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: BackendClient::new(config),
            runtime,
        })
    }

    /// Create a new blocking backend client from runtime directory configuration.
    pub fn from_runtime() -> Result<Self, BackendError> {
        let config = BackendConfig::from_runtime_dir()?;
        Self::new(config)
    }

    /// Test connection to the backend.
    pub fn test_connection(&self) -> Result<bool, BackendError> {
        self.runtime.block_on(self.inner.test_connection())
    }

    /// Submit a validated chapter to the backend.
    pub fn submit_chapter(
        &self,
        chapter: &ChapterSubmission,
        session_id: &str,
    ) -> Result<BackendResponse, BackendError> {
        self.runtime
            .block_on(self.inner.submit_chapter(chapter, session_id))
    }

    /// Get the client ID.
    pub fn client_id(&self) -> &str {
        self.inner.client_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_url() {
        let config = BackendConfig::new("127.0.0.1", 8080, "test-token");
        assert_eq!(config.url(), "http://127.0.0.1:8080");
        assert_eq!(config.submit_url(), "http://127.0.0.1:8080/v1/chapters/submit");
        assert_eq!(config.health_url(), "http://127.0.0.1:8080/health");
    }

    #[test]
    fn test_backend_response_display() {
        let response = BackendResponse {
            chapter_id: Some("ch_42".to_string()),
            review_status: Some("pending".to_string()),
            release_at: None,
        };
        let display = format!("{response}");
        assert!(display.contains("ch_42"));
        assert!(display.contains("pending"));
    }

    #[test]
    fn test_backend_response_tolerates_missing_fields() {
        let response: BackendResponse = serde_json::from_str("{}").expect("deserialize");
        assert!(response.chapter_id.is_none());
        assert!(response.review_status.is_none());
    }
}
