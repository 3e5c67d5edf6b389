//! Integration tests for the integrity-agent HTTP server

#[cfg(feature = "server")]
mod server_tests {
    use chrono::{DateTime, Duration, Utc};
    use std::time::Duration as StdDuration;
    use uuid::Uuid;
    use writing_integrity_agent::audit::create_shared_log;
    use writing_integrity_agent::events::{EditorEvent, KeyClass};
    use writing_integrity_agent::server::{run, ServerConfig};
    use writing_integrity_agent::session::{
        Category, ChapterFields, RecordedEvent, RecordedSession, SubmissionPolicy,
        SubmissionTarget,
    };

    fn start_time() -> DateTime<Utc> {
        "2025-03-01T12:00:00Z".parse().expect("valid timestamp")
    }

    /// A human-paced recording: one keystroke + edit every 300ms.
    fn sample_session(text: &str) -> RecordedSession {
        let mut events = Vec::new();
        let mut at = start_time();
        let mut typed = String::new();
        for c in text.chars() {
            at += Duration::milliseconds(300);
            events.push(RecordedEvent {
                at,
                event: EditorEvent::KeyDown {
                    key: KeyClass::Other,
                },
            });
            typed.push(c);
            events.push(RecordedEvent {
                at,
                event: EditorEvent::Edit {
                    text: typed.clone(),
                },
            });
        }
        RecordedSession {
            session_id: Uuid::new_v4(),
            timezone: Some("UTC".to_string()),
            target: SubmissionTarget::NewStory {
                title: "Dust".to_string(),
                summary: "A town holds its breath.".to_string(),
                category: Category::Good,
                thumbnail_url: None,
            },
            chapter: ChapterFields {
                title: "The Rumor".to_string(),
                summary: "Word travels fast.".to_string(),
            },
            events,
        }
    }

    async fn start_server() -> (std::net::SocketAddr, tokio::sync::oneshot::Sender<()>) {
        // Random port, no backend forwarding
        let config = ServerConfig::new(0, SubmissionPolicy::default(), None);
        let (addr, shutdown_tx) = run(config, create_shared_log())
            .await
            .expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(StdDuration::from_millis(100)).await;
        (addr, shutdown_tx)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (addr, shutdown_tx) = start_server().await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_ingest_scores_session() {
        let (addr, shutdown_tx) = start_server().await;

        let session = sample_session("The stranger tied his horse outside the saloon.");
        let payload = serde_json::json!({ "session": session });

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/ingest", addr))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["trust"]["level"].as_str().is_some());
        assert_eq!(body["pastes_blocked"], 0);
        assert_eq!(body["writing_metadata"]["total_keystrokes"], 47);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_ingest_rejects_invalid_session() {
        let (addr, shutdown_tx) = start_server().await;

        let mut session = sample_session("text");
        session.chapter.title = "   ".to_string();
        let payload = serde_json::json!({ "session": session });

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/ingest", addr))
            .json(&payload)
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(
            response.status(),
            reqwest::StatusCode::UNPROCESSABLE_ENTITY
        );
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], "VALIDATION_FAILED");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_ingest_rejects_empty_session() {
        let (addr, shutdown_tx) = start_server().await;

        let mut session = sample_session("text");
        session.events.clear();
        let payload = serde_json::json!({ "session": session });

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/ingest", addr))
            .json(&payload)
            .send()
            .await
            .expect("Failed to send request");

        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], "INVALID_SESSION");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let (addr, shutdown_tx) = start_server().await;

        let client = reqwest::Client::new();
        let response = client
            .request(reqwest::Method::OPTIONS, format!("http://{}/ingest", addr))
            .header("Origin", "http://localhost")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .expect("Failed to send request");

        assert!(
            response.status().is_success() || response.status() == reqwest::StatusCode::NO_CONTENT,
            "CORS preflight failed: {}",
            response.status()
        );

        let _ = shutdown_tx.send(());
    }
}
