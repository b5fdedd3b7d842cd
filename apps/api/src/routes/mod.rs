pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::chat::handlers::handle_chat;
use crate::resume::handlers::handle_get_resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/resume", get(handle_get_resume))
        .route("/api/chat", post(handle_chat))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::chat::handlers::{BLANK_MESSAGE, INTERNAL_MESSAGE, TIMEOUT_MESSAGE};
    use crate::chat::orchestrator::ChatService;
    use crate::chat::testing::{
        configured_provider, ok_json, reply_body, sample_resume, StubResume, StubUpstream,
    };
    use crate::config::ProviderConfig;
    use crate::db::test_pool;
    use crate::resume::store::ResumeStore;
    use crate::state::CHAT_TIMEOUT;

    struct Harness {
        dir: tempfile::TempDir,
        state: AppState,
    }

    async fn harness(
        provider: ProviderConfig,
        upstream: Arc<StubUpstream>,
        resume: StubResume,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = ResumeStore::new(test_pool(&dir).await, dir.path().join("resume_data.json"));
        let chat = ChatService::new(provider, upstream, Arc::new(resume));
        Harness {
            state: AppState {
                store,
                chat: Arc::new(chat),
                chat_timeout: CHAT_TIMEOUT,
            },
            dir,
        }
    }

    async fn default_harness(upstream: Arc<StubUpstream>) -> Harness {
        harness(
            configured_provider(),
            upstream,
            StubResume::new(sample_resume()),
        )
        .await
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_chat(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_ai_configured() {
        let upstream = Arc::new(StubUpstream::new(vec![]));
        let h = default_harness(upstream).await;

        let (status, body) = send(h.state, get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "healthy", "service": "portfolio-ai-chat", "ai_configured": true})
        );
    }

    #[tokio::test]
    async fn test_health_without_credential() {
        let upstream = Arc::new(StubUpstream::new(vec![]));
        let h = harness(
            ProviderConfig::default(),
            upstream,
            StubResume::new(sample_resume()),
        )
        .await;

        let (_, body) = send(h.state, get("/api/health")).await;
        assert_eq!(body["ai_configured"], json!(false));
    }

    #[tokio::test]
    async fn test_resume_endpoint_returns_seeded_document() {
        let upstream = Arc::new(StubUpstream::new(vec![]));
        let h = default_harness(upstream).await;
        let source = json!({"name": "Ada", "skills": {"languages": ["Rust"]}});
        std::fs::write(h.dir.path().join("resume_data.json"), source.to_string()).unwrap();
        h.state.store.seed_if_empty().await.unwrap();

        let (status, body) = send(h.state, get("/api/resume")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, source);
    }

    #[tokio::test]
    async fn test_resume_endpoint_404_when_empty() {
        let upstream = Arc::new(StubUpstream::new(vec![]));
        let h = default_harness(upstream).await;

        let (status, body) = send(h.state, get("/api/resume")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"detail": "Resume data not found"}));
    }

    #[tokio::test]
    async fn test_blank_message_skips_orchestrator() {
        let upstream = Arc::new(StubUpstream::new(vec![]));
        let h = default_harness(upstream.clone()).await;

        let (status, body) = send(h.state, post_chat(json!({"message": "   "}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"response": "", "error": BLANK_MESSAGE}));
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_chat_success() {
        let upstream = Arc::new(StubUpstream::new(vec![Ok(ok_json(&reply_body(
            "I build **Rust** services.",
        )))]));
        let h = default_harness(upstream.clone()).await;

        let (status, body) = send(
            h.state,
            post_chat(json!({
                "message": "What do you do?",
                "history": [{"role": "user", "content": "hi"}, {"role": "assistant", "content": "Hello!"}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"response": "I build **Rust** services.", "error": null})
        );
        assert_eq!(upstream.calls(), 1);
        assert_eq!(upstream.last_payload().unwrap().messages.len(), 4);
    }

    #[tokio::test]
    async fn test_chat_outcome_failure_maps_to_error_field() {
        let upstream = Arc::new(StubUpstream::new(vec![]));
        let h = harness(
            ProviderConfig::default(),
            upstream.clone(),
            StubResume::new(sample_resume()),
        )
        .await;

        let (status, body) = send(h.state, post_chat(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"response": "", "error": "AI chat is not configured"})
        );
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_chat_deadline_returns_timeout_message() {
        let upstream = Arc::new(StubUpstream::hanging());
        let mut h = default_harness(upstream.clone()).await;
        h.state.chat_timeout = Duration::from_millis(50);

        let (status, body) = send(h.state, post_chat(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"response": "", "error": TIMEOUT_MESSAGE}));
        assert_eq!(upstream.calls(), 1);
    }

    #[tokio::test]
    async fn test_internal_failure_is_opaque() {
        let upstream = Arc::new(StubUpstream::new(vec![]));
        let h = harness(configured_provider(), upstream, StubResume::failing()).await;

        let (status, body) = send(h.state, post_chat(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"response": "", "error": INTERNAL_MESSAGE}));
    }

    #[tokio::test]
    async fn test_oversized_history_is_rejected() {
        let upstream = Arc::new(StubUpstream::new(vec![]));
        let h = default_harness(upstream.clone()).await;
        let history: Vec<Value> = (0..51)
            .map(|i| json!({"role": "user", "content": format!("m{i}")}))
            .collect();

        let (status, body) = send(
            h.state,
            post_chat(json!({"message": "hi", "history": history})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, json!({"detail": "History too long (max 50 messages)"}));
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_unprocessable() {
        let upstream = Arc::new(StubUpstream::new(vec![]));
        let h = default_harness(upstream.clone()).await;

        let (status, body) = send(h.state, post_chat(json!({"history": []}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("message"));
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn test_session_chat_is_logged() {
        let upstream = Arc::new(StubUpstream::new(vec![Ok(ok_json(&reply_body("Hello!")))]));
        let h = default_harness(upstream).await;
        let pool = test_pool(&h.dir).await;

        let (_, body) = send(
            h.state.clone(),
            post_chat(json!({"message": "hi", "session_id": "visitor-1"})),
        )
        .await;
        assert_eq!(body["response"], json!("Hello!"));

        let mut logged: Vec<(String, String)> = vec![];
        for _ in 0..100 {
            logged = sqlx::query_as(
                "SELECT role, content FROM chat_history WHERE session_id = 'visitor-1' ORDER BY id",
            )
            .fetch_all(&pool)
            .await
            .unwrap();
            if logged.len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(
            logged,
            vec![
                ("user".to_string(), "hi".to_string()),
                ("assistant".to_string(), "Hello!".to_string()),
            ]
        );
    }
}
