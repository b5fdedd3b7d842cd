//! Test doubles for the chat flow: a scripted upstream and an in-memory resume.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::json;

use crate::config::ProviderConfig;
use crate::llm_client::{ChatCompletionRequest, UpstreamClient, UpstreamError, UpstreamResponse};
use crate::models::resume::ResumeDocument;
use crate::resume::ResumeProvider;

pub fn configured_provider() -> ProviderConfig {
    ProviderConfig {
        api_key: Some("sk-test".into()),
        model: "test/model".into(),
        ..ProviderConfig::default()
    }
}

pub fn sample_resume() -> ResumeDocument {
    ResumeDocument::try_from(json!({
        "name": "Ada Lovelace",
        "title": "Analytical Engine Programmer",
        "skills": {"languages": ["Rust"]}
    }))
    .unwrap()
}

pub fn status(code: u16) -> UpstreamResponse {
    UpstreamResponse {
        status: code,
        body: format!(r#"{{"error": {{"code": {code}}}}}"#),
    }
}

pub fn ok_json(body: &str) -> UpstreamResponse {
    UpstreamResponse {
        status: 200,
        body: body.to_string(),
    }
}

pub fn reply_body(content: &str) -> String {
    json!({
        "id": "gen-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

/// Replays scripted results in order and records what it was sent.
/// Once the script runs out it answers 500.
pub struct StubUpstream {
    script: Mutex<VecDeque<Result<UpstreamResponse, UpstreamError>>>,
    calls: AtomicUsize,
    hang: bool,
    last: Mutex<Option<(HeaderMap, ChatCompletionRequest)>>,
}

impl StubUpstream {
    pub fn new(script: Vec<Result<UpstreamResponse, UpstreamError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            hang: false,
            last: Mutex::new(None),
        }
    }

    /// Never completes a call.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<ChatCompletionRequest> {
        self.last.lock().unwrap().as_ref().map(|(_, p)| p.clone())
    }

    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.last.lock().unwrap().as_ref().map(|(h, _)| h.clone())
    }
}

#[async_trait]
impl UpstreamClient for StubUpstream {
    async fn call(
        &self,
        headers: &HeaderMap,
        payload: &ChatCompletionRequest,
    ) -> Result<UpstreamResponse, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((headers.clone(), payload.clone()));

        if self.hang {
            std::future::pending::<()>().await;
        }

        let next = self.script.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(status(500)))
    }
}

pub struct StubResume {
    resume: Option<ResumeDocument>,
}

impl StubResume {
    pub fn new(resume: ResumeDocument) -> Self {
        Self {
            resume: Some(resume),
        }
    }

    /// Every read fails as if the database were gone.
    pub fn failing() -> Self {
        Self { resume: None }
    }
}

#[async_trait]
impl ResumeProvider for StubResume {
    async fn get_resume(&self) -> Result<ResumeDocument, sqlx::Error> {
        self.resume.clone().ok_or(sqlx::Error::PoolClosed)
    }
}
