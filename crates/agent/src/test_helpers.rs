//! Shared test helpers for orchestrator and session tests.

use simplo_core::error::{ExchangeError, UpstreamPayload};
use simplo_core::provider::{Completion, ExchangeResult, Provider, UpstreamRequest};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted results and records
/// every request it receives.
///
/// Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    results: Mutex<VecDeque<ExchangeResult>>,
    requests: Mutex<Vec<UpstreamRequest>>,
}

impl ScriptedProvider {
    pub fn new(results: Vec<ExchangeResult>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that answers once with the given text.
    pub fn single_text(text: &str) -> Self {
        Self::new(vec![Ok(completion(text))])
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: UpstreamRequest) -> ExchangeResult {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no result scripted for call #{call}"))
    }
}

/// A provider whose call never finishes.
pub struct PendingProvider;

#[async_trait::async_trait]
impl Provider for PendingProvider {
    fn name(&self) -> &str {
        "pending_mock"
    }

    async fn complete(&self, _request: UpstreamRequest) -> ExchangeResult {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

pub fn completion(text: &str) -> Completion {
    Completion {
        text: text.into(),
        usage: Some(serde_json::json!({"prompt_tokens": 10, "completion_tokens": 2})),
        model: Some("mock-model".into()),
    }
}

pub fn rate_limited() -> ExchangeError {
    ExchangeError::Upstream {
        status: 429,
        payload: UpstreamPayload::from_body(r#"{"error":"rate limited"}"#),
    }
}
