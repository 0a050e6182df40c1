//! Scripted LLM and search doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bsdetect_core::SearchHit;
use bsdetect_runtime::prompts::ROUTER_PROMPT;
use bsdetect_runtime::{
    ChatMessage, ClaimVerifier, CompletionConfig, CompletionResponse, LlmProvider,
    MockSearchProvider, NoopSleeper, ProviderError, RuntimeConfig, SearchError, SearchProvider,
};

/// One scripted expert turn.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }

    pub fn verdict(verdict: &str, confidence: u8, reasoning: &str) -> Self {
        Reply::Text(
            serde_json::json!({
                "verdict": verdict,
                "confidence": confidence,
                "reasoning": reasoning,
            })
            .to_string(),
        )
    }

    pub fn search(query: &str) -> Self {
        Reply::Text(serde_json::json!({"tool": "search", "query": query}).to_string())
    }
}

/// LLM double: answers the router with a fixed reply and the experts from
/// a queue. When the queue runs dry the `fallback` reply repeats.
pub struct ScriptedLlm {
    router_reply: String,
    expert_replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    router_calls: AtomicUsize,
    expert_calls: AtomicUsize,
    expert_prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new(category: &str, replies: Vec<Reply>) -> Arc<Self> {
        Self::with_fallback(category, replies, Reply::Fail)
    }

    pub fn with_fallback(category: &str, replies: Vec<Reply>, fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            router_reply: serde_json::json!({"claim_type": category, "confidence_level": "high"})
                .to_string(),
            expert_replies: Mutex::new(replies.into()),
            fallback,
            router_calls: AtomicUsize::new(0),
            expert_calls: AtomicUsize::new(0),
            expert_prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn router_calls(&self) -> usize {
        self.router_calls.load(Ordering::SeqCst)
    }

    pub fn expert_calls(&self) -> usize {
        self.expert_calls.load(Ordering::SeqCst)
    }

    /// Every message list sent to an expert, in call order.
    pub fn expert_prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.expert_prompts.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        _config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let is_router = messages
            .first()
            .map(|m| m.content == ROUTER_PROMPT)
            .unwrap_or(false);

        if is_router {
            self.router_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(CompletionResponse::text(self.router_reply.clone(), "scripted"));
        }

        self.expert_calls.fetch_add(1, Ordering::SeqCst);
        self.expert_prompts.lock().push(messages);

        let reply = self
            .expert_replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match reply {
            Reply::Text(text) => Ok(CompletionResponse::text(text, "scripted")),
            Reply::Fail => Err(ProviderError::ApiError {
                status: 503,
                message: "overloaded".to_string(),
            }),
        }
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Search adapter whose transport always fails.
#[derive(Debug, Default)]
pub struct BrokenSearch {
    calls: AtomicUsize,
}

impl BrokenSearch {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchProvider for BrokenSearch {
    async fn search(
        &self,
        _query: &str,
        _max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SearchError::Transport("connection refused".to_string()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

pub fn config(max_retries: u32) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.retry.max_retries = max_retries;
    config
}

/// Verifier with the mock search adapter and no real sleeping.
pub fn verifier(
    llm: Arc<ScriptedLlm>,
    search: Arc<dyn SearchProvider>,
    config: RuntimeConfig,
) -> ClaimVerifier {
    ClaimVerifier::builder()
        .provider(llm)
        .search(search)
        .config(config)
        .sleeper(Box::new(NoopSleeper))
        .today(today())
        .build()
        .unwrap()
}

pub fn mock_search() -> Arc<MockSearchProvider> {
    Arc::new(MockSearchProvider::new())
}
