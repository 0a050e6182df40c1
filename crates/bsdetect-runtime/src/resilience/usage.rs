//! Token and cost accounting for LLM calls.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::providers::TokenUsage;

/// Accumulated LLM usage for one claim or a whole session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub total_tokens: u32,

    /// Prompt/input tokens
    pub prompt_tokens: u32,

    /// Completion/output tokens
    pub completion_tokens: u32,

    /// Number of LLM calls made, including failed ones
    pub llm_calls: u32,

    /// Estimated cost in USD
    pub estimated_cost: f64,

    /// Tokens read from cache
    pub cache_read_tokens: u32,
}

impl LlmUsage {
    /// Add token usage from a provider response.
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens += usage.total();
        self.cache_read_tokens += usage.cache_read_tokens;
        self.llm_calls += 1;
        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    /// Count a call that produced no usage data (error or timeout).
    pub fn add_failed_call(&mut self) {
        self.llm_calls += 1;
    }

    /// Fold another tally into this one.
    pub fn merge(&mut self, other: &LlmUsage) {
        self.total_tokens += other.total_tokens;
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
        self.llm_calls += other.llm_calls;
        self.estimated_cost += other.estimated_cost;
        self.cache_read_tokens += other.cache_read_tokens;
    }

    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        // USD per million tokens: input, output, cache write, cache read
        let (input_rate, output_rate, cache_write_rate, cache_read_rate) = match model {
            m if m.contains("sonnet") => (3.0, 15.0, 3.75, 0.3),
            m if m.contains("opus") => (5.0, 25.0, 6.25, 0.5),
            m if m.contains("haiku") => (1.0, 5.0, 1.25, 0.1),
            m if m.contains("gpt-4o-mini") || m.contains("gpt-4.1-mini") => (0.15, 0.6, 0.0, 0.0),
            m if m.contains("gpt-4") => (2.5, 10.0, 0.0, 0.0),
            _ => (0.0, 0.0, 0.0, 0.0),
        };

        let per_token = |tokens: u32, rate: f64| tokens as f64 / 1_000_000.0 * rate;

        per_token(usage.prompt_tokens, input_rate)
            + per_token(usage.completion_tokens, output_rate)
            + per_token(usage.cache_creation_tokens, cache_write_rate)
            + per_token(usage.cache_read_tokens, cache_read_rate)
    }
}

/// Session-wide usage, shared by concurrent verifications.
#[derive(Debug, Default)]
pub struct UsageTracker {
    usage: RwLock<LlmUsage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, run: &LlmUsage) {
        self.usage.write().merge(run);
    }

    pub fn snapshot(&self) -> LlmUsage {
        self.usage.read().clone()
    }

    pub fn reset(&self) {
        *self.usage.write() = LlmUsage::default();
    }
}
