//! Claim verifier: wires the agents into a graph and runs claims through it.
//!
//! Per claim:
//! 1. Gather related prior claims from the memory store (if any)
//! 2. Run router -> expert -> [retry -> expert]* -> formatter
//! 3. Record the result in memory unless it is `ERROR`
//! 4. Fold the claim's LLM usage into the session total

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use bsdetect_core::{
    Category, ClaimMemory, ClaimResult, ClaimState, InMemoryClaimMemory, MemoryContext,
    MemoryRecord, StateUpdate,
};

use crate::agents::{ExpertAgent, RouterAgent};
use crate::config::{ConfigError, RuntimeConfig};
use crate::graph::{FormatNode, GraphExecutor, NodeId};
use crate::providers::LlmProvider;
use crate::resilience::{LlmUsage, RetryNode, RetryPolicy, Sleeper, TokioSleeper, UsageTracker};
use crate::search::SearchProvider;

/// Errors from assembling a verifier. Verification itself never fails.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Everything one verification produced.
#[derive(Debug, Clone)]
pub struct RuntimeResult {
    pub result: ClaimResult,

    /// Final graph state
    pub state: ClaimState,

    /// LLM usage for this claim only
    pub llm_usage: LlmUsage,

    /// Nodes visited, in order
    pub trace: Vec<NodeId>,

    /// Backoff delays taken between attempts
    pub retry_delays: Vec<Duration>,
}

impl RuntimeResult {
    /// Number of expert attempts made.
    pub fn expert_attempts(&self) -> usize {
        self.trace
            .iter()
            .filter(|id| matches!(id, NodeId::Expert(_)))
            .count()
    }
}

/// Runs claims through the verification graph.
pub struct ClaimVerifier {
    graph: GraphExecutor,
    config: RuntimeConfig,
    memory: Option<Arc<dyn ClaimMemory>>,
    usage: UsageTracker,
}

impl ClaimVerifier {
    pub fn builder() -> ClaimVerifierBuilder {
        ClaimVerifierBuilder::new()
    }

    /// Verify one claim. Always returns a well-formed result; failures show
    /// up as an `ERROR` verdict with `error` set.
    pub async fn verify(&self, claim: &str) -> RuntimeResult {
        tracing::info!(claim_len = claim.len(), "Verifying claim");

        let mut state = ClaimState::new(claim, self.config.retry.max_retries);
        if let Some(memory) = &self.memory {
            let context =
                MemoryContext::gather(memory.as_ref(), claim, self.config.memory.max_related);
            if !context.is_empty() {
                tracing::debug!(
                    related = context.related.len(),
                    patterns = context.patterns.len(),
                    "Injecting memory context"
                );
            }
            state.apply(StateUpdate::none().with_memory_context(context.render()));
        }

        let run = self.graph.run(state).await;

        if let Some(memory) = &self.memory {
            if !run.result.is_error() {
                memory.record(MemoryRecord::from_result(&run.result));
            }
        }
        self.usage.record(&run.usage);

        tracing::info!(
            verdict = %run.result.verdict,
            confidence = run.result.confidence,
            retry_count = run.result.retry_count,
            used_search = run.result.used_search,
            llm_calls = run.usage.llm_calls,
            "Claim verified"
        );

        RuntimeResult {
            result: run.result,
            state: run.state,
            llm_usage: run.usage,
            trace: run.trace,
            retry_delays: run.retry_delays,
        }
    }

    /// Verify claims one after another, sharing the memory session.
    pub async fn verify_batch<S: AsRef<str>>(&self, claims: &[S]) -> Vec<RuntimeResult> {
        let mut results = Vec::with_capacity(claims.len());
        for claim in claims {
            results.push(self.verify(claim.as_ref()).await);
        }
        results
    }

    /// LLM usage across every claim verified so far.
    pub fn session_usage(&self) -> LlmUsage {
        self.usage.snapshot()
    }

    pub fn memory(&self) -> Option<&Arc<dyn ClaimMemory>> {
        self.memory.as_ref()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}

/// Builder for [`ClaimVerifier`].
pub struct ClaimVerifierBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    search: Option<Arc<dyn SearchProvider>>,
    memory: Option<Arc<dyn ClaimMemory>>,
    config: RuntimeConfig,
    sleeper: Option<Box<dyn Sleeper>>,
    today: Option<NaiveDate>,
}

impl ClaimVerifierBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            search: None,
            memory: None,
            config: RuntimeConfig::default(),
            sleeper: None,
            today: None,
        }
    }

    /// Set the LLM provider.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the search adapter used by the current-events expert.
    pub fn search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    /// Use this memory store instead of a fresh in-memory one.
    pub fn memory(mut self, memory: Arc<dyn ClaimMemory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the backoff sleeper (tests use [`crate::resilience::NoopSleeper`]).
    pub fn sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Pin the date given to the current-events expert.
    pub fn today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn build(self) -> Result<ClaimVerifier, RuntimeError> {
        let provider = self
            .provider
            .ok_or_else(|| RuntimeError::ProviderNotConfigured("No provider set".to_string()))?;
        self.config.validate()?;

        let completion = self.config.completion_config();
        let mut graph = GraphExecutor::new();

        graph.add_node(Arc::new(RouterAgent::new(provider.clone(), completion.clone())));

        for category in Category::ALL {
            let mut expert = ExpertAgent::new(category, provider.clone(), completion.clone())
                .with_min_confidence(self.config.retry.min_confidence);
            if category.allows_search() {
                if let Some(search) = &self.search {
                    expert = expert.with_search(search.clone(), self.config.search.clone());
                }
            }
            if let Some(today) = self.today {
                expert = expert.with_today(today);
            }
            graph.add_node(Arc::new(expert));
        }

        let sleeper = self.sleeper.unwrap_or_else(|| Box::new(TokioSleeper));
        graph.add_node(Arc::new(RetryNode::new(
            RetryPolicy::from(&self.config.retry),
            sleeper,
        )));
        graph.add_node(Arc::new(FormatNode));

        let memory = match self.memory {
            Some(memory) => Some(memory),
            None if self.config.memory.enabled => {
                Some(Arc::new(InMemoryClaimMemory::new()) as Arc<dyn ClaimMemory>)
            }
            None => None,
        };

        tracing::debug!(
            provider = provider.name(),
            search = self.search.as_ref().map(|s| s.name()).unwrap_or("none"),
            memory = memory.is_some(),
            max_retries = self.config.retry.max_retries,
            "Built claim verifier"
        );

        Ok(ClaimVerifier {
            graph,
            config: self.config,
            memory,
            usage: UsageTracker::new(),
        })
    }
}

impl Default for ClaimVerifierBuilder {
    fn default() -> Self {
        Self::new()
    }
}
