//! # bsdetect-runtime
//!
//! LLM-backed claim verification.
//!
//! A claim is classified by the router, assessed by the expert for its
//! category, retried with exponential backoff when the expert fails, and
//! normalised into a [`ClaimResult`](bsdetect_core::ClaimResult). Only the
//! current-events expert may use the search tool, once per claim.
//!
//! The deterministic parts (state merge, decoding, formatting, memory) live in
//! `bsdetect-core`; this crate adds providers, prompts, agents and the graph.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bsdetect_runtime::{ClaimVerifier, MockSearchProvider, ProviderRegistry};
//!
//! let provider = ProviderRegistry::with_defaults().create("anthropic", &serde_json::json!({}))?;
//! let verifier = ClaimVerifier::builder()
//!     .provider(provider)
//!     .search(Arc::new(MockSearchProvider::new()))
//!     .build()?;
//!
//! let run = verifier.verify("The Boeing 747 has four engines").await;
//! println!("{}", run.result);
//! ```

pub mod agents;
pub mod config;
pub mod graph;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod search;

pub use agents::{AgentError, ExpertAgent, RouterAgent};
pub use config::{ConfigError, RuntimeConfig};
pub use graph::{FormatNode, GraphExecutor, GraphRun, Node, NodeId, RunContext};
pub use orchestrator::{ClaimVerifier, ClaimVerifierBuilder, RuntimeError, RuntimeResult};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderRegistry, TokenUsage,
};
pub use resilience::{LlmUsage, NoopSleeper, RetryPolicy, Sleeper, TokioSleeper, UsageTracker};
pub use search::{MockSearchProvider, SearchError, SearchProvider};

#[cfg(feature = "web-search")]
pub use search::ExaSearchProvider;
