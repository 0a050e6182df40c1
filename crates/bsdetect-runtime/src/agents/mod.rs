//! LLM-backed graph nodes.
//!
//! The router classifies a claim; one expert per category assesses it.
//! Every LLM call goes through [`complete_with_timeout`], which enforces the
//! per-call deadline and records usage on the run context.

mod expert;
mod router;

pub use expert::ExpertAgent;
pub use router::RouterAgent;

use std::time::Duration;
use thiserror::Error;

use bsdetect_core::SchemaError;

use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError};
use crate::resilience::LlmUsage;

/// Why an agent attempt produced no verdict.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed reply: {0}")]
    Schema(#[from] SchemaError),

    #[error("Expert was uncertain")]
    Uncertain,

    #[error("Confidence {confidence}% is below the required {min}%")]
    LowConfidence { confidence: u8, min: u8 },

    #[error("Unexpected search request: {0}")]
    UnexpectedToolRequest(String),
}

/// One provider call under `config.timeout`. Failed calls still count.
pub(crate) async fn complete_with_timeout(
    provider: &dyn LlmProvider,
    messages: Vec<ChatMessage>,
    config: &CompletionConfig,
    usage: &mut LlmUsage,
) -> Result<String, AgentError> {
    match tokio::time::timeout(config.timeout, provider.complete(messages, config)).await {
        Ok(Ok(response)) => {
            usage.add(&response.usage, &response.model);
            Ok(response.content)
        }
        Ok(Err(e)) => {
            usage.add_failed_call();
            Err(AgentError::Provider(e))
        }
        Err(_) => {
            usage.add_failed_call();
            Err(AgentError::Timeout(config.timeout))
        }
    }
}
