//! Router node: one LLM call to pick the expert category.

use async_trait::async_trait;
use std::sync::Arc;

use bsdetect_core::{decode_router_decision, Category, ClaimState, RouterDecision, StateUpdate};

use super::{complete_with_timeout, AgentError};
use crate::graph::{expert_for, Node, NodeId, RunContext};
use crate::prompts::{router_user_prompt, ROUTER_PROMPT};
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider};
use crate::resilience::LlmUsage;

/// Classifies a claim. Any failure routes to [`Category::General`].
pub struct RouterAgent {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
}

impl RouterAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
        }
    }

    async fn classify(
        &self,
        claim: &str,
        usage: &mut LlmUsage,
    ) -> Result<RouterDecision, AgentError> {
        let messages = vec![
            ChatMessage::system(ROUTER_PROMPT),
            ChatMessage::user(router_user_prompt(claim)),
        ];
        let raw =
            complete_with_timeout(self.provider.as_ref(), messages, &self.completion, usage).await?;
        Ok(decode_router_decision(&raw)?)
    }
}

#[async_trait]
impl Node for RouterAgent {
    fn id(&self) -> NodeId {
        NodeId::Router
    }

    async fn run(&self, state: &ClaimState, ctx: &mut RunContext) -> StateUpdate {
        let category = match self.classify(state.claim(), &mut ctx.usage).await {
            Ok(decision) => {
                tracing::info!(
                    category = %decision.claim_type,
                    confidence_level = ?decision.confidence_level,
                    "Claim routed"
                );
                decision.claim_type
            }
            Err(e) => {
                tracing::warn!(error = %e, "Routing failed, using general expert");
                Category::General
            }
        };

        StateUpdate::category(category)
    }

    fn next(&self, state: &ClaimState) -> NodeId {
        expert_for(state)
    }
}
