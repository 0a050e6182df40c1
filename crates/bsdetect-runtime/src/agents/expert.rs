//! Category expert node.
//!
//! An attempt is one LLM call, or two when the current-events expert asks
//! for a search: the first reply names the query, the adapter runs it, and
//! the evidence goes back in a follow-up turn that must end in a verdict.
//! A claim gets at most one real search; later attempts reuse its evidence.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use std::sync::Arc;

use bsdetect_core::{
    decode_expert_reply, extract_facts, render_evidence, route_after_expert, AfterExpert, Category,
    ClaimState, ExpertAssessment, ExpertReply, StateUpdate, Verdict,
};

use super::{complete_with_timeout, AgentError};
use crate::config::SearchSettings;
use crate::graph::{Node, NodeId, RunContext};
use crate::prompts::{expert_name, expert_system_prompt, expert_user_prompt, EVIDENCE_FOLLOW_UP};
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider};
use crate::resilience::LlmUsage;
use crate::search::SearchProvider;

/// Query and facts from a search round-trip.
#[derive(Debug, Clone)]
struct SearchRecord {
    query: String,
    facts: Vec<String>,
}

/// Assesses claims of one category.
pub struct ExpertAgent {
    category: Category,
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    search: Option<Arc<dyn SearchProvider>>,
    search_settings: SearchSettings,
    min_confidence: u8,
    today: Option<NaiveDate>,
}

impl ExpertAgent {
    pub fn new(
        category: Category,
        provider: Arc<dyn LlmProvider>,
        completion: CompletionConfig,
    ) -> Self {
        Self {
            category,
            provider,
            completion,
            search: None,
            search_settings: SearchSettings::default(),
            min_confidence: 0,
            today: None,
        }
    }

    /// Attach a search adapter. Only used by categories that allow search.
    pub fn with_search(
        mut self,
        search: Arc<dyn SearchProvider>,
        settings: SearchSettings,
    ) -> Self {
        self.search = Some(search);
        self.search_settings = settings;
        self
    }

    /// Treat assessments below `min` percent as failed attempts.
    pub fn with_min_confidence(mut self, min: u8) -> Self {
        self.min_confidence = min;
        self
    }

    /// Pin the date embedded in the prompt. Defaults to the local date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn name(&self) -> &'static str {
        expert_name(self.category)
    }

    async fn attempt(
        &self,
        state: &ClaimState,
        usage: &mut LlmUsage,
        search_record: &mut Option<SearchRecord>,
    ) -> Result<(Verdict, u8, String), AgentError> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let mut messages = vec![
            ChatMessage::system(expert_system_prompt(self.category, today)),
            ChatMessage::user(expert_user_prompt(
                self.category,
                state.claim(),
                state.memory_context.as_deref(),
            )),
        ];

        let raw = self.complete(messages.clone(), usage).await?;
        let query = match decode_expert_reply(&raw)? {
            ExpertReply::Direct(assessment) => return self.accept(assessment),
            ExpertReply::ToolRequest { query } => query,
        };

        if !self.category.allows_search() {
            return Err(AgentError::UnexpectedToolRequest(query));
        }

        let evidence = if state.used_search {
            let previous = state.search_queries.last().cloned().unwrap_or(query);
            tracing::debug!(query = %previous, "Search already used, reusing evidence");
            render_evidence(&previous, &state.search_snippets)
        } else {
            match self.run_search(&query).await {
                Some(record) => {
                    let rendered = render_evidence(&record.query, &record.facts);
                    *search_record = Some(record);
                    rendered
                }
                None => render_evidence(&query, &[]),
            }
        };

        messages.push(ChatMessage::assistant(raw));
        messages.push(ChatMessage::user(format!("{}\n\n{}", evidence, EVIDENCE_FOLLOW_UP)));

        let raw = self.complete(messages, usage).await?;
        match decode_expert_reply(&raw)? {
            ExpertReply::Direct(assessment) => self.accept(assessment),
            ExpertReply::ToolRequest { query } => Err(AgentError::UnexpectedToolRequest(query)),
        }
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        usage: &mut LlmUsage,
    ) -> Result<String, AgentError> {
        complete_with_timeout(self.provider.as_ref(), messages, &self.completion, usage).await
    }

    /// Search failures yield an empty fact list, which renders as "No evidence found".
    /// Returns `None` without a search provider, so nothing is recorded as searched.
    async fn run_search(&self, query: &str) -> Option<SearchRecord> {
        let Some(search) = &self.search else {
            tracing::warn!(query, "No search provider configured");
            return None;
        };

        let hits = match tokio::time::timeout(
            self.completion.timeout,
            search.search(query, self.search_settings.max_results),
        )
        .await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                tracing::warn!(query, provider = search.name(), error = %e, "Search failed");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!(query, provider = search.name(), "Search timed out");
                Vec::new()
            }
        };

        let facts = extract_facts(&hits, self.search_settings.max_facts);
        tracing::info!(query, hits = hits.len(), facts = facts.len(), "Search completed");

        Some(SearchRecord {
            query: query.to_string(),
            facts,
        })
    }

    fn accept(&self, assessment: ExpertAssessment) -> Result<(Verdict, u8, String), AgentError> {
        let verdict = assessment.verdict.into_verdict().ok_or(AgentError::Uncertain)?;
        if assessment.confidence < self.min_confidence {
            return Err(AgentError::LowConfidence {
                confidence: assessment.confidence,
                min: self.min_confidence,
            });
        }
        Ok((verdict, assessment.confidence, assessment.reasoning))
    }
}

#[async_trait]
impl Node for ExpertAgent {
    fn id(&self) -> NodeId {
        NodeId::Expert(self.category)
    }

    async fn run(&self, state: &ClaimState, ctx: &mut RunContext) -> StateUpdate {
        let mut search_record = None;
        let outcome = self.attempt(state, &mut ctx.usage, &mut search_record).await;

        let update = match outcome {
            Ok((verdict, confidence, reasoning)) => {
                tracing::info!(
                    expert = self.name(),
                    verdict = %verdict,
                    confidence,
                    retry_count = state.retry_count,
                    "Verdict reached"
                );
                StateUpdate::assessment(verdict, confidence, reasoning, self.name())
            }
            Err(e) => {
                tracing::warn!(
                    expert = self.name(),
                    retry_count = state.retry_count,
                    error = %e,
                    "Expert attempt failed"
                );
                StateUpdate::failure(e.to_string())
            }
        };

        match search_record {
            Some(record) => update.with_search(record.query, record.facts),
            None => update,
        }
    }

    fn next(&self, state: &ClaimState) -> NodeId {
        match route_after_expert(state) {
            AfterExpert::Success | AfterExpert::GiveUp => NodeId::Format,
            AfterExpert::Retry => NodeId::Retry,
        }
    }
}
