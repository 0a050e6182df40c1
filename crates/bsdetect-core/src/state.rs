//! Claim state and partial updates.
//!
//! Every graph node receives the current [`ClaimState`] and returns a
//! [`StateUpdate`]. The executor merges the update into the state with
//! [`ClaimState::apply`], which enforces the state invariants:
//!
//! - `claim` never changes after construction
//! - `category` is written at most once
//! - `retry_count` only moves forward
//! - search queries and snippets are append-only

use serde::{Deserialize, Serialize};

use crate::types::{Category, Verdict};

/// The unit of work flowing through the verification graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimState {
    claim: String,

    /// Set once by the router
    pub category: Option<Category>,

    /// Number of retries performed so far
    pub retry_count: u32,

    /// Upper bound for `retry_count`
    pub max_retries: u32,

    pub verdict: Option<Verdict>,

    /// Confidence percentage (0-100)
    pub confidence: Option<u8>,

    pub reasoning: Option<String>,

    /// Name of the expert that produced the verdict
    pub analyzing_agent: Option<String>,

    /// Whether a search round-trip was performed
    pub used_search: bool,

    pub search_queries: Vec<String>,

    pub search_snippets: Vec<String>,

    /// Prior-claim context injected from the memory store
    pub memory_context: Option<String>,

    /// Last failure message, if any
    pub error: Option<String>,
}

impl ClaimState {
    /// Create the entry state for a claim.
    pub fn new(claim: impl Into<String>, max_retries: u32) -> Self {
        Self {
            claim: claim.into(),
            category: None,
            retry_count: 0,
            max_retries,
            verdict: None,
            confidence: None,
            reasoning: None,
            analyzing_agent: None,
            used_search: false,
            search_queries: Vec::new(),
            search_snippets: Vec::new(),
            memory_context: None,
            error: None,
        }
    }

    /// The claim text.
    pub fn claim(&self) -> &str {
        &self.claim
    }

    /// Whether retries remain.
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Merge a partial update into this state.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(category) = update.category {
            match self.category {
                None => self.category = Some(category),
                Some(current) if current != category => {
                    tracing::warn!(
                        current = %current,
                        attempted = %category,
                        "Ignoring attempt to change claim category"
                    );
                }
                Some(_) => {}
            }
        }

        if let Some(retry_count) = update.retry_count {
            if retry_count >= self.retry_count {
                self.retry_count = retry_count;
            } else {
                tracing::warn!(
                    current = self.retry_count,
                    attempted = retry_count,
                    "Ignoring attempt to decrease retry count"
                );
            }
        }

        if let Some(verdict) = update.verdict {
            self.verdict = verdict;
        }
        if let Some(confidence) = update.confidence {
            self.confidence = confidence.map(|c| c.min(100));
        }
        if let Some(reasoning) = update.reasoning {
            self.reasoning = reasoning;
        }
        if let Some(agent) = update.analyzing_agent {
            self.analyzing_agent = Some(agent);
        }
        if let Some(used_search) = update.used_search {
            self.used_search |= used_search;
        }
        if let Some(context) = update.memory_context {
            self.memory_context = Some(context);
        }
        if let Some(error) = update.error {
            self.error = error;
        }

        self.search_queries.extend(update.search_queries);
        self.search_snippets.extend(update.search_snippets);
    }
}

/// Partial update returned by a graph node.
///
/// `None` leaves a field untouched. For clearable fields the inner
/// `Option` is the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub category: Option<Category>,
    pub retry_count: Option<u32>,
    pub verdict: Option<Option<Verdict>>,
    pub confidence: Option<Option<u8>>,
    pub reasoning: Option<Option<String>>,
    pub analyzing_agent: Option<String>,
    pub used_search: Option<bool>,
    pub memory_context: Option<String>,
    pub error: Option<Option<String>>,
    /// Appended to the state's queries
    pub search_queries: Vec<String>,
    /// Appended to the state's snippets
    pub search_snippets: Vec<String>,
}

impl StateUpdate {
    /// An update that changes nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Router output.
    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    /// A successful expert assessment. Clears any earlier error.
    pub fn assessment(
        verdict: Verdict,
        confidence: u8,
        reasoning: impl Into<String>,
        agent: impl Into<String>,
    ) -> Self {
        Self {
            verdict: Some(Some(verdict)),
            confidence: Some(Some(confidence)),
            reasoning: Some(Some(reasoning.into())),
            analyzing_agent: Some(agent.into()),
            error: Some(None),
            ..Self::default()
        }
    }

    /// A failed expert attempt. Leaves the verdict unset.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            verdict: Some(None),
            error: Some(Some(error.into())),
            ..Self::default()
        }
    }

    /// Retry bookkeeping.
    pub fn retry(retry_count: u32) -> Self {
        Self {
            retry_count: Some(retry_count),
            ..Self::default()
        }
    }

    /// Record a search round-trip.
    pub fn with_search(mut self, query: impl Into<String>, snippets: Vec<String>) -> Self {
        self.used_search = Some(true);
        self.search_queries.push(query.into());
        self.search_snippets.extend(snippets);
        self
    }

    pub fn with_memory_context(mut self, context: Option<String>) -> Self {
        self.memory_context = context;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(Some(error.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = ClaimState::new("The Boeing 747 has four engines", 3);
        assert_eq!(state.claim(), "The Boeing 747 has four engines");
        assert_eq!(state.retry_count, 0);
        assert_eq!(state.max_retries, 3);
        assert!(state.category.is_none());
        assert!(state.verdict.is_none());
        assert!(!state.used_search);
        assert!(state.can_retry());
    }

    #[test]
    fn test_category_is_write_once() {
        let mut state = ClaimState::new("claim", 3);
        state.apply(StateUpdate::category(Category::Technical));
        state.apply(StateUpdate::category(Category::General));
        assert_eq!(state.category, Some(Category::Technical));
    }

    #[test]
    fn test_retry_count_never_decreases() {
        let mut state = ClaimState::new("claim", 3);
        state.apply(StateUpdate::retry(2));
        state.apply(StateUpdate::retry(1));
        assert_eq!(state.retry_count, 2);
    }

    #[test]
    fn test_assessment_clears_previous_error() {
        let mut state = ClaimState::new("claim", 3);
        state.apply(StateUpdate::failure("timeout"));
        assert_eq!(state.error.as_deref(), Some("timeout"));
        assert!(state.verdict.is_none());

        state.apply(StateUpdate::assessment(
            Verdict::Legitimate,
            95,
            "Four engines",
            "Technical Expert",
        ));
        assert!(state.error.is_none());
        assert_eq!(state.verdict, Some(Verdict::Legitimate));
        assert_eq!(state.confidence, Some(95));
        assert_eq!(state.analyzing_agent.as_deref(), Some("Technical Expert"));
    }

    #[test]
    fn test_search_lists_append() {
        let mut state = ClaimState::new("claim", 3);
        state.apply(StateUpdate::none().with_search("q1", vec!["a".into()]));
        state.apply(StateUpdate::none().with_search("q2", vec!["b".into(), "c".into()]));
        assert!(state.used_search);
        assert_eq!(state.search_queries, vec!["q1", "q2"]);
        assert_eq!(state.search_snippets, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let mut state = ClaimState::new("claim", 0);
        state.apply(StateUpdate {
            confidence: Some(Some(250)),
            ..StateUpdate::default()
        });
        assert_eq!(state.confidence, Some(100));
        assert!(!state.can_retry());
    }
}
