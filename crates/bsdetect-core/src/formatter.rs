//! Final result record.
//!
//! [`format_result`] is the last node of every run. It never fails and is
//! idempotent: formatting the same state twice gives the same record.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::state::ClaimState;
use crate::types::{Category, ReportedVerdict};

/// Reasoning used when neither a verdict nor an error is available.
pub const NO_ANALYSIS: &str = "No analysis available";

/// Fixed-shape output record returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimResult {
    pub claim: String,
    pub verdict: ReportedVerdict,
    /// 0-100; always 0 for `ERROR`
    pub confidence: u8,
    pub reasoning: String,
    pub used_search: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_type: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyzing_agent: Option<String>,
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_queries: Vec<String>,
}

impl ClaimResult {
    /// Whether the run ended without a verdict.
    pub fn is_error(&self) -> bool {
        self.verdict == ReportedVerdict::Error
    }
}

impl fmt::Display for ClaimResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Claim: {}", self.claim)?;
        writeln!(f, "Verdict: {}", self.verdict)?;
        write!(f, "Confidence: {}%", self.confidence)?;
        if let Some(category) = self.claim_type {
            write!(f, "\nCategory: {}", category)?;
        }
        if let Some(agent) = &self.analyzing_agent {
            write!(f, "\nAnalyzed by: {}", agent)?;
        }
        if self.retry_count > 0 {
            write!(f, "\nRetries: {}", self.retry_count)?;
        }
        if !self.search_queries.is_empty() {
            write!(f, "\n\nSearches:")?;
            for (i, query) in self.search_queries.iter().enumerate() {
                write!(f, "\n{}. {}", i + 1, query)?;
            }
        }
        write!(f, "\n\nReasoning: {}", self.reasoning)
    }
}

/// Normalise a final state into a [`ClaimResult`].
pub fn format_result(state: &ClaimState) -> ClaimResult {
    let (verdict, confidence, reasoning) = match state.verdict {
        Some(verdict) => (
            ReportedVerdict::from(verdict),
            state.confidence.unwrap_or(0).min(100),
            state
                .reasoning
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| NO_ANALYSIS.to_string()),
        ),
        None => {
            let reasoning = match &state.error {
                Some(error) => format!("Unable to verify claim: {}", error),
                None => NO_ANALYSIS.to_string(),
            };
            (ReportedVerdict::Error, 0, reasoning)
        }
    };

    ClaimResult {
        claim: state.claim().to_string(),
        verdict,
        confidence,
        reasoning,
        used_search: state.used_search,
        error: if verdict == ReportedVerdict::Error {
            state.error.clone()
        } else {
            None
        },
        claim_type: state.category,
        analyzing_agent: state.analyzing_agent.clone(),
        retry_count: state.retry_count,
        search_queries: state.search_queries.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateUpdate;
    use crate::types::Verdict;
    use proptest::prelude::*;

    #[test]
    fn test_success_record() {
        let mut state = ClaimState::new("The Boeing 747 has four engines", 3);
        state.apply(StateUpdate::category(Category::Technical));
        state.apply(StateUpdate::assessment(
            Verdict::Legitimate,
            95,
            "Four turbofans.",
            "Technical Expert",
        ));

        let result = format_result(&state);
        assert_eq!(result.verdict, ReportedVerdict::Legitimate);
        assert_eq!(result.confidence, 95);
        assert_eq!(result.reasoning, "Four turbofans.");
        assert!(result.error.is_none());
        assert!(!result.is_error());
        assert_eq!(result.claim_type, Some(Category::Technical));
    }

    #[test]
    fn test_missing_verdict_becomes_error() {
        let mut state = ClaimState::new("claim", 0);
        state.apply(StateUpdate::failure("provider timed out"));

        let result = format_result(&state);
        assert!(result.is_error());
        assert_eq!(result.confidence, 0);
        assert_eq!(result.reasoning, "Unable to verify claim: provider timed out");
        assert_eq!(result.error.as_deref(), Some("provider timed out"));
    }

    #[test]
    fn test_missing_verdict_without_error() {
        let state = ClaimState::new("claim", 0);
        let result = format_result(&state);
        assert!(result.is_error());
        assert_eq!(result.reasoning, NO_ANALYSIS);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_display_block() {
        let mut state = ClaimState::new("Bitcoin hit $100,000 yesterday", 3);
        state.apply(StateUpdate::category(Category::CurrentEvent));
        state.apply(StateUpdate::none().with_search("bitcoin price", vec![]));
        state.apply(StateUpdate::assessment(
            Verdict::Bs,
            70,
            "No record.",
            "Current Events Expert",
        ));

        let text = format_result(&state).to_string();
        assert!(text.contains("Verdict: BS"));
        assert!(text.contains("Confidence: 70%"));
        assert!(text.contains("1. bitcoin price"));
        assert!(text.ends_with("Reasoning: No record."));
    }

    #[test]
    fn test_json_shape() {
        let state = ClaimState::new("claim", 0);
        let value = serde_json::to_value(format_result(&state)).unwrap();
        assert_eq!(value["verdict"], "ERROR");
        assert_eq!(value["used_search"], false);
        assert!(value.get("search_queries").is_none());
    }

    fn arb_state() -> impl Strategy<Value = ClaimState> {
        (
            ".{0,40}",
            0u32..5,
            proptest::option::of(prop_oneof![Just(Verdict::Bs), Just(Verdict::Legitimate)]),
            proptest::option::of(0u8..=100),
            proptest::option::of(".{0,40}"),
            proptest::option::of(".{1,40}"),
            any::<bool>(),
        )
            .prop_map(|(claim, max, verdict, confidence, reasoning, error, searched)| {
                let mut state = ClaimState::new(claim, max);
                state.verdict = verdict;
                state.confidence = confidence;
                state.reasoning = reasoning;
                state.error = error;
                state.used_search = searched;
                state
            })
    }

    proptest! {
        #[test]
        fn prop_format_is_idempotent(state in arb_state()) {
            prop_assert_eq!(format_result(&state), format_result(&state));
        }

        #[test]
        fn prop_error_iff_no_verdict(state in arb_state()) {
            let result = format_result(&state);
            prop_assert_eq!(result.is_error(), state.verdict.is_none());
            if result.is_error() {
                prop_assert_eq!(result.confidence, 0);
            }
            prop_assert!(result.confidence <= 100);
            prop_assert!(!result.reasoning.is_empty());
        }
    }
}
