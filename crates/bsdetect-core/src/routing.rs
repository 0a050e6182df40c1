//! Routing functions for the verification graph.
//!
//! These are pure decisions over [`ClaimState`]; the runtime graph maps them
//! onto node ids.

use crate::state::ClaimState;

/// Where control goes after an expert attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterExpert {
    /// A verdict was produced
    Success,
    /// No verdict yet and retries remain
    Retry,
    /// No verdict and the retry budget is spent
    GiveUp,
}

/// Decide the edge out of an expert node.
pub fn route_after_expert(state: &ClaimState) -> AfterExpert {
    if state.verdict.is_some() {
        AfterExpert::Success
    } else if state.can_retry() {
        AfterExpert::Retry
    } else {
        AfterExpert::GiveUp
    }
}

/// Upper bound on graph steps for a claim with the given retry budget.
///
/// Router, then one expert run per attempt, one retry node between
/// attempts, then the formatter. The small slack absorbs the terminal hop.
pub fn max_steps(max_retries: u32) -> usize {
    let attempts = max_retries as usize + 1;
    1 + attempts + max_retries as usize + 1 + 2
}
