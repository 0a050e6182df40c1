//! Verification graph.
//!
//! Node order for every claim is
//! `Router -> Expert(category) -> [Retry -> Expert(category)]* -> Format -> End`.
//! Each node reads the current [`ClaimState`], returns a [`StateUpdate`]
//! and names the next node through its routing function.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use bsdetect_core::{format_result, Category, ClaimResult, ClaimState, StateUpdate};

use crate::resilience::LlmUsage;

mod executor;

pub use executor::{GraphExecutor, GraphRun};

/// Identifies a node in the verification graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Router,
    Expert(Category),
    Retry,
    Format,
    /// Terminal sentinel; never registered as a node
    End,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Router => f.write_str("router"),
            NodeId::Expert(category) => write!(f, "{}_expert", category),
            NodeId::Retry => f.write_str("retry"),
            NodeId::Format => f.write_str("format"),
            NodeId::End => f.write_str("__end__"),
        }
    }
}

/// Per-run scratch space shared by the nodes of one claim.
#[derive(Debug, Default)]
pub struct RunContext {
    /// LLM usage for this claim
    pub usage: LlmUsage,

    /// Backoff delays taken by the retry node, in order
    pub retry_delays: Vec<Duration>,

    /// Set by the format node
    pub result: Option<ClaimResult>,
}

/// One step of the graph.
#[async_trait]
pub trait Node: Send + Sync {
    fn id(&self) -> NodeId;

    /// Execute the step. Failures are reported through the update
    /// (`error` field), never as a panic or `Err`.
    async fn run(&self, state: &ClaimState, ctx: &mut RunContext) -> StateUpdate;

    /// Routing function evaluated on the merged state.
    fn next(&self, state: &ClaimState) -> NodeId;
}

/// Terminal node: normalises the state into a [`ClaimResult`].
#[derive(Debug, Default)]
pub struct FormatNode;

#[async_trait]
impl Node for FormatNode {
    fn id(&self) -> NodeId {
        NodeId::Format
    }

    async fn run(&self, state: &ClaimState, ctx: &mut RunContext) -> StateUpdate {
        ctx.result = Some(format_result(state));
        StateUpdate::none()
    }

    fn next(&self, _state: &ClaimState) -> NodeId {
        NodeId::End
    }
}

/// Expert node for the state's category. Unrouted claims go to `General`.
pub fn expert_for(state: &ClaimState) -> NodeId {
    NodeId::Expert(state.category.unwrap_or(Category::General))
}
