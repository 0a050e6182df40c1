//! Sequential graph runner.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bsdetect_core::routing::max_steps;
use bsdetect_core::{format_result, ClaimResult, ClaimState, StateUpdate};

use super::{Node, NodeId, RunContext};
use crate::resilience::LlmUsage;

/// Outcome of one graph run.
#[derive(Debug, Clone)]
pub struct GraphRun {
    pub state: ClaimState,
    pub result: ClaimResult,
    /// Nodes visited, in order
    pub trace: Vec<NodeId>,
    pub usage: LlmUsage,
    pub retry_delays: Vec<Duration>,
}

/// Runs registered nodes one at a time, starting at [`NodeId::Router`].
#[derive(Default)]
pub struct GraphExecutor {
    nodes: HashMap<NodeId, Arc<dyn Node>>,
}

impl GraphExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under its own id, replacing any previous one.
    pub fn add_node(&mut self, node: Arc<dyn Node>) -> &mut Self {
        self.nodes.insert(node.id(), node);
        self
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Drive `state` from the router to the end.
    ///
    /// Never fails: a missing node or an exhausted step budget records an
    /// error and jumps to the formatter.
    pub async fn run(&self, mut state: ClaimState) -> GraphRun {
        let mut ctx = RunContext::default();
        let mut trace = Vec::new();
        let step_limit = max_steps(state.max_retries);
        let mut current = NodeId::Router;

        while current != NodeId::End {
            if trace.len() >= step_limit && current != NodeId::Format {
                tracing::warn!(
                    steps = trace.len(),
                    limit = step_limit,
                    node = %current,
                    "Step limit reached, jumping to formatter"
                );
                state.apply(StateUpdate::none().with_error(format!(
                    "step limit of {} exceeded at {}",
                    step_limit, current
                )));
                current = NodeId::Format;
                continue;
            }

            let Some(node) = self.nodes.get(&current) else {
                tracing::warn!(node = %current, "Node not registered, jumping to formatter");
                if current == NodeId::Format {
                    break;
                }
                let error = format!("no node registered for {}", current);
                state.apply(StateUpdate::none().with_error(error));
                current = NodeId::Format;
                continue;
            };

            tracing::debug!(node = %current, retry_count = state.retry_count, "Entering node");
            trace.push(current);

            let update = node.run(&state, &mut ctx).await;
            state.apply(update);
            current = node.next(&state);
        }

        let result = ctx.result.take().unwrap_or_else(|| format_result(&state));

        GraphRun {
            state,
            result,
            trace,
            usage: ctx.usage,
            retry_delays: ctx.retry_delays,
        }
    }
}

impl std::fmt::Debug for GraphExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<String> = self.nodes.keys().map(|id| id.to_string()).collect();
        ids.sort();
        f.debug_struct("GraphExecutor").field("nodes", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FormatNode;
    use async_trait::async_trait;
    use bsdetect_core::{Category, ReportedVerdict, Verdict};

    struct FixedRouter(Category);

    #[async_trait]
    impl Node for FixedRouter {
        fn id(&self) -> NodeId {
            NodeId::Router
        }

        async fn run(&self, _state: &ClaimState, _ctx: &mut RunContext) -> StateUpdate {
            StateUpdate::category(self.0)
        }

        fn next(&self, state: &ClaimState) -> NodeId {
            crate::graph::expert_for(state)
        }
    }

    /// Loops back to itself forever.
    struct Spinner;

    #[async_trait]
    impl Node for Spinner {
        fn id(&self) -> NodeId {
            NodeId::Expert(Category::General)
        }

        async fn run(&self, _state: &ClaimState, _ctx: &mut RunContext) -> StateUpdate {
            StateUpdate::failure("still thinking")
        }

        fn next(&self, _state: &ClaimState) -> NodeId {
            NodeId::Expert(Category::General)
        }
    }

    struct Decider;

    #[async_trait]
    impl Node for Decider {
        fn id(&self) -> NodeId {
            NodeId::Expert(Category::Technical)
        }

        async fn run(&self, _state: &ClaimState, _ctx: &mut RunContext) -> StateUpdate {
            StateUpdate::assessment(Verdict::Legitimate, 90, "ok", "Technical Expert")
        }

        fn next(&self, _state: &ClaimState) -> NodeId {
            NodeId::Format
        }
    }

    #[tokio::test]
    async fn test_linear_run() {
        let mut graph = GraphExecutor::new();
        graph
            .add_node(Arc::new(FixedRouter(Category::Technical)))
            .add_node(Arc::new(Decider))
            .add_node(Arc::new(FormatNode));

        let run = graph.run(ClaimState::new("The 747 has four engines", 3)).await;
        assert_eq!(run.result.verdict, ReportedVerdict::Legitimate);
        assert_eq!(
            run.trace,
            vec![NodeId::Router, NodeId::Expert(Category::Technical), NodeId::Format]
        );
    }

    #[tokio::test]
    async fn test_step_guard_stops_cycle() {
        let mut graph = GraphExecutor::new();
        graph
            .add_node(Arc::new(FixedRouter(Category::General)))
            .add_node(Arc::new(Spinner))
            .add_node(Arc::new(FormatNode));

        let run = graph.run(ClaimState::new("claim", 1)).await;
        assert!(run.result.is_error());
        assert!(run.result.error.unwrap().contains("step limit"));
        assert_eq!(run.trace.last(), Some(&NodeId::Format));
        assert!(run.trace.len() <= max_steps(1) + 1);
    }

    #[tokio::test]
    async fn test_missing_expert_goes_to_formatter() {
        let mut graph = GraphExecutor::new();
        graph
            .add_node(Arc::new(FixedRouter(Category::Historical)))
            .add_node(Arc::new(FormatNode));

        let run = graph.run(ClaimState::new("claim", 3)).await;
        assert!(run.result.is_error());
        assert_eq!(run.trace, vec![NodeId::Router, NodeId::Format]);
    }

    #[tokio::test]
    async fn test_empty_graph_still_formats() {
        let graph = GraphExecutor::new();
        let run = graph.run(ClaimState::new("claim", 3)).await;
        assert!(run.result.is_error());
        assert!(run.trace.is_empty());
    }
}
