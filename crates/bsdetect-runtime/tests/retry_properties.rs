//! Retry bounds over arbitrary expert failure patterns.

mod common;

use proptest::prelude::*;

use bsdetect_core::ReportedVerdict;
use bsdetect_runtime::NodeId;

use common::{config, mock_search, verifier, Reply, ScriptedLlm};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_retries_are_bounded(
        max_retries in 0u32..5,
        outcomes in prop::collection::vec(any::<bool>(), 0..8),
    ) {
        let replies = outcomes
            .iter()
            .map(|ok| if *ok { Reply::verdict("BS", 80, "No.") } else { Reply::Fail })
            .collect();
        let llm = ScriptedLlm::new("general", replies);
        let verifier = verifier(llm.clone(), mock_search(), config(max_retries));

        let run = block_on(verifier.verify("Perpetual motion machines power Paris"));

        let attempts_allowed = max_retries as usize + 1;
        let first_success = outcomes.iter().take(attempts_allowed).position(|ok| *ok);

        prop_assert!(run.result.retry_count <= max_retries);
        prop_assert_eq!(run.retry_delays.len(), run.result.retry_count as usize);

        let retries_in_trace = run.trace.iter().filter(|id| **id == NodeId::Retry).count();
        prop_assert_eq!(retries_in_trace, run.result.retry_count as usize);

        match first_success {
            Some(index) => {
                prop_assert_eq!(run.result.verdict, ReportedVerdict::Bs);
                prop_assert_eq!(run.result.retry_count as usize, index);
                prop_assert_eq!(llm.expert_calls(), index + 1);
            }
            None => {
                prop_assert!(run.result.is_error());
                prop_assert_eq!(llm.expert_calls(), attempts_allowed);
                prop_assert_eq!(run.result.retry_count, max_retries);
            }
        }
    }

    #[test]
    fn prop_always_failing_expert_fails_closed(max_retries in 0u32..6) {
        let llm = ScriptedLlm::new("technical", vec![]);
        let verifier = verifier(llm.clone(), mock_search(), config(max_retries));

        let run = block_on(verifier.verify("The Boeing 747 can hover"));

        prop_assert!(run.result.is_error());
        prop_assert_eq!(run.result.confidence, 0);
        prop_assert_eq!(llm.expert_calls(), max_retries as usize + 1);
        prop_assert_eq!(run.trace.last(), Some(&NodeId::Format));
    }
}
