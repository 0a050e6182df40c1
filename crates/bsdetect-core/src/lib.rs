//! # bsdetect-core
//!
//! Deterministic building blocks for claim verification.
//!
//! This crate holds everything that does not talk to an LLM:
//! - the [`ClaimState`] that flows through the verification graph and its
//!   merge rules
//! - decoding and schema validation of router and expert replies
//! - the retry routing decision taken after every expert attempt
//! - the [`ClaimResult`] formatter
//! - session memory and search-evidence shaping
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: No I/O, no clocks in decisions
//! 2. **Total formatter**: Every state formats into a well-formed result
//! 3. **Bounded retries**: `retry_count` never exceeds `max_retries`
//!
//! ## Example
//!
//! ```rust
//! use bsdetect_core::{format_result, route_after_expert, AfterExpert, ClaimState, StateUpdate};
//!
//! let mut state = ClaimState::new("The Boeing 747 has four engines", 3);
//! state.apply(StateUpdate::failure("provider timed out"));
//! assert_eq!(route_after_expert(&state), AfterExpert::Retry);
//!
//! let result = format_result(&state);
//! assert!(result.is_error());
//! ```

pub mod evidence;
pub mod formatter;
pub mod memory;
pub mod patterns;
pub mod response;
pub mod routing;
pub mod schema;
pub mod state;
pub mod types;

pub use evidence::{extract_facts, render_evidence, SearchHit, NO_EVIDENCE_FOUND};
pub use formatter::{format_result, ClaimResult};
pub use memory::{extract_entities, ClaimMemory, InMemoryClaimMemory, MemoryContext, MemoryRecord};
pub use response::{
    decode_expert_reply, decode_router_decision, AssessedVerdict, ExpertAssessment, ExpertReply,
    RouterDecision,
};
pub use routing::{route_after_expert, AfterExpert};
pub use schema::{ReplySchema, SchemaError};
pub use state::{ClaimState, StateUpdate};
pub use types::{Category, ConfidenceLevel, ReportedVerdict, Verdict};
