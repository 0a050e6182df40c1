//! Resilience for bsdetect-runtime.
//!
//! - Retry with exponential backoff between expert attempts
//! - Token and cost accounting

mod retry;
mod usage;

pub use retry::{NoopSleeper, RetryNode, RetryPolicy, Sleeper, TokioSleeper};
pub use usage::{LlmUsage, UsageTracker};
