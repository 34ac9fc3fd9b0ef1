//! The monitoring pipeline: per-server processing, alert evaluation
//! and the sequential batch runner that drives both.

pub mod evaluator;
pub mod processor;
pub mod runner;

pub use evaluator::{AlertEvaluator, EvaluationOutcome};
pub use processor::{ProcessOutcome, ServerProcessor};
pub use runner::{BatchRunner, RunSummary};
