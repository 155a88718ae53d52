//! AWS-oriented adapters and handlers for the Lambda version janitor.
//!
//! This crate owns runtime integration details: paginated listing over the
//! Lambda API, the retry executor, the cleanup orchestrator, and the
//! CodePipeline result notifier. Decision rules live in `janitor_core`.

pub mod adapters;
pub mod handlers;
pub mod logging;
pub mod resolvers;
pub mod retry;
