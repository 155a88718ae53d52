//! Decision logic for the Lambda version janitor.
//!
//! This crate owns the pure half of the cleanup job: the retention policy,
//! remote-error classification and backoff plan, environment configuration
//! parsing, and per-run outcome aggregation. It has no AWS or async
//! dependencies so every rule here is testable without mocks.

pub mod config;
pub mod outcome;
pub mod retention;
pub mod retry;
