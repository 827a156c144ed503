// src/graph/mod.rs

//! Task graph and per-run execution.
//!
//! - [`graph`] holds the caller-owned registry of named tasks and their
//!   prerequisite edges, with duplicate and cycle checks at registration.
//! - [`runner`] executes one task and its unsatisfied prerequisites in
//!   dependency order, memoized per invocation, with independent branches
//!   running concurrently.

pub mod graph;
pub mod runner;

pub use graph::{RunContext, TaskAction, TaskGraph, TaskName};
pub use runner::{RunReport, Runner, TaskOutcome};
