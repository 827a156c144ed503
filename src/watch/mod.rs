// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Binding compiled file selectors to the task lists they re-run.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//!
//! It does **not** know about task prerequisites; it only turns filesystem
//! change events into task-level triggers.

pub mod bindings;
pub mod watcher;

pub use bindings::{build_watch_bindings, tasks_for_path, WatchBinding};
pub use watcher::{spawn_watcher, WatcherHandle};
