// src/watch/bindings.rs

use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::fileset::{FileSelector, PathTable};
use crate::graph::TaskName;

/// Association between a file selector and the tasks to re-run when a
/// matched file changes.
#[derive(Debug, Clone)]
pub struct WatchBinding {
    selector: FileSelector,
    tasks: Vec<TaskName>,
}

impl WatchBinding {
    pub fn new(selector: FileSelector, tasks: Vec<TaskName>) -> Self {
        Self { selector, tasks }
    }

    /// True if a change at this root-relative path concerns the binding.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.selector.matches(rel_path)
    }

    /// The tasks this binding re-runs, in configured order.
    pub fn tasks(&self) -> &[TaskName] {
        &self.tasks
    }
}

/// Compile every `[[watch]]` entry into a binding.
pub fn build_watch_bindings(
    cfg: &ConfigFile,
    paths: &PathTable,
) -> Result<Vec<WatchBinding>> {
    let mut bindings = Vec::with_capacity(cfg.watch.len());

    for entry in cfg.watch.iter() {
        let patterns = paths.expand_all(&entry.select)?;
        let selector = FileSelector::new(&patterns)?;
        bindings.push(WatchBinding::new(selector, entry.run.clone()));
    }

    Ok(bindings)
}

/// Tasks to trigger for a change at `rel_path`.
///
/// Every matching binding contributes its full task list, in order, without
/// deduplication across bindings; a non-matching path contributes nothing.
pub fn tasks_for_path(bindings: &[WatchBinding], rel_path: &str) -> Vec<TaskName> {
    let mut tasks = Vec::new();
    for binding in bindings {
        if binding.matches(rel_path) {
            tasks.extend(binding.tasks().iter().cloned());
        }
    }
    tasks
}
