// src/graph/graph.rs

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{Result, SluiceError};
use crate::fileset::PathTable;

/// Public type alias for task names throughout the crate.
pub type TaskName = String;

/// Context handed to every task action when it runs.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Symbolic directory table, shared and read-only.
    pub paths: Arc<PathTable>,
    /// Project root all selectors resolve against.
    pub root: PathBuf,
    /// Restrict the task's file set to this single file.
    ///
    /// The runner only sets this for the task named on the command line, not
    /// for its prerequisites.
    pub file_override: Option<PathBuf>,
}

/// A task's executable action: an async function from context to completion.
pub type TaskAction =
    Arc<dyn Fn(RunContext) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

struct TaskNode {
    prerequisites: Vec<TaskName>,
    action: TaskAction,
}

/// Explicit, caller-owned registry of tasks and their prerequisite edges.
///
/// The graph is append-only: tasks are registered once at startup and never
/// mutated afterwards, only re-executed. Prerequisites may reference tasks
/// that are registered later; an unresolved reference cannot close a cycle,
/// so the cycle check runs over the edges known so far and again as the
/// missing endpoints arrive.
pub struct TaskGraph {
    nodes: HashMap<TaskName, TaskNode>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
        }
    }

    /// Add a task.
    ///
    /// Fails with [`SluiceError::DuplicateTask`] if `id` is already
    /// registered, or [`SluiceError::CyclicDependency`] if the prerequisite
    /// edges would close a cycle. On error the graph is left unchanged.
    pub fn register(
        &mut self,
        id: impl Into<TaskName>,
        prerequisites: Vec<TaskName>,
        action: TaskAction,
    ) -> Result<()> {
        let id = id.into();

        if self.nodes.contains_key(&id) {
            return Err(SluiceError::DuplicateTask(id));
        }
        if prerequisites.iter().any(|p| *p == id) {
            return Err(SluiceError::CyclicDependency(id));
        }

        self.nodes.insert(
            id.clone(),
            TaskNode {
                prerequisites,
                action,
            },
        );

        if let Some(node) = self.find_cycle() {
            // Roll back so a failed registration has no effect.
            self.nodes.remove(&id);
            return Err(SluiceError::CyclicDependency(node));
        }

        debug!(task = %id, "task registered");
        Ok(())
    }

    /// Returns true if a task with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All registered task names.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Immediate prerequisites of a task.
    pub fn prerequisites_of(&self, id: &str) -> &[TaskName] {
        self.nodes
            .get(id)
            .map(|n| n.prerequisites.as_slice())
            .unwrap_or(&[])
    }

    /// The action registered for a task, if any.
    pub fn action_of(&self, id: &str) -> Option<TaskAction> {
        self.nodes.get(id).map(|n| Arc::clone(&n.action))
    }

    /// Run a topological sort over the registered edges; returns a task on a
    /// cycle if one exists.
    ///
    /// Edge direction: prerequisite -> dependent. Edges to tasks that are not
    /// registered yet are skipped; they cannot be part of a cycle.
    fn find_cycle(&self) -> Option<TaskName> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (name, node) in self.nodes.iter() {
            for dep in node.prerequisites.iter() {
                if self.nodes.contains_key(dep) {
                    graph.add_edge(dep.as_str(), name.as_str(), ());
                }
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => None,
            Err(cycle) => Some(cycle.node_id().to_string()),
        }
    }
}

impl Default for TaskGraph {
    fn default() -> Self {
        Self::new()
    }
}
