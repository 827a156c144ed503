// src/graph/runner.rs

use std::collections::{BTreeMap, HashMap, HashSet};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::errors::{Result, SluiceError};
use crate::graph::graph::{RunContext, TaskGraph, TaskName};

/// Terminal outcome of one task within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    /// The task's action returned an error (rendered message kept for the
    /// report and the process exit path).
    Failed(String),
    /// A prerequisite failed, so this task never ran.
    Skipped,
}

/// Per-run state of a task; collapsed into [`RunReport`] outcomes at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RunState {
    Pending,
    Running,
    Done(TaskOutcome),
}

/// Outcome of a whole `run` invocation: one terminal state per reachable task.
#[derive(Debug, Clone)]
pub struct RunReport {
    target: TaskName,
    outcomes: BTreeMap<TaskName, TaskOutcome>,
}

impl RunReport {
    /// The task the run was invoked on.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Terminal outcome for a task, if it was part of this run.
    pub fn outcome(&self, id: &str) -> Option<&TaskOutcome> {
        self.outcomes.get(id)
    }

    /// All outcomes, sorted by task name.
    pub fn outcomes(&self) -> impl Iterator<Item = (&str, &TaskOutcome)> {
        self.outcomes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when every task in the run succeeded.
    pub fn success(&self) -> bool {
        self.outcomes
            .values()
            .all(|o| matches!(o, TaskOutcome::Succeeded))
    }

    /// First failed task and its rendered cause, if any.
    pub fn first_failure(&self) -> Option<(&str, &str)> {
        self.outcomes.iter().find_map(|(name, outcome)| match outcome {
            TaskOutcome::Failed(msg) => Some((name.as_str(), msg.as_str())),
            _ => None,
        })
    }

    /// Convert into a hard error if any task failed.
    ///
    /// Skipped tasks alone do not fail a run; they only ever appear downstream
    /// of a failure, which is reported here.
    pub fn into_result(self) -> Result<RunReport> {
        match self.first_failure() {
            Some((task, msg)) => Err(SluiceError::TaskExecution {
                task: task.to_string(),
                source: anyhow::anyhow!("{msg}"),
            }),
            None => Ok(self),
        }
    }
}

/// Executes tasks from a [`TaskGraph`] in dependency order.
///
/// Each `run` invocation is self-contained: it computes the prerequisite
/// closure of the target, runs every task in it exactly once (diamonds
/// collapse), and lets branches with no dependency relationship proceed
/// concurrently. A failing task ends only its own branch: dependents are
/// skipped, siblings run to completion.
pub struct Runner<'g> {
    graph: &'g TaskGraph,
    ctx: RunContext,
}

impl<'g> Runner<'g> {
    pub fn new(graph: &'g TaskGraph, ctx: RunContext) -> Self {
        Self { graph, ctx }
    }

    /// Run `target` and all its transitive prerequisites.
    ///
    /// Fails with [`SluiceError::UnknownTask`] before any action runs if the
    /// target or any task in its prerequisite chain is not registered. Task
    /// failures do not fail `run` itself; they are reported per task in the
    /// returned [`RunReport`].
    pub async fn run(&self, target: &str) -> Result<RunReport> {
        let reachable = self.prerequisite_closure(target)?;

        info!(target = %target, tasks = reachable.len(), "starting run");

        let mut states: HashMap<TaskName, RunState> = reachable
            .iter()
            .map(|name| (name.clone(), RunState::Pending))
            .collect();

        // Reverse adjacency within the reachable set, for skip cascades.
        let mut dependents: HashMap<TaskName, Vec<TaskName>> = HashMap::new();
        for name in &reachable {
            for dep in self.graph.prerequisites_of(name) {
                dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(name.clone());
            }
        }

        let mut in_flight: JoinSet<(TaskName, anyhow::Result<()>)> = JoinSet::new();

        self.spawn_ready(target, &mut states, &mut in_flight);

        while let Some(joined) = in_flight.join_next().await {
            let (name, result) = match joined {
                Ok(pair) => pair,
                Err(join_err) => {
                    // A panicking action is a failure of that task, not of
                    // the runner; we cannot recover the task name from the
                    // JoinError, so abort the run.
                    return Err(SluiceError::Other(anyhow::anyhow!(
                        "task action panicked: {join_err}"
                    )));
                }
            };

            match result {
                Ok(()) => {
                    debug!(task = %name, "task completed successfully");
                    states.insert(name.clone(), RunState::Done(TaskOutcome::Succeeded));
                }
                Err(err) => {
                    warn!(task = %name, error = %err, "task failed; skipping dependents");
                    states.insert(
                        name.clone(),
                        RunState::Done(TaskOutcome::Failed(format!("{err:#}"))),
                    );
                    skip_dependents(&name, &dependents, &mut states);
                }
            }

            self.spawn_ready(target, &mut states, &mut in_flight);
        }

        let outcomes: BTreeMap<TaskName, TaskOutcome> = states
            .into_iter()
            .map(|(name, state)| match state {
                RunState::Done(outcome) => (name, outcome),
                // Unreachable for an acyclic graph: every pending task either
                // ran or was skipped by a failure cascade.
                RunState::Pending | RunState::Running => {
                    (name, TaskOutcome::Skipped)
                }
            })
            .collect();

        let report = RunReport {
            target: target.to_string(),
            outcomes,
        };

        info!(
            target = %target,
            success = report.success(),
            "run finished"
        );

        Ok(report)
    }

    /// Collect the target's prerequisite closure, verifying that every
    /// referenced task is registered before anything runs.
    fn prerequisite_closure(&self, target: &str) -> Result<Vec<TaskName>> {
        if !self.graph.contains(target) {
            return Err(SluiceError::UnknownTask(target.to_string()));
        }

        let mut seen: HashSet<TaskName> = HashSet::new();
        let mut stack: Vec<TaskName> = vec![target.to_string()];

        while let Some(name) = stack.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            for dep in self.graph.prerequisites_of(&name) {
                if !self.graph.contains(dep) {
                    return Err(SluiceError::UnknownTask(dep.clone()));
                }
                stack.push(dep.clone());
            }
        }

        Ok(seen.into_iter().collect())
    }

    /// Spawn every pending task whose prerequisites are all done-successful.
    fn spawn_ready(
        &self,
        target: &str,
        states: &mut HashMap<TaskName, RunState>,
        in_flight: &mut JoinSet<(TaskName, anyhow::Result<()>)>,
    ) {
        let ready: Vec<TaskName> = states
            .iter()
            .filter(|(name, state)| {
                **state == RunState::Pending && self.deps_satisfied(name, states)
            })
            .map(|(name, _)| name.clone())
            .collect();

        for name in ready {
            states.insert(name.clone(), RunState::Running);

            let action = match self.graph.action_of(&name) {
                Some(a) => a,
                // Cannot happen after prerequisite_closure verified the set.
                None => continue,
            };

            let mut ctx = self.ctx.clone();
            if name != target {
                ctx.file_override = None;
            }

            debug!(task = %name, "dependencies satisfied; dispatching");
            in_flight.spawn(async move {
                let result = action(ctx).await;
                (name, result)
            });
        }
    }

    fn deps_satisfied(&self, name: &str, states: &HashMap<TaskName, RunState>) -> bool {
        self.graph.prerequisites_of(name).iter().all(|dep| {
            matches!(
                states.get(dep),
                Some(RunState::Done(TaskOutcome::Succeeded))
            )
        })
    }
}

/// Mark all pending dependents of a finished-unsuccessful task as skipped,
/// transitively.
fn skip_dependents(
    failed: &str,
    dependents: &HashMap<TaskName, Vec<TaskName>>,
    states: &mut HashMap<TaskName, RunState>,
) {
    let mut stack: Vec<TaskName> = dependents
        .get(failed)
        .map(|v| v.clone())
        .unwrap_or_default();

    while let Some(name) = stack.pop() {
        if let Some(state) = states.get_mut(&name) {
            if *state == RunState::Pending {
                debug!(task = %name, "skipping dependent of failed task");
                *state = RunState::Done(TaskOutcome::Skipped);
                if let Some(next) = dependents.get(&name) {
                    stack.extend(next.iter().cloned());
                }
            }
        }
    }
}
