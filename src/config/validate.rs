// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::ConfigFile;
use crate::errors::{Result, SluiceError};
use crate::fileset::{FileSelector, PathTable};

/// Run structural validation against a loaded configuration.
///
/// Structural errors are fatal and reported immediately; nothing executes
/// with a half-valid graph. This checks:
/// - there is at least one task
/// - all `after` references refer to existing tasks, none to themselves
/// - the task graph has no cycles
/// - `[paths]` placeholders and glob patterns compile
/// - watch bindings are non-empty and name existing tasks
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_task_references(cfg)?;
    validate_acyclic(cfg)?;
    validate_selectors(cfg)?;
    validate_watch_bindings(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &ConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(SluiceError::Config(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_task_references(cfg: &ConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == name {
                return Err(SluiceError::CyclicDependency(name.clone()));
            }
            if !cfg.task.contains_key(dep) {
                return Err(SluiceError::Config(format!(
                    "task '{name}' has unknown prerequisite '{dep}' in `after`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_acyclic(cfg: &ConfigFile) -> Result<()> {
    // Edge direction: prerequisite -> task. For:
    //   [task.B]
    //   after = ["A"]
    // we add edge A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(SluiceError::CyclicDependency(
            cycle.node_id().to_string(),
        )),
    }
}

/// Compile every selector once so pattern and placeholder mistakes surface at
/// load time, not mid-run.
fn validate_selectors(cfg: &ConfigFile) -> Result<()> {
    let paths = PathTable::new(cfg.paths.clone());

    for (name, task) in cfg.task.iter() {
        let expanded = paths.expand_all(&task.select).map_err(|e| {
            SluiceError::Config(format!("task '{name}': {e}"))
        })?;
        FileSelector::new(&expanded)?;

        for stage in task.stage.iter() {
            let template = match stage {
                crate::config::model::StageConfig::Copy { dest, .. } => dest,
                crate::config::model::StageConfig::Exec { cmd } => cmd,
            };
            paths.expand(template).map_err(|e| {
                SluiceError::Config(format!("task '{name}': {e}"))
            })?;
        }
    }

    for (idx, binding) in cfg.watch.iter().enumerate() {
        let expanded = paths.expand_all(&binding.select).map_err(|e| {
            SluiceError::Config(format!("watch binding #{idx}: {e}"))
        })?;
        FileSelector::new(&expanded)?;
    }

    Ok(())
}

fn validate_watch_bindings(cfg: &ConfigFile) -> Result<()> {
    for (idx, binding) in cfg.watch.iter().enumerate() {
        if binding.select.is_empty() {
            return Err(SluiceError::Config(format!(
                "watch binding #{idx} has an empty `select` list"
            )));
        }
        if binding.run.is_empty() {
            return Err(SluiceError::Config(format!(
                "watch binding #{idx} has an empty `run` list"
            )));
        }
        for task in binding.run.iter() {
            if !cfg.task.contains_key(task) {
                return Err(SluiceError::Config(format!(
                    "watch binding #{idx} runs unknown task '{task}'"
                )));
            }
        }
    }
    Ok(())
}
