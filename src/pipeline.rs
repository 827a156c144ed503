// src/pipeline.rs

//! Assembles a [`TaskGraph`] from a validated configuration.
//!
//! Each configured task becomes one registered action: resolve the task's
//! selector (or the single-file override), thread the file set through the
//! declared stages in order, then fire the notify message.

use std::sync::Arc;

use futures::FutureExt;
use tracing::info;

use crate::config::model::{ConfigFile, StageConfig};
use crate::errors::Result;
use crate::fileset::{FileSelector, FileSet, PathTable};
use crate::graph::{RunContext, TaskAction, TaskGraph};
use crate::stage::{run_stage_sequence, CopyStage, ExecStage, Stage, StageContext};

/// Build the path table from the `[paths]` section.
pub fn build_path_table(cfg: &ConfigFile) -> PathTable {
    PathTable::new(cfg.paths.clone())
}

/// Register every configured task into a fresh graph.
///
/// Assumes `cfg` passed [`crate::config::validate_config`]; selector and
/// placeholder errors can still surface here for stage destinations.
pub fn build_graph(cfg: &ConfigFile, paths: &Arc<PathTable>) -> Result<TaskGraph> {
    let mut graph = TaskGraph::new();

    for (name, task_cfg) in cfg.task.iter() {
        let patterns = paths.expand_all(&task_cfg.select)?;
        let selector = Arc::new(FileSelector::new(&patterns)?);
        let stages = Arc::new(build_stages(&task_cfg.stage, paths)?);
        let notify = task_cfg.notify.clone();
        let task_name = name.clone();

        let action: TaskAction = Arc::new(move |ctx: RunContext| {
            let selector = Arc::clone(&selector);
            let stages = Arc::clone(&stages);
            let notify = notify.clone();
            let task_name = task_name.clone();

            async move {
                let input: FileSet = match &ctx.file_override {
                    Some(file) => vec![file.clone()],
                    None => selector.resolve(&ctx.root)?,
                };

                let stage_ctx = StageContext {
                    root: ctx.root.clone(),
                    task: task_name.clone(),
                };

                run_stage_sequence(&stages, input, &stage_ctx).await?;

                if let Some(msg) = &notify {
                    info!(task = %task_name, "{msg}");
                }

                Ok(())
            }
            .boxed()
        });

        graph.register(name.clone(), task_cfg.after.clone(), action)?;
    }

    Ok(graph)
}

fn build_stages(
    stage_cfgs: &[StageConfig],
    paths: &PathTable,
) -> Result<Vec<Box<dyn Stage>>> {
    let mut stages: Vec<Box<dyn Stage>> = Vec::with_capacity(stage_cfgs.len());

    for cfg in stage_cfgs {
        match cfg {
            StageConfig::Copy { dest, suffix } => {
                let dest = paths.expand(dest)?;
                stages.push(Box::new(CopyStage::new(dest, suffix.clone())));
            }
            StageConfig::Exec { cmd } => {
                stages.push(Box::new(ExecStage::new(paths.expand(cmd)?)));
            }
        }
    }

    Ok(stages)
}
