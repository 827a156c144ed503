// src/stage/mod.rs

//! Transform stages.
//!
//! A stage consumes a file set and produces a file set; what it computes in
//! between (copying, or delegating to an external lint/compile/minify tool)
//! is opaque to the task graph. Two failure channels exist:
//!
//! - a per-file [`SluiceError::StageProcessing`] record in [`StageOutput`]:
//!   the file is dropped, the rest of the set continues (logged by the task
//!   driver, never fatal on its own);
//! - a stage-level `Err`, which fails the whole task.

pub mod command;
pub mod copy;

use std::path::PathBuf;

use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::errors::SluiceError;
use crate::fileset::FileSet;

pub use command::ExecStage;
pub use copy::CopyStage;

/// Context shared by all stages of a task.
#[derive(Debug, Clone)]
pub struct StageContext {
    /// Project root; relative destinations and commands resolve against it.
    pub root: PathBuf,
    /// Task name, for diagnostics.
    pub task: String,
}

/// Result of applying one stage.
#[derive(Debug)]
pub struct StageOutput {
    /// Files the stage produced, fed to the next stage in the sequence.
    pub files: FileSet,
    /// Per-file failures; the pipeline continues without these files.
    pub failures: Vec<SluiceError>,
}

impl StageOutput {
    pub fn passthrough(files: FileSet) -> Self {
        Self {
            files,
            failures: Vec::new(),
        }
    }
}

/// Uniform contract every transform implements.
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    /// Apply the transform to `input`.
    ///
    /// `Err` fails the owning task; per-file trouble goes into
    /// [`StageOutput::failures`] instead.
    fn apply<'a>(
        &'a self,
        input: FileSet,
        ctx: &'a StageContext,
    ) -> BoxFuture<'a, anyhow::Result<StageOutput>>;
}

/// Run a task's stages in declared order, each consuming the previous
/// stage's output file set.
///
/// Per-file failures are logged and dropped from the set (the run goes on);
/// a stage-level error aborts the sequence and fails the task.
pub async fn run_stage_sequence(
    stages: &[Box<dyn Stage>],
    input: FileSet,
    ctx: &StageContext,
) -> anyhow::Result<FileSet> {
    let mut files = input;

    for stage in stages {
        let output = stage.apply(files, ctx).await?;

        for failure in &output.failures {
            warn!(
                task = %ctx.task,
                stage = %stage.name(),
                "file dropped from pipeline: {failure}"
            );
        }

        info!(
            task = %ctx.task,
            stage = %stage.name(),
            produced = output.files.len(),
            "stage complete"
        );

        files = output.files;
    }

    Ok(files)
}
