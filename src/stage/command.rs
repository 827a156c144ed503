// src/stage/command.rs

use std::process::Stdio;

use anyhow::Context;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::fileset::FileSet;
use crate::stage::{Stage, StageContext, StageOutput};

/// Delegates the transform to an external command.
///
/// All the heavyweight work of the pipeline (linting, stylesheet compilation,
/// minification, image optimization, compression, serving) lives in external
/// tools; this stage is the seam they plug into.
///
/// The command string may contain a `{files}` placeholder, replaced with the
/// shell-quoted, space-joined file set. Without the placeholder the command
/// runs as-is. The input set passes through unchanged for the next stage;
/// tools that rewrite files in place or emit to their own destinations keep
/// working untracked.
///
/// A non-zero exit status fails the owning task. A hung tool stalls only its
/// own branch; there is no timeout.
pub struct ExecStage {
    cmd: String,
}

impl ExecStage {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }

    fn render(&self, input: &FileSet) -> String {
        if !self.cmd.contains("{files}") {
            return self.cmd.clone();
        }

        let joined = input
            .iter()
            .map(|p| shell_quote(&p.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ");

        self.cmd.replace("{files}", &joined)
    }
}

impl Stage for ExecStage {
    fn name(&self) -> &str {
        "exec"
    }

    fn apply<'a>(
        &'a self,
        input: FileSet,
        ctx: &'a StageContext,
    ) -> BoxFuture<'a, anyhow::Result<StageOutput>> {
        async move {
            // A file-driven command with nothing to feed it is a no-op, not
            // a spawn: tools like linters exit non-zero (or block on stdin)
            // when invoked with no targets.
            if self.cmd.contains("{files}") && input.is_empty() {
                info!(task = %ctx.task, cmd = %self.cmd, "empty file set; skipping command");
                return Ok(StageOutput::passthrough(input));
            }

            let rendered = self.render(&input);

            info!(task = %ctx.task, cmd = %rendered, "starting external command");

            // Shell spawn appropriate for the platform.
            let mut cmd = if cfg!(windows) {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(&rendered);
                c
            } else {
                let mut c = Command::new("sh");
                c.arg("-c").arg(&rendered);
                c
            };

            cmd.current_dir(&ctx.root)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);

            let mut child = cmd
                .spawn()
                .with_context(|| format!("spawning command for task '{}'", ctx.task))?;

            // Consume both pipes so OS buffers don't fill; log at debug.
            if let Some(stdout) = child.stdout.take() {
                let task = ctx.task.clone();
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!(task = %task, "stdout: {}", line);
                    }
                });
            }
            if let Some(stderr) = child.stderr.take() {
                let task = ctx.task.clone();
                tokio::spawn(async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!(task = %task, "stderr: {}", line);
                    }
                });
            }

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for command of task '{}'", ctx.task))?;

            let code = status.code().unwrap_or(-1);
            debug!(task = %ctx.task, exit_code = code, "external command exited");

            if !status.success() {
                anyhow::bail!("command '{}' exited with code {}", rendered, code);
            }

            Ok(StageOutput::passthrough(input))
        }
        .boxed()
    }
}

/// Minimal POSIX single-quote escaping for file arguments.
fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }
    if s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_'))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}
