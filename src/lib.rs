// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fileset;
pub mod graph;
pub mod logging;
pub mod pipeline;
pub mod stage;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::config::model::{ConfigFile, StageConfig};
use crate::fileset::PathTable;
use crate::graph::{RunContext, Runner, TaskGraph, TaskName, TaskOutcome};
use crate::pipeline::{build_graph, build_path_table};
use crate::watch::{build_watch_bindings, spawn_watcher};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - graph assembly
/// - one-shot runs, the task listing, or the watch loop
/// - Ctrl-C handling in watch mode
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let root = config_root_dir(&config_path);
    let paths = Arc::new(build_path_table(&cfg));
    let graph = build_graph(&cfg, &paths)?;

    match args.command {
        Command::List => {
            print_task_list(&cfg);
            Ok(())
        }
        Command::Run { task, file } => {
            let ctx = RunContext {
                paths,
                root,
                file_override: file.map(PathBuf::from),
            };
            run_once(&graph, ctx, &task).await
        }
        Command::Watch => watch_loop(&cfg, &graph, paths, root).await,
    }
}

/// Run one task (and its prerequisites), log the per-task outcomes, and fail
/// with a non-zero exit if any task in the run failed.
async fn run_once(graph: &TaskGraph, ctx: RunContext, task: &str) -> Result<()> {
    let runner = Runner::new(graph, ctx);
    let report = runner.run(task).await?;

    for (name, outcome) in report.outcomes() {
        match outcome {
            TaskOutcome::Succeeded => info!(task = %name, "succeeded"),
            TaskOutcome::Failed(msg) => warn!(task = %name, "failed: {msg}"),
            TaskOutcome::Skipped => warn!(task = %name, "skipped (prerequisite failed)"),
        }
    }

    report.into_result()?;
    Ok(())
}

/// Watch mode: hold the directory-change subscription and re-run bound tasks
/// on matching events until Ctrl-C.
///
/// Run failures here are logged, not fatal; the loop keeps serving the next
/// change event. Rapid successive events are not coalesced.
async fn watch_loop(
    cfg: &ConfigFile,
    graph: &TaskGraph,
    paths: Arc<PathTable>,
    root: PathBuf,
) -> Result<()> {
    let bindings = build_watch_bindings(cfg, &paths)?;
    if bindings.is_empty() {
        anyhow::bail!("no [[watch]] bindings configured; nothing to watch");
    }

    let (trigger_tx, mut trigger_rx) = mpsc::channel::<TaskName>(64);
    let _watcher_handle = spawn_watcher(root.clone(), bindings, trigger_tx)?;

    let ctx = RunContext {
        paths,
        root,
        file_override: None,
    };
    let runner = Runner::new(graph, ctx);

    info!("watching; press Ctrl-C to stop");

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!("failed to listen for Ctrl+C: {e}");
                }
                info!("shutdown requested, stopping watch loop");
                break;
            }
            triggered = trigger_rx.recv() => {
                let Some(task) = triggered else {
                    break;
                };
                match runner.run(&task).await {
                    Ok(report) => {
                        if let Some((failed, msg)) = report.first_failure() {
                            warn!(task = %failed, "run failed: {msg}");
                        }
                    }
                    Err(err) => {
                        warn!(task = %task, error = %err, "could not run task");
                    }
                }
            }
        }
    }

    Ok(())
}

/// Figure out a sensible project root: the directory containing the config
/// file, or `.`.
fn config_root_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Simple listing output: print tasks, prerequisites and stages.
fn print_task_list(cfg: &ConfigFile) {
    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if !task.select.is_empty() {
            println!("      select: {:?}", task.select);
        }
        for stage in task.stage.iter() {
            match stage {
                StageConfig::Copy { dest, suffix } => match suffix {
                    Some(s) => println!("      stage: copy -> {dest} (suffix {s})"),
                    None => println!("      stage: copy -> {dest}"),
                },
                StageConfig::Exec { cmd } => println!("      stage: exec: {cmd}"),
            }
        }
        if let Some(msg) = &task.notify {
            println!("      notify: {msg}");
        }
    }

    if !cfg.watch.is_empty() {
        println!();
        println!("watch bindings ({}):", cfg.watch.len());
        for binding in cfg.watch.iter() {
            println!("  - {:?} -> run {:?}", binding.select, binding.run);
        }
    }
}
