// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::fileset::selector::relative_str;
use crate::graph::TaskName;
use crate::watch::bindings::{tasks_for_path, WatchBinding};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle releases the directory-change
/// subscription and stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Spawn a filesystem watcher that observes the given `root` directory
/// recursively and sends a task name on `trigger_tx` for every binding whose
/// selector matches a changed path.
///
/// Rapid successive events are not coalesced: each matching event triggers
/// its bound tasks again.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    bindings: Vec<WatchBinding>,
    trigger_tx: mpsc::Sender<TaskName>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    let bindings = Arc::new(bindings);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // Can't log via tracing from this thread reliably.
                    eprintln!("sluice: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("sluice: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .map_err(|e| anyhow::anyhow!("creating filesystem watcher: {e}"))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| anyhow::anyhow!("watching {:?}: {e}", root))?;

    info!("file watcher started on {:?}", root);

    // Async task that consumes notify events and forwards task triggers.
    let async_root = root.clone();
    let async_bindings = Arc::clone(&bindings);
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("received notify event: {:?}", event);

            for path in &event.paths {
                let Some(rel) = relative_str(&async_root, path) else {
                    warn!(
                        "could not relativize path {:?} against root {:?}",
                        path, async_root
                    );
                    continue;
                };

                for task in tasks_for_path(&async_bindings, &rel) {
                    debug!(task = %task, path = %rel, "watch match -> triggering task");
                    if trigger_tx.send(task).await.is_err() {
                        // Runtime side is gone; no point keeping this loop alive.
                        debug!("trigger channel closed; stopping watcher loop");
                        return;
                    }
                }
            }
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle { _inner: watcher })
}
