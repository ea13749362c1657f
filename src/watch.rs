//! Filesystem event listener.
//!
//! Bridges `notify`'s callback-style watcher onto the async scheduler: the
//! callback pushes qualifying paths into a channel, a task drains the
//! channel and (re)arms the debounce countdown. The watcher handle must be
//! kept alive for the life of the process; dropping it stops the events.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};
use trellis_intake::DebounceScheduler;

pub struct IntakeWatcher {
    _watcher: notify::RecommendedWatcher,
}

/// Start watching `root` recursively, arming `scheduler` on every created
/// file.
pub fn spawn(root: &Path, scheduler: Arc<DebounceScheduler>) -> Result<IntakeWatcher> {
    use notify::{Event, EventKind, RecursiveMode, Watcher};

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = notify::RecommendedWatcher::new(
        move |result: std::result::Result<Event, notify::Error>| match result {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Create(_)) {
                    return;
                }
                for path in event.paths {
                    if path.is_dir() {
                        continue;
                    }
                    // Sync droppings arm nothing.
                    if path.file_name().is_some_and(|n| n.as_encoded_bytes().starts_with(b".")) {
                        continue;
                    }
                    let _ = tx.send(path);
                }
            },
            Err(err) => error!(error = %err, "filesystem watcher error"),
        },
        notify::Config::default(),
    )
    .or_raise(|| ErrorKind::Watch)?;
    watcher.watch(root, RecursiveMode::Recursive).or_raise(|| ErrorKind::Watch)?;

    tokio::spawn(async move {
        while let Some(path) = rx.recv().await {
            debug!(path = %path.display(), "file arrived");
            scheduler.arm().await;
        }
    });
    Ok(IntakeWatcher { _watcher: watcher })
}
