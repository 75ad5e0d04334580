//! Background garbage collection.
//!
//! Runs [`Directory::garbage_collection`] every `interval`, or earlier when
//! a request window opens or closes or a held-back change becomes due.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::directory::Directory;

/// Shortest sleep between two passes.
const MIN_SLEEP: Duration = Duration::from_millis(10);

/// Handle to the running GC task.
#[derive(Debug)]
pub struct GcTask {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl GcTask {
    /// Stop the task and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.handle.await;
    }
}

/// Spawn the GC loop on the current tokio runtime.
#[must_use]
pub fn spawn_gc(directory: Directory, interval: Duration) -> GcTask {
    let (shutdown, mut stopped) = oneshot::channel();
    let handle = tokio::spawn(async move {
        debug!(?interval, "gc task started");
        loop {
            let sleep = directory
                .next_wakeup()
                .map_or(interval, |at| {
                    (at - directory.now())
                        .to_std()
                        .unwrap_or(Duration::ZERO)
                        .min(interval)
                })
                .max(MIN_SLEEP);
            tokio::select! {
                _ = &mut stopped => break,
                () = tokio::time::sleep(sleep) => {
                    directory.garbage_collection();
                }
            }
        }
        debug!("gc task stopped");
    });
    GcTask { shutdown, handle }
}
