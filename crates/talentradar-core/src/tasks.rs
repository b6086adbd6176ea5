//! Detached work started by subscription handlers.
//!
//! Handlers that must not hold up the command (emails, AI summaries) spawn
//! through [`BackgroundTasks`] so the process can wait for them before it
//! exits.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::warn;

/// A shared set of spawned tasks. Clones track into the same set.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    set: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns `task` on the current runtime and tracks it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut set = self.lock();
        while let Some(finished) = set.try_join_next() {
            report(finished);
        }
        set.spawn(task);
    }

    /// Number of tracked tasks that have not been reaped yet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Waits for every tracked task, including tasks spawned while waiting,
    /// for at most `timeout`.
    ///
    /// Returns `false` if the timeout elapsed first; the unfinished tasks are
    /// aborted.
    pub async fn wait(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.drain()).await.is_ok()
    }

    async fn drain(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.lock());
            if pending.is_empty() {
                return;
            }
            while let Some(finished) = pending.join_next().await {
                report(finished);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        // The set stays consistent even if a holder panicked.
        self.set.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn report(result: Result<(), tokio::task::JoinError>) {
    if let Err(err) = result {
        warn!(error = %err, "background task did not complete");
    }
}

impl fmt::Debug for BackgroundTasks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundTasks")
            .field("len", &self.len())
            .finish()
    }
}
