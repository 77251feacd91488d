//! Background release of remote images.
//!
//! Deletions are best-effort: they run as spawned tasks that no request awaits, and a
//! failure only shows up in the logs and the counters below. Failed deletions are kept
//! for [`AssetJanitor::retry_failed`]; an object the store no longer has counts as
//! released.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use storefront_catalog::ImageRef;

use super::r#trait::{AssetStore, AssetStoreError};

/// Janitor counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct JanitorStats {
    /// Images handed to [`AssetJanitor::release`].
    pub scheduled: u64,
    pub deleted: u64,
    /// Failed delete attempts (a retried image counts once per attempt).
    pub failed: u64,
    pub pending_retry: usize,
    pub in_flight: usize,
}

#[derive(Debug, Clone)]
struct PendingRelease {
    image: ImageRef,
    owner: String,
}

#[derive(Debug, Default)]
struct JanitorState {
    scheduled: AtomicU64,
    deleted: AtomicU64,
    failed: AtomicU64,
    retry_queue: Mutex<Vec<PendingRelease>>,
    in_flight: Mutex<Vec<JoinHandle<()>>>,
}

impl JanitorState {
    /// Keeps `task` for [`AssetJanitor::settle`], dropping handles of finished tasks.
    fn hold(&self, task: JoinHandle<()>) {
        let mut in_flight = lock(&self.in_flight);
        in_flight.retain(|t| !t.is_finished());
        in_flight.push(task);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // The guarded vectors stay consistent even if a holder panicked.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Tracks best-effort deletions of remote images.
pub struct AssetJanitor<A: AssetStore + 'static> {
    store: Arc<A>,
    state: Arc<JanitorState>,
}

impl<A: AssetStore + 'static> Clone for AssetJanitor<A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            state: Arc::clone(&self.state),
        }
    }
}

impl<A: AssetStore + 'static> std::fmt::Debug for AssetJanitor<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetJanitor")
            .field("stats", &self.stats())
            .finish()
    }
}

impl<A: AssetStore + 'static> AssetJanitor<A> {
    pub fn new(store: Arc<A>) -> Self {
        Self {
            store,
            state: Arc::new(JanitorState::default()),
        }
    }

    /// Schedules deletion of `images` on behalf of `owner` without waiting for it.
    ///
    /// Outside a tokio runtime nothing can be spawned; the images go straight to the
    /// retry queue.
    pub fn release(&self, images: impl IntoIterator<Item = ImageRef>, owner: impl Display) {
        let owner = owner.to_string();
        for image in images {
            self.state.scheduled.fetch_add(1, Ordering::Relaxed);
            let pending = PendingRelease {
                image,
                owner: owner.clone(),
            };

            let store = Arc::clone(&self.store);
            let state = Arc::clone(&self.state);
            match Handle::try_current() {
                Ok(handle) => {
                    let task = handle.spawn(async move {
                        delete_once(&*store, &state, pending).await;
                    });
                    self.state.hold(task);
                }
                Err(_) => {
                    warn!(
                        owner = %pending.owner,
                        deletion_key = %pending.image.deletion_key,
                        "no runtime available; image queued for retry"
                    );
                    lock(&self.state.retry_queue).push(pending);
                }
            }
        }
    }

    /// Runs `work` as a tracked background task, so that [`Self::settle`] waits for it.
    pub(crate) fn track<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(handle) = Handle::try_current() {
            self.state.hold(handle.spawn(work));
        }
    }

    /// Waits for every scheduled deletion, including ones scheduled while waiting.
    pub async fn settle(&self) {
        loop {
            let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *lock(&self.state.in_flight));
            if tasks.is_empty() {
                return;
            }
            for task in tasks {
                if let Err(e) = task.await {
                    warn!(error = %e, "image release task aborted");
                }
            }
        }
    }

    /// Re-attempts every queued failed deletion once, inline. Returns how many succeeded;
    /// the ones that fail again go back on the queue.
    pub async fn retry_failed(&self) -> usize {
        let queued: Vec<PendingRelease> = std::mem::take(&mut *lock(&self.state.retry_queue));
        let mut released = 0;
        for pending in queued {
            if delete_once(&*self.store, &self.state, pending).await {
                released += 1;
            }
        }
        released
    }

    pub fn stats(&self) -> JanitorStats {
        JanitorStats {
            scheduled: self.state.scheduled.load(Ordering::Relaxed),
            deleted: self.state.deleted.load(Ordering::Relaxed),
            failed: self.state.failed.load(Ordering::Relaxed),
            pending_retry: lock(&self.state.retry_queue).len(),
            in_flight: lock(&self.state.in_flight)
                .iter()
                .filter(|t| !t.is_finished())
                .count(),
        }
    }
}

async fn delete_once<A: AssetStore + ?Sized>(
    store: &A,
    state: &JanitorState,
    pending: PendingRelease,
) -> bool {
    match store.delete(&pending.image.deletion_key).await {
        Ok(()) => {
            state.deleted.fetch_add(1, Ordering::Relaxed);
            debug!(
                owner = %pending.owner,
                deletion_key = %pending.image.deletion_key,
                "image released"
            );
            true
        }
        Err(AssetStoreError::NotFound { .. }) => {
            state.deleted.fetch_add(1, Ordering::Relaxed);
            debug!(
                owner = %pending.owner,
                deletion_key = %pending.image.deletion_key,
                "image already gone"
            );
            true
        }
        Err(e) => {
            state.failed.fetch_add(1, Ordering::Relaxed);
            warn!(
                owner = %pending.owner,
                deletion_key = %pending.image.deletion_key,
                error = %e,
                "image release failed; queued for retry"
            );
            lock(&state.retry_queue).push(pending);
            false
        }
    }
}
