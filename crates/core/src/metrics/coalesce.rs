//! One-in-flight coalescing of fetch rounds
//!
//! A round runs on its own task, so it completes even when every caller stops
//! waiting. Callers that arrive while a round is outstanding get a clone of the
//! same shared future and observe the same outcome. The task clears the slot
//! itself when it finishes; the slot is tagged with a round number so a
//! finished round can never clear its successor.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use clusterwatch_domain::{ClusterWatchError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;

pub(crate) type SharedRound<T> = Shared<BoxFuture<'static, Result<T>>>;

pub(crate) struct InflightSlot<T> {
    slot: Mutex<Option<(u64, SharedRound<T>)>>,
    next_round: AtomicU64,
}

impl<T> InflightSlot<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self { slot: Mutex::new(None), next_round: AtomicU64::new(0) })
    }

    /// Join the outstanding round, or start one with `start`.
    ///
    /// `start` runs synchronously under the slot lock, so whatever it reads is
    /// the state at the moment the round begins. Returns the round and whether
    /// it was joined rather than started.
    pub(crate) fn join_or_start<F, Fut>(self: &Arc<Self>, start: F) -> (SharedRound<T>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let mut slot = self.slot.lock();
        if let Some((_, round)) = slot.as_ref() {
            return (round.clone(), true);
        }

        let round_id = self.next_round.fetch_add(1, Ordering::Relaxed);
        let fetch = start();
        let this = Arc::clone(self);

        // The task cannot clear the slot before it is filled: `finish` needs
        // the lock held here.
        let handle = tokio::spawn(async move {
            let result = fetch.await;
            this.finish(round_id);
            result
        });

        let round = async move {
            handle.await.unwrap_or_else(|e| {
                Err(ClusterWatchError::Internal(format!("fetch task failed: {e}")))
            })
        }
        .boxed()
        .shared();

        *slot = Some((round_id, round.clone()));
        (round, false)
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.slot.lock().is_some()
    }

    fn finish(&self, round_id: u64) {
        let mut slot = self.slot.lock();
        if matches!(slot.as_ref(), Some((current, _)) if *current == round_id) {
            *slot = None;
        }
    }
}
