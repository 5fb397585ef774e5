//! # Per-emission join handle.
//!
//! [`Emitter::emit`](crate::Emitter::emit) schedules every matched handler
//! as its own task and hands back a [`Completion`]: a counter of
//! outstanding tasks the caller can wait on. Scheduling increments the
//! counter; each task decrements it on the way out through a drop guard,
//! so a handler that exits by panic still signals completion and a waiter
//! is never stranded.
//!
//! Dropping the handle without waiting detaches the emission: the handlers
//! keep running, nobody observes their completion.

use std::sync::Arc;

use tokio::sync::watch;

/// Join handle for one emission.
///
/// Resolves once every handler task scheduled by the originating `emit`
/// call has finished, successfully or by panic. An emission that matched
/// no handlers resolves immediately.
#[derive(Clone, Debug)]
pub struct Completion {
    outstanding: Arc<watch::Sender<usize>>,
}

impl Completion {
    /// A handle with zero outstanding work.
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            outstanding: Arc::new(tx),
        }
    }

    /// Reserves one unit of outstanding work.
    ///
    /// The returned guard releases the unit when dropped, which happens on
    /// every exit path of the task that holds it.
    pub(crate) fn guard(&self) -> CompletionGuard {
        self.outstanding.send_modify(|n| *n += 1);
        CompletionGuard {
            outstanding: Arc::clone(&self.outstanding),
        }
    }

    /// Number of handler tasks still running.
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// True once all scheduled handlers have finished.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }

    /// Waits until every handler scheduled by the originating emission has
    /// finished. Returns immediately if nothing is outstanding.
    pub async fn wait(&self) {
        let mut rx = self.outstanding.subscribe();
        // wait_for inspects the current value before parking, and the
        // sender lives in `self`, so the channel cannot close mid-wait.
        let _ = rx.wait_for(|outstanding| *outstanding == 0).await;
    }
}

/// Scoped release for one scheduled handler task.
pub(crate) struct CompletionGuard {
    outstanding: Arc<watch::Sender<usize>>,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.outstanding.send_modify(|n| *n -= 1);
    }
}
