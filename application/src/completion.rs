//! Completion signal
//!
//! Single-fire handoff between the stream emitter and the deferred
//! persistence task. The emitter owns a [`CompletionHandle`]: it
//! accumulates response text as fragments arrive and fires the signal
//! exactly once when the stream reaches its terminal frame. Firing also
//! happens on `Drop`, so an emitter abandoned mid-stream (consumer
//! disconnect) still releases the waiter instead of letting it run out the
//! full deadline.
//!
//! The underlying `oneshot` channel carries the fully-accumulated
//! [`StreamOutcome`], so the persistence task never observes a partially
//! written response and no additional locking is needed.

use counsel_domain::{StreamOutcome, Termination};
use std::time::Duration;
use tokio::sync::oneshot;

/// Ceiling on how long the persistence task waits for the signal.
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(30);

/// Create the signal pair for one request.
pub fn channel(message_id: impl Into<String>) -> (CompletionHandle, CompletionWaiter) {
    let (tx, rx) = oneshot::channel();
    (
        CompletionHandle {
            tx: Some(tx),
            outcome: StreamOutcome::new(message_id),
        },
        CompletionWaiter { rx },
    )
}

/// Producer half, owned by the stream emitter. Fires at most once.
pub struct CompletionHandle {
    tx: Option<oneshot::Sender<StreamOutcome>>,
    outcome: StreamOutcome,
}

impl CompletionHandle {
    /// Append one streamed fragment to the accumulated response text.
    pub fn append(&mut self, fragment: &str) {
        self.outcome.text.push_str(fragment);
    }

    /// Accumulated text so far.
    pub fn text(&self) -> &str {
        &self.outcome.text
    }

    /// Stable id shared by every frame of this stream.
    pub fn message_id(&self) -> &str {
        &self.outcome.message_id
    }

    /// Fire the signal with the given terminal state.
    pub fn complete(mut self, termination: Termination) {
        self.outcome.termination = termination;
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(tx) = self.tx.take() {
            // The waiter may already be gone (persistence disabled or timed
            // out); that is not an error.
            let _ = tx.send(self.outcome.clone());
        }
    }
}

impl Drop for CompletionHandle {
    fn drop(&mut self) {
        // Abandonment still releases the waiter; the outcome keeps its
        // `Disconnected` termination unless `complete` already ran.
        self.fire();
    }
}

/// Consumer half, awaited once by the persistence task.
pub struct CompletionWaiter {
    rx: oneshot::Receiver<StreamOutcome>,
}

impl CompletionWaiter {
    /// Wait for the signal with a bounded deadline.
    ///
    /// Exactly one of two outcomes occurs: the fired outcome is observed,
    /// or the deadline elapses and `None` is returned.
    pub async fn wait(self, deadline: Duration) -> Option<StreamOutcome> {
        match tokio::time::timeout(deadline, self.rx).await {
            Ok(Ok(outcome)) => Some(outcome),
            // A dropped sender fires from `Drop`, so this arm is only
            // reachable if the handle was leaked; treat it as a miss.
            Ok(Err(_)) => None,
            Err(_) => None,
        }
    }
}
