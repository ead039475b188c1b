//! Deferred-persistence handshake.
//!
//! A detached background task waits (bounded) for the stream's completion
//! signal, then persists the finished turn at most once. Persistence is
//! best-effort and strictly ordered after stream completion: nothing here
//! can block or fail the already-completed response. A missed signal is a
//! silent skip.

use crate::completion::{COMPLETION_TIMEOUT, CompletionWaiter};
use crate::ports::conversation_store::ConversationStore;
use chrono::Utc;
use counsel_domain::{ConversationTurn, ErrorKind, RuntimeInfo, TurnIdentifiers};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Request-side inputs captured before streaming begins.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub identifiers: TurnIdentifiers,
    pub user_query: String,
    pub model: String,
    pub started_at: Instant,
}

pub struct PersistTurnUseCase {
    store: Arc<dyn ConversationStore>,
    deadline: Duration,
}

impl PersistTurnUseCase {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self {
            store,
            deadline: COMPLETION_TIMEOUT,
        }
    }

    /// Override the signal deadline (tests).
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Detach the background task for one request.
    pub fn spawn(&self, request: TurnRequest, waiter: CompletionWaiter) -> JoinHandle<()> {
        let store = self.store.clone();
        let deadline = self.deadline;
        tokio::spawn(async move { run(store, deadline, request, waiter).await })
    }
}

async fn run(
    store: Arc<dyn ConversationStore>,
    deadline: Duration,
    request: TurnRequest,
    waiter: CompletionWaiter,
) {
    let Some(outcome) = waiter.wait(deadline).await else {
        warn!(
            kind = %ErrorKind::CompletionTimeout,
            chat_id = %request.identifiers.chat_id,
            "completion signal not observed within {deadline:?}; skipping persistence"
        );
        return;
    };

    if !outcome.should_persist() {
        debug!(
            termination = ?outcome.termination,
            chat_id = %request.identifiers.chat_id,
            "nothing to persist for this turn"
        );
        return;
    }

    let turn = ConversationTurn::new(
        request.identifiers,
        RuntimeInfo {
            user_query: request.user_query,
            output: outcome.text,
            model: request.model,
            duration_ms: request.started_at.elapsed().as_millis() as u64,
            finished_at: Utc::now(),
        },
    );

    // Best-effort, never retried: the response already completed.
    if let Err(e) = store.save(&turn).await {
        warn!(turn_id = %turn.id, "conversation save failed: {e}");
        return;
    }
    debug!(turn_id = %turn.id, "conversation turn saved");
}
