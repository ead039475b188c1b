//! Stream-chat use case: the token-streaming state machine.
//!
//! Translates a role-tagged message sequence into the ordered frame
//! sequence `start, text-start, (text-delta)*, text-end, finish`, or the
//! same prefix terminated by a single `error` frame. An upstream failure is
//! reported as frame data rather than re-raised: by the time it can occur,
//! the event stream is already underway and there is no response-status
//! channel left to use.
//!
//! The accumulated response text travels through the [`CompletionHandle`],
//! which fires the completion signal once the terminal frame has been
//! produced (or on abandonment).

use crate::completion::CompletionHandle;
use crate::safe_model::SafeChatModel;
use counsel_domain::{Message, StreamFrame, Termination};
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct StreamChatUseCase {
    model: SafeChatModel,
}

impl StreamChatUseCase {
    pub fn new(model: SafeChatModel) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Mint the stable id shared by every frame of one stream.
    pub fn new_message_id() -> String {
        format!("assistant-{}", Uuid::new_v4())
    }

    /// Run one streamed exchange.
    ///
    /// Frames go into `frames`; the terminal state and accumulated text go
    /// through `completion`. A closed frame channel means the consumer went
    /// away — the pump stops and dropping `completion` still releases the
    /// waiter.
    pub async fn execute(
        &self,
        messages: Vec<Message>,
        frames: mpsc::Sender<StreamFrame>,
        mut completion: CompletionHandle,
    ) {
        let id = completion.message_id().to_string();
        info!(messages = messages.len(), "chat stream started");

        if frames.send(StreamFrame::start(&id)).await.is_err() {
            return;
        }
        if frames.send(StreamFrame::text_start(&id)).await.is_err() {
            return;
        }

        let mut stream = match self.model.stream(&messages).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(kind = %e.kind, "stream failed to open: {}", e.raw_message);
                let _ = frames.send(StreamFrame::error(e.to_string())).await;
                completion.complete(Termination::Errored);
                return;
            }
        };

        while let Some(item) = stream.recv().await {
            match item {
                Ok(fragment) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    completion.append(&fragment);
                    if frames.send(StreamFrame::delta(&id, fragment)).await.is_err() {
                        // Consumer disconnected; abandon the upstream
                        // iteration. Dropping `completion` fires the signal.
                        return;
                    }
                }
                Err(e) => {
                    error!(kind = %e.kind, "stream failed: {}", e.raw_message);
                    let _ = frames.send(StreamFrame::error(e.to_string())).await;
                    completion.complete(Termination::Errored);
                    return;
                }
            }
        }

        if frames.send(StreamFrame::text_end(&id)).await.is_err() {
            return;
        }
        if frames.send(StreamFrame::finish()).await.is_err() {
            return;
        }
        info!(chars = completion.text().len(), "chat stream finished");
        completion.complete(Termination::Finished);
    }
}
