//! Accumulated result of one streamed turn.
//!
//! The stream emitter is the single writer of the outcome; the persistence
//! task reads it once, after the completion signal fires.

/// Terminal state of one streamed turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The stream produced its `text-end` and `finish` frames.
    Finished,
    /// The stream ended with a terminal `error` frame.
    Errored,
    /// The emitter was abandoned before a terminal frame (consumer went
    /// away mid-stream).
    Disconnected,
}

/// Everything persistence needs to know about a finished stream.
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    /// Stable id shared by every frame of the stream.
    pub message_id: String,
    /// Concatenation of every emitted `text-delta` payload.
    pub text: String,
    pub termination: Termination,
}

impl StreamOutcome {
    /// A fresh outcome; the termination stays `Disconnected` until the
    /// emitter reaches a terminal frame.
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            text: String::new(),
            termination: Termination::Disconnected,
        }
    }

    /// Whether this outcome represents a turn worth persisting: a
    /// successfully finished stream with non-empty output.
    pub fn should_persist(&self) -> bool {
        self.termination == Termination::Finished && !self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_outcome_is_disconnected_and_empty() {
        let outcome = StreamOutcome::new("assistant-1");
        assert_eq!(outcome.termination, Termination::Disconnected);
        assert!(outcome.text.is_empty());
        assert!(!outcome.should_persist());
    }

    #[test]
    fn only_finished_nonempty_outcomes_persist() {
        let mut outcome = StreamOutcome::new("assistant-1");
        outcome.text.push_str("안녕하세요");

        outcome.termination = Termination::Finished;
        assert!(outcome.should_persist());

        outcome.termination = Termination::Errored;
        assert!(!outcome.should_persist());

        outcome.termination = Termination::Finished;
        outcome.text.clear();
        assert!(!outcome.should_persist());
    }
}
