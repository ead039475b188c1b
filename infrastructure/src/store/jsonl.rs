//! JSONL file store for conversation turns.
//!
//! One append-only JSONL file per (user, room) partition under a base
//! directory — the user id is the partition directory, matching the store
//! contract's partition key. Appends are serialized with a mutex; each
//! turn is one JSON line.

use async_trait::async_trait;
use counsel_application::ports::conversation_store::{ConversationStore, StoreError};
use counsel_domain::{ConversationTurn, TurnSummary};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct JsonlConversationStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlConversationStore {
    /// Create the store rooted at `base_dir` (created if missing).
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn partition_path(&self, user_id: &str, room_id: &str) -> PathBuf {
        self.base_dir
            .join(sanitize(user_id))
            .join(format!("{}.jsonl", sanitize(room_id)))
    }
}

/// Keep identifiers filesystem-safe.
fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl ConversationStore for JsonlConversationStore {
    async fn save(&self, turn: &ConversationTurn) -> Result<(), StoreError> {
        let path = self.partition_path(turn.partition_key(), &turn.identifiers.room_id);
        let line = serde_json::to_string(turn)?;

        let _guard = self.write_lock.lock().expect("store write lock poisoned");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }

    async fn recent_turns(
        &self,
        user_id: &str,
        room_id: &str,
        limit: usize,
    ) -> Result<Vec<TurnSummary>, StoreError> {
        let path = self.partition_path(user_id, room_id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        // The file is append-ordered oldest first; the contract wants
        // newest first. Undecodable lines are skipped, not fatal.
        let mut summaries: Vec<TurnSummary> = content
            .lines()
            .filter_map(|line| serde_json::from_str::<ConversationTurn>(line).ok())
            .map(|turn| TurnSummary {
                user_query: turn.runtime_info.user_query,
                output: turn.runtime_info.output,
            })
            .collect();
        summaries.reverse();
        summaries.truncate(limit);
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use counsel_domain::{RuntimeInfo, TurnIdentifiers};

    fn turn(user_id: &str, room_id: &str, query: &str, output: &str) -> ConversationTurn {
        ConversationTurn::new(
            TurnIdentifiers {
                user_id: user_id.to_string(),
                chat_id: "chat-1".to_string(),
                room_id: room_id.to_string(),
            },
            RuntimeInfo {
                user_query: query.to_string(),
                output: output.to_string(),
                model: "gpt-4o".to_string(),
                duration_ms: 10,
                finished_at: Utc::now(),
            },
        )
    }

    #[tokio::test]
    async fn saves_and_reads_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlConversationStore::new(dir.path()).unwrap();

        store.save(&turn("user-7", "room-3", "first", "a1")).await.unwrap();
        store.save(&turn("user-7", "room-3", "second", "a2")).await.unwrap();

        let summaries = store.recent_turns("user-7", "room-3", 10).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].user_query, "second");
        assert_eq!(summaries[1].user_query, "first");
    }

    #[tokio::test]
    async fn limit_keeps_only_the_newest_turns() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlConversationStore::new(dir.path()).unwrap();

        for i in 0..5 {
            store
                .save(&turn("user-7", "room-3", &format!("q{i}"), "a"))
                .await
                .unwrap();
        }

        let summaries = store.recent_turns("user-7", "room-3", 2).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].user_query, "q4");
        assert_eq!(summaries[1].user_query, "q3");
    }

    #[tokio::test]
    async fn partitions_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlConversationStore::new(dir.path()).unwrap();

        store.save(&turn("user-7", "room-3", "mine", "a")).await.unwrap();
        store.save(&turn("user-8", "room-3", "theirs", "a")).await.unwrap();

        let summaries = store.recent_turns("user-7", "room-3", 10).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].user_query, "mine");
    }

    #[tokio::test]
    async fn missing_partition_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlConversationStore::new(dir.path()).unwrap();
        let summaries = store.recent_turns("nobody", "nowhere", 10).await.unwrap();
        assert!(summaries.is_empty());
    }

    #[tokio::test]
    async fn corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonlConversationStore::new(dir.path()).unwrap();
        store.save(&turn("user-7", "room-3", "good", "a")).await.unwrap();

        let path = store.partition_path("user-7", "room-3");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();

        let summaries = store.recent_turns("user-7", "room-3", 10).await.unwrap();
        assert_eq!(summaries.len(), 1);
    }

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!(sanitize("user/../7"), "user____7");
        assert_eq!(sanitize("user-7_ok"), "user-7_ok");
    }
}
