// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Per-user task completion rows.
//!
//! The completion id is derived from `(user_id, quest_id, task_id)` so a user
//! can complete a task only once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{stable_id, FileStorage, StorageError, StorageResult};
use crate::quests::{TaskSubmission, TaskType};

/// Review state of a completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    PendingReview,
    Verified,
    Rejected,
}

/// A user's completion of one quest task.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TaskCompletion {
    pub id: String,
    pub user_id: String,
    pub quest_id: String,
    pub task_id: String,
    pub task_type: TaskType,
    pub status: CompletionStatus,
    #[serde(default)]
    pub submission: TaskSubmission,
    /// Transaction hash that proved the task, if any
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub reward_claimed: bool,
    /// EAS uid of the reward claim attestation
    #[serde(default)]
    pub attestation_uid: Option<String>,
    #[serde(default)]
    pub reviewer_id: Option<String>,
    #[serde(default)]
    pub review_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskCompletion {
    pub fn id_for(user_id: &str, quest_id: &str, task_id: &str) -> String {
        stable_id(&[user_id, quest_id, task_id])
    }

    pub fn new(
        user_id: &str,
        quest_id: &str,
        task_id: &str,
        task_type: TaskType,
        status: CompletionStatus,
        submission: TaskSubmission,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Self::id_for(user_id, quest_id, task_id),
            user_id: user_id.to_string(),
            quest_id: quest_id.to_string(),
            task_id: task_id.to_string(),
            task_type,
            status,
            submission,
            tx_hash: None,
            reward_claimed: false,
            attestation_uid: None,
            reviewer_id: None,
            review_note: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Repository for completion documents.
pub struct CompletionRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> CompletionRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn get(&self, completion_id: &str) -> StorageResult<TaskCompletion> {
        let path = self.storage.paths().completion(completion_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Completion {completion_id}")));
        }
        self.storage.read_json(path)
    }

    pub fn find(
        &self,
        user_id: &str,
        quest_id: &str,
        task_id: &str,
    ) -> StorageResult<TaskCompletion> {
        self.get(&TaskCompletion::id_for(user_id, quest_id, task_id))
    }

    /// Insert a new completion; `AlreadyExists` when the user already
    /// completed the task.
    pub fn create(&self, completion: &TaskCompletion) -> StorageResult<()> {
        self.storage
            .create_json(self.storage.paths().completion(&completion.id), completion)
    }

    pub fn update(&self, completion: &TaskCompletion) -> StorageResult<()> {
        let path = self.storage.paths().completion(&completion.id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Completion {}", completion.id)));
        }
        let mut completion = completion.clone();
        completion.updated_at = Utc::now();
        self.storage.write_json(path, &completion)
    }

    pub fn list_by_user(&self, user_id: &str) -> StorageResult<Vec<TaskCompletion>> {
        let mut completions: Vec<TaskCompletion> = self
            .storage
            .load_all(self.storage.paths().completions_dir())?;
        completions.retain(|c| c.user_id == user_id);
        completions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(completions)
    }

    /// Completions waiting for an admin decision.
    pub fn list_pending_review(&self) -> StorageResult<Vec<TaskCompletion>> {
        let mut completions: Vec<TaskCompletion> = self
            .storage
            .load_all(self.storage.paths().completions_dir())?;
        completions.retain(|c| c.status == CompletionStatus::PendingReview);
        completions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(completions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStorage) {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();
        (temp, storage)
    }

    fn text_completion(user: &str) -> TaskCompletion {
        TaskCompletion::new(
            user,
            "q1",
            "t1",
            TaskType::SubmitText,
            CompletionStatus::PendingReview,
            TaskSubmission {
                text: Some("my reflection".to_string()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn id_is_stable_per_user_and_task() {
        assert_eq!(
            TaskCompletion::id_for("u1", "q1", "t1"),
            TaskCompletion::id_for("u1", "q1", "t1")
        );
        assert_ne!(
            TaskCompletion::id_for("u1", "q1", "t1"),
            TaskCompletion::id_for("u2", "q1", "t1")
        );
    }

    #[test]
    fn second_completion_rejected() {
        let (_temp, storage) = setup();
        let repo = CompletionRepository::new(&storage);
        repo.create(&text_completion("u1")).unwrap();
        assert!(matches!(
            repo.create(&text_completion("u1")),
            Err(StorageError::AlreadyExists(_))
        ));
        repo.create(&text_completion("u2")).unwrap();
    }

    #[test]
    fn update_and_queries() {
        let (_temp, storage) = setup();
        let repo = CompletionRepository::new(&storage);
        repo.create(&text_completion("u1")).unwrap();
        repo.create(&text_completion("u2")).unwrap();
        assert_eq!(repo.list_pending_review().unwrap().len(), 2);

        let mut completion = repo.find("u1", "q1", "t1").unwrap();
        completion.status = CompletionStatus::Verified;
        completion.reviewer_id = Some("admin".to_string());
        repo.update(&completion).unwrap();

        let loaded = repo.get(&completion.id).unwrap();
        assert_eq!(loaded.status, CompletionStatus::Verified);
        assert_eq!(loaded.submission.text.as_deref(), Some("my reflection"));
        assert_eq!(repo.list_pending_review().unwrap().len(), 1);
        assert_eq!(repo.list_by_user("u1").unwrap().len(), 1);
    }

    #[test]
    fn update_missing_not_found() {
        let (_temp, storage) = setup();
        let repo = CompletionRepository::new(&storage);
        assert!(matches!(
            repo.update(&text_completion("u1")),
            Err(StorageError::NotFound(_))
        ));
    }
}
