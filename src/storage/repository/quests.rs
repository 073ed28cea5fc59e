// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Quest definitions.
//!
//! Each quest is stored as a separate JSON file under `quests/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStorage, StorageError, StorageResult};
use crate::quests::{TaskConfig, TaskType};

/// A task inside a quest.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct QuestTask {
    pub id: String,
    pub title: String,
    pub task_type: TaskType,
    #[serde(default)]
    pub config: TaskConfig,
    /// DG credited to the ledger when the reward is claimed
    pub reward_amount: u64,
}

/// A quest stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Quest {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub active: bool,
    pub tasks: Vec<QuestTask>,
    pub created_at: DateTime<Utc>,
}

impl Quest {
    pub fn task(&self, task_id: &str) -> Option<&QuestTask> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Sum of all task rewards.
    pub fn total_reward(&self) -> u64 {
        self.tasks.iter().map(|t| t.reward_amount).sum()
    }
}

/// Repository for quest documents.
pub struct QuestRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> QuestRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn get(&self, quest_id: &str) -> StorageResult<Quest> {
        let path = self.storage.paths().quest(quest_id);
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Quest {quest_id}")));
        }
        self.storage.read_json(path)
    }

    pub fn create(&self, quest: &Quest) -> StorageResult<()> {
        self.storage
            .create_json(self.storage.paths().quest(&quest.id), quest)
    }

    /// Quests sorted oldest first; inactive ones only when `include_inactive`.
    pub fn list(&self, include_inactive: bool) -> StorageResult<Vec<Quest>> {
        let mut quests: Vec<Quest> = self.storage.load_all(self.storage.paths().quests_dir())?;
        if !include_inactive {
            quests.retain(|q| q.active);
        }
        quests.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(quests)
    }
}
