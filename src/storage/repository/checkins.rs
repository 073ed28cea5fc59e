// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Daily check-in rows, one per user per UTC day.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{stable_id, FileStorage, StorageResult};

/// A user's check-in for one UTC day.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct CheckinRecord {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    /// Consecutive days including this one
    pub streak: u32,
    #[serde(default)]
    pub attestation_uid: Option<String>,
    pub xp_awarded: u64,
    pub created_at: DateTime<Utc>,
}

impl CheckinRecord {
    pub fn id_for(user_id: &str, date: NaiveDate) -> String {
        stable_id(&[user_id, &date.to_string()])
    }
}

pub struct CheckinRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> CheckinRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn find(&self, user_id: &str, date: NaiveDate) -> StorageResult<Option<CheckinRecord>> {
        let path = self
            .storage
            .paths()
            .checkin(&CheckinRecord::id_for(user_id, date));
        if !self.storage.exists(&path) {
            return Ok(None);
        }
        self.storage.read_json(path).map(Some)
    }

    pub fn has_checked_in(&self, user_id: &str, date: NaiveDate) -> bool {
        self.storage.exists(
            self.storage
                .paths()
                .checkin(&CheckinRecord::id_for(user_id, date)),
        )
    }

    /// Streak a check-in on `date` would have.
    pub fn next_streak(&self, user_id: &str, date: NaiveDate) -> StorageResult<u32> {
        let Some(previous_day) = date.pred_opt() else {
            return Ok(1);
        };
        Ok(self
            .find(user_id, previous_day)?
            .map_or(1, |previous| previous.streak + 1))
    }

    /// Insert a check-in; `AlreadyExists` on a second check-in the same day.
    pub fn create(&self, record: &CheckinRecord) -> StorageResult<()> {
        self.storage
            .create_json(self.storage.paths().checkin(&record.id), record)
    }

    pub fn update(&self, record: &CheckinRecord) -> StorageResult<()> {
        self.storage
            .write_json(self.storage.paths().checkin(&record.id), record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageError, StoragePaths};
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStorage) {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::new(StoragePaths::new(temp.path()));
        storage.initialize().unwrap();
        (temp, storage)
    }

    fn record(user: &str, date: NaiveDate, streak: u32) -> CheckinRecord {
        CheckinRecord {
            id: CheckinRecord::id_for(user, date),
            user_id: user.to_string(),
            date,
            streak,
            attestation_uid: None,
            xp_awarded: 10,
            created_at: Utc::now(),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn one_checkin_per_day() {
        let (_temp, storage) = setup();
        let repo = CheckinRepository::new(&storage);
        repo.create(&record("u1", day(1), 1)).unwrap();

        assert!(repo.has_checked_in("u1", day(1)));
        assert!(!repo.has_checked_in("u1", day(2)));
        assert!(matches!(
            repo.create(&record("u1", day(1), 1)),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn streak_continues_from_yesterday() {
        let (_temp, storage) = setup();
        let repo = CheckinRepository::new(&storage);
        assert_eq!(repo.next_streak("u1", day(5)).unwrap(), 1);

        repo.create(&record("u1", day(4), 3)).unwrap();
        assert_eq!(repo.next_streak("u1", day(5)).unwrap(), 4);
        assert_eq!(repo.next_streak("u1", day(6)).unwrap(), 1);
        assert_eq!(repo.next_streak("u2", day(5)).unwrap(), 1);
    }

    #[test]
    fn update_stores_attestation_uid() {
        let (_temp, storage) = setup();
        let repo = CheckinRepository::new(&storage);
        let mut checkin = record("u1", day(1), 1);
        repo.create(&checkin).unwrap();

        checkin.attestation_uid = Some("0xabc".to_string());
        repo.update(&checkin).unwrap();
        let loaded = repo.find("u1", day(1)).unwrap().unwrap();
        assert_eq!(loaded.attestation_uid.as_deref(), Some("0xabc"));
    }
}
