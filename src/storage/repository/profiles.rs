// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! User profiles: linked wallets and Telegram subscription.
//!
//! Wallet uniqueness across accounts is enforced in the database
//! (`RelayDatabase::link_wallet`); the profile keeps the user's own list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{stable_id, FileStorage, StorageResult};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: String,
    /// Linked wallet addresses (checksummed)
    #[serde(default)]
    pub wallets: Vec<String>,
    /// Telegram chat receiving broadcasts
    #[serde(default)]
    pub telegram_chat_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            wallets: Vec::new(),
            telegram_chat_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_wallet(&self, address: &str) -> bool {
        self.wallets.iter().any(|w| w.eq_ignore_ascii_case(address))
    }

    /// Add a wallet; returns `false` if it was already linked.
    pub fn add_wallet(&mut self, address: &str) -> bool {
        if self.has_wallet(address) {
            return false;
        }
        self.wallets.push(address.to_string());
        true
    }

    /// The wallet quest strategies verify against.
    pub fn primary_wallet(&self) -> Option<&str> {
        self.wallets.first().map(String::as_str)
    }
}

pub struct ProfileRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    /// The stored profile, or a fresh unsaved one.
    pub fn get_or_default(&self, user_id: &str) -> StorageResult<UserProfile> {
        let path = self.storage.paths().profile(&stable_id(&[user_id]));
        if !self.storage.exists(&path) {
            return Ok(UserProfile::new(user_id));
        }
        self.storage.read_json(path)
    }

    pub fn save(&self, profile: &UserProfile) -> StorageResult<()> {
        let mut profile = profile.clone();
        profile.updated_at = Utc::now();
        self.storage.write_json(
            self.storage.paths().profile(&stable_id(&[&profile.user_id])),
            &profile,
        )
    }

    /// Chat ids of every subscribed profile.
    pub fn list_telegram_chat_ids(&self) -> StorageResult<Vec<i64>> {
        let profiles: Vec<UserProfile> = self.storage.load_all(self.storage.paths().profiles_dir())?;
        let mut ids: Vec<i64> = profiles
            .into_iter()
            .filter_map(|p| p.telegram_chat_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }
}
