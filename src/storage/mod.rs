// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! # Storage Module
//!
//! Two stores live under the data directory:
//!
//! - JSON documents, one file per entity, for data that is read whole and
//!   edited rarely (schemas, quests, completions, check-ins, profiles);
//! - an embedded redb database for rows that need atomic multi-table updates
//!   or ordered scans (attestation records, verified tx hashes, the DG
//!   ledger, withdrawals, wallet ownership).
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/
//!   relay.redb
//!   schemas/{schema_uid}.json
//!   quests/{quest_id}.json
//!   completions/{completion_id}.json
//!   checkins/{checkin_id}.json
//!   profiles/{profile_id}.json
//!   audit/{date}/events.jsonl
//! ```

pub mod audit;
pub mod database;
pub mod file_store;
pub mod paths;
pub mod records;
pub mod repository;
pub mod schema_cache;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use database::{DbError, DbResult, RelayDatabase};
pub use file_store::{FileStorage, StorageError, StorageResult};
pub use paths::{stable_id, StoragePaths};
pub use records::{AttestationRecord, WithdrawalRecord, WithdrawalStatus};
pub use repository::{
    AttestationSchema, CheckinRecord, CheckinRepository, CompletionRepository, CompletionStatus,
    ProfileRepository, Quest, QuestRepository, QuestTask, SchemaRepository, TaskCompletion,
    UserProfile,
};
pub use schema_cache::SchemaCache;
