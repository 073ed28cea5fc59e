// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Repository layer providing typed access to the file store.
//!
//! Each repository provides CRUD operations for one document type,
//! using [`FileStorage`](super::FileStorage) for all file operations.

pub mod checkins;
pub mod completions;
pub mod profiles;
pub mod quests;
pub mod schemas;

pub use checkins::{CheckinRecord, CheckinRepository};
pub use completions::{CompletionRepository, CompletionStatus, TaskCompletion};
pub use profiles::{ProfileRepository, UserProfile};
pub use quests::{Quest, QuestRepository, QuestTask};
pub use schemas::{AttestationSchema, SchemaRepository};
