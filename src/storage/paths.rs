// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Path layout of the data directory.

use std::path::{Path, PathBuf};

/// Default data directory.
pub const DATA_ROOT: &str = "./data";

/// Namespace for ids derived from natural keys (user id, user + day, ...).
const STABLE_ID_NAMESPACE: uuid::Uuid = uuid::Uuid::from_u128(0x6f1c_2a7e_53b4_4d0a_9c61_8e2f_d4a7_b390);

/// Deterministic id for a natural key.
///
/// Used where the file name must be derivable from request data, so that
/// "one per user per day" style uniqueness falls out of exclusive creation.
pub fn stable_id(parts: &[&str]) -> String {
    uuid::Uuid::new_v5(&STABLE_ID_NAMESPACE, parts.join("|").as_bytes()).to_string()
}

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root data directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Embedded database file.
    pub fn database_file(&self) -> PathBuf {
        self.root.join("relay.redb")
    }

    // ========== Schema Paths ==========

    pub fn schemas_dir(&self) -> PathBuf {
        self.root.join("schemas")
    }

    /// Schema document, keyed by schema UID.
    pub fn schema(&self, schema_uid: &str) -> PathBuf {
        self.schemas_dir().join(format!("{schema_uid}.json"))
    }

    // ========== Quest Paths ==========

    pub fn quests_dir(&self) -> PathBuf {
        self.root.join("quests")
    }

    pub fn quest(&self, quest_id: &str) -> PathBuf {
        self.quests_dir().join(format!("{quest_id}.json"))
    }

    pub fn completions_dir(&self) -> PathBuf {
        self.root.join("completions")
    }

    pub fn completion(&self, completion_id: &str) -> PathBuf {
        self.completions_dir().join(format!("{completion_id}.json"))
    }

    // ========== Check-in Paths ==========

    pub fn checkins_dir(&self) -> PathBuf {
        self.root.join("checkins")
    }

    pub fn checkin(&self, checkin_id: &str) -> PathBuf {
        self.checkins_dir().join(format!("{checkin_id}.json"))
    }

    // ========== Profile Paths ==========

    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join("profiles")
    }

    pub fn profile(&self, profile_id: &str) -> PathBuf {
        self.profiles_dir().join(format!("{profile_id}.json"))
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Path to a daily audit events file (JSONL format).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_dir().join(date).join("events.jsonl")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("./data"));
        assert_eq!(paths.database_file(), PathBuf::from("./data/relay.redb"));
    }

    #[test]
    fn document_paths_are_correct() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(
            paths.schema("0xabc"),
            PathBuf::from("/tmp/test-data/schemas/0xabc.json")
        );
        assert_eq!(
            paths.quest("q1"),
            PathBuf::from("/tmp/test-data/quests/q1.json")
        );
        assert_eq!(
            paths.completion("c1"),
            PathBuf::from("/tmp/test-data/completions/c1.json")
        );
        assert_eq!(
            paths.audit_events_file("2026-01-28"),
            PathBuf::from("/tmp/test-data/audit/2026-01-28/events.jsonl")
        );
    }

    #[test]
    fn stable_id_is_deterministic() {
        let a = stable_id(&["did:privy:abc", "2026-03-01"]);
        let b = stable_id(&["did:privy:abc", "2026-03-01"]);
        let c = stable_id(&["did:privy:abc", "2026-03-02"]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.contains(':'));
    }
}
