// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Schema UID resolution for logical schema keys.

use std::str::FromStr;

use alloy::primitives::B256;

use crate::storage::{FileStorage, SchemaCache, SchemaRepository};

/// Maps a logical schema key on a network to its schema UID.
pub trait SchemaResolver: Send + Sync {
    /// `None` when no schema is registered for the key on that network.
    fn resolve(&self, schema_key: &str, network: &str) -> Option<B256>;
}

/// Resolver reading the schema registry through the LRU cache.
pub struct StoredSchemaResolver<'a> {
    storage: &'a FileStorage,
    cache: &'a SchemaCache,
}

impl<'a> StoredSchemaResolver<'a> {
    pub fn new(storage: &'a FileStorage, cache: &'a SchemaCache) -> Self {
        Self { storage, cache }
    }
}

impl SchemaResolver for StoredSchemaResolver<'_> {
    fn resolve(&self, schema_key: &str, network: &str) -> Option<B256> {
        if let Some(cached) = self.cache.get(schema_key, network) {
            return B256::from_str(&cached).ok();
        }

        let schema = match SchemaRepository::new(self.storage).find_by_key(schema_key, network) {
            Ok(found) => found?,
            Err(e) => {
                tracing::warn!(schema_key, network, error = %e, "Schema lookup failed");
                return None;
            }
        };

        let uid = B256::from_str(&schema.schema_uid).ok()?;
        self.cache.put(schema_key, network, &schema.schema_uid);
        Some(uid)
    }
}
