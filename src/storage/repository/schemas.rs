// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Attestation schema registry.
//!
//! One JSON file per schema under `schemas/`, named by schema UID.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStorage, StorageError, StorageResult};

fn default_category() -> String {
    "general".to_string()
}

/// A registered on-chain EAS schema.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AttestationSchema {
    /// On-chain schema UID (lowercase 0x hex)
    pub schema_uid: String,
    /// Logical key callers resolve, e.g. `daily_checkin`
    pub schema_key: String,
    /// Network slug the UID is registered on
    pub network: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Solidity-style field list, e.g. `address user,uint64 day`
    pub schema_definition: String,
    #[serde(default = "default_category")]
    pub category: String,
    pub revocable: bool,
    pub created_at: DateTime<Utc>,
}

impl AttestationSchema {
    pub fn new(
        schema_uid: &str,
        schema_key: &str,
        network: &str,
        name: &str,
        schema_definition: &str,
    ) -> Self {
        Self {
            schema_uid: schema_uid.to_lowercase(),
            schema_key: schema_key.to_lowercase(),
            network: network.to_lowercase(),
            name: name.to_string(),
            description: None,
            schema_definition: schema_definition.to_string(),
            category: default_category(),
            revocable: true,
            created_at: Utc::now(),
        }
    }
}

/// Repository for schema documents.
pub struct SchemaRepository<'a> {
    storage: &'a FileStorage,
}

impl<'a> SchemaRepository<'a> {
    pub fn new(storage: &'a FileStorage) -> Self {
        Self { storage }
    }

    pub fn exists(&self, schema_uid: &str) -> bool {
        self.storage
            .exists(self.storage.paths().schema(&schema_uid.to_lowercase()))
    }

    pub fn get(&self, schema_uid: &str) -> StorageResult<AttestationSchema> {
        let path = self.storage.paths().schema(&schema_uid.to_lowercase());
        if !self.storage.exists(&path) {
            return Err(StorageError::NotFound(format!("Schema {schema_uid}")));
        }
        self.storage.read_json(path)
    }

    /// Register a schema.
    ///
    /// `AlreadyExists` if the UID is registered, or if the key is already
    /// bound to another UID on the same network.
    pub fn create(&self, schema: &AttestationSchema) -> StorageResult<()> {
        if let Some(existing) = self.find_by_key(&schema.schema_key, &schema.network)? {
            return Err(StorageError::AlreadyExists(format!(
                "Schema key `{}` on {} is bound to {}",
                schema.schema_key, schema.network, existing.schema_uid
            )));
        }

        self.storage
            .create_json(self.storage.paths().schema(&schema.schema_uid), schema)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => {
                    StorageError::AlreadyExists(format!("Schema {}", schema.schema_uid))
                }
                other => other,
            })
    }

    pub fn delete(&self, schema_uid: &str) -> StorageResult<()> {
        if !self.exists(schema_uid) {
            return Err(StorageError::NotFound(format!("Schema {schema_uid}")));
        }
        self.storage
            .delete(self.storage.paths().schema(&schema_uid.to_lowercase()))
    }

    /// All schemas, optionally restricted to one network.
    pub fn list(&self, network: Option<&str>) -> StorageResult<Vec<AttestationSchema>> {
        let mut schemas: Vec<AttestationSchema> =
            self.storage.load_all(self.storage.paths().schemas_dir())?;
        if let Some(network) = network {
            schemas.retain(|s| s.network.eq_ignore_ascii_case(network));
        }
        schemas.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(schemas)
    }

    /// The schema bound to `schema_key` on `network`.
    pub fn find_by_key(
        &self,
        schema_key: &str,
        network: &str,
    ) -> StorageResult<Option<AttestationSchema>> {
        Ok(self
            .list(Some(network))?
            .into_iter()
            .find(|s| s.schema_key.eq_ignore_ascii_case(schema_key)))
    }
}
