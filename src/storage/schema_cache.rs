// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! LRU cache for schema UID resolution.
//!
//! Every relayed attestation resolves `(schema_key, network)` to a schema UID.
//! The answer only changes when an admin creates or deletes a schema, so it
//! is cached with a TTL and invalidated by the admin handlers.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

struct CacheEntry {
    schema_uid: String,
    inserted_at: Instant,
}

/// In-process LRU cache of resolved schema UIDs.
pub struct SchemaCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

fn cache_key(schema_key: &str, network: &str) -> String {
    format!("{}|{}", network.to_lowercase(), schema_key.to_lowercase())
}

impl SchemaCache {
    /// Create a cache holding at most `capacity` keys for `ttl` each.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Cached UID for a key on a network, `None` if absent or expired.
    pub fn get(&self, schema_key: &str, network: &str) -> Option<String> {
        let key = cache_key(schema_key, network);
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(&key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.schema_uid.clone());
            }
            cache.pop(&key);
        }
        None
    }

    pub fn put(&self, schema_key: &str, network: &str, schema_uid: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                cache_key(schema_key, network),
                CacheEntry {
                    schema_uid: schema_uid.to_string(),
                    inserted_at: Instant::now(),
                },
            );
        }
    }

    /// Drop the entry for a key on a network.
    pub fn invalidate(&self, schema_key: &str, network: &str) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.pop(&cache_key(schema_key, network));
        }
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(256, Duration::from_secs(300))
    }
}
