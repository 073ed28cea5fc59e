// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Privy verification key cache.
//!
//! Privy signs access tokens with ES256 and publishes the public keys as a
//! JWK set at `https://auth.privy.io/api/v1/apps/<app-id>/jwks.json`. Keys
//! are parsed once per fetch and kept for `ttl`. When a refresh fails the
//! previous keys stay in use, so a Privy outage does not log everyone out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, JwkSet};
use jsonwebtoken::DecodingKey;
use tokio::sync::RwLock;

use super::error::AuthError;

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Keys from one fetch, by `kid`. Keys without a `kid` are stored under "".
struct KeySet {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Instant,
}

/// Fetches and caches Privy's ES256 verification keys.
#[derive(Clone)]
pub struct JwksManager {
    jwks_url: String,
    cache_ttl: Duration,
    cache: Arc<RwLock<Option<KeySet>>>,
    client: reqwest::Client,
}

impl JwksManager {
    pub fn new(jwks_url: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            client,
        })
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Key for a token header's `kid`; any key when the header has none.
    pub async fn decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, AuthError> {
        if !self.is_cached().await {
            if let Err(e) = self.refresh().await {
                if self.cache.read().await.is_none() {
                    return Err(e);
                }
                tracing::warn!(error = %e, "Privy JWKS refresh failed, using stale keys");
            }
        }

        let cache = self.cache.read().await;
        let set = cache.as_ref().ok_or(AuthError::NoMatchingKey)?;
        let key = match kid {
            Some(kid) => set.keys.get(kid),
            None => set.keys.values().next(),
        };
        key.cloned().ok_or(AuthError::NoMatchingKey)
    }

    /// Fetch the key set now, replacing the cache.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        let jwks = self.fetch().await?;
        let keys = parse_keys(&jwks);
        if keys.is_empty() {
            return Err(AuthError::JwksUnavailable(
                "JWKS contains no usable P-256 keys".to_string(),
            ));
        }
        tracing::debug!(keys = keys.len(), "Privy JWKS refreshed");
        *self.cache.write().await = Some(KeySet {
            keys,
            fetched_at: Instant::now(),
        });
        Ok(())
    }

    /// Keys are cached and younger than the TTL.
    pub async fn is_cached(&self) -> bool {
        self.cache
            .read()
            .await
            .as_ref()
            .is_some_and(|set| set.fetched_at.elapsed() < self.cache_ttl)
    }

    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksUnavailable(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::JwksUnavailable(e.to_string()))
    }
}

/// P-256 keys of `jwks`; other key types are skipped.
fn parse_keys(jwks: &JwkSet) -> HashMap<String, DecodingKey> {
    jwks.keys
        .iter()
        .filter_map(|jwk| match &jwk.algorithm {
            AlgorithmParameters::EllipticCurve(ec) if ec.curve == EllipticCurve::P256 => {
                let key = DecodingKey::from_ec_components(&ec.x, &ec.y).ok()?;
                Some((jwk.common.key_id.clone().unwrap_or_default(), key))
            }
            _ => None,
        })
        .collect()
}
