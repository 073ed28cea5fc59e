// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Duration;

use crate::attestation::{AttestationSubmitter, GaslessAttestor, StoredSchemaResolver};
use crate::auth::{AuthError, JwksManager};
use crate::blockchain::ChainReader;
use crate::config::AppConfig;
use crate::notifications::Notifier;
use crate::security::CspReportThrottle;
use crate::storage::{DbError, FileStorage, RelayDatabase, SchemaCache, StorageError, StoragePaths};
use crate::withdrawal::{TokenPayout, WithdrawalPolicy};

const SCHEMA_CACHE_CAPACITY: usize = 256;
const SCHEMA_CACHE_TTL: Duration = Duration::from_secs(300);

/// Token verification settings.
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// `None` selects development mode (unsigned tokens accepted)
    pub jwks: Option<JwksManager>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub admin_user_ids: Vec<String>,
}

impl AuthConfig {
    pub fn from_config(config: &AppConfig) -> Result<Self, AuthError> {
        let jwks = config.jwks_url.as_deref().map(JwksManager::new).transpose()?;
        Ok(Self {
            jwks,
            issuer: Some(config.issuer.clone()),
            audience: config.app_id.clone(),
            admin_user_ids: config.admin_user_ids.clone(),
        })
    }
}

/// Errors opening the state at startup.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("database: {0}")]
    Database(#[from] DbError),

    #[error("auth: {0}")]
    Auth(#[from] AuthError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    storage: Arc<FileStorage>,
    pub db: Arc<RelayDatabase>,
    pub schema_cache: Arc<SchemaCache>,
    pub auth_config: AuthConfig,
    pub csp_throttle: Arc<CspReportThrottle>,
    /// Read access to the chain for quest verification
    pub chain: Option<Arc<dyn ChainReader>>,
    /// Service-wallet attestation submitter
    pub submitter: Option<Arc<dyn AttestationSubmitter>>,
    /// Service-wallet DG payouts; withdrawals are disabled without it
    pub payout: Option<Arc<dyn TokenPayout>>,
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl AppState {
    /// Open the file store and database under `config.data_dir`.
    ///
    /// Chain, submitter, payout and notifier start unset; attach them with
    /// the `with_*` builders.
    pub fn open(config: AppConfig) -> Result<Self, StateError> {
        let paths = StoragePaths::new(&config.data_dir);
        let mut storage = FileStorage::new(paths.clone());
        storage.initialize()?;
        let db = RelayDatabase::open(&paths.database_file())?;
        let auth_config = AuthConfig::from_config(&config)?;
        let csp_throttle = CspReportThrottle::new(config.csp_report_limit, config.csp_report_window);

        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            db: Arc::new(db),
            schema_cache: Arc::new(SchemaCache::new(SCHEMA_CACHE_CAPACITY, SCHEMA_CACHE_TTL)),
            auth_config,
            csp_throttle: Arc::new(csp_throttle),
            chain: None,
            submitter: None,
            payout: None,
            notifier: None,
        })
    }

    pub fn with_chain(mut self, chain: Arc<dyn ChainReader>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_submitter(mut self, submitter: Arc<dyn AttestationSubmitter>) -> Self {
        self.submitter = Some(submitter);
        self
    }

    pub fn with_payout(mut self, payout: Arc<dyn TokenPayout>) -> Self {
        self.payout = Some(payout);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_auth_config(mut self, auth_config: AuthConfig) -> Self {
        self.auth_config = auth_config;
        self
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Schema resolver reading through the shared cache.
    pub fn schema_resolver(&self) -> StoredSchemaResolver<'_> {
        StoredSchemaResolver::new(&self.storage, &self.schema_cache)
    }

    /// Attestor bound to the configured network and submitter.
    pub fn attestor<'a>(&'a self, resolver: &'a StoredSchemaResolver<'a>) -> GaslessAttestor<'a> {
        GaslessAttestor::new(
            &self.config.eas,
            &self.config.network,
            resolver,
            self.submitter.as_deref(),
        )
    }

    /// Withdrawal rules, or `None` when no DG token is configured.
    pub fn withdrawal_policy(&self) -> Option<WithdrawalPolicy> {
        self.config.dg_token_address.map(|dg_token| WithdrawalPolicy {
            chain_id: self.config.network.chain_id,
            dg_token,
            min_amount: self.config.withdrawal_min_amount,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::auth::{AuthenticatedUser, Role};
    use tempfile::TempDir;

    pub const ADMIN_ID: &str = "did:privy:admin";

    /// State over a fresh temp directory: development auth with one admin,
    /// EAS disabled, no chain access.
    pub fn test_state() -> (AppState, TempDir) {
        let temp = TempDir::new().unwrap();
        let mut config = AppConfig::local(temp.path());
        config.admin_user_ids = vec![ADMIN_ID.to_string()];
        let state = AppState::open(config).unwrap();
        (state, temp)
    }

    pub fn user(user_id: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: user_id.to_string(),
            role: Role::resolve(user_id, &[ADMIN_ID.to_string()]),
            session_id: None,
            issuer: "privy.io".to_string(),
            expires_at: i64::MAX,
        }
    }

    /// Same as [`test_state`] with the config adjusted first.
    pub fn test_state_with(adjust: impl FnOnce(&mut AppConfig)) -> (AppState, TempDir) {
        let temp = TempDir::new().unwrap();
        let mut config = AppConfig::local(temp.path());
        config.admin_user_ids = vec![ADMIN_ID.to_string()];
        adjust(&mut config);
        let state = AppState::open(config).unwrap();
        (state, temp)
    }
}
