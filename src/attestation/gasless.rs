// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Gasless attestation handling.
//!
//! Pipeline: recipient check → schema resolution → delegated submission →
//! result normalization. Failures that only reflect a missing or unavailable
//! attestation follow the graceful-degradation policy of the schema key;
//! failures that prove the signature can never be valid always fail.

use alloy::primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::resolver::SchemaResolver;
use super::signature::{eas_domain, DelegatedAttestationSignature};
use crate::blockchain::NetworkConfig;
use crate::config::EasConfig;

/// Outcome of a gasless attestation attempt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct GaslessAttestationResult {
    pub success: bool,
    /// Attestation UID, set when an attestation was created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// A failure was absorbed by the degradation policy
    #[serde(default)]
    pub degraded: bool,
}

impl GaslessAttestationResult {
    /// Attestation disabled: nothing to do.
    pub fn skipped() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn attested(uid: B256, tx_hash: B256) -> Self {
        Self {
            success: true,
            uid: Some(uid.to_string()),
            tx_hash: Some(tx_hash.to_string()),
            ..Default::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// The action may proceed without an attestation.
    pub fn degraded(error: impl Into<String>) -> Self {
        Self {
            success: true,
            error: Some(error.into()),
            degraded: true,
            ..Default::default()
        }
    }
}

/// A mined delegated attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submission {
    pub uid: B256,
    pub tx_hash: B256,
}

/// Errors from submitting a delegated attestation.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("attestation submission failed: {0}")]
    Rejected(String),

    #[error("attestation transaction {0} reverted")]
    Reverted(B256),

    #[error("attestation transaction {0} emitted no Attested event")]
    MissingUid(B256),
}

/// Submits `attestByDelegation` on behalf of the attester.
///
/// Implemented by the service-wallet EAS client; tests substitute a double.
#[async_trait::async_trait]
pub trait AttestationSubmitter: Send + Sync {
    async fn submit(
        &self,
        signature: &DelegatedAttestationSignature,
    ) -> Result<Submission, SubmissionError>;
}

/// Validates delegated signatures and relays them through a submitter.
pub struct GaslessAttestor<'a> {
    config: &'a EasConfig,
    network: &'a NetworkConfig,
    resolver: &'a dyn SchemaResolver,
    submitter: Option<&'a dyn AttestationSubmitter>,
}

impl<'a> GaslessAttestor<'a> {
    pub fn new(
        config: &'a EasConfig,
        network: &'a NetworkConfig,
        resolver: &'a dyn SchemaResolver,
        submitter: Option<&'a dyn AttestationSubmitter>,
    ) -> Self {
        Self {
            config,
            network,
            resolver,
            submitter,
        }
    }

    /// Handle one attestation for `schema_key`, expected to name
    /// `expected_recipient` as recipient.
    pub async fn handle(
        &self,
        signature: Option<&DelegatedAttestationSignature>,
        schema_key: &str,
        expected_recipient: Address,
    ) -> GaslessAttestationResult {
        if !self.config.enabled {
            tracing::debug!(schema_key, "EAS disabled, skipping attestation");
            return GaslessAttestationResult::skipped();
        }

        let Some(signature) = signature else {
            return self.degrade_or_fail(schema_key, "Attestation signature is required");
        };

        // Address equality is byte equality, so hex case never matters here.
        if signature.recipient != expected_recipient {
            return GaslessAttestationResult::failed(format!(
                "Signature recipient {} does not match expected recipient {}",
                signature.recipient, expected_recipient
            ));
        }

        if let Err(reason) = self.check_doomed(signature) {
            return GaslessAttestationResult::failed(reason);
        }

        let Some(schema_uid) = self.resolver.resolve(schema_key, self.network.slug) else {
            return self.degrade_or_fail(
                schema_key,
                &format!(
                    "No schema configured for `{schema_key}` on {}",
                    self.network.slug
                ),
            );
        };

        if signature.schema_uid != schema_uid {
            return GaslessAttestationResult::failed(format!(
                "Signature schema {} does not match schema {} for `{schema_key}`",
                signature.schema_uid, schema_uid
            ));
        }

        if self.config.preverify_signatures {
            if let Err(reason) = self.preverify(signature) {
                return GaslessAttestationResult::failed(reason);
            }
        }

        let Some(submitter) = self.submitter else {
            return self.degrade_or_fail(schema_key, "Attestation service wallet is not configured");
        };

        match submitter.submit(signature).await {
            Ok(submission) => {
                tracing::info!(
                    schema_key,
                    uid = %submission.uid,
                    tx_hash = %submission.tx_hash,
                    "Attestation submitted"
                );
                GaslessAttestationResult::attested(submission.uid, submission.tx_hash)
            }
            Err(e) => {
                tracing::warn!(schema_key, error = %e, "Attestation submission failed");
                self.degrade_or_fail(schema_key, &e.to_string())
            }
        }
    }

    /// Checks whose failure means EAS would reject the signature anyway.
    fn check_doomed(&self, signature: &DelegatedAttestationSignature) -> Result<(), String> {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        if signature.is_expired(now) {
            return Err("Attestation signature deadline has passed".to_string());
        }
        if signature.chain_id != self.network.chain_id {
            return Err(format!(
                "Signature chain id {} does not match network chain id {}",
                signature.chain_id, self.network.chain_id
            ));
        }
        crate::blockchain::ensure_network(signature.network.as_deref(), self.network)
    }

    fn preverify(&self, signature: &DelegatedAttestationSignature) -> Result<(), String> {
        let domain = eas_domain(
            &self.config.domain_version,
            self.network.chain_id,
            self.config.contract_address,
        );
        let recovered = signature.recover_attester(&domain)?;
        if recovered != signature.attester {
            return Err(format!(
                "Signature was produced by {recovered}, not attester {}",
                signature.attester
            ));
        }
        Ok(())
    }

    fn degrade_or_fail(&self, schema_key: &str, error: &str) -> GaslessAttestationResult {
        if self.config.degrade.allows(schema_key) {
            tracing::warn!(schema_key, error, "Attestation degraded");
            GaslessAttestationResult::degraded(error)
        } else {
            GaslessAttestationResult::failed(error)
        }
    }
}
