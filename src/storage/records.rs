// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Rows persisted in the embedded database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An attestation the relay submitted successfully.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AttestationRecord {
    /// Attestation UID returned by EAS
    pub uid: String,
    pub schema_uid: String,
    /// Logical schema key the caller asked for
    pub schema_key: String,
    pub recipient: String,
    pub attester: String,
    /// Submission transaction hash
    pub tx_hash: String,
    pub network: String,
    pub created_at: DateTime<Utc>,
}

/// Withdrawal lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WithdrawalStatus {
    /// Balance debited, payout not yet confirmed
    Pending,
    Completed,
    /// Payout failed and the debit was refunded
    Failed,
}

/// A DG withdrawal request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct WithdrawalRecord {
    /// Keccak-256 of the signature bytes; doubles as the replay key
    pub id: String,
    pub user_id: String,
    pub wallet_address: String,
    /// Whole DG
    pub amount: u64,
    pub deadline: u64,
    pub status: WithdrawalStatus,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WithdrawalRecord {
    /// New pending withdrawal.
    pub fn pending(
        id: String,
        user_id: String,
        wallet_address: String,
        amount: u64,
        deadline: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            wallet_address,
            amount,
            deadline,
            status: WithdrawalStatus::Pending,
            tx_hash: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}
