// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! EIP-712 DG withdrawals.
//!
//! The client signs `Withdrawal(address user,uint256 amount,uint256 deadline)`
//! under the "P2E Inferno DG Pullout" domain bound to the DG token. The
//! server recovers the signer, debits the ledger and persists the request
//! atomically, then pays out. A failed payout refunds the debit. Each
//! `(user, amount, deadline)` authorization pays out at most once.

use std::borrow::Cow;

use alloy::primitives::{Address, Bytes, Signature, B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::blockchain::ChainError;
use crate::storage::{DbError, RelayDatabase, WithdrawalRecord};

sol! {
    /// Typed data signed by the withdrawing wallet.
    #[derive(Debug)]
    struct Withdrawal {
        address user;
        uint256 amount;
        uint256 deadline;
    }
}

pub const WITHDRAWAL_DOMAIN_NAME: &str = "P2E Inferno DG Pullout";
pub const WITHDRAWAL_DOMAIN_VERSION: &str = "1";

/// Domain bound to the DG token on `chain_id`.
pub fn withdrawal_domain(chain_id: u64, dg_token: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(WITHDRAWAL_DOMAIN_NAME)),
        Some(Cow::Borrowed(WITHDRAWAL_DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        Some(dg_token),
        None,
    )
}

/// Signed withdrawal submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WithdrawalRequest {
    /// Wallet receiving the DG; must be the signer
    #[schema(value_type = String)]
    pub user: Address,
    /// Whole DG
    pub amount: u64,
    /// Unix seconds
    pub deadline: u64,
    /// 65-byte `r || s || v` signature
    #[schema(value_type = String)]
    pub signature: Bytes,
}

impl WithdrawalRequest {
    pub fn typed_data(&self) -> Withdrawal {
        Withdrawal {
            user: self.user,
            amount: U256::from(self.amount),
            deadline: U256::from(self.deadline),
        }
    }

    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        self.typed_data().eip712_signing_hash(domain)
    }

    pub fn recover_signer(&self, domain: &Eip712Domain) -> Result<Address, WithdrawalError> {
        let signature = Signature::from_raw(&self.signature)
            .map_err(|e| WithdrawalError::InvalidSignature(e.to_string()))?;
        signature
            .recover_address_from_prehash(&self.signing_hash(domain))
            .map_err(|e| WithdrawalError::InvalidSignature(e.to_string()))
    }
}

/// Fixed parameters every withdrawal is checked against.
#[derive(Debug, Clone)]
pub struct WithdrawalPolicy {
    pub chain_id: u64,
    pub dg_token: Address,
    /// Minimum whole DG per withdrawal
    pub min_amount: u64,
}

impl WithdrawalPolicy {
    pub fn domain(&self) -> Eip712Domain {
        withdrawal_domain(self.chain_id, self.dg_token)
    }

    /// Replay key: the EIP-712 digest of the request.
    ///
    /// The signature bytes are malleable (`v` as 0/1 or 27/28, high or low
    /// `s`) while the digest is fixed by `(user, amount, deadline)`.
    pub fn withdrawal_id(&self, request: &WithdrawalRequest) -> String {
        request.signing_hash(&self.domain()).to_string()
    }

    /// Stateless checks: amount, deadline, signer.
    pub fn verify(&self, request: &WithdrawalRequest, now: u64) -> Result<(), WithdrawalError> {
        if request.amount < self.min_amount {
            return Err(WithdrawalError::BelowMinimum {
                minimum: self.min_amount,
                requested: request.amount,
            });
        }
        if request.deadline < now {
            return Err(WithdrawalError::Expired);
        }
        let recovered = request.recover_signer(&self.domain())?;
        if recovered != request.user {
            return Err(WithdrawalError::SignerMismatch {
                expected: request.user,
                recovered,
            });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WithdrawalError {
    #[error("Withdrawals are not enabled")]
    Disabled,

    #[error("Withdrawal signature deadline has passed")]
    Expired,

    #[error("Invalid withdrawal signature: {0}")]
    InvalidSignature(String),

    #[error("Signature was produced by {recovered}, not {expected}")]
    SignerMismatch { expected: Address, recovered: Address },

    #[error("Minimum withdrawal is {minimum} DG, requested {requested}")]
    BelowMinimum { minimum: u64, requested: u64 },

    #[error("Wallet {0} is not linked to this account")]
    WalletNotLinked(Address),

    #[error("Withdrawal signature has already been used")]
    Replayed,

    #[error("Insufficient balance: {available} DG available, {requested} requested")]
    InsufficientBalance { available: u64, requested: u64 },

    #[error("DG payout failed: {0}")]
    Payout(String),

    #[error(transparent)]
    Database(DbError),
}

impl From<DbError> for WithdrawalError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Conflict(_) => WithdrawalError::Replayed,
            DbError::InsufficientBalance {
                available,
                requested,
            } => WithdrawalError::InsufficientBalance {
                available,
                requested,
            },
            other => WithdrawalError::Database(other),
        }
    }
}

/// Sends DG from the service wallet.
///
/// Implemented by [`DgPayout`](crate::blockchain::DgPayout); tests substitute
/// a double.
#[async_trait::async_trait]
pub trait TokenPayout: Send + Sync {
    /// Transfer `amount` whole DG to `to`; returns the confirmed tx hash.
    async fn transfer(&self, to: Address, amount: u64) -> Result<B256, ChainError>;
}

/// Debit, persist and pay out a verified withdrawal.
///
/// The request must already have passed [`WithdrawalPolicy::verify`].
pub async fn execute(
    db: &RelayDatabase,
    payout: &dyn TokenPayout,
    policy: &WithdrawalPolicy,
    user_id: &str,
    request: &WithdrawalRequest,
) -> Result<WithdrawalRecord, WithdrawalError> {
    let wallet = request.user.to_checksum(None);
    if db.wallet_owner(&wallet)?.as_deref() != Some(user_id) {
        return Err(WithdrawalError::WalletNotLinked(request.user));
    }

    let record = WithdrawalRecord::pending(
        policy.withdrawal_id(request),
        user_id.to_string(),
        wallet,
        request.amount,
        request.deadline,
    );
    let remaining = db.begin_withdrawal(&record)?;
    tracing::info!(
        withdrawal_id = %record.id,
        user_id,
        amount = request.amount,
        remaining,
        "Withdrawal debited"
    );

    match payout.transfer(request.user, request.amount).await {
        Ok(tx_hash) => Ok(db.complete_withdrawal(&record.id, &tx_hash.to_string())?),
        Err(e) => {
            tracing::error!(withdrawal_id = %record.id, error = %e, "DG payout failed, refunding");
            db.fail_withdrawal(&record.id, &e.to_string())
                .map_err(WithdrawalError::Database)?;
            Err(WithdrawalError::Payout(e.to_string()))
        }
    }
}
