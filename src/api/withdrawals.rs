// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! DG withdrawals.
//!
//! The user's wallet signs an EIP-712 `Withdrawal(user, amount, deadline)`
//! authorization; the service debits the ledger and pays out from the
//! service wallet.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::Auth,
    error::ApiError,
    state::AppState,
    storage::{AuditEvent, AuditEventType, WithdrawalRecord},
    withdrawal::{self, WithdrawalError, WithdrawalRequest},
};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize, IntoParams)]
pub struct WithdrawalListQuery {
    /// Cursor from a previous page
    pub cursor: Option<String>,
    /// Maximum number of results (default: 20)
    #[param(default = 20)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WithdrawalListResponse {
    pub withdrawals: Vec<WithdrawalRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Withdraw DG to a linked wallet.
#[utoipa::path(
    post,
    path = "/v1/withdrawals",
    tag = "Withdrawals",
    security(("bearer" = [])),
    request_body = WithdrawalRequest,
    responses(
        (status = 201, description = "DG paid out", body = WithdrawalRecord),
        (status = 400, description = "Expired, malformed or below minimum"),
        (status = 403, description = "Signer or wallet does not belong to the caller"),
        (status = 409, description = "Signature already used"),
        (status = 422, description = "Insufficient balance"),
        (status = 500, description = "Payout failed, balance refunded"),
        (status = 503, description = "Withdrawals are not enabled"),
    )
)]
pub async fn create_withdrawal(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<WithdrawalRequest>,
) -> Result<(StatusCode, Json<WithdrawalRecord>), ApiError> {
    let (Some(policy), Some(payout)) = (state.withdrawal_policy(), state.payout.as_deref()) else {
        return Err(WithdrawalError::Disabled.into());
    };

    let now = Utc::now().timestamp().max(0) as u64;
    policy.verify(&request, now)?;

    match withdrawal::execute(&state.db, payout, &policy, &user.user_id, &request).await {
        Ok(record) => {
            audit_log!(
                state.storage(),
                AuditEvent::new(AuditEventType::WithdrawalCompleted)
                    .with_user(&user.user_id)
                    .with_resource("withdrawal", &record.id)
                    .with_details(serde_json::json!({
                        "amount": record.amount,
                        "tx_hash": record.tx_hash,
                    }))
            );
            Ok((StatusCode::CREATED, Json(record)))
        }
        Err(e) => {
            if matches!(e, WithdrawalError::Payout(_)) {
                audit_log!(
                    state.storage(),
                    AuditEvent::new(AuditEventType::WithdrawalFailed)
                        .with_user(&user.user_id)
                        .with_resource("withdrawal", policy.withdrawal_id(&request))
                        .failed(e.to_string())
                );
            }
            Err(e.into())
        }
    }
}

/// The caller's withdrawals, newest first.
#[utoipa::path(
    get,
    path = "/v1/withdrawals",
    tag = "Withdrawals",
    security(("bearer" = [])),
    params(WithdrawalListQuery),
    responses(
        (status = 200, description = "Withdrawals", body = WithdrawalListResponse),
    )
)]
pub async fn list_withdrawals(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(query): Query<WithdrawalListQuery>,
) -> Result<Json<WithdrawalListResponse>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let (withdrawals, next_cursor) =
        state
            .db
            .list_withdrawals(&user.user_id, query.cursor.as_deref(), limit)?;
    Ok(Json(WithdrawalListResponse {
        withdrawals,
        next_cursor,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::users::tests::WALLET_KEY;
    use crate::blockchain::ChainError;
    use crate::state::test_support::{test_state, test_state_with, user};
    use crate::storage::WithdrawalStatus;
    use crate::withdrawal::TokenPayout;
    use alloy::primitives::{address, Address, Bytes, B256};
    use alloy::signers::{local::PrivateKeySigner, SignerSync};
    use std::sync::Arc;

    const U1: &str = "did:privy:u1";
    const DG_TOKEN: Address = address!("0000000000000000000000000000000000000d60");

    struct FixedPayout {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl TokenPayout for FixedPayout {
        async fn transfer(&self, _to: Address, _amount: u64) -> Result<B256, ChainError> {
            if self.fail {
                Err(ChainError::TransactionFailed("reverted".to_string()))
            } else {
                Ok(B256::repeat_byte(0x77))
            }
        }
    }

    fn enabled_state(fail: bool) -> (AppState, tempfile::TempDir) {
        let (state, temp) = test_state_with(|c| c.dg_token_address = Some(DG_TOKEN));
        let state = state.with_payout(Arc::new(FixedPayout { fail }));
        let signer: PrivateKeySigner = WALLET_KEY.parse().unwrap();
        state
            .db
            .link_wallet(&signer.address().to_checksum(None), U1)
            .unwrap();
        (state, temp)
    }

    fn signed(state: &AppState, amount: u64) -> WithdrawalRequest {
        let signer: PrivateKeySigner = WALLET_KEY.parse().unwrap();
        let policy = state.withdrawal_policy().unwrap();
        let mut request = WithdrawalRequest {
            user: signer.address(),
            amount,
            deadline: Utc::now().timestamp() as u64 + 3600,
            signature: Bytes::new(),
        };
        let sig = signer
            .sign_hash_sync(&request.signing_hash(&policy.domain()))
            .unwrap();
        request.signature = Bytes::from(sig.as_bytes().to_vec());
        request
    }

    #[tokio::test]
    async fn disabled_without_token_or_payout() {
        let (state, _temp) = test_state();
        let request = WithdrawalRequest {
            user: Address::ZERO,
            amount: 5000,
            deadline: 0,
            signature: Bytes::new(),
        };
        let err = create_withdrawal(Auth(user(U1)), State(state), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn withdrawal_pays_out_and_lists() {
        let (state, _temp) = enabled_state(false);
        state.db.credit(U1, 5000).unwrap();
        let request = signed(&state, 3000);

        let (status, Json(record)) =
            create_withdrawal(Auth(user(U1)), State(state.clone()), Json(request.clone()))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record.status, WithdrawalStatus::Completed);
        assert_eq!(state.db.balance(U1).unwrap(), 2000);

        let replay = create_withdrawal(Auth(user(U1)), State(state.clone()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(replay.status, StatusCode::CONFLICT);

        let Json(page) = list_withdrawals(
            Auth(user(U1)),
            State(state),
            Query(WithdrawalListQuery {
                cursor: None,
                limit: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(page.withdrawals.len(), 1);
    }

    #[tokio::test]
    async fn below_minimum_and_insufficient_balance() {
        let (state, _temp) = enabled_state(false);
        let small = create_withdrawal(Auth(user(U1)), State(state.clone()), Json(signed(&state, 10)))
            .await
            .unwrap_err();
        assert_eq!(small.status, StatusCode::BAD_REQUEST);

        let broke = create_withdrawal(Auth(user(U1)), State(state.clone()), Json(signed(&state, 3000)))
            .await
            .unwrap_err();
        assert_eq!(broke.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn wallet_of_another_account_is_forbidden() {
        let (state, _temp) = enabled_state(false);
        state.db.credit("did:privy:u2", 5000).unwrap();
        let err = create_withdrawal(
            Auth(user("did:privy:u2")),
            State(state.clone()),
            Json(signed(&state, 3000)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn failed_payout_refunds() {
        let (state, _temp) = enabled_state(true);
        state.db.credit(U1, 3000).unwrap();
        let err = create_withdrawal(Auth(user(U1)), State(state.clone()), Json(signed(&state, 3000)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(state.db.balance(U1).unwrap(), 3000);
    }
}
