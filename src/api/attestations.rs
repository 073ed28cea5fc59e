// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Gasless attestation relay and attestation record queries.

use alloy::primitives::Address;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    attestation::{DelegatedAttestationSignature, GaslessAttestationResult},
    audit_log,
    auth::{Auth, AuthenticatedUser},
    error::ApiError,
    state::AppState,
    storage::{AttestationRecord, AuditEvent, AuditEventType, ProfileRepository},
};

const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 200;

/// Request to relay a delegated attestation.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GaslessAttestationRequest {
    /// Logical schema key, e.g. `quest_task_reward_claim`
    pub schema_key: String,
    /// Wallet the attestation is about; must be linked to the caller
    #[schema(value_type = String)]
    pub recipient: Address,
    pub signature: Option<DelegatedAttestationSignature>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct AttestationListQuery {
    /// Recipient address (default: the caller's first linked wallet)
    pub recipient: Option<String>,
    /// Cursor from a previous page
    pub cursor: Option<String>,
    /// Maximum number of results (default: 50)
    #[param(default = 50)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttestationListResponse {
    pub attestations: Vec<AttestationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Run the gasless pipeline and persist what it produced.
///
/// Record and audit failures are logged, never surfaced: the attestation is
/// already on-chain at that point.
pub(crate) async fn relay_attestation(
    state: &AppState,
    user: &AuthenticatedUser,
    signature: Option<&DelegatedAttestationSignature>,
    schema_key: &str,
    recipient: Address,
) -> GaslessAttestationResult {
    let resolver = state.schema_resolver();
    let result = state
        .attestor(&resolver)
        .handle(signature, schema_key, recipient)
        .await;

    if let (Some(uid), Some(tx_hash), Some(signature)) = (&result.uid, &result.tx_hash, signature) {
        let record = AttestationRecord {
            uid: uid.clone(),
            schema_uid: signature.schema_uid.to_string(),
            schema_key: schema_key.to_ascii_lowercase(),
            recipient: recipient.to_checksum(None),
            attester: signature.attester.to_checksum(None),
            tx_hash: tx_hash.clone(),
            network: state.config.network.slug.to_string(),
            created_at: Utc::now(),
        };
        if let Err(e) = state.db.insert_attestation(&record) {
            tracing::error!(uid = %uid, error = %e, "Failed to store attestation record");
        }
        audit_log!(
            state.storage(),
            AuditEventType::AttestationRelayed,
            user,
            "attestation",
            uid
        );
    } else if result.degraded {
        audit_log!(
            state.storage(),
            AuditEvent::new(AuditEventType::AttestationDegraded)
                .with_user(&user.user_id)
                .with_resource("schema_key", schema_key)
                .failed(result.error.clone().unwrap_or_default())
        );
    }

    result
}

/// Relay a client-signed attestation through the service wallet.
///
/// Fails with 422 when the pipeline rejects the signature and the degrade
/// policy does not absorb it.
#[utoipa::path(
    post,
    path = "/v1/attestations/gasless",
    tag = "Attestations",
    security(("bearer" = [])),
    request_body = GaslessAttestationRequest,
    responses(
        (status = 200, description = "Attested, skipped or degraded", body = GaslessAttestationResult),
        (status = 403, description = "Recipient is not the caller's wallet"),
        (status = 422, description = "Attestation failed"),
    )
)]
pub async fn relay_gasless(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<GaslessAttestationRequest>,
) -> Result<Json<GaslessAttestationResult>, ApiError> {
    let owner = state.db.wallet_owner(&request.recipient.to_checksum(None))?;
    if owner.as_deref() != Some(user.user_id.as_str()) {
        return Err(ApiError::forbidden(format!(
            "Wallet {} is not linked to this account",
            request.recipient
        )));
    }

    let result = relay_attestation(
        &state,
        &user,
        request.signature.as_ref(),
        &request.schema_key,
        request.recipient,
    )
    .await;

    if !result.success {
        return Err(ApiError::unprocessable(
            result
                .error
                .unwrap_or_else(|| "Attestation failed".to_string()),
        ));
    }
    Ok(Json(result))
}

/// List attestation records for a recipient, newest first.
#[utoipa::path(
    get,
    path = "/v1/attestations",
    tag = "Attestations",
    security(("bearer" = [])),
    params(AttestationListQuery),
    responses(
        (status = 200, description = "Attestation records", body = AttestationListResponse),
        (status = 400, description = "No recipient given and no wallet linked"),
        (status = 403, description = "Recipient belongs to another account"),
    )
)]
pub async fn list_attestations(
    Auth(user): Auth,
    State(state): State<AppState>,
    Query(query): Query<AttestationListQuery>,
) -> Result<Json<AttestationListResponse>, ApiError> {
    let recipient = match query.recipient {
        Some(raw) => {
            let address: Address = raw
                .parse()
                .map_err(|_| ApiError::bad_request(format!("Invalid recipient address: {raw}")))?;
            address.to_checksum(None)
        }
        None => ProfileRepository::new(state.storage())
            .get_or_default(&user.user_id)?
            .primary_wallet()
            .map(str::to_string)
            .ok_or_else(|| ApiError::bad_request("No wallet linked to this account"))?,
    };

    if !user.is_admin() {
        let owner = state.db.wallet_owner(&recipient)?;
        if owner.as_deref() != Some(user.user_id.as_str()) {
            return Err(ApiError::forbidden("Recipient belongs to another account"));
        }
    }

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let (attestations, next_cursor) =
        state
            .db
            .list_attestations_by_recipient(&recipient, query.cursor.as_deref(), limit)?;

    Ok(Json(AttestationListResponse {
        attestations,
        next_cursor,
    }))
}

/// Get one attestation record by UID.
#[utoipa::path(
    get,
    path = "/v1/attestations/{uid}",
    tag = "Attestations",
    security(("bearer" = [])),
    params(("uid" = String, Path, description = "Attestation UID")),
    responses(
        (status = 200, description = "Attestation record", body = AttestationRecord),
        (status = 404, description = "Unknown UID"),
    )
)]
pub async fn get_attestation(
    Auth(_user): Auth,
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Json<AttestationRecord>, ApiError> {
    state
        .db
        .get_attestation(&uid.to_lowercase())?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Attestation {uid} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::gasless::tests::{MockSubmitter, TX_HASH, UID};
    use crate::attestation::signature::tests::{signed_payload, RECIPIENT, SCHEMA_UID};
    use crate::blockchain::BASE_SEPOLIA;
    use crate::state::test_support::{test_state, test_state_with, user};
    use crate::storage::{AttestationSchema, SchemaRepository};
    use axum::http::StatusCode;
    use std::sync::Arc;

    const KEY: &str = "quest_task_reward_claim";

    fn enabled_state(degrade: bool) -> (AppState, tempfile::TempDir) {
        let (state, temp) = test_state_with(|c| {
            c.eas.enabled = true;
            c.eas.degrade.global = degrade;
        });
        SchemaRepository::new(state.storage())
            .create(&AttestationSchema::new(
                &SCHEMA_UID.to_string(),
                KEY,
                BASE_SEPOLIA.slug,
                "Reward claim",
                "address user,uint256 amount",
            ))
            .unwrap();
        state
            .db
            .link_wallet(&RECIPIENT.to_checksum(None), "did:privy:u1")
            .unwrap();
        (state, temp)
    }

    fn request(signature: Option<DelegatedAttestationSignature>) -> GaslessAttestationRequest {
        GaslessAttestationRequest {
            schema_key: KEY.to_string(),
            recipient: RECIPIENT,
            signature,
        }
    }

    #[tokio::test]
    async fn relay_stores_record_and_lists_it() {
        let (state, _temp) = enabled_state(false);
        let state = state.with_submitter(Arc::new(MockSubmitter::default()));
        let payload = signed_payload(RECIPIENT, BASE_SEPOLIA.chain_id, u64::MAX).1;

        let Json(result) = relay_gasless(
            Auth(user("did:privy:u1")),
            State(state.clone()),
            Json(request(Some(payload))),
        )
        .await
        .unwrap();
        assert!(result.success);
        assert_eq!(result.uid, Some(UID.to_string()));
        assert_eq!(result.tx_hash, Some(TX_HASH.to_string()));
        assert!(state.db.schema_has_attestations(&SCHEMA_UID.to_string()).unwrap());

        let Json(page) = list_attestations(
            Auth(user("did:privy:u1")),
            State(state.clone()),
            Query(AttestationListQuery {
                recipient: Some(RECIPIENT.to_string()),
                cursor: None,
                limit: None,
            }),
        )
        .await
        .unwrap();
        assert_eq!(page.attestations.len(), 1);
        assert_eq!(page.attestations[0].schema_key, KEY);

        let Json(record) = get_attestation(
            Auth(user("did:privy:u1")),
            State(state),
            Path(UID.to_string()),
        )
        .await
        .unwrap();
        assert_eq!(record.tx_hash, TX_HASH.to_string());
    }

    #[tokio::test]
    async fn missing_signature_fails_without_degrade() {
        let (state, _temp) = enabled_state(false);
        let err = relay_gasless(Auth(user("did:privy:u1")), State(state), Json(request(None)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn missing_signature_degrades_when_allowed() {
        let (state, _temp) = enabled_state(true);
        let Json(result) =
            relay_gasless(Auth(user("did:privy:u1")), State(state), Json(request(None)))
                .await
                .unwrap();
        assert!(result.success);
        assert!(result.degraded);
        assert!(result.uid.is_none());
    }

    #[tokio::test]
    async fn recipient_must_be_callers_wallet() {
        let (state, _temp) = enabled_state(false);
        let err = relay_gasless(Auth(user("did:privy:u2")), State(state), Json(request(None)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_uid_is_404() {
        let (state, _temp) = test_state();
        let err = get_attestation(
            Auth(user("did:privy:u1")),
            State(state),
            Path("0xdead".to_string()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
