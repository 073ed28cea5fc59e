// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Daily check-in.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{attestations::relay_attestation, quests::attestation_recipient};
use crate::{
    attestation::{DelegatedAttestationSignature, GaslessAttestationResult, DAILY_CHECKIN},
    audit_log,
    auth::Auth,
    error::ApiError,
    state::AppState,
    storage::{AuditEvent, AuditEventType, CheckinRecord, CheckinRepository, ProfileRepository, StorageError},
};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CheckinRequest {
    /// Delegated `daily_checkin` attestation
    pub attestation_signature: Option<DelegatedAttestationSignature>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckinResponse {
    pub checkin: CheckinRecord,
    /// Ledger balance after the XP credit
    pub balance: u64,
    pub attestation: GaslessAttestationResult,
}

/// Check in for today (UTC).
///
/// The attestation is relayed before anything is written, so a rejected
/// signature leaves no check-in behind.
#[utoipa::path(
    post,
    path = "/v1/checkins",
    tag = "Check-ins",
    security(("bearer" = [])),
    request_body = CheckinRequest,
    responses(
        (status = 201, description = "Checked in", body = CheckinResponse),
        (status = 409, description = "Already checked in today"),
        (status = 422, description = "Attestation failed"),
    )
)]
pub async fn check_in(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<CheckinRequest>,
) -> Result<(StatusCode, Json<CheckinResponse>), ApiError> {
    let today = Utc::now().date_naive();
    let repo = CheckinRepository::new(state.storage());
    if repo.has_checked_in(&user.user_id, today) {
        return Err(ApiError::conflict("Already checked in today"));
    }
    let streak = repo.next_streak(&user.user_id, today)?;

    let profile = ProfileRepository::new(state.storage()).get_or_default(&user.user_id)?;
    let recipient = attestation_recipient(&state, &profile)?;
    let attestation = relay_attestation(
        &state,
        &user,
        request.attestation_signature.as_ref(),
        DAILY_CHECKIN,
        recipient,
    )
    .await;
    if !attestation.success {
        return Err(ApiError::unprocessable(
            attestation
                .error
                .unwrap_or_else(|| "Attestation failed".to_string()),
        ));
    }

    let checkin = CheckinRecord {
        id: CheckinRecord::id_for(&user.user_id, today),
        user_id: user.user_id.clone(),
        date: today,
        streak,
        attestation_uid: attestation.uid.clone(),
        xp_awarded: state.config.daily_checkin_xp,
        created_at: Utc::now(),
    };
    repo.create(&checkin).map_err(|e| match e {
        StorageError::AlreadyExists(_) => ApiError::conflict("Already checked in today"),
        other => other.into(),
    })?;
    let balance = state.db.credit(&user.user_id, checkin.xp_awarded)?;

    audit_log!(
        state.storage(),
        AuditEvent::new(AuditEventType::CheckinRecorded)
            .with_user(&user.user_id)
            .with_resource("checkin", &checkin.id)
            .with_details(serde_json::json!({ "streak": streak, "xp": checkin.xp_awarded }))
    );

    Ok((
        StatusCode::CREATED,
        Json(CheckinResponse {
            checkin,
            balance,
            attestation,
        }),
    ))
}
