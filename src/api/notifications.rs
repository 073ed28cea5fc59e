// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    audit_log,
    auth::AdminOnly,
    error::ApiError,
    notifications::{broadcast, BroadcastSummary, BROADCAST_BATCH_DELAY, BROADCAST_BATCH_SIZE},
    state::AppState,
    storage::{AuditEvent, AuditEventType, ProfileRepository},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BroadcastRequest {
    /// Message text (Telegram HTML)
    pub message: String,
}

/// Send a message to every subscribed Telegram chat.
#[utoipa::path(
    post,
    path = "/v1/admin/notifications/broadcast",
    tag = "Admin",
    security(("bearer" = [])),
    request_body = BroadcastRequest,
    responses(
        (status = 200, description = "Broadcast finished", body = BroadcastSummary),
        (status = 400, description = "Empty message"),
        (status = 503, description = "Telegram is not configured"),
    )
)]
pub async fn broadcast_message(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<BroadcastRequest>,
) -> Result<Json<BroadcastSummary>, ApiError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }
    let notifier = state
        .notifier
        .as_deref()
        .ok_or_else(|| ApiError::service_unavailable("Telegram is not configured"))?;

    let chat_ids = ProfileRepository::new(state.storage()).list_telegram_chat_ids()?;
    let summary = broadcast(
        notifier,
        &chat_ids,
        message,
        BROADCAST_BATCH_SIZE,
        BROADCAST_BATCH_DELAY,
    )
    .await;

    tracing::info!(
        total = summary.total,
        sent = summary.sent,
        failed = summary.failed,
        "Broadcast finished"
    );
    audit_log!(
        state.storage(),
        AuditEvent::new(AuditEventType::BroadcastSent)
            .with_user(&admin.user_id)
            .with_details(serde_json::json!(summary))
    );

    Ok(Json(summary))
}
