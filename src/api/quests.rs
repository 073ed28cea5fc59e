// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Quest endpoints.
//!
//! - Public: list and read quests
//! - User: complete a task (runs its verification strategy) and claim the
//!   reward of a verified completion
//! - Admin: create quests, review submissions

use std::collections::HashSet;

use alloy::primitives::Address;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::attestations::relay_attestation;
use crate::{
    attestation::{DelegatedAttestationSignature, GaslessAttestationResult, QUEST_TASK_REWARD_CLAIM},
    audit_log,
    auth::{AdminOnly, Auth},
    error::ApiError,
    quests::{verify_task, TaskConfig, TaskSubmission, TaskType, VerificationCode, VerificationContext, VerificationResult},
    state::AppState,
    storage::{
        AuditEvent, AuditEventType, CheckinRepository, CompletionRepository, CompletionStatus,
        ProfileRepository, Quest, QuestRepository, QuestTask, StorageError, TaskCompletion,
        UserProfile,
    },
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct QuestListResponse {
    pub quests: Vec<Quest>,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    /// Stable task id (default: generated)
    pub id: Option<String>,
    pub title: String,
    pub task_type: TaskType,
    #[serde(default)]
    pub config: TaskConfig,
    pub reward_amount: u64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateQuestRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub tasks: Vec<CreateTaskRequest>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteTaskResponse {
    pub completion: TaskCompletion,
    pub verification: VerificationResult,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ClaimRewardRequest {
    /// Delegated `quest_task_reward_claim` attestation
    pub attestation_signature: Option<DelegatedAttestationSignature>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClaimRewardResponse {
    pub completion: TaskCompletion,
    pub reward_amount: u64,
    /// Ledger balance after the credit
    pub balance: u64,
    pub attestation: GaslessAttestationResult,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub approve: bool,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingReviewResponse {
    pub completions: Vec<TaskCompletion>,
    pub total: usize,
}

// ============================================================================
// Helpers
// ============================================================================

fn primary_wallet(profile: &UserProfile) -> Option<Address> {
    profile.primary_wallet().and_then(|w| w.parse().ok())
}

/// Recipient for an attestation about `profile`'s user.
///
/// With EAS disabled the attestor never looks at it.
pub(crate) fn attestation_recipient(
    state: &AppState,
    profile: &UserProfile,
) -> Result<Address, ApiError> {
    match primary_wallet(profile) {
        Some(wallet) => Ok(wallet),
        None if !state.config.eas.enabled => Ok(Address::ZERO),
        None => Err(ApiError::bad_request(
            "Link a wallet before requesting an attestation",
        )),
    }
}

fn verification_error(result: &VerificationResult) -> ApiError {
    let message = format!(
        "{}: {}",
        serde_json::to_value(result.code)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
        result.message.as_deref().unwrap_or("verification failed")
    );
    match result.code {
        VerificationCode::ChainUnavailable | VerificationCode::ChainError => {
            ApiError::service_unavailable(message)
        }
        VerificationCode::TaskMisconfigured => ApiError::internal(message),
        _ => ApiError::unprocessable(message),
    }
}

fn load_task(state: &AppState, quest_id: &str, task_id: &str) -> Result<(Quest, QuestTask), ApiError> {
    let quest = QuestRepository::new(state.storage()).get(quest_id)?;
    let task = quest
        .task(task_id)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("Task {task_id} not found in quest {quest_id}")))?;
    Ok((quest, task))
}

// ============================================================================
// Public
// ============================================================================

/// List active quests.
#[utoipa::path(
    get,
    path = "/v1/quests",
    tag = "Quests",
    responses(
        (status = 200, description = "Active quests", body = QuestListResponse),
    )
)]
pub async fn list_quests(State(state): State<AppState>) -> Result<Json<QuestListResponse>, ApiError> {
    let quests = QuestRepository::new(state.storage()).list(false)?;
    Ok(Json(QuestListResponse {
        total: quests.len(),
        quests,
    }))
}

/// Get one quest with its tasks.
#[utoipa::path(
    get,
    path = "/v1/quests/{quest_id}",
    tag = "Quests",
    params(("quest_id" = String, Path, description = "Quest ID")),
    responses(
        (status = 200, description = "Quest", body = Quest),
        (status = 404, description = "Unknown quest"),
    )
)]
pub async fn get_quest(
    State(state): State<AppState>,
    Path(quest_id): Path<String>,
) -> Result<Json<Quest>, ApiError> {
    Ok(Json(QuestRepository::new(state.storage()).get(&quest_id)?))
}

// ============================================================================
// User
// ============================================================================

/// Complete a task.
///
/// Runs the task type's verification strategy. Submission tasks are stored
/// as pending review; everything else is verified immediately. A transaction
/// hash can prove one completion only.
#[utoipa::path(
    post,
    path = "/v1/quests/{quest_id}/tasks/{task_id}/complete",
    tag = "Quests",
    security(("bearer" = [])),
    params(
        ("quest_id" = String, Path, description = "Quest ID"),
        ("task_id" = String, Path, description = "Task ID")
    ),
    request_body = TaskSubmission,
    responses(
        (status = 201, description = "Completion recorded", body = CompleteTaskResponse),
        (status = 400, description = "Quest inactive"),
        (status = 404, description = "Unknown quest or task"),
        (status = 409, description = "Task already completed or tx hash already used"),
        (status = 422, description = "Verification failed"),
        (status = 503, description = "Chain unavailable"),
    )
)]
pub async fn complete_task(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((quest_id, task_id)): Path<(String, String)>,
    Json(submission): Json<TaskSubmission>,
) -> Result<(StatusCode, Json<CompleteTaskResponse>), ApiError> {
    let (quest, task) = load_task(&state, &quest_id, &task_id)?;
    if !quest.active {
        return Err(ApiError::bad_request(format!("Quest {quest_id} is not active")));
    }

    let completions = CompletionRepository::new(state.storage());
    match completions.find(&user.user_id, &quest_id, &task_id) {
        Ok(_) => return Err(ApiError::conflict("Task already completed")),
        Err(StorageError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let profile = ProfileRepository::new(state.storage()).get_or_default(&user.user_id)?;
    let today = Utc::now().date_naive();
    let ctx = VerificationContext {
        user_wallet: primary_wallet(&profile),
        checked_in_today: CheckinRepository::new(state.storage()).has_checked_in(&user.user_id, today),
        chain: state.chain.as_deref(),
    };

    let verification = verify_task(task.task_type, &task.config, &submission, &ctx).await;
    if !verification.success {
        tracing::info!(
            user_id = %user.user_id,
            quest_id,
            task_id,
            code = ?verification.code,
            "Task verification failed"
        );
        return Err(verification_error(&verification));
    }

    let status = if verification.code == VerificationCode::PendingReview {
        CompletionStatus::PendingReview
    } else {
        CompletionStatus::Verified
    };
    let mut completion = TaskCompletion::new(
        &user.user_id,
        &quest_id,
        &task_id,
        task.task_type,
        status,
        submission,
    );
    completion.tx_hash = verification.tx_hash.clone();

    if let Some(tx_hash) = &completion.tx_hash {
        state.db.claim_tx_hash(tx_hash, &completion.id)?;
    }
    completions.create(&completion).map_err(|e| match e {
        StorageError::AlreadyExists(_) => ApiError::conflict("Task already completed"),
        other => other.into(),
    })?;

    audit_log!(
        state.storage(),
        AuditEventType::TaskCompleted,
        &user,
        "completion",
        &completion.id
    );

    Ok((
        StatusCode::CREATED,
        Json(CompleteTaskResponse {
            completion,
            verification,
        }),
    ))
}

/// Claim the reward of a verified completion.
///
/// Reserves the reward, relays the `quest_task_reward_claim` attestation,
/// then credits the task reward to the ledger. A failed (non-degraded)
/// attestation releases the reservation and blocks the claim.
#[utoipa::path(
    post,
    path = "/v1/quests/{quest_id}/tasks/{task_id}/claim",
    tag = "Quests",
    security(("bearer" = [])),
    params(
        ("quest_id" = String, Path, description = "Quest ID"),
        ("task_id" = String, Path, description = "Task ID")
    ),
    request_body = ClaimRewardRequest,
    responses(
        (status = 200, description = "Reward credited", body = ClaimRewardResponse),
        (status = 400, description = "Completion not verified"),
        (status = 404, description = "No completion for this task"),
        (status = 409, description = "Reward already claimed"),
        (status = 422, description = "Attestation failed"),
    )
)]
pub async fn claim_reward(
    Auth(user): Auth,
    State(state): State<AppState>,
    Path((quest_id, task_id)): Path<(String, String)>,
    Json(request): Json<ClaimRewardRequest>,
) -> Result<Json<ClaimRewardResponse>, ApiError> {
    let (_quest, task) = load_task(&state, &quest_id, &task_id)?;
    let completions = CompletionRepository::new(state.storage());
    let mut completion = completions.find(&user.user_id, &quest_id, &task_id)?;

    if completion.status != CompletionStatus::Verified {
        return Err(ApiError::bad_request("Task completion is not verified"));
    }
    if completion.reward_claimed {
        return Err(ApiError::conflict("Reward already claimed"));
    }

    let profile = ProfileRepository::new(state.storage()).get_or_default(&user.user_id)?;
    let recipient = attestation_recipient(&state, &profile)?;

    // Concurrent claims for one completion stop here; only one relays.
    state.db.reserve_reward(&completion.id)?;
    let attestation = relay_attestation(
        &state,
        &user,
        request.attestation_signature.as_ref(),
        QUEST_TASK_REWARD_CLAIM,
        recipient,
    )
    .await;
    if !attestation.success {
        state.db.release_reward(&completion.id)?;
        return Err(ApiError::unprocessable(
            attestation
                .error
                .unwrap_or_else(|| "Attestation failed".to_string()),
        ));
    }

    let balance = state
        .db
        .settle_reward(&completion.id, &user.user_id, task.reward_amount)?;
    completion.reward_claimed = true;
    completion.attestation_uid = attestation.uid.clone();
    completions.update(&completion)?;

    audit_log!(
        state.storage(),
        AuditEvent::new(AuditEventType::RewardClaimed)
            .with_user(&user.user_id)
            .with_resource("completion", &completion.id)
            .with_details(serde_json::json!({ "reward_amount": task.reward_amount }))
    );

    Ok(Json(ClaimRewardResponse {
        completion,
        reward_amount: task.reward_amount,
        balance,
        attestation,
    }))
}

// ============================================================================
// Admin
// ============================================================================

/// Create a quest.
#[utoipa::path(
    post,
    path = "/v1/admin/quests",
    tag = "Admin",
    security(("bearer" = [])),
    request_body = CreateQuestRequest,
    responses(
        (status = 201, description = "Quest created", body = Quest),
        (status = 400, description = "Invalid quest"),
        (status = 403, description = "Admin role required"),
    )
)]
pub async fn create_quest(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<CreateQuestRequest>,
) -> Result<(StatusCode, Json<Quest>), ApiError> {
    if request.title.trim().is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }
    if request.tasks.is_empty() {
        return Err(ApiError::bad_request("A quest needs at least one task"));
    }

    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(request.tasks.len());
    for task in request.tasks {
        task.config
            .validate_for(task.task_type)
            .map_err(ApiError::bad_request)?;
        let id = task
            .id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        if !seen.insert(id.clone()) {
            return Err(ApiError::bad_request(format!("Duplicate task id `{id}`")));
        }
        tasks.push(QuestTask {
            id,
            title: task.title,
            task_type: task.task_type,
            config: task.config,
            reward_amount: task.reward_amount,
        });
    }

    let quest = Quest {
        id: uuid::Uuid::new_v4().to_string(),
        title: request.title.trim().to_string(),
        description: request.description,
        active: request.active,
        tasks,
        created_at: Utc::now(),
    };
    QuestRepository::new(state.storage()).create(&quest)?;

    audit_log!(state.storage(), AuditEventType::QuestCreated, &admin, "quest", &quest.id);

    Ok((StatusCode::CREATED, Json(quest)))
}

/// Completions awaiting review.
#[utoipa::path(
    get,
    path = "/v1/admin/completions",
    tag = "Admin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Pending completions", body = PendingReviewResponse),
        (status = 403, description = "Admin role required"),
    )
)]
pub async fn list_pending_review(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
) -> Result<Json<PendingReviewResponse>, ApiError> {
    let completions = CompletionRepository::new(state.storage()).list_pending_review()?;
    Ok(Json(PendingReviewResponse {
        total: completions.len(),
        completions,
    }))
}

/// Approve or reject a submission.
#[utoipa::path(
    post,
    path = "/v1/admin/completions/{completion_id}/review",
    tag = "Admin",
    security(("bearer" = [])),
    params(("completion_id" = String, Path, description = "Completion ID")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Completion reviewed", body = TaskCompletion),
        (status = 404, description = "Unknown completion"),
        (status = 409, description = "Completion is not pending review"),
    )
)]
pub async fn review_completion(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(completion_id): Path<String>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<TaskCompletion>, ApiError> {
    let repo = CompletionRepository::new(state.storage());
    let mut completion = repo.get(&completion_id)?;
    if completion.status != CompletionStatus::PendingReview {
        return Err(ApiError::conflict("Completion is not pending review"));
    }

    completion.status = if request.approve {
        CompletionStatus::Verified
    } else {
        CompletionStatus::Rejected
    };
    completion.reviewer_id = Some(admin.user_id.clone());
    completion.review_note = request.note;
    repo.update(&completion)?;

    audit_log!(
        state.storage(),
        AuditEvent::new(AuditEventType::TaskReviewed)
            .with_user(&admin.user_id)
            .with_resource("completion", &completion.id)
            .with_details(serde_json::json!({ "approved": request.approve }))
    );

    Ok(Json(repo.get(&completion_id)?))
}
