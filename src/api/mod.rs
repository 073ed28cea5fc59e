// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

use axum::{
    body::Body,
    http::Request,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    attestation::{DelegatedAttestationSignature, GaslessAttestationResult},
    auth::Role,
    notifications::BroadcastSummary,
    quests::{TaskConfig, TaskSubmission, TaskType, VerificationCode, VerificationResult},
    state::AppState,
    storage::{
        AttestationRecord, AttestationSchema, CheckinRecord, CompletionStatus, Quest, QuestTask,
        TaskCompletion, WithdrawalRecord, WithdrawalStatus,
    },
    withdrawal::WithdrawalRequest,
};

pub mod attestations;
pub mod checkins;
pub mod health;
pub mod notifications;
pub mod quests;
pub mod schemas;
pub mod security;
pub mod users;
pub mod withdrawals;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        // Users
        .route("/users/me", get(users::get_current_user))
        .route("/users/me/wallets", post(users::link_wallet))
        .route("/users/me/telegram", put(users::set_telegram))
        .route("/users/me/balance", get(users::get_balance))
        // Attestations
        .route("/attestations", get(attestations::list_attestations))
        .route("/attestations/gasless", post(attestations::relay_gasless))
        .route("/attestations/{uid}", get(attestations::get_attestation))
        // Quests
        .route("/quests", get(quests::list_quests))
        .route("/quests/{quest_id}", get(quests::get_quest))
        .route(
            "/quests/{quest_id}/tasks/{task_id}/complete",
            post(quests::complete_task),
        )
        .route(
            "/quests/{quest_id}/tasks/{task_id}/claim",
            post(quests::claim_reward),
        )
        // Check-ins
        .route("/checkins", post(checkins::check_in))
        // Withdrawals
        .route(
            "/withdrawals",
            get(withdrawals::list_withdrawals).post(withdrawals::create_withdrawal),
        )
        // Security
        .route("/security/csp-report", post(security::csp_report))
        // Admin
        .route(
            "/admin/schemas",
            get(schemas::list_schemas).post(schemas::create_schema),
        )
        .route(
            "/admin/schemas/{schema_uid}",
            get(schemas::get_schema).delete(schemas::delete_schema),
        )
        .route("/admin/quests", post(quests::create_quest))
        .route("/admin/completions", get(quests::list_pending_review))
        .route(
            "/admin/completions/{completion_id}/review",
            post(quests::review_completion),
        )
        .route(
            "/admin/notifications/broadcast",
            post(notifications::broadcast_message),
        )
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        users::get_current_user,
        users::link_wallet,
        users::set_telegram,
        users::get_balance,
        attestations::relay_gasless,
        attestations::list_attestations,
        attestations::get_attestation,
        schemas::create_schema,
        schemas::list_schemas,
        schemas::get_schema,
        schemas::delete_schema,
        quests::list_quests,
        quests::get_quest,
        quests::create_quest,
        quests::complete_task,
        quests::claim_reward,
        quests::list_pending_review,
        quests::review_completion,
        checkins::check_in,
        withdrawals::create_withdrawal,
        withdrawals::list_withdrawals,
        notifications::broadcast_message,
        security::csp_report
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            Role,
            users::UserMeResponse,
            users::LinkWalletRequest,
            users::LinkWalletResponse,
            users::TelegramRequest,
            users::TelegramResponse,
            users::BalanceResponse,
            DelegatedAttestationSignature,
            GaslessAttestationResult,
            AttestationRecord,
            attestations::GaslessAttestationRequest,
            attestations::AttestationListResponse,
            AttestationSchema,
            schemas::CreateSchemaRequest,
            schemas::SchemaListResponse,
            Quest,
            QuestTask,
            TaskType,
            TaskConfig,
            TaskSubmission,
            TaskCompletion,
            CompletionStatus,
            VerificationCode,
            VerificationResult,
            quests::QuestListResponse,
            quests::CreateQuestRequest,
            quests::CreateTaskRequest,
            quests::CompleteTaskResponse,
            quests::ClaimRewardRequest,
            quests::ClaimRewardResponse,
            quests::ReviewRequest,
            quests::PendingReviewResponse,
            CheckinRecord,
            checkins::CheckinRequest,
            checkins::CheckinResponse,
            WithdrawalRequest,
            WithdrawalRecord,
            WithdrawalStatus,
            withdrawals::WithdrawalListResponse,
            notifications::BroadcastRequest,
            BroadcastSummary
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Users", description = "Identity, wallet linking and ledger balance"),
        (name = "Attestations", description = "Gasless EAS attestation relay"),
        (name = "Quests", description = "Quest tasks and reward claims"),
        (name = "Check-ins", description = "Daily check-in streaks"),
        (name = "Withdrawals", description = "EIP-712 DG withdrawals"),
        (name = "Security", description = "CSP report sink"),
        (name = "Admin", description = "Schemas, quests, reviews and broadcasts")
    )
)]
pub struct ApiDoc;
