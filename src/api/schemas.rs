// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Admin endpoints for the attestation schema registry.
//!
//! A schema maps a logical key on a network to an on-chain schema UID. Once
//! an attestation references a UID the schema can no longer be deleted.

use std::str::FromStr;

use alloy::primitives::B256;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    audit_log,
    auth::AdminOnly,
    blockchain::NetworkConfig,
    error::ApiError,
    state::AppState,
    storage::{AttestationSchema, AuditEventType, SchemaRepository},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateSchemaRequest {
    /// 32-byte schema UID from the EAS schema registry
    pub schema_uid: String,
    /// Logical key handlers resolve by, e.g. `daily_checkin`
    pub schema_key: String,
    /// Network slug (default: the configured network)
    pub network: Option<String>,
    pub name: String,
    pub description: Option<String>,
    /// EAS schema string, e.g. `address user,uint256 amount`
    pub schema_definition: String,
    pub category: Option<String>,
    #[serde(default = "default_revocable")]
    pub revocable: bool,
}

fn default_revocable() -> bool {
    true
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SchemaListQuery {
    /// Network slug filter
    pub network: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SchemaListResponse {
    pub schemas: Vec<AttestationSchema>,
    pub total: usize,
}

fn validate_key(key: &str) -> Result<(), ApiError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "schema_key must be lowercase letters, digits and underscores",
        ))
    }
}

/// Register a schema.
#[utoipa::path(
    post,
    path = "/v1/admin/schemas",
    tag = "Admin",
    security(("bearer" = [])),
    request_body = CreateSchemaRequest,
    responses(
        (status = 201, description = "Schema registered", body = AttestationSchema),
        (status = 400, description = "Invalid UID, key or network"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "UID or key already registered"),
    )
)]
pub async fn create_schema(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Json(request): Json<CreateSchemaRequest>,
) -> Result<(StatusCode, Json<AttestationSchema>), ApiError> {
    let uid = B256::from_str(request.schema_uid.trim())
        .map_err(|_| ApiError::bad_request("schema_uid must be a 32-byte hex string"))?;
    let key = request.schema_key.trim().to_ascii_lowercase();
    validate_key(&key)?;

    let network = match request.network.as_deref() {
        Some(raw) => NetworkConfig::by_slug(raw)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown network `{raw}`")))?,
        None => state.config.network,
    };
    if request.schema_definition.trim().is_empty() {
        return Err(ApiError::bad_request("schema_definition is required"));
    }

    let mut schema = AttestationSchema::new(
        &uid.to_string(),
        &key,
        network.slug,
        request.name.trim(),
        request.schema_definition.trim(),
    );
    schema.description = request.description;
    schema.revocable = request.revocable;
    if let Some(category) = request.category {
        schema.category = category;
    }

    SchemaRepository::new(state.storage()).create(&schema)?;
    state.db.restore_schema(&schema.schema_uid)?;
    state.schema_cache.invalidate(&schema.schema_key, &schema.network);

    audit_log!(
        state.storage(),
        AuditEventType::SchemaCreated,
        &admin,
        "schema",
        &schema.schema_uid
    );
    tracing::info!(
        schema_uid = %schema.schema_uid,
        schema_key = %schema.schema_key,
        network = %schema.network,
        "Schema registered"
    );

    Ok((StatusCode::CREATED, Json(schema)))
}

/// List registered schemas.
#[utoipa::path(
    get,
    path = "/v1/admin/schemas",
    tag = "Admin",
    security(("bearer" = [])),
    params(SchemaListQuery),
    responses(
        (status = 200, description = "Registered schemas", body = SchemaListResponse),
        (status = 403, description = "Admin role required"),
    )
)]
pub async fn list_schemas(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
    Query(query): Query<SchemaListQuery>,
) -> Result<Json<SchemaListResponse>, ApiError> {
    let schemas = SchemaRepository::new(state.storage()).list(query.network.as_deref())?;
    Ok(Json(SchemaListResponse {
        total: schemas.len(),
        schemas,
    }))
}

/// Get one schema.
#[utoipa::path(
    get,
    path = "/v1/admin/schemas/{schema_uid}",
    tag = "Admin",
    security(("bearer" = [])),
    params(("schema_uid" = String, Path, description = "Schema UID")),
    responses(
        (status = 200, description = "Schema", body = AttestationSchema),
        (status = 404, description = "Unknown schema"),
    )
)]
pub async fn get_schema(
    AdminOnly(_admin): AdminOnly,
    State(state): State<AppState>,
    Path(schema_uid): Path<String>,
) -> Result<Json<AttestationSchema>, ApiError> {
    Ok(Json(SchemaRepository::new(state.storage()).get(&schema_uid)?))
}

/// Delete a schema no attestation references.
#[utoipa::path(
    delete,
    path = "/v1/admin/schemas/{schema_uid}",
    tag = "Admin",
    security(("bearer" = [])),
    params(("schema_uid" = String, Path, description = "Schema UID")),
    responses(
        (status = 204, description = "Schema deleted"),
        (status = 404, description = "Unknown schema"),
        (status = 409, description = "Attestations reference this schema"),
    )
)]
pub async fn delete_schema(
    AdminOnly(admin): AdminOnly,
    State(state): State<AppState>,
    Path(schema_uid): Path<String>,
) -> Result<StatusCode, ApiError> {
    let repo = SchemaRepository::new(state.storage());
    let schema = repo.get(&schema_uid)?;

    // Retiring checks for references and blocks late records in one step.
    state.db.retire_schema(&schema.schema_uid)?;
    if let Err(e) = repo.delete(&schema.schema_uid) {
        state.db.restore_schema(&schema.schema_uid)?;
        return Err(e.into());
    }
    state.schema_cache.invalidate(&schema.schema_key, &schema.network);

    audit_log!(
        state.storage(),
        AuditEventType::SchemaDeleted,
        &admin,
        "schema",
        &schema.schema_uid
    );

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{test_state, user, ADMIN_ID};
    use crate::storage::AttestationRecord;
    use crate::storage::DbError;
    use chrono::Utc;

    const UID: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    fn create_request(uid: &str, key: &str) -> CreateSchemaRequest {
        CreateSchemaRequest {
            schema_uid: uid.to_string(),
            schema_key: key.to_string(),
            network: None,
            name: "Daily check-in".to_string(),
            description: None,
            schema_definition: "address user,uint32 streak".to_string(),
            category: Some("checkin".to_string()),
            revocable: false,
        }
    }

    fn admin() -> AdminOnly {
        AdminOnly(user(ADMIN_ID))
    }

    #[tokio::test]
    async fn create_then_get_and_list() {
        let (state, _temp) = test_state();
        let (status, Json(schema)) = create_schema(
            admin(),
            State(state.clone()),
            Json(create_request(UID, "daily_checkin")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(schema.network, "base-sepolia");
        assert_eq!(schema.category, "checkin");
        assert!(!schema.revocable);

        let Json(fetched) = get_schema(admin(), State(state.clone()), Path(UID.to_string()))
            .await
            .unwrap();
        assert_eq!(fetched, schema);

        let Json(list) = list_schemas(
            admin(),
            State(state),
            Query(SchemaListQuery {
                network: Some("base-sepolia".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(list.total, 1);
    }

    #[tokio::test]
    async fn duplicate_uid_and_key_conflict() {
        let (state, _temp) = test_state();
        create_schema(
            admin(),
            State(state.clone()),
            Json(create_request(UID, "daily_checkin")),
        )
        .await
        .unwrap();

        let dup_uid = create_schema(
            admin(),
            State(state.clone()),
            Json(create_request(UID, "other_key")),
        )
        .await
        .unwrap_err();
        assert_eq!(dup_uid.status, StatusCode::CONFLICT);

        let other_uid = "0x2222222222222222222222222222222222222222222222222222222222222222";
        let dup_key = create_schema(
            admin(),
            State(state),
            Json(create_request(other_uid, "daily_checkin")),
        )
        .await
        .unwrap_err();
        assert_eq!(dup_key.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn rejects_bad_input() {
        let (state, _temp) = test_state();
        let bad_uid = create_schema(
            admin(),
            State(state.clone()),
            Json(create_request("0x1234", "daily_checkin")),
        )
        .await
        .unwrap_err();
        assert_eq!(bad_uid.status, StatusCode::BAD_REQUEST);

        let mut request = create_request(UID, "daily_checkin");
        request.network = Some("ethereum".to_string());
        let bad_network = create_schema(admin(), State(state.clone()), Json(request))
            .await
            .unwrap_err();
        assert_eq!(bad_network.status, StatusCode::BAD_REQUEST);

        let bad_key = create_schema(admin(), State(state), Json(create_request(UID, "Daily Check")))
            .await
            .unwrap_err();
        assert_eq!(bad_key.status, StatusCode::BAD_REQUEST);
    }

    fn record(uid: &str) -> AttestationRecord {
        AttestationRecord {
            uid: uid.to_string(),
            schema_uid: UID.to_string(),
            schema_key: "daily_checkin".to_string(),
            recipient: "0x00000000000000000000000000000000000000aa".to_string(),
            attester: "0x00000000000000000000000000000000000000bb".to_string(),
            tx_hash: "0xbbbb".to_string(),
            network: "base-sepolia".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn delete_is_guarded_by_attestations() {
        let (state, _temp) = test_state();
        create_schema(
            admin(),
            State(state.clone()),
            Json(create_request(UID, "daily_checkin")),
        )
        .await
        .unwrap();

        state.db.insert_attestation(&record("0xaaaa")).unwrap();

        let err = delete_schema(admin(), State(state.clone()), Path(UID.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert!(SchemaRepository::new(state.storage()).exists(UID));
    }

    #[tokio::test]
    async fn delete_unreferenced_schema() {
        let (state, _temp) = test_state();
        create_schema(
            admin(),
            State(state.clone()),
            Json(create_request(UID, "daily_checkin")),
        )
        .await
        .unwrap();

        let status = delete_schema(admin(), State(state.clone()), Path(UID.to_string()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_schema(admin(), State(state.clone()), Path(UID.to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        // A relay that resolved the schema before the delete cannot store its record.
        assert!(matches!(
            state.db.insert_attestation(&record("0xaaaa")),
            Err(DbError::Conflict(_))
        ));
        assert!(!state.db.schema_has_attestations(UID).unwrap());
    }

    #[tokio::test]
    async fn recreated_schema_accepts_records() {
        let (state, _temp) = test_state();
        create_schema(
            admin(),
            State(state.clone()),
            Json(create_request(UID, "daily_checkin")),
        )
        .await
        .unwrap();
        delete_schema(admin(), State(state.clone()), Path(UID.to_string()))
            .await
            .unwrap();
        create_schema(
            admin(),
            State(state.clone()),
            Json(create_request(UID, "daily_checkin")),
        )
        .await
        .unwrap();

        state.db.insert_attestation(&record("0xaaaa")).unwrap();
        assert!(state.db.schema_has_attestations(UID).unwrap());
    }
}
