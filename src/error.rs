// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::{DbError, StorageError};
use crate::withdrawal::WithdrawalError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => Self::not_found(format!("{what} not found")),
            StorageError::AlreadyExists(what) => Self::conflict(format!("{what} already exists")),
            other => {
                tracing::error!(error = %other, "Storage failure");
                Self::internal("Storage error")
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => Self::not_found(format!("{what} not found")),
            DbError::Conflict(message) => Self::conflict(message),
            other => {
                tracing::error!(error = %other, "Database failure");
                Self::internal("Database error")
            }
        }
    }
}

impl From<WithdrawalError> for ApiError {
    fn from(e: WithdrawalError) -> Self {
        let status = match e {
            WithdrawalError::Database(db) => return Self::from(db),
            WithdrawalError::Disabled => StatusCode::SERVICE_UNAVAILABLE,
            WithdrawalError::Expired
            | WithdrawalError::InvalidSignature(_)
            | WithdrawalError::BelowMinimum { .. } => StatusCode::BAD_REQUEST,
            WithdrawalError::SignerMismatch { .. } | WithdrawalError::WalletNotLinked(_) => {
                StatusCode::FORBIDDEN
            }
            WithdrawalError::Replayed => StatusCode::CONFLICT,
            WithdrawalError::InsufficientBalance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            WithdrawalError::Payout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        assert_eq!(ApiError::conflict("dup").status, StatusCode::CONFLICT);
        assert_eq!(
            ApiError::too_many_requests("slow down").status,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::service_unavailable("off").status,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[test]
    fn storage_errors_map_to_status() {
        let nf: ApiError = StorageError::NotFound("Quest q1".into()).into();
        assert_eq!(nf.status, StatusCode::NOT_FOUND);

        let dup: ApiError = StorageError::AlreadyExists("Schema".into()).into();
        assert_eq!(dup.status, StatusCode::CONFLICT);

        let other: ApiError = StorageError::NotInitialized.into();
        assert_eq!(other.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(other.message, "Storage error");
    }

    #[test]
    fn db_conflict_is_409() {
        let err: ApiError = DbError::Conflict("Transaction 0xabc was already used".into()).into();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert!(err.message.contains("already used"));
    }

    #[test]
    fn withdrawal_errors_map_to_status() {
        let cases = [
            (WithdrawalError::Expired, StatusCode::BAD_REQUEST),
            (WithdrawalError::Replayed, StatusCode::CONFLICT),
            (
                WithdrawalError::WalletNotLinked(alloy::primitives::Address::ZERO),
                StatusCode::FORBIDDEN,
            ),
            (
                WithdrawalError::InsufficientBalance {
                    available: 1,
                    requested: 2,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (WithdrawalError::Disabled, StatusCode::SERVICE_UNAVAILABLE),
            (
                WithdrawalError::Database(DbError::NotFound("Withdrawal w".into())),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status, status);
        }
    }
}
