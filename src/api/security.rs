// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::{error::ApiError, state::AppState};

/// Client key for throttling: last `X-Forwarded-For` hop, then `X-Real-IP`.
///
/// The last hop is the one appended by the fronting proxy; earlier hops are
/// whatever the client sent.
fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };
    forwarded
        .or_else(real_ip)
        .unwrap_or("unknown")
        .to_string()
}

/// Receive a browser CSP violation report.
///
/// Browsers post `application/csp-report`, so the body is parsed as JSON
/// whatever the content type.
#[utoipa::path(
    post,
    path = "/v1/security/csp-report",
    tag = "Security",
    request_body(content = Object, content_type = "application/csp-report"),
    responses(
        (status = 204, description = "Report accepted"),
        (status = 400, description = "Body is not JSON"),
        (status = 429, description = "Too many reports from this client"),
    )
)]
pub async fn csp_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let client = client_key(&headers);
    if !state.csp_throttle.check(&client) {
        return Err(ApiError::too_many_requests("Too many CSP reports"));
    }
    let report: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("Invalid CSP report: {e}")))?;

    let body = report.get("csp-report").unwrap_or(&report);
    tracing::warn!(
        client = %client,
        document_uri = body.get("document-uri").and_then(|v| v.as_str()).unwrap_or_default(),
        violated_directive = body
            .get("violated-directive")
            .and_then(|v| v.as_str())
            .unwrap_or_default(),
        blocked_uri = body.get("blocked-uri").and_then(|v| v.as_str()).unwrap_or_default(),
        "CSP violation reported"
    );

    Ok(StatusCode::NO_CONTENT)
}
