// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! JWT claims and authenticated user representation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::roles::Role;

/// Claims of a Privy access token.
///
/// `sub` is the Privy DID (`did:privy:...`), `aud` the Privy app id and
/// `sid` the session id.
#[derive(Debug, Clone, Deserialize)]
pub struct PrivyClaims {
    pub sub: String,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub exp: i64,
    #[serde(default)]
    pub iss: String,
    /// Validated by jsonwebtoken, not read directly
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
    #[serde(default)]
    pub sid: Option<String>,
}

/// Authenticated user information extracted from JWT.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Canonical user ID (Privy `sub` claim)
    pub user_id: String,

    pub role: Role,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(skip)]
    pub issuer: String,

    /// Token expiration (Unix timestamp)
    #[serde(skip)]
    pub expires_at: i64,
}

impl AuthenticatedUser {
    pub fn from_claims(claims: PrivyClaims, admin_user_ids: &[String]) -> Self {
        let role = Role::resolve(&claims.sub, admin_user_ids);
        Self {
            user_id: claims.sub,
            role,
            session_id: claims.sid,
            issuer: claims.iss,
            expires_at: claims.exp,
        }
    }

    pub fn has_role(&self, required: Role) -> bool {
        self.role.has_privilege(required)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> PrivyClaims {
        PrivyClaims {
            sub: "did:privy:abc".to_string(),
            iat: 1700000000,
            exp: 1700003600,
            iss: "privy.io".to_string(),
            aud: Some(serde_json::json!("app-id")),
            sid: Some("sess_abc".to_string()),
        }
    }

    #[test]
    fn from_claims_extracts_user_id() {
        let user = AuthenticatedUser::from_claims(sample_claims(), &[]);
        assert_eq!(user.user_id, "did:privy:abc");
        assert_eq!(user.session_id.as_deref(), Some("sess_abc"));
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn listed_user_is_admin() {
        let admins = vec!["did:privy:abc".to_string()];
        let user = AuthenticatedUser::from_claims(sample_claims(), &admins);
        assert!(user.is_admin());
        assert!(user.has_role(Role::User));
    }
}
