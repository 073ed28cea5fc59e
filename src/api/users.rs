// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! User endpoints: identity, wallet linking, Telegram subscription, balance.

use alloy::primitives::{Address, Bytes, Signature};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    audit_log,
    auth::{Auth, Role},
    error::ApiError,
    state::AppState,
    storage::{AuditEventType, ProfileRepository},
};

/// Response for GET /v1/users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// Privy DID
    pub user_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Linked wallet addresses
    pub wallets: Vec<String>,
    pub telegram_subscribed: bool,
}

/// Request to link a wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LinkWalletRequest {
    #[schema(value_type = String)]
    pub address: Address,
    /// Personal-sign signature over [`link_message`]
    #[schema(value_type = String)]
    pub signature: Bytes,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LinkWalletResponse {
    /// Checksummed address
    pub address: String,
    pub wallets: Vec<String>,
}

/// Request to set (or clear) the Telegram chat.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TelegramRequest {
    /// `null` unsubscribes
    pub chat_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TelegramResponse {
    pub telegram_subscribed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub user_id: String,
    /// Whole DG available for withdrawal
    pub balance: u64,
}

/// Message a wallet signs to prove it belongs to `user_id`.
pub fn link_message(address: &Address, user_id: &str) -> String {
    format!(
        "Link wallet {} to P2E Inferno account {user_id}",
        address.to_checksum(None)
    )
}

/// Get the current user's identity and linked wallets.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<UserMeResponse>, ApiError> {
    let profile = ProfileRepository::new(state.storage()).get_or_default(&user.user_id)?;
    Ok(Json(UserMeResponse {
        user_id: user.user_id,
        role: user.role,
        session_id: user.session_id,
        wallets: profile.wallets,
        telegram_subscribed: profile.telegram_chat_id.is_some(),
    }))
}

/// Link a wallet to the current account.
///
/// The wallet signs `Link wallet <address> to P2E Inferno account <user_id>`
/// with `personal_sign`. A wallet can belong to one account only.
#[utoipa::path(
    post,
    path = "/v1/users/me/wallets",
    tag = "Users",
    security(("bearer" = [])),
    request_body = LinkWalletRequest,
    responses(
        (status = 201, description = "Wallet linked", body = LinkWalletResponse),
        (status = 400, description = "Signature does not match address"),
        (status = 409, description = "Wallet linked to another account"),
    )
)]
pub async fn link_wallet(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<LinkWalletRequest>,
) -> Result<(StatusCode, Json<LinkWalletResponse>), ApiError> {
    let message = link_message(&request.address, &user.user_id);
    let signature = Signature::from_raw(&request.signature)
        .map_err(|e| ApiError::bad_request(format!("Malformed signature: {e}")))?;
    let recovered = signature
        .recover_address_from_msg(message.as_bytes())
        .map_err(|e| ApiError::bad_request(format!("Signature recovery failed: {e}")))?;
    if recovered != request.address {
        return Err(ApiError::bad_request(format!(
            "Signature was produced by {recovered}, not {}",
            request.address
        )));
    }

    let address = request.address.to_checksum(None);
    state.db.link_wallet(&address, &user.user_id)?;

    let repo = ProfileRepository::new(state.storage());
    let mut profile = repo.get_or_default(&user.user_id)?;
    if profile.add_wallet(&address) {
        repo.save(&profile)?;
        audit_log!(state.storage(), AuditEventType::WalletLinked, &user, "wallet", &address);
    }

    Ok((
        StatusCode::CREATED,
        Json(LinkWalletResponse {
            address,
            wallets: profile.wallets,
        }),
    ))
}

/// Set the Telegram chat that receives broadcasts.
#[utoipa::path(
    put,
    path = "/v1/users/me/telegram",
    tag = "Users",
    security(("bearer" = [])),
    request_body = TelegramRequest,
    responses(
        (status = 200, description = "Subscription updated", body = TelegramResponse),
    )
)]
pub async fn set_telegram(
    Auth(user): Auth,
    State(state): State<AppState>,
    Json(request): Json<TelegramRequest>,
) -> Result<Json<TelegramResponse>, ApiError> {
    let repo = ProfileRepository::new(state.storage());
    let mut profile = repo.get_or_default(&user.user_id)?;
    profile.telegram_chat_id = request.chat_id;
    repo.save(&profile)?;

    Ok(Json(TelegramResponse {
        telegram_subscribed: profile.telegram_chat_id.is_some(),
    }))
}

/// Current reward ledger balance.
#[utoipa::path(
    get,
    path = "/v1/users/me/balance",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Ledger balance", body = BalanceResponse),
    )
)]
pub async fn get_balance(
    Auth(user): Auth,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.db.balance(&user.user_id)?;
    Ok(Json(BalanceResponse {
        user_id: user.user_id,
        balance,
    }))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::state::test_support::{test_state, user};
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    pub(crate) const WALLET_KEY: &str =
        "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a";

    pub(crate) fn signed_link(user_id: &str) -> LinkWalletRequest {
        let signer: PrivateKeySigner = WALLET_KEY.parse().unwrap();
        let message = link_message(&signer.address(), user_id);
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();
        LinkWalletRequest {
            address: signer.address(),
            signature: Bytes::from(signature.as_bytes().to_vec()),
        }
    }

    #[test]
    fn link_message_uses_checksum_address() {
        let address: Address = "0x00000000000000000000000000000000000000aa".parse().unwrap();
        assert_eq!(
            link_message(&address, "did:privy:u1"),
            format!("Link wallet {} to P2E Inferno account did:privy:u1", address.to_checksum(None))
        );
    }

    #[tokio::test]
    async fn link_wallet_and_read_profile() {
        let (state, _temp) = test_state();
        let request = signed_link("did:privy:u1");

        let (status, Json(linked)) = link_wallet(
            Auth(user("did:privy:u1")),
            State(state.clone()),
            Json(request.clone()),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(linked.wallets, vec![request.address.to_checksum(None)]);

        // Relinking to the same account is idempotent
        link_wallet(Auth(user("did:privy:u1")), State(state.clone()), Json(request))
            .await
            .unwrap();

        let Json(me) = get_current_user(Auth(user("did:privy:u1")), State(state))
            .await
            .unwrap();
        assert_eq!(me.wallets.len(), 1);
        assert_eq!(me.role, Role::User);
        assert!(!me.telegram_subscribed);
    }

    #[tokio::test]
    async fn link_wallet_rejects_signature_for_other_account() {
        let (state, _temp) = test_state();
        let request = signed_link("did:privy:someone-else");

        let err = link_wallet(Auth(user("did:privy:u1")), State(state), Json(request))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wallet_belongs_to_one_account() {
        let (state, _temp) = test_state();
        link_wallet(
            Auth(user("did:privy:u1")),
            State(state.clone()),
            Json(signed_link("did:privy:u1")),
        )
        .await
        .unwrap();

        let err = link_wallet(
            Auth(user("did:privy:u2")),
            State(state),
            Json(signed_link("did:privy:u2")),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn telegram_subscription_toggles() {
        let (state, _temp) = test_state();
        let Json(on) = set_telegram(
            Auth(user("did:privy:u1")),
            State(state.clone()),
            Json(TelegramRequest { chat_id: Some(99) }),
        )
        .await
        .unwrap();
        assert!(on.telegram_subscribed);
        assert_eq!(
            ProfileRepository::new(state.storage())
                .list_telegram_chat_ids()
                .unwrap(),
            vec![99]
        );

        let Json(off) = set_telegram(
            Auth(user("did:privy:u1")),
            State(state),
            Json(TelegramRequest { chat_id: None }),
        )
        .await
        .unwrap();
        assert!(!off.telegram_subscribed);
    }

    #[tokio::test]
    async fn balance_reflects_ledger() {
        let (state, _temp) = test_state();
        state.db.credit("did:privy:u1", 250).unwrap();
        let Json(body) = get_balance(Auth(user("did:privy:u1")), State(state))
            .await
            .unwrap();
        assert_eq!(body.balance, 250);
    }
}
