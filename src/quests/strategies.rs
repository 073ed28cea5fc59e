// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! One verification function per task type.
//!
//! Strategies share no state. Each returns a [`VerificationResult`] with a
//! stable machine-readable code; on-chain strategies read through the
//! [`ChainReader`] seam so they can be exercised without a node.

use alloy::primitives::{Address, Log};
use alloy::sol_types::SolEvent;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{TaskConfig, TaskType};
use crate::blockchain::unlock::IUnlock;
use crate::blockchain::vendor::IDGTokenVendor;
use crate::blockchain::{parse_tx_hash, ChainReader, ReceiptSummary};

/// Proof supplied by the user when completing a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TaskSubmission {
    /// Transaction hash for on-chain tasks
    #[serde(default)]
    pub tx_hash: Option<String>,
    /// URL for `submit_url`
    #[serde(default)]
    pub url: Option<String>,
    /// Text for `submit_text`
    #[serde(default)]
    pub text: Option<String>,
}

/// Machine-readable verification outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationCode {
    Ok,
    PendingReview,
    NoCheckinToday,
    WalletRequired,
    MissingTxHash,
    InvalidTxHash,
    TxNotFound,
    TxFailed,
    SenderMismatch,
    WrongContract,
    EventNotFound,
    InvalidUrl,
    TextTooShort,
    NoValidKey,
    TaskMisconfigured,
    ChainUnavailable,
    ChainError,
}

/// Result of a verification strategy.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct VerificationResult {
    pub success: bool,
    pub code: VerificationCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Normalized hash of the transaction that proved the task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl VerificationResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: VerificationCode::Ok,
            message: None,
            tx_hash: None,
        }
    }

    pub fn pending_review() -> Self {
        Self {
            success: true,
            code: VerificationCode::PendingReview,
            message: Some("Submission received and awaiting review".to_string()),
            tx_hash: None,
        }
    }

    pub fn fail(code: VerificationCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            message: Some(message.into()),
            tx_hash: None,
        }
    }

    fn with_tx(mut self, tx_hash: String) -> Self {
        self.tx_hash = Some(tx_hash);
        self
    }
}

/// Facts about the caller the strategies need.
pub struct VerificationContext<'a> {
    /// Wallet the user acts with on-chain
    pub user_wallet: Option<Address>,
    /// A check-in row exists for today (UTC)
    pub checked_in_today: bool,
    /// Chain access; `None` when no RPC is configured
    pub chain: Option<&'a dyn ChainReader>,
}

/// Run the strategy for `task_type`.
pub async fn verify_task(
    task_type: TaskType,
    config: &TaskConfig,
    submission: &TaskSubmission,
    ctx: &VerificationContext<'_>,
) -> VerificationResult {
    if let Err(message) = config.validate_for(task_type) {
        return VerificationResult::fail(VerificationCode::TaskMisconfigured, message);
    }

    match task_type {
        TaskType::DailyCheckin => verify_daily_checkin(ctx),
        TaskType::VendorBuy => verify_vendor_trade(Trade::Buy, config, submission, ctx).await,
        TaskType::VendorSell => verify_vendor_trade(Trade::Sell, config, submission, ctx).await,
        TaskType::DeployLock => verify_deploy_lock(config, submission, ctx).await,
        TaskType::SubmitUrl => verify_submit_url(submission),
        TaskType::SubmitText => verify_submit_text(config, submission),
        TaskType::ContractInteraction => {
            verify_contract_interaction(config, submission, ctx).await
        }
        TaskType::HoldKey => verify_hold_key(config, ctx).await,
    }
}

/// `daily_checkin`: the user checked in today.
pub fn verify_daily_checkin(ctx: &VerificationContext<'_>) -> VerificationResult {
    if ctx.checked_in_today {
        VerificationResult::ok()
    } else {
        VerificationResult::fail(
            VerificationCode::NoCheckinToday,
            "No check-in recorded for today",
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Trade {
    Buy,
    Sell,
}

/// `vendor_buy` / `vendor_sell`: a successful vendor call by the user that
/// emitted `TokensPurchased` / `TokensSold` for them.
pub async fn verify_vendor_trade(
    trade: Trade,
    config: &TaskConfig,
    submission: &TaskSubmission,
    ctx: &VerificationContext<'_>,
) -> VerificationResult {
    let Some(vendor) = config.vendor_address else {
        return VerificationResult::fail(VerificationCode::TaskMisconfigured, "Missing vendor");
    };
    let (wallet, receipt) = match load_user_receipt(submission, ctx).await {
        Ok(found) => found,
        Err(failure) => return failure,
    };
    if receipt.to != Some(vendor) {
        return VerificationResult::fail(
            VerificationCode::WrongContract,
            "Transaction was not sent to the token vendor",
        );
    }

    let matched = receipt
        .logs
        .iter()
        .filter(|log| log.address == vendor)
        .any(|log| match trade {
            Trade::Buy => decode::<IDGTokenVendor::TokensPurchased>(log)
                .is_some_and(|event| event.buyer == wallet),
            Trade::Sell => decode::<IDGTokenVendor::TokensSold>(log)
                .is_some_and(|event| event.seller == wallet),
        });

    if matched {
        VerificationResult::ok().with_tx(receipt.tx_hash.to_string())
    } else {
        let event = match trade {
            Trade::Buy => "TokensPurchased",
            Trade::Sell => "TokensSold",
        };
        VerificationResult::fail(
            VerificationCode::EventNotFound,
            format!("No {event} event for this wallet in the transaction"),
        )
    }
}

/// `deploy_lock`: a successful transaction in which the Unlock factory
/// emitted `NewLock` with the user as lock owner.
pub async fn verify_deploy_lock(
    config: &TaskConfig,
    submission: &TaskSubmission,
    ctx: &VerificationContext<'_>,
) -> VerificationResult {
    let Some(factory) = config.factory_address else {
        return VerificationResult::fail(VerificationCode::TaskMisconfigured, "Missing factory");
    };
    let (wallet, receipt) = match load_user_receipt(submission, ctx).await {
        Ok(found) => found,
        Err(failure) => return failure,
    };

    let deployed = receipt
        .logs
        .iter()
        .filter(|log| log.address == factory)
        .filter_map(decode::<IUnlock::NewLock>)
        .any(|event| event.lockOwner == wallet);

    if deployed {
        VerificationResult::ok().with_tx(receipt.tx_hash.to_string())
    } else {
        VerificationResult::fail(
            VerificationCode::EventNotFound,
            "No NewLock event owned by this wallet in the transaction",
        )
    }
}

/// `submit_url`: an http(s) URL; the completion then waits for review.
pub fn verify_submit_url(submission: &TaskSubmission) -> VerificationResult {
    let Some(raw) = submission.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) else {
        return VerificationResult::fail(VerificationCode::InvalidUrl, "A URL is required");
    };
    match url::Url::parse(raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => {
            VerificationResult::pending_review()
        }
        Ok(_) => VerificationResult::fail(
            VerificationCode::InvalidUrl,
            "URL must use http or https",
        ),
        Err(e) => VerificationResult::fail(VerificationCode::InvalidUrl, format!("Invalid URL: {e}")),
    }
}

/// `submit_text`: trimmed text of at least `min_length` characters; the
/// completion then waits for review.
pub fn verify_submit_text(config: &TaskConfig, submission: &TaskSubmission) -> VerificationResult {
    let min_length = config.min_length.unwrap_or(1).max(1);
    let length = submission
        .text
        .as_deref()
        .map(|t| t.trim().chars().count())
        .unwrap_or(0);

    if length >= min_length {
        VerificationResult::pending_review()
    } else {
        VerificationResult::fail(
            VerificationCode::TextTooShort,
            format!("Text must be at least {min_length} characters"),
        )
    }
}

/// `contract_interaction`: a successful transaction from the user to the
/// configured contract.
pub async fn verify_contract_interaction(
    config: &TaskConfig,
    submission: &TaskSubmission,
    ctx: &VerificationContext<'_>,
) -> VerificationResult {
    let Some(contract) = config.contract_address else {
        return VerificationResult::fail(VerificationCode::TaskMisconfigured, "Missing contract");
    };
    let (_, receipt) = match load_user_receipt(submission, ctx).await {
        Ok(found) => found,
        Err(failure) => return failure,
    };

    if receipt.to == Some(contract) {
        VerificationResult::ok().with_tx(receipt.tx_hash.to_string())
    } else {
        VerificationResult::fail(
            VerificationCode::WrongContract,
            "Transaction was not sent to the required contract",
        )
    }
}

/// `hold_key`: the user's wallet holds a valid key of the configured lock.
pub async fn verify_hold_key(config: &TaskConfig, ctx: &VerificationContext<'_>) -> VerificationResult {
    let Some(lock) = config.lock_address else {
        return VerificationResult::fail(VerificationCode::TaskMisconfigured, "Missing lock");
    };
    let Some(wallet) = ctx.user_wallet else {
        return wallet_required();
    };
    let Some(chain) = ctx.chain else {
        return chain_unavailable();
    };

    match chain.has_valid_key(lock, wallet).await {
        Ok(true) => VerificationResult::ok(),
        Ok(false) => VerificationResult::fail(
            VerificationCode::NoValidKey,
            "Wallet does not hold a valid key for this lock",
        ),
        Err(e) => {
            tracing::warn!(error = %e, lock = %lock, "Key check failed");
            VerificationResult::fail(VerificationCode::ChainError, e.to_string())
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Fetch the submitted transaction's receipt and check it succeeded and was
/// sent by the user's wallet.
async fn load_user_receipt(
    submission: &TaskSubmission,
    ctx: &VerificationContext<'_>,
) -> Result<(Address, ReceiptSummary), VerificationResult> {
    let Some(wallet) = ctx.user_wallet else {
        return Err(wallet_required());
    };
    let Some(raw_hash) = submission.tx_hash.as_deref().filter(|h| !h.trim().is_empty()) else {
        return Err(VerificationResult::fail(
            VerificationCode::MissingTxHash,
            "A transaction hash is required",
        ));
    };
    let tx_hash = parse_tx_hash(raw_hash)
        .map_err(|e| VerificationResult::fail(VerificationCode::InvalidTxHash, e.to_string()))?;
    let Some(chain) = ctx.chain else {
        return Err(chain_unavailable());
    };

    let receipt = match chain.transaction_receipt(tx_hash).await {
        Ok(Some(receipt)) => receipt,
        Ok(None) => {
            return Err(VerificationResult::fail(
                VerificationCode::TxNotFound,
                "Transaction not found or not yet mined",
            ))
        }
        Err(e) => {
            tracing::warn!(error = %e, tx_hash = %tx_hash, "Receipt lookup failed");
            return Err(VerificationResult::fail(
                VerificationCode::ChainError,
                e.to_string(),
            ));
        }
    };

    if !receipt.success {
        return Err(VerificationResult::fail(
            VerificationCode::TxFailed,
            "Transaction reverted",
        ));
    }
    if receipt.from != wallet {
        return Err(VerificationResult::fail(
            VerificationCode::SenderMismatch,
            "Transaction was not sent by your wallet",
        ));
    }
    Ok((wallet, receipt))
}

fn decode<E: SolEvent>(log: &Log) -> Option<E> {
    E::decode_log_data(&log.data).ok()
}

fn wallet_required() -> VerificationResult {
    VerificationResult::fail(
        VerificationCode::WalletRequired,
        "Link a wallet before completing this task",
    )
}

fn chain_unavailable() -> VerificationResult {
    VerificationResult::fail(
        VerificationCode::ChainUnavailable,
        "On-chain verification is not available",
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::blockchain::ChainError;
    use alloy::primitives::{address, b256, B256, U256};
    use std::collections::HashMap;

    pub(crate) const USER: Address = address!("1111111111111111111111111111111111111111");
    pub(crate) const OTHER: Address = address!("2222222222222222222222222222222222222222");
    pub(crate) const VENDOR: Address = address!("3333333333333333333333333333333333333333");
    pub(crate) const FACTORY: Address = address!("4444444444444444444444444444444444444444");
    pub(crate) const LOCK: Address = address!("5555555555555555555555555555555555555555");
    pub(crate) const TX: B256 =
        b256!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");

    /// In-memory chain with canned receipts and key holders.
    #[derive(Default)]
    pub(crate) struct MockChain {
        pub receipts: HashMap<B256, ReceiptSummary>,
        pub key_holders: Vec<(Address, Address)>,
        pub fail: bool,
    }

    #[async_trait::async_trait]
    impl ChainReader for MockChain {
        async fn transaction_receipt(
            &self,
            tx_hash: B256,
        ) -> Result<Option<ReceiptSummary>, ChainError> {
            if self.fail {
                return Err(ChainError::RpcError("node down".into()));
            }
            Ok(self.receipts.get(&tx_hash).cloned())
        }

        async fn has_valid_key(&self, lock: Address, owner: Address) -> Result<bool, ChainError> {
            if self.fail {
                return Err(ChainError::RpcError("node down".into()));
            }
            Ok(self.key_holders.contains(&(lock, owner)))
        }

        async fn block_number(&self) -> Result<u64, ChainError> {
            Ok(1)
        }
    }

    pub(crate) fn receipt(from: Address, to: Address, success: bool, logs: Vec<Log>) -> ReceiptSummary {
        ReceiptSummary {
            tx_hash: TX,
            from,
            to: Some(to),
            success,
            block_number: 10,
            logs,
        }
    }

    pub(crate) fn purchase_log(emitter: Address, buyer: Address) -> Log {
        let event = IDGTokenVendor::TokensPurchased {
            buyer,
            baseTokenAmount: U256::from(100),
            swapTokenAmount: U256::from(1000),
            fee: U256::ZERO,
        };
        Log {
            address: emitter,
            data: event.encode_log_data(),
        }
    }

    fn sold_log(emitter: Address, seller: Address) -> Log {
        let event = IDGTokenVendor::TokensSold {
            seller,
            swapTokenAmount: U256::from(1000),
            baseTokenAmount: U256::from(100),
            fee: U256::ZERO,
        };
        Log {
            address: emitter,
            data: event.encode_log_data(),
        }
    }

    fn new_lock_log(emitter: Address, owner: Address) -> Log {
        let event = IUnlock::NewLock {
            lockOwner: owner,
            newLockAddress: LOCK,
        };
        Log {
            address: emitter,
            data: event.encode_log_data(),
        }
    }

    fn chain_with(receipt: ReceiptSummary) -> MockChain {
        let mut chain = MockChain::default();
        chain.receipts.insert(TX, receipt);
        chain
    }

    fn ctx(chain: &MockChain) -> VerificationContext<'_> {
        VerificationContext {
            user_wallet: Some(USER),
            checked_in_today: false,
            chain: Some(chain),
        }
    }

    fn tx_submission() -> TaskSubmission {
        TaskSubmission {
            tx_hash: Some(TX.to_string()),
            ..Default::default()
        }
    }

    fn vendor_config() -> TaskConfig {
        TaskConfig {
            vendor_address: Some(VENDOR),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn daily_checkin_requires_todays_row() {
        let chain = MockChain::default();
        let mut context = ctx(&chain);
        let result = verify_task(
            TaskType::DailyCheckin,
            &TaskConfig::default(),
            &TaskSubmission::default(),
            &context,
        )
        .await;
        assert_eq!(result.code, VerificationCode::NoCheckinToday);

        context.checked_in_today = true;
        let result = verify_daily_checkin(&context);
        assert!(result.success);
        assert_eq!(result.code, VerificationCode::Ok);
    }

    #[tokio::test]
    async fn vendor_buy_succeeds_with_matching_event() {
        let chain = chain_with(receipt(USER, VENDOR, true, vec![purchase_log(VENDOR, USER)]));
        let result = verify_task(TaskType::VendorBuy, &vendor_config(), &tx_submission(), &ctx(&chain)).await;

        assert!(result.success, "{result:?}");
        assert_eq!(result.tx_hash, Some(TX.to_string()));
    }

    #[tokio::test]
    async fn vendor_buy_rejects_other_buyer() {
        let chain = chain_with(receipt(USER, VENDOR, true, vec![purchase_log(VENDOR, OTHER)]));
        let result = verify_task(TaskType::VendorBuy, &vendor_config(), &tx_submission(), &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::EventNotFound);
    }

    #[tokio::test]
    async fn vendor_buy_ignores_events_from_other_contracts() {
        let chain = chain_with(receipt(USER, VENDOR, true, vec![purchase_log(OTHER, USER)]));
        let result = verify_task(TaskType::VendorBuy, &vendor_config(), &tx_submission(), &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::EventNotFound);
    }

    #[tokio::test]
    async fn vendor_sell_needs_sold_event() {
        let chain = chain_with(receipt(USER, VENDOR, true, vec![purchase_log(VENDOR, USER)]));
        let result = verify_task(TaskType::VendorSell, &vendor_config(), &tx_submission(), &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::EventNotFound);

        let chain = chain_with(receipt(USER, VENDOR, true, vec![sold_log(VENDOR, USER)]));
        let result = verify_task(TaskType::VendorSell, &vendor_config(), &tx_submission(), &ctx(&chain)).await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn receipt_checks_run_in_order() {
        let chain = MockChain::default();
        let result = verify_task(TaskType::VendorBuy, &vendor_config(), &tx_submission(), &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::TxNotFound);

        let chain = chain_with(receipt(USER, VENDOR, false, vec![]));
        let result = verify_task(TaskType::VendorBuy, &vendor_config(), &tx_submission(), &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::TxFailed);

        let chain = chain_with(receipt(OTHER, VENDOR, true, vec![purchase_log(VENDOR, USER)]));
        let result = verify_task(TaskType::VendorBuy, &vendor_config(), &tx_submission(), &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::SenderMismatch);

        let chain = chain_with(receipt(USER, OTHER, true, vec![purchase_log(VENDOR, USER)]));
        let result = verify_task(TaskType::VendorBuy, &vendor_config(), &tx_submission(), &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::WrongContract);
    }

    #[tokio::test]
    async fn tx_tasks_validate_input() {
        let chain = MockChain::default();
        let result = verify_task(
            TaskType::VendorBuy,
            &vendor_config(),
            &TaskSubmission::default(),
            &ctx(&chain),
        )
        .await;
        assert_eq!(result.code, VerificationCode::MissingTxHash);

        let bad = TaskSubmission {
            tx_hash: Some("0x1234".into()),
            ..Default::default()
        };
        let result = verify_task(TaskType::VendorBuy, &vendor_config(), &bad, &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::InvalidTxHash);

        let no_wallet = VerificationContext {
            user_wallet: None,
            checked_in_today: false,
            chain: Some(&chain),
        };
        let result = verify_task(TaskType::VendorBuy, &vendor_config(), &tx_submission(), &no_wallet).await;
        assert_eq!(result.code, VerificationCode::WalletRequired);

        let no_chain = VerificationContext {
            user_wallet: Some(USER),
            checked_in_today: false,
            chain: None,
        };
        let result = verify_task(TaskType::VendorBuy, &vendor_config(), &tx_submission(), &no_chain).await;
        assert_eq!(result.code, VerificationCode::ChainUnavailable);
    }

    #[tokio::test]
    async fn rpc_failure_maps_to_chain_error() {
        let chain = MockChain {
            fail: true,
            ..Default::default()
        };
        let result = verify_task(TaskType::VendorBuy, &vendor_config(), &tx_submission(), &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::ChainError);
    }

    #[tokio::test]
    async fn deploy_lock_checks_factory_event_owner() {
        let config = TaskConfig {
            factory_address: Some(FACTORY),
            ..Default::default()
        };

        let chain = chain_with(receipt(USER, FACTORY, true, vec![new_lock_log(FACTORY, USER)]));
        let result = verify_task(TaskType::DeployLock, &config, &tx_submission(), &ctx(&chain)).await;
        assert!(result.success);

        let chain = chain_with(receipt(USER, FACTORY, true, vec![new_lock_log(FACTORY, OTHER)]));
        let result = verify_task(TaskType::DeployLock, &config, &tx_submission(), &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::EventNotFound);
    }

    #[tokio::test]
    async fn contract_interaction_checks_target() {
        let config = TaskConfig {
            contract_address: Some(VENDOR),
            ..Default::default()
        };
        let chain = chain_with(receipt(USER, VENDOR, true, vec![]));
        let result = verify_task(TaskType::ContractInteraction, &config, &tx_submission(), &ctx(&chain)).await;
        assert!(result.success);

        let chain = chain_with(receipt(USER, OTHER, true, vec![]));
        let result = verify_task(TaskType::ContractInteraction, &config, &tx_submission(), &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::WrongContract);
    }

    #[tokio::test]
    async fn hold_key_queries_lock() {
        let config = TaskConfig {
            lock_address: Some(LOCK),
            ..Default::default()
        };
        let mut chain = MockChain::default();
        let result = verify_task(TaskType::HoldKey, &config, &TaskSubmission::default(), &ctx(&chain)).await;
        assert_eq!(result.code, VerificationCode::NoValidKey);

        chain.key_holders.push((LOCK, USER));
        let result = verify_task(TaskType::HoldKey, &config, &TaskSubmission::default(), &ctx(&chain)).await;
        assert!(result.success);
    }

    #[tokio::test]
    async fn misconfigured_task_is_reported() {
        let chain = MockChain::default();
        let result = verify_task(
            TaskType::HoldKey,
            &TaskConfig::default(),
            &TaskSubmission::default(),
            &ctx(&chain),
        )
        .await;
        assert_eq!(result.code, VerificationCode::TaskMisconfigured);
    }

    #[test]
    fn submit_url_accepts_http_only() {
        let submit = |url: &str| TaskSubmission {
            url: Some(url.to_string()),
            ..Default::default()
        };

        let result = verify_submit_url(&submit("https://example.com/post/1"));
        assert!(result.success);
        assert_eq!(result.code, VerificationCode::PendingReview);

        assert_eq!(
            verify_submit_url(&submit("ftp://example.com")).code,
            VerificationCode::InvalidUrl
        );
        assert_eq!(
            verify_submit_url(&submit("not a url")).code,
            VerificationCode::InvalidUrl
        );
        assert_eq!(
            verify_submit_url(&TaskSubmission::default()).code,
            VerificationCode::InvalidUrl
        );
    }

    #[test]
    fn submit_text_respects_min_length() {
        let config = TaskConfig {
            min_length: Some(10),
            ..Default::default()
        };
        let submit = |text: &str| TaskSubmission {
            text: Some(text.to_string()),
            ..Default::default()
        };

        assert_eq!(
            verify_submit_text(&config, &submit("   short    ")).code,
            VerificationCode::TextTooShort
        );
        assert_eq!(
            verify_submit_text(&config, &submit("long enough answer")).code,
            VerificationCode::PendingReview
        );
        assert_eq!(
            verify_submit_text(&TaskConfig::default(), &submit("  ")).code,
            VerificationCode::TextTooShort
        );
    }

    #[test]
    fn codes_serialize_screaming_snake_case() {
        let json = serde_json::to_string(&VerificationCode::NoCheckinToday).unwrap();
        assert_eq!(json, "\"NO_CHECKIN_TODAY\"");
    }
}
