// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! DG payouts from the service wallet.
//!
//! EIP-1559 ERC-20 transfers with explicit fee caps, plus helpers converting
//! between whole-token and base-unit amounts.

use alloy::{
    eips::BlockNumberOrTag,
    network::EthereumWallet,
    primitives::{Address, B256, U256},
    providers::Provider,
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};

use super::client::{signer_provider, ChainError, SignerProvider};
use super::erc20::{IERC20, DG_DECIMALS};
use super::types::NetworkConfig;
use crate::withdrawal::TokenPayout;

/// Base fee assumed when the latest block carries none (0.1 gwei).
pub const DEFAULT_BASE_FEE_WEI: u128 = 100_000_000;

/// Priority fee for Base (0.001 gwei).
pub const PRIORITY_FEE_WEI: u128 = 1_000_000;

/// `(max_fee_per_gas, max_priority_fee_per_gas)` for a block base fee.
///
/// Max fee = 2 * base fee + priority fee, leaving room for base fee growth.
pub fn fee_caps(base_fee: Option<u64>) -> (u128, u128) {
    let base_fee = base_fee.map(u128::from).unwrap_or(DEFAULT_BASE_FEE_WEI);
    let max_fee = base_fee
        .saturating_mul(2)
        .saturating_add(PRIORITY_FEE_WEI);
    (max_fee, PRIORITY_FEE_WEI)
}

/// Transfers DG from the service wallet.
pub struct DgPayout {
    network: NetworkConfig,
    token: Address,
    provider: SignerProvider,
}

impl DgPayout {
    pub fn new(
        network: NetworkConfig,
        rpc_url: &str,
        token: Address,
        wallet: EthereumWallet,
    ) -> Result<Self, ChainError> {
        Ok(Self {
            network,
            token,
            provider: signer_provider(rpc_url, wallet)?,
        })
    }

    async fn gas_prices(&self) -> Result<(u128, u128), ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| ChainError::RpcError(format!("Failed to get block: {e}")))?
            .ok_or_else(|| ChainError::RpcError("No latest block".to_string()))?;

        Ok(fee_caps(block.header.base_fee_per_gas))
    }
}

#[async_trait::async_trait]
impl TokenPayout for DgPayout {
    async fn transfer(&self, to: Address, amount: u64) -> Result<B256, ChainError> {
        let units = parse_amount(&amount.to_string(), DG_DECIMALS)?;
        let data = IERC20::transferCall { to, amount: units }.abi_encode();
        let (max_fee_per_gas, priority_fee) = self.gas_prices().await?;

        let tx = TransactionRequest::default()
            .to(self.token)
            .input(data.into())
            .max_fee_per_gas(max_fee_per_gas)
            .max_priority_fee_per_gas(priority_fee);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("Failed to send: {e}")))?;
        let tx_hash = *pending.tx_hash();

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| ChainError::RpcError(format!("Failed to get receipt: {e}")))?;
        if !receipt.status() {
            return Err(ChainError::TransactionFailed(format!(
                "DG transfer {tx_hash} reverted"
            )));
        }

        tracing::info!(
            %to,
            amount,
            %tx_hash,
            explorer = %self.network.tx_url(&tx_hash.to_string()),
            "DG payout confirmed"
        );
        Ok(tx_hash)
    }
}

/// Parse a human-readable amount to base units.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals of the token
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, ChainError> {
    let parts: Vec<&str> = amount.split('.').collect();

    if parts.len() > 2 {
        return Err(ChainError::InvalidAmount(
            "Invalid amount format".to_string(),
        ));
    }

    let whole = parts[0]
        .parse::<u128>()
        .map_err(|_| ChainError::InvalidAmount("Invalid whole number".to_string()))?;

    let decimal_part = if parts.len() == 2 {
        let dec_str = parts[1];
        if dec_str.len() > decimals as usize {
            return Err(ChainError::InvalidAmount(format!(
                "Too many decimal places (max {decimals})"
            )));
        }
        let padded = format!("{:0<width$}", dec_str, width = decimals as usize);
        padded
            .parse::<u128>()
            .map_err(|_| ChainError::InvalidAmount("Invalid decimal".to_string()))?
    } else {
        0u128
    };

    let multiplier = 10u128.pow(decimals as u32);
    let total = whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(decimal_part))
        .ok_or_else(|| ChainError::InvalidAmount("Amount overflow".to_string()))?;

    Ok(U256::from(total))
}

/// Format base units to a human-readable amount.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{whole}.{trimmed}")
        }
    }
}
