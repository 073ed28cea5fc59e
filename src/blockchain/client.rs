// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Read-only chain client used by quest verification and health checks.

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, B256},
    providers::{
        fillers::{
            BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
            WalletFiller,
        },
        Identity, Provider, ProviderBuilder, RootProvider,
    },
};

use super::types::{NetworkConfig, ReceiptSummary};
use super::unlock::IPublicLock;

/// HTTP provider type (with all fillers).
pub(crate) type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// HTTP provider that signs with the service wallet.
pub(crate) type SignerProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Ethereum>,
>;

/// Build a signing provider for `rpc_url`.
pub(crate) fn signer_provider(
    rpc_url: &str,
    wallet: EthereumWallet,
) -> Result<SignerProvider, ChainError> {
    let url: url::Url = rpc_url
        .parse()
        .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;
    Ok(ProviderBuilder::new().wallet(wallet).connect_http(url))
}

/// Chain reads needed by the verification strategies.
///
/// Implemented by [`ChainClient`]; tests substitute an in-memory double.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    /// Receipt for a mined transaction, `None` if unknown or still pending.
    async fn transaction_receipt(&self, tx_hash: B256)
        -> Result<Option<ReceiptSummary>, ChainError>;

    /// Unlock `getHasValidKey(owner)` on `lock`.
    async fn has_valid_key(&self, lock: Address, owner: Address) -> Result<bool, ChainError>;

    /// Latest block number.
    async fn block_number(&self) -> Result<u64, ChainError>;
}

/// JSON-RPC chain client.
pub struct ChainClient {
    /// Network configuration
    network: NetworkConfig,
    /// Alloy HTTP provider
    provider: HttpProvider,
}

impl ChainClient {
    /// Create a new client for `network`, talking to `rpc_url`.
    pub fn new(network: NetworkConfig, rpc_url: &str) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url);

        Ok(Self { network, provider })
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }
}

#[async_trait::async_trait]
impl ChainReader for ChainClient {
    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<ReceiptSummary>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| ChainError::RpcError(format!("Failed to get receipt: {e}")))?;

        Ok(receipt.map(|r| ReceiptSummary {
            tx_hash,
            from: r.from,
            to: r.to,
            success: r.status(),
            block_number: r.block_number.unwrap_or(0),
            logs: r.inner.logs().iter().map(|log| log.inner.clone()).collect(),
        }))
    }

    async fn has_valid_key(&self, lock: Address, owner: Address) -> Result<bool, ChainError> {
        IPublicLock::new(lock, &self.provider)
            .getHasValidKey(owner)
            .call()
            .await
            .map_err(|e| ChainError::ContractError(e.to_string()))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::BASE_SEPOLIA;

    #[test]
    fn rejects_invalid_rpc_url() {
        let result = ChainClient::new(BASE_SEPOLIA, "not a url");
        assert!(matches!(result, Err(ChainError::InvalidRpcUrl(_))));
    }

    #[test]
    fn keeps_network_config() {
        let client = ChainClient::new(BASE_SEPOLIA, BASE_SEPOLIA.rpc_url).unwrap();
        assert_eq!(client.network().chain_id, 84532);
    }
}
