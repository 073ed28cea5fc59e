// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Blockchain types and constants.

use std::str::FromStr;

use alloy::primitives::{address, Address, Log, B256};

use super::client::ChainError;

/// Network configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Identifier used in configuration and request payloads
    pub slug: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Default RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
    /// EAS contract (OP-stack predeploy)
    pub eas_address: Address,
}

/// Base mainnet configuration.
pub const BASE_MAINNET: NetworkConfig = NetworkConfig {
    name: "Base",
    slug: "base",
    chain_id: 8453,
    rpc_url: "https://mainnet.base.org",
    explorer_url: "https://basescan.org",
    eas_address: address!("4200000000000000000000000000000000000021"),
};

/// Base Sepolia testnet configuration.
pub const BASE_SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Base Sepolia",
    slug: "base-sepolia",
    chain_id: 84532,
    rpc_url: "https://sepolia.base.org",
    explorer_url: "https://sepolia.basescan.org",
    eas_address: address!("4200000000000000000000000000000000000021"),
};

impl NetworkConfig {
    /// Look up a supported network by slug (case-insensitive).
    pub fn by_slug(raw: &str) -> Option<NetworkConfig> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "base" | "base-mainnet" => Some(BASE_MAINNET),
            "base-sepolia" | "basesepolia" => Some(BASE_SEPOLIA),
            _ => None,
        }
    }

    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }
}

/// Validate a request-supplied network against the configured one.
///
/// A missing value means "the configured network".
pub fn ensure_network(raw: Option<&str>, configured: &NetworkConfig) -> Result<(), String> {
    let Some(value) = raw else {
        return Ok(());
    };
    match NetworkConfig::by_slug(value) {
        Some(network) if network.chain_id == configured.chain_id => Ok(()),
        _ => Err(format!(
            "Only `{}` network is supported in this deployment.",
            configured.slug
        )),
    }
}

/// Parse a 0x-prefixed address.
pub fn parse_address(raw: &str) -> Result<Address, ChainError> {
    Address::from_str(raw.trim()).map_err(|e| ChainError::InvalidAddress(e.to_string()))
}

/// Parse a 0x-prefixed 32-byte transaction hash.
pub fn parse_tx_hash(raw: &str) -> Result<B256, ChainError> {
    B256::from_str(raw.trim()).map_err(|e| ChainError::InvalidHash(e.to_string()))
}

/// The parts of a transaction receipt the verification strategies look at.
#[derive(Debug, Clone)]
pub struct ReceiptSummary {
    pub tx_hash: B256,
    pub from: Address,
    pub to: Option<Address>,
    pub success: bool,
    pub block_number: u64,
    pub logs: Vec<Log>,
}
