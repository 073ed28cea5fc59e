// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Service wallet key loading.
//!
//! The relay signs with a single service wallet. Its key comes either from a
//! hex string in the environment or from a PEM file on disk (SEC1 or PKCS#8).

use std::str::FromStr;

use alloy::{network::EthereumWallet, signers::local::PrivateKeySigner};
use k256::SecretKey;

use super::client::ChainError;
use crate::config::ServiceKeySource;

/// Parse a PEM-encoded secp256k1 private key to a hex string (no 0x prefix).
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, ChainError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| ChainError::InvalidPrivateKey(format!("Invalid key format: {}", e)))?;

    Ok(alloy::hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from a hex private key (with or without 0x prefix).
pub fn signer_from_hex(hex_key: &str) -> Result<PrivateKeySigner, ChainError> {
    let key = hex_key.trim();
    let key = key.strip_prefix("0x").unwrap_or(key);
    PrivateKeySigner::from_str(key).map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))
}

/// Create a signer from a PEM-encoded private key.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, ChainError> {
    let hex_key = pem_to_hex(pem_bytes)?;
    signer_from_hex(&hex_key)
}

/// Load the service wallet signer from its configured source.
pub fn load_service_signer(source: &ServiceKeySource) -> Result<PrivateKeySigner, ChainError> {
    match source {
        ServiceKeySource::Hex(key) => signer_from_hex(key),
        ServiceKeySource::PemFile(path) => {
            let bytes = std::fs::read(path).map_err(|e| {
                ChainError::InvalidPrivateKey(format!("Cannot read {}: {}", path.display(), e))
            })?;
            signer_from_pem(&bytes)
        }
    }
}

/// Wrap a signer into a wallet usable by a filling provider.
pub fn wallet_from_signer(signer: PrivateKeySigner) -> EthereumWallet {
    EthereumWallet::from(signer)
}
