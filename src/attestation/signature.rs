// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Client-produced delegated attestation signature.
//!
//! The client signs an EAS `Attest` typed-data message with the attester's
//! wallet. The relay never persists the payload; it checks it and forwards
//! it to `attestByDelegation`.

use std::borrow::Cow;

use alloy::primitives::{Address, Bytes, Signature, B256, U256};
use alloy::sol;
use alloy::sol_types::{Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

sol! {
    /// EAS delegated attestation typed data.
    #[derive(Debug)]
    struct Attest {
        address attester;
        bytes32 schema;
        address recipient;
        uint64 expirationTime;
        bool revocable;
        bytes32 refUID;
        bytes data;
        uint256 value;
        uint256 nonce;
        uint64 deadline;
    }
}

/// EIP-712 domain name of the EAS contract.
pub const EAS_DOMAIN_NAME: &str = "EAS";

/// EIP-712 domain of an EAS deployment.
pub fn eas_domain(version: &str, chain_id: u64, contract: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(EAS_DOMAIN_NAME)),
        Some(Cow::Owned(version.to_string())),
        Some(U256::from(chain_id)),
        Some(contract),
        None,
    )
}

fn default_revocable() -> bool {
    true
}

/// Delegated attestation signature supplied by the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DelegatedAttestationSignature {
    /// Schema UID the signature commits to
    #[schema(value_type = String)]
    pub schema_uid: B256,
    #[schema(value_type = String)]
    pub recipient: Address,
    /// Wallet that produced the signature
    #[schema(value_type = String)]
    pub attester: Address,
    /// ABI-encoded schema data
    #[schema(value_type = String)]
    pub data: Bytes,
    #[serde(default)]
    pub expiration_time: u64,
    #[serde(default = "default_revocable")]
    pub revocable: bool,
    #[serde(default)]
    #[schema(value_type = String)]
    pub ref_uid: B256,
    #[serde(default)]
    #[schema(value_type = String)]
    pub value: U256,
    /// Attester's EAS nonce at signing time
    #[serde(default)]
    #[schema(value_type = String)]
    pub nonce: U256,
    /// Unix seconds after which EAS rejects the signature (0 = none)
    pub deadline: u64,
    /// 65-byte `r || s || v` signature
    #[schema(value_type = String)]
    pub signature: Bytes,
    pub chain_id: u64,
    /// Network slug the client targeted
    #[serde(default)]
    pub network: Option<String>,
}

impl DelegatedAttestationSignature {
    /// The typed-data message this signature should cover.
    pub fn typed_data(&self) -> Attest {
        Attest {
            attester: self.attester,
            schema: self.schema_uid,
            recipient: self.recipient,
            expirationTime: self.expiration_time,
            revocable: self.revocable,
            refUID: self.ref_uid,
            data: self.data.clone(),
            value: self.value,
            nonce: self.nonce,
            deadline: self.deadline,
        }
    }

    /// EIP-712 digest under `domain`.
    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        self.typed_data().eip712_signing_hash(domain)
    }

    /// Parse the raw signature bytes.
    pub fn parsed_signature(&self) -> Result<Signature, String> {
        Signature::from_raw(&self.signature).map_err(|e| format!("Malformed signature: {e}"))
    }

    /// Address that produced the signature over the typed data.
    pub fn recover_attester(&self, domain: &Eip712Domain) -> Result<Address, String> {
        let signature = self.parsed_signature()?;
        signature
            .recover_address_from_prehash(&self.signing_hash(domain))
            .map_err(|e| format!("Signature recovery failed: {e}"))
    }

    /// `(v, r, s)` as EAS expects them on-chain (v in 27/28).
    pub fn vrs(&self) -> Result<(u8, B256, B256), String> {
        let signature = self.parsed_signature()?;
        let v = 27 + u8::from(signature.v());
        let r = B256::from(signature.r().to_be_bytes::<32>());
        let s = B256::from(signature.s().to_be_bytes::<32>());
        Ok((v, r, s))
    }

    /// Whether the signature deadline lies before `now` (unix seconds).
    pub fn is_expired(&self, now: u64) -> bool {
        self.deadline != 0 && self.deadline < now
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy::primitives::{address, b256};
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    pub(crate) const SCHEMA_UID: B256 =
        b256!("1111111111111111111111111111111111111111111111111111111111111111");
    pub(crate) const RECIPIENT: Address = address!("00000000000000000000000000000000000000aa");
    pub(crate) const EAS: Address = address!("4200000000000000000000000000000000000021");

    pub(crate) const ATTESTER_KEY: &str =
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

    /// Sign a payload for `recipient` with the test attester key.
    pub(crate) fn signed_payload(
        recipient: Address,
        chain_id: u64,
        deadline: u64,
    ) -> (PrivateKeySigner, DelegatedAttestationSignature) {
        let signer: PrivateKeySigner = ATTESTER_KEY.parse().unwrap();
        let mut payload = DelegatedAttestationSignature {
            schema_uid: SCHEMA_UID,
            recipient,
            attester: signer.address(),
            data: Bytes::from_static(&[0x01, 0x02]),
            expiration_time: 0,
            revocable: true,
            ref_uid: B256::ZERO,
            value: U256::ZERO,
            nonce: U256::ZERO,
            deadline,
            signature: Bytes::new(),
            chain_id,
            network: None,
        };
        let domain = eas_domain("1.3.0", chain_id, EAS);
        let sig = signer
            .sign_hash_sync(&payload.signing_hash(&domain))
            .unwrap();
        payload.signature = Bytes::from(sig.as_bytes().to_vec());
        (signer, payload)
    }

    #[test]
    fn recovers_attester() {
        let (signer, payload) = signed_payload(RECIPIENT, 84532, u64::MAX);
        let domain = eas_domain("1.3.0", 84532, EAS);
        assert_eq!(payload.recover_attester(&domain).unwrap(), signer.address());
    }

    #[test]
    fn other_domain_recovers_other_address() {
        let (signer, payload) = signed_payload(RECIPIENT, 84532, u64::MAX);
        let domain = eas_domain("1.3.0", 8453, EAS);
        assert_ne!(payload.recover_attester(&domain).unwrap(), signer.address());
    }

    #[test]
    fn vrs_splits_signature() {
        let (_, payload) = signed_payload(RECIPIENT, 84532, u64::MAX);
        let (v, r, s) = payload.vrs().unwrap();
        assert!(v == 27 || v == 28);
        assert_eq!(&payload.signature[..32], r.as_slice());
        assert_eq!(&payload.signature[32..64], s.as_slice());
    }

    #[test]
    fn malformed_signature_is_rejected() {
        let (_, mut payload) = signed_payload(RECIPIENT, 84532, u64::MAX);
        payload.signature = Bytes::from_static(&[0u8; 10]);
        assert!(payload.vrs().is_err());
    }

    #[test]
    fn zero_deadline_never_expires() {
        let (_, mut payload) = signed_payload(RECIPIENT, 84532, 0);
        assert!(!payload.is_expired(u64::MAX));
        payload.deadline = 100;
        assert!(payload.is_expired(101));
        assert!(!payload.is_expired(100));
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = serde_json::json!({
            "schema_uid": SCHEMA_UID.to_string(),
            "recipient": "0x00000000000000000000000000000000000000AA",
            "attester": "0x00000000000000000000000000000000000000bb",
            "data": "0x0102",
            "deadline": 1_900_000_000u64,
            "signature": "0x00",
            "chain_id": 84532
        });
        let payload: DelegatedAttestationSignature = serde_json::from_value(json).unwrap();
        assert_eq!(payload.recipient, RECIPIENT);
        assert!(payload.revocable);
        assert_eq!(payload.value, U256::ZERO);
        assert!(payload.network.is_none());
    }
}
