// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! EAS contract bindings and the service-wallet submitter.

use alloy::{
    network::EthereumWallet,
    primitives::{Address, Log, B256},
    sol,
    sol_types::SolEvent,
};

use super::client::{signer_provider, ChainError, SignerProvider};
use crate::attestation::{
    AttestationSubmitter, DelegatedAttestationSignature, Submission, SubmissionError,
};

sol! {
    #[sol(rpc)]
    interface IEAS {
        struct AttestationRequestData {
            address recipient;
            uint64 expirationTime;
            bool revocable;
            bytes32 refUID;
            bytes data;
            uint256 value;
        }

        struct Signature {
            uint8 v;
            bytes32 r;
            bytes32 s;
        }

        struct DelegatedAttestationRequest {
            bytes32 schema;
            AttestationRequestData data;
            Signature signature;
            address attester;
            uint64 deadline;
        }

        function attestByDelegation(DelegatedAttestationRequest calldata delegatedRequest)
            external
            payable
            returns (bytes32);

        event Attested(
            address indexed recipient,
            address indexed attester,
            bytes32 uid,
            bytes32 indexed schemaUID
        );
    }
}

/// Build the `attestByDelegation` argument from a client payload.
pub fn delegated_request(
    signature: &DelegatedAttestationSignature,
) -> Result<IEAS::DelegatedAttestationRequest, String> {
    let (v, r, s) = signature.vrs()?;
    Ok(IEAS::DelegatedAttestationRequest {
        schema: signature.schema_uid,
        data: IEAS::AttestationRequestData {
            recipient: signature.recipient,
            expirationTime: signature.expiration_time,
            revocable: signature.revocable,
            refUID: signature.ref_uid,
            data: signature.data.clone(),
            value: signature.value,
        },
        signature: IEAS::Signature { v, r, s },
        attester: signature.attester,
        deadline: signature.deadline,
    })
}

/// UID of the first `Attested` event emitted by `eas`.
pub fn attested_uid<'a>(logs: impl IntoIterator<Item = &'a Log>, eas: Address) -> Option<B256> {
    logs.into_iter()
        .filter(|log| log.address == eas)
        .find_map(|log| IEAS::Attested::decode_log_data(&log.data).ok())
        .map(|event| event.uid)
}

/// Submits delegated attestations from the service wallet.
pub struct EasSubmitter {
    contract: Address,
    provider: SignerProvider,
}

impl EasSubmitter {
    pub fn new(rpc_url: &str, contract: Address, wallet: EthereumWallet) -> Result<Self, ChainError> {
        Ok(Self {
            contract,
            provider: signer_provider(rpc_url, wallet)?,
        })
    }
}

#[async_trait::async_trait]
impl AttestationSubmitter for EasSubmitter {
    async fn submit(
        &self,
        signature: &DelegatedAttestationSignature,
    ) -> Result<Submission, SubmissionError> {
        let request = delegated_request(signature).map_err(SubmissionError::InvalidSignature)?;

        let pending = IEAS::new(self.contract, &self.provider)
            .attestByDelegation(request)
            .value(signature.value)
            .send()
            .await
            .map_err(|e| SubmissionError::Rejected(e.to_string()))?;
        let tx_hash = *pending.tx_hash();
        tracing::debug!(%tx_hash, "attestByDelegation sent");

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| SubmissionError::Rejected(format!("Receipt for {tx_hash}: {e}")))?;
        if !receipt.status() {
            return Err(SubmissionError::Reverted(tx_hash));
        }

        let uid = attested_uid(
            receipt.inner.logs().iter().map(|log| &log.inner),
            self.contract,
        )
        .ok_or(SubmissionError::MissingUid(tx_hash))?;

        Ok(Submission { uid, tx_hash })
    }
}
