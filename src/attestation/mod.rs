// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Gasless EAS attestations.
//!
//! - [`signature`]: the client-signed delegated attestation payload
//! - [`resolver`]: schema key → schema UID lookup
//! - [`gasless`]: validation, submission and the degradation policy

pub mod gasless;
pub mod resolver;
pub mod signature;

pub use gasless::{
    AttestationSubmitter, GaslessAttestationResult, GaslessAttestor, Submission, SubmissionError,
};
pub use resolver::{SchemaResolver, StoredSchemaResolver};
pub use signature::{eas_domain, DelegatedAttestationSignature};

/// Schema key attested when a quest task reward is claimed.
pub const QUEST_TASK_REWARD_CLAIM: &str = "quest_task_reward_claim";

/// Schema key attested on a daily check-in.
pub const DAILY_CHECKIN: &str = "daily_checkin";
