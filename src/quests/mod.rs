// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Quest task types and their verification strategies.
//!
//! A quest is a list of tasks. Each task has a type that decides how a
//! completion is proven: an on-chain receipt, a key-holding check, a daily
//! check-in, or a free-form submission that an admin reviews.

pub mod strategies;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use strategies::{
    verify_task, TaskSubmission, VerificationCode, VerificationContext, VerificationResult,
};

/// Kind of proof a task asks for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    DailyCheckin,
    VendorBuy,
    VendorSell,
    DeployLock,
    SubmitUrl,
    SubmitText,
    ContractInteraction,
    HoldKey,
}

impl TaskType {
    /// Completions of this type wait for an admin decision.
    pub fn requires_review(self) -> bool {
        matches!(self, TaskType::SubmitUrl | TaskType::SubmitText)
    }

    /// Completions of this type are proven by a transaction hash.
    pub fn requires_tx_hash(self) -> bool {
        matches!(
            self,
            TaskType::VendorBuy
                | TaskType::VendorSell
                | TaskType::DeployLock
                | TaskType::ContractInteraction
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::DailyCheckin => "daily_checkin",
            TaskType::VendorBuy => "vendor_buy",
            TaskType::VendorSell => "vendor_sell",
            TaskType::DeployLock => "deploy_lock",
            TaskType::SubmitUrl => "submit_url",
            TaskType::SubmitText => "submit_text",
            TaskType::ContractInteraction => "contract_interaction",
            TaskType::HoldKey => "hold_key",
        }
    }
}

/// Per-task verification parameters.
///
/// Which fields are required depends on the task type, see
/// [`TaskConfig::validate_for`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TaskConfig {
    /// DG token vendor (vendor_buy, vendor_sell)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub vendor_address: Option<Address>,
    /// Unlock lock (hold_key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub lock_address: Option<Address>,
    /// Unlock factory emitting `NewLock` (deploy_lock)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub factory_address: Option<Address>,
    /// Target contract (contract_interaction)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub contract_address: Option<Address>,
    /// Minimum trimmed length (submit_text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
}

impl TaskConfig {
    /// Check that the fields `task_type` needs are present.
    pub fn validate_for(&self, task_type: TaskType) -> Result<(), String> {
        let missing = match task_type {
            TaskType::VendorBuy | TaskType::VendorSell if self.vendor_address.is_none() => {
                Some("vendor_address")
            }
            TaskType::DeployLock if self.factory_address.is_none() => Some("factory_address"),
            TaskType::ContractInteraction if self.contract_address.is_none() => {
                Some("contract_address")
            }
            TaskType::HoldKey if self.lock_address.is_none() => Some("lock_address"),
            _ => None,
        };
        match missing {
            Some(field) => Err(format!(
                "Task type `{}` requires `{field}`",
                task_type.as_str()
            )),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_type_serializes_snake_case() {
        let json = serde_json::to_string(&TaskType::ContractInteraction).unwrap();
        assert_eq!(json, "\"contract_interaction\"");
        let parsed: TaskType = serde_json::from_str("\"hold_key\"").unwrap();
        assert_eq!(parsed, TaskType::HoldKey);
        assert_eq!(TaskType::VendorSell.as_str(), "vendor_sell");
    }

    #[test]
    fn review_and_tx_requirements() {
        assert!(TaskType::SubmitUrl.requires_review());
        assert!(!TaskType::HoldKey.requires_review());
        assert!(TaskType::DeployLock.requires_tx_hash());
        assert!(!TaskType::DailyCheckin.requires_tx_hash());
    }

    #[test]
    fn config_validation_names_missing_field() {
        let config = TaskConfig::default();
        let err = config.validate_for(TaskType::HoldKey).unwrap_err();
        assert!(err.contains("lock_address"));
        assert!(config.validate_for(TaskType::SubmitText).is_ok());

        let config: TaskConfig = serde_json::from_str(
            r#"{"vendor_address": "0x0000000000000000000000000000000000000001"}"#,
        )
        .unwrap();
        assert!(config.validate_for(TaskType::VendorBuy).is_ok());
    }
}
