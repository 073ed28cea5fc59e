// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Blockchain integration for Base.
//!
//! This module provides functionality for:
//! - Reading receipts and Unlock key state for quest verification
//! - Submitting delegated EAS attestations from the service wallet
//! - Paying out DG withdrawals (ERC-20 transfers)
//! - Loading the service wallet key

pub mod client;
pub mod eas;
pub mod erc20;
pub mod signing;
pub mod transactions;
pub mod types;
pub mod unlock;
pub mod vendor;

pub use client::{ChainClient, ChainError, ChainReader};
pub use eas::EasSubmitter;
pub use transactions::DgPayout;
pub use types::*;
