// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! P2E Inferno - Attestation & Verification Relay
//!
//! Backend service for the P2E Inferno education platform. Users complete
//! quest tasks, check in daily and claim DG rewards; every milestone is
//! recorded as an Ethereum Attestation Service attestation that the user
//! signs and the service wallet submits, so users never pay gas.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `attestation` - Delegated EAS signatures and the gasless relay pipeline
//! - `auth` - Authentication and authorization (Privy JWT)
//! - `blockchain` - Base chain integration (EAS, Unlock, DG vendor, ERC-20)
//! - `notifications` - Telegram broadcasts
//! - `quests` - Task types and verification strategies
//! - `security` - CSP report throttling
//! - `storage` - JSON document store and embedded database
//! - `withdrawal` - EIP-712 DG withdrawals

pub mod api;
pub mod attestation;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod notifications;
pub mod quests;
pub mod security;
pub mod state;
pub mod storage;
pub mod withdrawal;
