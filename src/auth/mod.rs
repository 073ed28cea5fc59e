// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! # Authentication Module
//!
//! Privy access-token authentication for the relay API.
//!
//! ## Auth Flow
//!
//! 1. Frontend authenticates the user with Privy
//! 2. Frontend sends `Authorization: Bearer <Privy access token>`
//! 3. Server:
//!    - Fetches the Privy JWKS via HTTPS
//!    - Verifies JWT signature (ES256), expiry, issuer, audience (app id)
//!    - Extracts `sub` → canonical `user_id`
//!    - Grants `Admin` when `user_id` is listed in `ADMIN_USER_IDS`
//!
//! ## Security
//!
//! - Only health, quest listing and the CSP sink are public
//! - JWKS is cached with TTL
//! - Clock skew tolerance is 60 seconds

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod roles;

pub use claims::AuthenticatedUser;
pub use error::AuthError;
pub use extractor::{AdminOnly, Auth};
pub use jwks::JwksManager;
pub use roles::Role;
