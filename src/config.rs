// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the typed [`AppConfig`] loaded
//! from them at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for persistent storage | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate and key for HTTPS | HTTP when unset |
//! | `PRIVY_JWKS_URL` | Privy JWKS endpoint for JWT verification | Required for production |
//! | `PRIVY_ISSUER` | Expected JWT issuer claim | `privy.io` |
//! | `PRIVY_APP_ID` | Expected JWT audience claim | Optional |
//! | `ADMIN_USER_IDS` | Comma-separated admin user ids | empty |
//! | `NETWORK` | `base` or `base-sepolia` | `base-sepolia` |
//! | `RPC_URL` | RPC endpoint override | network default |
//! | `ENABLE_EAS` | Enable on-chain attestations | `false` |
//! | `EAS_GRACEFUL_DEGRADATION` | Global degrade flag | `false` |
//! | `EAS_GRACEFUL_DEGRADATION_<KEY>` | Per-schema-key override | unset |
//! | `EAS_CONTRACT_ADDRESS` | EAS contract override | network predeploy |
//! | `EAS_PREVERIFY_SIGNATURES` | Recover delegated signer before submitting | `false` |
//! | `EAS_DOMAIN_VERSION` | EAS EIP-712 domain version | `1.3.0` |
//! | `SERVICE_WALLET_PRIVATE_KEY` | Hex key of the relay wallet | unset |
//! | `SERVICE_WALLET_KEY_PATH` | PEM key file of the relay wallet | unset |
//! | `DG_TOKEN_ADDRESS` | DG ERC-20 contract | unset (withdrawals off) |
//! | `DG_WITHDRAWAL_MIN_AMOUNT` | Minimum withdrawal in whole DG | `3000` |
//! | `DAILY_CHECKIN_XP` | Ledger credit per daily check-in | `10` |
//! | `TELEGRAM_BOT_TOKEN` | Bot token for broadcasts | unset |
//! | `CSP_REPORT_LIMIT` | CSP reports per client per window | `10` |
//! | `CSP_REPORT_WINDOW_SECS` | Throttle window length | `60` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;

use crate::blockchain::{NetworkConfig, BASE_SEPOLIA};

pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const PRIVY_JWKS_URL_ENV: &str = "PRIVY_JWKS_URL";
pub const PRIVY_ISSUER_ENV: &str = "PRIVY_ISSUER";
pub const PRIVY_APP_ID_ENV: &str = "PRIVY_APP_ID";
pub const ADMIN_USER_IDS_ENV: &str = "ADMIN_USER_IDS";
pub const NETWORK_ENV: &str = "NETWORK";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const ENABLE_EAS_ENV: &str = "ENABLE_EAS";
pub const EAS_DEGRADE_ENV: &str = "EAS_GRACEFUL_DEGRADATION";
pub const EAS_CONTRACT_ADDRESS_ENV: &str = "EAS_CONTRACT_ADDRESS";
pub const EAS_PREVERIFY_ENV: &str = "EAS_PREVERIFY_SIGNATURES";
pub const EAS_DOMAIN_VERSION_ENV: &str = "EAS_DOMAIN_VERSION";
pub const SERVICE_WALLET_KEY_ENV: &str = "SERVICE_WALLET_PRIVATE_KEY";
pub const SERVICE_WALLET_KEY_PATH_ENV: &str = "SERVICE_WALLET_KEY_PATH";
pub const DG_TOKEN_ADDRESS_ENV: &str = "DG_TOKEN_ADDRESS";
pub const DG_WITHDRAWAL_MIN_ENV: &str = "DG_WITHDRAWAL_MIN_AMOUNT";
pub const DAILY_CHECKIN_XP_ENV: &str = "DAILY_CHECKIN_XP";
pub const TELEGRAM_BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const CSP_REPORT_LIMIT_ENV: &str = "CSP_REPORT_LIMIT";
pub const CSP_REPORT_WINDOW_ENV: &str = "CSP_REPORT_WINDOW_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default storage root when `DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Default Privy token issuer.
pub const DEFAULT_PRIVY_ISSUER: &str = "privy.io";

/// Default EIP-712 domain version of the EAS contract.
pub const DEFAULT_EAS_DOMAIN_VERSION: &str = "1.3.0";

const DEFAULT_WITHDRAWAL_MIN: u64 = 3000;
const DEFAULT_CHECKIN_XP: u64 = 10;
const DEFAULT_CSP_LIMIT: u32 = 10;
const DEFAULT_CSP_WINDOW_SECS: u64 = 60;

/// Configuration errors surfaced at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value `{value}`: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// Graceful-degradation policy for attestations.
///
/// The global flag applies to every schema key unless a per-key override
/// is present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DegradePolicy {
    pub global: bool,
    pub per_schema: HashMap<String, bool>,
}

impl DegradePolicy {
    /// Whether failures for `schema_key` should be absorbed.
    pub fn allows(&self, schema_key: &str) -> bool {
        self.per_schema
            .get(&schema_key.to_ascii_lowercase())
            .copied()
            .unwrap_or(self.global)
    }

    pub fn with_override(mut self, schema_key: &str, degrade: bool) -> Self {
        self.per_schema
            .insert(schema_key.to_ascii_lowercase(), degrade);
        self
    }
}

/// Attestation relay settings.
#[derive(Debug, Clone)]
pub struct EasConfig {
    pub enabled: bool,
    pub degrade: DegradePolicy,
    pub contract_address: Address,
    pub preverify_signatures: bool,
    pub domain_version: String,
}

/// Where the relay wallet key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKeySource {
    Hex(String),
    PemFile(PathBuf),
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub tls_cert_path: Option<PathBuf>,
    pub tls_key_path: Option<PathBuf>,
    pub jwks_url: Option<String>,
    pub issuer: String,
    pub app_id: Option<String>,
    pub admin_user_ids: Vec<String>,
    pub network: NetworkConfig,
    pub rpc_url: String,
    pub eas: EasConfig,
    pub service_key: Option<ServiceKeySource>,
    pub dg_token_address: Option<Address>,
    pub withdrawal_min_amount: u64,
    pub daily_checkin_xp: u64,
    pub telegram_bot_token: Option<String>,
    pub csp_report_limit: u32,
    pub csp_report_window: Duration,
    pub log_json: bool,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_lookup(|name| vars.get(name).cloned(), vars.keys().map(String::as_str))
    }

    /// Load configuration from an arbitrary lookup.
    ///
    /// `names` enumerates the available variable names so per-schema degrade
    /// overrides can be discovered.
    pub fn from_lookup<'a, F>(
        lookup: F,
        names: impl Iterator<Item = &'a str>,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let network = match get(NETWORK_ENV).as_deref() {
            None => BASE_SEPOLIA,
            Some(raw) => NetworkConfig::by_slug(raw).ok_or_else(|| ConfigError::InvalidValue {
                name: NETWORK_ENV.to_string(),
                value: raw.to_string(),
                reason: "expected `base` or `base-sepolia`".to_string(),
            })?,
        };

        let mut per_schema = HashMap::new();
        let prefix = format!("{EAS_DEGRADE_ENV}_");
        for name in names {
            if let Some(key) = name.strip_prefix(&prefix) {
                if let Some(raw) = get(name) {
                    per_schema.insert(key.to_ascii_lowercase(), parse_bool(name, &raw)?);
                }
            }
        }

        let eas = EasConfig {
            enabled: parse_flag(&get, ENABLE_EAS_ENV)?,
            degrade: DegradePolicy {
                global: parse_flag(&get, EAS_DEGRADE_ENV)?,
                per_schema,
            },
            contract_address: match get(EAS_CONTRACT_ADDRESS_ENV) {
                Some(raw) => parse_address(EAS_CONTRACT_ADDRESS_ENV, &raw)?,
                None => network.eas_address,
            },
            preverify_signatures: parse_flag(&get, EAS_PREVERIFY_ENV)?,
            domain_version: get(EAS_DOMAIN_VERSION_ENV)
                .unwrap_or_else(|| DEFAULT_EAS_DOMAIN_VERSION.to_string()),
        };

        let service_key = match (get(SERVICE_WALLET_KEY_ENV), get(SERVICE_WALLET_KEY_PATH_ENV)) {
            (Some(hex), _) => Some(ServiceKeySource::Hex(hex)),
            (None, Some(path)) => Some(ServiceKeySource::PemFile(PathBuf::from(path))),
            (None, None) => None,
        };

        let dg_token_address = get(DG_TOKEN_ADDRESS_ENV)
            .map(|raw| parse_address(DG_TOKEN_ADDRESS_ENV, &raw))
            .transpose()?;

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_number(&get, PORT_ENV, 8080)?,
            data_dir: PathBuf::from(get(DATA_DIR_ENV).unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            tls_cert_path: get(TLS_CERT_PATH_ENV).map(PathBuf::from),
            tls_key_path: get(TLS_KEY_PATH_ENV).map(PathBuf::from),
            jwks_url: get(PRIVY_JWKS_URL_ENV),
            issuer: get(PRIVY_ISSUER_ENV).unwrap_or_else(|| DEFAULT_PRIVY_ISSUER.to_string()),
            app_id: get(PRIVY_APP_ID_ENV),
            admin_user_ids: get(ADMIN_USER_IDS_ENV)
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
            rpc_url: get(RPC_URL_ENV).unwrap_or_else(|| network.rpc_url.to_string()),
            network,
            eas,
            service_key,
            dg_token_address,
            withdrawal_min_amount: parse_number(&get, DG_WITHDRAWAL_MIN_ENV, DEFAULT_WITHDRAWAL_MIN)?,
            daily_checkin_xp: parse_number(&get, DAILY_CHECKIN_XP_ENV, DEFAULT_CHECKIN_XP)?,
            telegram_bot_token: get(TELEGRAM_BOT_TOKEN_ENV),
            csp_report_limit: parse_number(&get, CSP_REPORT_LIMIT_ENV, DEFAULT_CSP_LIMIT)?,
            csp_report_window: Duration::from_secs(parse_number(
                &get,
                CSP_REPORT_WINDOW_ENV,
                DEFAULT_CSP_WINDOW_SECS,
            )?),
            log_json: get(LOG_FORMAT_ENV)
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Configuration for tests and local tooling: Base Sepolia, EAS disabled,
    /// everything optional left unset.
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: data_dir.into(),
            tls_cert_path: None,
            tls_key_path: None,
            jwks_url: None,
            issuer: DEFAULT_PRIVY_ISSUER.to_string(),
            app_id: None,
            admin_user_ids: Vec::new(),
            network: BASE_SEPOLIA,
            rpc_url: BASE_SEPOLIA.rpc_url.to_string(),
            eas: EasConfig {
                enabled: false,
                degrade: DegradePolicy::default(),
                contract_address: BASE_SEPOLIA.eas_address,
                preverify_signatures: false,
                domain_version: DEFAULT_EAS_DOMAIN_VERSION.to_string(),
            },
            service_key: None,
            dg_token_address: None,
            withdrawal_min_amount: DEFAULT_WITHDRAWAL_MIN,
            daily_checkin_xp: DEFAULT_CHECKIN_XP,
            telegram_bot_token: None,
            csp_report_limit: DEFAULT_CSP_LIMIT,
            csp_report_window: Duration::from_secs(DEFAULT_CSP_WINDOW_SECS),
            log_json: false,
        }
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_flag<G>(get: &G, name: &'static str) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(name).map_or(Ok(false), |raw| parse_bool(name, &raw))
}

fn parse_number<G, T>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

fn parse_address(name: &str, raw: &str) -> Result<Address, ConfigError> {
    Address::from_str(raw).map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}
