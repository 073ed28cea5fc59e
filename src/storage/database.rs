// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 P2E Inferno

//! Embedded relay database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `attestations`: uid → serialized AttestationRecord
//! - `schema_attestation_index`: (schema_uid|!timestamp|uid) → uid
//! - `recipient_attestation_index`: (recipient|!timestamp|uid) → uid
//! - `verified_txs`: tx_hash → completion id
//! - `balances`: user id → whole DG
//! - `reward_claims`: completion id → `pending` | `credited`
//! - `withdrawals`: EIP-712 digest → serialized WithdrawalRecord
//! - `user_withdrawal_index`: (user_id|!timestamp|digest) → digest
//! - `retired_schemas`: schema uid → retirement unix time
//! - `wallet_owners`: lowercase address → user id

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;

use super::records::{AttestationRecord, WithdrawalRecord, WithdrawalStatus};

// =============================================================================
// Table Definitions
// =============================================================================

const ATTESTATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("attestations");

const SCHEMA_ATTESTATION_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("schema_attestation_index");

const RECIPIENT_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("recipient_attestation_index");

const VERIFIED_TXS: TableDefinition<&str, &str> = TableDefinition::new("verified_txs");

const BALANCES: TableDefinition<&str, u64> = TableDefinition::new("balances");

const REWARD_CLAIMS: TableDefinition<&str, &str> = TableDefinition::new("reward_claims");

const RETIRED_SCHEMAS: TableDefinition<&str, i64> = TableDefinition::new("retired_schemas");

const CLAIM_PENDING: &str = "pending";
const CLAIM_CREDITED: &str = "credited";

const WITHDRAWALS: TableDefinition<&str, &[u8]> = TableDefinition::new("withdrawals");

const USER_WITHDRAWAL_INDEX: TableDefinition<&[u8], &str> =
    TableDefinition::new("user_withdrawal_index");

const WALLET_OWNERS: TableDefinition<&str, &str> = TableDefinition::new("wallet_owners");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("insufficient balance: {available} available, {requested} requested")]
    InsufficientBalance { available: u64, requested: u64 },
}

pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Index Key Helpers
// =============================================================================

/// Composite key `owner | inverted_timestamp_be | id`.
///
/// The inverted timestamp gives newest-first ordering on a forward scan.
fn make_index_key(owner: &str, timestamp: i64, id: &str) -> Vec<u8> {
    let owner = owner.to_lowercase();
    let mut key = Vec::with_capacity(owner.len() + 1 + 8 + 1 + id.len());
    key.extend_from_slice(owner.as_bytes());
    key.push(b'|');
    key.extend_from_slice(&(!timestamp as u64).to_be_bytes());
    key.push(b'|');
    key.extend_from_slice(id.as_bytes());
    key
}

fn make_prefix(owner: &str) -> Vec<u8> {
    let owner = owner.to_lowercase();
    let mut prefix = Vec::with_capacity(owner.len() + 1);
    prefix.extend_from_slice(owner.as_bytes());
    prefix.push(b'|');
    prefix
}

/// Upper bound for a prefix scan.
fn make_prefix_end(owner: &str) -> Vec<u8> {
    let mut end = make_prefix(owner);
    end.extend_from_slice(&[0xFF; 20]);
    end
}

/// One page of a listing plus the cursor of the next page.
pub type Page<T> = (Vec<T>, Option<String>);

// =============================================================================
// RelayDatabase
// =============================================================================

/// Embedded ACID database for relay state that needs atomic updates.
pub struct RelayDatabase {
    db: Database,
}

impl RelayDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(ATTESTATIONS)?;
            let _ = write_txn.open_table(SCHEMA_ATTESTATION_INDEX)?;
            let _ = write_txn.open_table(RECIPIENT_INDEX)?;
            let _ = write_txn.open_table(VERIFIED_TXS)?;
            let _ = write_txn.open_table(BALANCES)?;
            let _ = write_txn.open_table(REWARD_CLAIMS)?;
            let _ = write_txn.open_table(RETIRED_SCHEMAS)?;
            let _ = write_txn.open_table(WITHDRAWALS)?;
            let _ = write_txn.open_table(USER_WITHDRAWAL_INDEX)?;
            let _ = write_txn.open_table(WALLET_OWNERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Cheap read used by the readiness probe.
    pub fn health_check(&self) -> DbResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(BALANCES)?;
        Ok(())
    }

    // =========================================================================
    // Attestation records
    // =========================================================================

    /// Store a submitted attestation and index it by schema and recipient.
    pub fn insert_attestation(&self, record: &AttestationRecord) -> DbResult<()> {
        let json = serde_json::to_vec(record)?;
        let timestamp = record.created_at.timestamp();

        let write_txn = self.db.begin_write()?;
        {
            let retired = write_txn.open_table(RETIRED_SCHEMAS)?;
            if retired.get(record.schema_uid.to_lowercase().as_str())?.is_some() {
                return Err(DbError::Conflict(format!(
                    "Schema {} has been deleted",
                    record.schema_uid
                )));
            }

            let mut table = write_txn.open_table(ATTESTATIONS)?;
            if table.get(record.uid.as_str())?.is_some() {
                return Err(DbError::Conflict(format!("Attestation {}", record.uid)));
            }
            table.insert(record.uid.as_str(), json.as_slice())?;

            let mut by_schema = write_txn.open_table(SCHEMA_ATTESTATION_INDEX)?;
            let key = make_index_key(&record.schema_uid, timestamp, &record.uid);
            by_schema.insert(key.as_slice(), record.uid.as_str())?;

            let mut by_recipient = write_txn.open_table(RECIPIENT_INDEX)?;
            let key = make_index_key(&record.recipient, timestamp, &record.uid);
            by_recipient.insert(key.as_slice(), record.uid.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Look up an attestation record by uid.
    pub fn get_attestation(&self, uid: &str) -> DbResult<Option<AttestationRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ATTESTATIONS)?;
        match table.get(uid)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Newest-first attestations for a recipient address.
    pub fn list_attestations_by_recipient(
        &self,
        recipient: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> DbResult<Page<AttestationRecord>> {
        self.scan_index(RECIPIENT_INDEX, ATTESTATIONS, recipient, cursor, limit)
    }

    /// Whether any attestation references `schema_uid` (delete guard).
    pub fn schema_has_attestations(&self, schema_uid: &str) -> DbResult<bool> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(SCHEMA_ATTESTATION_INDEX)?;
        let start = make_prefix(schema_uid);
        let end = make_prefix_end(schema_uid);
        let mut range = index.range(start.as_slice()..end.as_slice())?;
        Ok(range.next().transpose()?.is_some())
    }

    /// Retire `schema_uid` unless an attestation references it.
    ///
    /// The check and the retirement share one write transaction, and
    /// [`insert_attestation`](Self::insert_attestation) refuses retired
    /// schemas, so no record can land under a deleted schema.
    pub fn retire_schema(&self, schema_uid: &str) -> DbResult<()> {
        let start = make_prefix(schema_uid);
        let end = make_prefix_end(schema_uid);
        let write_txn = self.db.begin_write()?;
        {
            let index = write_txn.open_table(SCHEMA_ATTESTATION_INDEX)?;
            let mut range = index.range(start.as_slice()..end.as_slice())?;
            if range.next().transpose()?.is_some() {
                return Err(DbError::Conflict(format!(
                    "Schema {schema_uid} is referenced by attestations"
                )));
            }
            drop(range);

            let mut retired = write_txn.open_table(RETIRED_SCHEMAS)?;
            retired.insert(schema_uid.to_lowercase().as_str(), chrono::Utc::now().timestamp())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Allow `schema_uid` again after it was re-registered.
    pub fn restore_schema(&self, schema_uid: &str) -> DbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut retired = write_txn.open_table(RETIRED_SCHEMAS)?;
            retired.remove(schema_uid.to_lowercase().as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    // =========================================================================
    // Verified transactions
    // =========================================================================

    /// Bind a transaction hash to the completion it verified.
    ///
    /// Fails with `Conflict` if the hash already verified something.
    pub fn claim_tx_hash(&self, tx_hash: &str, completion_id: &str) -> DbResult<()> {
        let key = tx_hash.to_lowercase();
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(VERIFIED_TXS)?;
            if let Some(existing) = table.get(key.as_str())? {
                if existing.value() != completion_id {
                    return Err(DbError::Conflict(format!(
                        "Transaction {tx_hash} was already used"
                    )));
                }
            }
            table.insert(key.as_str(), completion_id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Completion id that used `tx_hash`, if any.
    pub fn tx_hash_owner(&self, tx_hash: &str) -> DbResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(VERIFIED_TXS)?;
        Ok(table
            .get(tx_hash.to_lowercase().as_str())?
            .map(|v| v.value().to_string()))
    }

    // =========================================================================
    // Reward ledger
    // =========================================================================

    /// Current balance in whole DG.
    pub fn balance(&self, user_id: &str) -> DbResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BALANCES)?;
        Ok(table.get(user_id)?.map(|v| v.value()).unwrap_or(0))
    }

    /// Add `amount` to a balance and return the new balance.
    pub fn credit(&self, user_id: &str, amount: u64) -> DbResult<u64> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(BALANCES)?;
            let current = table.get(user_id)?.map(|v| v.value()).unwrap_or(0);
            let updated = current.saturating_add(amount);
            table.insert(user_id, updated)?;
            updated
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Reserve the reward of a completion before anything is relayed.
    ///
    /// `Conflict` if the reward is already reserved or credited.
    pub fn reserve_reward(&self, completion_id: &str) -> DbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(REWARD_CLAIMS)?;
            if table.get(completion_id)?.is_some() {
                return Err(DbError::Conflict("Reward already claimed".to_string()));
            }
            table.insert(completion_id, CLAIM_PENDING)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Drop a pending reservation so the claim can be retried.
    pub fn release_reward(&self, completion_id: &str) -> DbResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(REWARD_CLAIMS)?;
            let pending = table
                .get(completion_id)?
                .is_some_and(|v| v.value() == CLAIM_PENDING);
            if pending {
                table.remove(completion_id)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Mark a reserved reward credited and add it to the balance.
    ///
    /// Returns the new balance. `Conflict` unless the reward is pending.
    pub fn settle_reward(&self, completion_id: &str, user_id: &str, amount: u64) -> DbResult<u64> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut claims = write_txn.open_table(REWARD_CLAIMS)?;
            let pending = claims
                .get(completion_id)?
                .is_some_and(|v| v.value() == CLAIM_PENDING);
            if !pending {
                return Err(DbError::Conflict(format!(
                    "Reward for {completion_id} is not reserved"
                )));
            }
            claims.insert(completion_id, CLAIM_CREDITED)?;

            let mut balances = write_txn.open_table(BALANCES)?;
            let current = balances.get(user_id)?.map(|v| v.value()).unwrap_or(0);
            let updated = current.saturating_add(amount);
            balances.insert(user_id, updated)?;
            updated
        };
        write_txn.commit()?;
        Ok(updated)
    }

    // =========================================================================
    // Withdrawals
    // =========================================================================

    /// Debit the balance and persist a pending withdrawal in one transaction.
    ///
    /// `Conflict` if the typed-data digest was seen before,
    /// `InsufficientBalance` if the ledger cannot cover the amount.
    pub fn begin_withdrawal(&self, record: &WithdrawalRecord) -> DbResult<u64> {
        let json = serde_json::to_vec(record)?;
        let timestamp = record.created_at.timestamp();

        let write_txn = self.db.begin_write()?;
        let remaining = {
            let mut withdrawals = write_txn.open_table(WITHDRAWALS)?;
            if withdrawals.get(record.id.as_str())?.is_some() {
                return Err(DbError::Conflict(
                    "Withdrawal signature has already been used".to_string(),
                ));
            }

            let mut balances = write_txn.open_table(BALANCES)?;
            let available = balances
                .get(record.user_id.as_str())?
                .map(|v| v.value())
                .unwrap_or(0);
            if available < record.amount {
                return Err(DbError::InsufficientBalance {
                    available,
                    requested: record.amount,
                });
            }
            let remaining = available - record.amount;
            balances.insert(record.user_id.as_str(), remaining)?;

            withdrawals.insert(record.id.as_str(), json.as_slice())?;

            let mut index = write_txn.open_table(USER_WITHDRAWAL_INDEX)?;
            let key = make_index_key(&record.user_id, timestamp, &record.id);
            index.insert(key.as_slice(), record.id.as_str())?;
            remaining
        };
        write_txn.commit()?;
        Ok(remaining)
    }

    /// Mark a pending withdrawal as paid out.
    pub fn complete_withdrawal(&self, id: &str, tx_hash: &str) -> DbResult<WithdrawalRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut table = write_txn.open_table(WITHDRAWALS)?;
            let mut record = read_withdrawal(&table, id)?;
            record.status = WithdrawalStatus::Completed;
            record.tx_hash = Some(tx_hash.to_string());
            record.updated_at = chrono::Utc::now();

            let json = serde_json::to_vec(&record)?;
            table.insert(id, json.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Refund a pending withdrawal and mark it failed.
    pub fn fail_withdrawal(&self, id: &str, error: &str) -> DbResult<WithdrawalRecord> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut table = write_txn.open_table(WITHDRAWALS)?;
            let mut record = read_withdrawal(&table, id)?;
            if record.status != WithdrawalStatus::Pending {
                return Err(DbError::Conflict(format!("Withdrawal {id} is not pending")));
            }

            let mut balances = write_txn.open_table(BALANCES)?;
            let current = balances
                .get(record.user_id.as_str())?
                .map(|v| v.value())
                .unwrap_or(0);
            balances.insert(record.user_id.as_str(), current.saturating_add(record.amount))?;

            record.status = WithdrawalStatus::Failed;
            record.error = Some(error.to_string());
            record.updated_at = chrono::Utc::now();

            let json = serde_json::to_vec(&record)?;
            table.insert(id, json.as_slice())?;
            record
        };
        write_txn.commit()?;
        Ok(record)
    }

    /// Newest-first withdrawals of a user.
    pub fn list_withdrawals(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> DbResult<Page<WithdrawalRecord>> {
        self.scan_index(USER_WITHDRAWAL_INDEX, WITHDRAWALS, user_id, cursor, limit)
    }

    // =========================================================================
    // Wallet ownership
    // =========================================================================

    /// Record that `address` belongs to `user_id`.
    ///
    /// Idempotent for the same user; `Conflict` if another user owns it.
    pub fn link_wallet(&self, address: &str, user_id: &str) -> DbResult<()> {
        let addr = address.to_lowercase();
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(WALLET_OWNERS)?;
            if let Some(owner) = table.get(addr.as_str())? {
                if owner.value() != user_id {
                    return Err(DbError::Conflict(format!(
                        "Wallet {address} is linked to another account"
                    )));
                }
            }
            table.insert(addr.as_str(), user_id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Account that linked `address`, if any.
    pub fn wallet_owner(&self, address: &str) -> DbResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(WALLET_OWNERS)?;
        Ok(table
            .get(address.to_lowercase().as_str())?
            .map(|v| v.value().to_string()))
    }

    // =========================================================================
    // Shared scan
    // =========================================================================

    fn scan_index<T: DeserializeOwned>(
        &self,
        index: TableDefinition<'static, &'static [u8], &'static str>,
        primary: TableDefinition<'static, &'static str, &'static [u8]>,
        owner: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> DbResult<Page<T>> {
        let read_txn = self.db.begin_read()?;
        let idx_table = read_txn.open_table(index)?;
        let table = read_txn.open_table(primary)?;

        let prefix = make_prefix(owner);
        let prefix_end = make_prefix_end(owner);

        let start = cursor
            .and_then(decode_cursor)
            .filter(|key| key.starts_with(&prefix))
            .unwrap_or_else(|| prefix.clone());
        let mut skip_first = start != prefix;

        let mut results = Vec::with_capacity(limit);
        let mut last_key: Option<Vec<u8>> = None;

        for entry in idx_table.range(start.as_slice()..prefix_end.as_slice())? {
            let (key, id) = entry?;

            // Skip the cursor entry itself
            if skip_first {
                skip_first = false;
                continue;
            }

            if let Some(value) = table.get(id.value())? {
                results.push(serde_json::from_slice(value.value())?);
                last_key = Some(key.value().to_vec());
            }

            if results.len() >= limit {
                break;
            }
        }

        let next_cursor = if results.len() >= limit {
            last_key.map(|k| encode_cursor(&k))
        } else {
            None
        };

        Ok((results, next_cursor))
    }
}

fn read_withdrawal(
    table: &redb::Table<'_, &'static str, &'static [u8]>,
    id: &str,
) -> DbResult<WithdrawalRecord> {
    let bytes = table
        .get(id)?
        .ok_or_else(|| DbError::NotFound(format!("Withdrawal {id}")))?
        .value()
        .to_vec();
    Ok(serde_json::from_slice(&bytes)?)
}

// =============================================================================
// Cursor Encoding
// =============================================================================

fn encode_cursor(key: &[u8]) -> String {
    alloy::hex::encode(key)
}

fn decode_cursor(cursor: &str) -> Option<Vec<u8>> {
    alloy::hex::decode(cursor).ok()
}

// =============================================================================
// Tests
// =============================================================================
