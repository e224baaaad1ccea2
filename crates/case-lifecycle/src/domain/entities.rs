//! # Domain Entities
//!
//! `Case` (the client-side view of a registered record) and `RecordData`
//! (the raw read-path payload it is built from).

use super::errors::{Address, RecordKey};
use serde::{Deserialize, Serialize};

/// Raw per-record payload from the ledger read path.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordData {
    /// Display name of the record.
    pub name: String,
    /// Public description (the disease type for case records).
    pub description: String,
    /// First public companion value (cleartext copy of the sensitive field
    /// as submitted; not ledger-verified).
    pub public_value1: u64,
    /// Second public companion value.
    pub public_value2: u64,
    /// Creation time, unix seconds.
    pub timestamp_unix: u64,
    /// Account that created the record.
    pub creator: Address,
    /// True once the sensitive field's decryption has been confirmed
    /// on the ledger.
    pub is_verified: bool,
    /// Ledger-confirmed cleartext; meaningful only when `is_verified`.
    pub decrypted_value: u64,
}

/// A registered case record.
///
/// Invariants:
/// - `key` (and the `id` derived from it) is unique within a snapshot
/// - `is_verified == true` implies `decrypted_value` is the
///   ledger-confirmed cleartext
/// - before verification, `decrypted_value` must not be treated as
///   authoritative even if a local decrypt succeeded
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Case {
    /// Numeric id derived from the ledger-assigned key.
    pub id: u64,
    /// Ledger-assigned record key.
    pub key: RecordKey,
    /// Display name (non-empty).
    pub name: String,
    /// The sensitive field; cleartext trustworthy only once verified.
    pub age_years: u64,
    /// Public disease type.
    pub disease_type: String,
    /// Creation time, unix seconds.
    pub created_at_unix: u64,
    /// Account that created the case.
    pub creator: Address,
    /// First public companion of the encrypted field.
    pub public_aux1: u64,
    /// Second public companion of the encrypted field.
    pub public_aux2: u64,
    /// True once decryption was confirmed on the ledger.
    pub is_verified: bool,
    /// Ledger-confirmed cleartext; meaningful only when `is_verified`.
    pub decrypted_value: u64,
}

impl Case {
    /// Build a case from its ledger key and raw record payload.
    ///
    /// Keys are time-based (`case-{unix_millis}`); the numeric suffix
    /// becomes the id. A key without a numeric suffix gets id 0.
    pub fn from_record(key: &str, data: RecordData) -> Self {
        let id = key
            .rsplit('-')
            .next()
            .and_then(|suffix| suffix.parse().ok())
            .unwrap_or(0);
        Self {
            id,
            key: key.to_string(),
            name: data.name,
            age_years: data.public_value1,
            disease_type: data.description,
            created_at_unix: data.timestamp_unix,
            creator: data.creator,
            public_aux1: data.public_value1,
            public_aux2: data.public_value2,
            is_verified: data.is_verified,
            decrypted_value: data.decrypted_value,
        }
    }

    /// Case-insensitive substring match against name or disease type.
    pub fn matches_search(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.disease_type.to_lowercase().contains(&needle)
    }
}
