//! # Snapshot Invariants
//!
//! Checkable properties of a case snapshot. Used by tests and debug
//! assertions; reload logic is written so these always hold.

use super::entities::Case;
use std::collections::HashSet;

/// Every record key appears at most once in the snapshot.
pub fn invariant_unique_keys(cases: &[Case]) -> bool {
    let mut seen = HashSet::with_capacity(cases.len());
    cases.iter().all(|c| seen.insert(c.key.as_str()))
}

/// An unverified case never advertises a nonzero confirmed cleartext.
pub fn invariant_verified_cleartext(case: &Case) -> bool {
    case.is_verified || case.decrypted_value == 0
}
