//! # Inbound Port
//!
//! API trait defining what the surrounding UI layer can do: the three
//! lifecycle operations plus read-only access to the observable state
//! (snapshot, status banner, activity log).

use crate::domain::{Address, Case, CaseStats, RegistryError, StatusBanner};
use async_trait::async_trait;
use std::sync::Arc;

/// Case lifecycle API - inbound port.
#[async_trait]
pub trait CaseLifecycleApi: Send + Sync {
    /// Create a case with an encrypted age field.
    ///
    /// `age` is accepted as text (it arrives from a form field) and must
    /// parse to a non-negative integer.
    async fn create(
        &self,
        name: &str,
        age: &str,
        disease_type: &str,
    ) -> Result<(), RegistryError>;

    /// Reload the full case snapshot from the ledger.
    ///
    /// Silent no-op when no account is connected.
    async fn reload(&self) -> Result<(), RegistryError>;

    /// Decrypt a case's sensitive field through the verifiable protocol.
    ///
    /// Returns `Some(value)` when a cleartext was obtained in this call,
    /// `None` when another party verified the record first (the stored
    /// value should be presented instead).
    async fn decrypt(&self, case_key: &str) -> Result<Option<u64>, RegistryError>;

    /// Current case snapshot, atomically replaced on reload.
    fn snapshot(&self) -> Arc<Vec<Case>>;

    /// Current status banner.
    fn status(&self) -> StatusBanner;

    /// Recent activity, newest first.
    fn activity(&self) -> Vec<String>;

    /// Aggregate statistics over the current snapshot.
    fn stats(&self) -> CaseStats;

    /// The connected account, if any.
    fn account(&self) -> Option<Address>;

    /// Is the ledger endpoint reachable?
    async fn is_service_available(&self) -> bool;
}
