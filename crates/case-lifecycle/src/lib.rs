//! # Case Lifecycle
//!
//! Client-side orchestration for a ledger-backed registry of
//! privacy-sensitive case records.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Each case carries one sensitive integer field that is submitted to the
//! ledger in encrypted form and later selectively decrypted through a
//! verifiable protocol. This crate sequences the failure-prone steps of
//! that lifecycle:
//!
//! - local encryption of the sensitive field
//! - signed submission and confirmation wait
//! - verifiable decryption with on-ledger proof recording
//! - full-snapshot reloads that never expose partial state
//!
//! ## Module Structure
//!
//! ```text
//! case-lifecycle/
//! ├── domain/          # Core types: Case, StatusBanner, ActivityLog, errors
//! ├── algorithms/      # Pure derived views: filtering, aggregate stats
//! ├── ports/           # API trait (inbound) + collaborator traits (outbound)
//! ├── application/     # CaseStore + CaseLifecycleService orchestrating everything
//! ├── adapters/        # In-memory ledger / encryption / verifier for offline use
//! └── config.rs        # LifecycleConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{HashEncryptionProvider, InMemoryLedger, LocalDecryptionVerifier};
pub use algorithms::{compute_stats, filter_cases, RECENT_WINDOW_SECS};
pub use application::{CaseLifecycleService, CaseStore};
pub use config::LifecycleConfig;
pub use domain::{
    is_already_verified, is_user_rejection, ActivityLog, Address, Case, CaseFilter, CaseStats,
    RecordData, RecordKey, RegistryError, StatusBanner, StatusPhase, VerificationFilter,
    ACTIVITY_LOG_CAPACITY,
};
pub use ports::{
    CaseLifecycleApi, CiphertextHandle, DecryptionOutcome, DecryptionSink, DecryptionVerifier,
    EncryptedInput, EncryptionProvider, LedgerReader, LedgerWriter, TxHandle,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
