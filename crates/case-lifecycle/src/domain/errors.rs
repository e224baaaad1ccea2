//! # Domain Errors
//!
//! Error taxonomy for the case lifecycle, plus the substring classifiers
//! used to interpret collaborator failure text.

use thiserror::Error;

/// Ledger-assigned record key (e.g. `case-1714501234567`).
pub type RecordKey = String;

/// Account or contract identifier, as the ledger renders it.
pub type Address = String;

/// Case lifecycle error types.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No connected account; signed operations require an identity.
    #[error("No connected account")]
    Unauthenticated,

    /// Input rejected before any remote call was made.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The encryption provider failed to produce ciphertext + proof.
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// The signer refused to sign the transaction.
    #[error("Transaction rejected by signer")]
    UserRejected,

    /// Transaction submission failed for a reason other than rejection.
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    /// The transaction was submitted but never confirmed cleanly.
    #[error("Confirmation failed: {0}")]
    ConfirmationFailed(String),

    /// The full snapshot reload failed at the key-list level.
    /// Individual record failures are skipped, not surfaced here.
    #[error("Load failed: {0}")]
    LoadFailed(String),

    /// No record exists under the given key.
    #[error("Record not found: {0}")]
    RecordNotFound(RecordKey),

    /// The verifiable decryption round failed.
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// The same operation (same record key, for decrypt) is already
    /// in flight; nothing was submitted.
    #[error("Operation already in flight")]
    OperationInFlight,
}

/// Does the collaborator failure text indicate the signer refused?
///
/// Wallet surfaces only expose free text for this, so classification is a
/// case-insensitive substring match. Kept in one place so the fragility is
/// contained.
pub fn is_user_rejection(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("user rejected") || lower.contains("user denied")
}

/// Does the collaborator failure text indicate the record was already
/// verified by another party?
pub fn is_already_verified(text: &str) -> bool {
    text.to_lowercase().contains("already verified")
}
