//! # Ports
//!
//! Inbound API trait consumed by the UI layer, and outbound traits for the
//! external collaborators (ledger, encryption provider, decryption
//! verifier).

pub mod inbound;
pub mod outbound;

pub use inbound::CaseLifecycleApi;
pub use outbound::{
    CiphertextHandle, DecryptionOutcome, DecryptionSink, DecryptionVerifier, EncryptedInput,
    EncryptionProvider, LedgerReader, LedgerWriter, MockEncryptionProvider, TxHandle,
};
