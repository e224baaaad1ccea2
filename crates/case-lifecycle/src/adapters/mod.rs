//! # Adapters
//!
//! Offline implementations of the outbound ports: an in-memory ledger with
//! failure injection, plus deterministic encryption and decryption
//! collaborators. Used by the test suite and by embedders that need the
//! full lifecycle without a network.

pub mod in_memory;

pub use in_memory::{HashEncryptionProvider, InMemoryLedger, LocalDecryptionVerifier};
