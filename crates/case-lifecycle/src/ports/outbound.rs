//! # Outbound Ports
//!
//! Traits for the external collaborators the orchestrator drives: the
//! remote ledger (read and signed-write paths), the encryption provider,
//! and the decryption verifier.

use crate::domain::{Address, RecordData, RecordKey, RegistryError};
use async_trait::async_trait;
use std::collections::HashMap;

/// Opaque reference to an encrypted value, usable to request decryption.
pub type CiphertextHandle = [u8; 32];

/// Ciphertext plus input proof, bound to (contract, user) at encryption
/// time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedInput {
    /// Opaque encrypted representation of the sensitive integer.
    pub ciphertext: Vec<u8>,
    /// Proof binding the ciphertext to the contract and user.
    pub proof: Vec<u8>,
}

/// Pending signed transaction - outbound port.
///
/// Consumed by awaiting confirmation; a handle is single-use.
#[async_trait]
pub trait TxHandle: Send + std::fmt::Debug {
    /// Wait for the ledger to confirm the transaction.
    async fn await_confirmation(self: Box<Self>) -> Result<(), RegistryError>;
}

/// Read-only ledger access - outbound port.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// All record keys currently known to the contract.
    async fn get_all_record_keys(&self) -> Result<Vec<RecordKey>, RegistryError>;

    /// Raw data for one record.
    async fn get_record_data(&self, key: &str) -> Result<RecordData, RegistryError>;

    /// Ciphertext handle of the record's sensitive field.
    async fn get_encrypted_value_handle(
        &self,
        key: &str,
    ) -> Result<CiphertextHandle, RegistryError>;

    /// Is the ledger endpoint reachable?
    async fn is_service_available(&self) -> bool;

    /// Address of the registry contract.
    fn contract_address(&self) -> Address;
}

/// Signed-write ledger access - outbound port.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Submit a record creation transaction.
    #[allow(clippy::too_many_arguments)]
    async fn create_record(
        &self,
        key: &str,
        name: &str,
        ciphertext: &[u8],
        proof: &[u8],
        public_value1: u64,
        public_value2: u64,
        description: &str,
    ) -> Result<Box<dyn TxHandle>, RegistryError>;

    /// Record a verified cleartext + proof for an existing record.
    async fn submit_verified_decryption(
        &self,
        key: &str,
        clear_value_payload: &[u8],
        proof: &[u8],
    ) -> Result<Box<dyn TxHandle>, RegistryError>;
}

/// Homomorphic encryption provider - outbound port.
#[async_trait]
pub trait EncryptionProvider: Send + Sync {
    /// Encrypt a plaintext integer, bound to the contract and user
    /// addresses.
    async fn encrypt(
        &self,
        contract: &str,
        user: &str,
        plaintext: u64,
    ) -> Result<EncryptedInput, RegistryError>;
}

/// Submission callback handed to the decryption verifier.
///
/// Forwards the verifier's cleartext payload and proof to a signed ledger
/// call that records the verified value.
#[async_trait]
pub trait DecryptionSink: Send + Sync {
    /// Submit the cleartext payload and proof, awaiting confirmation.
    async fn submit(&self, clear_value_payload: &[u8], proof: &[u8]) -> Result<(), RegistryError>;
}

/// Result of a verifiable decryption round.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecryptionOutcome {
    /// Cleartext value per requested handle.
    pub clear_values: HashMap<CiphertextHandle, u64>,
}

/// Verifiable decryption - outbound port.
#[async_trait]
pub trait DecryptionVerifier: Send + Sync {
    /// Decrypt the given handles and push the resulting proof through
    /// `sink`. Sink failures (including an "already verified" revert from
    /// the ledger) propagate out of this call unchanged.
    async fn verify(
        &self,
        handles: &[CiphertextHandle],
        contract: &str,
        sink: &dyn DecryptionSink,
    ) -> Result<DecryptionOutcome, RegistryError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock encryption provider for unit tests.
#[derive(Clone, Debug, Default)]
pub struct MockEncryptionProvider {
    /// Should encryption calls fail?
    pub should_fail: bool,
}

#[async_trait]
impl EncryptionProvider for MockEncryptionProvider {
    async fn encrypt(
        &self,
        _contract: &str,
        _user: &str,
        plaintext: u64,
    ) -> Result<EncryptedInput, RegistryError> {
        if self.should_fail {
            return Err(RegistryError::EncryptionFailed(
                "mock encryption failure".to_string(),
            ));
        }
        Ok(EncryptedInput {
            ciphertext: plaintext.to_le_bytes().to_vec(),
            proof: vec![0xEE; 4],
        })
    }
}
