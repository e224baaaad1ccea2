//! # In-Memory Collaborators
//!
//! Full offline simulation of the external collaborators: a ledger holding
//! records in a map, an encryption provider deriving deterministic
//! ciphertexts, and a decryption verifier that resolves handles against
//! the ledger's stored ciphertexts.
//!
//! Simulation convention: a ciphertext is `plaintext (8 bytes LE) || sha256
//! tag`, and a handle is `sha256(contract || key)`. The verifier recovers
//! the plaintext from the stored ciphertext prefix; nothing here is
//! cryptography, it only preserves the shape of the real protocol.
//!
//! Failure injection toggles cover every error path the orchestrator
//! classifies: signer rejection, submission failure, confirmation failure,
//! key-list failure, and per-record fetch failure.

use crate::domain::{Address, RecordData, RecordKey, RegistryError};
use crate::ports::{
    CiphertextHandle, DecryptionOutcome, DecryptionSink, DecryptionVerifier, EncryptedInput,
    EncryptionProvider, LedgerReader, LedgerWriter, TxHandle,
};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Clone)]
struct StoredRecord {
    data: RecordData,
    ciphertext: Vec<u8>,
    handle: CiphertextHandle,
}

/// In-memory ledger implementing both the read and signed-write ports.
pub struct InMemoryLedger {
    contract: Address,
    signer: Mutex<Address>,
    records: Mutex<BTreeMap<RecordKey, StoredRecord>>,
    failing_records: Mutex<HashSet<RecordKey>>,
    fail_key_list: AtomicBool,
    reject_signature: AtomicBool,
    fail_submission: AtomicBool,
    fail_confirmation: AtomicBool,
    available: AtomicBool,
    latency_ms: AtomicU64,
    key_list_fetches: AtomicU64,
    creates_submitted: AtomicU64,
    decrypt_submissions: AtomicU64,
}

impl InMemoryLedger {
    /// Create an empty ledger for the given contract address.
    pub fn new(contract: impl Into<Address>) -> Self {
        Self {
            contract: contract.into(),
            signer: Mutex::new("0xsigner".to_string()),
            records: Mutex::new(BTreeMap::new()),
            failing_records: Mutex::new(HashSet::new()),
            fail_key_list: AtomicBool::new(false),
            reject_signature: AtomicBool::new(false),
            fail_submission: AtomicBool::new(false),
            fail_confirmation: AtomicBool::new(false),
            available: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
            key_list_fetches: AtomicU64::new(0),
            creates_submitted: AtomicU64::new(0),
            decrypt_submissions: AtomicU64::new(0),
        }
    }

    /// Insert a record directly, bypassing the signed path.
    #[allow(clippy::too_many_arguments)]
    pub fn seed_record(
        &self,
        key: &str,
        name: &str,
        disease: &str,
        age: u64,
        created_at_unix: u64,
        creator: &str,
        verified: bool,
    ) {
        let ciphertext = simulated_ciphertext(&self.contract, creator, age);
        let handle = derive_handle(&self.contract, key);
        let record = StoredRecord {
            data: RecordData {
                name: name.to_string(),
                description: disease.to_string(),
                public_value1: age,
                public_value2: 0,
                timestamp_unix: created_at_unix,
                creator: creator.to_string(),
                is_verified: verified,
                decrypted_value: if verified { age } else { 0 },
            },
            ciphertext,
            handle,
        };
        self.records
            .lock()
            .expect("ledger lock poisoned")
            .insert(key.to_string(), record);
    }

    /// Make reads of one record fail until cleared.
    pub fn fail_record(&self, key: &str) {
        self.failing_records
            .lock()
            .expect("ledger lock poisoned")
            .insert(key.to_string());
    }

    /// Make the key-list fetch fail.
    pub fn set_fail_key_list(&self, fail: bool) {
        self.fail_key_list.store(fail, Ordering::SeqCst);
    }

    /// Simulate the signer refusing every transaction.
    pub fn set_reject_signature(&self, reject: bool) {
        self.reject_signature.store(reject, Ordering::SeqCst);
    }

    /// Make transaction submission fail (not a rejection).
    pub fn set_fail_submission(&self, fail: bool) {
        self.fail_submission.store(fail, Ordering::SeqCst);
    }

    /// Make confirmation of submitted transactions fail.
    pub fn set_fail_confirmation(&self, fail: bool) {
        self.fail_confirmation.store(fail, Ordering::SeqCst);
    }

    /// Toggle simulated endpoint availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Add artificial latency to every call, to exercise interleavings.
    pub fn set_latency_ms(&self, ms: u64) {
        self.latency_ms.store(ms, Ordering::SeqCst);
    }

    /// How many times the key list was fetched.
    pub fn key_list_fetch_count(&self) -> u64 {
        self.key_list_fetches.load(Ordering::SeqCst)
    }

    /// How many creation transactions were accepted for submission.
    pub fn create_count(&self) -> u64 {
        self.creates_submitted.load(Ordering::SeqCst)
    }

    /// How many verified-decryption submissions were accepted.
    pub fn decrypt_submission_count(&self) -> u64 {
        self.decrypt_submissions.load(Ordering::SeqCst)
    }

    /// Recover the simulated plaintext behind a handle, if any record
    /// carries it.
    pub fn plaintext_for_handle(&self, handle: &CiphertextHandle) -> Option<u64> {
        let records = self.records.lock().expect("ledger lock poisoned");
        records.values().find(|r| &r.handle == handle).and_then(|r| {
            let prefix: [u8; 8] = r.ciphertext.get(..8)?.try_into().ok()?;
            Some(u64::from_le_bytes(prefix))
        })
    }

    async fn simulate_latency(&self) {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn confirmation(&self) -> Box<dyn TxHandle> {
        let result = if self.fail_confirmation.load(Ordering::SeqCst) {
            Err(RegistryError::ConfirmationFailed(
                "transaction reverted".to_string(),
            ))
        } else {
            Ok(())
        };
        Box::new(InstantTx {
            result,
            latency: Duration::from_millis(self.latency_ms.load(Ordering::SeqCst)),
        })
    }
}

/// Transaction handle that resolves after a fixed simulated delay.
#[derive(Debug)]
struct InstantTx {
    result: Result<(), RegistryError>,
    latency: Duration,
}

#[async_trait]
impl TxHandle for InstantTx {
    async fn await_confirmation(self: Box<Self>) -> Result<(), RegistryError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.result
    }
}

#[async_trait]
impl LedgerReader for InMemoryLedger {
    async fn get_all_record_keys(&self) -> Result<Vec<RecordKey>, RegistryError> {
        self.simulate_latency().await;
        self.key_list_fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_key_list.load(Ordering::SeqCst) {
            return Err(RegistryError::LoadFailed(
                "key list fetch failed".to_string(),
            ));
        }
        let records = self.records.lock().expect("ledger lock poisoned");
        Ok(records.keys().cloned().collect())
    }

    async fn get_record_data(&self, key: &str) -> Result<RecordData, RegistryError> {
        self.simulate_latency().await;
        if self
            .failing_records
            .lock()
            .expect("ledger lock poisoned")
            .contains(key)
        {
            return Err(RegistryError::LoadFailed(format!(
                "record fetch failed for {key}"
            )));
        }
        let records = self.records.lock().expect("ledger lock poisoned");
        records
            .get(key)
            .map(|r| r.data.clone())
            .ok_or_else(|| RegistryError::RecordNotFound(key.to_string()))
    }

    async fn get_encrypted_value_handle(
        &self,
        key: &str,
    ) -> Result<CiphertextHandle, RegistryError> {
        self.simulate_latency().await;
        let records = self.records.lock().expect("ledger lock poisoned");
        records
            .get(key)
            .map(|r| r.handle)
            .ok_or_else(|| RegistryError::RecordNotFound(key.to_string()))
    }

    async fn is_service_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn contract_address(&self) -> Address {
        self.contract.clone()
    }
}

#[async_trait]
impl LedgerWriter for InMemoryLedger {
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
    ) -> Result<Box<dyn TxHandle>, RegistryError> {
        self.simulate_latency().await;
        if self.reject_signature.load(Ordering::SeqCst) {
            return Err(RegistryError::SubmissionFailed(
                "user rejected transaction signature".to_string(),
            ));
        }
        if self.fail_submission.load(Ordering::SeqCst) {
            return Err(RegistryError::SubmissionFailed(
                "rpc error: insufficient funds".to_string(),
            ));
        }
        if proof.is_empty() {
            return Err(RegistryError::SubmissionFailed(
                "invalid input proof".to_string(),
            ));
        }
        let signer = self.signer.lock().expect("ledger lock poisoned").clone();
        let record = StoredRecord {
            data: RecordData {
                name: name.to_string(),
                description: description.to_string(),
                public_value1,
                public_value2,
                timestamp_unix: unix_now(),
                creator: signer,
                is_verified: false,
                decrypted_value: 0,
            },
            ciphertext: ciphertext.to_vec(),
            handle: derive_handle(&self.contract, key),
        };
        {
            let mut records = self.records.lock().expect("ledger lock poisoned");
            if records.contains_key(key) {
                return Err(RegistryError::SubmissionFailed(format!(
                    "record key already exists: {key}"
                )));
            }
            records.insert(key.to_string(), record);
        }
        self.creates_submitted.fetch_add(1, Ordering::SeqCst);
        Ok(self.confirmation())
    }

    async fn submit_verified_decryption(
        &self,
        key: &str,
        clear_value_payload: &[u8],
        proof: &[u8],
    ) -> Result<Box<dyn TxHandle>, RegistryError> {
        self.simulate_latency().await;
        if self.reject_signature.load(Ordering::SeqCst) {
            return Err(RegistryError::SubmissionFailed(
                "user rejected transaction signature".to_string(),
            ));
        }
        if proof.is_empty() {
            return Err(RegistryError::SubmissionFailed(
                "invalid decryption proof".to_string(),
            ));
        }
        let value = clear_value_payload
            .get(..8)
            .and_then(|b| <[u8; 8]>::try_from(b).ok())
            .map(u64::from_le_bytes)
            .ok_or_else(|| {
                RegistryError::SubmissionFailed("malformed cleartext payload".to_string())
            })?;
        {
            let mut records = self.records.lock().expect("ledger lock poisoned");
            let record = records
                .get_mut(key)
                .ok_or_else(|| RegistryError::RecordNotFound(key.to_string()))?;
            if record.data.is_verified {
                return Err(RegistryError::SubmissionFailed(
                    "execution reverted: already verified".to_string(),
                ));
            }
            record.data.is_verified = true;
            record.data.decrypted_value = value;
        }
        self.decrypt_submissions.fetch_add(1, Ordering::SeqCst);
        Ok(self.confirmation())
    }
}

/// Deterministic encryption provider for the offline simulation.
#[derive(Clone, Debug, Default)]
pub struct HashEncryptionProvider;

#[async_trait]
impl EncryptionProvider for HashEncryptionProvider {
    async fn encrypt(
        &self,
        contract: &str,
        user: &str,
        plaintext: u64,
    ) -> Result<EncryptedInput, RegistryError> {
        let ciphertext = simulated_ciphertext(contract, user, plaintext);
        let proof = Sha256::digest(&ciphertext).to_vec();
        Ok(EncryptedInput { ciphertext, proof })
    }
}

/// Decryption verifier resolving handles against the in-memory ledger.
pub struct LocalDecryptionVerifier {
    ledger: Arc<InMemoryLedger>,
    /// Should verification rounds fail outright?
    pub should_fail: bool,
}

impl LocalDecryptionVerifier {
    /// Verifier over the given ledger.
    pub fn new(ledger: Arc<InMemoryLedger>) -> Self {
        Self {
            ledger,
            should_fail: false,
        }
    }
}

#[async_trait]
impl DecryptionVerifier for LocalDecryptionVerifier {
    async fn verify(
        &self,
        handles: &[CiphertextHandle],
        _contract: &str,
        sink: &dyn DecryptionSink,
    ) -> Result<DecryptionOutcome, RegistryError> {
        if self.should_fail {
            return Err(RegistryError::DecryptionFailed(
                "verifier offline".to_string(),
            ));
        }
        let mut outcome = DecryptionOutcome::default();
        let mut payload = Vec::with_capacity(handles.len() * 8);
        for handle in handles {
            let value = self.ledger.plaintext_for_handle(handle).ok_or_else(|| {
                RegistryError::DecryptionFailed("unknown ciphertext handle".to_string())
            })?;
            payload.extend_from_slice(&value.to_le_bytes());
            outcome.clear_values.insert(*handle, value);
        }
        let proof = Sha256::digest(&payload).to_vec();
        // Sink failures (including "already verified" reverts) propagate
        // unchanged so the orchestrator can classify them.
        sink.submit(&payload, &proof).await?;
        Ok(outcome)
    }
}

fn simulated_ciphertext(contract: &str, user: &str, plaintext: u64) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(contract.as_bytes());
    hasher.update(user.as_bytes());
    hasher.update(plaintext.to_le_bytes());
    let mut ciphertext = plaintext.to_le_bytes().to_vec();
    ciphertext.extend_from_slice(&hasher.finalize());
    ciphertext
}

fn derive_handle(contract: &str, key: &str) -> CiphertextHandle {
    let mut hasher = Sha256::new();
    hasher.update(contract.as_bytes());
    hasher.update(key.as_bytes());
    hasher.finalize().into()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
