//! # Case Lifecycle Service
//!
//! Application service orchestrating the encrypted case lifecycle:
//! create (encrypt, submit, confirm, reload), reload, and verifiable
//! decrypt. Owns the UI-facing state (status banner, activity log,
//! connected account) and mutates it only through these operations.
//!
//! Re-entrancy discipline: each operation kind tracks its own busy state
//! (`create` a flag, `decrypt` a per-key set); a request while busy is
//! refused with `OperationInFlight` before anything is submitted. Reload
//! requests coalesce inside [`CaseStore`].

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::algorithms::derived::compute_stats_with_window;
use crate::algorithms::filter_cases;
use crate::application::store::CaseStore;
use crate::config::LifecycleConfig;
use crate::domain::{
    is_already_verified, is_user_rejection, ActivityLog, Address, Case, CaseFilter, CaseStats,
    RecordKey, RegistryError, StatusBanner, StatusPhase,
};
use crate::ports::{
    CaseLifecycleApi, DecryptionSink, DecryptionVerifier, EncryptionProvider, LedgerReader,
    LedgerWriter,
};

struct UiState {
    account: Option<Address>,
    status: StatusBanner,
    activity: ActivityLog,
    create_busy: bool,
    decrypting: HashSet<RecordKey>,
}

/// Case Lifecycle Service - orchestrates the encrypted case lifecycle.
pub struct CaseLifecycleService<L, E, V> {
    config: LifecycleConfig,
    ledger: Arc<L>,
    encryptor: Arc<E>,
    verifier: Arc<V>,
    store: Arc<CaseStore<L>>,
    state: Arc<Mutex<UiState>>,
}

impl<L, E, V> CaseLifecycleService<L, E, V>
where
    L: LedgerReader + LedgerWriter + 'static,
    E: EncryptionProvider,
    V: DecryptionVerifier,
{
    /// Create a new service over the given collaborators.
    pub fn new(config: LifecycleConfig, ledger: Arc<L>, encryptor: Arc<E>, verifier: Arc<V>) -> Self {
        let activity = ActivityLog::new(config.activity_capacity);
        Self {
            config,
            store: Arc::new(CaseStore::new(Arc::clone(&ledger))),
            ledger,
            encryptor,
            verifier,
            state: Arc::new(Mutex::new(UiState {
                account: None,
                status: StatusBanner::idle(),
                activity,
                create_busy: false,
                decrypting: HashSet::new(),
            })),
        }
    }

    /// Connect an account; signed operations act on its behalf.
    pub fn connect(&self, account: impl Into<Address>) {
        self.state_lock().account = Some(account.into());
    }

    /// Drop the connected account.
    pub fn disconnect(&self) {
        self.state_lock().account = None;
    }

    /// Filtered view of the current snapshot.
    pub fn filtered(&self, filter: &CaseFilter) -> Vec<Case> {
        filter_cases(&self.store.snapshot(), filter)
    }

    fn state_lock(&self) -> MutexGuard<'_, UiState> {
        self.state.lock().expect("ui state lock poisoned")
    }

    fn push_activity(&self, text: String) {
        self.state_lock().activity.push(text);
    }

    /// Replace the banner; schedule an epoch-checked auto-dismiss when a
    /// delay is given. A later `set_status` invalidates older timers.
    fn set_status(&self, phase: StatusPhase, message: impl Into<String>, dismiss: Option<Duration>) {
        let epoch = self.state_lock().status.set(phase, message);
        if let Some(delay) = dismiss {
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Ok(mut ui) = state.lock() {
                    ui.status.clear_if(epoch);
                }
            });
        }
    }

    async fn create_case(
        &self,
        op_id: Uuid,
        account: &str,
        name: &str,
        age: u64,
        disease: &str,
    ) -> Result<(), RegistryError> {
        self.set_status(StatusPhase::Pending, "Encrypting sensitive field...", None);
        let contract = self.ledger.contract_address();
        let encrypted = self
            .encryptor
            .encrypt(&contract, account, age)
            .await
            .map_err(as_encryption_failure)?;
        tracing::debug!(%op_id, "sensitive field encrypted");

        self.set_status(StatusPhase::Pending, "Submitting transaction...", None);
        let key = fresh_record_key();
        let tx = self
            .ledger
            .create_record(
                &key,
                name,
                &encrypted.ciphertext,
                &encrypted.proof,
                age,
                0,
                disease,
            )
            .await
            .map_err(classify_submission)?;

        self.set_status(StatusPhase::Pending, "Waiting for confirmation...", None);
        tx.await_confirmation().await.map_err(classify_confirmation)?;
        tracing::debug!(%op_id, %key, "creation confirmed");

        self.store.reload().await?;
        Ok(())
    }

    async fn decrypt_case(&self, op_id: Uuid, case_key: &str) -> Result<Option<u64>, RegistryError> {
        let data = self
            .ledger
            .get_record_data(case_key)
            .await
            .map_err(as_decryption_failure)?;

        if data.is_verified {
            // Pure read; repeated calls never re-trigger the protocol.
            tracing::info!(%op_id, key = %case_key, "record already verified, returning stored value");
            self.push_activity(format!("Read verified value for \"{}\"", data.name));
            return Ok(Some(data.decrypted_value));
        }

        let handle = self
            .ledger
            .get_encrypted_value_handle(case_key)
            .await
            .map_err(as_decryption_failure)?;
        let contract = self.ledger.contract_address();
        let sink = LedgerSink {
            ledger: Arc::clone(&self.ledger),
            key: case_key.to_string(),
        };

        match self.verifier.verify(&[handle], &contract, &sink).await {
            Ok(outcome) => {
                let value = outcome.clear_values.get(&handle).copied().ok_or_else(|| {
                    RegistryError::DecryptionFailed(
                        "verifier returned no value for requested handle".to_string(),
                    )
                })?;
                if let Err(e) = self.store.reload().await {
                    tracing::warn!(%op_id, error = %e, "reload after decryption failed");
                }
                self.push_activity(format!("Decrypted \"{}\"", data.name));
                Ok(Some(value))
            }
            Err(e) if is_already_verified(&e.to_string()) => {
                // Another party verified first; converge on the stored
                // value rather than treating the revert as a failure.
                tracing::info!(%op_id, key = %case_key, "verified by another party during round");
                if let Err(e) = self.store.reload().await {
                    tracing::warn!(%op_id, error = %e, "reload after convergence failed");
                }
                self.push_activity(format!("\"{}\" verified by another party", data.name));
                Ok(None)
            }
            Err(e) => Err(as_decryption_failure(e)),
        }
    }
}

#[async_trait]
impl<L, E, V> CaseLifecycleApi for CaseLifecycleService<L, E, V>
where
    L: LedgerReader + LedgerWriter + 'static,
    E: EncryptionProvider,
    V: DecryptionVerifier,
{
    async fn create(&self, name: &str, age: &str, disease_type: &str) -> Result<(), RegistryError> {
        let op_id = Uuid::new_v4();
        let Some(account) = self.account() else {
            self.set_status(
                StatusPhase::Error,
                "Connect an account before creating a case",
                Some(self.config.error_banner),
            );
            return Err(RegistryError::Unauthenticated);
        };

        let name = name.trim();
        let disease = disease_type.trim();
        let age_text = age.trim();
        if name.is_empty() || disease.is_empty() || age_text.is_empty() {
            self.set_status(
                StatusPhase::Error,
                "All fields are required",
                Some(self.config.error_banner),
            );
            return Err(RegistryError::Validation("all fields are required".to_string()));
        }
        let Ok(age) = age_text.parse::<u64>() else {
            self.set_status(
                StatusPhase::Error,
                "Age must be a non-negative integer",
                Some(self.config.error_banner),
            );
            return Err(RegistryError::Validation(
                "age must be a non-negative integer".to_string(),
            ));
        };

        {
            let mut ui = self.state_lock();
            if ui.create_busy {
                return Err(RegistryError::OperationInFlight);
            }
            ui.create_busy = true;
        }

        let result = self.create_case(op_id, &account, name, age, disease).await;
        self.state_lock().create_busy = false;

        match result {
            Ok(()) => {
                self.push_activity(format!("Created case \"{name}\""));
                self.set_status(
                    StatusPhase::Success,
                    "Case created",
                    Some(self.config.success_banner),
                );
                tracing::info!(%op_id, "case created");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%op_id, error = %e, "create failed");
                self.set_status(
                    StatusPhase::Error,
                    e.to_string(),
                    Some(self.config.error_banner),
                );
                Err(e)
            }
        }
    }

    async fn reload(&self) -> Result<(), RegistryError> {
        if self.account().is_none() {
            // Reload before connecting is ignored, not an error.
            return Ok(());
        }
        self.set_status(StatusPhase::Pending, "Loading cases...", None);
        match self.store.reload().await {
            Ok(snapshot) => {
                self.set_status(
                    StatusPhase::Success,
                    format!("Loaded {} cases", snapshot.len()),
                    Some(self.config.success_banner),
                );
                Ok(())
            }
            Err(e) => {
                self.set_status(
                    StatusPhase::Error,
                    e.to_string(),
                    Some(self.config.error_banner),
                );
                Err(e)
            }
        }
    }

    async fn decrypt(&self, case_key: &str) -> Result<Option<u64>, RegistryError> {
        let op_id = Uuid::new_v4();
        if self.account().is_none() {
            self.set_status(
                StatusPhase::Error,
                "Connect an account before decrypting",
                Some(self.config.error_banner),
            );
            return Err(RegistryError::Unauthenticated);
        }

        {
            let mut ui = self.state_lock();
            if !ui.decrypting.insert(case_key.to_string()) {
                // At most one protocol round per record key.
                return Err(RegistryError::OperationInFlight);
            }
        }
        self.set_status(StatusPhase::Pending, "Decrypting...", None);

        let result = self.decrypt_case(op_id, case_key).await;
        self.state_lock().decrypting.remove(case_key);

        match &result {
            Ok(Some(_)) => self.set_status(
                StatusPhase::Success,
                "Value decrypted",
                Some(self.config.success_banner),
            ),
            Ok(None) => self.set_status(
                StatusPhase::Success,
                "Already verified on the ledger",
                Some(self.config.success_banner),
            ),
            Err(e) => {
                tracing::warn!(%op_id, key = %case_key, error = %e, "decrypt failed");
                self.set_status(
                    StatusPhase::Error,
                    e.to_string(),
                    Some(self.config.error_banner),
                );
            }
        }
        result
    }

    fn snapshot(&self) -> Arc<Vec<Case>> {
        self.store.snapshot()
    }

    fn status(&self) -> StatusBanner {
        self.state_lock().status.clone()
    }

    fn activity(&self) -> Vec<String> {
        self.state_lock().activity.entries()
    }

    fn stats(&self) -> CaseStats {
        compute_stats_with_window(
            &self.store.snapshot(),
            unix_now(),
            self.config.recent_window_secs,
        )
    }

    fn account(&self) -> Option<Address> {
        self.state_lock().account.clone()
    }

    async fn is_service_available(&self) -> bool {
        self.ledger.is_service_available().await
    }
}

/// Forwards the verifier's cleartext payload and proof to the signed
/// ledger call recording the verified value, then awaits confirmation.
struct LedgerSink<L> {
    ledger: Arc<L>,
    key: RecordKey,
}

#[async_trait]
impl<L: LedgerWriter + 'static> DecryptionSink for LedgerSink<L> {
    async fn submit(&self, clear_value_payload: &[u8], proof: &[u8]) -> Result<(), RegistryError> {
        let tx = self
            .ledger
            .submit_verified_decryption(&self.key, clear_value_payload, proof)
            .await?;
        tx.await_confirmation().await
    }
}

// Record keys are time-based. Two creates in the same millisecond bump
// the counter by one so keys stay unique within the session.
static LAST_KEY_MILLIS: AtomicU64 = AtomicU64::new(0);

fn fresh_record_key() -> RecordKey {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let mut prev = LAST_KEY_MILLIS.load(Ordering::SeqCst);
    loop {
        let candidate = now.max(prev + 1);
        match LAST_KEY_MILLIS.compare_exchange(prev, candidate, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => return format!("case-{candidate}"),
            Err(actual) => prev = actual,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn as_encryption_failure(e: RegistryError) -> RegistryError {
    match e {
        RegistryError::EncryptionFailed(_) => e,
        other => RegistryError::EncryptionFailed(other.to_string()),
    }
}

fn as_decryption_failure(e: RegistryError) -> RegistryError {
    match e {
        RegistryError::DecryptionFailed(_) | RegistryError::Unauthenticated => e,
        other => RegistryError::DecryptionFailed(other.to_string()),
    }
}

fn classify_submission(e: RegistryError) -> RegistryError {
    if is_user_rejection(&e.to_string()) {
        return RegistryError::UserRejected;
    }
    match e {
        RegistryError::SubmissionFailed(_) => e,
        other => RegistryError::SubmissionFailed(other.to_string()),
    }
}

fn classify_confirmation(e: RegistryError) -> RegistryError {
    if is_user_rejection(&e.to_string()) {
        return RegistryError::UserRejected;
    }
    match e {
        RegistryError::ConfirmationFailed(_) => e,
        other => RegistryError::ConfirmationFailed(other.to_string()),
    }
}
