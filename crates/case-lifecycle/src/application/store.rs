//! # Case Store
//!
//! In-memory authoritative snapshot of all known case records, rebuilt by
//! full reload from the ledger.
//!
//! Snapshot discipline: the visible snapshot is an `Arc<Vec<Case>>` that is
//! swapped atomically when a reload completes. Readers observe either the
//! old or the new snapshot in full, never a partial merge. A reload in
//! flight makes the store busy; concurrent reload requests join the
//! in-flight scan instead of launching a second one.

use crate::domain::{invariant_unique_keys, Case, RegistryError};
use crate::ports::LedgerReader;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

struct StoreInner {
    snapshot: Arc<Vec<Case>>,
    busy: bool,
    last_failure: Option<String>,
}

/// Authoritative case snapshot with coalesced full reloads.
pub struct CaseStore<L> {
    ledger: Arc<L>,
    inner: Mutex<StoreInner>,
    // Bumped once per completed scan; late reload callers wait on it.
    generation: watch::Sender<u64>,
}

impl<L: LedgerReader> CaseStore<L> {
    /// Create an empty store backed by the given ledger reader.
    pub fn new(ledger: Arc<L>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            ledger,
            inner: Mutex::new(StoreInner {
                snapshot: Arc::new(Vec::new()),
                busy: false,
                last_failure: None,
            }),
            generation,
        }
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<Vec<Case>> {
        Arc::clone(&self.lock().snapshot)
    }

    /// Is a reload currently in flight?
    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    /// Rebuild the snapshot from the ledger.
    ///
    /// Fetches the full key list, then each record individually. A record
    /// that fails to load is skipped with a warning; a key-list failure
    /// surfaces `LoadFailed` and leaves the previous snapshot in place.
    ///
    /// If a reload is already in flight, this call waits for that scan and
    /// returns its outcome instead of issuing a second full scan.
    pub async fn reload(&self) -> Result<Arc<Vec<Case>>, RegistryError> {
        let rx = self.generation.subscribe();
        let join = {
            let mut inner = self.lock();
            if inner.busy {
                true
            } else {
                inner.busy = true;
                false
            }
        };
        if join {
            return self.join_in_flight(rx).await;
        }

        let result = self.scan().await;

        let outcome = {
            let mut inner = self.lock();
            inner.busy = false;
            match result {
                Ok(cases) => {
                    debug_assert!(invariant_unique_keys(&cases));
                    inner.snapshot = Arc::new(cases);
                    inner.last_failure = None;
                    Ok(Arc::clone(&inner.snapshot))
                }
                Err(e) => {
                    inner.last_failure = Some(e.to_string());
                    Err(e)
                }
            }
        };
        self.generation.send_modify(|g| *g = g.wrapping_add(1));
        outcome
    }

    /// Wait for the in-flight scan to finish and report its outcome.
    async fn join_in_flight(
        &self,
        mut rx: watch::Receiver<u64>,
    ) -> Result<Arc<Vec<Case>>, RegistryError> {
        loop {
            if rx.changed().await.is_err() {
                // Sender dropped; nothing more will complete.
                break;
            }
            let inner = self.lock();
            if !inner.busy {
                return match &inner.last_failure {
                    None => Ok(Arc::clone(&inner.snapshot)),
                    Some(msg) => Err(RegistryError::LoadFailed(msg.clone())),
                };
            }
        }
        Ok(self.snapshot())
    }

    async fn scan(&self) -> Result<Vec<Case>, RegistryError> {
        let keys = self.ledger.get_all_record_keys().await.map_err(|e| match e {
            RegistryError::LoadFailed(_) => e,
            other => RegistryError::LoadFailed(other.to_string()),
        })?;

        let mut cases = Vec::with_capacity(keys.len());
        for key in keys {
            match self.ledger.get_record_data(&key).await {
                Ok(data) => cases.push(Case::from_record(&key, data)),
                Err(e) => {
                    // Partial-success policy: one bad record must not
                    // abort the whole reload.
                    tracing::warn!(%key, error = %e, "skipping record that failed to load");
                }
            }
        }
        Ok(cases)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().expect("case store lock poisoned")
    }
}
