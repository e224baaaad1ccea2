//! # Integration Test Flows
//!
//! End-to-end choreography of the case lifecycle against the in-memory
//! collaborators: create, reload, verifiable decrypt, convergence on
//! concurrent verification, and banner/log bookkeeping.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use case_lifecycle::{
        CaseLifecycleApi, CaseLifecycleService, CiphertextHandle, DecryptionOutcome,
        DecryptionSink, DecryptionVerifier, HashEncryptionProvider, InMemoryLedger,
        LedgerReader, LedgerWriter, LifecycleConfig, LocalDecryptionVerifier, RegistryError,
        StatusPhase, TxHandle,
    };

    type Service =
        CaseLifecycleService<InMemoryLedger, HashEncryptionProvider, LocalDecryptionVerifier>;

    fn connected_service() -> (Service, Arc<InMemoryLedger>) {
        let ledger = Arc::new(InMemoryLedger::new("0xcontract"));
        let verifier = Arc::new(LocalDecryptionVerifier::new(Arc::clone(&ledger)));
        let service = CaseLifecycleService::new(
            LifecycleConfig::for_testing(),
            Arc::clone(&ledger),
            Arc::new(HashEncryptionProvider),
            verifier,
        );
        service.connect("0xalice");
        (service, ledger)
    }

    // =========================================================================
    // Create → reload → decrypt choreography
    // =========================================================================

    #[tokio::test]
    async fn test_full_lifecycle() {
        crate::init_test_tracing();
        let (service, ledger) = connected_service();

        service.create("Alice", "34", "Cystic Fibrosis").await.unwrap();
        service.create("Bob", "58", "Diabetes").await.unwrap();
        assert_eq!(ledger.create_count(), 2);

        let snapshot = service.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|c| !c.is_verified));

        // Decrypt Alice's record through the verifiable round.
        let alice_key = snapshot
            .iter()
            .find(|c| c.name == "Alice")
            .map(|c| c.key.clone())
            .unwrap();
        let value = service.decrypt(&alice_key).await.unwrap();
        assert_eq!(value, Some(34));

        let snapshot = service.snapshot();
        let alice = snapshot.iter().find(|c| c.name == "Alice").unwrap();
        assert!(alice.is_verified);
        assert_eq!(alice.decrypted_value, 34);

        // Newest activity first: decrypt, then Bob, then Alice.
        let activity = service.activity();
        assert_eq!(activity.len(), 3);
        assert!(activity[0].contains("Decrypted"));
        assert!(activity[1].contains("Bob"));
        assert!(activity[2].contains("Alice"));
    }

    #[tokio::test]
    async fn test_decrypt_is_idempotent_once_verified() {
        let (service, ledger) = connected_service();
        service.create("Alice", "34", "Cystic Fibrosis").await.unwrap();
        let key = service.snapshot()[0].key.clone();

        let first = service.decrypt(&key).await.unwrap();
        assert_eq!(ledger.decrypt_submission_count(), 1);

        // Second call is a pure read: same value, no second round.
        let second = service.decrypt(&key).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(ledger.decrypt_submission_count(), 1);
    }

    #[tokio::test]
    async fn test_activity_log_keeps_ten_newest() {
        let (service, _ledger) = connected_service();
        for i in 0..12 {
            service
                .create(&format!("Patient {i}"), "30", "Asthma")
                .await
                .unwrap();
        }
        let activity = service.activity();
        assert_eq!(activity.len(), 10);
        assert!(activity[0].contains("Patient 11"));
        assert!(activity[9].contains("Patient 2"));
    }

    // =========================================================================
    // Convergence when another party verifies first
    // =========================================================================

    /// Verifier that loses the race: another party records the verified
    /// value while this round is in progress, so the sink submission
    /// reverts with the "already verified" marker.
    struct RacedVerifier {
        ledger: Arc<InMemoryLedger>,
        inner: LocalDecryptionVerifier,
    }

    impl RacedVerifier {
        fn new(ledger: Arc<InMemoryLedger>) -> Self {
            Self {
                inner: LocalDecryptionVerifier::new(Arc::clone(&ledger)),
                ledger,
            }
        }
    }

    #[async_trait::async_trait]
    impl DecryptionVerifier for RacedVerifier {
        async fn verify(
            &self,
            handles: &[CiphertextHandle],
            contract: &str,
            sink: &dyn DecryptionSink,
        ) -> Result<DecryptionOutcome, RegistryError> {
            // Another party lands their verification first.
            let value = self
                .ledger
                .plaintext_for_handle(&handles[0])
                .expect("seeded handle");
            let keys = self.ledger.get_all_record_keys().await?;
            let tx = self
                .ledger
                .submit_verified_decryption(&keys[0], &value.to_le_bytes(), &[9; 4])
                .await?;
            tx.await_confirmation().await?;

            self.inner.verify(handles, contract, sink).await
        }
    }

    #[tokio::test]
    async fn test_already_verified_race_converges() {
        let ledger = Arc::new(InMemoryLedger::new("0xcontract"));
        ledger.seed_record("case-1", "Alice", "Asthma", 30, 100, "0xa", false);
        let verifier = Arc::new(RacedVerifier::new(Arc::clone(&ledger)));
        let service = CaseLifecycleService::new(
            LifecycleConfig::for_testing(),
            Arc::clone(&ledger),
            Arc::new(HashEncryptionProvider),
            verifier,
        );
        service.connect("0xalice");

        // Not an error: the caller must present the stored value instead.
        let value = service.decrypt("case-1").await.unwrap();
        assert_eq!(value, None);
        assert_eq!(service.status().phase, StatusPhase::Success);

        let snapshot = service.snapshot();
        assert!(snapshot[0].is_verified);
        assert_eq!(snapshot[0].decrypted_value, 30);

        let activity = service.activity();
        assert_eq!(activity.len(), 1);
        assert!(activity[0].contains("another party"));
    }

    // =========================================================================
    // Failure surfaces
    // =========================================================================

    #[tokio::test]
    async fn test_unauthenticated_create_leaves_list_unchanged() {
        let (service, ledger) = connected_service();
        service.create("Alice", "34", "Cystic Fibrosis").await.unwrap();
        service.disconnect();

        let err = service.create("Mallory", "99", "Flu").await.unwrap_err();
        assert!(matches!(err, RegistryError::Unauthenticated));
        assert_eq!(ledger.create_count(), 1);
        assert_eq!(service.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_signer_rejection_surfaces_and_skips_log() {
        let (service, ledger) = connected_service();
        ledger.set_reject_signature(true);

        let err = service.create("Alice", "34", "Cystic Fibrosis").await.unwrap_err();
        assert!(matches!(err, RegistryError::UserRejected));
        assert!(service.activity().is_empty());
        assert_eq!(service.status().phase, StatusPhase::Error);
    }

    #[tokio::test]
    async fn test_partial_reload_skips_bad_records() {
        let (service, ledger) = connected_service();
        for i in 1..=5 {
            ledger.seed_record(&format!("case-{i}"), "P", "Flu", 30, 100, "0xa", false);
        }
        ledger.fail_record("case-3");

        service.reload().await.unwrap();
        let snapshot = service.snapshot();
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.iter().all(|c| c.key != "case-3"));
    }

    #[tokio::test]
    async fn test_service_availability_is_surfaced() {
        let (service, ledger) = connected_service();
        assert!(service.is_service_available().await);
        ledger.set_available(false);
        assert!(!service.is_service_available().await);
    }

    // =========================================================================
    // Banner timing
    // =========================================================================

    #[tokio::test]
    async fn test_error_banner_outlives_success_timer() {
        let ledger = Arc::new(InMemoryLedger::new("0xcontract"));
        let verifier = Arc::new(LocalDecryptionVerifier::new(Arc::clone(&ledger)));
        let config = LifecycleConfig {
            success_banner: Duration::from_millis(30),
            error_banner: Duration::from_millis(300),
            ..LifecycleConfig::for_testing()
        };
        let service = CaseLifecycleService::new(
            config,
            Arc::clone(&ledger),
            Arc::new(HashEncryptionProvider),
            verifier,
        );
        service.connect("0xalice");

        service.create("Alice", "34", "Cystic Fibrosis").await.unwrap();
        assert_eq!(service.status().phase, StatusPhase::Success);

        // An error follows immediately; the stale success timer must not
        // clear it.
        ledger.set_reject_signature(true);
        let _ = service.create("Bob", "40", "Flu").await;
        assert_eq!(service.status().phase, StatusPhase::Error);

        tokio::time::sleep(Duration::from_millis(120)).await;
        let status = service.status();
        assert!(status.visible);
        assert_eq!(status.phase, StatusPhase::Error);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(!service.status().visible);
    }
}
