//! # Derived View Scenarios
//!
//! Filtering and aggregate statistics computed over snapshots loaded
//! through the full service path.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    use case_lifecycle::{
        filter_cases, CaseFilter, CaseLifecycleApi, CaseLifecycleService, HashEncryptionProvider,
        InMemoryLedger, LifecycleConfig, LocalDecryptionVerifier, VerificationFilter,
    };

    fn unix_now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    async fn loaded_service() -> CaseLifecycleService<
        InMemoryLedger,
        HashEncryptionProvider,
        LocalDecryptionVerifier,
    > {
        let ledger = Arc::new(InMemoryLedger::new("0xcontract"));
        let now = unix_now();
        ledger.seed_record("case-1", "Alice", "Cystic Fibrosis", 10, now, "0xa", true);
        ledger.seed_record("case-2", "Bob", "Diabetes", 20, now, "0xb", false);
        ledger.seed_record("case-3", "Cystine", "Kidney Stones", 30, 1_000, "0xc", true);

        let verifier = Arc::new(LocalDecryptionVerifier::new(Arc::clone(&ledger)));
        let service = CaseLifecycleService::new(
            LifecycleConfig::for_testing(),
            ledger,
            Arc::new(HashEncryptionProvider),
            verifier,
        );
        service.connect("0xalice");
        service.reload().await.unwrap();
        service
    }

    #[tokio::test]
    async fn test_stats_across_loaded_snapshot() {
        let service = loaded_service().await;
        let stats = service.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.verified_count, 2);
        assert_eq!(stats.average_age, 20.0);
        assert_eq!(stats.recent_count, 2);
    }

    #[tokio::test]
    async fn test_verified_filter_combined_with_search() {
        let service = loaded_service().await;

        let verified = service.filtered(&CaseFilter::verification(VerificationFilter::Verified));
        assert_eq!(verified.len(), 2);
        assert!(verified.iter().all(|c| c.is_verified));

        let filter = CaseFilter {
            search: "cyst".to_string(),
            verification: VerificationFilter::Verified,
        };
        let both = service.filtered(&filter);
        assert_eq!(both.len(), 2);
        assert_eq!(both[0].name, "Alice");
        assert_eq!(both[1].name, "Cystine");

        let filter = CaseFilter {
            search: "cyst".to_string(),
            verification: VerificationFilter::Unverified,
        };
        assert!(service.filtered(&filter).is_empty());
    }

    #[tokio::test]
    async fn test_filter_is_pure_over_snapshot() {
        let service = loaded_service().await;
        let snapshot = service.snapshot();

        // Same result whether computed through the service or directly
        // from the snapshot.
        let via_service = service.filtered(&CaseFilter::search("bob"));
        let direct = filter_cases(&snapshot, &CaseFilter::search("bob"));
        assert_eq!(via_service, direct);
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].name, "Bob");
    }
}
