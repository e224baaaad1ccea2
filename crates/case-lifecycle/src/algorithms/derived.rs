//! # Derived Views
//!
//! Filtered case lists and aggregate statistics, computed purely from a
//! snapshot and the filter inputs.

use crate::domain::{Case, CaseFilter, CaseStats, VerificationFilter};

/// Default window for the "recent cases" statistic: 7 days.
pub const RECENT_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Filter a snapshot by search term and verification state.
///
/// Matching is a case-insensitive substring test against name or disease
/// type, intersected with the verification filter. Snapshot order is
/// preserved.
pub fn filter_cases(cases: &[Case], filter: &CaseFilter) -> Vec<Case> {
    cases
        .iter()
        .filter(|c| match filter.verification {
            VerificationFilter::All => true,
            VerificationFilter::Verified => c.is_verified,
            VerificationFilter::Unverified => !c.is_verified,
        })
        .filter(|c| c.matches_search(&filter.search))
        .cloned()
        .collect()
}

/// Aggregate statistics over a snapshot, evaluated at `now_unix`.
pub fn compute_stats(cases: &[Case], now_unix: u64) -> CaseStats {
    compute_stats_with_window(cases, now_unix, RECENT_WINDOW_SECS)
}

/// Like [`compute_stats`] with an explicit recent-case window.
pub fn compute_stats_with_window(cases: &[Case], now_unix: u64, window_secs: u64) -> CaseStats {
    let total = cases.len();
    let verified_count = cases.iter().filter(|c| c.is_verified).count();
    let average_age = if total == 0 {
        0.0
    } else {
        cases.iter().map(|c| c.age_years as f64).sum::<f64>() / total as f64
    };
    let recent_count = cases
        .iter()
        .filter(|c| now_unix.saturating_sub(c.created_at_unix) < window_secs)
        .count();
    CaseStats {
        total,
        verified_count,
        average_age,
        recent_count,
    }
}
