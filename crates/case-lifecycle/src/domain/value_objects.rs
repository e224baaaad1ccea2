//! # Domain Value Objects
//!
//! Transient UI-facing state: the status banner, the bounded activity log,
//! aggregate statistics, and the case filter.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// The activity log keeps at most this many entries, newest first.
pub const ACTIVITY_LOG_CAPACITY: usize = 10;

/// Phase of the current operation, as shown in the status banner.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum StatusPhase {
    /// Nothing in flight, nothing to show.
    Idle,
    /// An operation is running.
    Pending,
    /// The last operation completed.
    Success,
    /// The last operation failed.
    Error,
}

/// Transient status banner.
///
/// Each `set` bumps an internal epoch; an auto-dismiss timer clears the
/// banner only if its epoch is still current, so a stale timer never
/// wipes a newer message.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusBanner {
    /// Current phase.
    pub phase: StatusPhase,
    /// Human-readable message.
    pub message: String,
    /// Whether the banner should be rendered.
    pub visible: bool,
    epoch: u64,
}

impl Default for StatusBanner {
    fn default() -> Self {
        Self::idle()
    }
}

impl StatusBanner {
    /// An idle, hidden banner.
    pub fn idle() -> Self {
        Self {
            phase: StatusPhase::Idle,
            message: String::new(),
            visible: false,
            epoch: 0,
        }
    }

    /// Replace the banner contents and return the new epoch.
    pub fn set(&mut self, phase: StatusPhase, message: impl Into<String>) -> u64 {
        self.phase = phase;
        self.message = message.into();
        self.visible = true;
        self.epoch += 1;
        self.epoch
    }

    /// Dismiss the banner, but only if `epoch` is still the current one.
    pub fn clear_if(&mut self, epoch: u64) {
        if self.epoch == epoch {
            self.phase = StatusPhase::Idle;
            self.message.clear();
            self.visible = false;
        }
    }
}

/// Bounded recent-activity journal, newest first.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::new(ACTIVITY_LOG_CAPACITY)
    }
}

impl ActivityLog {
    /// Create a log with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend an entry, truncating to capacity.
    pub fn push(&mut self, text: impl Into<String>) {
        self.entries.push_front(text.into());
        self.entries.truncate(self.capacity);
    }

    /// Entries, newest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Aggregate statistics over a case snapshot.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CaseStats {
    /// Total number of cases.
    pub total: usize,
    /// Cases with ledger-confirmed decryption.
    pub verified_count: usize,
    /// Mean of the age field; 0.0 when there are no cases.
    pub average_age: f64,
    /// Cases created within the last 7 days relative to evaluation time.
    pub recent_count: usize,
}

/// Verification dimension of the case filter.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerificationFilter {
    /// No restriction.
    #[default]
    All,
    /// Only ledger-verified cases.
    Verified,
    /// Only cases awaiting verification.
    Unverified,
}

/// Filter inputs for the derived case list.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseFilter {
    /// Free-text search term, matched against name and disease type.
    pub search: String,
    /// Verification restriction.
    pub verification: VerificationFilter,
}

impl CaseFilter {
    /// Filter with a search term and no verification restriction.
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            search: term.into(),
            verification: VerificationFilter::All,
        }
    }

    /// Filter with a verification restriction only.
    pub fn verification(v: VerificationFilter) -> Self {
        Self {
            search: String::new(),
            verification: v,
        }
    }
}
