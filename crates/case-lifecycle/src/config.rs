//! # Lifecycle Configuration
//!
//! Tunables for banner auto-dismiss, log capacity, and the recent-case
//! window.

use crate::domain::ACTIVITY_LOG_CAPACITY;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Case lifecycle configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// How long success banners stay visible. Shorter than the error
    /// delay so transient confirmations stay unobtrusive.
    pub success_banner: Duration,

    /// How long error and validation banners stay visible.
    pub error_banner: Duration,

    /// Activity log capacity (entries retained, newest first).
    pub activity_capacity: usize,

    /// Window for the "recent cases" statistic, in seconds.
    pub recent_window_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            success_banner: Duration::from_secs(2),
            error_banner: Duration::from_secs(3),
            activity_capacity: ACTIVITY_LOG_CAPACITY,
            recent_window_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl LifecycleConfig {
    /// Create a config for testing (millisecond-scale banner delays).
    pub fn for_testing() -> Self {
        Self {
            success_banner: Duration::from_millis(20),
            error_banner: Duration::from_millis(30),
            activity_capacity: ACTIVITY_LOG_CAPACITY,
            recent_window_secs: 7 * 24 * 60 * 60,
        }
    }
}
