//! # Algorithms
//!
//! Pure derived-view computations over a case snapshot. No I/O, no shared
//! state; recomputable at any time from the snapshot alone.

pub mod derived;

pub use derived::{compute_stats, compute_stats_with_window, filter_cases, RECENT_WINDOW_SECS};
