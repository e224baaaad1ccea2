//! # Cipher-Registry Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Cross-component lifecycle scenarios
//!     ├── flows.rs      # Create / reload / decrypt choreography
//!     └── derived_view.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p registry-tests
//!
//! # By category
//! cargo test -p registry-tests integration::
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;

/// Initialise a compact tracing subscriber for test debugging.
/// No-op when a subscriber is already installed.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
