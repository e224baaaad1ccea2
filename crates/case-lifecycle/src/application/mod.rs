//! # Application Layer
//!
//! `CaseStore` (authoritative in-memory snapshot, rebuilt by full reload)
//! and `CaseLifecycleService` (the orchestrator sequencing create, reload,
//! and verifiable decrypt).

pub mod service;
pub mod store;

pub use service::CaseLifecycleService;
pub use store::CaseStore;
