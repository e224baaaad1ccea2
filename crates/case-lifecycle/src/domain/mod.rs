//! # Domain Layer
//!
//! Core types for the case lifecycle: entities, value objects, errors,
//! and snapshot invariants. No I/O here.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod value_objects;

pub use entities::{Case, RecordData};
pub use errors::{is_already_verified, is_user_rejection, Address, RecordKey, RegistryError};
pub use invariants::{invariant_unique_keys, invariant_verified_cleartext};
pub use value_objects::{
    ActivityLog, CaseFilter, CaseStats, StatusBanner, StatusPhase, VerificationFilter,
    ACTIVITY_LOG_CAPACITY,
};
