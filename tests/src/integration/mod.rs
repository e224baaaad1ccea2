//! Cross-component lifecycle scenarios.

pub mod derived_view;
pub mod flows;
