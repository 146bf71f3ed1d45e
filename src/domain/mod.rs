//! Domain layer types and invariants.

pub mod fragment;
pub mod items;
pub mod options;
pub mod types;
