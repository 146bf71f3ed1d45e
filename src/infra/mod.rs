//! Infrastructure adapters: content storage, telemetry.

pub mod error;
pub mod memory;
pub mod telemetry;
