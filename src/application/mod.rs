//! Application services: query building, rendering and the block pipeline.

pub mod bootstrap;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod registry;
pub mod render;
pub mod repos;
