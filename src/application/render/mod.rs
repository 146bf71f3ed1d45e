//! Block markup rendering.
//!
//! The renderer is pure: it receives the already-queried item sequence and a
//! resolved option set and produces a [`Fragment`](crate::domain::fragment::Fragment).
//! Querying and caching happen in the caller.

mod excerpt;
mod renderer;

pub use renderer::{TemplateRenderer, UNTITLED_PLACEHOLDER, comments_label};
