//! Content repository contract consumed by the pipeline.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::application::query::QuerySpec;
use crate::cache::MutationEvent;
use crate::domain::items::ItemSummary;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("repository query timed out")]
    Timeout,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Item store backing the magazine blocks.
///
/// Implementations own their query timeouts and report them as
/// [`RepoError::Timeout`] rather than hanging.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Execute a normalized query, returning items in the requested order.
    async fn query(&self, spec: &QuerySpec) -> Result<Vec<ItemSummary>, RepoError>;

    /// Subscribe to content mutation events (item or taxonomy changes).
    fn mutations(&self) -> broadcast::Receiver<MutationEvent>;

    /// Opaque token that changes whenever the stored content changes.
    /// Persisted fragments are only restored when it matches; stores that
    /// cannot provide one never restore snapshots.
    ///
    /// A store must publish the mutation event for a change before the
    /// change can show up here.
    fn revision(&self) -> Option<String> {
        None
    }
}
