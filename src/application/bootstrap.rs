//! Explicit startup wiring for the block pipeline.
//!
//! Builds the fragment cache, renderer, pipeline and registry, subscribes the
//! invalidation listener to the repository's mutation stream, and restores a
//! persisted snapshot when one is configured.

use std::path::PathBuf;
use std::sync::Arc;

use chrono_tz::Tz;
use tracing::{info, warn};

use crate::application::pipeline::MagazinePipeline;
use crate::application::registry::BlockRegistry;
use crate::application::render::TemplateRenderer;
use crate::application::repos::ContentRepository;
use crate::cache::{
    CacheConfig, FragmentCache, InvalidationListener, ListenerHandle, PersistError, RestoreReport,
};

pub struct MagazineRuntime {
    registry: BlockRegistry,
    pipeline: Arc<MagazinePipeline>,
    cache: Arc<FragmentCache>,
    listener: ListenerHandle,
    snapshot_path: Option<PathBuf>,
}

/// Wire the pipeline. Must be called inside a Tokio runtime.
pub fn bootstrap(
    repository: Arc<dyn ContentRepository>,
    cache_config: CacheConfig,
    timezone: Tz,
) -> MagazineRuntime {
    let snapshot_path = cache_config.snapshot_path.clone();
    let cache = Arc::new(FragmentCache::new(cache_config));

    // Subscribe before restoring so no mutation can slip in between.
    let listener = InvalidationListener::spawn(Arc::clone(&cache), repository.mutations());

    let pipeline = Arc::new(MagazinePipeline::new(
        Arc::clone(&repository),
        Arc::clone(&cache),
        TemplateRenderer::new(timezone),
    ));
    let registry = BlockRegistry::new(Arc::clone(&pipeline));

    let runtime = MagazineRuntime {
        registry,
        pipeline,
        cache,
        listener,
        snapshot_path,
    };
    runtime.restore_snapshot();

    info!(
        target = "application::bootstrap",
        timezone = timezone.name(),
        cache_enabled = runtime.cache.is_enabled(),
        fragment_limit = runtime.cache.config().fragment_limit,
        "Magazine block pipeline ready"
    );
    runtime
}

impl MagazineRuntime {
    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn pipeline(&self) -> &Arc<MagazinePipeline> {
        &self.pipeline
    }

    pub fn cache(&self) -> &Arc<FragmentCache> {
        &self.cache
    }

    /// Snapshots are keyed by display zone and content revision so a
    /// snapshot taken against other content is never restored.
    fn snapshot_namespace(&self) -> Option<String> {
        let revision = self.pipeline.repository().revision()?;
        Some(format!("{}@{}", self.pipeline.namespace(), revision))
    }

    fn restore_snapshot(&self) -> RestoreReport {
        let Some(path) = self.snapshot_path.as_deref() else {
            return RestoreReport::default();
        };
        // Observed before the revision: a mutation landing after this point
        // bumps the generation and the restore is abandoned.
        let generation = self.cache.generation();
        let Some(namespace) = self.snapshot_namespace() else {
            info!(
                target = "application::bootstrap",
                path = %path.display(),
                "Repository has no content revision; skipping snapshot restore"
            );
            return RestoreReport::default();
        };

        match self.cache.load_snapshot(path, &namespace, generation) {
            Ok(report) => report,
            Err(err) => {
                warn!(
                    target = "application::bootstrap",
                    path = %path.display(),
                    error = %err,
                    "Fragment cache snapshot unreadable; starting cold"
                );
                RestoreReport::default()
            }
        }
    }

    /// Stop the listener and persist the cache if a snapshot path is set.
    ///
    /// The revision is read first; stopping the listener then applies every
    /// event for changes that revision can reflect, so no fragment rendered
    /// from older content is saved under it.
    pub async fn shutdown(self) -> Result<(), PersistError> {
        let namespace = self.snapshot_namespace();
        let Self {
            cache,
            listener,
            snapshot_path,
            ..
        } = self;

        listener.stop().await;

        let (Some(path), Some(namespace)) = (snapshot_path, namespace) else {
            return Ok(());
        };
        cache.save_snapshot(&path, &namespace)?;
        Ok(())
    }
}
