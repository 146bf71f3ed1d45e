//! Render pipeline: options → query → cache → renderer.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{instrument, warn};

use crate::application::query;
use crate::application::render::TemplateRenderer;
use crate::application::repos::ContentRepository;
use crate::cache::{Computed, Fingerprint, FragmentCache, Generation};
use crate::domain::fragment::Fragment;
use crate::domain::options::OptionSet;
use crate::domain::types::BlockVariant;

const METRIC_RENDER_MS: &str = "magblocks_render_ms";
const METRIC_REPOSITORY_FAILURE: &str = "magblocks_repository_failure_total";

pub struct MagazinePipeline {
    repository: Arc<dyn ContentRepository>,
    cache: Arc<FragmentCache>,
    renderer: TemplateRenderer,
    namespace: String,
}

impl MagazinePipeline {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        cache: Arc<FragmentCache>,
        renderer: TemplateRenderer,
    ) -> Self {
        // Dates are rendered in the display zone, so the zone is part of
        // every fingerprint.
        let namespace = renderer.timezone().name().to_string();
        Self {
            repository,
            cache,
            renderer,
            namespace,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn cache(&self) -> &Arc<FragmentCache> {
        &self.cache
    }

    pub fn repository(&self) -> &Arc<dyn ContentRepository> {
        &self.repository
    }

    pub fn fingerprint(&self, variant: BlockVariant, options: &OptionSet) -> Fingerprint {
        Fingerprint::compute(&self.namespace, variant, options)
    }

    /// Render one block. Never fails: repository errors yield an empty,
    /// uncached fragment.
    #[instrument(skip_all, fields(block = variant.tag()))]
    pub async fn render(&self, variant: BlockVariant, options: &OptionSet) -> Fragment {
        let started_at = Instant::now();
        let options = options.normalized(variant);
        let fingerprint = self.fingerprint(variant, &options);

        let fragment = self
            .cache
            .get_or_compute(&fingerprint, || self.compute(variant, &options))
            .await;

        histogram!(METRIC_RENDER_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);
        fragment
    }

    async fn compute(&self, variant: BlockVariant, options: &OptionSet) -> Computed {
        let spec = query::build(variant, options);
        match self.repository.query(&spec).await {
            Ok(items) => Computed::cacheable(self.renderer.render(variant, &items, options)),
            Err(err) => {
                counter!(METRIC_REPOSITORY_FAILURE).increment(1);
                warn!(
                    target = "application::pipeline",
                    op = "query",
                    result = "repository_failure",
                    block = variant.tag(),
                    error = %err,
                    "Repository query failed; rendering empty block"
                );
                Computed::uncacheable(self.renderer.render(variant, &[], options))
            }
        }
    }

    pub fn invalidate_all(&self) -> Generation {
        self.cache.invalidate_all()
    }
}
