use std::{io, sync::Once};

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
/// Logs go to stderr; stdout carries rendered output.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .with_writer(io::stderr)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_writer(io::stderr)
            .compact()
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register metric descriptions with the installed recorder. Idempotent.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "magblocks_fragment_hit_total",
            Unit::Count,
            "Total number of fragment cache hits."
        );
        describe_counter!(
            "magblocks_fragment_miss_total",
            Unit::Count,
            "Total number of fragment cache misses."
        );
        describe_counter!(
            "magblocks_fragment_coalesced_total",
            Unit::Count,
            "Total number of misses that joined an in-flight render."
        );
        describe_counter!(
            "magblocks_fragment_stale_put_total",
            Unit::Count,
            "Total number of fragments discarded because an invalidation overtook their render."
        );
        describe_counter!(
            "magblocks_fragment_evict_total",
            Unit::Count,
            "Total number of fragment cache evictions due to capacity."
        );
        describe_counter!(
            "magblocks_fragment_invalidate_total",
            Unit::Count,
            "Total number of whole-cache invalidations."
        );
        describe_histogram!(
            "magblocks_render_ms",
            Unit::Milliseconds,
            "Block render latency in milliseconds, cache hits included."
        );
        describe_counter!(
            "magblocks_repository_failure_total",
            Unit::Count,
            "Total number of failed content repository queries."
        );
    });
}
