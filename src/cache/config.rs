//! Fragment cache configuration.
//!
//! Controlled via the `[cache]` table of `magblocks.toml`.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_FRAGMENT_LIMIT: usize = 256;
const DEFAULT_SINGLE_FLIGHT_WAIT_MS: u64 = 5000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve and store rendered fragments.
    pub enabled: bool,
    /// Maximum fragments held before LRU eviction.
    pub fragment_limit: usize,
    /// How long a follower waits on an in-flight render before rendering itself.
    pub single_flight_wait_ms: u64,
    /// Where to persist fragments across restarts, if anywhere.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fragment_limit: DEFAULT_FRAGMENT_LIMIT,
            single_flight_wait_ms: DEFAULT_SINGLE_FLIGHT_WAIT_MS,
            snapshot_path: None,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            fragment_limit: settings.fragment_limit.get(),
            single_flight_wait_ms: settings.single_flight_wait.as_millis() as u64,
            snapshot_path: settings.snapshot_path.clone(),
        }
    }
}

impl CacheConfig {
    /// Returns the fragment limit as NonZeroUsize, clamping to 1 if zero.
    pub fn fragment_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.fragment_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Follower wait bound; never zero so followers always give the leader a chance.
    pub fn single_flight_wait(&self) -> Duration {
        Duration::from_millis(self.single_flight_wait_ms.max(1))
    }
}
