//! Generation-stamped fragment storage.
//!
//! Every entry carries the generation that was current when its render
//! started. `invalidate_all` bumps the generation and clears the map under the
//! same write lock, and `put` compares generations under that lock too, so a
//! render that began before an invalidation can never repopulate the store.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use crate::domain::fragment::Fragment;

use super::config::CacheConfig;
use super::keys::Fingerprint;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

const METRIC_HIT: &str = "magblocks_fragment_hit_total";
const METRIC_MISS: &str = "magblocks_fragment_miss_total";
const METRIC_EVICT: &str = "magblocks_fragment_evict_total";
const METRIC_STALE_PUT: &str = "magblocks_fragment_stale_put_total";
const METRIC_INVALIDATE: &str = "magblocks_fragment_invalidate_total";

/// Monotonic invalidation counter.
pub type Generation = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub fragment: Fragment,
    pub generation: Generation,
}

pub struct FragmentStore {
    entries: RwLock<LruCache<Fingerprint, CacheEntry>>,
    generation: AtomicU64,
}

impl FragmentStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.fragment_limit_non_zero())),
            generation: AtomicU64::new(0),
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation.load(Ordering::SeqCst)
    }

    /// Look up a fragment, recording hit/miss metrics.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Fragment> {
        let found = self.lookup(fingerprint);
        if found.is_some() {
            counter!(METRIC_HIT).increment(1);
        } else {
            counter!(METRIC_MISS).increment(1);
        }
        found
    }

    /// Look up without touching metrics. Entries from an older generation
    /// are dropped and reported as misses.
    pub(crate) fn lookup(&self, fingerprint: &Fingerprint) -> Option<Fragment> {
        let mut entries = rw_write(&self.entries, SOURCE, "lookup");
        let current = self.generation();
        match entries.get(fingerprint) {
            Some(entry) if entry.generation == current => Some(entry.fragment.clone()),
            Some(_) => {
                entries.pop(fingerprint);
                None
            }
            None => None,
        }
    }

    /// Store a fragment rendered under `generation`. Returns false (and
    /// stores nothing) if an invalidation happened since that generation.
    pub fn put(&self, fingerprint: Fingerprint, fragment: Fragment, generation: Generation) -> bool {
        let mut entries = rw_write(&self.entries, SOURCE, "put");
        let current = self.generation();
        if generation != current {
            counter!(METRIC_STALE_PUT).increment(1);
            debug!(
                fingerprint = %fingerprint,
                generation,
                current,
                "Discarded fragment rendered before invalidation"
            );
            return false;
        }

        let entry = CacheEntry {
            fragment,
            generation,
        };
        if let Some((evicted, _)) = entries.push(fingerprint.clone(), entry)
            && evicted != fingerprint
        {
            counter!(METRIC_EVICT).increment(1);
        }
        true
    }

    /// Drop every entry and start a new generation. Returns the new generation.
    pub fn invalidate_all(&self) -> Generation {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate_all");
        let next = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        entries.clear();
        counter!(METRIC_INVALIDATE).increment(1);
        next
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current-generation entries, least recently used first.
    pub(crate) fn current_entries(&self) -> (Generation, Vec<(Fingerprint, Fragment)>) {
        let entries = rw_read(&self.entries, SOURCE, "current_entries");
        let current = self.generation();
        let live = entries
            .iter()
            .rev()
            .filter(|(_, entry)| entry.generation == current)
            .map(|(fingerprint, entry)| (fingerprint.clone(), entry.fragment.clone()))
            .collect();
        (current, live)
    }

    /// Insert restored fragments, in order, if the generation is still
    /// `expected`. Returns `None` and inserts nothing once an invalidation
    /// has moved it on.
    pub(crate) fn restore(
        &self,
        restored: Vec<(Fingerprint, Fragment)>,
        expected: Generation,
    ) -> Option<usize> {
        let mut entries = rw_write(&self.entries, SOURCE, "restore");
        let current = self.generation();
        if current != expected {
            return None;
        }
        let count = restored.len();
        for (fingerprint, fragment) in restored {
            entries.push(
                fingerprint,
                CacheEntry {
                    fragment,
                    generation: current,
                },
            );
        }
        Some(count)
    }
}
