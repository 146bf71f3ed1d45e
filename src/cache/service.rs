//! Fragment cache facade: store plus single-flight coordination.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::domain::fragment::Fragment;

use super::config::CacheConfig;
use super::flight::{FlightLeader, Flights, LeaderOutcome, Role, await_leader};
use super::keys::Fingerprint;
use super::store::{FragmentStore, Generation};

const METRIC_COALESCED: &str = "magblocks_fragment_coalesced_total";

/// Result of a render attempt handed to [`FragmentCache::get_or_compute`].
#[derive(Debug, Clone)]
pub struct Computed {
    pub fragment: Fragment,
    /// False when the render degraded (e.g. repository failure) and must not
    /// be served from cache.
    pub cacheable: bool,
}

impl Computed {
    pub fn cacheable(fragment: Fragment) -> Self {
        Self {
            fragment,
            cacheable: true,
        }
    }

    pub fn uncacheable(fragment: Fragment) -> Self {
        Self {
            fragment,
            cacheable: false,
        }
    }
}

pub struct FragmentCache {
    config: CacheConfig,
    store: FragmentStore,
    flights: Flights,
}

impl FragmentCache {
    pub fn new(config: CacheConfig) -> Self {
        let store = FragmentStore::new(&config);
        Self {
            config,
            store,
            flights: Flights::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn generation(&self) -> Generation {
        self.store.generation()
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Fragment> {
        if !self.config.enabled {
            return None;
        }
        self.store.get(fingerprint)
    }

    /// Store `fragment` if no invalidation has happened since `generation`.
    pub fn put(&self, fingerprint: Fingerprint, fragment: Fragment, generation: Generation) -> bool {
        if !self.config.enabled {
            return false;
        }
        self.store.put(fingerprint, fragment, generation)
    }

    /// Drop every cached fragment. Renders already in progress finish but
    /// their results are not stored.
    pub fn invalidate_all(&self) -> Generation {
        let generation = self.store.invalidate_all();
        info!(generation, "Fragment cache invalidated");
        generation
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub(crate) fn store(&self) -> &FragmentStore {
        &self.store
    }

    /// Serve `fingerprint` from cache, or run `compute` at most once per
    /// fingerprint and generation across concurrent callers.
    ///
    /// Followers wait up to the configured single-flight window for the
    /// leader. If the leader goes away without a result, the waiting
    /// followers rejoin and one of them takes over; only a follower whose
    /// window runs out renders on its own.
    pub async fn get_or_compute<F, Fut>(&self, fingerprint: &Fingerprint, compute: F) -> Fragment
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Computed>,
    {
        if !self.config.enabled {
            return compute().await.fragment;
        }

        if let Some(hit) = self.store.get(fingerprint) {
            return hit;
        }

        let deadline = Instant::now() + self.config.single_flight_wait();
        let mut coalesced = false;
        loop {
            let generation = self.store.generation();
            let result = match self.flights.join(fingerprint, generation) {
                Role::Leader(leader) => {
                    return self.lead(leader, fingerprint, generation, compute).await;
                }
                Role::Follower(result) => result,
            };
            if !coalesced {
                counter!(METRIC_COALESCED).increment(1);
                coalesced = true;
            }

            match await_leader(result, deadline).await {
                LeaderOutcome::Delivered(shared) => return shared,
                LeaderOutcome::Abandoned => {
                    debug!(fingerprint = %fingerprint, "Leader abandoned render; rejoining");
                    if let Some(hit) = self.store.lookup(fingerprint) {
                        return hit;
                    }
                }
                LeaderOutcome::TimedOut => {
                    debug!(fingerprint = %fingerprint, "Leader too slow; rendering independently");
                    return self.compute_and_store(fingerprint, generation, compute).await;
                }
            }
        }
    }

    async fn lead<F, Fut>(
        &self,
        leader: FlightLeader,
        fingerprint: &Fingerprint,
        generation: Generation,
        compute: F,
    ) -> Fragment
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Computed>,
    {
        // Another leader may have stored the fragment between our miss and
        // registering this flight.
        if let Some(hit) = self.store.lookup(fingerprint) {
            leader.complete(&hit);
            return hit;
        }

        let fragment = self.compute_and_store(fingerprint, generation, compute).await;
        leader.complete(&fragment);
        fragment
    }

    async fn compute_and_store<F, Fut>(
        &self,
        fingerprint: &Fingerprint,
        generation: Generation,
        compute: F,
    ) -> Fragment
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Computed>,
    {
        let Computed {
            fragment,
            cacheable,
        } = compute().await;
        if cacheable {
            self.store.put(fingerprint.clone(), fragment.clone(), generation);
        }
        fragment
    }
}

/// Shared handle used by the pipeline and listener.
pub type SharedFragmentCache = Arc<FragmentCache>;
