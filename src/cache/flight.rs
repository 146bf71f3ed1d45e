//! In-flight render tracking.
//!
//! The first caller to miss on a fingerprint becomes the leader and registers
//! a watch channel; later callers for the same fingerprint and generation
//! subscribe to it instead of querying the repository again. A leader that is
//! dropped before delivering unregisters its flight and closes the channel, so
//! its followers can elect a replacement.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::fragment::Fragment;

use super::keys::Fingerprint;
use super::store::Generation;

struct Flight {
    id: u64,
    generation: Generation,
    result: watch::Receiver<Option<Fragment>>,
}

pub(crate) enum Role {
    Leader(FlightLeader),
    Follower(watch::Receiver<Option<Fragment>>),
}

#[derive(Default)]
pub(crate) struct Flights {
    inner: Arc<DashMap<Fingerprint, Flight>>,
    next_id: AtomicU64,
}

impl Flights {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Join the flight for `fingerprint` at `generation`, or lead a new one.
    /// A flight left over from an older generation is replaced.
    pub(crate) fn join(&self, fingerprint: &Fingerprint, generation: Generation) -> Role {
        use dashmap::mapref::entry::Entry;

        match self.inner.entry(fingerprint.clone()) {
            Entry::Occupied(entry) if entry.get().generation == generation => {
                Role::Follower(entry.get().result.clone())
            }
            Entry::Occupied(mut entry) => {
                let (leader, flight) = self.lead(fingerprint, generation);
                entry.insert(flight);
                Role::Leader(leader)
            }
            Entry::Vacant(entry) => {
                let (leader, flight) = self.lead(fingerprint, generation);
                entry.insert(flight);
                Role::Leader(leader)
            }
        }
    }

    fn lead(&self, fingerprint: &Fingerprint, generation: Generation) -> (FlightLeader, Flight) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, result) = watch::channel(None);
        let leader = FlightLeader {
            fingerprint: fingerprint.clone(),
            id,
            sender,
            flights: Arc::clone(&self.inner),
        };
        let flight = Flight {
            id,
            generation,
            result,
        };
        (leader, flight)
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Held by the caller doing the render; unregisters the flight on drop.
pub(crate) struct FlightLeader {
    fingerprint: Fingerprint,
    id: u64,
    sender: watch::Sender<Option<Fragment>>,
    flights: Arc<DashMap<Fingerprint, Flight>>,
}

impl FlightLeader {
    /// Hand the result to every follower.
    pub(crate) fn complete(self, fragment: &Fragment) {
        self.sender.send_replace(Some(fragment.clone()));
    }
}

impl Drop for FlightLeader {
    fn drop(&mut self) {
        let id = self.id;
        self.flights
            .remove_if(&self.fingerprint, |_, flight| flight.id == id);
    }
}

/// How a follower's wait on a flight ended.
#[derive(Debug, PartialEq)]
pub(crate) enum LeaderOutcome {
    Delivered(Fragment),
    /// The leader went away without a result; the flight is already
    /// unregistered.
    Abandoned,
    TimedOut,
}

/// Wait until `deadline` for the leader's fragment.
pub(crate) async fn await_leader(
    mut result: watch::Receiver<Option<Fragment>>,
    deadline: Instant,
) -> LeaderOutcome {
    match tokio::time::timeout_at(deadline, result.wait_for(Option::is_some)).await {
        Ok(Ok(fragment)) => match fragment.clone() {
            Some(fragment) => LeaderOutcome::Delivered(fragment),
            None => LeaderOutcome::Abandoned,
        },
        Ok(Err(_)) => LeaderOutcome::Abandoned,
        Err(_) => LeaderOutcome::TimedOut,
    }
}
