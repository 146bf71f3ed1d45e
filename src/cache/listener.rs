//! Background task that turns content mutations into cache invalidations.

use std::sync::Arc;

use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::MutationEvent;
use super::service::FragmentCache;

pub struct InvalidationListener {
    cache: Arc<FragmentCache>,
}

impl InvalidationListener {
    pub fn new(cache: Arc<FragmentCache>) -> Self {
        Self { cache }
    }

    /// Consume `events` until the sending side closes or the returned
    /// handle is stopped.
    pub fn spawn(
        cache: Arc<FragmentCache>,
        events: broadcast::Receiver<MutationEvent>,
    ) -> ListenerHandle {
        let listener = Self::new(cache);
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(listener.run(events, stopped));
        ListenerHandle { stop, task }
    }

    pub async fn run(
        self,
        mut events: broadcast::Receiver<MutationEvent>,
        mut stop: oneshot::Receiver<()>,
    ) {
        info!(target = "cache::listener", "Invalidation listener started");
        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(event) => self.apply(&event),
                    Err(RecvError::Lagged(skipped)) => self.lagged(skipped),
                    Err(RecvError::Closed) => break,
                },
                _ = &mut stop => {
                    self.drain(&mut events);
                    break;
                }
            }
        }
        info!(target = "cache::listener", "Invalidation listener stopped");
    }

    /// Apply whatever is already queued without waiting for more.
    fn drain(&self, events: &mut broadcast::Receiver<MutationEvent>) {
        let mut applied = 0usize;
        loop {
            match events.try_recv() {
                Ok(event) => {
                    self.apply(&event);
                    applied += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => self.lagged(skipped),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        debug!(target = "cache::listener", applied, "Drained queued mutation events");
    }

    fn lagged(&self, skipped: u64) {
        // Missed events may have touched anything.
        warn!(skipped, "Invalidation listener lagged; invalidating");
        self.cache.invalidate_all();
    }

    pub fn apply(&self, event: &MutationEvent) {
        let generation = self.cache.invalidate_all();
        debug!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = ?event.kind,
            generation,
            "Applied mutation event"
        );
    }
}

/// Running listener task.
pub struct ListenerHandle {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Apply every event already published, then end the task.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(err) = self.task.await {
            warn!(target = "cache::listener", error = %err, "Invalidation listener task failed");
        }
    }
}
