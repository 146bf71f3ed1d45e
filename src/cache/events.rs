//! Content mutation events.
//!
//! Repositories publish a [`MutationEvent`] whenever an item or taxonomy term
//! changes. The fragment cache has no per-item dependency tracking, so every
//! event invalidates the whole block family.

use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::domain::types::ItemStatus;

const DEFAULT_BUS_CAPACITY: usize = 256;

/// Monotonic epoch for ordering events within this process.
pub type Epoch = u64;

#[derive(Debug, Clone)]
pub struct MutationEvent {
    /// Unique identifier for idempotency (UUIDv4).
    pub id: Uuid,
    pub epoch: Epoch,
    pub kind: MutationKind,
    pub timestamp: OffsetDateTime,
}

impl MutationEvent {
    pub fn new(kind: MutationKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    ItemCreated { item_id: u64 },
    ItemUpdated { item_id: u64 },
    ItemDeleted { item_id: u64 },
    ItemStatusChanged { item_id: u64, status: ItemStatus },
    /// A category, tag or author record changed.
    TermsChanged { taxonomy: String },
}

/// Fan-out channel for mutation events.
pub struct MutationBus {
    sender: broadcast::Sender<MutationEvent>,
    epoch_counter: AtomicU64,
}

impl MutationBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            epoch_counter: AtomicU64::new(0),
        }
    }

    pub fn next_epoch(&self) -> Epoch {
        self.epoch_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Publish an event to every current subscriber.
    pub fn publish(&self, kind: MutationKind) -> MutationEvent {
        let event = MutationEvent::new(kind, self.next_epoch());

        let receivers = self.sender.send(event.clone()).unwrap_or(0);
        info!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = ?event.kind,
            receivers,
            "Content mutation published"
        );

        event
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MutationEvent> {
        self.sender.subscribe()
    }
}

impl Default for MutationBus {
    fn default() -> Self {
        Self::new()
    }
}
