//! In-memory content repository.
//!
//! Backs the CLI host (loaded from a TOML fixture) and the test suite. Every
//! write publishes its [`MutationEvent`] while still holding the write lock,
//! so no reader sees the change before the event is queued.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use tracing::debug;

use crate::application::query::QuerySpec;
use crate::application::repos::{ContentRepository, RepoError};
use crate::cache::lock::{rw_read, rw_write};
use crate::cache::{MutationBus, MutationEvent, MutationKind};
use crate::domain::items::ItemSummary;
use crate::domain::types::{ItemStatus, Order, OrderBy};

use super::error::InfraError;

const SOURCE: &str = "infra::memory";

/// A stored item plus the repository-only fields queries filter on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(flatten)]
    pub item: ItemSummary,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub sticky: bool,
}

impl ContentRecord {
    pub fn published(item: ItemSummary) -> Self {
        Self {
            item,
            status: ItemStatus::Published,
            sticky: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    items: Vec<ContentRecord>,
}

pub struct InMemoryRepository {
    records: RwLock<BTreeMap<u64, ContentRecord>>,
    bus: MutationBus,
    queries: AtomicUsize,
    latency: Option<Duration>,
    failing: AtomicBool,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
            bus: MutationBus::new(),
            queries: AtomicUsize::new(0),
            latency: None,
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_records(records: impl IntoIterator<Item = ContentRecord>) -> Self {
        let repository = Self::new();
        {
            let mut stored = rw_write(&repository.records, SOURCE, "with_records");
            for record in records {
                stored.insert(record.item.id, record);
            }
        }
        repository
    }

    /// Delay every query by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        let fixture: Fixture = toml::from_str(source)?;
        Ok(Self::with_records(fixture.items))
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, InfraError> {
        let source = std::fs::read_to_string(path)?;
        let repository = Self::from_toml_str(&source)
            .map_err(|err| InfraError::fixture(path.display().to_string(), err.to_string()))?;
        debug!(
            target = "infra::memory",
            path = %path.display(),
            items = repository.len(),
            "Loaded content fixture"
        );
        Ok(repository)
    }

    pub fn len(&self) -> usize {
        rw_read(&self.records, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `query` calls served so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Make subsequent queries fail until switched off again.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn bus(&self) -> &MutationBus {
        &self.bus
    }

    /// Insert or replace a record.
    pub fn upsert(&self, record: ContentRecord) -> MutationEvent {
        let item_id = record.item.id;
        let mut records = rw_write(&self.records, SOURCE, "upsert");
        let kind = if records.insert(item_id, record).is_some() {
            MutationKind::ItemUpdated { item_id }
        } else {
            MutationKind::ItemCreated { item_id }
        };
        self.bus.publish(kind)
    }

    pub fn delete(&self, item_id: u64) -> Option<MutationEvent> {
        let mut records = rw_write(&self.records, SOURCE, "delete");
        records.remove(&item_id)?;
        Some(self.bus.publish(MutationKind::ItemDeleted { item_id }))
    }

    pub fn set_status(&self, item_id: u64, status: ItemStatus) -> Option<MutationEvent> {
        let mut records = rw_write(&self.records, SOURCE, "set_status");
        records.get_mut(&item_id)?.status = status;
        Some(self.bus.publish(MutationKind::ItemStatusChanged { item_id, status }))
    }

    /// Record a taxonomy change (renamed category, retitled author, ...).
    pub fn terms_changed(&self, taxonomy: impl Into<String>) -> MutationEvent {
        self.bus.publish(MutationKind::TermsChanged {
            taxonomy: taxonomy.into(),
        })
    }

    fn select(&self, spec: &QuerySpec) -> Vec<ItemSummary> {
        let records = rw_read(&self.records, SOURCE, "query");
        let mut matching: Vec<&ContentRecord> = records
            .values()
            .filter(|record| record.status == spec.status)
            .filter(|record| matches_filters(record, spec))
            .collect();

        matching.sort_by(|left, right| {
            let pinned = if spec.ignore_sticky {
                CmpOrdering::Equal
            } else {
                right.sticky.cmp(&left.sticky)
            };
            pinned.then_with(|| compare(&left.item, &right.item, spec))
        });

        matching
            .into_iter()
            .skip(spec.offset.unwrap_or(0) as usize)
            .take(spec.limit as usize)
            .map(|record| record.item.clone())
            .collect()
    }
}

fn matches_filters(record: &ContentRecord, spec: &QuerySpec) -> bool {
    let filters = &spec.filters;
    let item = &record.item;

    if let Some(categories) = filters.categories.as_ref()
        && !item
            .categories
            .iter()
            .any(|term| categories.iter().any(|needle| term.matches(needle)))
    {
        return false;
    }
    if let Some(tags) = filters.tags.as_ref()
        && !item
            .tags
            .iter()
            .any(|term| tags.iter().any(|needle| term.matches(needle)))
    {
        return false;
    }
    if let Some(author) = filters.author.as_deref()
        && item.author.id != author
    {
        return false;
    }
    true
}

/// Order by the requested field, ties broken by id so results are stable.
fn compare(left: &ItemSummary, right: &ItemSummary, spec: &QuerySpec) -> CmpOrdering {
    let primary = match spec.sort.field {
        OrderBy::Date => left.published_at.cmp(&right.published_at),
        OrderBy::Title => left.title.to_lowercase().cmp(&right.title.to_lowercase()),
        OrderBy::Author => left
            .author
            .name
            .to_lowercase()
            .cmp(&right.author.name.to_lowercase()),
        OrderBy::CommentCount => left.comment_count.cmp(&right.comment_count),
    };
    let ordering = primary.then_with(|| left.id.cmp(&right.id));
    match spec.sort.direction {
        Order::Asc => ordering,
        Order::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn query(&self, spec: &QuerySpec) -> Result<Vec<ItemSummary>, RepoError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepoError::Unavailable("in-memory store offline".to_string()));
        }

        Ok(self.select(spec))
    }

    fn mutations(&self) -> broadcast::Receiver<MutationEvent> {
        self.bus.subscribe()
    }

    fn revision(&self) -> Option<String> {
        let records = rw_read(&self.records, SOURCE, "revision");
        let canonical = serde_json::to_vec(&*records).ok()?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        Some(hex::encode(hasher.finalize()))
    }
}
