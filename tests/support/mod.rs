#![allow(dead_code)]

use std::sync::Arc;

use chrono_tz::Tz;
use magblocks::application::bootstrap::{MagazineRuntime, bootstrap};
use magblocks::cache::CacheConfig;
use magblocks::domain::items::{AuthorRef, ItemSummary, TermRef};
use magblocks::infra::memory::{ContentRecord, InMemoryRepository};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::macros::datetime;

pub const COLUMN: &str = "themezee-blocks/magazine-column";
pub const VERTICAL: &str = "themezee-blocks/magazine-vertical";

/// Item `id` published `id` days after 2024-01-01 noon UTC.
pub fn item(id: u64, title: &str) -> ItemSummary {
    ItemSummary {
        id,
        title: title.to_string(),
        permalink: Some(format!("https://news.example/{id}")),
        published_at: published(id),
        author: AuthorRef {
            id: "1".to_string(),
            name: "Ada Lovelace".to_string(),
            archive_url: Some("https://news.example/author/ada".to_string()),
        },
        excerpt: None,
        body: format!("Body of {title}."),
        featured_image: None,
        categories: vec![TermRef {
            id: "5".to_string(),
            slug: "news".to_string(),
            label: "News".to_string(),
            archive_url: None,
        }],
        tags: Vec::new(),
        comment_count: 0,
    }
}

pub fn published(id: u64) -> OffsetDateTime {
    datetime!(2024-01-01 12:00 UTC) + time::Duration::days(id as i64)
}

/// Five items D1..D5, D5 newest.
pub fn five_items() -> Vec<ContentRecord> {
    (1..=5)
        .map(|id| ContentRecord::published(item(id, &format!("D{id}"))))
        .collect()
}

pub fn repository(records: Vec<ContentRecord>) -> Arc<InMemoryRepository> {
    Arc::new(InMemoryRepository::with_records(records))
}

pub fn runtime(repository: &Arc<InMemoryRepository>, config: CacheConfig) -> MagazineRuntime {
    bootstrap(repository.clone(), config, Tz::UTC)
}

pub fn attributes(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("attributes must be an object, got {other}"),
    }
}

/// Linked titles in document order.
pub fn titles(html: &str) -> Vec<String> {
    html.split("class=\"tz-entry-title\">")
        .skip(1)
        .filter_map(|chunk| {
            let start = chunk.find('>')? + 1;
            let end = chunk.find("</a>")?;
            Some(chunk[start..end].to_string())
        })
        .collect()
}
