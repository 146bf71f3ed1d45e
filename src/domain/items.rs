//! Item summaries as handed out by a content repository.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One content item. The renderer only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    pub author: AuthorRef,
    /// Author-provided excerpt, used verbatim when present.
    #[serde(default)]
    pub excerpt: Option<String>,
    /// Raw body; excerpts are derived from it when no explicit excerpt exists.
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub featured_image: Option<FeaturedImage>,
    #[serde(default)]
    pub categories: Vec<TermRef>,
    #[serde(default)]
    pub tags: Vec<TermRef>,
    #[serde(default)]
    pub comment_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub archive_url: Option<String>,
}

/// Category or tag attached to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRef {
    pub id: String,
    #[serde(default)]
    pub slug: String,
    pub label: String,
    #[serde(default)]
    pub archive_url: Option<String>,
}

impl TermRef {
    /// Filters may name a term by identifier or by slug.
    pub fn matches(&self, needle: &str) -> bool {
        self.id == needle || (!self.slug.is_empty() && self.slug == needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedImage {
    #[serde(default)]
    pub alt: String,
    /// Size token (`full`, `thumbnail`, ...) to rendition.
    pub variants: BTreeMap<String, ImageVariant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariant {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl FeaturedImage {
    /// Pick the rendition for `size`, falling back to `full` and then to any
    /// available rendition. Renditions without a URL are skipped.
    pub fn resolve(&self, size: &str) -> Option<&ImageVariant> {
        let usable = |variant: &&ImageVariant| !variant.url.trim().is_empty();
        self.variants
            .get(size)
            .filter(usable)
            .or_else(|| self.variants.get("full").filter(usable))
            .or_else(|| self.variants.values().find(usable))
    }
}
