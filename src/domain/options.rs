//! Typed block configuration.
//!
//! Hosts hand over an untyped attribute bag; [`OptionSet::from_raw`] turns it
//! into a fully defaulted [`OptionSet`]. Malformed values never surface as
//! errors: each field falls back to its documented default independently.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use super::types::{BlockVariant, MetaPosition, Order, OrderBy};

pub const MAX_COUNT: u32 = 100;
pub const DEFAULT_OFFSET: u32 = 0;
pub const DEFAULT_IMAGE_SIZE: &str = "full";
pub const DEFAULT_EXCERPT_LENGTH: u32 = 25;
pub const DEFAULT_MORE_TEXT: &str = "Continue Reading";

/// Resolved option set for one block render.
///
/// Field names serialize with the host attribute names so the canonical form
/// used for fingerprints matches what editors store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionSet {
    pub class_name: Option<String>,
    pub categories: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub author: Option<String>,
    #[serde(rename = "numberOfPosts")]
    pub count: u32,
    pub offset: u32,
    pub order: Order,
    pub order_by: OrderBy,
    pub image_size: String,
    pub thumbnail_size: String,
    pub meta_position: MetaPosition,
    pub show_date: bool,
    pub show_author: bool,
    pub show_categories: bool,
    pub show_comments: bool,
    pub excerpt_length: u32,
    pub more_text: String,
}

impl OptionSet {
    /// Documented defaults for a block variant.
    pub fn defaults(variant: BlockVariant) -> Self {
        Self {
            class_name: None,
            categories: BTreeSet::new(),
            tags: BTreeSet::new(),
            author: None,
            count: variant.default_count(),
            offset: DEFAULT_OFFSET,
            order: Order::Desc,
            order_by: OrderBy::Date,
            image_size: DEFAULT_IMAGE_SIZE.to_string(),
            thumbnail_size: DEFAULT_IMAGE_SIZE.to_string(),
            meta_position: MetaPosition::BelowTitle,
            show_date: true,
            show_author: true,
            show_categories: false,
            show_comments: false,
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
            more_text: DEFAULT_MORE_TEXT.to_string(),
        }
    }

    /// Resolve a raw attribute bag. Unknown keys are ignored.
    pub fn from_raw(variant: BlockVariant, raw: &Map<String, Value>) -> Self {
        let mut options = Self::defaults(variant);

        if let Some(value) = raw.get("className") {
            options.class_name = coerce_string(value);
        }
        if let Some(value) = raw.get("categories") {
            options.categories = coerce_id_set(value);
        }
        if let Some(value) = raw.get("tags") {
            options.tags = coerce_id_set(value);
        }
        if let Some(value) = raw.get("author") {
            options.author = coerce_string(value);
        }
        if let Some(value) = raw.get("numberOfPosts").or_else(|| raw.get("count")) {
            options.count = coerce_integer(value)
                .filter(|count| *count >= 1)
                .map(|count| count.min(i64::from(MAX_COUNT)) as u32)
                .unwrap_or(options.count);
        }
        if let Some(value) = raw.get("offset") {
            options.offset = coerce_integer(value)
                .and_then(|offset| u32::try_from(offset).ok())
                .unwrap_or(DEFAULT_OFFSET);
        }
        if let Some(order) = raw.get("order").and_then(Value::as_str).and_then(Order::parse) {
            options.order = order;
        }
        if let Some(order_by) = raw
            .get("orderBy")
            .and_then(Value::as_str)
            .and_then(OrderBy::parse)
        {
            options.order_by = order_by;
        }
        if let Some(size) = raw.get("imageSize").and_then(coerce_string) {
            options.image_size = size;
        }
        if let Some(size) = raw.get("thumbnailSize").and_then(coerce_string) {
            options.thumbnail_size = size;
        }
        if let Some(position) = raw
            .get("metaPosition")
            .and_then(Value::as_str)
            .and_then(MetaPosition::parse)
        {
            options.meta_position = position;
        }
        if let Some(flag) = raw.get("showDate").and_then(coerce_bool) {
            options.show_date = flag;
        }
        if let Some(flag) = raw.get("showAuthor").and_then(coerce_bool) {
            options.show_author = flag;
        }
        if let Some(flag) = raw.get("showCategories").and_then(coerce_bool) {
            options.show_categories = flag;
        }
        if let Some(flag) = raw.get("showComments").and_then(coerce_bool) {
            options.show_comments = flag;
        }
        if let Some(length) = raw
            .get("excerptLength")
            .and_then(coerce_integer)
            .and_then(|length| u32::try_from(length).ok())
        {
            options.excerpt_length = length;
        }
        if let Some(text) = raw.get("moreText").and_then(Value::as_str) {
            options.more_text = text.to_string();
        }

        options.normalized(variant)
    }

    /// Re-establish the invariants on a hand-built option set so that
    /// semantically equal configurations compare (and fingerprint) equal.
    pub fn normalized(&self, variant: BlockVariant) -> Self {
        let count = match self.count {
            0 => variant.default_count(),
            count => count.min(MAX_COUNT),
        };

        Self {
            class_name: trimmed_non_empty(self.class_name.as_deref()),
            categories: normalize_ids(&self.categories),
            tags: normalize_ids(&self.tags),
            author: trimmed_non_empty(self.author.as_deref()),
            count,
            offset: self.offset,
            order: self.order,
            order_by: self.order_by,
            image_size: trimmed_non_empty(Some(&self.image_size))
                .unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string()),
            thumbnail_size: trimmed_non_empty(Some(&self.thumbnail_size))
                .unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string()),
            meta_position: self.meta_position,
            show_date: self.show_date,
            show_author: self.show_author,
            show_categories: self.show_categories,
            show_comments: self.show_comments,
            excerpt_length: self.excerpt_length,
            more_text: self.more_text.clone(),
        }
    }
}

fn trimmed_non_empty(value: Option<&str>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn normalize_ids(ids: &BTreeSet<String>) -> BTreeSet<String> {
    ids.iter()
        .filter_map(|id| trimmed_non_empty(Some(id)))
        .collect()
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => trimmed_non_empty(Some(text)),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn coerce_id_set(value: &Value) -> BTreeSet<String> {
    match value {
        Value::String(text) => text
            .split(',')
            .filter_map(|part| trimmed_non_empty(Some(part)))
            .collect(),
        Value::Number(number) => BTreeSet::from([number.to_string()]),
        Value::Array(values) => values.iter().filter_map(coerce_string).collect(),
        _ => BTreeSet::new(),
    }
}

fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        Value::Number(number) => number.as_i64().map(|n| n != 0),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn empty_bag_yields_variant_defaults() {
        let column = OptionSet::from_raw(BlockVariant::Column, &Map::new());
        let vertical = OptionSet::from_raw(BlockVariant::Vertical, &Map::new());

        assert_eq!(column, OptionSet::defaults(BlockVariant::Column));
        assert_eq!(column.count, 3);
        assert_eq!(vertical.count, 5);
        assert_eq!(column.more_text, "Continue Reading");
        assert!(column.show_date && column.show_author);
        assert!(!column.show_categories && !column.show_comments);
    }

    #[test]
    fn negative_and_zero_counts_fall_back_to_variant_default() {
        let negative = OptionSet::from_raw(BlockVariant::Vertical, &raw(json!({"numberOfPosts": -4})));
        let zero = OptionSet::from_raw(BlockVariant::Vertical, &raw(json!({"numberOfPosts": 0})));
        assert_eq!(negative.count, 5);
        assert_eq!(zero.count, 5);
    }

    #[test]
    fn oversized_count_is_capped() {
        let options = OptionSet::from_raw(BlockVariant::Column, &raw(json!({"count": 5000})));
        assert_eq!(options.count, MAX_COUNT);
    }

    #[test]
    fn negative_offset_becomes_zero() {
        let options = OptionSet::from_raw(BlockVariant::Column, &raw(json!({"offset": -2})));
        assert_eq!(options.offset, 0);
    }

    #[test]
    fn id_sets_accept_strings_numbers_and_arrays() {
        let from_string =
            OptionSet::from_raw(BlockVariant::Column, &raw(json!({"categories": " 4, 2 ,,"})));
        let from_array =
            OptionSet::from_raw(BlockVariant::Column, &raw(json!({"categories": [2, "4"]})));
        let from_number = OptionSet::from_raw(BlockVariant::Column, &raw(json!({"tags": 9})));

        assert_eq!(from_string.categories, from_array.categories);
        assert_eq!(
            from_string.categories.iter().cloned().collect::<Vec<_>>(),
            vec!["2".to_string(), "4".to_string()]
        );
        assert!(from_number.tags.contains("9"));
    }

    #[test]
    fn invalid_values_fall_back_per_field() {
        let options = OptionSet::from_raw(
            BlockVariant::Column,
            &raw(json!({
                "order": "sideways",
                "orderBy": 42,
                "showDate": "maybe",
                "metaPosition": "nowhere",
                "imageSize": "   ",
                "excerptLength": "many",
                "unknownKey": {"nested": true}
            })),
        );
        assert_eq!(options, OptionSet::defaults(BlockVariant::Column));
    }

    #[test]
    fn whitespace_only_filters_are_dropped() {
        let options = OptionSet::from_raw(
            BlockVariant::Column,
            &raw(json!({"author": "  ", "tags": " , ", "className": "  "})),
        );
        assert!(options.author.is_none());
        assert!(options.tags.is_empty());
        assert!(options.class_name.is_none());
    }

    #[test]
    fn normalized_repairs_hand_built_sets() {
        let mut options = OptionSet::defaults(BlockVariant::Column);
        options.count = 0;
        options.image_size = " ".to_string();
        options.categories.insert(" 7 ".to_string());

        let normalized = options.normalized(BlockVariant::Column);
        assert_eq!(normalized.count, 3);
        assert_eq!(normalized.image_size, "full");
        assert!(normalized.categories.contains("7"));
    }
}
