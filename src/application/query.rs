//! Query builder: option set → normalized repository query.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::options::OptionSet;
use crate::domain::types::{BlockVariant, ItemStatus, Order, OrderBy};

/// Normalized filter/sort/pagination parameters sent to a repository.
///
/// Built only through [`build`], so two option sets that are equal after
/// default-filling produce equal (and identically serialized) specs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QuerySpec {
    pub filters: QueryFilters,
    pub limit: u32,
    /// Present only when strictly positive.
    pub offset: Option<u32>,
    pub sort: QuerySort,
    pub status: ItemStatus,
    /// Pinned/sticky items get no special placement.
    pub ignore_sticky: bool,
    /// Repositories must not compute total match counts.
    pub count_total: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct QueryFilters {
    /// Items must carry at least one of these categories (id or slug).
    pub categories: Option<BTreeSet<String>>,
    /// Items must carry at least one of these tags (id or slug).
    pub tags: Option<BTreeSet<String>>,
    pub author: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QuerySort {
    pub field: OrderBy,
    pub direction: Order,
}

impl Default for QuerySort {
    fn default() -> Self {
        Self {
            field: OrderBy::Date,
            direction: Order::Desc,
        }
    }
}

impl QuerySpec {
    /// Canonical byte form, stable for equal specs.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Build the repository query for a block render. Pure and total.
pub fn build(variant: BlockVariant, options: &OptionSet) -> QuerySpec {
    let options = options.normalized(variant);

    let filters = QueryFilters {
        categories: (!options.categories.is_empty()).then_some(options.categories),
        tags: (!options.tags.is_empty()).then_some(options.tags),
        author: options.author,
    };

    QuerySpec {
        filters,
        limit: options.count,
        offset: (options.offset > 0).then_some(options.offset),
        sort: QuerySort {
            field: options.order_by,
            direction: options.order,
        },
        status: ItemStatus::Published,
        ignore_sticky: true,
        count_total: false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::*;

    fn options(value: serde_json::Value) -> OptionSet {
        let map: Map<String, serde_json::Value> = match value {
            serde_json::Value::Object(map) => map,
            _ => Map::new(),
        };
        OptionSet::from_raw(BlockVariant::Column, &map)
    }

    #[test]
    fn defaults_sort_newest_first_and_set_fixed_hints() {
        let spec = build(BlockVariant::Column, &OptionSet::defaults(BlockVariant::Column));
        assert_eq!(spec.sort, QuerySort::default());
        assert_eq!(spec.limit, 3);
        assert!(spec.offset.is_none());
        assert!(spec.ignore_sticky);
        assert!(!spec.count_total);
        assert_eq!(spec.status, ItemStatus::Published);
        assert_eq!(spec.filters, QueryFilters::default());
    }

    #[test]
    fn zero_offset_normalizes_like_absent_offset() {
        let absent = build(BlockVariant::Column, &options(json!({})));
        let zero = build(BlockVariant::Column, &options(json!({"offset": 0})));
        assert_eq!(absent.canonical_bytes(), zero.canonical_bytes());

        let shifted = build(BlockVariant::Column, &options(json!({"offset": 2})));
        assert_eq!(shifted.offset, Some(2));
    }

    #[test]
    fn equivalent_option_sets_produce_identical_bytes() {
        let a = build(
            BlockVariant::Column,
            &options(json!({"categories": "3,1", "order": "DESC", "numberOfPosts": 3})),
        );
        let b = build(
            BlockVariant::Column,
            &options(json!({"categories": [1, 3], "tags": " ", "orderBy": "date"})),
        );
        assert_eq!(a.canonical_bytes(), b.canonical_bytes());
    }

    #[test]
    fn filters_pass_through_when_present() {
        let spec = build(
            BlockVariant::Vertical,
            &options(json!({"tags": "news", "author": "7", "orderBy": "title", "order": "asc"})),
        );
        assert_eq!(
            spec.filters.tags,
            Some(BTreeSet::from(["news".to_string()]))
        );
        assert_eq!(spec.filters.author.as_deref(), Some("7"));
        assert_eq!(spec.sort.field, OrderBy::Title);
        assert_eq!(spec.sort.direction, Order::Asc);
    }

    #[test]
    fn hand_built_zero_count_is_clamped_to_variant_default() {
        let mut options = OptionSet::defaults(BlockVariant::Vertical);
        options.count = 0;
        assert_eq!(build(BlockVariant::Vertical, &options).limit, 5);
    }
}
