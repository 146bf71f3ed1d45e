//! Closed enumerations shared by options, queries and templates.

use serde::{Deserialize, Serialize};

/// Layout variants served by the block family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockVariant {
    /// Grid-style block: highlighted item over a thumbnail list.
    Column,
    /// Vertical block: highlighted item followed by a stacked list.
    Vertical,
}

impl BlockVariant {
    pub const ALL: [BlockVariant; 2] = [BlockVariant::Column, BlockVariant::Vertical];

    /// Host-facing block type tag.
    pub fn tag(self) -> &'static str {
        match self {
            BlockVariant::Column => "themezee-blocks/magazine-column",
            BlockVariant::Vertical => "themezee-blocks/magazine-vertical",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL.into_iter().find(|variant| variant.tag() == tag)
    }

    pub fn default_count(self) -> u32 {
        match self {
            BlockVariant::Column => 3,
            BlockVariant::Vertical => 5,
        }
    }

    pub fn wrapper_class(self) -> &'static str {
        match self {
            BlockVariant::Column => "wp-block-themezee-blocks-magazine-column",
            BlockVariant::Vertical => "wp-block-themezee-blocks-magazine-vertical",
        }
    }

    pub fn container_class(self) -> &'static str {
        match self {
            BlockVariant::Column => "tz-magazine-column",
            BlockVariant::Vertical => "tz-magazine-vertical",
        }
    }

    pub fn list_class(self) -> &'static str {
        match self {
            BlockVariant::Column => "tz-magazine-thumbnail-list",
            BlockVariant::Vertical => "tz-magazine-list tz-magazine-thumbnail-list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Order::Asc),
            "desc" => Some(Order::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    Date,
    Title,
    Author,
    CommentCount,
}

impl OrderBy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date" => Some(OrderBy::Date),
            "title" => Some(OrderBy::Title),
            "author" => Some(OrderBy::Author),
            "comment_count" | "comment-count" | "comments" => Some(OrderBy::CommentCount),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderBy::Date => "date",
            OrderBy::Title => "title",
            OrderBy::Author => "author",
            OrderBy::CommentCount => "comment_count",
        }
    }
}

/// Where the meta row sits relative to an item title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetaPosition {
    BelowTitle,
    AboveTitle,
}

impl MetaPosition {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "below-title" => Some(MetaPosition::BelowTitle),
            "above-title" => Some(MetaPosition::AboveTitle),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MetaPosition::BelowTitle => "below-title",
            MetaPosition::AboveTitle => "above-title",
        }
    }
}

/// Publication state of a stored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Published,
    Draft,
    Private,
    Trash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_tags_round_trip() {
        for variant in BlockVariant::ALL {
            assert_eq!(BlockVariant::from_tag(variant.tag()), Some(variant));
        }
        assert_eq!(BlockVariant::from_tag("themezee-blocks/magazine-unknown"), None);
    }

    #[test]
    fn variant_defaults_differ_only_in_count() {
        assert_eq!(BlockVariant::Column.default_count(), 3);
        assert_eq!(BlockVariant::Vertical.default_count(), 5);
    }

    #[test]
    fn enum_parsing_is_lenient_about_case_and_space() {
        assert_eq!(Order::parse(" DESC "), Some(Order::Desc));
        assert_eq!(OrderBy::parse("Title"), Some(OrderBy::Title));
        assert_eq!(MetaPosition::parse("above-title"), Some(MetaPosition::AboveTitle));
        assert_eq!(Order::parse("sideways"), None);
        assert_eq!(OrderBy::parse("rand"), None);
    }
}
