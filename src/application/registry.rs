//! Host-facing block registry.
//!
//! Declares each variant's option schema and maps a host render call
//! (`block type tag` + raw attributes) onto the pipeline.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::application::pipeline::MagazinePipeline;
use crate::domain::fragment::Fragment;
use crate::domain::options::OptionSet;
use crate::domain::types::BlockVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionField {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSchema {
    pub tag: &'static str,
    pub fields: Vec<OptionField>,
}

const FIELDS: &[(&str, FieldKind)] = &[
    ("className", FieldKind::String),
    ("categories", FieldKind::String),
    ("tags", FieldKind::String),
    ("author", FieldKind::String),
    ("numberOfPosts", FieldKind::Number),
    ("offset", FieldKind::Number),
    ("order", FieldKind::String),
    ("orderBy", FieldKind::String),
    ("imageSize", FieldKind::String),
    ("thumbnailSize", FieldKind::String),
    ("metaPosition", FieldKind::String),
    ("showDate", FieldKind::Boolean),
    ("showAuthor", FieldKind::Boolean),
    ("showCategories", FieldKind::Boolean),
    ("showComments", FieldKind::Boolean),
    ("excerptLength", FieldKind::Number),
    ("moreText", FieldKind::String),
];

/// Option schema for `variant`, with defaults taken from
/// [`OptionSet::defaults`]. Fields without a default (filters, extra class)
/// carry none.
pub fn schema(variant: BlockVariant) -> BlockSchema {
    let defaults = match serde_json::to_value(OptionSet::defaults(variant)) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let fields = FIELDS
        .iter()
        .map(|&(name, kind)| OptionField {
            name,
            kind,
            default: defaults.get(name).and_then(|value| match value {
                Value::Null => None,
                Value::Array(values) if values.is_empty() => None,
                value => Some(value.clone()),
            }),
        })
        .collect();

    BlockSchema {
        tag: variant.tag(),
        fields,
    }
}

pub struct BlockRegistry {
    pipeline: Arc<MagazinePipeline>,
}

impl BlockRegistry {
    pub fn new(pipeline: Arc<MagazinePipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Arc<MagazinePipeline> {
        &self.pipeline
    }

    pub fn schemas(&self) -> Vec<BlockSchema> {
        BlockVariant::ALL.into_iter().map(schema).collect()
    }

    /// Resolve a host attribute bag into a typed option set.
    pub fn resolve(&self, tag: &str, raw: &Map<String, Value>) -> Option<(BlockVariant, OptionSet)> {
        let variant = BlockVariant::from_tag(tag)?;
        Some((variant, OptionSet::from_raw(variant, raw)))
    }

    /// Host entry point. Unknown block types render as an empty string.
    pub async fn render(&self, tag: &str, raw: &Map<String, Value>) -> Fragment {
        match self.resolve(tag, raw) {
            Some((variant, options)) => self.pipeline.render(variant, &options).await,
            None => {
                warn!(
                    target = "application::registry",
                    op = "render",
                    block = tag,
                    "Unknown block type requested"
                );
                Fragment::new(String::new())
            }
        }
    }
}
