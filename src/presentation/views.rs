use askama::{Error as AskamaError, Template};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }

    pub fn origin(&self) -> &'static str {
        self.source
    }
}

pub fn render_template<T: Template>(template: &T) -> Result<String, TemplateRenderError> {
    template.render().map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
    })
}

/// A label that links somewhere when a usable URL is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkView {
    pub label: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateView {
    /// Machine-readable RFC 3339 timestamp in the display zone.
    pub iso: String,
    pub human: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaView {
    pub date: Option<DateView>,
    pub author: Option<LinkView>,
    pub categories: Vec<LinkView>,
    pub comments: Option<LinkView>,
}

impl MetaView {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.author.is_none()
            && self.categories.is_empty()
            && self.comments.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoreLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcerptView {
    /// Sanitized text, already HTML-escaped.
    pub text_html: String,
    pub more: Option<MoreLinkView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostView {
    pub title: String,
    pub href: Option<String>,
    pub image: Option<ImageView>,
    pub meta: Option<MetaView>,
    pub meta_above: bool,
    pub excerpt: Option<ExcerptView>,
}

/// Outer markup of one magazine block: a highlighted post followed by a list.
#[derive(Template)]
#[template(path = "magazine/block.html")]
pub struct MagazineBlockTemplate {
    pub block_class: String,
    pub container_class: &'static str,
    pub list_class: &'static str,
    pub highlight: Option<PostView>,
    pub list: Vec<PostView>,
}
