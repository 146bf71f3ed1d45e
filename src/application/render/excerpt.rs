use ammonia::Builder as AmmoniaBuilder;
use once_cell::sync::Lazy;

use crate::domain::items::ItemSummary;
use crate::domain::options::OptionSet;
use crate::presentation::views::{ExcerptView, MoreLinkView};

/// Strips every tag, drops script/style bodies and escapes the remaining text.
static TEXT_SANITIZER: Lazy<AmmoniaBuilder<'static>> = Lazy::new(|| {
    let mut builder = AmmoniaBuilder::empty();
    builder.add_clean_content_tags(&["script", "style"]);
    builder
});

pub(crate) fn plain_text(html: &str) -> String {
    TEXT_SANITIZER.clean(html).to_string()
}

/// First `limit` whitespace-separated words of `text`, joined by single
/// spaces. Splits only on whitespace, so multi-byte characters stay whole.
pub(crate) fn truncate_words(text: &str, limit: usize) -> String {
    text.split_whitespace()
        .take(limit)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Excerpt for a highlighted item. An explicit excerpt is used as written,
/// whatever the word limit; otherwise the body is truncated and followed by
/// the "more" link. A word limit of 0 turns derived excerpts off.
pub(crate) fn build_excerpt(
    item: &ItemSummary,
    options: &OptionSet,
    permalink: Option<&str>,
) -> Option<ExcerptView> {
    if let Some(explicit) = item.excerpt.as_deref() {
        let text = plain_text(explicit);
        if !text.trim().is_empty() {
            return Some(ExcerptView {
                text_html: text.trim().to_string(),
                more: None,
            });
        }
    }

    if options.excerpt_length == 0 {
        return None;
    }

    let text = truncate_words(&plain_text(&item.body), options.excerpt_length as usize);
    if text.is_empty() {
        return None;
    }

    let label = options.more_text.trim();
    let more = permalink
        .filter(|_| !label.is_empty())
        .map(|href| MoreLinkView {
            label: label.to_string(),
            href: href.to_string(),
        });

    Some(ExcerptView {
        text_html: text,
        more,
    })
}
