use chrono_tz::Tz;
use tracing::error;
use url::Url;

use crate::domain::fragment::Fragment;
use crate::domain::items::ItemSummary;
use crate::domain::options::OptionSet;
use crate::domain::types::{BlockVariant, MetaPosition};
use crate::presentation::views::{
    DateView, ImageView, LinkView, MagazineBlockTemplate, MetaView, PostView, render_template,
};
use crate::util::timezone;

use super::excerpt::build_excerpt;

pub const UNTITLED_PLACEHOLDER: &str = "(Untitled)";

/// Turns an ordered item sequence into block markup. Holds no per-request
/// state; the same inputs always produce the same fragment.
#[derive(Debug, Clone, Copy)]
pub struct TemplateRenderer {
    timezone: Tz,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl TemplateRenderer {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Item 0 becomes the highlighted post; the rest form the list.
    pub fn render(
        &self,
        variant: BlockVariant,
        items: &[ItemSummary],
        options: &OptionSet,
    ) -> Fragment {
        let options = options.normalized(variant);
        let mut posts = items
            .iter()
            .enumerate()
            .map(|(index, item)| self.post_view(item, index == 0, &options));

        let template = MagazineBlockTemplate {
            block_class: block_class(variant, &options),
            container_class: variant.container_class(),
            list_class: variant.list_class(),
            highlight: posts.next(),
            list: posts.collect(),
        };

        match render_template(&template) {
            Ok(html) => Fragment::from(html),
            Err(err) => {
                error!(
                    target = "application::render",
                    op = "render",
                    block = variant.tag(),
                    origin = err.origin(),
                    error = %err,
                    "Block template failed to render"
                );
                Fragment::new(String::new())
            }
        }
    }

    fn post_view(&self, item: &ItemSummary, highlighted: bool, options: &OptionSet) -> PostView {
        let href = safe_url(item.permalink.as_deref());
        let size = if highlighted {
            &options.image_size
        } else {
            &options.thumbnail_size
        };

        let title = match item.title.trim() {
            "" => UNTITLED_PLACEHOLDER.to_string(),
            title => title.to_string(),
        };

        let image = item.featured_image.as_ref().and_then(|image| {
            let variant = image.resolve(size)?;
            Some(ImageView {
                url: safe_url(Some(&variant.url))?,
                alt: image.alt.clone(),
                width: variant.width,
                height: variant.height,
            })
        });

        let meta = self.meta_view(item, options, href.as_deref());
        let excerpt = if highlighted {
            build_excerpt(item, options, href.as_deref())
        } else {
            None
        };

        PostView {
            title,
            image,
            meta: (!meta.is_empty()).then_some(meta),
            meta_above: options.meta_position == MetaPosition::AboveTitle,
            excerpt,
            href,
        }
    }

    fn meta_view(&self, item: &ItemSummary, options: &OptionSet, href: Option<&str>) -> MetaView {
        let date = options.show_date.then(|| {
            let localized = timezone::localized_datetime(item.published_at, self.timezone);
            let date = timezone::localized_date(item.published_at, self.timezone);
            DateView {
                iso: localized.to_rfc3339(),
                human: timezone::format_human_date(date),
                href: href.map(str::to_string),
            }
        });

        let author = if options.show_author && !item.author.name.trim().is_empty() {
            Some(LinkView {
                label: item.author.name.trim().to_string(),
                href: safe_url(item.author.archive_url.as_deref()),
            })
        } else {
            None
        };

        let categories = if options.show_categories {
            item.categories
                .iter()
                .filter_map(|term| {
                    let label = match term.label.trim() {
                        "" => term.slug.trim(),
                        label => label,
                    };
                    (!label.is_empty()).then(|| LinkView {
                        label: label.to_string(),
                        href: safe_url(term.archive_url.as_deref()),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        let comments = options.show_comments.then(|| LinkView {
            label: comments_label(item.comment_count),
            href: href.map(|href| format!("{href}#comments")),
        });

        MetaView {
            date,
            author,
            categories,
            comments,
        }
    }
}

fn block_class(variant: BlockVariant, options: &OptionSet) -> String {
    let mut classes = format!("{} tz-magazine-block", variant.wrapper_class());
    if let Some(extra) = options.class_name.as_deref() {
        classes.push(' ');
        classes.push_str(extra);
    }
    classes
}

pub fn comments_label(count: u32) -> String {
    match count {
        1 => "1 comment".to_string(),
        count => format!("{count} comments"),
    }
}

/// Accept absolute http(s) URLs and root-relative paths; anything else is
/// treated as missing so the affordance is omitted instead of emitting a
/// broken or unsafe link.
pub(crate) fn safe_url(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with('/') && !raw.starts_with("//") {
        return Some(raw.to_string());
    }
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
            Some(raw.to_string())
        }
        _ => None,
    }
}
