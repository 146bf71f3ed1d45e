mod support;

use magblocks::cache::CacheConfig;
use magblocks::infra::memory::ContentRecord;
use serde_json::json;

use support::{COLUMN, VERTICAL, attributes, five_items, item, repository, runtime, titles};

#[tokio::test]
async fn column_renders_newest_first_with_highlight_and_list() {
    let repository = repository(five_items());
    let runtime = runtime(&repository, CacheConfig::default());

    let html = runtime
        .registry()
        .render(COLUMN, &attributes(json!({"numberOfPosts": 3})))
        .await;

    assert_eq!(titles(html.as_str()), vec!["D5", "D4", "D3"]);
    let highlight = html
        .as_str()
        .find("tz-magazine-highlight\"")
        .expect("highlight article");
    let list = html
        .as_str()
        .find("tz-magazine-thumbnail-list")
        .expect("list container");
    assert!(highlight < list);
    assert_eq!(html.as_str().matches("tz-magazine-list-post").count(), 2);
    assert!(html.as_str().starts_with("<div class=\"wp-block-themezee-blocks-magazine-column"));
}

#[tokio::test]
async fn vertical_defaults_to_five_items_and_offset_skips() {
    let repository = repository(five_items());
    let runtime = runtime(&repository, CacheConfig::default());

    let all = runtime.registry().render(VERTICAL, &attributes(json!({}))).await;
    assert_eq!(titles(all.as_str()), vec!["D5", "D4", "D3", "D2", "D1"]);

    let shifted = runtime
        .registry()
        .render(VERTICAL, &attributes(json!({"offset": 3})))
        .await;
    assert_eq!(titles(shifted.as_str()), vec!["D2", "D1"]);
}

#[tokio::test]
async fn empty_repository_renders_structural_markup() {
    let repository = repository(Vec::new());
    let runtime = runtime(&repository, CacheConfig::default());

    let html = runtime.registry().render(COLUMN, &attributes(json!({}))).await;

    assert!(titles(html.as_str()).is_empty());
    assert!(html.as_str().contains("<div class=\"tz-magazine-highlight-post\"></div>"));
    assert!(!html.as_str().contains("<article"));
}

#[tokio::test]
async fn comments_follow_the_toggle() {
    let mut record = ContentRecord::published(item(1, "Talked about"));
    record.item.comment_count = 4;
    let repository = repository(vec![record]);
    let runtime = runtime(&repository, CacheConfig::default());

    let hidden = runtime.registry().render(COLUMN, &attributes(json!({}))).await;
    assert!(!hidden.as_str().contains("tz-meta-comments"));

    let shown = runtime
        .registry()
        .render(COLUMN, &attributes(json!({"showComments": true})))
        .await;
    assert!(shown.as_str().contains(
        "<span class=\"tz-meta-comments\"><a href=\"https://news.example/1#comments\">4 comments</a></span>"
    ));
}

#[tokio::test]
async fn derived_excerpt_is_truncated_to_whole_words() {
    let mut record = ContentRecord::published(item(1, "Long read"));
    record.item.body = (1..=40)
        .map(|n| format!("wörd{n}"))
        .collect::<Vec<_>>()
        .join(" ");
    let repository = repository(vec![record]);
    let runtime = runtime(&repository, CacheConfig::default());

    let html = runtime.registry().render(COLUMN, &attributes(json!({}))).await;

    assert!(html.as_str().contains("wörd25</p>"));
    assert!(!html.as_str().contains("wörd26"));
    assert!(html.as_str().contains(
        "<a class=\"tz-more-link\" href=\"https://news.example/1\">Continue Reading</a>"
    ));

    let disabled = runtime
        .registry()
        .render(COLUMN, &attributes(json!({"excerptLength": 0})))
        .await;
    assert!(!disabled.as_str().contains("tz-entry-content"));
}

#[tokio::test]
async fn markup_in_titles_is_escaped() {
    let repository = repository(vec![ContentRecord::published(item(1, "<script>x</script>"))]);
    let runtime = runtime(&repository, CacheConfig::default());

    let html = runtime.registry().render(COLUMN, &attributes(json!({}))).await;
    assert!(!html.as_str().contains("<script>"));
    assert!(html.as_str().contains("&#60;script&#62;x&#60;/script&#62;"));
}

#[tokio::test]
async fn identical_options_render_identical_fragments() {
    let repository = repository(five_items());
    let cold = runtime(
        &repository,
        CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        },
    );
    let warm = runtime(&repository, CacheConfig::default());
    let options = attributes(json!({"categories": "news", "showAuthor": true}));

    let first = cold.registry().render(COLUMN, &options).await;
    let second = cold.registry().render(COLUMN, &options).await;
    let cached = warm.registry().render(COLUMN, &options).await;

    assert_eq!(first, second);
    assert_eq!(first, cached);
}

#[tokio::test]
async fn repository_failure_renders_empty_and_is_not_cached() {
    let repository = repository(five_items());
    let runtime = runtime(&repository, CacheConfig::default());
    let options = attributes(json!({}));

    repository.set_failing(true);
    let failed = runtime.registry().render(COLUMN, &options).await;
    assert!(titles(failed.as_str()).is_empty());
    assert!(runtime.cache().is_empty());

    repository.set_failing(false);
    let recovered = runtime.registry().render(COLUMN, &options).await;
    assert_eq!(titles(recovered.as_str()), vec!["D5", "D4", "D3"]);
    assert_eq!(repository.query_count(), 2);
}

#[tokio::test]
async fn unknown_block_type_renders_nothing() {
    let repository = repository(five_items());
    let runtime = runtime(&repository, CacheConfig::default());

    let html = runtime
        .registry()
        .render("themezee-blocks/magazine-carousel", &attributes(json!({})))
        .await;

    assert!(html.is_empty());
    assert_eq!(repository.query_count(), 0);
}

#[tokio::test]
async fn sample_fixture_renders_published_items_only() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/sample.toml");
    let repository = std::sync::Arc::new(
        magblocks::infra::memory::InMemoryRepository::from_toml_file(&path).expect("fixture"),
    );
    let runtime = runtime(&repository, CacheConfig::default());

    let html = runtime
        .registry()
        .render(COLUMN, &attributes(json!({"categories": "city", "showCategories": true})))
        .await;

    assert_eq!(
        titles(html.as_str()),
        vec![
            "Harbour lights return for the winter festival",
            "Council approves new cycle lanes"
        ]
    );
    assert!(html.as_str().contains("src=\"https://news.example/media/harbour.jpg\""));
    assert!(!html.as_str().contains("road closures"));
}
