//! News push
//!
//! Merges two news feeds, pushes each unseen item once, oldest first so
//! the channel reads chronologically. Each feed has its own seen-ID store.
//! Aggregator items carry no stable ID, so one is synthesized from source,
//! title, and timestamp. Either feed failing degrades the run to partial
//! instead of killing it.

use super::{FeatureContext, RunOutcome};
use crate::normalize::{i64_field, record_objects, str_field, timestamp_ms, Shape};
use crate::render::{bold, link, truncate_chars, utc_time};
use crate::store::SeenStore;
use serde_json::{Map, Value};

const TIME_KEYS: &[&str] = &["time", "timestamp", "releaseTime", "create_time"];

#[derive(Debug, Clone)]
pub struct NewsItem {
    pub id: String,
    /// Store suffix for the originating feed
    pub source_key: &'static str,
    pub source: String,
    pub title: String,
    pub body: Option<String>,
    pub url: Option<String>,
    pub ts_ms: Option<i64>,
}

fn provider_id(obj: &Map<String, Value>) -> Option<String> {
    str_field(obj, &["id", "newsflashId", "url", "link"])
        .map(str::to_string)
        .or_else(|| i64_field(obj, &["id", "newsflashId"]).map(|v| v.to_string()))
}

/// Aggregator feed: no stable IDs, synthesize one
pub fn parse_aggregator(body: &Value, source: &str) -> Vec<NewsItem> {
    record_objects(body, &[Shape::BareList, Shape::DataList])
        .into_iter()
        .filter_map(|obj| {
            let title = str_field(obj, &["title", "headline"])?.to_string();
            let ts_ms = timestamp_ms(obj, TIME_KEYS);
            Some(NewsItem {
                id: format!("{source}_{title}_{}", ts_ms.unwrap_or(0)),
                source_key: "tree",
                source: source.to_string(),
                body: str_field(obj, &["body", "description", "text"]).map(str::to_string),
                url: str_field(obj, &["url", "link"]).map(str::to_string),
                ts_ms,
                title,
            })
        })
        .collect()
}

/// Newsflash feed: provider IDs are stable
pub fn parse_newsflash(body: &Value, source: &str) -> Vec<NewsItem> {
    record_objects(body, &[Shape::DataList, Shape::NamedList("list"), Shape::BareList])
        .into_iter()
        .filter_map(|obj| {
            let title = str_field(obj, &["title", "headline"])?.to_string();
            Some(NewsItem {
                id: provider_id(obj)?,
                source_key: "flash",
                source: source.to_string(),
                body: str_field(obj, &["content", "body", "description"]).map(str::to_string),
                url: str_field(obj, &["url", "link"]).map(str::to_string),
                ts_ms: timestamp_ms(obj, TIME_KEYS),
                title,
            })
        })
        .collect()
}

pub fn render_item(item: &NewsItem, max_body_chars: usize) -> String {
    let mut lines = vec![format!("📰 {} | {}", item.source, bold(&item.title))];
    if let Some(body) = &item.body {
        lines.push(truncate_chars(body, max_body_chars));
    }
    if let Some(url) = &item.url {
        lines.push(link("read more", url));
    }
    if let Some(ts) = item.ts_ms {
        lines.push(format!("🕐 {}", utc_time(ts)));
    }
    lines.join("\n")
}

pub async fn run(ctx: &FeatureContext) -> RunOutcome {
    let cfg = &ctx.config.news;
    let limit = cfg.limit.to_string();

    let mut items = Vec::new();
    let mut source_failures = 0usize;

    match ctx.tree.get("/news", &[("limit", limit.as_str())]).await {
        Ok(body) => items.extend(parse_aggregator(&body, "TreeNews")),
        Err(e) => {
            source_failures += 1;
            tracing::warn!(error = %e, "tree news fetch failed");
        }
    }
    match ctx.coinglass.get("/api/newsflash/list", &[]).await {
        Ok(body) => items.extend(parse_newsflash(&body, "Newsflash")),
        Err(e) => {
            source_failures += 1;
            tracing::warn!(error = %e, "newsflash fetch failed");
        }
    }

    if items.is_empty() && source_failures > 0 {
        return RunOutcome::failure("all news sources failed");
    }

    // oldest first; undated items last
    items.sort_by_key(|item| item.ts_ms.unwrap_or(i64::MAX));

    let mut tree_store = ctx.open_store("news_tree", cfg.store_capacity);
    let mut flash_store = ctx.open_store("news_flash", cfg.store_capacity);
    let topic = ctx.topic("news");
    let mut delivered = 0usize;
    let mut failed = 0usize;

    for item in &items {
        let store: &mut dyn SeenStore = if item.source_key == "tree" {
            &mut tree_store
        } else {
            &mut flash_store
        };
        if store.contains(&item.id) {
            continue;
        }
        match ctx
            .delivery
            .deliver(&render_item(item, cfg.max_body_chars), topic)
            .await
        {
            Ok(()) => {
                store.add(&item.id);
                delivered += 1;
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(title = %item.title, error = %e, "news delivery failed");
            }
        }
    }

    if delivered > 0 {
        for store in [&mut tree_store, &mut flash_store] {
            if let Err(e) = store.persist() {
                tracing::warn!(error = %e, "seen store persist failed");
            }
        }
    }

    if failed > 0 {
        RunOutcome::partial(format!("{delivered} delivered, {failed} failed"))
    } else if source_failures > 0 {
        RunOutcome::partial(format!("{delivered} delivered, one source down"))
    } else {
        RunOutcome::success(format!("{delivered} new items"))
    }
}
