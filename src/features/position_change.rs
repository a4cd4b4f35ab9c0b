//! Futures position change scanner
//!
//! Reads the market-wide price change list, fans out bounded-concurrency
//! open-interest fetches per symbol, classifies each symbol into one of
//! four price/OI quadrants, and posts the top movers per quadrant. The
//! whole scan runs under a wall-clock budget; symbols still in flight when
//! the budget expires are abandoned rather than failing the run.

use super::{FeatureContext, RunOutcome};
use crate::classify::{classify_position, PositionMove};
use crate::normalize::{f64_field, record_objects, FieldKind, FieldSpec, Normalizer, Shape};
use crate::render::{bold, code, signed_pct, DIVIDER};
use futures_util::stream::{self, StreamExt};
use std::time::Duration;

fn price_list_normalizer() -> Normalizer {
    Normalizer::new(
        vec![Shape::DataList, Shape::BareList],
        vec![
            FieldSpec {
                name: "symbol",
                keys: &["symbol", "pair", "name", "coin", "symbolName"],
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: "price_pct",
                keys: &[
                    "price_change_percent_15m",
                    "price_change_percent_1h",
                    "price_change_percent_24h",
                ],
                kind: FieldKind::Float,
            },
        ],
    )
}

/// One classified symbol
#[derive(Debug, Clone)]
pub struct PositionRow {
    pub symbol: String,
    pub price_pct: f64,
    pub oi_pct: f64,
    pub movement: PositionMove,
}

/// Open-interest change percent from a history body: last close against
/// the previous close (open as fallback). Needs at least two points and a
/// nonzero previous value.
fn oi_change_pct(body: &serde_json::Value) -> Option<f64> {
    let points = record_objects(body, &[Shape::DataList, Shape::BareList]);
    if points.len() < 2 {
        return None;
    }
    let value_of = |obj: &serde_json::Map<String, serde_json::Value>| {
        f64_field(obj, &["close", "open"])
    };
    let last = value_of(points[points.len() - 1])?;
    let prev = value_of(points[points.len() - 2])?;
    if prev == 0.0 {
        return None;
    }
    Some((last - prev) / prev * 100.0)
}

async fn scan_symbol(ctx: &FeatureContext, symbol: String, price_pct: f64) -> Option<PositionRow> {
    let params = [
        ("exchange", ctx.config.position_change.exchange.as_str()),
        ("symbol", symbol.as_str()),
        ("interval", "m15"),
    ];
    let body = match ctx
        .coinglass
        .get("/api/futures/open-interest/history", &params)
        .await
    {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(symbol, error = %e, "open interest fetch failed");
            return None;
        }
    };

    let oi_pct = oi_change_pct(&body)?;
    let movement = classify_position(price_pct, oi_pct)?;
    Some(PositionRow {
        symbol,
        price_pct,
        oi_pct,
        movement,
    })
}

/// Fan out OI fetches under the concurrency limit and deadline
async fn scan_all(ctx: &FeatureContext, candidates: Vec<(String, f64)>) -> Vec<PositionRow> {
    let cfg = &ctx.config.position_change;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(cfg.run_budget_secs);

    let mut results = Vec::new();
    let mut scans = stream::iter(
        candidates
            .into_iter()
            .map(|(symbol, price_pct)| scan_symbol(ctx, symbol, price_pct)),
    )
    .buffer_unordered(cfg.concurrency);

    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            tracing::warn!("scan budget exhausted, abandoning remaining symbols");
            break;
        }
        match tokio::time::timeout(remaining, scans.next()).await {
            Ok(Some(Some(row))) => results.push(row),
            Ok(Some(None)) => {}
            Ok(None) => break,
            Err(_) => {
                tracing::warn!("scan budget exhausted, abandoning remaining symbols");
                break;
            }
        }
    }
    results
}

fn section_header(movement: PositionMove) -> String {
    let emoji = match movement {
        PositionMove::LongOpen => "🟢",
        PositionMove::LongClose => "🟡",
        PositionMove::ShortOpen => "🔴",
        PositionMove::ShortClose => "🔵",
    };
    format!("{emoji} {}", bold(movement.label()))
}

/// Top rows for one quadrant. Opening quadrants rank by largest OI build,
/// closing quadrants by deepest OI unwind.
fn top_rows(rows: &[PositionRow], movement: PositionMove, n: usize) -> Vec<&PositionRow> {
    let mut subset: Vec<&PositionRow> =
        rows.iter().filter(|r| r.movement == movement).collect();
    let opening = matches!(movement, PositionMove::LongOpen | PositionMove::ShortOpen);
    subset.sort_by(|a, b| {
        let ord = a.oi_pct.partial_cmp(&b.oi_pct).unwrap_or(std::cmp::Ordering::Equal);
        if opening {
            ord.reverse()
        } else {
            ord
        }
    });
    subset.truncate(n);
    subset
}

pub fn render_report(rows: &[PositionRow], top_n: usize) -> String {
    let mut lines = vec![
        format!("📊 {}", bold("Position Change Scanner")),
        DIVIDER.to_string(),
    ];
    for movement in [
        PositionMove::LongOpen,
        PositionMove::ShortOpen,
        PositionMove::LongClose,
        PositionMove::ShortClose,
    ] {
        lines.push(section_header(movement));
        let top = top_rows(rows, movement, top_n);
        if top.is_empty() {
            lines.push("(no qualifying symbols)".to_string());
        } else {
            for (i, row) in top.iter().enumerate() {
                lines.push(format!(
                    "{}. {} price {} OI {}",
                    i + 1,
                    bold(&row.symbol),
                    code(&signed_pct(row.price_pct, 2)),
                    code(&signed_pct(row.oi_pct, 2)),
                ));
            }
        }
    }
    lines.join("\n")
}

pub async fn run(ctx: &FeatureContext) -> RunOutcome {
    let cfg = &ctx.config.position_change;

    let list_body = match ctx
        .coinglass
        .get("/api/futures/coins-price-change", &[])
        .await
    {
        Ok(body) => Some(body),
        Err(e) => {
            tracing::warn!(error = %e, "price change list fetch failed");
            None
        }
    };

    let candidates: Vec<(String, f64)> = list_body
        .as_ref()
        .map(|body| {
            price_list_normalizer()
                .normalize(body)
                .into_iter()
                .filter_map(|r| {
                    Some((r.text("symbol")?.to_string(), r.float("price_pct")?))
                })
                .take(cfg.max_symbols)
                .collect()
        })
        .unwrap_or_default();

    if candidates.is_empty() {
        if cfg.notify_on_empty {
            let notice = format!(
                "📊 {}\n{}\nSource data unavailable, no scan this round.",
                bold("Position Change Scanner"),
                DIVIDER
            );
            if let Err(e) = ctx.delivery.deliver(&notice, ctx.topic("position_change")).await {
                return RunOutcome::failure(format!("notice delivery failed: {e}"));
            }
        }
        return RunOutcome::partial("price change list unavailable");
    }

    let total = candidates.len();
    let rows = scan_all(ctx, candidates).await;
    let message = render_report(&rows, cfg.top_n);

    match ctx.delivery.deliver(&message, ctx.topic("position_change")).await {
        Ok(()) => RunOutcome::success(format!("classified {} of {total} symbols", rows.len())),
        Err(e) => RunOutcome::failure(format!("delivery failed: {e}")),
    }
}
