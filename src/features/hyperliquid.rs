//! Hyperliquid smart-money monitor
//!
//! Three views over Hyperliquid whale data: fresh large-notional alerts
//! (deduplicated across runs), a trader PnL tier census, and the largest
//! open positions. A run with nothing to show delivers nothing.

use super::{FeatureContext, RunOutcome};
use crate::normalize::{f64_field, record_objects, str_field, timestamp_ms, Shape};
use crate::render::{bold, code, usd_compact, DIVIDER};
use crate::store::SeenStore;
use serde_json::{Map, Value};

const STORE_NAME: &str = "hyperliquid";

const NOTIONAL_KEYS: &[&str] = &["notional_value", "notionalValue", "value", "size", "amount"];

/// Shorten a wallet address for display. Counts chars, not bytes, so an
/// address with multi-byte characters never splits mid-character.
fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    } else {
        address.to_string()
    }
}

#[derive(Debug, Clone)]
pub struct WhaleAlert {
    pub id: String,
    pub symbol: String,
    pub side: String,
    pub notional_usd: f64,
}

pub fn parse_alerts(body: &Value, min_notional: f64) -> Vec<WhaleAlert> {
    record_objects(body, &[Shape::DataList, Shape::BareList])
        .into_iter()
        .filter_map(|obj| {
            let notional = f64_field(obj, NOTIONAL_KEYS)?;
            if notional < min_notional {
                return None;
            }
            let symbol = str_field(obj, &["symbol", "coin", "asset"])?.to_string();
            let ts = timestamp_ms(obj, &["time", "timestamp", "create_time"]).unwrap_or(0);
            Some(WhaleAlert {
                id: format!("{ts}_{symbol}_{notional}"),
                side: str_field(obj, &["side", "position_side", "direction"])
                    .unwrap_or("unknown")
                    .to_string(),
                symbol,
                notional_usd: notional,
            })
        })
        .collect()
}

/// Trader counts per PnL tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PnlCensus {
    pub money_printers: usize,
    pub smart_money: usize,
}

pub fn pnl_census(body: &Value, smart_min: f64, printer_min: f64) -> PnlCensus {
    let mut census = PnlCensus::default();
    for obj in record_objects(body, &[Shape::DataList, Shape::BareList]) {
        let Some(pnl) = f64_field(obj, &["pnl", "total_pnl", "totalPnl", "profit"]) else {
            continue;
        };
        if pnl >= printer_min {
            census.money_printers += 1;
        } else if pnl >= smart_min {
            census.smart_money += 1;
        }
    }
    census
}

#[derive(Debug, Clone)]
pub struct WhalePosition {
    pub address: String,
    pub symbol: String,
    pub side: String,
    pub value_usd: f64,
}

fn position_value(obj: &Map<String, Value>) -> Option<f64> {
    f64_field(obj, &["position_value", "position_value_usd", "positionValue", "size_usd", "value"]).or_else(|| {
        let size = f64_field(obj, &["size", "position_size"])?;
        let price = f64_field(obj, &["entry_price", "mark_price", "price"])?;
        Some(size * price)
    })
}

pub fn top_positions(body: &Value, top_n: usize) -> Vec<WhalePosition> {
    let mut positions: Vec<WhalePosition> =
        record_objects(body, &[Shape::DataList, Shape::BareList])
            .into_iter()
            .filter_map(|obj| {
                Some(WhalePosition {
                    address: str_field(obj, &["user", "address", "account"])
                        .unwrap_or("unknown")
                        .to_string(),
                    symbol: str_field(obj, &["symbol", "coin", "asset"])?.to_string(),
                    side: str_field(obj, &["side", "position_side", "direction"])
                        .unwrap_or("unknown")
                        .to_string(),
                    value_usd: position_value(obj)?,
                })
            })
            .collect();
    positions.sort_by(|a, b| {
        b.value_usd
            .partial_cmp(&a.value_usd)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    positions.truncate(top_n);
    positions
}

pub fn render_report(
    alerts: &[&WhaleAlert],
    census: PnlCensus,
    positions: &[WhalePosition],
) -> String {
    let mut lines = vec![
        format!("🐙 {}", bold("Hyperliquid Smart Money")),
        DIVIDER.to_string(),
    ];

    if !alerts.is_empty() {
        lines.push(format!("🚨 {}", bold("Whale alerts")));
        for alert in alerts {
            lines.push(format!(
                "• {} {} {}",
                bold(&alert.symbol),
                alert.side,
                code(&usd_compact(alert.notional_usd))
            ));
        }
    }

    if census != PnlCensus::default() {
        lines.push(format!("💰 {}", bold("Trader PnL census")));
        lines.push(format!(
            "Money printers (≥$1M): {} | Smart money ($100K-$1M): {}",
            census.money_printers, census.smart_money
        ));
    }

    if !positions.is_empty() {
        lines.push(format!("🏦 {}", bold("Largest positions")));
        for (i, pos) in positions.iter().enumerate() {
            lines.push(format!(
                "{}. {} {} {} by {}",
                i + 1,
                bold(&pos.symbol),
                pos.side,
                code(&usd_compact(pos.value_usd)),
                short_address(&pos.address)
            ));
        }
    }

    lines.join("\n")
}

pub async fn run(ctx: &FeatureContext) -> RunOutcome {
    let cfg = &ctx.config.hyperliquid;

    let alerts = match ctx.coinglass.get("/api/hyperliquid/whale-alert", &[]).await {
        Ok(body) => parse_alerts(&body, cfg.whale_alert_min_usd),
        Err(e) => {
            tracing::warn!(error = %e, "whale alert fetch failed");
            Vec::new()
        }
    };

    let census = match ctx
        .coinglass
        .get("/api/hyperliquid/wallet/pnl-distribution", &[])
        .await
    {
        Ok(body) => pnl_census(&body, cfg.smart_money_pnl_min, cfg.money_printer_pnl_min),
        Err(e) => {
            tracing::warn!(error = %e, "whale pnl fetch failed");
            PnlCensus::default()
        }
    };

    let positions = match ctx
        .coinglass
        .get("/api/hyperliquid/whale-position", &[])
        .await
    {
        Ok(body) => top_positions(&body, cfg.top_positions),
        Err(e) => {
            tracing::warn!(error = %e, "whale position fetch failed");
            Vec::new()
        }
    };

    let mut store = ctx.open_store(STORE_NAME, cfg.store_capacity);
    let fresh_alerts: Vec<&WhaleAlert> = alerts
        .iter()
        .filter(|a| !store.contains(&a.id))
        .take(cfg.max_alerts)
        .collect();

    if fresh_alerts.is_empty() && census == PnlCensus::default() && positions.is_empty() {
        return RunOutcome::success("nothing new to report");
    }

    let message = render_report(&fresh_alerts, census, &positions);
    match ctx.delivery.deliver(&message, ctx.topic(STORE_NAME)).await {
        Ok(()) => {
            let alert_count = fresh_alerts.len();
            let ids: Vec<String> = fresh_alerts.iter().map(|a| a.id.clone()).collect();
            for id in &ids {
                store.add(id);
            }
            if !ids.is_empty() {
                if let Err(e) = store.persist() {
                    tracing::warn!(error = %e, "seen store persist failed");
                }
            }
            RunOutcome::success(format!(
                "{alert_count} alerts, {} positions",
                positions.len()
            ))
        }
        Err(e) => RunOutcome::failure(format!("delivery failed: {e}")),
    }
}
