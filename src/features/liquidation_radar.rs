//! Liquidation radar
//!
//! Sums aggregated long and short liquidation volume over 1h and 24h
//! windows per symbol and alerts when either window reaches its tier
//! threshold. Nothing is delivered on a quiet market.

use super::{FeatureContext, RunOutcome};
use crate::classify::{liquidation_trigger, TriggerWindow};
use crate::normalize::{f64_field, record_objects, timestamp_ms, Shape};
use crate::render::{bold, code, usd_compact, DIVIDER};
use serde_json::Value;
use std::time::Duration;

const LONG_KEYS: &[&str] = &[
    "aggregated_long_liquidation_usd",
    "long_liquidation_usd",
    "longLiquidationUsd",
];
const SHORT_KEYS: &[&str] = &[
    "aggregated_short_liquidation_usd",
    "short_liquidation_usd",
    "shortLiquidationUsd",
];
const TIME_KEYS: &[&str] = &["time", "t", "ts", "timestamp", "create_time"];

/// Long and short liquidation volume over one window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowTotals {
    pub long_usd: f64,
    pub short_usd: f64,
}

impl WindowTotals {
    pub fn total(&self) -> f64 {
        self.long_usd + self.short_usd
    }

    fn dominant_side(&self) -> &'static str {
        if self.long_usd >= self.short_usd {
            "longs"
        } else {
            "shorts"
        }
    }
}

/// 1h and 24h totals, windowed against the newest point's timestamp.
/// With no usable timestamps at all, the newest point alone stands in
/// for both windows.
pub fn window_totals(body: &Value) -> Option<(WindowTotals, WindowTotals)> {
    let points = record_objects(body, &[Shape::DataList, Shape::BareList]);
    if points.is_empty() {
        return None;
    }

    let newest_ts = points.iter().rev().find_map(|p| timestamp_ms(p, TIME_KEYS));
    let Some(newest_ts) = newest_ts else {
        // no timestamps: treat the last point as the whole picture
        let last = points.last()?;
        let totals = WindowTotals {
            long_usd: f64_field(last, LONG_KEYS).unwrap_or(0.0),
            short_usd: f64_field(last, SHORT_KEYS).unwrap_or(0.0),
        };
        return Some((totals, totals));
    };

    let hour_floor = newest_ts - 3_600_000;
    let day_floor = newest_ts - 86_400_000;
    let mut totals_1h = WindowTotals::default();
    let mut totals_24h = WindowTotals::default();

    for point in points.iter().rev() {
        let Some(ts) = timestamp_ms(point, TIME_KEYS) else {
            continue;
        };
        if ts < day_floor {
            break;
        }
        let long = f64_field(point, LONG_KEYS).unwrap_or(0.0);
        let short = f64_field(point, SHORT_KEYS).unwrap_or(0.0);
        totals_24h.long_usd += long;
        totals_24h.short_usd += short;
        if ts >= hour_floor {
            totals_1h.long_usd += long;
            totals_1h.short_usd += short;
        }
    }
    Some((totals_1h, totals_24h))
}

#[derive(Debug, Clone)]
pub struct LiquidationAlert {
    pub symbol: String,
    pub window: TriggerWindow,
    pub totals: WindowTotals,
}

pub fn render_alerts(alerts: &[LiquidationAlert]) -> String {
    let mut lines = vec![
        format!("💥 {}", bold("Liquidation Radar")),
        DIVIDER.to_string(),
    ];
    for alert in alerts {
        lines.push(format!(
            "🚨 {} {} liquidations {} ({} dominant)",
            bold(&alert.symbol),
            alert.window.label(),
            code(&usd_compact(alert.totals.total())),
            alert.totals.dominant_side(),
        ));
        lines.push(format!(
            "   longs {} | shorts {}",
            usd_compact(alert.totals.long_usd),
            usd_compact(alert.totals.short_usd)
        ));
    }
    lines.join("\n")
}

pub async fn run(ctx: &FeatureContext) -> RunOutcome {
    let cfg = ctx.config.liquidation.clone();
    let delay = Duration::from_millis(cfg.request_delay_ms);

    let mut alerts = Vec::new();
    let mut fetch_failures = 0usize;

    for (i, symbol) in cfg.symbols.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }
        let params = [
            ("exchange_list", cfg.exchange_list.as_str()),
            ("symbol", symbol.as_str()),
            ("interval", cfg.interval.as_str()),
        ];
        let body = match ctx
            .coinglass
            .get("/api/futures/liquidation/aggregated-history", &params)
            .await
        {
            Ok(body) => body,
            Err(e) => {
                fetch_failures += 1;
                tracing::warn!(symbol, error = %e, "liquidation fetch failed");
                continue;
            }
        };

        let Some((totals_1h, totals_24h)) = window_totals(&body) else {
            continue;
        };
        if let Some(window) = liquidation_trigger(symbol, totals_1h.total(), totals_24h.total(), &cfg)
        {
            let totals = match window {
                TriggerWindow::OneHour => totals_1h,
                TriggerWindow::TwentyFourHour => totals_24h,
            };
            alerts.push(LiquidationAlert {
                symbol: symbol.clone(),
                window,
                totals,
            });
        }
    }

    if alerts.is_empty() {
        return if fetch_failures == cfg.symbols.len() {
            RunOutcome::failure("all symbol fetches failed")
        } else {
            RunOutcome::success("no thresholds crossed")
        };
    }

    // loudest first, by the volume that tripped the alert
    alerts.sort_by(|a, b| {
        b.totals
            .total()
            .partial_cmp(&a.totals.total())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let message = render_alerts(&alerts);
    match ctx
        .delivery
        .deliver(&message, ctx.topic("liquidation_radar"))
        .await
    {
        Ok(()) if fetch_failures == 0 => RunOutcome::success(format!("{} alerts", alerts.len())),
        Ok(()) => RunOutcome::partial(format!(
            "{} alerts, {fetch_failures} symbols unreachable",
            alerts.len()
        )),
        Err(e) => RunOutcome::failure(format!("delivery failed: {e}")),
    }
}
