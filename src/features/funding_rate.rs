//! Funding rate leaderboard
//!
//! Reads per-symbol funding rates across margin types for one exchange,
//! ranks by absolute rate, and posts the extremes with an example payout
//! per settlement. Stablecoin-margined entries are authoritative; the
//! token-margined list only fills symbols the stablecoin list lacks.

use super::{FeatureContext, RunOutcome};
use crate::normalize::{f64_field, record_objects, str_field, Shape};
use crate::render::{bold, code, signed_pct, DIVIDER};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct FundingRow {
    pub symbol: String,
    pub rate_pct: f64,
}

fn exchange_rate(margin_list: &Value, exchange: &str) -> Option<f64> {
    margin_list.as_array()?.iter().find_map(|entry| {
        let obj = entry.as_object()?;
        let name = str_field(obj, &["exchange", "exchange_name", "exchangeName"])?;
        if !name.eq_ignore_ascii_case(exchange) {
            return None;
        }
        f64_field(obj, &["funding_rate", "fundingRate", "rate"])
    })
}

/// Extract nonzero funding rates for one exchange, ranked by |rate|
pub fn top_rates(body: &Value, exchange: &str, top_n: usize) -> Vec<FundingRow> {
    let mut rows: Vec<FundingRow> = record_objects(body, &[Shape::DataList, Shape::BareList])
        .into_iter()
        .filter_map(|obj| {
            let symbol = str_field(obj, &["symbol", "pair", "name"])?.to_string();
            let rate_pct = obj
                .get("stablecoin_margin_list")
                .and_then(|l| exchange_rate(l, exchange))
                .or_else(|| {
                    obj.get("token_margin_list")
                        .and_then(|l| exchange_rate(l, exchange))
                })?;
            if rate_pct == 0.0 {
                return None;
            }
            Some(FundingRow { symbol, rate_pct })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.rate_pct
            .abs()
            .partial_cmp(&a.rate_pct.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    rows.truncate(top_n);
    rows
}

pub fn render_leaderboard(
    rows: &[FundingRow],
    exchange: &str,
    notional: f64,
    efficiency: f64,
) -> String {
    let mut lines = vec![
        format!("💸 {} ({exchange})", bold("Funding Rate Extremes")),
        DIVIDER.to_string(),
    ];
    for (i, row) in rows.iter().enumerate() {
        let payout = notional * efficiency * row.rate_pct.abs() / 100.0;
        let direction = if row.rate_pct > 0.0 {
            "longs pay shorts"
        } else {
            "shorts pay longs"
        };
        lines.push(format!(
            "{}. {} {} ({direction})",
            i + 1,
            bold(&row.symbol),
            code(&signed_pct(row.rate_pct, 6)),
        ));
        lines.push(format!(
            "   ~${payout:.2} per settlement on ${:.0} at {:.0}% deployed",
            notional,
            efficiency * 100.0
        ));
    }
    lines.join("\n")
}

pub async fn run(ctx: &FeatureContext) -> RunOutcome {
    let cfg = &ctx.config.funding;
    let body = match ctx
        .coinglass
        .get("/api/futures/funding-rate/exchange-list", &[])
        .await
    {
        Ok(body) => body,
        Err(e) => return RunOutcome::failure(format!("funding list fetch failed: {e}")),
    };

    let rows = top_rates(&body, &cfg.exchange, cfg.top_n);
    if rows.is_empty() {
        return RunOutcome::partial("no nonzero funding rates");
    }

    let message = render_leaderboard(&rows, &cfg.exchange, cfg.notional_usdt, cfg.capital_efficiency);
    match ctx.delivery.deliver(&message, ctx.topic("funding_rate")).await {
        Ok(()) => RunOutcome::success(format!("top {} rates", rows.len())),
        Err(e) => RunOutcome::failure(format!("delivery failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> Value {
        json!({"data": [
            {"symbol": "BTC",
             "stablecoin_margin_list": [
                {"exchange": "Binance", "funding_rate": 0.01},
                {"exchange": "OKX", "funding_rate": 0.9}
             ]},
            {"symbol": "DOGE",
             "stablecoin_margin_list": [{"exchange": "Binance", "funding_rate": -0.25}]},
            {"symbol": "ZRO",
             "token_margin_list": [{"exchange": "Binance", "funding_rate": 0.05}]},
            {"symbol": "FLAT",
             "stablecoin_margin_list": [{"exchange": "Binance", "funding_rate": 0.0}]}
        ]})
    }

    #[test]
    fn test_top_rates_by_absolute_value() {
        let rows = top_rates(&body(), "Binance", 5);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].symbol, "DOGE");
        assert_eq!(rows[1].symbol, "ZRO");
        assert_eq!(rows[2].symbol, "BTC");
    }

    #[test]
    fn test_stablecoin_entry_preferred_over_token() {
        let body = json!({"data": [
            {"symbol": "X",
             "stablecoin_margin_list": [{"exchange": "Binance", "funding_rate": 0.01}],
             "token_margin_list": [{"exchange": "Binance", "funding_rate": 0.99}]}
        ]});
        let rows = top_rates(&body, "Binance", 5);
        assert_eq!(rows[0].rate_pct, 0.01);
    }

    #[test]
    fn test_other_exchange_entries_ignored() {
        let body = json!({"data": [
            {"symbol": "X",
             "stablecoin_margin_list": [{"exchange": "OKX", "funding_rate": 0.5}]}
        ]});
        assert!(top_rates(&body, "Binance", 5).is_empty());
    }

    #[test]
    fn test_render_rate_and_payout() {
        let rows = vec![FundingRow {
            symbol: "DOGE".to_string(),
            rate_pct: -0.25,
        }];
        let text = render_leaderboard(&rows, "Binance", 10_000.0, 0.4);
        assert!(text.contains("`-0.250000%`"));
        assert!(text.contains("shorts pay longs"));
        assert!(text.contains("~$10.00 per settlement"));
    }
}
