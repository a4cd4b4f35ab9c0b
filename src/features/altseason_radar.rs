//! Altseason radar
//!
//! Reads the altcoin season index for the market phase, then scans the
//! top-volume futures symbols for overbought breakouts and oversold
//! reversal setups, confirming each with the latest order book buy ratio.

use super::{FeatureContext, RunOutcome};
use crate::classify::season_phase;
use crate::config::AltseasonConfig;
use crate::normalize::{f64_field, latest_object, record_objects, str_field, Shape};
use crate::render::{bold, code, DIVIDER};
use serde_json::Value;
use std::time::Duration;

/// Season index in 0..=100, anything else is a bad read
pub fn season_index(body: &Value) -> Option<f64> {
    let obj = latest_object(body)?;
    f64_field(
        obj,
        &[
            "altcoin_index",
            "altcoin_season_index",
            "season_index",
            "index",
            "value",
        ],
    )
    .filter(|v| (0.0..=100.0).contains(v))
}

/// One RSI candidate before order book confirmation
#[derive(Debug, Clone)]
pub struct RsiCandidate {
    pub symbol: String,
    pub rsi: f64,
    pub volume: Option<f64>,
}

/// Symbols ranked by volume with their preferred-interval RSI. Records
/// without a volume rank after every record that has one.
pub fn rsi_candidates(body: &Value, top_n: usize) -> Vec<RsiCandidate> {
    let mut candidates: Vec<RsiCandidate> =
        record_objects(body, &[Shape::DataList, Shape::BareList])
            .into_iter()
            .filter_map(|obj| {
                Some(RsiCandidate {
                    symbol: str_field(obj, &["symbol", "pair", "name"])?.to_string(),
                    rsi: f64_field(obj, &["rsi_4h", "rsi_1h", "rsi"])?,
                    volume: f64_field(obj, &["volume", "turnover", "amount"]),
                })
            })
            .collect();
    candidates.sort_by(|a, b| {
        b.volume
            .unwrap_or(f64::MIN)
            .partial_cmp(&a.volume.unwrap_or(f64::MIN))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(top_n);
    candidates
}

/// Buy side share of the latest order book point, in percent
pub fn buy_ratio(body: &Value) -> Option<f64> {
    let obj = latest_object(body)?;
    let bids = f64_field(obj, &["bids_usd", "bids_amount", "bids", "buy"])?;
    let asks = f64_field(obj, &["asks_usd", "asks_amount", "asks", "sell"])?;
    let total = bids + asks;
    if total <= 0.0 {
        return None;
    }
    Some(bids / total * 100.0)
}

/// A candidate confirmed by its buy ratio
#[derive(Debug, Clone)]
pub struct ConfirmedSignal {
    pub symbol: String,
    pub rsi: f64,
    pub buy_ratio: f64,
}

fn signal_line(signal: &ConfirmedSignal) -> String {
    format!(
        "• {} RSI {} | buy ratio {}",
        bold(&signal.symbol),
        code(&format!("{:.1}", signal.rsi)),
        code(&format!("{:.1}%", signal.buy_ratio)),
    )
}

pub fn render_radar(
    index: Option<f64>,
    strong: &[ConfirmedSignal],
    oversold: &[ConfirmedSignal],
    cfg: &AltseasonConfig,
) -> String {
    let mut lines = vec![format!("🌈 {}", bold("Altseason Radar")), DIVIDER.to_string()];

    match index {
        Some(v) => {
            let leaning = if v > 50.0 {
                "altcoins leading"
            } else {
                "bitcoin leading"
            };
            lines.push(format!(
                "Season index {} ({leaning}): {}",
                code(&format!("{v:.2}")),
                season_phase(v, cfg.frenzy_index, cfg.bitcoin_index).label()
            ));
        }
        None => lines.push("Season index: n/a".to_string()),
    }

    lines.push(format!("🔥 {}", bold("Overbought breakouts")));
    if strong.is_empty() {
        lines.push("(no qualifying symbols)".to_string());
    } else {
        lines.extend(strong.iter().map(signal_line));
    }

    lines.push(format!("🧊 {}", bold("Oversold with bid support")));
    if oversold.is_empty() {
        lines.push("(no qualifying symbols)".to_string());
    } else {
        lines.extend(oversold.iter().map(signal_line));
    }

    lines.join("\n")
}

pub async fn run(ctx: &FeatureContext) -> RunOutcome {
    let cfg = ctx.config.altseason.clone();

    let index = match ctx.coinglass.get("/api/index/altcoin-season", &[]).await {
        Ok(body) => season_index(&body),
        Err(e) => {
            tracing::warn!(error = %e, "season index fetch failed");
            None
        }
    };

    let candidates = match ctx.coinglass.get("/api/futures/rsi/list", &[]).await {
        Ok(body) => rsi_candidates(&body, cfg.volume_top_n),
        Err(e) => {
            tracing::warn!(error = %e, "rsi list fetch failed");
            Vec::new()
        }
    };

    if index.is_none() && candidates.is_empty() {
        return RunOutcome::failure("no season or rsi data");
    }

    let delay = Duration::from_millis(cfg.request_delay_ms);
    let mut strong = Vec::new();
    let mut oversold = Vec::new();

    // order book confirmation only for symbols at an RSI extreme
    let extremes: Vec<&RsiCandidate> = candidates
        .iter()
        .filter(|c| c.rsi >= cfg.rsi_overbought || c.rsi <= cfg.rsi_oversold)
        .collect();
    for (i, candidate) in extremes.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }
        let params = [("symbol", candidate.symbol.as_str()), ("interval", "1h")];
        let ratio = match ctx
            .coinglass
            .get("/api/futures/orderbook/aggregated-ask-bids-history", &params)
            .await
        {
            Ok(body) => buy_ratio(&body),
            Err(e) => {
                tracing::warn!(symbol = %candidate.symbol, error = %e, "order book fetch failed");
                None
            }
        };
        let Some(ratio) = ratio else { continue };

        let signal = ConfirmedSignal {
            symbol: candidate.symbol.clone(),
            rsi: candidate.rsi,
            buy_ratio: ratio,
        };
        if candidate.rsi >= cfg.rsi_overbought && ratio >= cfg.breakout_min_buy_ratio {
            strong.push(signal);
        } else if candidate.rsi <= cfg.rsi_oversold && ratio >= cfg.oversold_min_buy_ratio {
            oversold.push(signal);
        }
    }

    strong.sort_by(|a, b| {
        b.rsi
            .partial_cmp(&a.rsi)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                b.buy_ratio
                    .partial_cmp(&a.buy_ratio)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });
    strong.truncate(cfg.top_n);
    oversold.sort_by(|a, b| a.rsi.partial_cmp(&b.rsi).unwrap_or(std::cmp::Ordering::Equal));
    oversold.truncate(cfg.top_n);

    let message = render_radar(index, &strong, &oversold, &cfg);
    match ctx
        .delivery
        .deliver(&message, ctx.topic("altseason_radar"))
        .await
    {
        Ok(()) if index.is_some() => RunOutcome::success(format!(
            "{} breakouts, {} oversold",
            strong.len(),
            oversold.len()
        )),
        Ok(()) => RunOutcome::partial("season index unavailable"),
        Err(e) => RunOutcome::failure(format!("delivery failed: {e}")),
    }
}
