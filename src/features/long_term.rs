//! Long-term cycle navigator
//!
//! Combines four slow indicators (ahr999, fear & greed, pi-cycle top,
//! rainbow chart) into one cycle readout, plus a bubble warning when
//! extreme greed coincides with a pi-cycle cross. Missing indicators
//! degrade the message instead of blocking it.

use super::{FeatureContext, RunOutcome};
use crate::classify::{ahr_zone, fear_greed_band, rainbow_band, AhrZone, RainbowBand};
use crate::normalize::{bool_field, coerce_f64, f64_field, latest_object};
use crate::render::{bold, code, DIVIDER};
use serde_json::Value;

/// Everything the navigator managed to read this run
#[derive(Debug, Clone, Default)]
pub struct CycleSnapshot {
    pub ahr999: Option<f64>,
    pub fear_greed: Option<f64>,
    pub pi_crossed: Option<bool>,
    pub rainbow: Option<RainbowBand>,
}

fn read_ahr999(body: &Value) -> Option<f64> {
    latest_object(body).and_then(|obj| f64_field(obj, &["ahr999_value", "ahr999", "ahr999_index"]))
}

/// Fear & greed bodies either carry a `data_list` of raw values or a
/// single object with a value field
fn read_fear_greed(body: &Value) -> Option<f64> {
    let obj = latest_object(body)?;
    if let Some(list) = obj.get("data_list").and_then(Value::as_array) {
        return list.iter().rev().find_map(coerce_f64);
    }
    f64_field(obj, &["value", "score", "index"])
}

/// Pi-cycle cross: an explicit flag when the source provides one, else
/// the 110DMA at or above the doubled 350DMA
fn read_pi_cycle(body: &Value) -> Option<bool> {
    let obj = latest_object(body)?;
    if let Some(flag) = bool_field(obj, &["pi_cycle_top", "is_crossed", "crossed"]) {
        return Some(flag);
    }
    let ma_110 = f64_field(obj, &["ma_110", "ma110"])?;
    let ma_350_x2 = f64_field(obj, &["ma_350_mu_2", "ma_350_x2", "ma350_mu_2"])?;
    Some(ma_110 >= ma_350_x2)
}

/// Rainbow rows come as arrays `[band levels.., price]` or as an object
/// with a price and a level list
fn read_rainbow(body: &Value) -> Option<RainbowBand> {
    if let Some(rows) = body.get("data").and_then(Value::as_array) {
        if let Some(last_row) = rows.iter().rev().find_map(Value::as_array) {
            let numbers: Vec<f64> = last_row.iter().filter_map(coerce_f64).collect();
            if numbers.len() >= 4 {
                let price = numbers[numbers.len() - 1];
                return rainbow_band(price, &numbers[..numbers.len() - 1]);
            }
        }
    }
    let obj = latest_object(body)?;
    let price = f64_field(obj, &["price", "btc_price", "close"])?;
    let levels: Vec<f64> = obj
        .get("levels")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(coerce_f64)
        .collect();
    rainbow_band(price, &levels)
}

pub fn render_snapshot(snapshot: &CycleSnapshot, cfg: &crate::config::LongTermConfig) -> String {
    let mut lines = vec![
        format!("🧭 {}", bold("Long-Term Cycle Navigator")),
        DIVIDER.to_string(),
    ];

    match snapshot.ahr999 {
        Some(v) => lines.push(format!(
            "Ahr999 {}: {}",
            code(&format!("{v:.4}")),
            ahr_zone(v, cfg).label()
        )),
        None => lines.push("Ahr999: n/a".to_string()),
    }

    match snapshot.fear_greed {
        Some(v) => lines.push(format!(
            "Fear & Greed {}: {}",
            code(&format!("{v:.0}")),
            fear_greed_band(v).label()
        )),
        None => lines.push("Fear & Greed: n/a".to_string()),
    }

    match snapshot.pi_crossed {
        Some(true) => lines.push("Pi-cycle top: ⚠️ crossed".to_string()),
        Some(false) => lines.push("Pi-cycle top: ✅ not crossed".to_string()),
        None => lines.push("Pi-cycle top: n/a".to_string()),
    }

    match snapshot.rainbow {
        Some(band) => lines.push(format!("Rainbow chart: {}", band.label())),
        None => lines.push("Rainbow chart: n/a".to_string()),
    }

    let bubble = matches!(
        (snapshot.fear_greed, snapshot.pi_crossed),
        (Some(fg), Some(true)) if fg > cfg.bubble_greed_index as f64
    );
    if bubble {
        lines.push(DIVIDER.to_string());
        lines.push("🫧 *Bubble warning*: extreme greed with a pi-cycle cross.".to_string());
    }

    if let Some(v) = snapshot.ahr999 {
        let advice = match ahr_zone(v, cfg) {
            AhrZone::Bottom => "Historically favorable accumulation territory.",
            AhrZone::Dca => "Regular accumulation remains reasonable here.",
            AhrZone::Overvalued => "Chasing entries here has been punished historically.",
        };
        lines.push(format!("💡 {advice}"));
    }

    lines.join("\n")
}

pub async fn run(ctx: &FeatureContext) -> RunOutcome {
    let mut snapshot = CycleSnapshot::default();
    let mut missing = 0usize;

    match ctx.coinglass.get("/api/index/ahr999", &[]).await {
        Ok(body) => snapshot.ahr999 = read_ahr999(&body),
        Err(e) => tracing::warn!(error = %e, "ahr999 fetch failed"),
    }
    match ctx.coinglass.get("/api/index/fear-greed-history", &[]).await {
        Ok(body) => snapshot.fear_greed = read_fear_greed(&body),
        Err(e) => tracing::warn!(error = %e, "fear greed fetch failed"),
    }
    match ctx.coinglass.get("/api/index/pi-cycle-indicator", &[]).await {
        Ok(body) => snapshot.pi_crossed = read_pi_cycle(&body),
        Err(e) => tracing::warn!(error = %e, "pi cycle fetch failed"),
    }
    match ctx.coinglass.get("/api/index/bitcoin/rainbow-chart", &[]).await {
        Ok(body) => snapshot.rainbow = read_rainbow(&body),
        Err(e) => tracing::warn!(error = %e, "rainbow chart fetch failed"),
    }

    for absent in [
        snapshot.ahr999.is_none(),
        snapshot.fear_greed.is_none(),
        snapshot.pi_crossed.is_none(),
        snapshot.rainbow.is_none(),
    ] {
        if absent {
            missing += 1;
        }
    }
    if missing == 4 {
        return RunOutcome::failure("no indicator data");
    }

    let message = render_snapshot(&snapshot, &ctx.config.long_term);
    match ctx.delivery.deliver(&message, ctx.topic("long_term")).await {
        Ok(()) if missing == 0 => RunOutcome::success("all indicators read"),
        Ok(()) => RunOutcome::partial(format!("{missing} indicators missing")),
        Err(e) => RunOutcome::failure(format!("delivery failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LongTermConfig;
    use serde_json::json;

    #[test]
    fn test_read_ahr999_synonyms() {
        let body = json!({"data": [{"ahr999": "0.41"}]});
        assert_eq!(read_ahr999(&body), Some(0.41));
    }

    #[test]
    fn test_read_fear_greed_data_list() {
        let body = json!({"data": {"data_list": [55, 60, 72]}});
        assert_eq!(read_fear_greed(&body), Some(72.0));
    }

    #[test]
    fn test_read_pi_cycle_from_mas() {
        let body = json!({"data": [{"ma_110": 71000.0, "ma_350_mu_2": 70000.0}]});
        assert_eq!(read_pi_cycle(&body), Some(true));
        let body = json!({"data": [{"ma_110": 50000.0, "ma_350_mu_2": 70000.0}]});
        assert_eq!(read_pi_cycle(&body), Some(false));
    }

    #[test]
    fn test_read_pi_cycle_flag_wins() {
        let body = json!({"data": [{"pi_cycle_top": false, "ma_110": 2.0, "ma_350_mu_2": 1.0}]});
        assert_eq!(read_pi_cycle(&body), Some(false));
    }

    #[test]
    fn test_read_rainbow_array_rows() {
        // levels ascending, price at the end sits in the top third
        let body = json!({"data": [
            [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 95.0]
        ]});
        assert_eq!(read_rainbow(&body), Some(RainbowBand::High));
    }

    #[test]
    fn test_bubble_warning_requires_both() {
        let cfg = LongTermConfig::default();
        let hot = CycleSnapshot {
            fear_greed: Some(85.0),
            pi_crossed: Some(true),
            ..Default::default()
        };
        assert!(render_snapshot(&hot, &cfg).contains("Bubble warning"));

        let greed_only = CycleSnapshot {
            fear_greed: Some(85.0),
            pi_crossed: Some(false),
            ..Default::default()
        };
        assert!(!render_snapshot(&greed_only, &cfg).contains("Bubble warning"));

        // boundary: exactly at the greed cut does not warn
        let boundary = CycleSnapshot {
            fear_greed: Some(80.0),
            pi_crossed: Some(true),
            ..Default::default()
        };
        assert!(!render_snapshot(&boundary, &cfg).contains("Bubble warning"));
    }

    #[test]
    fn test_render_missing_indicators() {
        let text = render_snapshot(&CycleSnapshot::default(), &LongTermConfig::default());
        assert!(text.contains("Ahr999: n/a"));
        assert!(text.contains("Rainbow chart: n/a"));
    }
}
