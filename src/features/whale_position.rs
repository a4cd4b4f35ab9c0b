//! Whale vs retail positioning watch
//!
//! For each configured symbol, reads the retail account ratio, the top
//! trader account ratio, and the top trader position ratio, then runs the
//! positioning diagnosis over the retail and whale legs. One combined
//! message per run.

use super::{FeatureContext, RunOutcome};
use crate::classify::diagnose_positioning;
use crate::normalize::{f64_field, latest_object};
use crate::render::{bold, code, DIVIDER};
use std::time::Duration;

const RATIO_KEYS: &[&str] = &[
    "long_short_ratio",
    "longShortRatio",
    "global_account_long_short_ratio",
    "top_account_long_short_ratio",
    "top_position_long_short_ratio",
    "ratio",
];

/// Ratios read for one symbol; any leg may be absent
#[derive(Debug, Clone, Default)]
struct SymbolRatios {
    retail_accounts: Option<f64>,
    top_accounts: Option<f64>,
    top_positions: Option<f64>,
}

async fn fetch_ratio(ctx: &FeatureContext, path: &str, symbol: &str) -> Option<f64> {
    let params = [
        ("exchange", ctx.config.whale.exchange.as_str()),
        ("symbol", symbol),
        ("interval", ctx.config.whale.interval.as_str()),
    ];
    match ctx.coinglass.get(path, &params).await {
        Ok(body) => latest_object(&body).and_then(|obj| f64_field(obj, RATIO_KEYS)),
        Err(e) => {
            tracing::warn!(symbol, path, error = %e, "ratio fetch failed");
            None
        }
    }
}

async fn fetch_symbol(ctx: &FeatureContext, symbol: &str) -> SymbolRatios {
    SymbolRatios {
        retail_accounts: fetch_ratio(
            ctx,
            "/api/futures/global-long-short-account-ratio/history",
            symbol,
        )
        .await,
        top_accounts: fetch_ratio(
            ctx,
            "/api/futures/top-long-short-account-ratio/history",
            symbol,
        )
        .await,
        top_positions: fetch_ratio(
            ctx,
            "/api/futures/top-long-short-position-ratio/history",
            symbol,
        )
        .await,
    }
}

fn ratio_line(label: &str, value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{label}: {}", code(&format!("{v:.4}"))),
        None => format!("{label}: n/a"),
    }
}

fn render_symbol(symbol: &str, ratios: &SymbolRatios, ctx: &FeatureContext) -> Option<String> {
    let diagnosis = diagnose_positioning(
        ratios.retail_accounts,
        ratios.top_positions,
        &ctx.config.whale.thresholds,
    )?;

    let mut lines = vec![format!("🐋 {}", bold(symbol))];
    lines.push(ratio_line("Retail accounts L/S", ratios.retail_accounts));
    lines.push(ratio_line("Top accounts L/S", ratios.top_accounts));
    lines.push(ratio_line("Top positions L/S", ratios.top_positions));
    lines.push(diagnosis.label().to_string());
    lines.push(diagnosis.detail().to_string());
    Some(lines.join("\n"))
}

pub async fn run(ctx: &FeatureContext) -> RunOutcome {
    let symbols = ctx.config.whale.symbols.clone();
    let delay = Duration::from_millis(ctx.config.whale.request_delay_ms);

    let mut sections = Vec::new();
    let mut skipped = 0usize;
    for (i, symbol) in symbols.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }
        let ratios = fetch_symbol(ctx, symbol).await;
        match render_symbol(symbol, &ratios, ctx) {
            Some(section) => sections.push(section),
            None => {
                skipped += 1;
                tracing::warn!(symbol, "no ratio data, symbol skipped");
            }
        }
    }

    if sections.is_empty() {
        return RunOutcome::failure("no ratio data for any symbol");
    }

    let message = format!(
        "{}\n{}\n{}\n{}\n🕐 {}",
        bold("Whale Position Watch"),
        DIVIDER,
        sections.join(&format!("\n{DIVIDER}\n")),
        DIVIDER,
        crate::render::utc_time(chrono::Utc::now().timestamp_millis())
    );

    match ctx.delivery.deliver(&message, ctx.topic("whale_position")).await {
        Ok(()) if skipped == 0 => RunOutcome::success(format!("{} symbols", sections.len())),
        Ok(()) => RunOutcome::partial(format!("{} symbols, {skipped} skipped", sections.len())),
        Err(e) => RunOutcome::failure(format!("delivery failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::MarketDiagnosis;
    use crate::config::Config;

    fn ctx_with_defaults() -> FeatureContext {
        crate::features::tests::test_context(
            Config::default(),
            crate::testing::StubProvider::new(),
            crate::testing::StubProvider::new(),
            crate::testing::StubProvider::new(),
            std::sync::Arc::new(crate::testing::RecordingDelivery::new()),
        )
    }

    #[test]
    fn test_render_symbol_with_both_legs() {
        let ctx = ctx_with_defaults();
        let ratios = SymbolRatios {
            retail_accounts: Some(1.9123),
            top_accounts: Some(1.1),
            top_positions: Some(0.85),
        };
        let section = render_symbol("BTCUSDT", &ratios, &ctx).unwrap();
        assert!(section.contains("*BTCUSDT*"));
        assert!(section.contains("`1.9123`"));
        assert!(section.contains(MarketDiagnosis::WhaleDistribution.label()));
    }

    #[test]
    fn test_render_symbol_partial_data() {
        let ctx = ctx_with_defaults();
        let ratios = SymbolRatios {
            retail_accounts: None,
            top_accounts: None,
            top_positions: Some(1.4),
        };
        let section = render_symbol("ETHUSDT", &ratios, &ctx).unwrap();
        assert!(section.contains("Retail accounts L/S: n/a"));
        assert!(section.contains(MarketDiagnosis::WhalesLong.label()));
    }

    #[test]
    fn test_render_symbol_no_data() {
        let ctx = ctx_with_defaults();
        assert!(render_symbol("X", &SymbolRatios::default(), &ctx).is_none());
    }
}
