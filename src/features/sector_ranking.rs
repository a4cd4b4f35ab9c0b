//! Sector rotation ranking
//!
//! Pulls 24h market-cap change for the configured sectors from the market
//! index API, ranks them, and posts the full ranking. Snapshot style, so
//! no dedup store is involved.

use super::{FeatureContext, RunOutcome};
use crate::normalize::{FieldKind, FieldSpec, Normalizer, Shape};
use crate::render::{bold, code, medal, signed_pct, trend_marker, DIVIDER};

fn normalizer() -> Normalizer {
    Normalizer::new(
        vec![Shape::BareList, Shape::DataList],
        vec![
            FieldSpec {
                name: "name",
                keys: &["name", "id"],
                kind: FieldKind::Text,
            },
            FieldSpec {
                name: "change_24h",
                keys: &["market_cap_change_24h", "market_cap_change_percentage_24h"],
                kind: FieldKind::Float,
            },
        ],
    )
}

/// Ranked sector rows: (display label, 24h change percent), best first
fn rank_sectors(
    body: &serde_json::Value,
    sectors: &std::collections::BTreeMap<String, String>,
) -> Vec<(String, f64)> {
    let mut rows: Vec<(String, f64)> = normalizer()
        .normalize(body)
        .into_iter()
        .filter_map(|record| {
            let name = record.text("name")?;
            let label = sectors.get(name)?;
            let change = record.float("change_24h")?;
            Some((label.clone(), change))
        })
        .collect();
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    rows
}

fn render_ranking(rows: &[(String, f64)]) -> String {
    let mut lines = vec![
        format!("📊 {}", bold("Sector Rotation Ranking (24h)")),
        DIVIDER.to_string(),
    ];
    for (rank, (label, change)) in rows.iter().enumerate() {
        lines.push(format!(
            "{} {}: {} {}",
            medal(rank),
            bold(label),
            code(&signed_pct(*change, 2)),
            trend_marker(*change)
        ));
    }
    lines.join("\n")
}

pub async fn run(ctx: &FeatureContext) -> RunOutcome {
    let body = match ctx.coingecko.get("/coins/categories", &[]).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "sector categories fetch failed");
            return RunOutcome::failure(format!("categories fetch failed: {e}"));
        }
    };

    let rows = rank_sectors(&body, &ctx.config.sector_ranking.sectors);
    if rows.is_empty() {
        return RunOutcome::failure("no configured sectors in response");
    }

    let message = render_ranking(&rows);
    match ctx.delivery.deliver(&message, ctx.topic("sector_ranking")).await {
        Ok(()) => RunOutcome::success(format!("ranked {} sectors", rows.len())),
        Err(e) => RunOutcome::failure(format!("delivery failed: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sectors() -> std::collections::BTreeMap<String, String> {
        [("Meme", "Meme"), ("Layer 2", "Layer 2")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_rank_sorts_descending() {
        let body = json!([
            {"name": "Meme", "market_cap_change_24h": -2.5},
            {"name": "Layer 2", "market_cap_change_24h": 7.1},
            {"name": "Unlisted", "market_cap_change_24h": 99.0}
        ]);
        let rows = rank_sectors(&body, &sectors());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "Layer 2");
        assert_eq!(rows[1].0, "Meme");
    }

    #[test]
    fn test_missing_change_drops_sector() {
        let body = json!([
            {"name": "Meme"},
            {"name": "Layer 2", "market_cap_change_24h": "3.2"}
        ]);
        let rows = rank_sectors(&body, &sectors());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].1, 3.2);
    }

    #[test]
    fn test_render_medal_and_markers() {
        let rows = vec![
            ("Layer 2".to_string(), 7.1),
            ("Meme".to_string(), -2.5),
        ];
        let message = render_ranking(&rows);
        assert!(message.contains("🥇 *Layer 2*: `+7.10%` 📈"));
        assert!(message.contains("🥈 *Meme*: `-2.50%` 📉"));
    }
}
