//! Feature orchestrators
//!
//! One module per alert feature. Each exposes `run(ctx)` which fetches from
//! the providers, classifies, renders, and delivers, reporting a
//! [`RunOutcome`] instead of aborting the process on partial failure.

pub mod altseason_radar;
pub mod economic_calendar;
pub mod funding_rate;
pub mod hyperliquid;
pub mod liquidation_radar;
pub mod long_term;
pub mod news;
pub mod position_change;
pub mod sector_ranking;
pub mod whale_position;

use crate::config::Config;
use crate::deliver::Delivery;
use crate::provider::{Envelope, HttpProvider, Provider};
use crate::store::JsonFileStore;
use std::sync::Arc;

/// Everything a feature run needs: config plus the provider and delivery
/// seams, held as trait objects so tests can swap in doubles.
pub struct FeatureContext {
    pub config: Config,
    pub coinglass: Arc<dyn Provider>,
    pub coingecko: Arc<dyn Provider>,
    pub tree: Arc<dyn Provider>,
    pub delivery: Arc<dyn Delivery>,
}

impl FeatureContext {
    /// Build the live context from configuration
    pub fn from_config(config: Config, delivery: Arc<dyn Delivery>) -> anyhow::Result<Self> {
        let p = &config.providers;

        let mut coinglass_headers = vec![("accept".to_string(), "application/json".to_string())];
        if !p.coinglass_api_key.is_empty() {
            coinglass_headers.push(("CG-API-KEY".to_string(), p.coinglass_api_key.clone()));
        }
        let coinglass = HttpProvider::new(
            p.coinglass_base_url.clone(),
            coinglass_headers,
            Envelope::CodeField,
            p.timeout_ms,
        )?;

        let mut coingecko_headers = Vec::new();
        if !p.coingecko_api_key.is_empty() {
            coingecko_headers.push(("x-cg-demo-api-key".to_string(), p.coingecko_api_key.clone()));
        }
        let coingecko = HttpProvider::new(
            p.coingecko_base_url.clone(),
            coingecko_headers,
            Envelope::Bare,
            p.timeout_ms,
        )?;

        let mut tree_headers = Vec::new();
        if !p.tree_api_key.is_empty() {
            tree_headers.push((
                "Authorization".to_string(),
                format!("Bearer {}", p.tree_api_key),
            ));
        }
        let tree = HttpProvider::new(
            p.tree_base_url.clone(),
            tree_headers,
            Envelope::Bare,
            p.timeout_ms,
        )?;

        Ok(Self {
            config,
            coinglass: Arc::new(coinglass),
            coingecko: Arc::new(coingecko),
            tree: Arc::new(tree),
            delivery,
        })
    }

    /// Open the seen-ID store for a feature
    pub fn open_store(&self, feature: &str, capacity: usize) -> JsonFileStore {
        let path = self
            .config
            .storage
            .data_dir
            .join(format!("{feature}_seen.json"));
        JsonFileStore::open(path, capacity)
    }

    /// Topic thread for a feature
    pub fn topic(&self, feature: &str) -> i64 {
        self.config.telegram.topic(feature)
    }
}

/// How a feature run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Delivered everything it set out to deliver
    Success,
    /// Delivered something, but parts of the data were unavailable
    Partial,
    /// Nothing could be delivered
    Failure,
}

/// Result of one feature run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub detail: String,
}

impl RunOutcome {
    pub fn success(detail: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Success,
            detail: detail.into(),
        }
    }

    pub fn partial(detail: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Partial,
            detail: detail.into(),
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failure,
            detail: detail.into(),
        }
    }
}

/// Registered feature names, in display order
pub const FEATURES: &[&str] = &[
    "sector_ranking",
    "whale_position",
    "position_change",
    "economic_calendar",
    "news",
    "funding_rate",
    "long_term",
    "liquidation_radar",
    "altseason_radar",
    "hyperliquid",
];

/// Run one feature by name
pub async fn run_feature(ctx: &FeatureContext, name: &str) -> anyhow::Result<RunOutcome> {
    let outcome = match name {
        "sector_ranking" => sector_ranking::run(ctx).await,
        "whale_position" => whale_position::run(ctx).await,
        "position_change" => position_change::run(ctx).await,
        "economic_calendar" => economic_calendar::run(ctx).await,
        "news" => news::run(ctx).await,
        "funding_rate" => funding_rate::run(ctx).await,
        "long_term" => long_term::run(ctx).await,
        "liquidation_radar" => liquidation_radar::run(ctx).await,
        "altseason_radar" => altseason_radar::run(ctx).await,
        "hyperliquid" => hyperliquid::run(ctx).await,
        other => anyhow::bail!("unknown feature: {other}"),
    };

    tracing::info!(
        feature = name,
        status = ?outcome.status,
        detail = %outcome.detail,
        "feature run finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingDelivery, StubProvider};

    pub(crate) fn test_context(
        config: Config,
        coinglass: StubProvider,
        coingecko: StubProvider,
        tree: StubProvider,
        delivery: Arc<RecordingDelivery>,
    ) -> FeatureContext {
        FeatureContext {
            config,
            coinglass: Arc::new(coinglass),
            coingecko: Arc::new(coingecko),
            tree: Arc::new(tree),
            delivery,
        }
    }

    #[tokio::test]
    async fn test_unknown_feature_is_an_error() {
        let ctx = test_context(
            Config::default(),
            StubProvider::new(),
            StubProvider::new(),
            StubProvider::new(),
            Arc::new(RecordingDelivery::new()),
        );
        assert!(run_feature(&ctx, "no_such_thing").await.is_err());
    }

    #[test]
    fn test_every_feature_has_a_default_topic() {
        let config = Config::default();
        for feature in FEATURES {
            assert!(config.telegram.topic(feature) > 0, "{feature} missing topic");
        }
    }
}
