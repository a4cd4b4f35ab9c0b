//! Configuration types for chainpulse
//!
//! Provider endpoints and credentials, the delivery channel with its topic
//! IDs, local state storage, and every feature's thresholds. Secrets are
//! overridable from the environment so they never need to live in the file.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub sector_ranking: SectorRankingConfig,
    #[serde(default)]
    pub whale: WhaleConfig,
    #[serde(default)]
    pub position_change: PositionChangeConfig,
    #[serde(default)]
    pub economic: EconomicConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub funding: FundingConfig,
    #[serde(default)]
    pub long_term: LongTermConfig,
    #[serde(default)]
    pub liquidation: LiquidationConfig,
    #[serde(default)]
    pub altseason: AltseasonConfig,
    #[serde(default)]
    pub hyperliquid: HyperliquidConfig,
}

/// External data provider endpoints and credentials
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Derivatives analytics API (code/data envelope)
    #[serde(default = "default_coinglass_base")]
    pub coinglass_base_url: String,
    #[serde(default)]
    pub coinglass_api_key: String,

    /// Spot market index API (bare JSON bodies)
    #[serde(default = "default_coingecko_base")]
    pub coingecko_base_url: String,
    #[serde(default)]
    pub coingecko_api_key: String,

    /// News aggregator API (bare JSON bodies)
    #[serde(default = "default_tree_base")]
    pub tree_base_url: String,
    #[serde(default)]
    pub tree_api_key: String,

    /// Per-request timeout applied to every outbound call
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_coinglass_base() -> String {
    "https://open-api-v4.coinglass.com".to_string()
}
fn default_coingecko_base() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}
fn default_tree_base() -> String {
    "https://news.treeofalpha.com/api".to_string()
}
fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            coinglass_base_url: default_coinglass_base(),
            coinglass_api_key: String::new(),
            coingecko_base_url: default_coingecko_base(),
            coingecko_api_key: String::new(),
            tree_base_url: default_tree_base(),
            tree_api_key: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Delivery channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    /// Forum topic thread ID per feature name
    #[serde(default = "default_topics")]
    pub topics: BTreeMap<String, i64>,
}

fn default_topics() -> BTreeMap<String, i64> {
    [
        ("sector_ranking", 5),
        ("whale_position", 246),
        ("position_change", 250),
        ("economic_calendar", 13),
        ("news", 7),
        ("funding_rate", 244),
        ("long_term", 248),
        ("liquidation_radar", 3),
        ("altseason_radar", 254),
        ("hyperliquid", 252),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            topics: default_topics(),
        }
    }
}

impl TelegramConfig {
    /// Topic thread for a feature; 0 posts to the main channel
    pub fn topic(&self, feature: &str) -> i64 {
        self.topics.get(feature).copied().unwrap_or(0)
    }
}

/// Local state storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the per-feature seen-ID files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Sector ranking feature configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SectorRankingConfig {
    /// Provider category names mapped to display labels
    #[serde(default = "default_sectors")]
    pub sectors: BTreeMap<String, String>,
}

fn default_sectors() -> BTreeMap<String, String> {
    [
        ("Meme", "Meme"),
        ("Artificial Intelligence (AI)", "AI"),
        ("Real World Assets (RWA)", "RWA"),
        ("Decentralized Finance (DeFi)", "DeFi"),
        ("Layer 2", "Layer 2"),
        ("Gaming (GameFi)", "GameFi"),
        ("Smart Contract Platform", "Smart Contract Platforms"),
        ("Exchange-based Tokens", "Exchange Tokens"),
        ("Stablecoins", "Stablecoins"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl Default for SectorRankingConfig {
    fn default() -> Self {
        Self {
            sectors: default_sectors(),
        }
    }
}

/// Whale position watch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WhaleConfig {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "default_whale_interval")]
    pub interval: String,
    #[serde(default = "default_whale_symbols")]
    pub symbols: Vec<String>,
    /// Pause between symbols to respect provider rate limits
    #[serde(default = "default_whale_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default)]
    pub thresholds: WhaleThresholds,
}

fn default_exchange() -> String {
    "Binance".to_string()
}
fn default_whale_interval() -> String {
    "h1".to_string()
}
fn default_whale_symbols() -> Vec<String> {
    vec![
        "BTCUSDT".to_string(),
        "ETHUSDT".to_string(),
        "SOLUSDT".to_string(),
    ]
}
fn default_whale_delay_ms() -> u64 {
    2_000
}

impl Default for WhaleConfig {
    fn default() -> Self {
        Self {
            exchange: default_exchange(),
            interval: default_whale_interval(),
            symbols: default_whale_symbols(),
            request_delay_ms: default_whale_delay_ms(),
            thresholds: WhaleThresholds::default(),
        }
    }
}

/// Cut points for the retail-vs-whale diagnosis chain
#[derive(Debug, Clone, Deserialize)]
pub struct WhaleThresholds {
    /// Retail account ratio above which the crowd counts as euphoric
    #[serde(default = "default_retail_hot")]
    pub retail_hot: f64,
    /// Retail account ratio below which the crowd counts as capitulating
    #[serde(default = "default_retail_cold")]
    pub retail_cold: f64,
    /// Retail account ratio above which the crowd counts as plainly bullish
    #[serde(default = "default_retail_bullish")]
    pub retail_bullish: f64,
    /// Whale position ratio above which whales count as aggressively long
    #[serde(default = "default_whale_strong")]
    pub whale_strong: f64,
}

fn default_retail_hot() -> f64 {
    1.8
}
fn default_retail_cold() -> f64 {
    0.8
}
fn default_retail_bullish() -> f64 {
    1.5
}
fn default_whale_strong() -> f64 {
    1.2
}

impl Default for WhaleThresholds {
    fn default() -> Self {
        Self {
            retail_hot: default_retail_hot(),
            retail_cold: default_retail_cold(),
            retail_bullish: default_retail_bullish(),
            whale_strong: default_whale_strong(),
        }
    }
}

/// Position change scanner configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PositionChangeConfig {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    /// How many symbols from the price-change list to scan
    #[serde(default = "default_max_symbols")]
    pub max_symbols: usize,
    /// Concurrent open-interest fetches
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Wall-clock budget for the whole scan; symbols still in flight when
    /// it expires are abandoned, not treated as errors
    #[serde(default = "default_budget_secs")]
    pub run_budget_secs: u64,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Deliver a short notice when the source list cannot be fetched at all
    #[serde(default = "default_true")]
    pub notify_on_empty: bool,
}

fn default_max_symbols() -> usize {
    904
}
fn default_concurrency() -> usize {
    20
}
fn default_budget_secs() -> u64 {
    1_500
}
fn default_top_n() -> usize {
    3
}
fn default_true() -> bool {
    true
}

impl Default for PositionChangeConfig {
    fn default() -> Self {
        Self {
            exchange: default_exchange(),
            max_symbols: default_max_symbols(),
            concurrency: default_concurrency(),
            run_budget_secs: default_budget_secs(),
            top_n: default_top_n(),
            notify_on_empty: true,
        }
    }
}

/// Economic calendar configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EconomicConfig {
    /// Minimum importance level to push (provider scale, 1..=3)
    #[serde(default = "default_min_importance")]
    pub min_importance: i64,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: i64,
    #[serde(default = "default_store_capacity")]
    pub store_capacity: usize,
}

fn default_min_importance() -> i64 {
    2
}
fn default_lookback_hours() -> i64 {
    24
}
fn default_lookahead_days() -> i64 {
    7
}
fn default_store_capacity() -> usize {
    1_000
}

impl Default for EconomicConfig {
    fn default() -> Self {
        Self {
            min_importance: default_min_importance(),
            lookback_hours: default_lookback_hours(),
            lookahead_days: default_lookahead_days(),
            store_capacity: default_store_capacity(),
        }
    }
}

/// News push configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_news_limit")]
    pub limit: usize,
    #[serde(default = "default_store_capacity")]
    pub store_capacity: usize,
    /// Body text longer than this is cut with an ellipsis
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
}

fn default_news_limit() -> usize {
    10
}
fn default_max_body_chars() -> usize {
    500
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            limit: default_news_limit(),
            store_capacity: default_store_capacity(),
            max_body_chars: default_max_body_chars(),
        }
    }
}

/// Funding rate leaderboard configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FundingConfig {
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default = "default_funding_top_n")]
    pub top_n: usize,
    /// Example position size used for the per-settlement payout line
    #[serde(default = "default_notional")]
    pub notional_usdt: f64,
    /// Share of the notional assumed to earn the rate in the example
    #[serde(default = "default_capital_efficiency")]
    pub capital_efficiency: f64,
}

fn default_funding_top_n() -> usize {
    5
}
fn default_notional() -> f64 {
    10_000.0
}
fn default_capital_efficiency() -> f64 {
    0.4
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            exchange: default_exchange(),
            top_n: default_funding_top_n(),
            notional_usdt: default_notional(),
            capital_efficiency: default_capital_efficiency(),
        }
    }
}

/// Long-term cycle navigator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LongTermConfig {
    /// Ahr999 below this is the bottom-fishing zone
    #[serde(default = "default_ahr_bottom")]
    pub ahr_bottom: f64,
    /// Ahr999 up to and including this is the DCA zone
    #[serde(default = "default_ahr_dca_max")]
    pub ahr_dca_max: f64,
    /// Fear & greed strictly above this plus a pi-cycle cross flags bubble risk
    #[serde(default = "default_bubble_greed")]
    pub bubble_greed_index: i64,
}

fn default_ahr_bottom() -> f64 {
    0.45
}
fn default_ahr_dca_max() -> f64 {
    1.2
}
fn default_bubble_greed() -> i64 {
    80
}

impl Default for LongTermConfig {
    fn default() -> Self {
        Self {
            ahr_bottom: default_ahr_bottom(),
            ahr_dca_max: default_ahr_dca_max(),
            bubble_greed_index: default_bubble_greed(),
        }
    }
}

/// Liquidation radar configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LiquidationConfig {
    #[serde(default = "default_liq_symbols")]
    pub symbols: Vec<String>,
    #[serde(default = "default_exchange")]
    pub exchange_list: String,
    #[serde(default = "default_liq_interval")]
    pub interval: String,
    #[serde(default = "default_liq_delay_ms")]
    pub request_delay_ms: u64,
    /// Symbol groups with their own trigger thresholds; first match wins
    #[serde(default = "default_liq_tiers")]
    pub tiers: Vec<LiquidationTier>,
    #[serde(default = "default_liq_1h")]
    pub default_threshold_1h_usd: f64,
    #[serde(default = "default_liq_24h")]
    pub default_threshold_24h_usd: f64,
}

/// Trigger thresholds for one group of symbols
#[derive(Debug, Clone, Deserialize)]
pub struct LiquidationTier {
    pub symbols: Vec<String>,
    pub threshold_1h_usd: f64,
    pub threshold_24h_usd: f64,
}

fn default_liq_symbols() -> Vec<String> {
    [
        "BTC", "ETH", "SOL", "XRP", "DOGE", "BNB", "ADA", "TRX", "AVAX", "DOT", "LINK", "NEAR",
        "MATIC", "SUI", "APT",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_liq_interval() -> String {
    "1h".to_string()
}
fn default_liq_delay_ms() -> u64 {
    1_200
}
fn default_liq_tiers() -> Vec<LiquidationTier> {
    vec![
        LiquidationTier {
            symbols: vec!["BTC".to_string(), "ETH".to_string()],
            threshold_1h_usd: 2_000_000.0,
            threshold_24h_usd: 15_000_000.0,
        },
        LiquidationTier {
            symbols: vec!["SOL".to_string(), "XRP".to_string(), "DOGE".to_string()],
            threshold_1h_usd: 800_000.0,
            threshold_24h_usd: 5_000_000.0,
        },
    ]
}
fn default_liq_1h() -> f64 {
    400_000.0
}
fn default_liq_24h() -> f64 {
    3_000_000.0
}

impl Default for LiquidationConfig {
    fn default() -> Self {
        Self {
            symbols: default_liq_symbols(),
            exchange_list: default_exchange(),
            interval: default_liq_interval(),
            request_delay_ms: default_liq_delay_ms(),
            tiers: default_liq_tiers(),
            default_threshold_1h_usd: default_liq_1h(),
            default_threshold_24h_usd: default_liq_24h(),
        }
    }
}

impl LiquidationConfig {
    /// Trigger thresholds (1h, 24h) for a symbol
    pub fn thresholds_for(&self, symbol: &str) -> (f64, f64) {
        for tier in &self.tiers {
            if tier.symbols.iter().any(|s| s == symbol) {
                return (tier.threshold_1h_usd, tier.threshold_24h_usd);
            }
        }
        (
            self.default_threshold_1h_usd,
            self.default_threshold_24h_usd,
        )
    }
}

/// Altseason radar configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AltseasonConfig {
    /// Only the top-N symbols by quote volume are considered
    #[serde(default = "default_volume_top_n")]
    pub volume_top_n: usize,
    #[serde(default = "default_rsi_overbought")]
    pub rsi_overbought: f64,
    #[serde(default = "default_rsi_oversold")]
    pub rsi_oversold: f64,
    #[serde(default = "default_breakout_buy_ratio")]
    pub breakout_min_buy_ratio: f64,
    #[serde(default = "default_oversold_buy_ratio")]
    pub oversold_min_buy_ratio: f64,
    #[serde(default = "default_altseason_top_n")]
    pub top_n: usize,
    #[serde(default = "default_altseason_delay_ms")]
    pub request_delay_ms: u64,
    /// Season index strictly above this is full altseason
    #[serde(default = "default_frenzy_index")]
    pub frenzy_index: f64,
    /// Season index strictly below this is bitcoin season
    #[serde(default = "default_bitcoin_index")]
    pub bitcoin_index: f64,
}

fn default_volume_top_n() -> usize {
    50
}
fn default_rsi_overbought() -> f64 {
    70.0
}
fn default_rsi_oversold() -> f64 {
    30.0
}
fn default_breakout_buy_ratio() -> f64 {
    55.0
}
fn default_oversold_buy_ratio() -> f64 {
    52.0
}
fn default_altseason_top_n() -> usize {
    5
}
fn default_altseason_delay_ms() -> u64 {
    800
}
fn default_frenzy_index() -> f64 {
    75.0
}
fn default_bitcoin_index() -> f64 {
    25.0
}

impl Default for AltseasonConfig {
    fn default() -> Self {
        Self {
            volume_top_n: default_volume_top_n(),
            rsi_overbought: default_rsi_overbought(),
            rsi_oversold: default_rsi_oversold(),
            breakout_min_buy_ratio: default_breakout_buy_ratio(),
            oversold_min_buy_ratio: default_oversold_buy_ratio(),
            top_n: default_altseason_top_n(),
            request_delay_ms: default_altseason_delay_ms(),
            frenzy_index: default_frenzy_index(),
            bitcoin_index: default_bitcoin_index(),
        }
    }
}

/// Hyperliquid smart-money monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HyperliquidConfig {
    /// Whale alerts below this notional are ignored
    #[serde(default = "default_whale_alert_min")]
    pub whale_alert_min_usd: f64,
    #[serde(default = "default_smart_money_min")]
    pub smart_money_pnl_min: f64,
    #[serde(default = "default_money_printer_min")]
    pub money_printer_pnl_min: f64,
    #[serde(default = "default_hl_capacity")]
    pub store_capacity: usize,
    #[serde(default = "default_top_positions")]
    pub top_positions: usize,
    #[serde(default = "default_max_alerts")]
    pub max_alerts: usize,
}

fn default_whale_alert_min() -> f64 {
    1_000_000.0
}
fn default_smart_money_min() -> f64 {
    100_000.0
}
fn default_money_printer_min() -> f64 {
    1_000_000.0
}
fn default_hl_capacity() -> usize {
    500
}
fn default_top_positions() -> usize {
    5
}
fn default_max_alerts() -> usize {
    3
}

impl Default for HyperliquidConfig {
    fn default() -> Self {
        Self {
            whale_alert_min_usd: default_whale_alert_min(),
            smart_money_pnl_min: default_smart_money_min(),
            money_printer_pnl_min: default_money_printer_min(),
            store_capacity: default_hl_capacity(),
            top_positions: default_top_positions(),
            max_alerts: default_max_alerts(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides
    /// for credentials
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CG_API_KEY") {
            self.providers.coinglass_api_key = v;
        }
        if let Ok(v) = std::env::var("CG_GECKO_API_KEY") {
            self.providers.coingecko_api_key = v;
        }
        if let Ok(v) = std::env::var("TREE_API_KEY") {
            self.providers.tree_api_key = v;
        }
        if let Ok(v) = std::env::var("TG_TOKEN") {
            self.telegram.bot_token = v;
        }
        if let Ok(v) = std::env::var("CHAT_ID") {
            self.telegram.chat_id = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialize_minimal() {
        let toml = r#"
            [providers]
            coinglass_api_key = "k1"

            [telegram]
            bot_token = "t"
            chat_id = "-100123"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.providers.coinglass_api_key, "k1");
        assert_eq!(config.providers.timeout_ms, 10_000);
        assert_eq!(config.telegram.topic("economic_calendar"), 13);
        assert_eq!(config.position_change.concurrency, 20);
        assert_eq!(config.economic.min_importance, 2);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.whale.symbols.len(), 3);
        assert_eq!(config.funding.top_n, 5);
        assert_eq!(config.storage.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_topic_fallback_to_main_channel() {
        let telegram = TelegramConfig::default();
        assert_eq!(telegram.topic("no_such_feature"), 0);
    }

    #[test]
    fn test_liquidation_tier_lookup() {
        let liq = LiquidationConfig::default();
        assert_eq!(liq.thresholds_for("BTC"), (2_000_000.0, 15_000_000.0));
        assert_eq!(liq.thresholds_for("DOGE"), (800_000.0, 5_000_000.0));
        assert_eq!(liq.thresholds_for("PEPE"), (400_000.0, 3_000_000.0));
    }

    #[test]
    fn test_tier_override_from_toml() {
        let toml = r#"
            [liquidation]
            default_threshold_1h_usd = 100000.0
            default_threshold_24h_usd = 500000.0
            tiers = []
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.liquidation.thresholds_for("BTC"),
            (100_000.0, 500_000.0)
        );
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_whale_thresholds_defaults() {
        let t = WhaleThresholds::default();
        assert_eq!(t.retail_hot, 1.8);
        assert_eq!(t.retail_cold, 0.8);
        assert_eq!(t.retail_bullish, 1.5);
        assert_eq!(t.whale_strong, 1.2);
    }
}
