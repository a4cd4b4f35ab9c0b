//! Threshold classification
//!
//! Ordered rule chains over normalized metrics. Every chain is evaluated
//! first-match-wins with an explicit fallback, and boundary values resolve
//! to the conservative side (strict comparisons where the cut means "beyond
//! the threshold", inclusive where it means "at least").

use crate::config::{LiquidationConfig, LongTermConfig, WhaleThresholds};
use std::fmt;

/// First label whose predicate holds, else the fallback.
/// Predicates are plain bools so chains read as data.
pub fn first_match<L: Copy>(rules: &[(bool, L)], fallback: L) -> L {
    rules
        .iter()
        .find(|(hit, _)| *hit)
        .map(|(_, label)| *label)
        .unwrap_or(fallback)
}

/// Retail-vs-whale positioning diagnosis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketDiagnosis {
    WhaleDistribution,
    WhaleAccumulation,
    BullTrap,
    BottomFishing,
    RetailBullish,
    RetailBearish,
    WhalesLong,
    WhalesShort,
    Balanced,
}

impl MarketDiagnosis {
    pub fn label(&self) -> &'static str {
        match self {
            Self::WhaleDistribution => "⚠️ Whale distribution",
            Self::WhaleAccumulation => "🐋 Whale accumulation",
            Self::BullTrap => "🪤 Possible bull trap",
            Self::BottomFishing => "🎣 Whales bottom fishing",
            Self::RetailBullish => "📈 Retail crowd bullish",
            Self::RetailBearish => "📉 Retail crowd bearish",
            Self::WhalesLong => "🐋 Whales leaning long",
            Self::WhalesShort => "🐻 Whales leaning short",
            Self::Balanced => "⚖️ Balanced positioning",
        }
    }

    pub fn detail(&self) -> &'static str {
        match self {
            Self::WhaleDistribution => {
                "Retail is euphoric while whales hold short positions, a classic distribution setup."
            }
            Self::WhaleAccumulation => {
                "Retail is capitulating while whales build longs, often seen near local bottoms."
            }
            Self::BullTrap => {
                "The crowd is strongly bullish but whale positioning disagrees, rallies may fade."
            }
            Self::BottomFishing => {
                "Whales are long into retail pessimism, watch for a reversal."
            }
            Self::RetailBullish => "Retail accounts are skewed long.",
            Self::RetailBearish => "Retail accounts are skewed short.",
            Self::WhalesLong => "Large positions are net long.",
            Self::WhalesShort => "Large positions are net short.",
            Self::Balanced => "No side has a meaningful edge right now.",
        }
    }
}

impl fmt::Display for MarketDiagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whale position ratio pivot: above means net long, below means net short
const WHALE_PIVOT: f64 = 1.0;

/// Diagnose positioning from the retail account ratio and the whale
/// position ratio. Either input may be absent; with both missing there
/// is nothing to say.
pub fn diagnose_positioning(
    retail_ratio: Option<f64>,
    whale_ratio: Option<f64>,
    t: &WhaleThresholds,
) -> Option<MarketDiagnosis> {
    match (retail_ratio, whale_ratio) {
        (Some(g), Some(p)) => Some(first_match(
            &[
                (g > t.retail_hot && p < WHALE_PIVOT, MarketDiagnosis::WhaleDistribution),
                (g < t.retail_cold && p > t.whale_strong, MarketDiagnosis::WhaleAccumulation),
                (p < WHALE_PIVOT && g > t.retail_bullish, MarketDiagnosis::BullTrap),
                (p > WHALE_PIVOT && g < t.retail_cold, MarketDiagnosis::BottomFishing),
            ],
            MarketDiagnosis::Balanced,
        )),
        (Some(g), None) => Some(first_match(
            &[
                (g > t.retail_bullish, MarketDiagnosis::RetailBullish),
                (g < t.retail_cold, MarketDiagnosis::RetailBearish),
            ],
            MarketDiagnosis::Balanced,
        )),
        (None, Some(p)) => Some(first_match(
            &[
                (p > WHALE_PIVOT, MarketDiagnosis::WhalesLong),
                (p < WHALE_PIVOT, MarketDiagnosis::WhalesShort),
            ],
            MarketDiagnosis::Balanced,
        )),
        (None, None) => None,
    }
}

/// Combined price and open-interest move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionMove {
    LongOpen,
    LongClose,
    ShortOpen,
    ShortClose,
}

impl PositionMove {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LongOpen => "Longs opening",
            Self::LongClose => "Longs closing",
            Self::ShortOpen => "Shorts opening",
            Self::ShortClose => "Shorts closing",
        }
    }
}

impl fmt::Display for PositionMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a symbol from its price change and open-interest change.
/// All comparisons are strict, so a flat leg never classifies.
pub fn classify_position(price_pct: f64, oi_pct: f64) -> Option<PositionMove> {
    match (price_pct, oi_pct) {
        (p, o) if p > 0.0 && o > 0.0 => Some(PositionMove::LongOpen),
        (p, o) if p > 0.0 && o < 0.0 => Some(PositionMove::LongClose),
        (p, o) if p < 0.0 && o > 0.0 => Some(PositionMove::ShortOpen),
        (p, o) if p < 0.0 && o < 0.0 => Some(PositionMove::ShortClose),
        _ => None,
    }
}

/// Ahr999 valuation zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AhrZone {
    Bottom,
    Dca,
    Overvalued,
}

impl AhrZone {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bottom => "🟢 Bottom-fishing zone",
            Self::Dca => "🟡 DCA zone",
            Self::Overvalued => "🔴 Overvalued zone",
        }
    }
}

pub fn ahr_zone(value: f64, cfg: &LongTermConfig) -> AhrZone {
    first_match(
        &[
            (value < cfg.ahr_bottom, AhrZone::Bottom),
            (value <= cfg.ahr_dca_max, AhrZone::Dca),
        ],
        AhrZone::Overvalued,
    )
}

/// Fear & greed index band (conventional 0..=100 bands)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FearGreedBand {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl FearGreedBand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExtremeFear => "😱 Extreme fear",
            Self::Fear => "😨 Fear",
            Self::Neutral => "😐 Neutral",
            Self::Greed => "🤑 Greed",
            Self::ExtremeGreed => "🔥 Extreme greed",
        }
    }
}

pub fn fear_greed_band(index: f64) -> FearGreedBand {
    first_match(
        &[
            (index <= 20.0, FearGreedBand::ExtremeFear),
            (index <= 40.0, FearGreedBand::Fear),
            (index < 60.0, FearGreedBand::Neutral),
            (index <= 80.0, FearGreedBand::Greed),
        ],
        FearGreedBand::ExtremeGreed,
    )
}

/// Rainbow chart price band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainbowBand {
    Low,
    Mid,
    High,
}

impl RainbowBand {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "blue bands (undervalued)",
            Self::Mid => "green-yellow bands (fair)",
            Self::High => "orange-red bands (heated)",
        }
    }
}

/// Place the price inside the rainbow band levels (ascending). Below the
/// lower third is Low, above the upper third is High.
pub fn rainbow_band(price: f64, levels: &[f64]) -> Option<RainbowBand> {
    if levels.len() < 3 {
        return None;
    }
    let below = levels.iter().filter(|l| price >= **l).count();
    let third = levels.len() / 3;
    Some(first_match(
        &[
            (below <= third, RainbowBand::Low),
            (below >= levels.len() - third, RainbowBand::High),
        ],
        RainbowBand::Mid,
    ))
}

/// Altcoin season phase from the 0..=100 season index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonPhase {
    AltcoinFrenzy,
    BitcoinSeason,
    Transition,
}

impl SeasonPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::AltcoinFrenzy => "🚀 Full altcoin season",
            Self::BitcoinSeason => "₿ Bitcoin season",
            Self::Transition => "🔄 Rotation phase",
        }
    }
}

pub fn season_phase(index: f64, frenzy_above: f64, bitcoin_below: f64) -> SeasonPhase {
    first_match(
        &[
            (index > frenzy_above, SeasonPhase::AltcoinFrenzy),
            (index < bitcoin_below, SeasonPhase::BitcoinSeason),
        ],
        SeasonPhase::Transition,
    )
}

/// Which window tripped a liquidation alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerWindow {
    OneHour,
    TwentyFourHour,
}

impl TriggerWindow {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::TwentyFourHour => "24h",
        }
    }
}

/// Check liquidation totals against the symbol's tier. Thresholds are
/// inclusive, a total exactly at the line triggers. The 1h window is
/// checked first.
pub fn liquidation_trigger(
    symbol: &str,
    total_1h_usd: f64,
    total_24h_usd: f64,
    cfg: &LiquidationConfig,
) -> Option<TriggerWindow> {
    let (t1h, t24h) = cfg.thresholds_for(symbol);
    if total_1h_usd >= t1h {
        Some(TriggerWindow::OneHour)
    } else if total_24h_usd >= t24h {
        Some(TriggerWindow::TwentyFourHour)
    } else {
        None
    }
}
