//! Message rendering helpers
//!
//! Pure formatting shared by every feature: markup tokens, signed
//! percentages, compact dollar amounts, rank medals. Rendering never does
//! IO, so each helper is a plain function over its inputs.

use chrono::{DateTime, Utc};

/// Section divider line
pub const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━";

pub fn bold(text: &str) -> String {
    format!("*{text}*")
}

pub fn code(text: &str) -> String {
    format!("`{text}`")
}

pub fn link(label: &str, url: &str) -> String {
    format!("[{label}]({url})")
}

/// Signed percentage, e.g. `+7.10%` or `-0.35%`
pub fn signed_pct(value: f64, decimals: usize) -> String {
    format!("{value:+.decimals$}%")
}

/// Up or down marker for a change value. Zero reads as down.
pub fn trend_marker(value: f64) -> &'static str {
    if value > 0.0 {
        "📈"
    } else {
        "📉"
    }
}

/// Rank medal for a zero-based position
pub fn medal(rank: usize) -> &'static str {
    match rank {
        0 => "🥇",
        1 => "🥈",
        2 => "🥉",
        _ => "🔹",
    }
}

/// Importance marker for an economic event level
pub fn importance_marker(level: i64) -> &'static str {
    if level >= 3 {
        "🔴"
    } else if level >= 2 {
        "🟡"
    } else {
        "⚪"
    }
}

/// Compact dollar amount: $1.25M, $430.00K, $12.34
pub fn usd_compact(value: f64) -> String {
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    if abs >= 1_000_000.0 {
        format!("{sign}${:.2}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}${:.2}K", abs / 1_000.0)
    } else {
        format!("{sign}${abs:.2}")
    }
}

/// Cut a string at a character budget, appending an ellipsis when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

/// UTC wall-clock line for a millisecond timestamp
pub fn utc_time(ts_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ts_ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => "unknown time".to_string(),
    }
}

/// Human description of how far `ts_ms` lies from `now`
pub fn time_until(ts_ms: i64, now: DateTime<Utc>) -> String {
    let delta_mins = (ts_ms - now.timestamp_millis()) / 60_000;
    if delta_mins <= -60 {
        format!("{}h ago", -delta_mins / 60)
    } else if delta_mins < 0 {
        format!("{}m ago", -delta_mins)
    } else if delta_mins < 60 {
        format!("in {delta_mins}m")
    } else if delta_mins < 48 * 60 {
        format!("in {}h", delta_mins / 60)
    } else {
        format!("in {}d", delta_mins / (24 * 60))
    }
}

/// Country flag for an economic calendar country name
pub fn country_flag(country: &str) -> &'static str {
    match country {
        "United States" | "US" | "USA" => "🇺🇸",
        "China" | "CN" => "🇨🇳",
        "Japan" | "JP" => "🇯🇵",
        "Euro Zone" | "Eurozone" | "EU" => "🇪🇺",
        "Germany" | "DE" => "🇩🇪",
        "United Kingdom" | "UK" | "GB" => "🇬🇧",
        "France" | "FR" => "🇫🇷",
        "Canada" | "CA" => "🇨🇦",
        "Australia" | "AU" => "🇦🇺",
        "Switzerland" | "CH" => "🇨🇭",
        "South Korea" | "KR" => "🇰🇷",
        "India" | "IN" => "🇮🇳",
        _ => "🌍",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_signed_pct_format() {
        assert_eq!(signed_pct(7.1, 2), "+7.10%");
        assert_eq!(signed_pct(-0.345, 2), "-0.35%");
        assert_eq!(signed_pct(0.0123, 6), "+0.012300%");
        assert_eq!(signed_pct(0.0, 2), "+0.00%");
    }

    #[test]
    fn test_trend_marker() {
        assert_eq!(trend_marker(0.01), "📈");
        assert_eq!(trend_marker(-0.01), "📉");
        assert_eq!(trend_marker(0.0), "📉");
    }

    #[test]
    fn test_medals() {
        assert_eq!(medal(0), "🥇");
        assert_eq!(medal(2), "🥉");
        assert_eq!(medal(3), "🔹");
        assert_eq!(medal(99), "🔹");
    }

    #[test]
    fn test_usd_compact() {
        assert_eq!(usd_compact(2_500_000.0), "$2.50M");
        assert_eq!(usd_compact(430_000.0), "$430.00K");
        assert_eq!(usd_compact(12.345), "$12.35");
        assert_eq!(usd_compact(-1_250_000.0), "-$1.25M");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello world", 5), "hello...");
        // multi-byte safe
        assert_eq!(truncate_chars("日本語テスト", 3), "日本語...");
    }

    #[test]
    fn test_markup_tokens() {
        assert_eq!(bold("x"), "*x*");
        assert_eq!(code("+7.10%"), "`+7.10%`");
        assert_eq!(link("a", "https://x"), "[a](https://x)");
    }

    #[test]
    fn test_time_until() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let in_30m = now.timestamp_millis() + 30 * 60_000;
        let in_5h = now.timestamp_millis() + 5 * 3_600_000;
        let ago_2h = now.timestamp_millis() - 2 * 3_600_000;
        assert_eq!(time_until(in_30m, now), "in 30m");
        assert_eq!(time_until(in_5h, now), "in 5h");
        assert_eq!(time_until(ago_2h, now), "2h ago");
    }

    #[test]
    fn test_country_flag_fallback() {
        assert_eq!(country_flag("United States"), "🇺🇸");
        assert_eq!(country_flag("Atlantis"), "🌍");
    }
}
