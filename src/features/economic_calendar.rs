//! Economic calendar push
//!
//! Pulls upcoming macro events, keeps the important unpublished ones inside
//! the time window, and pushes each new event once. Delivery is
//! at-least-once: an event ID is only recorded as seen after its message
//! went out, so a failed send retries next run.

use super::{FeatureContext, RunOutcome};
use crate::normalize::{f64_field, i64_field, lookup, record_objects, str_field, timestamp_ms, Shape};
use crate::render::{bold, code, country_flag, importance_marker, time_until, utc_time};
use crate::store::SeenStore;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

const STORE_NAME: &str = "economic_calendar";

/// One pushable calendar event
#[derive(Debug, Clone)]
pub struct CalendarEvent {
    pub id: String,
    pub name: String,
    pub country: String,
    pub importance: i64,
    pub publish_ms: i64,
    pub forecast: Option<f64>,
    pub previous: Option<f64>,
    pub effect: Option<String>,
}

fn event_id(obj: &Map<String, Value>, name: &str, publish_ms: i64) -> String {
    str_field(obj, &["id", "calendar_id"])
        .map(str::to_string)
        .or_else(|| i64_field(obj, &["id", "calendar_id"]).map(|v| v.to_string()))
        .unwrap_or_else(|| format!("{name}_{publish_ms}"))
}

/// Filter raw calendar records to pushable events, oldest first
pub fn select_events(
    body: &Value,
    min_importance: i64,
    now: DateTime<Utc>,
    lookback: Duration,
    lookahead: Duration,
) -> Vec<CalendarEvent> {
    let window_start = (now - lookback).timestamp_millis();
    let window_end = (now + lookahead).timestamp_millis();

    let mut events: Vec<CalendarEvent> = record_objects(body, &[Shape::DataList, Shape::BareList])
        .into_iter()
        .filter_map(|obj| {
            let importance = i64_field(obj, &["importance_level", "importance"])?;
            if importance < min_importance {
                return None;
            }
            let publish_ms = timestamp_ms(obj, &["publish_timestamp", "publish_time", "time"])?;
            if publish_ms < window_start || publish_ms > window_end {
                return None;
            }
            // already-published events carry an actual value
            if lookup(obj, &["published_value", "actual", "actual_value"]).is_some() {
                return None;
            }
            let name = str_field(obj, &["title", "name", "event", "indicator_name"])?.to_string();
            Some(CalendarEvent {
                id: event_id(obj, &name, publish_ms),
                country: str_field(obj, &["country", "country_name", "region"])
                    .unwrap_or("")
                    .to_string(),
                importance,
                publish_ms,
                forecast: f64_field(obj, &["forecast_value", "forecast", "expected"]),
                previous: f64_field(obj, &["previous_value", "previous"]),
                effect: str_field(obj, &["data_effect", "effect"]).map(str::to_string),
                name,
            })
        })
        .collect();

    events.sort_by_key(|e| e.publish_ms);
    events
}

fn value_line(label: &str, value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{label}: {}", code(&format!("{v}"))),
        None => format!("{label}: n/a"),
    }
}

pub fn render_event(event: &CalendarEvent, now: DateTime<Utc>) -> String {
    let mut lines = vec![format!(
        "{} {} {}",
        importance_marker(event.importance),
        country_flag(&event.country),
        bold(&event.name)
    )];
    lines.push(format!(
        "🕐 {} ({})",
        utc_time(event.publish_ms),
        time_until(event.publish_ms, now)
    ));
    lines.push(format!(
        "{} | {}",
        value_line("Forecast", event.forecast),
        value_line("Previous", event.previous)
    ));
    if let Some(effect) = &event.effect {
        lines.push(format!("📣 Market effect: {effect}"));
    }
    lines.join("\n")
}

pub async fn run(ctx: &FeatureContext) -> RunOutcome {
    let cfg = &ctx.config.economic;
    let body = match ctx.coinglass.get("/api/calendar/economic-data", &[]).await {
        Ok(body) => body,
        Err(e) => return RunOutcome::failure(format!("calendar fetch failed: {e}")),
    };

    let now = Utc::now();
    let events = select_events(
        &body,
        cfg.min_importance,
        now,
        Duration::hours(cfg.lookback_hours),
        Duration::days(cfg.lookahead_days),
    );

    let mut store = ctx.open_store(STORE_NAME, cfg.store_capacity);
    let topic = ctx.topic(STORE_NAME);
    let mut delivered = 0usize;
    let mut failed = 0usize;

    for event in &events {
        if store.contains(&event.id) {
            continue;
        }
        match ctx.delivery.deliver(&render_event(event, now), topic).await {
            Ok(()) => {
                store.add(&event.id);
                delivered += 1;
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(event = %event.name, error = %e, "event delivery failed");
            }
        }
    }

    if delivered > 0 {
        if let Err(e) = store.persist() {
            tracing::warn!(error = %e, "seen store persist failed");
        }
    }

    match (delivered, failed) {
        (_, 0) => RunOutcome::success(format!("{delivered} new events")),
        (0, _) => RunOutcome::failure(format!("{failed} deliveries failed")),
        _ => RunOutcome::partial(format!("{delivered} delivered, {failed} failed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn select(body: &Value) -> Vec<CalendarEvent> {
        select_events(body, 2, now(), Duration::hours(24), Duration::days(7))
    }

    #[test]
    fn test_select_filters_importance_and_window() {
        let in_window = now().timestamp_millis() + 3_600_000;
        let too_far = now().timestamp_millis() + 10 * 86_400_000;
        let body = json!({"data": [
            {"title": "CPI YoY", "country": "United States", "importance_level": 3,
             "publish_timestamp": in_window, "forecast_value": 3.2},
            {"title": "Minor print", "importance_level": 1, "publish_timestamp": in_window},
            {"title": "Distant", "importance_level": 3, "publish_timestamp": too_far}
        ]});
        let events = select(&body);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "CPI YoY");
    }

    #[test]
    fn test_published_events_excluded() {
        let ts = now().timestamp_millis() - 3_600_000;
        let body = json!({"data": [
            {"title": "NFP", "importance_level": 3, "publish_timestamp": ts,
             "published_value": 210.0}
        ]});
        assert!(select(&body).is_empty());
    }

    #[test]
    fn test_composite_id_fallback() {
        let ts = now().timestamp_millis() + 60_000;
        let body = json!({"data": [
            {"title": "GDP QoQ", "importance_level": 2, "publish_timestamp": ts}
        ]});
        let events = select(&body);
        assert_eq!(events[0].id, format!("GDP QoQ_{ts}"));
    }

    #[test]
    fn test_seconds_timestamps_accepted() {
        let ts_secs = now().timestamp() + 3_600;
        let body = json!({"data": [
            {"title": "PMI", "importance_level": 2, "publish_time": ts_secs}
        ]});
        let events = select(&body);
        assert_eq!(events[0].publish_ms, ts_secs * 1000);
    }

    #[test]
    fn test_events_sorted_oldest_first() {
        let base = now().timestamp_millis();
        let body = json!({"data": [
            {"title": "Later", "importance_level": 2, "publish_timestamp": base + 7_200_000},
            {"title": "Sooner", "importance_level": 2, "publish_timestamp": base + 3_600_000}
        ]});
        let events = select(&body);
        assert_eq!(events[0].name, "Sooner");
    }

    #[test]
    fn test_render_event() {
        let event = CalendarEvent {
            id: "1".to_string(),
            name: "CPI YoY".to_string(),
            country: "United States".to_string(),
            importance: 3,
            publish_ms: now().timestamp_millis() + 5 * 3_600_000,
            forecast: Some(3.2),
            previous: Some(3.4),
            effect: None,
        };
        let text = render_event(&event, now());
        assert!(text.contains("🔴 🇺🇸 *CPI YoY*"));
        assert!(text.contains("(in 5h)"));
        assert!(text.contains("Forecast: `3.2` | Previous: `3.4`"));
        assert!(!text.contains("Market effect"));
    }

    #[test]
    fn test_effect_line_rendered_when_present() {
        let ts = now().timestamp_millis() + 60_000;
        let body = json!({"data": [
            {"title": "FOMC Rate Decision", "importance_level": 3, "publish_timestamp": ts,
             "data_effect": "Higher than expected is bullish for USD"}
        ]});
        let events = select(&body);
        assert_eq!(
            events[0].effect.as_deref(),
            Some("Higher than expected is bullish for USD")
        );
        let text = render_event(&events[0], now());
        assert!(text.contains("📣 Market effect: Higher than expected is bullish for USD"));
    }
}
