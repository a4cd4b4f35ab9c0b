//! Response normalization
//!
//! Upstream bodies differ in shape (bare arrays, `data` wrappers, named
//! lists) and in field naming. This module extracts record objects with
//! shape hints, resolves fields through ordered synonym lists, and coerces
//! values losslessly. A value that cannot be read cleanly comes back as
//! absent, never as zero.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Where to look for the list of record objects in a body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// The body is the array
    BareList,
    /// The array sits under `data`
    DataList,
    /// The array sits under a named key
    NamedList(&'static str),
    /// A single object is the one record
    SingleObject,
}

/// Extract record objects from a body, trying shape hints in order.
/// The first hint that yields at least one object wins.
pub fn record_objects<'a>(body: &'a Value, shapes: &[Shape]) -> Vec<&'a Map<String, Value>> {
    for shape in shapes {
        let list: Option<&Vec<Value>> = match shape {
            Shape::BareList => body.as_array(),
            Shape::DataList => body.get("data").and_then(Value::as_array),
            Shape::NamedList(key) => body.get(*key).and_then(Value::as_array),
            Shape::SingleObject => {
                // data wrapper first so an envelope never reads as the record
                let obj = body
                    .get("data")
                    .and_then(Value::as_object)
                    .or_else(|| body.as_object());
                if let Some(obj) = obj {
                    return vec![obj];
                }
                None
            }
        };

        if let Some(list) = list {
            let objects: Vec<&Map<String, Value>> =
                list.iter().filter_map(Value::as_object).collect();
            if !objects.is_empty() {
                return objects;
            }
        }
    }
    Vec::new()
}

/// The most recent record in a body: the last object of a `data` list,
/// or the `data` object itself.
pub fn latest_object(body: &Value) -> Option<&Map<String, Value>> {
    match body.get("data") {
        Some(Value::Array(list)) => list.iter().rev().find_map(Value::as_object),
        Some(Value::Object(obj)) => Some(obj),
        _ => body.as_object(),
    }
}

/// First synonym whose value is present and non-empty
pub fn lookup<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        record.get(*key).filter(|v| {
            !v.is_null() && !matches!(v, Value::String(s) if s.trim().is_empty())
        })
    })
}

/// Coerce a JSON value into a finite float, or absent
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                trimmed.parse::<f64>().ok().filter(|f| f.is_finite())
            }
        }
        _ => None,
    }
}

/// Coerce a JSON value into an integer, or absent
pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

/// Resolve a float field through a synonym list. Synonyms whose value is
/// present but uncoercible fall through to the next synonym.
pub fn f64_field(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(coerce_f64)
}

pub fn i64_field(record: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(coerce_i64)
}

pub fn str_field<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub fn bool_field(record: &Map<String, Value>, keys: &[&str]) -> Option<bool> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(Value::as_bool)
}

/// Read a timestamp field as milliseconds since the epoch. Numeric values
/// above 1e12 are already milliseconds, smaller ones are seconds. String
/// values are tried as numbers, then as RFC 3339.
pub fn timestamp_ms(record: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().filter_map(|key| record.get(*key)).find_map(|v| {
        if let Some(raw) = coerce_f64(v) {
            if raw <= 0.0 {
                return None;
            }
            return Some(if raw > 1e12 {
                raw as i64
            } else {
                (raw * 1000.0) as i64
            });
        }
        v.as_str()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s.trim()).ok())
            .map(|dt| dt.timestamp_millis())
    })
}

/// Field type expected by a normalizer spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Float,
    Int,
    Text,
}

/// A normalized field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    Text(String),
}

/// One field of a record: canonical name, synonym chain, expected type
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub keys: &'static [&'static str],
    pub kind: FieldKind,
}

/// A record after normalization. Fields the source did not provide are
/// simply missing from the map.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRecord {
    fields: BTreeMap<&'static str, FieldValue>,
}

impl NormalizedRecord {
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.fields.get(name)? {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Text(_) => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        match self.fields.get(name)? {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A declarative body-to-records converter
#[derive(Debug, Clone)]
pub struct Normalizer {
    shapes: Vec<Shape>,
    fields: Vec<FieldSpec>,
}

impl Normalizer {
    pub fn new(shapes: Vec<Shape>, fields: Vec<FieldSpec>) -> Self {
        Self { shapes, fields }
    }

    /// Extract and normalize all records from a body. Records where every
    /// field came back absent are dropped.
    pub fn normalize(&self, body: &Value) -> Vec<NormalizedRecord> {
        record_objects(body, &self.shapes)
            .into_iter()
            .filter_map(|obj| {
                let mut record = NormalizedRecord::default();
                for spec in &self.fields {
                    let value = match spec.kind {
                        FieldKind::Float => f64_field(obj, spec.keys).map(FieldValue::Float),
                        FieldKind::Int => i64_field(obj, spec.keys).map(FieldValue::Int),
                        FieldKind::Text => {
                            str_field(obj, spec.keys).map(|s| FieldValue::Text(s.to_string()))
                        }
                    };
                    if let Some(value) = value {
                        record.fields.insert(spec.name, value);
                    }
                }
                if record.is_empty() {
                    None
                } else {
                    Some(record)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_record_objects_shape_order() {
        let body = json!({"data": [{"a": 1}, {"a": 2}]});
        let records = record_objects(&body, &[Shape::BareList, Shape::DataList]);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_record_objects_named_list() {
        let body = json!({"data_list": [{"a": 1}]});
        let records = record_objects(&body, &[Shape::DataList, Shape::NamedList("data_list")]);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_single_object_prefers_data_wrapper() {
        let body = json!({"code": "0", "data": {"value": 42}});
        let records = record_objects(&body, &[Shape::SingleObject]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("value"), Some(&json!(42)));
    }

    #[test]
    fn test_latest_object_takes_last_dict() {
        let body = json!({"data": [{"v": 1}, "garbage", {"v": 3}]});
        let latest = latest_object(&body).unwrap();
        assert_eq!(latest.get("v"), Some(&json!(3)));
    }

    #[test]
    fn test_lookup_skips_null_and_empty() {
        let record = obj(json!({"a": null, "b": "  ", "c": "x"}));
        let value = lookup(&record, &["a", "b", "c"]).unwrap();
        assert_eq!(value, &json!("x"));
    }

    #[test]
    fn test_coerce_f64_string_numbers() {
        assert_eq!(coerce_f64(&json!(" 1.5 ")), Some(1.5));
        assert_eq!(coerce_f64(&json!("-0.7")), Some(-0.7));
        assert_eq!(coerce_f64(&json!("abc")), None);
        assert_eq!(coerce_f64(&json!("")), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&json!([1])), None);
    }

    #[test]
    fn test_f64_field_falls_through_uncoercible_synonym() {
        // first synonym present but not a number, second one usable
        let record = obj(json!({"price": "n/a", "priceChange": "2.25"}));
        assert_eq!(f64_field(&record, &["price", "priceChange"]), Some(2.25));
    }

    #[test]
    fn test_absent_is_not_zero() {
        let record = obj(json!({"other": 1}));
        assert_eq!(f64_field(&record, &["value"]), None);
    }

    #[test]
    fn test_timestamp_ms_units() {
        let record = obj(json!({
            "secs": 1_700_000_000i64,
            "millis": 1_700_000_000_000i64,
            "iso": "2023-11-14T22:13:20Z"
        }));
        assert_eq!(timestamp_ms(&record, &["secs"]), Some(1_700_000_000_000));
        assert_eq!(timestamp_ms(&record, &["millis"]), Some(1_700_000_000_000));
        assert_eq!(timestamp_ms(&record, &["iso"]), Some(1_700_000_000_000));
    }

    #[test]
    fn test_normalizer_drops_all_empty_records() {
        let normalizer = Normalizer::new(
            vec![Shape::DataList],
            vec![FieldSpec {
                name: "value",
                keys: &["value", "score"],
                kind: FieldKind::Float,
            }],
        );
        let body = json!({"data": [{"value": "1.5"}, {"junk": true}, {"score": 2}]});
        let records = normalizer.normalize(&body);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].float("value"), Some(1.5));
        assert_eq!(records[1].float("value"), Some(2.0));
    }

    #[test]
    fn test_normalizer_text_field() {
        let normalizer = Normalizer::new(
            vec![Shape::BareList],
            vec![FieldSpec {
                name: "symbol",
                keys: &["symbol", "pair", "name"],
                kind: FieldKind::Text,
            }],
        );
        let body = json!([{"pair": "BTCUSDT"}]);
        let records = normalizer.normalize(&body);
        assert_eq!(records[0].text("symbol"), Some("BTCUSDT"));
    }
}
