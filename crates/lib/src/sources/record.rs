//! Raw message record as served by a history endpoint, before normalization.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One loosely-typed history row. Field types vary between exports, so every
/// field is kept as raw JSON; a badly typed value only spoils its own row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    #[serde(default)]
    pub id: Value,
    /// Participant name.
    #[serde(default)]
    pub name: Value,
    /// "receive" (from the human counterpart) or "send" (from the responder).
    #[serde(default)]
    pub status: Value,
    /// Primary timestamp, e.g. "21/03/2025, 14.05.09".
    #[serde(default)]
    pub current_time: Value,
    /// Fallback timestamp in epoch milliseconds.
    #[serde(default)]
    pub timestamp: Value,
    #[serde(default)]
    pub message: Value,
}

impl RawRecord {
    /// Identifier as a string; numbers are rendered without quotes, missing ids are empty.
    pub fn id_string(&self) -> String {
        value_to_string(&self.id)
    }

    /// Participant name; numbers are rendered as text, missing names are empty.
    pub fn participant(&self) -> String {
        value_to_string(&self.name)
    }

    /// Direction string, only when it is a JSON string.
    pub fn status_str(&self) -> Option<&str> {
        self.status.as_str()
    }

    /// Primary timestamp, only when it is a JSON string.
    pub fn current_time_str(&self) -> Option<&str> {
        self.current_time.as_str()
    }

    /// Message text as a string.
    pub fn text(&self) -> String {
        value_to_string(&self.message)
    }

    /// Fallback epoch milliseconds, from a JSON number or a numeric string.
    pub fn epoch_millis(&self) -> Option<i64> {
        match &self.timestamp {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
            }
            _ => None,
        }
    }
}

/// Raw JSON rendered for diagnostics; `None` for null.
pub(crate) fn value_display(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        other => Some(value_to_string(other)),
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Response body of a history endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct RecordsResponse {
    pub records: Vec<RawRecord>,
}

/// Records fetched from one source, tagged with the source's short label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBatch {
    pub label: String,
    pub records: Vec<RawRecord>,
}

impl SourceBatch {
    pub fn new(label: impl Into<String>, records: Vec<RawRecord>) -> Self {
        Self {
            label: label.into(),
            records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_history_row_with_mixed_types() {
        let json = r#"{
            "id": 42,
            "name": "Budi",
            "status": "receive",
            "currentTime": "21/03/2025, 14.05.09",
            "timestamp": "1742540709000",
            "message": "halo",
            "extra": true
        }"#;
        let r: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.id_string(), "42");
        assert_eq!(r.participant(), "Budi");
        assert_eq!(r.status_str(), Some("receive"));
        assert_eq!(r.current_time_str(), Some("21/03/2025, 14.05.09"));
        assert_eq!(r.epoch_millis(), Some(1_742_540_709_000));
        assert_eq!(r.text(), "halo");
    }

    #[test]
    fn missing_fields_default() {
        let r: RawRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(r.id_string(), "");
        assert_eq!(r.text(), "");
        assert_eq!(r.participant(), "");
        assert_eq!(r.status_str(), None);
        assert_eq!(r.epoch_millis(), None);
    }

    #[test]
    fn badly_typed_fields_still_parse() {
        let json = r#"{"id": 7, "name": 42, "status": ["send"], "currentTime": 1704704400000, "timestamp": 1704704400000}"#;
        let r: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.participant(), "42");
        assert_eq!(r.status_str(), None);
        assert_eq!(r.current_time_str(), None);
        assert_eq!(value_display(&r.current_time).as_deref(), Some("1704704400000"));
        assert_eq!(r.epoch_millis(), Some(1_704_704_400_000));
    }

    #[test]
    fn numeric_epoch_and_garbage_epoch() {
        let mut r = RawRecord {
            timestamp: serde_json::json!(1_700_000_000_123i64),
            ..RawRecord::default()
        };
        assert_eq!(r.epoch_millis(), Some(1_700_000_000_123));
        r.timestamp = serde_json::json!("not a number");
        assert_eq!(r.epoch_millis(), None);
    }
}
