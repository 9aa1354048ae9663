//! Record normalizer: raw history rows -> chronologically ordered [`Message`]s.
//!
//! Rows are deduplicated on (id, text) across all batches, keeping the first
//! occurrence. Timestamps are resolved from the human-readable `currentTime`
//! field, falling back to epoch milliseconds. Rows that cannot be decoded are
//! dropped and reported; the rest of the batch is unaffected.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::sources::{value_display, RawRecord, SourceBatch};

/// Format of the primary timestamp, e.g. "21/03/2025, 14.05.09".
pub const PRIMARY_TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H.%M.%S";

/// Direction of a message relative to the responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// From the human counterpart ("receive").
    Inbound,
    /// From the responder side ("send").
    Outbound,
}

impl Direction {
    /// "receive" -> Inbound, "send" -> Outbound (case-insensitive); anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "receive" => Some(Direction::Inbound),
            "send" => Some(Direction::Outbound),
            _ => None,
        }
    }
}

/// A normalized chat message. Timestamps are naive local wall-clock instants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub participant: String,
    pub direction: Direction,
    pub timestamp: NaiveDateTime,
    pub text: String,
    /// Label of the source the row came from.
    pub source: String,
}

impl Message {
    pub fn is_inbound(&self) -> bool {
        self.direction == Direction::Inbound
    }

    pub fn is_outbound(&self) -> bool {
        self.direction == Direction::Outbound
    }
}

/// Why a row was dropped.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unresolvable timestamp (currentTime {current_time:?}, no usable epoch millis)")]
    Timestamp { current_time: Option<String> },
    #[error("unknown direction {0:?}")]
    Direction(Option<String>),
}

/// A dropped row: its source, position within that source, id, and reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeFailure {
    pub source: String,
    pub index: usize,
    pub id: String,
    pub error: DecodeError,
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    /// Messages in ascending timestamp order; ties keep first-seen order.
    pub messages: Vec<Message>,
    pub failures: Vec<DecodeFailure>,
    /// Rows collapsed because an earlier row had the same (id, text).
    pub duplicates_dropped: usize,
}

/// Resolve a row's instant: primary format first, then epoch milliseconds.
pub fn resolve_timestamp(record: &RawRecord) -> Option<NaiveDateTime> {
    record
        .current_time_str()
        .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), PRIMARY_TIMESTAMP_FORMAT).ok())
        .or_else(|| {
            record
                .epoch_millis()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| dt.naive_utc())
        })
}

fn decode(record: &RawRecord, source: &str) -> Result<Message, DecodeError> {
    let timestamp = resolve_timestamp(record).ok_or_else(|| DecodeError::Timestamp {
        current_time: value_display(&record.current_time),
    })?;
    let direction = record
        .status_str()
        .and_then(Direction::parse)
        .ok_or_else(|| DecodeError::Direction(value_display(&record.status)))?;
    Ok(Message {
        id: record.id_string(),
        participant: record.participant(),
        direction,
        timestamp,
        text: record.text(),
        source: source.to_string(),
    })
}

/// Merge, deduplicate, decode and order the rows of all batches.
pub fn normalize(batches: &[SourceBatch]) -> Normalized {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out = Normalized::default();

    for batch in batches {
        for (index, record) in batch.records.iter().enumerate() {
            let key = (record.id_string(), record.text());
            if !seen.insert(key) {
                out.duplicates_dropped += 1;
                continue;
            }
            match decode(record, &batch.label) {
                Ok(m) => out.messages.push(m),
                Err(error) => {
                    log::warn!("source {}: dropping record #{}: {}", batch.label, index, error);
                    out.failures.push(DecodeFailure {
                        source: batch.label.clone(),
                        index,
                        id: record.id_string(),
                        error,
                    });
                }
            }
        }
    }

    // Stable sort keeps first-seen order among equal timestamps.
    out.messages.sort_by_key(|m| m.timestamp);
    log::debug!(
        "normalized {} message(s), {} failure(s), {} duplicate(s)",
        out.messages.len(),
        out.failures.len(),
        out.duplicates_dropped
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn row(id: &str, name: &str, status: &str, current_time: &str, text: &str) -> RawRecord {
        RawRecord {
            id: json!(id),
            name: json!(name),
            status: json!(status),
            current_time: json!(current_time),
            timestamp: json!(null),
            message: json!(text),
        }
    }

    #[test]
    fn parses_primary_timestamp_format() {
        let r = row("1", "A", "receive", "21/03/2025, 14.05.09", "hi");
        assert_eq!(
            resolve_timestamp(&r),
            NaiveDate::from_ymd_opt(2025, 3, 21)
                .unwrap()
                .and_hms_opt(14, 5, 9)
        );
    }

    #[test]
    fn falls_back_to_epoch_millis() {
        let mut r = row("1", "A", "receive", "garbage", "hi");
        r.timestamp = json!(1_700_000_000_000i64);
        assert_eq!(
            resolve_timestamp(&r),
            NaiveDate::from_ymd_opt(2023, 11, 14)
                .unwrap()
                .and_hms_opt(22, 13, 20)
        );
    }

    #[test]
    fn undecodable_rows_are_reported_not_fatal() {
        let mut bad_time = row("2", "A", "receive", "yesterday", "x");
        bad_time.timestamp = json!("soon");
        let bad_status = row("3", "A", "typing", "01/01/2024, 10.00.00", "y");
        let good = row("1", "A", "receive", "01/01/2024, 09.00.00", "hi");
        let n = normalize(&[SourceBatch::new("s", vec![bad_time, good, bad_status])]);

        assert_eq!(n.messages.len(), 1);
        assert_eq!(n.messages[0].id, "1");
        assert_eq!(n.failures.len(), 2);
        assert_eq!(n.failures[0].index, 0);
        assert!(matches!(n.failures[0].error, DecodeError::Timestamp { .. }));
        assert_eq!(
            n.failures[1].error,
            DecodeError::Direction(Some("typing".to_string()))
        );
    }

    #[test]
    fn output_is_chronological_regardless_of_input_order() {
        let rows = vec![
            row("3", "A", "send", "01/01/2024, 09.05.00", "c"),
            row("1", "A", "receive", "01/01/2024, 09.00.00", "a"),
            row("2", "B", "receive", "01/01/2024, 09.01.00", "b"),
        ];
        let n = normalize(&[SourceBatch::new("s", rows)]);
        let ids: Vec<&str> = n.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(n.messages[2].direction, Direction::Outbound);
    }

    #[test]
    fn duplicates_across_batches_keep_first_seen() {
        let first = vec![
            row("1", "A", "receive", "01/01/2024, 09.00.00", "hi"),
            row("2", "A", "send", "01/01/2024, 09.01.00", "hello"),
        ];
        let second = vec![
            row("1", "A", "receive", "01/01/2024, 09.00.00", "hi"),
            row("3", "B", "receive", "01/01/2024, 09.00.00", "pagi"),
        ];
        let n = normalize(&[
            SourceBatch::new("first", first),
            SourceBatch::new("second", second),
        ]);

        assert_eq!(n.duplicates_dropped, 1);
        let kept: Vec<(&str, &str)> = n
            .messages
            .iter()
            .map(|m| (m.id.as_str(), m.source.as_str()))
            .collect();
        assert_eq!(kept, vec![("1", "first"), ("3", "second"), ("2", "first")]);
    }

    #[test]
    fn same_id_different_text_is_not_a_duplicate() {
        let rows = vec![
            row("1", "A", "receive", "01/01/2024, 09.00.00", "hi"),
            row("1", "A", "receive", "01/01/2024, 09.00.00", "hi again"),
        ];
        let n = normalize(&[SourceBatch::new("s", rows)]);
        assert_eq!(n.messages.len(), 2);
        assert_eq!(n.duplicates_dropped, 0);
    }
}
