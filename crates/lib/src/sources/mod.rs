//! Record sources (history endpoints, local exports).
//!
//! A source yields raw message records; the analysis never sees transport
//! errors. A failing source contributes nothing and is reported as a
//! [`SourceFailure`] while the remaining sources still count.

mod file;
mod http;
mod record;

pub use file::{parse_records, FileSource};
pub use http::{label_from_url, HttpSource};
pub(crate) use record::value_display;
pub use record::{RawRecord, SourceBatch};

use crate::config::SourceConfig;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("endpoint returned {0}")]
    Status(String),
    #[error("malformed records: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that can produce a snapshot of raw records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Short label attached to every message from this source.
    fn label(&self) -> &str;
    /// Fetch the current snapshot of records.
    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError>;
}

/// A source that could not be read, with the reason as text for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub label: String,
    pub reason: String,
}

/// Result of fetching every configured source.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    /// Batches of the sources that succeeded, in configuration order.
    pub batches: Vec<SourceBatch>,
    pub failures: Vec<SourceFailure>,
}

/// Build source connectors from config entries.
pub fn from_config(sources: &[SourceConfig]) -> Vec<Box<dyn RecordSource>> {
    sources
        .iter()
        .map(|s| -> Box<dyn RecordSource> {
            match s {
                SourceConfig::Http { url, label, action } => {
                    Box::new(HttpSource::new(url.clone(), label.clone(), action.clone()))
                }
                SourceConfig::File { path, label } => {
                    Box::new(FileSource::new(path.clone(), label.clone()))
                }
            }
        })
        .collect()
}

/// Fetch all sources concurrently. Failures are logged and collected, never raised.
pub async fn fetch_all(sources: &[Box<dyn RecordSource>]) -> FetchOutcome {
    let results =
        futures_util::future::join_all(sources.iter().map(|s| async move { (s.label(), s.fetch().await) }))
            .await;
    let mut outcome = FetchOutcome::default();
    for (label, result) in results {
        match result {
            Ok(records) => {
                log::info!("source {}: fetched {} record(s)", label, records.len());
                outcome.batches.push(SourceBatch::new(label, records));
            }
            Err(e) => {
                log::warn!("source {}: {}", label, e);
                outcome.failures.push(SourceFailure {
                    label: label.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Option<Vec<RawRecord>>);

    #[async_trait]
    impl RecordSource for Fixed {
        fn label(&self) -> &str {
            self.0
        }

        async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
            self.1
                .clone()
                .ok_or_else(|| SourceError::Status("503 Service Unavailable".to_string()))
        }
    }

    #[tokio::test]
    async fn failing_source_is_reported_and_others_kept() {
        let sources: Vec<Box<dyn RecordSource>> = vec![
            Box::new(Fixed("a", Some(vec![RawRecord::default()]))),
            Box::new(Fixed("down", None)),
            Box::new(Fixed("b", Some(vec![]))),
        ];
        let out = fetch_all(&sources).await;
        let labels: Vec<&str> = out.batches.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(out.failures.len(), 1);
        assert_eq!(out.failures[0].label, "down");
        assert!(out.failures[0].reason.contains("503"));
    }

    #[tokio::test]
    async fn missing_file_is_a_source_failure() {
        let sources = from_config(&[SourceConfig::File {
            path: std::env::temp_dir().join("replystat-does-not-exist.json"),
            label: None,
        }]);
        let out = fetch_all(&sources).await;
        assert!(out.batches.is_empty());
        assert_eq!(out.failures[0].label, "replystat-does-not-exist");
    }
}
