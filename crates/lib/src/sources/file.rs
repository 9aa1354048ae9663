//! Local JSON export source: `{"records": [...]}` or a bare array of records.

use crate::sources::record::{RawRecord, RecordsResponse};
use crate::sources::{RecordSource, SourceError};
use async_trait::async_trait;
use std::path::PathBuf;

/// Reads records from a local JSON export.
pub struct FileSource {
    label: String,
    path: PathBuf,
}

impl FileSource {
    /// `label` defaults to the file stem.
    pub fn new(path: impl Into<PathBuf>, label: Option<String>) -> Self {
        let path = path.into();
        let label = label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            });
        Self { label, path }
    }
}

#[async_trait]
impl RecordSource for FileSource {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        let s = tokio::fs::read_to_string(&self.path).await?;
        parse_records(&s)
    }
}

/// Accept either the endpoint envelope or a bare JSON array.
pub fn parse_records(s: &str) -> Result<Vec<RawRecord>, SourceError> {
    if s.trim_start().starts_with('[') {
        Ok(serde_json::from_str(s)?)
    } else {
        let data: RecordsResponse = serde_json::from_str(s)?;
        Ok(data.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_envelope_and_bare_array() {
        let env = r#"{"records": [{"id": "1", "message": "a"}]}"#;
        let arr = r#" [{"id": "1", "message": "a"}, {"id": "2"}]"#;
        assert_eq!(parse_records(env).unwrap().len(), 1);
        assert_eq!(parse_records(arr).unwrap().len(), 2);
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(matches!(
            parse_records("{\"records\": 5}"),
            Err(SourceError::Malformed(_))
        ));
    }

    #[test]
    fn error_body_without_records_is_an_error() {
        assert!(matches!(
            parse_records(r#"{"error": "quota exceeded"}"#),
            Err(SourceError::Malformed(_))
        ));
        assert!(parse_records(r#"{"records": []}"#).unwrap().is_empty());
    }

    #[test]
    fn one_badly_typed_row_does_not_spoil_the_export() {
        let body = r#"{"records": [
            {"id": "1", "name": 42, "status": "receive", "currentTime": "08/01/2024, 09.00.00", "message": "a"},
            {"id": "2", "name": "bot", "status": "send", "currentTime": 1704704445000, "timestamp": 1704704445000, "message": "b"},
            {"id": "3", "name": "bot", "status": 7, "currentTime": "08/01/2024, 09.01.00", "message": "c"}
        ]}"#;
        let records = parse_records(body).unwrap();
        assert_eq!(records.len(), 3);

        let n = crate::normalize::normalize(&[crate::sources::SourceBatch::new("f", records)]);
        assert_eq!(n.messages.len(), 2);
        assert_eq!(n.messages[0].participant, "42");
        assert_eq!(
            n.messages[1].timestamp,
            chrono::NaiveDate::from_ymd_opt(2024, 1, 8)
                .unwrap()
                .and_hms_opt(9, 0, 45)
                .unwrap()
        );
        assert_eq!(n.failures.len(), 1);
        assert_eq!(n.failures[0].id, "3");
    }

    #[test]
    fn label_defaults_to_file_stem() {
        let s = FileSource::new("/tmp/history-march.json", None);
        assert_eq!(s.label(), "history-march");
    }
}
