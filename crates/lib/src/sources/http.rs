//! HTTP history source: GET `<url>?action=read-history-message`, body `{"records": [...]}`.

use crate::sources::record::{RawRecord, RecordsResponse};
use crate::sources::{RecordSource, SourceError};
use async_trait::async_trait;

/// Fetches records from a history endpoint.
pub struct HttpSource {
    label: String,
    url: String,
    action: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// `label` defaults to [`label_from_url`] when `None`.
    pub fn new(url: impl Into<String>, label: Option<String>, action: impl Into<String>) -> Self {
        let url = url.into();
        let label = label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| label_from_url(&url));
        Self {
            label,
            url,
            action: action.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, SourceError> {
        let res = self
            .client
            .get(&self.url)
            .query(&[("action", self.action.as_str())])
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(SourceError::Status(format!("{} {}", status, body)));
        }
        let body = res.text().await?;
        let data: RecordsResponse = serde_json::from_str(&body)?;
        Ok(data.records)
    }
}

/// Short label for a deployment URL: first 10 chars of the second-to-last path segment plus "...".
/// e.g. `https://script.google.com/macros/s/AKfycbwXynUCMX_pL/exec` -> `AKfycbwXyn...`.
pub fn label_from_url(url: &str) -> String {
    let trimmed = url.split(['?', '#']).next().unwrap_or(url);
    let segments: Vec<&str> = trimmed.split('/').collect();
    let segment = if segments.len() >= 2 {
        segments[segments.len() - 2]
    } else {
        trimmed
    };
    let short: String = segment.chars().take(10).collect();
    format!("{}...", short)
}
