//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.replystat/config.json`) and environment.
//! It names the record sources to fetch and the tunables of the response-time analysis.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::pairing::PairingStrategy;
use crate::stats::PlausibilityFilter;
use crate::workhours::WorkWindow;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Where raw message records come from. Sources are fetched in order.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// Response-time analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// One record source: a history endpoint or a local JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SourceConfig {
    /// HTTP endpoint answering `GET ?action=<action>` with `{"records": [...]}`.
    #[serde(rename_all = "camelCase")]
    Http {
        url: String,
        /// Short label for the source. Derived from the URL when absent.
        #[serde(default)]
        label: Option<String>,
        /// Value of the `action` query parameter (default "read-history-message").
        #[serde(default = "default_action")]
        action: String,
    },

    /// JSON file holding either `{"records": [...]}` or a bare array of records.
    #[serde(rename_all = "camelCase")]
    File {
        path: PathBuf,
        #[serde(default)]
        label: Option<String>,
    },
}

fn default_action() -> String {
    "read-history-message".to_string()
}

/// Pairing strategy name as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Inbound message immediately followed by the responder's reply.
    #[default]
    Adjacent,

    /// Per-participant pending inbound, settled by the next responder reply.
    Session,
}

/// Work window, plausibility ceiling, responder and pairing strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    /// Start of the daily work window, "HH:MM" or "HH:MM:SS" (default "08:00").
    #[serde(default = "default_work_start")]
    pub work_start: String,

    /// End of the daily work window (default "20:00").
    #[serde(default = "default_work_end")]
    pub work_end: String,

    /// Pairs slower than this many seconds are treated as abandoned (default 180).
    #[serde(default = "default_ceiling_secs")]
    pub ceiling_secs: f64,

    /// Participant id of the automated side. When unset, every outbound message counts as a reply.
    /// Overridden by REPLYSTAT_RESPONDER env.
    #[serde(default)]
    pub responder: Option<String>,

    /// "adjacent" (default) or "session".
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Session strategy only: pending inbound messages older than this are abandoned. Unset means never.
    #[serde(default)]
    pub session_timeout_secs: Option<u64>,
}

fn default_work_start() -> String {
    "08:00".to_string()
}

fn default_work_end() -> String {
    "20:00".to_string()
}

fn default_ceiling_secs() -> f64 {
    PlausibilityFilter::DEFAULT_CEILING_SECS
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            work_start: default_work_start(),
            work_end: default_work_end(),
            ceiling_secs: default_ceiling_secs(),
            responder: None,
            strategy: StrategyKind::default(),
            session_timeout_secs: None,
        }
    }
}

impl AnalysisConfig {
    /// Parse the configured work window bounds.
    pub fn work_window(&self) -> Result<WorkWindow> {
        WorkWindow::parse(&self.work_start, &self.work_end)
            .with_context(|| format!("invalid work window {}-{}", self.work_start, self.work_end))
    }

    /// Build the pairing strategy from the strategy name and session timeout.
    pub fn pairing_strategy(&self) -> PairingStrategy {
        match self.strategy {
            StrategyKind::Adjacent => PairingStrategy::Adjacent,
            StrategyKind::Session => PairingStrategy::Session {
                timeout: self
                    .session_timeout_secs
                    .map(|s| chrono::Duration::seconds(s as i64)),
            },
        }
    }

    /// Plausibility ceiling; non-finite or negative values fall back to the default.
    pub fn plausibility(&self) -> PlausibilityFilter {
        if self.ceiling_secs.is_finite() && self.ceiling_secs >= 0.0 {
            PlausibilityFilter::new(self.ceiling_secs)
        } else {
            log::warn!(
                "ignoring invalid ceilingSecs {}, using {}",
                self.ceiling_secs,
                PlausibilityFilter::DEFAULT_CEILING_SECS
            );
            PlausibilityFilter::default()
        }
    }
}

/// Resolve the responder id: env REPLYSTAT_RESPONDER overrides config.
pub fn resolve_responder(config: &Config) -> Option<String> {
    std::env::var("REPLYSTAT_RESPONDER")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .analysis
                .responder
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("REPLYSTAT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".replystat").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or REPLYSTAT_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
