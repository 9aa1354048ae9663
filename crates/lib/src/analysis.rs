//! Response-time pipeline: records -> messages -> pairs -> statistics.
//!
//! Each call is independent and side-effect free apart from logging; fetching
//! happens once up front and the result is treated as an immutable snapshot.

use anyhow::Result;
use serde::Serialize;

use crate::config::{self, Config};
use crate::filter::MessageFilter;
use crate::normalize::{self, Message, Normalized};
use crate::overview::Overview;
use crate::pairing::{self, PairingStrategy};
use crate::sources::{self, RecordSource, SourceFailure};
use crate::stats::{self, PlausibilityFilter, ResponseReport};
use crate::workhours::WorkWindow;

/// Tunables of one analysis run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisOptions {
    pub window: WorkWindow,
    pub plausibility: PlausibilityFilter,
    pub responder: Option<String>,
    pub strategy: PairingStrategy,
}

impl AnalysisOptions {
    /// Options from config (responder honours REPLYSTAT_RESPONDER).
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            window: config.analysis.work_window()?,
            plausibility: config.analysis.plausibility(),
            responder: config::resolve_responder(config),
            strategy: config.analysis.pairing_strategy(),
        })
    }
}

/// Everything an analysis run produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub overview: Overview,
    /// Pairs formed before the plausibility filter.
    pub pairs_total: usize,
    /// Pairs rejected by the plausibility filter.
    pub pairs_discarded: usize,
    pub ceiling_secs: f64,
    pub response_time: ResponseReport,
}

/// Run pairing and aggregation over chronologically ordered messages.
pub fn analyze(messages: &[Message], options: &AnalysisOptions) -> AnalysisReport {
    let pairs = pairing::pair_responses(messages, options.responder.as_deref(), options.strategy);
    let response_time = stats::compute_statistics(&pairs, &options.window, &options.plausibility);
    let pairs_discarded = pairs.len() - response_time.raw.sample_count;
    log::info!(
        "analyzed {} message(s): {} pair(s), {} plausible",
        messages.len(),
        pairs.len(),
        response_time.raw.sample_count
    );
    AnalysisReport {
        overview: Overview::of(messages),
        pairs_total: pairs.len(),
        pairs_discarded,
        ceiling_secs: options.plausibility.ceiling_secs(),
        response_time,
    }
}

/// Filter then analyze. The participant filter keeps the responder's replies.
pub fn analyze_filtered(
    messages: &[Message],
    filter: &MessageFilter,
    options: &AnalysisOptions,
) -> AnalysisReport {
    if filter.is_empty() {
        return analyze(messages, options);
    }
    let kept = filter.apply(messages, options.responder.as_deref());
    log::debug!("filter kept {} of {} message(s)", kept.len(), messages.len());
    analyze(&kept, options)
}

/// Normalized messages plus the sources that could not be read.
#[derive(Debug, Default)]
pub struct Loaded {
    pub normalized: Normalized,
    pub source_failures: Vec<SourceFailure>,
}

/// Fetch every source and normalize the merged snapshot.
pub async fn load(sources: &[Box<dyn RecordSource>]) -> Loaded {
    let fetched = sources::fetch_all(sources).await;
    Loaded {
        normalized: normalize::normalize(&fetched.batches),
        source_failures: fetched.failures,
    }
}
