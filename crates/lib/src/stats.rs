//! Response-time statistics over plausible pairs.
//!
//! All durations are raw seconds (`f64`); formatting is left to the caller.
//! The median is the element at index `n / 2` of the ascending sort, so for an
//! even count it is the upper of the two middle values, never their average.

use serde::Serialize;

use crate::pairing::ResponsePair;
use crate::workhours::{elapsed_work_seconds, WorkWindow};

/// Keeps pairs whose wall-clock response time is in `(0, ceiling]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibilityFilter {
    ceiling_secs: f64,
}

impl PlausibilityFilter {
    pub const DEFAULT_CEILING_SECS: f64 = 180.0;

    pub fn new(ceiling_secs: f64) -> Self {
        Self { ceiling_secs }
    }

    pub fn ceiling_secs(&self) -> f64 {
        self.ceiling_secs
    }

    pub fn accepts(&self, raw_secs: f64) -> bool {
        raw_secs > 0.0 && raw_secs <= self.ceiling_secs
    }
}

impl Default for PlausibilityFilter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CEILING_SECS)
    }
}

/// Mean, median, min and max of a non-empty sample, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationSummary {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Statistics for one duration kind. `summary` is `None` ("no data") exactly when `sample_count == 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseStatistics {
    pub sample_count: usize,
    pub summary: Option<DurationSummary>,
}

impl ResponseStatistics {
    pub fn from_samples(samples: &[f64]) -> Self {
        Self {
            sample_count: samples.len(),
            summary: summarize(samples),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sample_count == 0
    }
}

/// Working-hours and wall-clock statistics over the same plausible pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseReport {
    pub working: ResponseStatistics,
    pub raw: ResponseStatistics,
}

/// Summarize samples; `None` for an empty slice.
pub fn summarize(samples: &[f64]) -> Option<DurationSummary> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let sum: f64 = sorted.iter().sum();
    Some(DurationSummary {
        mean: sum / n as f64,
        median: sorted[n / 2],
        min: sorted[0],
        max: sorted[n - 1],
    })
}

/// (working-hours seconds, raw seconds) of every pair the filter accepts, in pair order.
pub fn plausible_durations(
    pairs: &[ResponsePair],
    window: &WorkWindow,
    filter: &PlausibilityFilter,
) -> Vec<(f64, f64)> {
    pairs
        .iter()
        .filter_map(|p| {
            let raw = p.raw_seconds();
            if !filter.accepts(raw) {
                return None;
            }
            let working = elapsed_work_seconds(p.inbound.timestamp, p.outbound.timestamp, window);
            Some((working, raw))
        })
        .collect()
}

/// Compute working-hours and raw statistics for `pairs`.
pub fn compute_statistics(
    pairs: &[ResponsePair],
    window: &WorkWindow,
    filter: &PlausibilityFilter,
) -> ResponseReport {
    let durations = plausible_durations(pairs, window, filter);
    let (working, raw): (Vec<f64>, Vec<f64>) = durations.into_iter().unzip();
    ResponseReport {
        working: ResponseStatistics::from_samples(&working),
        raw: ResponseStatistics::from_samples(&raw),
    }
}
