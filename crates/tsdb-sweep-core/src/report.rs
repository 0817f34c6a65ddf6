//! Sweep summary, optionally written as JSON at the end of a run.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReportError;
use crate::metric::Metric;

/// A metric with at least one chunk that exhausted its retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedMetric {
    pub metric: Metric,
    /// Indices of the failed chunks, ascending.
    pub chunks: Vec<u32>,
}

/// Wall-clock time spent on one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTiming {
    pub metric: Metric,
    pub seconds: f64,
    pub chunks_run: u32,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    pub version: u32,
    pub id: String,
    pub started_at: String,
    pub ended_at: String,
    pub duration_ms: u64,
    pub time_range_hours: u32,
    pub chunk_minutes: u32,
    pub window_count: u32,
    pub retries: u32,
    /// Metrics returned by discovery.
    pub metrics_total: usize,
    /// Metrics whose every chunk completed.
    pub metrics_repaired: usize,
    /// Metrics that no longer existed when their turn came.
    pub skipped: Vec<Metric>,
    pub failed: Vec<FailedMetric>,
    pub timings: Vec<MetricTiming>,
    /// Set when the sweep was stopped before covering every metric.
    pub interrupted: bool,
    pub tsdb_sweep_version: String,
}

impl SweepReport {
    /// Metrics that ended the sweep with at least one failed chunk.
    pub fn failed_metrics(&self) -> Vec<Metric> {
        self.failed.iter().map(|f| f.metric.clone()).collect()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, ReportError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Format a duration-since-epoch as an ISO-8601 UTC timestamp.
/// Example: `2026-02-15T01:30:00Z`
pub(crate) fn format_iso8601(since_epoch: Duration) -> String {
    let (year, month, day, hour, min, sec) = civil_from_secs(since_epoch.as_secs());
    format!("{year:04}-{month:02}-{day:02}T{hour:02}:{min:02}:{sec:02}Z")
}

/// Split seconds since the Unix epoch into UTC calendar fields.
/// No leap-second handling.
fn civil_from_secs(secs: u64) -> (u64, u64, u64, u64, u64, u64) {
    let sec = secs % 60;
    let min = (secs / 60) % 60;
    let hour = (secs / 3600) % 24;

    let mut days = secs / 86400;
    let mut year = 1970u64;
    loop {
        let len = if is_leap(year) { 366 } else { 365 };
        if days < len {
            break;
        }
        days -= len;
        year += 1;
    }

    let feb = if is_leap(year) { 29 } else { 28 };
    let month_lengths = [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut month = 1u64;
    for len in month_lengths {
        if days < len {
            break;
        }
        days -= len;
        month += 1;
    }

    (year, month, days + 1, hour, min, sec)
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
