//! Sweep driver.
//!
//! Discovers pending metrics, then for each one in turn checks that it still
//! exists and runs every time window through the [`RepairExecutor`]. Metrics
//! and windows are processed strictly one at a time; there is at most one
//! external process in flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use log::{error, info, warn};
use uuid::Uuid;

use crate::catalog::MetricCatalog;
use crate::command::TsdbCommand;
use crate::config::SweepConfig;
use crate::executor::{ChunkOutcome, RepairExecutor};
use crate::metric::Metric;
use crate::prober::ExistenceProber;
use crate::progress::ProgressStore;
use crate::report::{FailedMetric, MetricTiming, SweepReport, format_iso8601};
use crate::runner::CommandRunner;
use crate::window::windows;

/// Drives one sweep over every pending metric.
pub struct Sweeper<'a> {
    config: &'a SweepConfig,
    runner: &'a dyn CommandRunner,
    running: Option<Arc<AtomicBool>>,
}

impl<'a> Sweeper<'a> {
    /// `config` is expected to have passed [`SweepConfig::validate`].
    pub fn new(config: &'a SweepConfig, runner: &'a dyn CommandRunner) -> Self {
        Self {
            config,
            runner,
            running: None,
        }
    }

    /// Stop before the next chunk once `running` is cleared.
    pub fn with_stop_flag(mut self, running: Arc<AtomicBool>) -> Self {
        self.running = Some(running);
        self
    }

    fn stop_requested(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.load(Ordering::SeqCst))
    }

    /// Run the sweep to completion (or until stopped).
    pub fn run(&self) -> SweepReport {
        let started_at = SystemTime::now();
        let started = Instant::now();
        let config = self.config;

        let command = TsdbCommand::from_config(config);
        let store = ProgressStore::new(&config.store_path);
        let metrics = MetricCatalog::new(self.runner, &command, &store).discover();
        let prober = ExistenceProber::new(self.runner, &command);
        let executor = RepairExecutor::new(
            self.runner,
            &command,
            &store,
            config.retries,
            config.attempt_timeout(),
        );

        let total = metrics.len();
        let mut failed: Vec<FailedMetric> = Vec::new();
        let mut skipped: Vec<Metric> = Vec::new();
        let mut timings: Vec<MetricTiming> = Vec::new();
        let mut repaired = 0usize;
        let mut interrupted = false;

        info!(
            "sweeping {total} metrics over {}h in {}m chunks ({} chunks each, {} attempts per chunk)",
            config.time_range_hours,
            config.chunk_minutes,
            config.window_count(),
            executor.max_attempts()
        );

        for (i, metric) in metrics.iter().enumerate() {
            let position = i + 1;
            if self.stop_requested() {
                interrupted = true;
                break;
            }
            if !prober.exists(metric) {
                warn!("[{position}/{total}] {metric} no longer exists, skipping");
                skipped.push(metric.clone());
                continue;
            }

            let metric_start = Instant::now();
            let mut failed_chunks = Vec::new();
            let mut chunks_run = 0u32;
            for window in windows(config.time_range_hours, config.chunk_minutes) {
                if self.stop_requested() {
                    interrupted = true;
                    break;
                }
                chunks_run += 1;
                if let ChunkOutcome::Failed { .. } = executor.repair_chunk(metric, &window) {
                    failed_chunks.push(window.index);
                }
            }

            let seconds = metric_start.elapsed().as_secs_f64();
            timings.push(MetricTiming {
                metric: metric.clone(),
                seconds,
                chunks_run,
            });

            if !failed_chunks.is_empty() {
                failed.push(FailedMetric {
                    metric: metric.clone(),
                    chunks: failed_chunks,
                });
            } else if !interrupted {
                repaired += 1;
            }

            info!(
                "[{position}/{total}] {metric} done in {seconds:.1}s; failed so far: [{}]",
                join_names(&failed)
            );

            if interrupted {
                break;
            }
        }

        if interrupted {
            warn!("sweep stopped early; progress so far is kept in {}", store.path().display());
        }
        if failed.is_empty() {
            info!("sweep finished: {repaired} repaired, {} skipped, none failed", skipped.len());
        } else {
            error!(
                "sweep finished: {repaired} repaired, {} skipped, {} failed: [{}]",
                skipped.len(),
                failed.len(),
                join_names(&failed)
            );
        }

        let ended_at = SystemTime::now();
        SweepReport {
            version: 1,
            id: Uuid::new_v4().to_string(),
            started_at: format_iso8601(started_at.duration_since(UNIX_EPOCH).unwrap_or_default()),
            ended_at: format_iso8601(ended_at.duration_since(UNIX_EPOCH).unwrap_or_default()),
            duration_ms: whole_millis(started.elapsed()),
            time_range_hours: config.time_range_hours,
            chunk_minutes: config.chunk_minutes,
            window_count: config.window_count(),
            retries: config.retries,
            metrics_total: total,
            metrics_repaired: repaired,
            skipped,
            failed,
            timings,
            interrupted,
            tsdb_sweep_version: crate::VERSION.to_string(),
        }
    }
}

/// Milliseconds in `d`, saturating at `u64::MAX`.
fn whole_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn join_names(failed: &[FailedMetric]) -> String {
    failed
        .iter()
        .map(|f| f.metric.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
