//! Repairing one metric over one time window.
//!
//! An attempt is `tsdb fsck ... --fix-all --compact` under a wall-clock
//! limit. Any attempt that runs to completion counts as a repaired chunk;
//! the numbers in its output are only reported, never used to decide
//! success. Attempts that time out, or that could not be run at all, are
//! retried immediately until the budget of `retries + 1` is spent.

use std::time::Duration;

use log::{debug, error, info, warn};

use crate::command::TsdbCommand;
use crate::metric::Metric;
use crate::progress::ProgressStore;
use crate::runner::CommandRunner;
use crate::window::TimeWindow;

/// Number of trailing stdout lines inspected for the fix summary.
pub const SUMMARY_TAIL_LINES: usize = 26;

/// Leading tokens of each log line (timestamp, thread, level, logger).
const LOG_PREFIX_TOKENS: usize = 6;

/// Result of repairing one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkOutcome {
    /// An attempt completed. `summary` holds the non-zero counters it printed.
    Repaired { attempts: u32, summary: Vec<String> },
    /// Every attempt timed out or failed to run.
    Failed { metric: Metric, attempts: u32 },
}

impl ChunkOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Repaired { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Repaired { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }
}

/// Extract the non-zero counters from the tail of `fsck` output.
///
/// Looks at the last [`SUMMARY_TAIL_LINES`] lines, strips the six-token log
/// prefix from each, and keeps the remainder when it ends in a non-zero
/// integer.
pub fn parse_fix_summary(stdout: &str) -> Vec<String> {
    let lines: Vec<&str> = stdout.lines().collect();
    let tail = &lines[lines.len().saturating_sub(SUMMARY_TAIL_LINES)..];
    tail.iter().filter_map(|line| nonzero_counter(line)).collect()
}

fn nonzero_counter(line: &str) -> Option<String> {
    let rest: Vec<&str> = line.split_whitespace().skip(LOG_PREFIX_TOKENS).collect();
    let count: i64 = rest.last()?.parse().ok()?;
    (count != 0).then(|| rest.join(" "))
}

/// Runs `fsck` for (metric, window) pairs with bounded retries.
pub struct RepairExecutor<'a> {
    runner: &'a dyn CommandRunner,
    command: &'a TsdbCommand,
    store: &'a ProgressStore,
    retries: u32,
    timeout: Duration,
}

impl<'a> RepairExecutor<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        command: &'a TsdbCommand,
        store: &'a ProgressStore,
        retries: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            command,
            store,
            retries,
            timeout,
        }
    }

    /// Attempts allowed per chunk.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Repair `metric` over `window`, recording progress on success.
    pub fn repair_chunk(&self, metric: &Metric, window: &TimeWindow) -> ChunkOutcome {
        let argv = self.command.fsck(metric, window);
        let max_attempts = self.max_attempts();

        for attempt in 1..=max_attempts {
            match self.runner.run(&argv, Some(self.timeout)) {
                Ok(out) => {
                    if !out.success {
                        warn!(
                            "{metric} {window}: fsck exited with {:?}, treating as completed",
                            out.code
                        );
                    }
                    let summary = parse_fix_summary(&out.stdout);
                    if summary.is_empty() {
                        debug!("{metric} {window}: nothing to fix");
                    } else {
                        info!("{metric} {window}: {}", summary.join("; "));
                    }
                    self.store.append(metric);
                    return ChunkOutcome::Repaired {
                        attempts: attempt,
                        summary,
                    };
                }
                Err(e) if e.is_timeout() => {
                    debug!("{metric} {window}: attempt {attempt}/{max_attempts} timed out");
                }
                Err(e) => {
                    error!("{metric} {window}: attempt {attempt}/{max_attempts} failed: {e}");
                }
            }
        }

        error!("{metric} {window}: giving up after {max_attempts} attempts");
        ChunkOutcome::Failed {
            metric: metric.clone(),
            attempts: max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::config::SweepConfig;
    use crate::runner::CommandOutput;
    use crate::runner::fake::{ScriptedRunner, spawn_failure, timed_out};

    const PREFIX: &str = "2024-05-01 12:00:00,123 [main] INFO net.opentsdb.tools.Fsck -";

    fn fsck_log(lines: &[&str]) -> String {
        lines.iter().map(|l| format!("{PREFIX} {l}\n")).collect()
    }

    struct Fixture {
        _tmp: tempfile::TempDir,
        store: ProgressStore,
        command: TsdbCommand,
        metric: Metric,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let store = ProgressStore::new(tmp.path().join("done.txt"));
            Self {
                _tmp: tmp,
                store,
                command: TsdbCommand::from_config(&SweepConfig::default()),
                metric: Metric::parse("sys.cpu").unwrap(),
            }
        }

        fn executor<'a>(&'a self, runner: &'a ScriptedRunner, retries: u32) -> RepairExecutor<'a> {
            RepairExecutor::new(runner, &self.command, &self.store, retries, Duration::from_secs(1))
        }

        fn appended(&self) -> usize {
            std::fs::read_to_string(self.store.path())
                .map(|s| s.lines().count())
                .unwrap_or(0)
        }
    }

    #[test]
    fn summary_keeps_only_nonzero_counters() {
        let out = fsck_log(&[
            "Key Values Processed: 1200",
            "Duplicate Data Points: 0",
            "Total Errors Fixed: 3",
            "Completed fsck in [4] seconds",
        ]);
        assert_eq!(
            parse_fix_summary(&out),
            vec!["Key Values Processed: 1200", "Total Errors Fixed: 3"]
        );
    }

    #[test]
    fn summary_only_reads_the_last_26_lines() {
        let mut lines = vec!["Early Counter: 99"];
        lines.extend(std::iter::repeat_n("Filler: 0", SUMMARY_TAIL_LINES));
        assert!(parse_fix_summary(&fsck_log(&lines)).is_empty());

        lines.push("Late Counter: 5");
        assert_eq!(parse_fix_summary(&fsck_log(&lines)), vec!["Late Counter: 5"]);
    }

    #[test]
    fn summary_ignores_short_and_non_numeric_lines() {
        let out = "short line 7\n\
                   a b c d e f\n\
                   a b c d e f Errors: many\n\
                   a b c d e f Errors: -2\n";
        assert_eq!(parse_fix_summary(out), vec!["Errors: -2"]);
        assert!(parse_fix_summary("").is_empty());
    }

    #[test]
    fn first_attempt_success_records_progress_once() {
        let fx = Fixture::new();
        let runner = ScriptedRunner::new(|_| {
            Ok(CommandOutput::success(fsck_log(&["Total Errors Fixed: 2"])))
        });

        let outcome = fx.executor(&runner, 1).repair_chunk(&fx.metric, &TimeWindow::new(1, 15));

        assert_eq!(
            outcome,
            ChunkOutcome::Repaired {
                attempts: 1,
                summary: vec!["Total Errors Fixed: 2".to_string()],
            }
        );
        assert_eq!(runner.calls().len(), 1);
        assert_eq!(runner.calls()[0], fx.command.fsck(&fx.metric, &TimeWindow::new(1, 15)));
        assert_eq!(fx.appended(), 1);
    }

    #[test]
    fn always_timing_out_exhausts_the_budget() {
        for retries in [0, 1, 4] {
            let fx = Fixture::new();
            let runner = ScriptedRunner::new(|_| Err(timed_out()));

            let outcome = fx.executor(&runner, retries).repair_chunk(&fx.metric, &TimeWindow::new(2, 15));

            assert_eq!(runner.calls().len(), retries as usize + 1);
            assert_eq!(
                outcome,
                ChunkOutcome::Failed {
                    metric: fx.metric.clone(),
                    attempts: retries + 1,
                }
            );
            assert_eq!(fx.appended(), 0);
        }
    }

    #[test]
    fn success_on_second_of_three_attempts_stops_there() {
        let fx = Fixture::new();
        let n = Rc::new(Cell::new(0));
        let counter = Rc::clone(&n);
        let runner = ScriptedRunner::new(move |_| {
            counter.set(counter.get() + 1);
            if counter.get() == 1 {
                Err(timed_out())
            } else {
                Ok(CommandOutput::success(""))
            }
        });

        let outcome = fx.executor(&runner, 2).repair_chunk(&fx.metric, &TimeWindow::new(5, 15));

        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 2);
        assert_eq!(n.get(), 2);
        assert_eq!(fx.appended(), 1);
        assert!(fx.store.load().contains("sys.cpu"));
    }

    #[test]
    fn launch_errors_consume_an_attempt() {
        let fx = Fixture::new();
        let runner = ScriptedRunner::new(|_| Err(spawn_failure()));

        let outcome = fx.executor(&runner, 2).repair_chunk(&fx.metric, &TimeWindow::new(1, 15));

        assert_eq!(runner.calls().len(), 3);
        assert!(!outcome.is_success());
        assert_eq!(fx.appended(), 0);
    }

    #[test]
    fn non_zero_exit_still_counts_as_completed() {
        let fx = Fixture::new();
        let runner = ScriptedRunner::new(|_| Ok(CommandOutput::failure(1)));

        let outcome = fx.executor(&runner, 3).repair_chunk(&fx.metric, &TimeWindow::new(1, 15));

        assert_eq!(outcome.attempts(), 1);
        assert!(outcome.is_success());
        assert_eq!(fx.appended(), 1);
    }

    #[test]
    fn every_successful_chunk_appends() {
        let fx = Fixture::new();
        let runner = ScriptedRunner::new(|_| Ok(CommandOutput::success("")));
        let executor = fx.executor(&runner, 1);

        for index in 1..=4 {
            assert!(executor.repair_chunk(&fx.metric, &TimeWindow::new(index, 15)).is_success());
        }
        assert_eq!(fx.appended(), 4);
        assert_eq!(fx.store.load().len(), 1);
    }
}
