//! Metric discovery.
//!
//! Lists every metric known to the TSDB, drops names already recorded in the
//! progress file, and shuffles the rest so that repeated partial runs do not
//! keep starting on the same alphabetical prefix.

use std::collections::HashSet;

use log::{info, warn};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::command::TsdbCommand;
use crate::metric::Metric;
use crate::progress::ProgressStore;
use crate::runner::CommandRunner;

/// Extract the metric name from one `uid grep` output line.
///
/// Lines look like `metrics sys.cpu.user: [0, 0, 1]`; the name is the second
/// whitespace-separated token with its trailing colon removed. Anything else
/// yields `None`.
pub fn parse_metric_line(line: &str) -> Option<&str> {
    line.split_whitespace().nth(1)?.strip_suffix(':')
}

/// Discovers the metrics a sweep should work on.
pub struct MetricCatalog<'a> {
    runner: &'a dyn CommandRunner,
    command: &'a TsdbCommand,
    store: &'a ProgressStore,
}

impl<'a> MetricCatalog<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        command: &'a TsdbCommand,
        store: &'a ProgressStore,
    ) -> Self {
        Self {
            runner,
            command,
            store,
        }
    }

    /// Metrics still to be repaired, in random order.
    pub fn discover(&self) -> Vec<Metric> {
        self.discover_with_rng(&mut rand::rng())
    }

    /// [`discover`](Self::discover) with a caller-provided RNG.
    pub fn discover_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Metric> {
        let done = self.store.load();

        let listing = match self.runner.run(&self.command.list_metrics(), None) {
            Ok(out) if out.success => out.stdout,
            Ok(out) => {
                warn!(
                    "metric listing exited with {:?}; nothing to sweep",
                    out.code
                );
                return Vec::new();
            }
            Err(e) => {
                warn!("metric listing failed: {e}; nothing to sweep");
                return Vec::new();
            }
        };

        let mut metrics = select_pending(&listing, &done);
        metrics.shuffle(rng);
        info!(
            "{} metrics to sweep ({} already repaired)",
            metrics.len(),
            done.len()
        );
        metrics
    }
}

/// Parse a listing and keep valid, unique names absent from `done`.
fn select_pending(listing: &str, done: &HashSet<String>) -> Vec<Metric> {
    let mut seen = HashSet::new();
    listing
        .lines()
        .filter_map(parse_metric_line)
        .filter(|name| !done.contains(*name))
        .filter_map(Metric::parse)
        .filter(|m| seen.insert(m.clone()))
        .collect()
}
