//! Existence check run before each metric is repaired.

use log::debug;

use crate::command::TsdbCommand;
use crate::metric::Metric;
use crate::runner::CommandRunner;

/// Confirms a metric still has a UID assigned.
pub struct ExistenceProber<'a> {
    runner: &'a dyn CommandRunner,
    command: &'a TsdbCommand,
}

impl<'a> ExistenceProber<'a> {
    pub fn new(runner: &'a dyn CommandRunner, command: &'a TsdbCommand) -> Self {
        Self { runner, command }
    }

    /// `false` when the lookup exits non-zero or cannot be run at all.
    pub fn exists(&self, metric: &Metric) -> bool {
        match self.runner.run(&self.command.lookup_metric(metric), None) {
            Ok(out) => {
                if !out.success {
                    debug!("lookup of {metric} exited with {:?}", out.code);
                }
                out.success
            }
            Err(e) => {
                debug!("lookup of {metric} failed: {e}");
                false
            }
        }
    }
}
