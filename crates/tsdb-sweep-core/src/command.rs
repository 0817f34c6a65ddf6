//! Argument vectors for the `tsdb` command-line tool.
//!
//! Every invocation has the shape
//! `[sudo -u <user>] <tsd-path> <tool> --config=<cfg-path> <args...>`.

use crate::config::SweepConfig;
use crate::metric::Metric;
use crate::window::TimeWindow;

/// Builds `tsdb` command lines from a [`SweepConfig`].
#[derive(Debug, Clone)]
pub struct TsdbCommand {
    prefix: Vec<String>,
    config_flag: String,
    aggregator: String,
}

impl TsdbCommand {
    pub fn from_config(config: &SweepConfig) -> Self {
        let mut prefix = Vec::new();
        if config.use_sudo {
            prefix.extend(["sudo".to_string(), "-u".to_string(), config.sudo_user.clone()]);
        }
        prefix.push(config.tsd_path.to_string_lossy().into_owned());

        Self {
            prefix,
            config_flag: format!("--config={}", config.cfg_path.to_string_lossy()),
            aggregator: config.aggregator.clone(),
        }
    }

    fn tool<I, S>(&self, tool: &str, args: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = self.prefix.clone();
        argv.push(tool.to_string());
        argv.push(self.config_flag.clone());
        argv.extend(args.into_iter().map(Into::into));
        argv
    }

    /// `uid grep metrics .`: list every metric name with its UID.
    pub fn list_metrics(&self) -> Vec<String> {
        self.tool("uid", ["grep", "metrics", "."])
    }

    /// `uid metrics <name>`: exits non-zero when the metric is unknown.
    pub fn lookup_metric(&self, metric: &Metric) -> Vec<String> {
        self.tool("uid", ["metrics", metric.as_str()])
    }

    /// `fsck <window> <agg> <metric> --fix-all --compact`.
    pub fn fsck(&self, metric: &Metric, window: &TimeWindow) -> Vec<String> {
        let mut args = window.label().args();
        args.push(self.aggregator.clone());
        args.push(metric.to_string());
        args.push("--fix-all".to_string());
        args.push("--compact".to_string());
        self.tool("fsck", args)
    }
}
