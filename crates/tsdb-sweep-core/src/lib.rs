//! # tsdb-sweep-core
//!
//! **Chunked, resumable `fsck` sweeps over every metric in a TSDB.**
//!
//! Repairing a large time-series table in one `fsck` pass tends to run for
//! hours and die halfway. `tsdb-sweep-core` instead drives the external
//! `tsdb` tool one metric and one short time window at a time, retries
//! windows that hang, and records each repaired metric in a plain-text
//! progress file so an interrupted sweep picks up where it left off.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tsdb_sweep_core::{SweepConfig, Sweeper, SystemRunner};
//!
//! let config = SweepConfig {
//!     time_range_hours: 6,
//!     ..SweepConfig::default()
//! };
//! config.validate().expect("valid configuration");
//!
//! let report = Sweeper::new(&config, &SystemRunner).run();
//! println!("{} metrics failed", report.failed.len());
//! ```
//!
//! ## Architecture
//!
//! Catalog → (per metric) Existence probe → Windows → Executor → Progress store
//!
//! - [`MetricCatalog`] lists metrics via `tsdb uid grep`, drops those already
//!   in the [`ProgressStore`], and shuffles the rest.
//! - [`ExistenceProber`] skips metrics deleted since discovery.
//! - [`windows`] splits the sweep range into [`TimeWindow`]s.
//! - [`RepairExecutor`] runs `tsdb fsck --fix-all --compact` per window under
//!   a timeout, with bounded retries.
//! - [`Sweeper`] ties it together and returns a [`SweepReport`].
//!
//! Every external command goes through the [`CommandRunner`] trait.

pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod metric;
pub mod prober;
pub mod progress;
pub mod report;
pub mod runner;
pub mod session;
pub mod window;

pub use catalog::{MetricCatalog, parse_metric_line};
pub use command::TsdbCommand;
pub use config::SweepConfig;
pub use error::{ConfigError, ReportError, RunError};
pub use executor::{ChunkOutcome, RepairExecutor, parse_fix_summary};
pub use metric::Metric;
pub use prober::ExistenceProber;
pub use progress::ProgressStore;
pub use report::{FailedMetric, MetricTiming, SweepReport};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use session::Sweeper;
pub use window::{TimeWindow, WindowLabel, window_count, windows};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
