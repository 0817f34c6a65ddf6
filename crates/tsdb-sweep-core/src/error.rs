//! Error types for tsdb-sweep.
//!
//! | Type | Raised by | Effect on the sweep |
//! |------|-----------|---------------------|
//! | [`ConfigError`] | [`SweepConfig::validate`](crate::SweepConfig::validate) | startup aborts, nothing runs |
//! | [`RunError`] | [`CommandRunner`](crate::CommandRunner) | classified per caller, never fatal |
//! | [`ReportError`] | [`SweepReport::write_to`](crate::SweepReport::write_to) | sweep result kept, report lost |

use std::time::Duration;

use thiserror::Error;

/// Invalid sweep configuration, detected before any external command runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("time range must be at least 1 hour")]
    ZeroTimeRange,

    #[error("time chunk must be a positive number of minutes")]
    ZeroChunk,

    #[error("time chunk of {0} minutes does not evenly divide 60")]
    ChunkNotDivisor(u32),

    #[error("time range of {0} hours is too large to sweep")]
    RangeTooLarge(u32),

    #[error("{field} must not be empty")]
    Empty { field: &'static str },
}

/// Failure to obtain a completed result from an external command.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("command line is empty")]
    EmptyCommand,

    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while waiting for `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` timed out after {:.1}s", .after.as_secs_f64())]
    TimedOut { program: String, after: Duration },
}

impl RunError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

/// Failure to persist a [`SweepReport`](crate::SweepReport).
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}
