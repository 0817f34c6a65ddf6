//! Time window scheduling.
//!
//! A sweep of `r` hours with chunk width `w` minutes is split into
//! `r * 60 / w` windows, indexed from 1. Window 1 runs from `w` minutes ago
//! to now; window `c >= 2` runs from `(c+1)·w` to `c·w` minutes ago.
//! Windows are swept in increasing index order, i.e. from newest to oldest.

use std::fmt;

/// Number of windows for a range of `time_range_hours` at `chunk_minutes` each.
///
/// `chunk_minutes` must evenly divide 60 and the range must pass
/// [`checked_window_count`]; [`SweepConfig::validate`](crate::SweepConfig::validate)
/// enforces both before a sweep starts.
pub fn window_count(time_range_hours: u32, chunk_minutes: u32) -> u32 {
    time_range_hours * (60 / chunk_minutes)
}

/// Like [`window_count`], but `None` if the count or the oldest window
/// bound, `(count + 1) * chunk_minutes` minutes ago, does not fit in a `u32`.
pub fn checked_window_count(time_range_hours: u32, chunk_minutes: u32) -> Option<u32> {
    let count = time_range_hours.checked_mul(60 / chunk_minutes)?;
    count.checked_add(1)?.checked_mul(chunk_minutes)?;
    Some(count)
}

/// Iterate every window of a sweep in the order it is processed.
pub fn windows(time_range_hours: u32, chunk_minutes: u32) -> impl Iterator<Item = TimeWindow> {
    (1..=window_count(time_range_hours, chunk_minutes))
        .map(move |index| TimeWindow::new(index, chunk_minutes))
}

/// One repair window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// 1-based chunk index.
    pub index: u32,
    pub width_minutes: u32,
}

impl TimeWindow {
    pub fn new(index: u32, width_minutes: u32) -> Self {
        Self {
            index,
            width_minutes,
        }
    }

    /// Relative-time expression for the external tool.
    pub fn label(&self) -> WindowLabel {
        let w = self.width_minutes;
        if self.index <= 1 {
            WindowLabel::Since { minutes: w }
        } else {
            WindowLabel::Between {
                older: (self.index + 1) * w,
                newer: self.index * w,
            }
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk {} ({})", self.index, self.label())
    }
}

/// Start (and optional end) of a window, in minutes ago.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowLabel {
    /// From `minutes` ago until now.
    Since { minutes: u32 },
    /// From `older` minutes ago until `newer` minutes ago.
    Between { older: u32, newer: u32 },
}

impl WindowLabel {
    /// Time arguments in the form `fsck` accepts, older bound first.
    pub fn args(&self) -> Vec<String> {
        match *self {
            Self::Since { minutes } => vec![ago(minutes)],
            Self::Between { older, newer } => vec![ago(older), ago(newer)],
        }
    }
}

impl fmt::Display for WindowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Since { minutes } => write!(f, "{}", ago(minutes)),
            Self::Between { older, newer } => write!(f, "{} {}", ago(older), ago(newer)),
        }
    }
}

fn ago(minutes: u32) -> String {
    format!("{minutes}m-ago")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIVISORS_OF_60: [u32; 12] = [1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30, 60];

    #[test]
    fn window_count_matches_range_times_chunks_per_hour() {
        for w in DIVISORS_OF_60 {
            for r in [1, 2, 24, 48, 168] {
                assert_eq!(window_count(r, w), r * 60 / w, "r={r} w={w}");
            }
        }
    }

    #[test]
    fn checked_count_rejects_ranges_that_overflow() {
        assert_eq!(checked_window_count(48, 15), Some(192));
        assert_eq!(checked_window_count(100_000_000, 1), None);
        assert_eq!(checked_window_count(u32::MAX, 60), None);

        // hours * 60 fits, but the oldest bound hours * 60 + w does not
        let hours = u32::MAX / 60;
        assert_eq!(checked_window_count(hours, 1), Some(hours * 60));
        assert_eq!(checked_window_count(hours, 60), None);
        assert_eq!(checked_window_count(hours - 1, 60), Some(hours - 1));
    }

    #[test]
    fn first_chunk_is_single_anchor() {
        let label = TimeWindow::new(1, 15).label();
        assert_eq!(label, WindowLabel::Since { minutes: 15 });
        assert_eq!(label.args(), vec!["15m-ago"]);
    }

    #[test]
    fn later_chunks_are_two_sided_older_first() {
        let label = TimeWindow::new(3, 15).label();
        assert_eq!(label, WindowLabel::Between { older: 60, newer: 45 });
        assert_eq!(label.args(), vec!["60m-ago", "45m-ago"]);
        assert_eq!(label.to_string(), "60m-ago 45m-ago");

        assert_eq!(TimeWindow::new(2, 30).label().args(), vec!["90m-ago", "60m-ago"]);
    }

    #[test]
    fn windows_are_strictly_increasing_and_complete() {
        let indices: Vec<u32> = windows(1, 15).map(|w| w.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);

        let all: Vec<TimeWindow> = windows(48, 15).collect();
        assert_eq!(all.len(), 192);
        assert!(all.windows(2).all(|p| p[1].index == p[0].index + 1));
        assert!(all.iter().all(|w| w.width_minutes == 15));
    }

    #[test]
    fn last_window_reaches_the_oldest_bound() {
        let last = windows(1, 15).last().unwrap();
        assert_eq!(last.label().args(), vec!["75m-ago", "60m-ago"]);
    }
}
