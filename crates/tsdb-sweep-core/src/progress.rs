//! Durable record of metrics already repaired.
//!
//! # Storage Format
//!
//! A UTF-8 text file with one metric name per line, no header. The file is
//! only ever appended to; duplicate lines are harmless because readers treat
//! the contents as a set.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::metric::Metric;

/// Append-only progress file.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every recorded metric name.
    ///
    /// A missing or unreadable file yields an empty set; losing the snapshot
    /// only means redundant work, never an incorrect repair.
    pub fn load(&self) -> HashSet<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no progress file at {}", self.path.display());
                HashSet::new()
            }
            Err(e) => {
                warn!(
                    "could not read progress file {}: {e}; starting from scratch",
                    self.path.display()
                );
                HashSet::new()
            }
        }
    }

    /// Record `metric` as repaired. Write failures are logged and swallowed.
    pub fn append(&self, metric: &Metric) {
        if let Err(e) = self.try_append(metric) {
            warn!(
                "could not record {metric} in {}: {e}",
                self.path.display()
            );
        }
    }

    fn try_append(&self, metric: &Metric) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{metric}")?;
        file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(name: &str) -> Metric {
        Metric::parse(name).unwrap()
    }

    #[test]
    fn load_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(tmp.path().join("absent.txt"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn load_unreadable_path_is_empty() {
        // A directory cannot be read as a file.
        let tmp = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(tmp.path());
        assert!(store.load().is_empty());
    }

    #[test]
    fn append_then_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(tmp.path().join("done.txt"));
        store.append(&metric("sys.cpu"));
        store.append(&metric("sys.mem"));

        let loaded = store.load();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains("sys.cpu"));
        assert!(loaded.contains("sys.mem"));

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "sys.cpu\nsys.mem\n");
    }

    #[test]
    fn duplicates_collapse_on_load() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(tmp.path().join("done.txt"));
        for _ in 0..3 {
            store.append(&metric("sys.cpu"));
        }
        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw.lines().count(), 3);
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn load_ignores_blank_lines_and_whitespace() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("done.txt");
        fs::write(&path, "sys.cpu\n\n  sys.disk  \r\n").unwrap();
        let loaded = ProgressStore::new(&path).load();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains("sys.disk"));
    }

    #[test]
    fn append_failure_is_swallowed() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(tmp.path().join("missing-dir").join("done.txt"));
        store.append(&metric("sys.cpu"));
        assert!(store.load().is_empty());
    }
}
