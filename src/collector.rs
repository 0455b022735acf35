//! Concurrent collection of report files from disk.
//!
//! The collector expands caller-supplied paths (directories are walked
//! recursively to their `.json` files), de-duplicates the resolved set, then
//! runs read -> detect -> parse for each file on a bounded rayon pool. The
//! whole batch runs under a single deadline. Partial failure is the policy:
//! some files succeeding is a success, with failures logged and dropped;
//! callers needing per-file failure detail use [`crate::detector::detect`] and
//! [`crate::parser::parse`] directly.

use crate::detector::detect;
use crate::error::{IngestError, Result};
use crate::parser::{extract_timestamp, extract_version, parse};
use crate::schema::ToolReport;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Default bounded worker count.
pub const DEFAULT_WORKERS: usize = 10;
/// Default whole-batch deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Batch collector for report files.
#[derive(Debug, Clone)]
pub struct Collector {
    workers: usize,
    timeout: Duration,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the worker pool size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the whole-batch deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Collect reports from the given files and/or directories.
    ///
    /// Fails when any path does not exist, when the expanded set is empty, or
    /// when every file in the set fails to ingest.
    pub fn collect_from_paths(&self, paths: &[PathBuf]) -> Result<Vec<ToolReport>> {
        let files = expand_paths(paths)?;
        if files.is_empty() {
            return Err(IngestError::EmptyInput);
        }
        self.process(files)
    }

    /// Collect every `.json` report under a directory.
    pub fn collect_from_directory(&self, dir: &Path) -> Result<Vec<ToolReport>> {
        self.collect_from_paths(&[dir.to_path_buf()])
    }

    fn process(&self, files: Vec<PathBuf>) -> Result<Vec<ToolReport>> {
        let total = files.len();
        let deadline = Instant::now() + self.timeout;
        debug!(files = total, workers = self.workers, "Collecting reports");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        let results: Vec<Result<ToolReport>> = pool.install(|| {
            files
                .par_iter()
                .map(|path| {
                    // Work already in flight when the deadline passes still
                    // lands; items not yet started are failed instead.
                    if Instant::now() >= deadline {
                        return Err(IngestError::DeadlineExceeded(path.clone()));
                    }
                    ingest_file(path)
                })
                .collect()
        });

        let mut reports = Vec::with_capacity(total);
        let mut failed = 0usize;
        for (path, result) in files.iter().zip(results) {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    failed += 1;
                    warn!(path = %path.display(), error = %e, "Dropping report file");
                }
            }
        }

        if reports.is_empty() {
            return Err(IngestError::AllFilesFailed { failed });
        }
        debug!(succeeded = reports.len(), failed, "Collection finished");
        Ok(reports)
    }
}

/// Read, detect, and parse one report file into a [`ToolReport`].
pub fn ingest_file(path: &Path) -> Result<ToolReport> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => IngestError::FileNotFound(path.to_path_buf()),
        _ => IngestError::ReadError {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let tool = detect(&bytes)?;
    let raw_data = parse(&bytes, tool)?;
    let version = extract_version(&bytes);
    let timestamp = extract_timestamp(&bytes);
    Ok(ToolReport::new(tool, version, timestamp, raw_data))
}

/// Expand paths to a de-duplicated file list. Non-existent paths are a hard
/// error. A file reachable both directly and via an ancestor directory is
/// ingested exactly once.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(IngestError::FileNotFound(path.clone()));
        }
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                    push_unique(entry.path(), &mut seen, &mut files);
                }
            }
        } else {
            push_unique(path, &mut seen, &mut files);
        }
    }

    Ok(files)
}

fn push_unique(path: &Path, seen: &mut HashSet<PathBuf>, files: &mut Vec<PathBuf>) {
    let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if seen.insert(resolved.clone()) {
        files.push(resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    const VAULT_JSON: &str = r#"{
        "tool": "vaultspectre",
        "version": "1.4.0",
        "timestamp": "2025-06-01T12:00:00Z",
        "secrets": {"secret/app": {"status": "ok"}},
        "summary": {"total_secrets": 1, "status_ok": 1, "status_missing": 0}
    }"#;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_collect_single_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "vault.json", VAULT_JSON);

        let reports = Collector::new().collect_from_paths(&[path]).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].tool, "vault");
        assert_eq!(reports[0].version, "1.4.0");
        assert!(reports[0].is_supported);
    }

    #[test]
    fn test_collect_deduplicates_same_path() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "vault.json", VAULT_JSON);

        let reports = Collector::new()
            .collect_from_paths(&[path.clone(), path])
            .unwrap();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_collect_deduplicates_file_and_ancestor_dir() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "vault.json", VAULT_JSON);

        let reports = Collector::new()
            .collect_from_paths(&[path, dir.path().to_path_buf()])
            .unwrap();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_collect_directory_only_json_files() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "vault.json", VAULT_JSON);
        write_file(dir.path(), "notes.txt", "not a report");

        let reports = Collector::new().collect_from_directory(dir.path()).unwrap();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_collect_missing_path_is_hard_error() {
        let err = Collector::new()
            .collect_from_paths(&[PathBuf::from("/nonexistent/report.json")])
            .unwrap_err();
        assert!(matches!(err, IngestError::FileNotFound(_)));
    }

    #[test]
    fn test_collect_empty_directory_is_error() {
        let dir = TempDir::new().unwrap();
        let err = Collector::new().collect_from_directory(dir.path()).unwrap_err();
        assert!(matches!(err, IngestError::EmptyInput));
    }

    #[test]
    fn test_collect_no_paths_is_error() {
        let err = Collector::new().collect_from_paths(&[]).unwrap_err();
        assert!(matches!(err, IngestError::EmptyInput));
    }

    #[test]
    fn test_partial_success_drops_failures() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "good.json", VAULT_JSON);
        write_file(dir.path(), "bad.json", "{not json");

        let reports = Collector::new().collect_from_directory(dir.path()).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].tool, "vault");
    }

    #[test]
    fn test_all_failures_is_error() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "bad1.json", "{not json");
        write_file(dir.path(), "bad2.json", "also not json");

        let err = Collector::new().collect_from_directory(dir.path()).unwrap_err();
        assert!(matches!(err, IngestError::AllFilesFailed { failed: 2 }));
    }

    #[test]
    fn test_nested_directories_walked_recursively() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        write_file(&nested, "deep.json", VAULT_JSON);

        let reports = Collector::new().collect_from_directory(dir.path()).unwrap();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_ingest_file_unknown_tool_fails() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "odd.json", r#"{"tool": "unknownspectre"}"#);
        assert!(matches!(
            ingest_file(&path).unwrap_err(),
            IngestError::UnknownTool(_)
        ));
    }

    #[test]
    fn test_collect_with_custom_workers() {
        let dir = TempDir::new().unwrap();
        for i in 0..8 {
            write_file(dir.path(), &format!("v{i}.json"), VAULT_JSON);
        }
        let reports = Collector::new()
            .with_workers(2)
            .collect_from_directory(dir.path())
            .unwrap();
        assert_eq!(reports.len(), 8);
    }

    #[test]
    fn test_collect_expired_deadline_fails_batch() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "vault.json", VAULT_JSON);

        let err = Collector::new()
            .with_timeout(Duration::ZERO)
            .collect_from_directory(dir.path())
            .unwrap_err();
        assert!(matches!(err, IngestError::AllFilesFailed { failed: 1 }));
    }
}
