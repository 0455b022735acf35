//! Error types for spectre-ingest.
//!
//! Component-level functions (detector, parser, validator) return these errors
//! to their immediate caller and never log; orchestration-level components
//! (collector, runner) decide the partial-success policy and may log.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the ingestion engine.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read file: {path}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown tool: {0:?}")]
    UnknownTool(String),

    #[error("Malformed envelope report: {0}")]
    MalformedEnvelope(String),

    #[error("Unrecognized report format: no known tool signature matched")]
    UnrecognizedFormat,

    #[error("No JSON report files found in input set")]
    EmptyInput,

    #[error("All {failed} input file(s) failed to parse")]
    AllFilesFailed { failed: usize },

    #[error("Collection deadline exceeded before file was processed: {0}")]
    DeadlineExceeded(PathBuf),

    #[error("Failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_not_found() {
        let err = IngestError::FileNotFound(PathBuf::from("/tmp/missing.json"));
        assert_eq!(err.to_string(), "File not found: /tmp/missing.json");
    }

    #[test]
    fn test_error_display_unknown_tool() {
        let err = IngestError::UnknownTool("unknownspectre".to_string());
        assert_eq!(err.to_string(), "Unknown tool: \"unknownspectre\"");
    }

    #[test]
    fn test_error_display_all_files_failed() {
        let err = IngestError::AllFilesFailed { failed: 3 };
        assert_eq!(err.to_string(), "All 3 input file(s) failed to parse");
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err: IngestError = json_err.into();
        assert!(err.to_string().starts_with("Invalid JSON"));
    }
}
