//! The unified `spectre/v1` envelope report format.
//!
//! All scanners in the family are migrating toward this tool-agnostic shape;
//! the legacy per-tool shapes in [`super::legacy`] predate it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The literal `schema` value identifying an envelope report.
pub const ENVELOPE_SCHEMA: &str = "spectre/v1";

/// Finding severity. Exactly these four values are valid on the wire; there is
/// no `critical`, `warning`, or `error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized issue inside an envelope report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub severity: Severity,
    pub location: String,
    pub message: String,
}

/// What the scanner was pointed at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeTarget {
    #[serde(rename = "type")]
    pub target_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri_hash: Option<String>,
}

/// Per-severity finding counts. `total` must equal the findings length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeSummary {
    pub total: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
    pub info: i64,
}

/// A complete `spectre/v1` report.
///
/// `findings` stays `Option` at the serde level so a `null` or absent array is
/// distinguishable from an empty one; the parser normalizes `null` to
/// `Some(vec![])` before handing the report to callers, while the validator
/// rejects absent/null findings outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeReport {
    pub schema: String,
    pub tool: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub target: EnvelopeTarget,
    pub findings: Option<Vec<Finding>>,
    pub summary: EnvelopeSummary,
}

impl EnvelopeReport {
    /// Findings as a slice, treating absent as empty.
    pub fn findings(&self) -> &[Finding] {
        self.findings.as_deref().unwrap_or(&[])
    }
}
