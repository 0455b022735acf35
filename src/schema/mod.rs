//! Data model for spectre scanner reports.
//!
//! This module holds the closed tool enumeration, the static wire-name and
//! target-type tables, the legacy per-tool report shapes, the unified
//! `spectre/v1` envelope, and the engine's output type [`ToolReport`].

mod envelope;
mod legacy;
mod report;

pub use envelope::{
    ENVELOPE_SCHEMA, EnvelopeReport, EnvelopeSummary, EnvelopeTarget, Finding, Severity,
};
pub use legacy::{
    BucketAnalysis, ClickHouseMetadata, ClickHouseReport, ClusterMetadata, KafkaReport,
    KafkaSummary, MongoFinding, MongoMetadata, MongoReport, PgFinding, PgMetadata, PgReport,
    PgScanned, Recommendation, S3Report, S3Summary, SecretEntry, TableUsage, TopicInfo,
    VaultReport, VaultSummary,
};
pub use report::{ParsedReport, ToolReport};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

/// Closed enumeration of supported scanner identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    Aws,
    ClickHouse,
    Gcs,
    Iam,
    Kafka,
    Mongo,
    Pg,
    S3,
    Vault,
    Unknown,
}

impl ToolType {
    /// Short identity string for the tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolType::Aws => "aws",
            ToolType::ClickHouse => "clickhouse",
            ToolType::Gcs => "gcs",
            ToolType::Iam => "iam",
            ToolType::Kafka => "kafka",
            ToolType::Mongo => "mongo",
            ToolType::Pg => "pg",
            ToolType::S3 => "s3",
            ToolType::Vault => "vault",
            ToolType::Unknown => "unknown",
        }
    }

    /// All concrete tool types, excluding `Unknown`.
    pub fn all() -> &'static [ToolType] {
        &[
            ToolType::Aws,
            ToolType::ClickHouse,
            ToolType::Gcs,
            ToolType::Iam,
            ToolType::Kafka,
            ToolType::Mongo,
            ToolType::Pg,
            ToolType::S3,
            ToolType::Vault,
        ]
    }

    /// Whether this tool is understood by downstream aggregation.
    pub fn is_supported(&self) -> bool {
        !matches!(self, ToolType::Unknown)
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wire tool-name table: maps both scanner binary names and bare short names
/// to the tool identity. Unknown names are absent, never mapped to `Unknown`.
static TOOL_NAMES: LazyLock<BTreeMap<&'static str, ToolType>> = LazyLock::new(|| {
    BTreeMap::from([
        ("vaultspectre", ToolType::Vault),
        ("vault", ToolType::Vault),
        ("s3spectre", ToolType::S3),
        ("s3", ToolType::S3),
        ("kafkaspectre", ToolType::Kafka),
        ("kafka", ToolType::Kafka),
        ("clickspectre", ToolType::ClickHouse),
        ("clickhouse", ToolType::ClickHouse),
        ("pgspectre", ToolType::Pg),
        ("pg", ToolType::Pg),
        ("mongospectre", ToolType::Mongo),
        ("mongo", ToolType::Mongo),
        ("awsspectre", ToolType::Aws),
        ("aws", ToolType::Aws),
        ("iamspectre", ToolType::Iam),
        ("iam", ToolType::Iam),
        ("gcspectre", ToolType::Gcs),
        ("gcs", ToolType::Gcs),
    ])
});

/// Resolve a wire tool name to its identity. Returns `None` for names that
/// are not in the closed set.
pub fn tool_from_name(name: &str) -> Option<ToolType> {
    TOOL_NAMES.get(name).copied()
}

/// Fixed-target table: for most tools the envelope's `target.type` must equal
/// one specific value. Variable-target tools (currently only `iam`, which
/// targets either a cloud account or a project depending on cloud) are absent.
static FIXED_TARGETS: LazyLock<BTreeMap<ToolType, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        (ToolType::Vault, "vault"),
        (ToolType::S3, "s3"),
        (ToolType::Kafka, "kafka"),
        (ToolType::ClickHouse, "clickhouse"),
        (ToolType::Pg, "postgres"),
        (ToolType::Mongo, "mongodb"),
        (ToolType::Aws, "aws-account"),
        (ToolType::Gcs, "gcs"),
    ])
});

/// Expected `target.type` for a fixed-target tool, `None` for variable-target
/// tools.
pub fn expected_target_type(tool: ToolType) -> Option<&'static str> {
    FIXED_TARGETS.get(&tool).copied()
}
