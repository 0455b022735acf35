//! Legacy per-tool report shapes.
//!
//! Each scanner predating the `spectre/v1` envelope ships its own top-level
//! JSON shape. These structs deserialize leniently: most fields carry
//! `#[serde(default)]` so a missing field parses and is reported by the
//! validator instead of failing deserialization, and counters are signed so
//! negative values survive to be flagged as violations. Collections that must
//! distinguish "absent" from "present but empty" stay `Option`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// --- secrets store (vaultspectre) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretEntry {
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rotated: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultSummary {
    #[serde(default)]
    pub total_secrets: i64,
    #[serde(default)]
    pub status_ok: i64,
    #[serde(default)]
    pub status_missing: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultReport {
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Secret path -> status entry.
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretEntry>,
    #[serde(default)]
    pub summary: VaultSummary,
}

// --- object storage (s3spectre) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketAnalysis {
    #[serde(default)]
    pub object_count: i64,
    #[serde(default)]
    pub total_size_bytes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct S3Summary {
    #[serde(default)]
    pub total_buckets: i64,
    #[serde(default)]
    pub missing_buckets: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct S3Report {
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Bucket name -> per-bucket analysis.
    #[serde(default)]
    pub buckets: BTreeMap<String, BucketAnalysis>,
    #[serde(default)]
    pub summary: S3Summary,
}

// --- message broker (kafkaspectre) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub partitions: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_message_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KafkaSummary {
    #[serde(default)]
    pub cluster_name: String,
    #[serde(default)]
    pub total_brokers: i64,
    #[serde(default)]
    pub total_topics: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterMetadata {
    /// Non-ISO layout, e.g. `"2025-06-01 12:00:00 UTC"`.
    #[serde(default)]
    pub fetched_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KafkaReport {
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    pub unused_topics: Option<Vec<TopicInfo>>,
    pub active_topics: Option<Vec<TopicInfo>>,
    #[serde(default)]
    pub summary: KafkaSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_metadata: Option<ClusterMetadata>,
}

// --- columnar store (clickspectre) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableUsage {
    #[serde(default)]
    pub rows: i64,
    #[serde(default)]
    pub bytes_on_disk: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_query_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub risk: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickHouseMetadata {
    #[serde(default)]
    pub clickhouse_host: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickHouseReport {
    #[serde(default)]
    pub tool: String,
    /// Table name -> usage stats.
    #[serde(default)]
    pub tables: BTreeMap<String, TableUsage>,
    #[serde(default)]
    pub cleanup_recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub metadata: ClickHouseMetadata,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

// --- relational database (pgspectre) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PgMetadata {
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PgScanned {
    #[serde(default)]
    pub tables: i64,
    #[serde(default)]
    pub indexes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PgFinding {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PgReport {
    #[serde(default)]
    pub metadata: PgMetadata,
    #[serde(default)]
    pub scanned: PgScanned,
    pub findings: Option<Vec<PgFinding>>,
}

// --- document database (mongospectre) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MongoMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongodb_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MongoFinding {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MongoReport {
    #[serde(default)]
    pub metadata: MongoMetadata,
    pub findings: Option<Vec<MongoFinding>>,
}
