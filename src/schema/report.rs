//! Engine output type handed to downstream consumers.

use super::envelope::EnvelopeReport;
use super::legacy::{
    ClickHouseReport, KafkaReport, MongoReport, PgReport, S3Report, VaultReport,
};
use super::ToolType;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// The decoded payload of one report file.
///
/// Serialized untagged so the JSON output mirrors the original wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedReport {
    Envelope(EnvelopeReport),
    Vault(VaultReport),
    S3(S3Report),
    Kafka(KafkaReport),
    ClickHouse(ClickHouseReport),
    Pg(PgReport),
    Mongo(MongoReport),
    /// Fallback for tools without a dedicated schema.
    Generic(Map<String, Value>),
}

impl ParsedReport {
    pub fn is_envelope(&self) -> bool {
        matches!(self, ParsedReport::Envelope(_))
    }
}

/// One ingested report: the contract boundary handed to aggregation.
///
/// Aggregation-specific fields (score, issue counts) are populated later by a
/// collaborator, not here. A `ToolReport` is never mutated after it is
/// returned.
#[derive(Debug, Clone, Serialize)]
pub struct ToolReport {
    pub tool: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub raw_data: ParsedReport,
    pub status: String,
    pub is_supported: bool,
}

impl ToolReport {
    pub fn new(
        tool: ToolType,
        version: String,
        timestamp: DateTime<Utc>,
        raw_data: ParsedReport,
    ) -> Self {
        let supported = tool.is_supported();
        Self {
            tool: tool.name().to_string(),
            version,
            timestamp,
            raw_data,
            status: if supported { "supported" } else { "unsupported" }.to_string(),
            is_supported: supported,
        }
    }
}
