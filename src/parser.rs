//! Report parsing: bytes + tool identity -> typed report.
//!
//! Dispatch is keyed by [`ToolType`], but the `spectre/v1` envelope always
//! overrides the caller's hint: if the payload carries the envelope schema it
//! is parsed as an envelope no matter which tool the caller expected. Tools
//! without a dedicated legacy schema fall back to a generic string-keyed map;
//! only JSON syntax errors are hard failures.

use crate::error::Result;
use crate::schema::{
    ClickHouseReport, ENVELOPE_SCHEMA, EnvelopeReport, KafkaReport, MongoReport, ParsedReport,
    PgReport, S3Report, ToolType, VaultReport,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// Decode report bytes into the schema-specific (or generic) representation.
pub fn parse(bytes: &[u8], tool: ToolType) -> Result<ParsedReport> {
    if sniff_envelope(bytes) {
        let mut report: EnvelopeReport = serde_json::from_slice(bytes)?;
        // Callers never see a null findings array.
        if report.findings.is_none() {
            report.findings = Some(Vec::new());
        }
        return Ok(ParsedReport::Envelope(report));
    }

    match tool {
        ToolType::Vault => {
            let mut report: VaultReport = serde_json::from_slice(bytes)?;
            backfill(&mut report.tool, tool);
            report.timestamp.get_or_insert_with(Utc::now);
            Ok(ParsedReport::Vault(report))
        }
        ToolType::S3 => {
            let mut report: S3Report = serde_json::from_slice(bytes)?;
            backfill(&mut report.tool, tool);
            report.timestamp.get_or_insert_with(Utc::now);
            Ok(ParsedReport::S3(report))
        }
        ToolType::Kafka => {
            let mut report: KafkaReport = serde_json::from_slice(bytes)?;
            backfill(&mut report.tool, tool);
            report.timestamp.get_or_insert_with(Utc::now);
            Ok(ParsedReport::Kafka(report))
        }
        ToolType::ClickHouse => {
            let mut report: ClickHouseReport = serde_json::from_slice(bytes)?;
            backfill(&mut report.tool, tool);
            report.timestamp.get_or_insert_with(Utc::now);
            Ok(ParsedReport::ClickHouse(report))
        }
        ToolType::Pg => {
            let mut report: PgReport = serde_json::from_slice(bytes)?;
            backfill(&mut report.metadata.tool, tool);
            Ok(ParsedReport::Pg(report))
        }
        ToolType::Mongo => {
            let report: MongoReport = serde_json::from_slice(bytes)?;
            Ok(ParsedReport::Mongo(report))
        }
        // Envelope-only tools (aws, iam, gcs) without the envelope schema, and
        // anything unknown, decode as a generic map rather than erroring.
        ToolType::Aws | ToolType::Iam | ToolType::Gcs | ToolType::Unknown => {
            let map: Map<String, Value> = serde_json::from_slice(bytes)?;
            Ok(ParsedReport::Generic(map))
        }
    }
}

fn sniff_envelope(bytes: &[u8]) -> bool {
    serde_json::from_slice::<Value>(bytes)
        .ok()
        .and_then(|v| v.get("schema").and_then(Value::as_str).map(String::from))
        .is_some_and(|schema| schema == ENVELOPE_SCHEMA)
}

fn backfill(tool_field: &mut String, tool: ToolType) {
    if tool_field.is_empty() {
        *tool_field = tool.name().to_string();
    }
}

/// Best-effort version extraction from raw bytes.
///
/// Tries top-level `version`, then `metadata.version`, else `"unknown"`.
/// Never errors; several legacy tools place the version in different spots.
pub fn extract_version(bytes: &[u8]) -> String {
    let Ok(value) = serde_json::from_slice::<Value>(bytes) else {
        return "unknown".to_string();
    };

    value
        .get("version")
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            value
                .pointer("/metadata/version")
                .and_then(Value::as_str)
                .filter(|v| !v.is_empty())
        })
        .unwrap_or("unknown")
        .to_string()
}

/// Best-effort timestamp extraction from raw bytes.
///
/// Tries top-level `timestamp`, then `metadata.generated_at`, then
/// `metadata.timestamp`, then the broker-specific
/// `cluster_metadata.fetched_at` (non-ISO layout). Absence degrades to the
/// current time rather than failing the parse.
pub fn extract_timestamp(bytes: &[u8]) -> DateTime<Utc> {
    let Ok(value) = serde_json::from_slice::<Value>(bytes) else {
        return Utc::now();
    };

    let candidates = [
        value.get("timestamp"),
        value.pointer("/metadata/generated_at"),
        value.pointer("/metadata/timestamp"),
    ];
    for candidate in candidates.into_iter().flatten() {
        if let Some(ts) = candidate.as_str()
            && let Ok(parsed) = DateTime::parse_from_rfc3339(ts)
        {
            return parsed.with_timezone(&Utc);
        }
    }

    if let Some(fetched) = value
        .pointer("/cluster_metadata/fetched_at")
        .and_then(Value::as_str)
        && let Some(parsed) = parse_fetched_at(fetched)
    {
        return parsed;
    }

    Utc::now()
}

/// Parse the broker scanner's `"2025-06-01 12:00:00 UTC"` layout. The zone
/// abbreviation is stripped and the remainder is read as UTC, since zone
/// abbreviations are not reliably resolvable.
fn parse_fetched_at(s: &str) -> Option<DateTime<Utc>> {
    let (datetime, _zone) = s.rsplit_once(' ')?;
    NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ENVELOPE_JSON: &[u8] = br#"{
        "schema": "spectre/v1",
        "tool": "pg",
        "version": "2.1.0",
        "timestamp": "2025-06-01T12:00:00Z",
        "target": {"type": "postgres"},
        "findings": null,
        "summary": {"total": 0, "high": 0, "medium": 0, "low": 0, "info": 0}
    }"#;

    #[test]
    fn test_parse_envelope_normalizes_null_findings() {
        let ParsedReport::Envelope(report) = parse(ENVELOPE_JSON, ToolType::Pg).unwrap() else {
            panic!("expected envelope");
        };
        assert_eq!(report.findings, Some(vec![]));
    }

    #[test]
    fn test_parse_envelope_overrides_tool_hint() {
        // Caller claims kafka, payload says envelope: envelope wins.
        let parsed = parse(ENVELOPE_JSON, ToolType::Kafka).unwrap();
        assert!(parsed.is_envelope());
    }

    #[test]
    fn test_parse_vault_backfills_tool_and_timestamp() {
        let json = br#"{"secrets": {}, "summary": {"status_ok": 0, "status_missing": 0}}"#;
        let ParsedReport::Vault(report) = parse(json, ToolType::Vault).unwrap() else {
            panic!("expected vault");
        };
        assert_eq!(report.tool, "vault");
        assert!(report.timestamp.is_some());
    }

    #[test]
    fn test_parse_vault_keeps_declared_tool_name() {
        let json = br#"{"tool": "vaultspectre", "secrets": {}}"#;
        let ParsedReport::Vault(report) = parse(json, ToolType::Vault).unwrap() else {
            panic!("expected vault");
        };
        assert_eq!(report.tool, "vaultspectre");
    }

    #[test]
    fn test_parse_pg_backfills_nested_tool() {
        let json = br#"{"scanned": {"tables": 1, "indexes": 2}, "findings": []}"#;
        let ParsedReport::Pg(report) = parse(json, ToolType::Pg).unwrap() else {
            panic!("expected pg");
        };
        assert_eq!(report.metadata.tool, "pg");
    }

    #[test]
    fn test_parse_unsupported_tool_falls_back_to_generic() {
        let json = br#"{"whatever": {"nested": true}}"#;
        let ParsedReport::Generic(map) = parse(json, ToolType::Unknown).unwrap() else {
            panic!("expected generic map");
        };
        assert!(map.contains_key("whatever"));
    }

    #[test]
    fn test_parse_invalid_json_is_hard_error() {
        assert!(parse(b"{broken", ToolType::Unknown).is_err());
    }

    #[test]
    fn test_parse_is_idempotent() {
        let json = br#"{"tool": "s3spectre", "timestamp": "2025-05-01T00:00:00Z", "buckets": {}, "summary": {}}"#;
        // Timestamp declared in the payload, so no wall-clock backfill.
        let a = parse(json, ToolType::S3).unwrap();
        let b = parse(json, ToolType::S3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_extract_version_top_level() {
        assert_eq!(extract_version(br#"{"version": "1.2.3"}"#), "1.2.3");
    }

    #[test]
    fn test_extract_version_metadata_fallback() {
        assert_eq!(
            extract_version(br#"{"metadata": {"version": "4.5.6"}}"#),
            "4.5.6"
        );
    }

    #[test]
    fn test_extract_version_sentinel() {
        assert_eq!(extract_version(br#"{}"#), "unknown");
        assert_eq!(extract_version(b"not json"), "unknown");
        assert_eq!(extract_version(br#"{"version": ""}"#), "unknown");
    }

    #[test]
    fn test_extract_timestamp_top_level() {
        let ts = extract_timestamp(br#"{"timestamp": "2025-06-01T12:00:00Z"}"#);
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_extract_timestamp_generated_at() {
        let ts = extract_timestamp(br#"{"metadata": {"generated_at": "2025-03-10T08:30:00Z"}}"#);
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 3, 10, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_extract_timestamp_kafka_fetched_at() {
        let ts =
            extract_timestamp(br#"{"cluster_metadata": {"fetched_at": "2025-06-01 12:00:00 UTC"}}"#);
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_extract_timestamp_defaults_to_now() {
        let before = Utc::now();
        let ts = extract_timestamp(br#"{}"#);
        assert!(ts >= before);
    }
}
