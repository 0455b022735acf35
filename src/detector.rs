//! Tool detection from untrusted report bytes.
//!
//! Resolution is strictly ordered and short-circuits at the first phase that
//! produces an answer:
//!
//! 1. envelope check (`schema == "spectre/v1"` requires a mappable `tool`)
//! 2. explicit top-level `tool` field
//! 3. nested `metadata.tool` (only `pgspectre` uses this placement)
//! 4. structural heuristics over a generic map, in a fixed order
//!
//! Self-declaring tools win over structural guessing, and the envelope wins
//! over everything, so migrating a scanner to the envelope changes detection
//! behavior without touching this module. Detection never guesses when
//! ambiguous; it fails closed.

use crate::error::{IngestError, Result};
use crate::schema::{tool_from_name, ENVELOPE_SCHEMA, ToolType};
use serde_json::Value;

/// Determine which scanner produced the given JSON payload.
pub fn detect(bytes: &[u8]) -> Result<ToolType> {
    let value: Value = serde_json::from_slice(bytes)?;

    // Phase 1: envelope. A valid envelope schema with a missing or unmapped
    // tool is malformed, not legacy; it never falls through.
    if get_str(&value, "schema") == Some(ENVELOPE_SCHEMA) {
        return match get_str(&value, "tool") {
            Some(name) => {
                tool_from_name(name).ok_or_else(|| IngestError::UnknownTool(name.to_string()))
            }
            None => Err(IngestError::MalformedEnvelope(
                "schema is spectre/v1 but tool field is missing".to_string(),
            )),
        };
    }

    // Phase 2: explicit top-level tool field. An unmapped name is an error,
    // not a trigger for structural fallback.
    if let Some(name) = get_str(&value, "tool")
        && !name.is_empty()
    {
        return tool_from_name(name).ok_or_else(|| IngestError::UnknownTool(name.to_string()));
    }

    // Phase 3: nested metadata.tool. Only pgspectre places its identity here.
    if get_path_str(&value, &["metadata", "tool"]) == Some("pgspectre") {
        return Ok(ToolType::Pg);
    }

    // Phase 4: structural heuristics, fixed order. Each signature is a
    // conjunction of presence tests, never type-loose truthiness.
    if let Some(obj) = value.as_object() {
        if obj.contains_key("unused_topics")
            && (get_path(&value, &["summary", "cluster_name"]).is_some()
                || get_path(&value, &["summary", "total_brokers"]).is_some())
        {
            return Ok(ToolType::Kafka);
        }

        if obj.contains_key("tables")
            && obj.contains_key("cleanup_recommendations")
            && get_path(&value, &["metadata", "clickhouse_host"]).is_some()
        {
            return Ok(ToolType::ClickHouse);
        }

        if obj.contains_key("secrets")
            && (get_path(&value, &["summary", "status_missing"]).is_some()
                || get_path(&value, &["summary", "status_ok"]).is_some())
        {
            return Ok(ToolType::Vault);
        }

        if obj.contains_key("buckets")
            && (get_path(&value, &["summary", "total_buckets"]).is_some()
                || get_path(&value, &["summary", "missing_buckets"]).is_some())
        {
            return Ok(ToolType::S3);
        }

        if get_path(&value, &["scanned", "tables"]).is_some()
            && get_path(&value, &["scanned", "indexes"]).is_some()
        {
            return Ok(ToolType::Pg);
        }

        if is_mongo_shape(&value) {
            return Ok(ToolType::Mongo);
        }
    }

    Err(IngestError::UnrecognizedFormat)
}

fn is_mongo_shape(value: &Value) -> bool {
    if let Some(metadata) = get_path(value, &["metadata"]).and_then(Value::as_object)
        && (metadata.contains_key("mongodb_version")
            || metadata.contains_key("uri_hash")
            || metadata.contains_key("repo_path"))
    {
        return true;
    }

    // First finding carrying both database and collection keys.
    if let Some(first) = value
        .get("findings")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .and_then(Value::as_object)
    {
        return first.contains_key("database") && first.contains_key("collection");
    }

    false
}

/// Fail-closed string accessor: wrong type at key reads the same as absent.
fn get_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(key))
}

fn get_path_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    get_path(value, path).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_envelope() {
        let json = br#"{"schema": "spectre/v1", "tool": "kafka"}"#;
        assert_eq!(detect(json).unwrap(), ToolType::Kafka);
    }

    #[test]
    fn test_detect_envelope_missing_tool_is_hard_error() {
        let json = br#"{"schema": "spectre/v1", "secrets": {}, "summary": {"status_ok": 1}}"#;
        let err = detect(json).unwrap_err();
        assert!(matches!(err, IngestError::MalformedEnvelope(_)));
    }

    #[test]
    fn test_detect_envelope_unknown_tool_is_error() {
        let json = br#"{"schema": "spectre/v1", "tool": "novaspectre"}"#;
        assert!(matches!(
            detect(json).unwrap_err(),
            IngestError::UnknownTool(name) if name == "novaspectre"
        ));
    }

    #[test]
    fn test_detect_explicit_tool_field() {
        assert_eq!(
            detect(br#"{"tool": "vaultspectre", "secrets": {}}"#).unwrap(),
            ToolType::Vault
        );
        assert_eq!(detect(br#"{"tool": "s3"}"#).unwrap(), ToolType::S3);
    }

    #[test]
    fn test_detect_unmapped_tool_does_not_fall_through() {
        // Even with a perfectly good kafka shape underneath, an explicit
        // unmapped tool name is an error, never structural fallback.
        let json = br#"{
            "tool": "unknownspectre",
            "unused_topics": [],
            "summary": {"cluster_name": "prod", "total_brokers": 3}
        }"#;
        assert!(matches!(
            detect(json).unwrap_err(),
            IngestError::UnknownTool(name) if name == "unknownspectre"
        ));
    }

    #[test]
    fn test_detect_empty_tool_field_falls_through() {
        let json = br#"{"tool": "", "secrets": {}, "summary": {"status_ok": 2}}"#;
        assert_eq!(detect(json).unwrap(), ToolType::Vault);
    }

    #[test]
    fn test_detect_nested_metadata_tool_pgspectre() {
        let json = br#"{"metadata": {"tool": "pgspectre", "version": "2.0.0"}}"#;
        assert_eq!(detect(json).unwrap(), ToolType::Pg);
    }

    #[test]
    fn test_detect_nested_metadata_tool_other_name_is_not_phase3() {
        // Only pgspectre is wired into the nested lookup.
        let json = br#"{"metadata": {"tool": "kafkaspectre"}}"#;
        assert!(detect(json).is_err());
    }

    #[test]
    fn test_detect_kafka_shape() {
        let json = br#"{
            "unused_topics": [{"name": "old-events", "partitions": 3}],
            "active_topics": [],
            "summary": {"cluster_name": "prod", "total_brokers": 5}
        }"#;
        assert_eq!(detect(json).unwrap(), ToolType::Kafka);
    }

    #[test]
    fn test_detect_clickhouse_shape() {
        let json = br#"{
            "tables": {"events": {"rows": 100}},
            "cleanup_recommendations": [],
            "metadata": {"clickhouse_host": "ch1.internal"}
        }"#;
        assert_eq!(detect(json).unwrap(), ToolType::ClickHouse);
    }

    #[test]
    fn test_detect_vault_shape() {
        let json = br#"{"secrets": {"a": {"status": "ok"}}, "summary": {"status_missing": 0}}"#;
        assert_eq!(detect(json).unwrap(), ToolType::Vault);
    }

    #[test]
    fn test_detect_s3_shape() {
        let json = br#"{"buckets": {"logs": {}}, "summary": {"total_buckets": 1}}"#;
        assert_eq!(detect(json).unwrap(), ToolType::S3);
    }

    #[test]
    fn test_detect_pg_scanned_shape() {
        let json = br#"{"scanned": {"tables": 12, "indexes": 30}, "findings": []}"#;
        assert_eq!(detect(json).unwrap(), ToolType::Pg);
    }

    #[test]
    fn test_detect_mongo_by_metadata_key() {
        let json = br#"{"metadata": {"mongodb_version": "7.0"}, "findings": []}"#;
        assert_eq!(detect(json).unwrap(), ToolType::Mongo);

        let json = br#"{"metadata": {"uri_hash": "deadbeef"}}"#;
        assert_eq!(detect(json).unwrap(), ToolType::Mongo);
    }

    #[test]
    fn test_detect_mongo_by_first_finding() {
        let json = br#"{"findings": [{"database": "app", "collection": "users"}]}"#;
        assert_eq!(detect(json).unwrap(), ToolType::Mongo);
    }

    #[test]
    fn test_detect_unrecognized_fails_closed() {
        assert!(matches!(
            detect(br#"{"hello": "world"}"#).unwrap_err(),
            IngestError::UnrecognizedFormat
        ));
    }

    #[test]
    fn test_detect_invalid_json() {
        assert!(matches!(
            detect(b"not json at all").unwrap_err(),
            IngestError::Json(_)
        ));
    }

    #[test]
    fn test_detect_wrong_type_reads_as_absent() {
        // summary.status_ok present but summary is a string: fail closed.
        let json = br#"{"secrets": {}, "summary": "twelve"}"#;
        assert!(detect(json).is_err());
    }

    #[test]
    fn test_detect_is_idempotent() {
        let json = br#"{"tool": "mongospectre"}"#;
        assert_eq!(detect(json).unwrap(), detect(json).unwrap());
    }
}
