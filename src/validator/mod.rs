//! Structural validation of report payloads.
//!
//! Validation accumulates every violation found rather than stopping at the
//! first, so a caller sees all problems in one pass. Like the parser, the
//! envelope always overrides the caller's tool hint: a payload carrying
//! `schema == "spectre/v1"` is validated as an envelope no matter what.

mod envelope;
mod legacy;

use crate::schema::{ENVELOPE_SCHEMA, ToolType};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use thiserror::Error;

/// Validation failure: the tool name plus every violation found.
/// Never partial; the violation list is always non-empty.
#[derive(Debug, Error)]
#[error("{tool} report failed validation: {}", .violations.join("; "))]
pub struct ValidationError {
    pub tool: String,
    pub violations: Vec<String>,
}

/// Validate report bytes against the schema for the given tool.
pub fn validate(tool: ToolType, bytes: &[u8]) -> Result<(), ValidationError> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => {
            return Err(ValidationError {
                tool: tool.name().to_string(),
                violations: vec![format!("payload is not valid JSON: {e}")],
            });
        }
    };

    let is_envelope = value.get("schema").and_then(Value::as_str) == Some(ENVELOPE_SCHEMA);

    let violations = if is_envelope {
        envelope::check(&value)
    } else {
        legacy::check(tool, &value)
    };

    if violations.is_empty() {
        return Ok(());
    }

    // Prefer the payload's self-declared tool name in the error.
    let name = value
        .get("tool")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or(tool.name());
    Err(ValidationError {
        tool: name.to_string(),
        violations,
    })
}

/// Opt-in timestamp plausibility check, deliberately separate from schema
/// validation: a report timestamp must not be more than a small skew in the
/// future and must not be older than one year.
pub fn check_timestamp_plausibility(ts: DateTime<Utc>) -> Result<(), String> {
    let now = Utc::now();
    if ts > now + Duration::minutes(5) {
        return Err(format!("timestamp {ts} is in the future"));
    }
    if ts < now - Duration::days(365) {
        return Err(format!("timestamp {ts} is more than one year old"));
    }
    Ok(())
}

/// Shared fail-closed accessors for the per-schema checkers.
pub(crate) fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

pub(crate) fn int_at(value: &Value, pointer: &str) -> Option<i64> {
    value.pointer(pointer).and_then(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_invalid_json() {
        let err = validate(ToolType::Vault, b"{nope").unwrap_err();
        assert_eq!(err.tool, "vault");
        assert!(err.violations[0].contains("not valid JSON"));
    }

    #[test]
    fn test_validate_envelope_overrides_hint() {
        // Envelope with a broken summary, validated under a kafka hint:
        // the envelope validator must run, not the kafka one.
        let json = br#"{
            "schema": "spectre/v1",
            "tool": "vault",
            "version": "1.0.0",
            "timestamp": "2025-06-01T12:00:00Z",
            "target": {"type": "vault"},
            "findings": [
                {"id": "V-1", "severity": "high", "location": "a", "message": "m"}
            ],
            "summary": {"total": 5, "high": 1, "medium": 0, "low": 0, "info": 0}
        }"#;
        let err = validate(ToolType::Kafka, json).unwrap_err();
        assert_eq!(err.tool, "vault");
        assert!(
            err.violations
                .iter()
                .any(|v| v == "summary.total=5 does not match findings count=1"),
            "violations: {:?}",
            err.violations
        );
    }

    #[test]
    fn test_validation_error_display_joins_violations() {
        let err = ValidationError {
            tool: "s3".to_string(),
            violations: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "s3 report failed validation: a; b");
    }

    #[test]
    fn test_timestamp_plausibility_ok() {
        assert!(check_timestamp_plausibility(Utc::now()).is_ok());
    }

    #[test]
    fn test_timestamp_plausibility_future() {
        let ts = Utc::now() + Duration::hours(2);
        assert!(check_timestamp_plausibility(ts).unwrap_err().contains("future"));
    }

    #[test]
    fn test_timestamp_plausibility_too_old() {
        let ts = Utc::now() - Duration::days(400);
        assert!(
            check_timestamp_plausibility(ts)
                .unwrap_err()
                .contains("one year")
        );
    }

    #[test]
    fn test_timestamp_plausibility_small_future_skew_allowed() {
        let ts = Utc::now() + Duration::minutes(2);
        assert!(check_timestamp_plausibility(ts).is_ok());
    }
}
