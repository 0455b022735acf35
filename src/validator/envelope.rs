//! Validation of `spectre/v1` envelope payloads.

use super::{int_at, str_at};
use crate::schema::{ENVELOPE_SCHEMA, expected_target_type, tool_from_name};
use chrono::DateTime;
use serde_json::Value;

const SEVERITIES: [&str; 4] = ["high", "medium", "low", "info"];

/// Check an envelope payload, returning every violation found.
pub(super) fn check(value: &Value) -> Vec<String> {
    let mut violations = Vec::new();

    if value.get("schema").and_then(Value::as_str) != Some(ENVELOPE_SCHEMA) {
        violations.push(format!("schema must be {ENVELOPE_SCHEMA:?}"));
    }

    let tool_name = str_at(value, "/tool").filter(|t| !t.is_empty());
    if tool_name.is_none() {
        violations.push("tool is required".to_string());
    }
    if str_at(value, "/version").filter(|v| !v.is_empty()).is_none() {
        violations.push("version is required".to_string());
    }
    match str_at(value, "/timestamp") {
        None => violations.push("timestamp is required".to_string()),
        Some(ts) if DateTime::parse_from_rfc3339(ts).is_err() => {
            violations.push(format!("timestamp {ts:?} is not RFC3339"));
        }
        Some(_) => {}
    }

    check_target(value, tool_name, &mut violations);
    let findings_count = check_findings(value, &mut violations);
    check_summary(value, findings_count, &mut violations);

    violations
}

fn check_target(value: &Value, tool_name: Option<&str>, violations: &mut Vec<String>) {
    let Some(target_type) = str_at(value, "/target/type").filter(|t| !t.is_empty()) else {
        violations.push("target.type is required".to_string());
        return;
    };

    // Fixed-target tools must match the static table; variable-target tools
    // (iam) accept any value.
    if let Some(tool) = tool_name.and_then(tool_from_name)
        && let Some(expected) = expected_target_type(tool)
        && target_type != expected
    {
        violations.push(format!(
            "target.type={target_type:?} does not match expected {expected:?} for tool {tool}"
        ));
    }
}

/// Returns the findings count when the array is present, for the summary check.
fn check_findings(value: &Value, violations: &mut Vec<String>) -> Option<usize> {
    let Some(findings) = value.get("findings").and_then(Value::as_array) else {
        violations.push("findings must be a present (possibly empty) array, not null or absent".to_string());
        return None;
    };

    for (i, finding) in findings.iter().enumerate() {
        for field in ["id", "location", "message"] {
            if finding
                .get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .is_none()
            {
                violations.push(format!("findings[{i}].{field} is required"));
            }
        }
        match finding.get("severity").and_then(Value::as_str) {
            Some(sev) if SEVERITIES.contains(&sev) => {}
            Some(sev) => violations.push(format!(
                "findings[{i}].severity={sev:?} is not one of high|medium|low|info"
            )),
            None => violations.push(format!("findings[{i}].severity is required")),
        }
    }

    Some(findings.len())
}

fn check_summary(value: &Value, findings_count: Option<usize>, violations: &mut Vec<String>) {
    if value.get("summary").is_none() {
        violations.push("summary is required".to_string());
        return;
    }

    for field in ["high", "medium", "low", "info"] {
        if let Some(n) = int_at(value, &format!("/summary/{field}"))
            && n < 0
        {
            violations.push(format!("summary.{field}={n} must be non-negative"));
        }
    }

    let Some(total) = int_at(value, "/summary/total") else {
        violations.push("summary.total is required".to_string());
        return;
    };
    if let Some(count) = findings_count
        && total != count as i64
    {
        violations.push(format!(
            "summary.total={total} does not match findings count={count}"
        ));
    }
}
