//! Per-schema validation of legacy report payloads.
//!
//! Each checker enforces: required top-level fields present, numeric
//! invariants non-negative, and enumerated status/category/risk fields
//! restricted to their fixed allowed sets. Tools without a legacy schema
//! (aws, iam, gcs) only ever ship the envelope, so there is nothing to
//! enforce for them here.

use super::{int_at, str_at};
use crate::schema::ToolType;
use serde_json::Value;

const SECRET_STATUSES: [&str; 3] = ["ok", "missing", "error"];
const RISKS: [&str; 3] = ["low", "medium", "high"];
const SEVERITIES: [&str; 4] = ["high", "medium", "low", "info"];

pub(super) fn check(tool: ToolType, value: &Value) -> Vec<String> {
    let mut violations = Vec::new();
    match tool {
        ToolType::Vault => check_vault(value, &mut violations),
        ToolType::S3 => check_s3(value, &mut violations),
        ToolType::Kafka => check_kafka(value, &mut violations),
        ToolType::ClickHouse => check_clickhouse(value, &mut violations),
        ToolType::Pg => check_pg(value, &mut violations),
        ToolType::Mongo => check_mongo(value, &mut violations),
        ToolType::Aws | ToolType::Iam | ToolType::Gcs | ToolType::Unknown => {}
    }
    violations
}

fn require_object<'a>(
    value: &'a Value,
    key: &str,
    violations: &mut Vec<String>,
) -> Option<&'a serde_json::Map<String, Value>> {
    let object = value.get(key).and_then(Value::as_object);
    if object.is_none() {
        violations.push(format!("{key} is required"));
    }
    object
}

fn require_non_negative(value: &Value, pointer: &str, label: &str, violations: &mut Vec<String>) {
    if let Some(n) = int_at(value, pointer)
        && n < 0
    {
        violations.push(format!("{label}={n} must be non-negative"));
    }
}

fn check_vault(value: &Value, violations: &mut Vec<String>) {
    if let Some(secrets) = require_object(value, "secrets", violations) {
        for (path, entry) in secrets {
            match entry.get("status").and_then(Value::as_str) {
                Some(status) if SECRET_STATUSES.contains(&status) => {}
                Some(status) => violations.push(format!(
                    "secrets[{path:?}].status={status:?} is not one of ok|missing|error"
                )),
                None => violations.push(format!("secrets[{path:?}].status is required")),
            }
        }
    }
    if require_object(value, "summary", violations).is_some() {
        for field in ["total_secrets", "status_ok", "status_missing"] {
            require_non_negative(
                value,
                &format!("/summary/{field}"),
                &format!("summary.{field}"),
                violations,
            );
        }
    }
}

fn check_s3(value: &Value, violations: &mut Vec<String>) {
    if let Some(buckets) = require_object(value, "buckets", violations) {
        for (name, analysis) in buckets {
            for field in ["object_count", "total_size_bytes"] {
                if let Some(n) = analysis.get(field).and_then(Value::as_i64)
                    && n < 0
                {
                    violations.push(format!("buckets[{name:?}].{field}={n} must be non-negative"));
                }
            }
        }
    }
    if require_object(value, "summary", violations).is_some() {
        for field in ["total_buckets", "missing_buckets"] {
            require_non_negative(
                value,
                &format!("/summary/{field}"),
                &format!("summary.{field}"),
                violations,
            );
        }
    }
}

fn check_kafka(value: &Value, violations: &mut Vec<String>) {
    for key in ["unused_topics", "active_topics"] {
        let Some(topics) = value.get(key).and_then(Value::as_array) else {
            violations.push(format!("{key} must be a present (possibly empty) array"));
            continue;
        };
        for (i, topic) in topics.iter().enumerate() {
            if topic
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .is_none()
            {
                violations.push(format!("{key}[{i}].name is required"));
            }
            if let Some(partitions) = topic.get("partitions").and_then(Value::as_i64)
                && partitions < 0
            {
                violations.push(format!(
                    "{key}[{i}].partitions={partitions} must be non-negative"
                ));
            }
        }
    }

    if require_object(value, "summary", violations).is_some() {
        if str_at(value, "/summary/cluster_name")
            .filter(|n| !n.is_empty())
            .is_none()
        {
            violations.push("summary.cluster_name is required".to_string());
        }
        for field in ["total_brokers", "total_topics"] {
            require_non_negative(
                value,
                &format!("/summary/{field}"),
                &format!("summary.{field}"),
                violations,
            );
        }
    }
}

fn check_clickhouse(value: &Value, violations: &mut Vec<String>) {
    if let Some(tables) = require_object(value, "tables", violations) {
        for (name, usage) in tables {
            for field in ["rows", "bytes_on_disk"] {
                if let Some(n) = usage.get(field).and_then(Value::as_i64)
                    && n < 0
                {
                    violations.push(format!("tables[{name:?}].{field}={n} must be non-negative"));
                }
            }
        }
    }

    if str_at(value, "/metadata/clickhouse_host")
        .filter(|h| !h.is_empty())
        .is_none()
    {
        violations.push("metadata.clickhouse_host is required".to_string());
    }

    if let Some(recs) = value.get("cleanup_recommendations").and_then(Value::as_array) {
        for (i, rec) in recs.iter().enumerate() {
            if rec
                .get("table")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .is_none()
            {
                violations.push(format!("cleanup_recommendations[{i}].table is required"));
            }
            match rec.get("risk").and_then(Value::as_str) {
                Some(risk) if RISKS.contains(&risk) => {}
                Some(risk) => violations.push(format!(
                    "cleanup_recommendations[{i}].risk={risk:?} is not one of low|medium|high"
                )),
                None => violations.push(format!("cleanup_recommendations[{i}].risk is required")),
            }
        }
    } else {
        violations.push("cleanup_recommendations must be a present (possibly empty) array".to_string());
    }
}

fn check_pg(value: &Value, violations: &mut Vec<String>) {
    if str_at(value, "/metadata/tool")
        .filter(|t| !t.is_empty())
        .is_none()
    {
        violations.push("metadata.tool is required".to_string());
    }

    if require_object(value, "scanned", violations).is_some() {
        for field in ["tables", "indexes"] {
            require_non_negative(
                value,
                &format!("/scanned/{field}"),
                &format!("scanned.{field}"),
                violations,
            );
        }
    }

    check_findings_list(value, violations, |i, finding, violations| {
        if finding
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .is_none()
        {
            violations.push(format!("findings[{i}].message is required"));
        }
        check_severity(i, finding, violations);
    });
}

fn check_mongo(value: &Value, violations: &mut Vec<String>) {
    check_findings_list(value, violations, |i, finding, violations| {
        for field in ["database", "collection"] {
            if finding
                .get(field)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .is_none()
            {
                violations.push(format!("findings[{i}].{field} is required"));
            }
        }
        check_severity(i, finding, violations);
    });
}

/// Findings absent is an error; findings present but empty is valid.
fn check_findings_list(
    value: &Value,
    violations: &mut Vec<String>,
    mut per_finding: impl FnMut(usize, &Value, &mut Vec<String>),
) {
    let Some(findings) = value.get("findings").and_then(Value::as_array) else {
        violations.push("findings must be a present (possibly empty) array".to_string());
        return;
    };
    for (i, finding) in findings.iter().enumerate() {
        per_finding(i, finding, violations);
    }
}

fn check_severity(i: usize, finding: &Value, violations: &mut Vec<String>) {
    match finding.get("severity").and_then(Value::as_str) {
        Some(sev) if SEVERITIES.contains(&sev) => {}
        Some(sev) => violations.push(format!(
            "findings[{i}].severity={sev:?} is not one of high|medium|low|info"
        )),
        None => violations.push(format!("findings[{i}].severity is required")),
    }
}
