//! Command handlers for the spectre-ingest binary.
//!
//! Exit codes: 0 on success, 1 when reports failed to ingest or validate,
//! 2 on input or execution errors.

use crate::cli::OutputFormat;
use crate::collector::Collector;
use crate::detector::detect;
use crate::discovery::Discovery;
use crate::runner::{RunConfig, Runner};
use crate::schema::{ToolReport, ToolType, tool_from_name};
use crate::validator::validate;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, info};

/// Handle `collect`.
pub fn handle_collect(
    paths: &[PathBuf],
    workers: usize,
    timeout_secs: u64,
    strict: bool,
    format: OutputFormat,
) -> ExitCode {
    info!(paths = ?paths, workers, strict, "Collecting reports");

    let collector = Collector::new()
        .with_workers(workers)
        .with_timeout(Duration::from_secs(timeout_secs));

    let reports = match collector.collect_from_paths(paths) {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let reports = if strict {
        match drop_invalid(reports) {
            Some(valid) => valid,
            None => {
                eprintln!("All collected reports failed validation");
                return ExitCode::from(1);
            }
        }
    } else {
        reports
    };

    print_reports(&reports, format);
    ExitCode::SUCCESS
}

/// Strict ingestion: re-validate each collected report and drop violators.
/// Returns `None` when nothing survives.
fn drop_invalid(reports: Vec<ToolReport>) -> Option<Vec<ToolReport>> {
    let valid: Vec<ToolReport> = reports
        .into_iter()
        .filter(|report| {
            let tool = tool_from_name(&report.tool).unwrap_or(ToolType::Unknown);
            let bytes = match serde_json::to_vec(&report.raw_data) {
                Ok(b) => b,
                Err(_) => return false,
            };
            match validate(tool, &bytes) {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("{} {e}", "dropped:".yellow());
                    false
                }
            }
        })
        .collect();

    if valid.is_empty() { None } else { Some(valid) }
}

/// Handle `validate`.
pub fn handle_validate(files: &[PathBuf], format: OutputFormat) -> ExitCode {
    let mut failures = 0usize;
    let mut results = Vec::new();

    for path in files {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("Failed to read {}: {e}", path.display());
                return ExitCode::from(2);
            }
        };

        // The envelope overrides the hint inside validate(), so a failed
        // detection still lets envelope payloads validate properly.
        let tool = detect(&bytes).unwrap_or(ToolType::Unknown);
        match validate(tool, &bytes) {
            Ok(()) => {
                results.push((path.clone(), tool, Vec::new()));
            }
            Err(e) => {
                failures += 1;
                results.push((path.clone(), tool, e.violations));
            }
        }
    }

    match format {
        OutputFormat::Json => {
            let json: Vec<serde_json::Value> = results
                .iter()
                .map(|(path, tool, violations)| {
                    serde_json::json!({
                        "file": path,
                        "tool": tool.name(),
                        "valid": violations.is_empty(),
                        "violations": violations,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        OutputFormat::Terminal => {
            for (path, tool, violations) in &results {
                if violations.is_empty() {
                    println!("{} {} ({})", "ok".green().bold(), path.display(), tool);
                } else {
                    println!("{} {} ({})", "invalid".red().bold(), path.display(), tool);
                    for violation in violations {
                        println!("    - {violation}");
                    }
                }
            }
        }
    }

    if failures > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Handle `discover`.
pub fn handle_discover(format: OutputFormat) -> ExitCode {
    let plan = Discovery::new().discover();

    match format {
        OutputFormat::Json => {
            let json: Vec<serde_json::Value> = plan
                .tools
                .iter()
                .map(|tool| {
                    serde_json::json!({
                        "tool": tool.tool.name(),
                        "binary_path": tool.binary_path,
                        "available": tool.available,
                        "has_target": tool.has_target,
                        "runnable": tool.runnable,
                    })
                })
                .collect();
            let out = serde_json::json!({
                "tools": json,
                "total_found": plan.total_found,
                "total_runnable": plan.total_runnable,
            });
            println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        }
        OutputFormat::Terminal => {
            for tool in &plan.tools {
                let state = if tool.runnable {
                    "runnable".green().bold()
                } else if tool.available {
                    "no target".yellow()
                } else {
                    "not found".red()
                };
                println!("{:12} {state}", tool.tool.name());
            }
            println!(
                "\n{} of {} scanners found, {} runnable",
                plan.total_found,
                plan.tools.len(),
                plan.total_runnable
            );
        }
    }

    ExitCode::SUCCESS
}

/// Handle `run`: discover, execute runnable scanners, collect their output.
pub fn handle_run(tools: &[String], timeout_secs: u64, format: OutputFormat) -> ExitCode {
    let filter: Option<Vec<ToolType>> = if tools.is_empty() {
        None
    } else {
        let mut resolved = Vec::new();
        for name in tools {
            match tool_from_name(name) {
                Some(tool) => resolved.push(tool),
                None => {
                    eprintln!("Unknown tool: {name}");
                    return ExitCode::from(2);
                }
            }
        }
        Some(resolved)
    };

    let plan = Discovery::new().discover();
    let configs: Vec<RunConfig> = plan
        .runnable()
        .filter(|d| filter.as_ref().is_none_or(|f| f.contains(&d.tool)))
        .filter_map(RunConfig::from_discovery)
        .map(|mut cfg| {
            cfg.timeout = Some(Duration::from_secs(timeout_secs));
            cfg
        })
        .collect();

    if configs.is_empty() {
        eprintln!("No runnable scanners found");
        return ExitCode::from(2);
    }

    let mut runner = Runner::new();
    let results = runner.run(&configs);
    for result in &results {
        if result.success {
            debug!(tool = %result.tool, duration = ?result.duration, "Scanner succeeded");
        } else {
            eprintln!(
                "{} {}: {}",
                "failed:".red().bold(),
                result.tool,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let outputs = runner.output_files();
    if outputs.is_empty() {
        runner.cleanup();
        eprintln!("No scanner produced output");
        return ExitCode::from(1);
    }

    let exit = match Collector::new().collect_from_paths(&outputs) {
        Ok(reports) => {
            print_reports(&reports, format);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(1)
        }
    };
    runner.cleanup();
    exit
}

fn print_reports(reports: &[ToolReport], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(reports).unwrap_or_default());
        }
        OutputFormat::Terminal => {
            for report in reports {
                let status = if report.is_supported {
                    report.status.green()
                } else {
                    report.status.yellow()
                };
                println!(
                    "{:12} {:10} {}  [{status}]",
                    report.tool.bold(),
                    report.version,
                    report.timestamp.to_rfc3339()
                );
            }
            println!("\n{} report(s) collected", reports.len());
        }
    }
}
