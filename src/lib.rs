pub mod cli;
pub mod collector;
pub mod detector;
pub mod discovery;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod runner;
pub mod schema;
pub mod validator;

pub use cli::{Cli, Command, OutputFormat};
pub use collector::Collector;
pub use detector::detect;
pub use discovery::{Discovery, DiscoveryPlan, ToolDiscovery, ToolExecInfo, exec_info};
pub use error::{IngestError, Result};
pub use parser::{extract_timestamp, extract_version, parse};
pub use runner::{RunConfig, RunResult, Runner};
pub use schema::{
    EnvelopeReport, Finding, ParsedReport, Severity, ToolReport, ToolType, tool_from_name,
};
pub use validator::{ValidationError, check_timestamp_plausibility, validate};
