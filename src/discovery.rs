//! Scanner discovery: which tools are installed and have a usable target.
//!
//! PATH lookup and environment reads are injected as closures so discovery is
//! deterministic under test without touching the real environment. A tool is
//! runnable when its binary resolves on PATH and at least one target signal
//! (env var set, or config file present) exists; partial configuration counts
//! because a tool may only need one of several alternatives.

use crate::schema::ToolType;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::debug;

/// Static execution info for one scanner.
#[derive(Debug, Clone, Copy)]
pub struct ToolExecInfo {
    pub binary: &'static str,
    pub subcommand: &'static str,
    /// Flag tokens requesting JSON output, space-separated.
    pub json_flag: &'static str,
    /// Env vars whose presence indicates a configured target.
    pub env_vars: &'static [&'static str],
    /// Candidate config files, some home-relative (`~/`).
    pub config_paths: &'static [&'static str],
    pub install_hint: &'static str,
}

static EXEC_REGISTRY: LazyLock<BTreeMap<ToolType, ToolExecInfo>> = LazyLock::new(|| {
    BTreeMap::from([
        (
            ToolType::Vault,
            ToolExecInfo {
                binary: "vaultspectre",
                subcommand: "scan",
                json_flag: "--output json",
                env_vars: &["VAULT_ADDR", "VAULT_TOKEN"],
                config_paths: &["~/.vault-token"],
                install_hint: "install vaultspectre and ensure it is on PATH",
            },
        ),
        (
            ToolType::S3,
            ToolExecInfo {
                binary: "s3spectre",
                subcommand: "audit",
                json_flag: "--output json",
                env_vars: &["AWS_PROFILE", "AWS_ACCESS_KEY_ID"],
                config_paths: &["~/.aws/credentials", "~/.aws/config"],
                install_hint: "install s3spectre and ensure it is on PATH",
            },
        ),
        (
            ToolType::Kafka,
            ToolExecInfo {
                binary: "kafkaspectre",
                subcommand: "scan",
                json_flag: "--json",
                env_vars: &["KAFKA_BROKERS"],
                config_paths: &["~/.kafkaspectre.yaml"],
                install_hint: "install kafkaspectre and ensure it is on PATH",
            },
        ),
        (
            ToolType::ClickHouse,
            ToolExecInfo {
                binary: "clickspectre",
                subcommand: "analyze",
                json_flag: "--output json",
                env_vars: &["CLICKHOUSE_URL", "CLICKHOUSE_HOST"],
                config_paths: &["~/.clickhouse-client/config.xml"],
                install_hint: "install clickspectre and ensure it is on PATH",
            },
        ),
        (
            ToolType::Pg,
            ToolExecInfo {
                binary: "pgspectre",
                subcommand: "scan",
                json_flag: "--format json",
                env_vars: &["DATABASE_URL", "PGHOST"],
                config_paths: &["~/.pgpass"],
                install_hint: "install pgspectre and ensure it is on PATH",
            },
        ),
        (
            ToolType::Mongo,
            ToolExecInfo {
                binary: "mongospectre",
                subcommand: "scan",
                json_flag: "--json",
                env_vars: &["MONGODB_URI"],
                config_paths: &["~/.mongospectre.toml"],
                install_hint: "install mongospectre and ensure it is on PATH",
            },
        ),
        (
            ToolType::Aws,
            ToolExecInfo {
                binary: "awsspectre",
                subcommand: "audit",
                json_flag: "--output json",
                env_vars: &["AWS_PROFILE", "AWS_ACCESS_KEY_ID", "AWS_REGION"],
                config_paths: &["~/.aws/credentials", "~/.aws/config"],
                install_hint: "install awsspectre and ensure it is on PATH",
            },
        ),
        (
            ToolType::Iam,
            ToolExecInfo {
                binary: "iamspectre",
                subcommand: "audit",
                json_flag: "--output json",
                env_vars: &["AWS_PROFILE", "GOOGLE_APPLICATION_CREDENTIALS"],
                config_paths: &[
                    "~/.aws/credentials",
                    "~/.config/gcloud/application_default_credentials.json",
                ],
                install_hint: "install iamspectre and ensure it is on PATH",
            },
        ),
        (
            ToolType::Gcs,
            ToolExecInfo {
                binary: "gcspectre",
                subcommand: "scan",
                json_flag: "--json",
                env_vars: &["GOOGLE_APPLICATION_CREDENTIALS", "GOOGLE_CLOUD_PROJECT"],
                config_paths: &["~/.config/gcloud/application_default_credentials.json"],
                install_hint: "install gcspectre and ensure it is on PATH",
            },
        ),
    ])
});

/// Execution info for a tool, if one is registered.
pub fn exec_info(tool: ToolType) -> Option<&'static ToolExecInfo> {
    EXEC_REGISTRY.get(&tool)
}

/// Per-tool discovery result. Produced fresh on each discovery pass and never
/// mutated afterward.
#[derive(Debug, Clone)]
pub struct ToolDiscovery {
    pub tool: ToolType,
    /// Resolved binary path, `None` when not found on PATH.
    pub binary_path: Option<PathBuf>,
    pub available: bool,
    /// (env var name, set and non-empty).
    pub env_vars: Vec<(String, bool)>,
    /// (expanded config path, exists).
    pub config_files: Vec<(PathBuf, bool)>,
    pub has_target: bool,
    pub runnable: bool,
}

/// Ordered snapshot of one discovery pass.
#[derive(Debug, Clone)]
pub struct DiscoveryPlan {
    /// Sorted by tool name for reproducibility across runs.
    pub tools: Vec<ToolDiscovery>,
    pub total_found: usize,
    pub total_runnable: usize,
}

impl DiscoveryPlan {
    /// The subset of tools that can actually be executed.
    pub fn runnable(&self) -> impl Iterator<Item = &ToolDiscovery> {
        self.tools.iter().filter(|t| t.runnable)
    }
}

type LookupFn = Box<dyn Fn(&str) -> Option<PathBuf>>;
type GetenvFn = Box<dyn Fn(&str) -> Option<String>>;

/// Discovery pass over the registered scanners.
pub struct Discovery {
    lookup: LookupFn,
    getenv: GetenvFn,
    home: Option<PathBuf>,
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}

impl Discovery {
    /// Discovery against the real PATH, environment, and home directory.
    pub fn new() -> Self {
        Self {
            lookup: Box::new(find_in_path),
            getenv: Box::new(|name| env::var(name).ok()),
            home: env::var_os("HOME").map(PathBuf::from),
        }
    }

    /// Inject a PATH lookup function (tests).
    pub fn with_lookup(mut self, lookup: impl Fn(&str) -> Option<PathBuf> + 'static) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    /// Inject an environment reader (tests).
    pub fn with_getenv(mut self, getenv: impl Fn(&str) -> Option<String> + 'static) -> Self {
        self.getenv = Box::new(getenv);
        self
    }

    /// Override the home directory used for `~/` expansion.
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    /// Probe every registered tool.
    pub fn discover(&self) -> DiscoveryPlan {
        // BTreeMap iteration over ToolType is already sorted by name.
        let tools: Vec<ToolDiscovery> = EXEC_REGISTRY
            .iter()
            .map(|(&tool, info)| self.probe(tool, info))
            .collect();

        let total_found = tools.iter().filter(|t| t.available).count();
        let total_runnable = tools.iter().filter(|t| t.runnable).count();
        debug!(total_found, total_runnable, "Discovery pass complete");

        DiscoveryPlan {
            tools,
            total_found,
            total_runnable,
        }
    }

    fn probe(&self, tool: ToolType, info: &ToolExecInfo) -> ToolDiscovery {
        let binary_path = (self.lookup)(info.binary);
        let available = binary_path.is_some();

        // Values are only tested for non-emptiness, never logged or kept.
        let env_vars: Vec<(String, bool)> = info
            .env_vars
            .iter()
            .map(|&name| {
                let set = (self.getenv)(name).is_some_and(|v| !v.is_empty());
                (name.to_string(), set)
            })
            .collect();

        let config_files: Vec<(PathBuf, bool)> = info
            .config_paths
            .iter()
            .map(|&raw| {
                let path = self.expand_home(raw);
                let exists = path.exists();
                (path, exists)
            })
            .collect();

        let has_target = env_vars.iter().any(|(_, set)| *set)
            || config_files.iter().any(|(_, exists)| *exists);
        let runnable = available && has_target;

        ToolDiscovery {
            tool,
            binary_path,
            available,
            env_vars,
            config_files,
            has_target,
            runnable,
        }
    }

    fn expand_home(&self, raw: &str) -> PathBuf {
        match (raw.strip_prefix("~/"), &self.home) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(raw),
        }
    }
}

/// Resolve a binary by scanning the `PATH` variable.
fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

/// Sanity check a `ToolExecInfo` entry against the registry invariants.
fn registry_entry_is_well_formed(info: &ToolExecInfo) -> bool {
    !info.binary.is_empty()
        && !info.subcommand.is_empty()
        && !info.json_flag.is_empty()
        && (!info.env_vars.is_empty() || !info.config_paths.is_empty())
}
