//! Subprocess execution of discovered scanners.
//!
//! Invocations run one at a time: scanners may share exclusive local state,
//! each is I/O-bound on its own target, and a per-invocation timeout keeps one
//! slow scanner from starving the rest. Every config always yields exactly one
//! [`RunResult`]; individual failures never abort sibling invocations. A
//! `Runner` instance serves one batch at a time.

use crate::discovery::{ToolDiscovery, exec_info};
use crate::schema::ToolType;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Default per-invocation timeout.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(300);

/// One execution request.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub tool: ToolType,
    pub binary: PathBuf,
    pub subcommand: String,
    /// Flag tokens requesting JSON output, space-separated.
    pub json_flag: String,
    pub extra_args: Vec<String>,
    /// Per-invocation timeout; the runner default applies when `None`.
    pub timeout: Option<Duration>,
}

impl RunConfig {
    /// Build a run config from a discovery result. Returns `None` unless the
    /// tool is runnable and registered.
    pub fn from_discovery(discovery: &ToolDiscovery) -> Option<Self> {
        if !discovery.runnable {
            return None;
        }
        let info = exec_info(discovery.tool)?;
        Some(Self {
            tool: discovery.tool,
            binary: discovery.binary_path.clone()?,
            subcommand: info.subcommand.to_string(),
            json_flag: info.json_flag.to_string(),
            extra_args: Vec::new(),
            timeout: None,
        })
    }
}

/// Outcome of one invocation. Immutable once produced.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub tool: ToolType,
    pub success: bool,
    pub output_path: Option<PathBuf>,
    pub duration: Duration,
    pub error: Option<String>,
}

impl RunResult {
    fn failure(tool: ToolType, duration: Duration, error: String) -> Self {
        Self {
            tool,
            success: false,
            output_path: None,
            duration,
            error: Some(error),
        }
    }
}

/// Executes scanner batches, capturing stdout into a per-run temp directory.
pub struct Runner {
    temp_dir: Option<TempDir>,
    default_timeout: Duration,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        Self {
            temp_dir: None,
            default_timeout: DEFAULT_RUN_TIMEOUT,
        }
    }

    /// Set the timeout applied to configs that carry none of their own.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Execute every config sequentially. The output always has the same
    /// length and order as the input, one result per config.
    pub fn run(&mut self, configs: &[RunConfig]) -> Vec<RunResult> {
        if configs.is_empty() {
            return Vec::new();
        }

        // The temp dir is created once per batch; failure to create it fails
        // every pending config as an execution error.
        let dir = match self.ensure_temp_dir() {
            Ok(dir) => dir,
            Err(e) => {
                return configs
                    .iter()
                    .map(|cfg| {
                        RunResult::failure(
                            cfg.tool,
                            Duration::ZERO,
                            format!("failed to create output directory: {e}"),
                        )
                    })
                    .collect();
            }
        };

        configs
            .iter()
            .map(|cfg| {
                let timeout = cfg.timeout.unwrap_or(self.default_timeout);
                let result = run_one(cfg, &dir, timeout);
                if let Some(ref error) = result.error {
                    warn!(tool = %cfg.tool, error, "Scanner invocation failed");
                } else {
                    debug!(tool = %cfg.tool, duration = ?result.duration, "Scanner finished");
                }
                result
            })
            .collect()
    }

    /// Output files written by the current batch, for feeding the collector.
    pub fn output_files(&self) -> Vec<PathBuf> {
        let Some(ref dir) = self.temp_dir else {
            return Vec::new();
        };
        let Ok(entries) = fs::read_dir(dir.path()) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        files.sort();
        files
    }

    /// Remove the temp directory. Idempotent; safe when nothing was created.
    pub fn cleanup(&mut self) {
        if let Some(dir) = self.temp_dir.take()
            && let Err(e) = dir.close()
        {
            warn!(error = %e, "Failed to remove runner temp directory");
        }
    }

    fn ensure_temp_dir(&mut self) -> std::io::Result<PathBuf> {
        if let Some(ref dir) = self.temp_dir {
            return Ok(dir.path().to_path_buf());
        }
        let dir = TempDir::new()?;
        let path = dir.path().to_path_buf();
        self.temp_dir = Some(dir);
        Ok(path)
    }
}

fn run_one(cfg: &RunConfig, dir: &Path, timeout: Duration) -> RunResult {
    let start = Instant::now();

    let mut args: Vec<&str> = vec![cfg.subcommand.as_str()];
    args.extend(cfg.json_flag.split_whitespace());
    args.extend(cfg.extra_args.iter().map(String::as_str));

    let mut child = match Command::new(&cfg.binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return RunResult::failure(
                cfg.tool,
                start.elapsed(),
                format!("failed to spawn {}: {e}", cfg.binary.display()),
            );
        }
    };

    // Drain both pipes from threads so a chatty scanner cannot deadlock on a
    // full pipe buffer while we wait.
    let stdout_reader = spawn_pipe_reader(child.stdout.take());
    let stderr_reader = spawn_pipe_reader(child.stderr.take());

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            drain(stdout_reader);
            drain(stderr_reader);
            return RunResult::failure(
                cfg.tool,
                start.elapsed(),
                format!("timed out after {timeout:?}"),
            );
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            drain(stdout_reader);
            drain(stderr_reader);
            return RunResult::failure(cfg.tool, start.elapsed(), format!("wait failed: {e}"));
        }
    };

    let stdout = drain(stdout_reader);
    let stderr = drain(stderr_reader);

    if !status.success() {
        let detail = String::from_utf8_lossy(&stderr);
        return RunResult::failure(
            cfg.tool,
            start.elapsed(),
            format!(
                "exited with {}: {}",
                status.code().map_or("signal".to_string(), |c| c.to_string()),
                detail.trim()
            ),
        );
    }

    let output_path = dir.join(format!("{}.json", cfg.tool.name()));
    if let Err(e) = write_owner_only(&output_path, &stdout) {
        return RunResult::failure(
            cfg.tool,
            start.elapsed(),
            format!("failed to write {}: {e}", output_path.display()),
        );
    }

    RunResult {
        tool: cfg.tool,
        success: true,
        output_path: Some(output_path),
        duration: start.elapsed(),
        error: None,
    }
}

fn spawn_pipe_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> Option<thread::JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn drain(handle: Option<thread::JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Write captured scanner output with owner-only permissions.
fn write_owner_only(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut opts = fs::OpenOptions::new();
    opts.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts.open(path)?;
    file.write_all(bytes)
}
