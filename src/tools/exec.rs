use crate::{
    config::Config,
    errors::{into_text, AppError, ToolError, ToolResult},
    mcp::registry::{parse_params, Tool},
    tools::confine,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::{
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::Instant,
};
use tokio::{
    process::Command,
    time::{timeout, Duration},
};
use tracing::{info, warn};

pub const SCRIPT_SUFFIX: &str = ".py";
pub const NO_OUTPUT: &str = "No output produced.";

/// How scripts are launched. One interpreter, never a shell.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub interpreter: String,
    pub pass_env: Vec<String>,
    pub timeout: Duration,
}

impl Default for ExecOptions {
    fn default() -> Self {
        let exec = crate::config::Exec::default();
        Self { interpreter: exec.interpreter, pass_env: exec.pass_env, timeout: Duration::from_secs(30) }
    }
}

impl ExecOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            interpreter: cfg.exec.interpreter.clone(),
            pass_env: cfg.exec.pass_env.clone(),
            timeout: Duration::from_secs(cfg.limits.exec_timeout_s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Text handed back to the agent. A timed out run has no partial output.
    pub fn render(&self) -> ToolResult<String> {
        if self.timed_out {
            return Err(ToolError::Timeout);
        }
        if self.stdout.is_empty() && self.stderr.is_empty() && self.exit_code == 0 {
            return Ok(NO_OUTPUT.to_string());
        }
        let mut text = format!("STDOUT: {} STDERR: {}", self.stdout, self.stderr);
        if self.exit_code != 0 {
            text.insert_str(0, &format!(" Process exited with code {}\n", self.exit_code));
        }
        Ok(text)
    }
}

pub async fn run_python_file(root: &Path, file_path: &str, args: &[String], opts: &ExecOptions) -> String {
    into_text(execute(root, file_path, args, opts).await.and_then(|r| r.render()))
}

/// Validates the target then runs `interpreter <file> <args..>` with the
/// root as working directory. Nothing is spawned unless every check passes.
pub async fn execute(root: &Path, file_path: &str, args: &[String], opts: &ExecOptions) -> ToolResult<ExecutionResult> {
    let full = confine(root, file_path, "execute")?;
    if !full.exists() {
        return Err(ToolError::NotFound(file_path.to_string()));
    }
    let is_script = full.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.ends_with(SCRIPT_SUFFIX));
    if !is_script {
        return Err(ToolError::WrongExtension(file_path.to_string()));
    }
    if full.is_dir() {
        return Err(ToolError::IsDirectory(file_path.to_string()));
    }

    let workdir = dunce::canonicalize(root)?;
    let program = resolve_interpreter(&opts.interpreter)?;

    let mut command = Command::new(&program);
    command.arg(&full);
    command.args(args);
    command.current_dir(&workdir);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());
    // dropping the child on timeout kills it
    command.kill_on_drop(true);
    command.env_clear();
    for k in &opts.pass_env {
        if let Ok(v) = std::env::var(k) {
            command.env(k, v);
        }
    }

    let start = Instant::now();
    let child = command.spawn().map_err(|e| ToolError::Spawn(e.to_string()))?;
    let output = match timeout(opts.timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(ToolError::Spawn(e.to_string())),
        Err(_) => {
            warn!(file = file_path, timeout_s = opts.timeout.as_secs(), "script timed out");
            return Ok(ExecutionResult { timed_out: true, ..Default::default() });
        }
    };

    let result = ExecutionResult {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: exit_code(output.status),
        timed_out: false,
    };
    info!(
        file = file_path,
        exit_code = result.exit_code,
        duration_ms = start.elapsed().as_millis() as u64,
        stdout_len = result.stdout.len(),
        stderr_len = result.stderr.len(),
        "script finished"
    );
    Ok(result)
}

fn resolve_interpreter(cmd: &str) -> ToolResult<PathBuf> {
    let path = if cmd.contains('/') {
        PathBuf::from(cmd)
    } else {
        which::which(cmd).map_err(|e| ToolError::Spawn(format!("{cmd}: {e}")))?
    };
    dunce::canonicalize(&path).map_err(|e| ToolError::Spawn(format!("{}: {e}", path.display())))
}

/// Signal deaths report the negated signal number.
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return -sig;
        }
    }
    status.code().unwrap_or(-1)
}

#[derive(Debug, Deserialize)]
struct ExecParams {
    file_path: String,
    #[serde(default)]
    args: Vec<String>,
}

pub struct ExecTool {
    root: PathBuf,
    opts: ExecOptions,
}

impl ExecTool {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self { root: cfg.root.root_dir.clone(), opts: ExecOptions::from_config(cfg) })
    }
}

#[async_trait]
impl Tool for ExecTool {
    fn name(&self) -> &'static str { "run_python_file" }
    fn description(&self) -> &'static str {
        "Executes a Python file within the working directory and returns its output. The file must have a .py extension."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({"type":"object","required":["file_path"],"properties": {
            "file_path": {"type":"string","description":"Path to the Python file relative to the working directory."},
            "args": {"type":"array","items":{"type":"string"},"description":"List of arguments to pass to the Python script."}
        }})
    }

    async fn call(&self, params: serde_json::Value) -> Result<String, AppError> {
        let p: ExecParams = parse_params(params)?;
        Ok(run_python_file(&self.root, &p.file_path, &p.args, &self.opts).await)
    }
}
