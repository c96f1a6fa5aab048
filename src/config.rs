use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub root: Root,
    pub server: Server,
    pub auth: Auth,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub exec: Exec,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Root { pub root_dir: PathBuf }

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub bind_addr: String,
    pub port: u16,
    #[serde(default = "default_base_path")]
    pub base_path: String,
}
fn default_base_path() -> String { "/tools".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct Auth {
    pub bearer_token: String,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Limits {
    #[serde(default = "default_max_file_length")]
    pub max_file_length: usize,
    #[serde(default = "default_exec_timeout_s")]
    pub exec_timeout_s: u64,
    #[serde(default = "default_max_request_kb")]
    pub max_request_kb: usize,
}
fn default_max_file_length() -> usize { crate::tools::fs_read::MAX_FILE_LENGTH }
fn default_exec_timeout_s() -> u64 { 30 }
fn default_max_request_kb() -> usize { 64 }

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_length: default_max_file_length(),
            exec_timeout_s: default_exec_timeout_s(),
            max_request_kb: default_max_request_kb(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Exec {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Variables forwarded to the child; everything else is cleared.
    #[serde(default = "default_pass_env")]
    pub pass_env: Vec<String>,
}
fn default_interpreter() -> String { "python3".to_string() }
fn default_pass_env() -> Vec<String> { vec!["PATH".into(), "HOME".into(), "LANG".into()] }

impl Default for Exec {
    fn default() -> Self {
        Self { interpreter: default_interpreter(), pass_env: default_pass_env() }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.root.root_dir.is_dir() {
            anyhow::bail!("root_dir does not exist or is not a directory: {}", self.root.root_dir.display());
        }
        if self.auth.bearer_token.trim().is_empty() { anyhow::bail!("bearer_token must not be empty"); }
        if self.auth.allowed_origins.is_empty() { anyhow::bail!("allowed_origins must not be empty"); }
        if self.limits.max_file_length == 0 { anyhow::bail!("max_file_length must be > 0"); }
        if self.limits.exec_timeout_s == 0 { anyhow::bail!("exec_timeout_s must be > 0"); }
        if self.limits.max_request_kb == 0 { anyhow::bail!("max_request_kb must be > 0"); }
        if self.exec.interpreter.trim().is_empty() { anyhow::bail!("interpreter must not be empty"); }
        Ok(())
    }
}
