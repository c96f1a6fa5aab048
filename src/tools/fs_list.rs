use crate::{
    config::Config,
    errors::{into_text, AppError, ToolError, ToolResult},
    mcp::registry::{parse_params, Tool},
    tools::confine,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// One entry of a recursive listing. `size_bytes` of a directory is the sum
/// of the regular files below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub relative_path: PathBuf,
    pub size_bytes: u64,
    pub is_dir: bool,
    pub modified: Option<SystemTime>,
}

impl FileEntry {
    pub fn summary_line(&self) -> String {
        let is_dir = if self.is_dir { "True" } else { "False" };
        format!("- {}: file_size={} bytes, is_dir={}", self.relative_path.display(), self.size_bytes, is_dir)
    }
}

/// Lists everything below `directory` (relative to `root`), one summary
/// line per entry.
pub fn get_files_info(root: &Path, directory: &str) -> String {
    into_text(list_entries(root, directory).map(|entries| {
        entries.iter().map(FileEntry::summary_line).collect::<Vec<_>>().join("\n")
    }))
}

/// Pre-order walk with an explicit stack. Each level yields its directories
/// then its files, both sorted by name. Symlinks are listed, never followed.
pub fn list_entries(root: &Path, directory: &str) -> ToolResult<Vec<FileEntry>> {
    let base = confine(root, directory, "list")?;
    if !base.is_dir() {
        return Err(ToolError::NotADirectory(directory.to_string()));
    }

    let mut entries = Vec::new();
    let mut pending = vec![base.clone()];
    while let Some(dir) = pending.pop() {
        let Some((dirs, files)) = read_level(&dir) else { continue };
        for path in dirs.iter().chain(files.iter()) {
            entries.push(describe(&base, path)?);
        }
        pending.extend(dirs.into_iter().rev());
    }
    Ok(entries)
}

/// Children of `dir` split into (directories, everything else). An
/// unreadable directory contributes nothing.
fn read_level(dir: &Path) -> Option<(Vec<PathBuf>, Vec<PathBuf>)> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) => {
            debug!(path = %dir.display(), error = %e, "skipping unreadable directory");
            return None;
        }
    };
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in read.flatten() {
        match entry.file_type() {
            Ok(t) if t.is_dir() => dirs.push(entry.path()),
            _ => files.push(entry.path()),
        }
    }
    dirs.sort();
    files.sort();
    Some((dirs, files))
}

fn describe(base: &Path, path: &Path) -> ToolResult<FileEntry> {
    let meta = fs::symlink_metadata(path)
        .map_err(|source| ToolError::Unreadable { path: path.display().to_string(), source })?;
    let is_dir = meta.is_dir();
    let size_bytes = if is_dir { dir_size(path) } else { meta.len() };
    Ok(FileEntry {
        name: path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        relative_path: path.strip_prefix(base).unwrap_or(path).to_path_buf(),
        size_bytes,
        is_dir,
        modified: meta.modified().ok(),
    })
}

/// Sum of regular file sizes below `dir`. Unreadable files count as zero.
pub fn dir_size(dir: &Path) -> u64 {
    let mut total = 0;
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let Ok(read) = fs::read_dir(&current) else { continue };
        for entry in read.flatten() {
            match entry.file_type() {
                Ok(t) if t.is_dir() => pending.push(entry.path()),
                Ok(t) if t.is_file() => total += entry.metadata().map(|m| m.len()).unwrap_or(0),
                _ => {}
            }
        }
    }
    total
}

fn default_directory() -> String { ".".to_string() }

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default = "default_directory")]
    directory: String,
}

pub struct FsListTool {
    root: PathBuf,
}

impl FsListTool {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self { root: cfg.root.root_dir.clone() })
    }
}

#[async_trait]
impl Tool for FsListTool {
    fn name(&self) -> &'static str { "get_files_info" }
    fn description(&self) -> &'static str {
        "Lists files in the specified directory along with their sizes, constrained to the working directory."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({"type":"object","properties": {"directory": {"type":"string","description":"The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself."}}})
    }
    async fn call(&self, params: serde_json::Value) -> Result<String, AppError> {
        let p: ListParams = parse_params(params)?;
        let root = self.root.clone();
        // large trees would otherwise stall the runtime
        tokio::task::spawn_blocking(move || get_files_info(&root, &p.directory))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
