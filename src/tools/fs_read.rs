use crate::{
    config::Config,
    errors::{into_text, AppError, ToolError, ToolResult},
    mcp::registry::{parse_params, Tool},
    tools::confine,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of characters returned before the truncation marker.
pub const MAX_FILE_LENGTH: usize = 10_000;

/// Reads a regular file under `root` as UTF-8 text, cut down to `max_len`
/// characters. The result is always text; failures start with `Error:`.
pub fn get_file_content(root: &Path, file_path: &str, max_len: usize) -> String {
    into_text(read_content(root, file_path, max_len))
}

pub fn read_content(root: &Path, file_path: &str, max_len: usize) -> ToolResult<String> {
    let full = confine(root, file_path, "access")?;
    if !full.is_file() {
        return Err(ToolError::NotAFile(file_path.to_string()));
    }
    let content = fs::read_to_string(&full)?;
    Ok(truncate(content, file_path, max_len))
}

/// Keeps the first `max_len` characters and appends the marker. The marker
/// does not count against the limit.
pub fn truncate(mut content: String, file_path: &str, max_len: usize) -> String {
    if let Some((cut, _)) = content.char_indices().nth(max_len) {
        content.truncate(cut);
        content.push_str(&truncation_marker(file_path, max_len));
    }
    content
}

pub fn truncation_marker(file_path: &str, max_len: usize) -> String {
    format!("\n[...File \"{file_path}\" truncated at {max_len} characters]")
}

#[derive(Debug, Deserialize)]
struct ReadParams {
    file_path: String,
}

pub struct FsReadTool {
    root: PathBuf,
    max_len: usize,
}

impl FsReadTool {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self { root: cfg.root.root_dir.clone(), max_len: cfg.limits.max_file_length })
    }
}

#[async_trait]
impl Tool for FsReadTool {
    fn name(&self) -> &'static str { "get_file_content" }
    fn description(&self) -> &'static str {
        "Reads the content of a file within the working directory. Returns the file's text content, truncated if it exceeds a configured maximum length."
    }
    fn parameters(&self) -> serde_json::Value {
        json!({"type":"object","required":["file_path"],"properties": {"file_path": {"type":"string","description":"Path to the file relative to the working directory."}}})
    }
    async fn call(&self, params: serde_json::Value) -> Result<String, AppError> {
        let p: ReadParams = parse_params(params)?;
        Ok(get_file_content(&self.root, &p.file_path, self.max_len))
    }
}
