//! Root-confined file and script tools for agent tool-calling loops.
//!
//! Every operation resolves its path through [`tools::ensure_within_root`]
//! before touching the filesystem, and always answers with text: failures
//! are returned as strings starting with `Error:`.

pub mod config;
pub mod errors;
pub mod logging;
pub mod mcp;
pub mod security;
pub mod server;
pub mod tools;


pub use tools::exec::{run_python_file, ExecOptions, ExecutionResult};
pub use tools::fs_list::{get_files_info, FileEntry};
pub use tools::fs_read::{get_file_content, MAX_FILE_LENGTH};
pub use tools::ensure_within_root;
