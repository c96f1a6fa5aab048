use axum::{http::StatusCode, Json};
use serde::Serialize;
use std::io;
use thiserror::Error;

/// Request-level failures of the HTTP surface. Tool failures never use this
/// type; they travel back to the caller as `Error:` text.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("origin denied")]
    OriginDenied,
    #[error("request too large")]
    RequestTooLarge,
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "Unauthorized",
            AppError::OriginDenied => "OriginDenied",
            AppError::RequestTooLarge => "RequestTooLarge",
            AppError::UnknownTool(_) => "UnknownTool",
            AppError::InvalidParams(_) => "InvalidParams",
            AppError::Internal(_) => "Internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::OriginDenied => StatusCode::FORBIDDEN,
            AppError::RequestTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::UnknownTool(_) => StatusCode::NOT_FOUND,
            AppError::InvalidParams(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

pub fn into_response(err: AppError) -> (StatusCode, Json<ErrorBody>) {
    let body = ErrorBody { code: err.code(), message: err.to_string() };
    (err.status(), Json(body))
}

/// Everything that can go wrong inside a tool. The display text is what the
/// caller sees after the `Error: ` prefix, so the wording is part of the
/// contract.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Cannot {verb} \"{path}\" as it is outside the permitted working directory")]
    OutsideRoot { verb: &'static str, path: String },
    #[error("\"{0}\" is not a directory")]
    NotADirectory(String),
    #[error("File not found or is not a regular file: \"{0}\"")]
    NotAFile(String),
    #[error("File \"{0}\" not found.")]
    NotFound(String),
    #[error("\"{0}\" is not a Python file.")]
    WrongExtension(String),
    #[error("\"{0}\" is a directory, not a file")]
    IsDirectory(String),
    #[error("Unable to access {path}: {source}")]
    Unreadable { path: String, source: io::Error },
    #[error("Running file timed out")]
    Timeout,
    #[error("Running file: {0}")]
    Spawn(String),
    #[error("{0}")]
    Io(#[from] io::Error),
}

impl ToolError {
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::OutsideRoot { .. } => "PathOutsideRoot",
            ToolError::NotADirectory(_) | ToolError::NotAFile(_) | ToolError::IsDirectory(_) => "WrongType",
            ToolError::NotFound(_) => "NotFound",
            ToolError::WrongExtension(_) => "WrongExtension",
            ToolError::Unreadable { .. } | ToolError::Io(_) => "Io",
            ToolError::Timeout => "ExecTimeout",
            ToolError::Spawn(_) => "ExecFailed",
        }
    }

    /// Text form handed back to the agent.
    pub fn to_text(&self) -> String {
        format!("Error: {self}")
    }
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Collapses a tool result into the text channel.
pub fn into_text(result: ToolResult<String>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(code = e.code(), error = %e, "tool error");
            e.to_text()
        }
    }
}
