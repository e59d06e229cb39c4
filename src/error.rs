//! Error types for makemcp
//!
//! Every failure of a `make` invocation maps onto one [`ExecError`] variant.
//! The executor attaches the error to a fully populated result instead of
//! replacing it, so callers can always log partial output.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Main error type for executor operations
#[derive(Error, Debug)]
pub enum ExecError {
    /// Empty target or a misconfigured executor
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The OS refused to start the child process
    #[error("Failed to spawn command: {command}")]
    SpawnFailed { command: String, error: String },

    /// The child ran and exited with a non-zero status
    #[error("make exited with status {exit_code}")]
    NonZeroExit { exit_code: i32, stderr: String },

    /// The executor deadline elapsed before the child exited
    #[error("make timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The caller's context was cancelled or its deadline passed
    #[error("make invocation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error while waiting on the child or its pipes
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Result could not be rendered as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExecError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ExecError::InvalidArgument(_) => "invalid_argument",
            ExecError::SpawnFailed { .. } => "spawn_failed",
            ExecError::NonZeroExit { .. } => "non_zero_exit",
            ExecError::Timeout { .. } => "timeout",
            ExecError::Cancelled => "cancelled",
            ExecError::Config(_) => "config_error",
            ExecError::Io(_) => "io_error",
            ExecError::Serialization(_) => "serialization_error",
        }
    }
}

/// Serializable error info for MCP responses
#[derive(Debug, Serialize, Clone)]
pub struct ErrorInfo {
    pub message: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl From<&ExecError> for ErrorInfo {
    fn from(err: &ExecError) -> Self {
        let (suggestion, exit_code) = match err {
            ExecError::InvalidArgument(_) => {
                (Some("Pass a non-empty make target".to_string()), None)
            }
            ExecError::SpawnFailed { error, .. } => (
                Some(format!("Check that [make].path points to a make binary: {}", error)),
                None,
            ),
            ExecError::NonZeroExit { exit_code, stderr } => (suggest_fix(stderr), Some(*exit_code)),
            ExecError::Timeout { .. } => (
                Some("Try increasing [make].timeout or checking if the target hangs".to_string()),
                Some(-1),
            ),
            ExecError::Cancelled => (None, Some(-1)),
            ExecError::Config(_) => (
                Some("Check your makemcp configuration file".to_string()),
                None,
            ),
            ExecError::Io(_) | ExecError::Serialization(_) => (None, None),
        };

        ErrorInfo {
            message: err.to_string(),
            error_type: err.kind().to_string(),
            suggestion,
            exit_code,
        }
    }
}

/// Suggest fixes for common `make` failure patterns
pub fn suggest_fix(stderr: &str) -> Option<String> {
    if stderr.contains("No rule to make target") {
        return Some(
            "Target not found in Makefile. Check the tool description for available targets."
                .to_string(),
        );
    }

    if stderr.contains("No targets specified and no makefile found")
        || stderr.contains("No such file or directory")
    {
        return Some(
            "No Makefile found. Verify [make].work_dir points at the project root.".to_string(),
        );
    }

    if stderr.contains("Permission denied") {
        return Some(
            "Permission denied. Check file permissions or run with appropriate access.".to_string(),
        );
    }

    if stderr.contains("command not found") {
        return Some("A recipe command was not found. Check PATH and dependencies.".to_string());
    }

    None
}
