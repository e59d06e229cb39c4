//! Request, configuration and result types for the make executor

use std::path::{Path, PathBuf};
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::error::ExecError;

/// Exit code reported when the child never produced a status under our control
pub const NO_EXIT_STATUS: i32 = -1;

/// Immutable executor settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Absolute path to the make binary
    pub make_path: PathBuf,
    /// Absolute working directory for every child
    pub default_work_dir: PathBuf,
    /// Upper bound on a single invocation
    pub timeout: Duration,
    /// Maximum number of children alive at once
    pub max_concurrency: usize,
}

impl ExecutorConfig {
    /// Build and validate a configuration
    ///
    /// # Errors
    /// * `ExecError::InvalidArgument` - empty or relative paths, zero timeout,
    ///   or a concurrency outside `1..=Semaphore::MAX_PERMITS`
    pub fn new(
        make_path: impl Into<PathBuf>,
        default_work_dir: impl Into<PathBuf>,
        timeout: Duration,
        max_concurrency: usize,
    ) -> Result<Self, ExecError> {
        let config = Self {
            make_path: make_path.into(),
            default_work_dir: default_work_dir.into(),
            timeout,
            max_concurrency,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the executor relies on
    pub fn validate(&self) -> Result<(), ExecError> {
        check_absolute("make path", &self.make_path)?;
        check_absolute("working directory", &self.default_work_dir)?;

        if self.timeout.is_zero() {
            return Err(ExecError::InvalidArgument(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(ExecError::InvalidArgument(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_concurrency > Semaphore::MAX_PERMITS {
            return Err(ExecError::InvalidArgument(format!(
                "max_concurrency must be at most {}",
                Semaphore::MAX_PERMITS
            )));
        }
        Ok(())
    }
}

fn check_absolute(what: &str, path: &Path) -> Result<(), ExecError> {
    if path.as_os_str().is_empty() {
        return Err(ExecError::InvalidArgument(format!("{} must not be empty", what)));
    }
    if !path.is_absolute() {
        return Err(ExecError::InvalidArgument(format!(
            "{} must be absolute: {}",
            what,
            path.display()
        )));
    }
    Ok(())
}

/// Parameters for one make invocation
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct MakeParams {
    /// Make target to run (e.g., "build", "test")
    pub target: String,
}

impl MakeParams {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

/// Captured outcome of one make invocation
///
/// Serializes to exactly `stdout`, `stderr`, `exit_code` and `duration_ms`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MakeResult {
    /// Standard output (lossy UTF-8)
    pub stdout: String,
    /// Standard error (lossy UTF-8)
    pub stderr: String,
    /// Child exit status, or `-1` when none was observed
    pub exit_code: i32,
    /// Wall-clock time from spawn to termination
    pub duration_ms: u64,
}

impl MakeResult {
    /// Result for an invocation that never spawned a child
    pub fn unstarted() -> Self {
        Self {
            exit_code: NO_EXIT_STATUS,
            ..Default::default()
        }
    }
}

/// Render a result as compact JSON
pub fn serialize_result(result: &MakeResult) -> Result<String, ExecError> {
    Ok(serde_json::to_string(result)?)
}

/// A result paired with the error that accompanied it, if any
#[derive(Debug)]
pub struct Execution {
    pub result: MakeResult,
    pub error: Option<ExecError>,
}

impl Execution {
    pub(crate) fn completed(result: MakeResult) -> Self {
        Self {
            result,
            error: None,
        }
    }

    pub(crate) fn failed(result: MakeResult, error: ExecError) -> Self {
        Self {
            result,
            error: Some(error),
        }
    }

    /// True when the child exited with status 0
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Round a duration to whole milliseconds
pub(crate) fn round_millis(duration: Duration) -> u64 {
    (duration.as_secs_f64() * 1000.0).round() as u64
}
