//! Configuration model for makemcp
//!
//! Defines the structure for XDG-compliant layered configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ExecError;
use crate::executor::ExecutorConfig;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Settings for invoking make
    #[serde(default)]
    pub make: MakeConfig,

    /// MCP server identity
    #[serde(default)]
    pub server: ServerConfig,
}

/// Make invocation settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MakeConfig {
    /// Path or name of the make binary (resolved on PATH if not absolute)
    #[serde(default = "default_make_path")]
    pub path: String,

    /// Working directory for make (defaults to the current directory)
    #[serde(default)]
    pub work_dir: Option<String>,

    /// Timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Maximum number of concurrent make processes
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Target whose output describes the Makefile (empty disables)
    #[serde(default = "default_help_target")]
    pub help_target: String,

    /// Text placed before the help listing in the tool description
    #[serde(default)]
    pub preamble: String,
}

fn default_make_path() -> String {
    "make".to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_max_concurrency() -> usize {
    4
}

fn default_help_target() -> String {
    "help".to_string()
}

impl Default for MakeConfig {
    fn default() -> Self {
        Self {
            path: default_make_path(),
            work_dir: None,
            timeout: default_timeout(),
            max_concurrency: default_max_concurrency(),
            help_target: default_help_target(),
            preamble: String::new(),
        }
    }
}

/// MCP server identity
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Name reported to MCP clients
    #[serde(default = "default_server_name")]
    pub name: String,
}

fn default_server_name() -> String {
    "makemcp".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
        }
    }
}

impl MakeConfig {
    /// Help target to run, if help discovery is enabled
    pub fn help_target(&self) -> Option<&str> {
        let target = self.help_target.trim();
        (!target.is_empty()).then_some(target)
    }

    /// Resolve the make binary to an absolute path
    pub fn resolve_make_path(&self) -> Result<PathBuf, ExecError> {
        let expanded = expand(&self.path)?;
        if expanded.as_os_str().is_empty() {
            return Err(ExecError::Config("make.path must not be empty".to_string()));
        }
        if expanded.is_absolute() {
            return Ok(expanded);
        }
        // Bare names go through PATH; relative paths are anchored at the cwd.
        if expanded.components().count() == 1 {
            return which::which(&expanded).map_err(|e| {
                ExecError::Config(format!("make binary '{}' not found: {}", self.path, e))
            });
        }
        absolutize(&expanded)
    }

    /// Resolve the working directory to an absolute path
    pub fn resolve_work_dir(&self) -> Result<PathBuf, ExecError> {
        match self.work_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => absolutize(&expand(dir)?),
            _ => Ok(std::env::current_dir()?),
        }
    }
}

impl Config {
    /// Validate and resolve into executor settings
    ///
    /// # Errors
    /// * `ExecError::Config` - make binary or paths cannot be resolved
    /// * `ExecError::InvalidArgument` - zero timeout or concurrency
    pub fn executor_config(&self) -> Result<ExecutorConfig, ExecError> {
        ExecutorConfig::new(
            self.make.resolve_make_path()?,
            self.make.resolve_work_dir()?,
            Duration::from_secs(self.make.timeout),
            self.make.max_concurrency,
        )
    }
}

/// Expand `~` and `$VAR` references
fn expand(value: &str) -> Result<PathBuf, ExecError> {
    shellexpand::full(value)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| ExecError::Config(format!("cannot expand '{}': {}", value, e)))
}

fn absolutize(path: &Path) -> Result<PathBuf, ExecError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
