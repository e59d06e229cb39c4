//! makemcp - make as an MCP tool
//!
//! Runs targets of a single Makefile on behalf of a caller:
//! - **Bounded** - at most `max_concurrency` make processes at once
//! - **Timed** - each invocation is killed (with its process group) after `timeout`
//! - **Cancellable** - callers can abandon a wait for a slot or a running child
//!
//! The Makefile's own `help` output, trimmed at a `Notes` line and prefixed
//! with a configurable preamble, becomes the server description.
//!
//! ## MCP Tools
//!
//! - `make` - Run a target; returns `stdout`, `stderr`, `exit_code`, `duration_ms`

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod help;
pub mod mcp;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::{ErrorInfo, ExecError};
pub use executor::{
    serialize_result, CallContext, Execution, Executor, ExecutorConfig, MakeParams, MakeResult,
};
pub use help::{compose_description, format_help_preamble, process_help_output};
pub use mcp::MakeServer;
