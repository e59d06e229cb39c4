//! CLI module for makemcp
//!
//! Provides command-line interface with the following subcommands:
//! - `serve` - Start MCP server over stdio
//! - `run` - Run one make target and print the result JSON
//! - `describe` - Print the tool description
//! - `config` - Show configuration

pub mod commands;
pub mod mcp;

pub use commands::{Cli, Commands};
pub use mcp::run_mcp_server;
