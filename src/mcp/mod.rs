//! MCP Server module
//!
//! Provides the `make` tool: run one target of the configured Makefile and
//! return its captured output as JSON.

pub mod server;

pub use server::MakeServer;
