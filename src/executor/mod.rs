//! Make execution module
//!
//! Provides the bounded-concurrency executor with:
//! - Per-invocation timeout and caller cancellation
//! - Separate stdout/stderr capture
//! - Process-group kill on timeout
//! - Compact JSON rendering of results

pub mod context;
pub mod process;
pub mod runner;
pub mod types;

pub use context::CallContext;
pub use runner::Executor;
pub use types::*;
