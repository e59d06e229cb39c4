//! Common test utilities for makemcp tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use makemcp::{Executor, ExecutorConfig};
use tempfile::TempDir;

/// Creates a temporary directory with a Makefile
pub fn create_makefile_project(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let makefile_path = dir.path().join("Makefile");
    std::fs::write(&makefile_path, content).expect("Failed to write Makefile");
    let path = dir.path().to_path_buf();
    (dir, path)
}

/// Absolute path of `make`, or None (and a skip notice) when unavailable
pub fn make_path() -> Option<PathBuf> {
    match which::which("make") {
        Ok(path) => Some(path),
        Err(_) => {
            eprintln!("Skipping test: make not found in PATH");
            None
        }
    }
}

/// Executor running the system make in `dir`
pub fn executor_in(dir: &Path, timeout: Duration, max_concurrency: usize) -> Option<Executor> {
    let make = make_path()?;
    let config = ExecutorConfig::new(make, dir, timeout, max_concurrency)
        .expect("valid executor config");
    Some(Executor::new(config).expect("executor"))
}

/// Sample Makefile content for testing
pub const SAMPLE_MAKEFILE: &str = "\
.PHONY: hello slow chatty tree nap both stdin env
hello:
\t@echo \"Hello from test\"

slow:
\t@sleep 10

chatty:
\t@echo started; sleep 10

tree:
\t@sleep 10 & sleep 10

nap:
\t@sleep 0.2

both:
\t@echo out; echo err >&2

stdin:
\t@cat

env:
\t@echo \"$$MAKEMCP_TEST_VAR\"
";

/// Makefile whose target records how many siblings are running
pub const COUNTING_MAKEFILE: &str = "\
.PHONY: work
work:
\t@touch running/$$$$; ls running | wc -l >> counts; sleep 0.3; rm -f running/$$$$
";

/// A `make help` listing with a trailer
pub const HELP_MAKEFILE: &str = "\
.PHONY: help hello
help:
\t@echo 'Usage:'
\t@echo '  make <target>'
\t@echo ''
\t@echo 'Targets:'
\t@echo '  hello  Print a greeting'
\t@echo ''
\t@echo 'Notes'
\t@echo ''
\t@echo 'Run from the repository root.'
hello:
\t@echo 'Hello from test'
";
