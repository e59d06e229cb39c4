//! Bounded-concurrency make executor
//!
//! Each call to [`Executor::execute`]:
//! - waits for one of `max_concurrency` slots (cancellable)
//! - runs `make <target>` in the configured directory, in its own process group
//! - drains stdout and stderr concurrently while waiting on the child
//! - kills the whole group when the deadline or the caller's context fires
//!
//! A [`MakeResult`] is produced on every path; failures ride alongside it.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::time::Instant;

use super::context::{deadline_after, CallContext};
use super::process::{isolate_process_group, PipeReader, ProcessGroupGuard};
use super::types::{
    round_millis, Execution, ExecutorConfig, MakeParams, MakeResult, NO_EXIT_STATUS,
};
use crate::error::ExecError;

/// Runs make targets with a timeout and a cap on parallel children
#[derive(Debug, Clone)]
pub struct Executor {
    config: Arc<ExecutorConfig>,
    slots: Arc<Semaphore>,
}

/// Which bound produced the effective deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeadlineSource {
    Executor,
    Caller,
}

enum WaitOutcome {
    Exited(std::io::Result<ExitStatus>),
    DeadlineElapsed,
    Cancelled,
}

impl Executor {
    /// Create an executor; the configuration is validated first
    pub fn new(config: ExecutorConfig) -> Result<Self, ExecError> {
        config.validate()?;
        let slots = Arc::new(Semaphore::new(config.max_concurrency));
        Ok(Self {
            config: Arc::new(config),
            slots,
        })
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Slots currently free
    pub fn available_permits(&self) -> usize {
        self.slots.available_permits()
    }

    /// Run `make <target>` and capture its outcome
    pub async fn execute(&self, ctx: &CallContext, params: &MakeParams) -> Execution {
        if params.target.is_empty() {
            return Execution::failed(
                MakeResult::unstarted(),
                ExecError::InvalidArgument("target must not be empty".to_string()),
            );
        }

        let _permit = tokio::select! {
            biased;
            _ = ctx.done() => {
                tracing::debug!(make_target = %params.target, "cancelled while waiting for a slot");
                return Execution::failed(MakeResult::unstarted(), ExecError::Cancelled);
            }
            permit = self.slots.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return Execution::failed(MakeResult::unstarted(), ExecError::Cancelled),
            },
        };

        let (deadline, source) = self.derive_deadline(ctx);
        self.run(ctx, &params.target, deadline, source).await
    }

    fn derive_deadline(&self, ctx: &CallContext) -> (Instant, DeadlineSource) {
        let own = deadline_after(self.config.timeout);
        match ctx.deadline() {
            Some(caller) if caller < own => (caller, DeadlineSource::Caller),
            _ => (own, DeadlineSource::Executor),
        }
    }

    async fn run(
        &self,
        ctx: &CallContext,
        target: &str,
        deadline: Instant,
        source: DeadlineSource,
    ) -> Execution {
        let make_path = &self.config.make_path;

        let mut cmd = Command::new(make_path);
        cmd.arg(target)
            .current_dir(&self.config.default_work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        isolate_process_group(&mut cmd);

        tracing::debug!(
            make = %make_path.display(),
            make_target = %target,
            cwd = %self.config.default_work_dir.display(),
            "spawning make"
        );

        let started = Instant::now();
        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                let result = MakeResult {
                    duration_ms: round_millis(started.elapsed()),
                    ..MakeResult::unstarted()
                };
                return Execution::failed(
                    result,
                    ExecError::SpawnFailed {
                        command: format!("{} {}", make_path.display(), target),
                        error: e.to_string(),
                    },
                );
            }
        };

        let mut guard = ProcessGroupGuard::new(child);
        let stdout = PipeReader::spawn(guard.child_mut().stdout.take());
        let stderr = PipeReader::spawn(guard.child_mut().stderr.take());

        let outcome = tokio::select! {
            status = guard.child_mut().wait() => WaitOutcome::Exited(status),
            _ = tokio::time::sleep_until(deadline) => WaitOutcome::DeadlineElapsed,
            _ = ctx.token().cancelled() => WaitOutcome::Cancelled,
        };

        let (exit_code, mut error) = match outcome {
            WaitOutcome::Exited(Ok(status)) => {
                guard.disarm();
                match status.code() {
                    Some(0) => (0, None),
                    code => {
                        let exit_code = code.unwrap_or(NO_EXIT_STATUS);
                        let error = ExecError::NonZeroExit {
                            exit_code,
                            stderr: String::new(),
                        };
                        (exit_code, Some(error))
                    }
                }
            }
            WaitOutcome::Exited(Err(e)) => {
                guard.kill_group();
                reap(&mut guard).await;
                (NO_EXIT_STATUS, Some(ExecError::Io(e)))
            }
            WaitOutcome::DeadlineElapsed => {
                guard.kill_group();
                reap(&mut guard).await;
                let error = match source {
                    DeadlineSource::Executor => {
                        tracing::warn!(
                            make_target = %target,
                            timeout = ?self.config.timeout,
                            "make timed out; killed process group"
                        );
                        ExecError::Timeout {
                            timeout: self.config.timeout,
                        }
                    }
                    DeadlineSource::Caller => {
                        tracing::debug!(make_target = %target, "caller deadline passed; killed process group");
                        ExecError::Cancelled
                    }
                };
                (NO_EXIT_STATUS, Some(error))
            }
            WaitOutcome::Cancelled => {
                guard.kill_group();
                reap(&mut guard).await;
                tracing::debug!(make_target = %target, "cancellation requested; killed process group");
                (NO_EXIT_STATUS, Some(ExecError::Cancelled))
            }
        };
        let duration_ms = round_millis(started.elapsed());

        let result = MakeResult {
            stdout: stdout.finish().await,
            stderr: stderr.finish().await,
            exit_code,
            duration_ms,
        };

        if let Some(ExecError::NonZeroExit { stderr, .. }) = error.as_mut() {
            stderr.clone_from(&result.stderr);
        }

        match error {
            None => Execution::completed(result),
            Some(error) => Execution::failed(result, error),
        }
    }
}

/// Collect the killed child's status so it does not linger as a zombie
async fn reap(guard: &mut ProcessGroupGuard) {
    if let Err(e) = guard.child_mut().wait().await {
        tracing::warn!("failed to reap killed make process: {}", e);
    }
    guard.disarm();
}
