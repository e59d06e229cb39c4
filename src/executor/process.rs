//! Child process plumbing: process groups and pipe capture

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// How long to keep draining pipes after the child is gone
///
/// A descendant that escaped the process group can hold a pipe open forever.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 8 * 1024;

/// Put the child in its own process group so the whole tree can be killed
pub fn isolate_process_group(cmd: &mut Command) {
    #[cfg(unix)]
    {
        cmd.process_group(0);
    }
    #[cfg(not(unix))]
    {
        let _ = cmd;
    }
}

/// Kills the child and its process group on drop unless disarmed
pub struct ProcessGroupGuard {
    child: Child,
    armed: bool,
}

impl ProcessGroupGuard {
    pub fn new(child: Child) -> Self {
        Self { child, armed: true }
    }

    pub fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    /// The child exited on its own; leave the group alone
    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// SIGKILL the whole group, falling back to the direct child
    pub fn kill_group(&mut self) {
        #[cfg(unix)]
        {
            if let Some(pid) = self.child.id() {
                // SAFETY: killpg only sends a signal; pid is our own child's group id.
                let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
                if rc == 0 {
                    return;
                }
                let err = std::io::Error::last_os_error();
                if err.raw_os_error() != Some(libc::ESRCH) {
                    tracing::warn!("killpg({}) failed: {}", pid, err);
                }
            }
        }
        if let Err(e) = self.child.start_kill() {
            tracing::debug!("start_kill failed: {}", e);
        }
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if self.armed {
            self.kill_group();
            let _ = self.child.try_wait();
        }
    }
}

/// Bytes read so far from one pipe, readable even if the reader is aborted
#[derive(Clone, Default)]
pub struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    fn push(&self, bytes: &[u8]) {
        if let Ok(mut buf) = self.buf.lock() {
            buf.extend_from_slice(bytes);
        }
    }

    /// Take the captured bytes as lossy UTF-8
    pub fn take(&self) -> String {
        let bytes = match self.buf.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// A background task draining one pipe into a [`Capture`]
pub struct PipeReader {
    capture: Capture,
    handle: Option<JoinHandle<()>>,
}

impl PipeReader {
    /// Start draining `reader`; `None` yields an empty capture
    pub fn spawn<R>(reader: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let capture = Capture::default();
        let handle = reader.map(|mut reader| {
            let sink = capture.clone();
            tokio::spawn(async move {
                let mut chunk = vec![0u8; READ_CHUNK];
                loop {
                    match reader.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => sink.push(&chunk[..n]),
                        Err(e) => {
                            tracing::warn!("Error reading output: {}", e);
                            break;
                        }
                    }
                }
            })
        });
        Self { capture, handle }
    }

    /// Wait for EOF (bounded by a short grace period) and return the output
    pub async fn finish(mut self) -> String {
        if let Some(handle) = self.handle.take() {
            let abort = handle.abort_handle();
            match tokio::time::timeout(DRAIN_GRACE, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("output reader task failed: {}", e),
                Err(_) => {
                    tracing::debug!("pipe still open after child exit; keeping partial output");
                    abort.abort();
                }
            }
        }
        self.capture.take()
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;

    #[tokio::test]
    async fn test_pipe_reader_none_is_empty() {
        let reader = PipeReader::spawn(None::<tokio::process::ChildStdout>);
        assert_eq!(reader.finish().await, "");
    }

    #[tokio::test]
    async fn test_pipe_reader_collects_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf 'out'; printf 'err' >&2"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(_) => {
                eprintln!("Skipping test: sh not available");
                return;
            }
        };
        let stdout = PipeReader::spawn(child.stdout.take());
        let stderr = PipeReader::spawn(child.stderr.take());
        child.wait().await.unwrap();

        assert_eq!(stdout.finish().await, "out");
        assert_eq!(stderr.finish().await, "err");
    }

    #[test]
    fn test_capture_lossy_utf8() {
        let capture = Capture::default();
        capture.push(b"ok \xff");
        assert_eq!(capture.take(), "ok \u{fffd}");
        assert_eq!(capture.take(), "");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kill_group_reaps_descendants() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 30 & sleep 30"])
            .stdout(Stdio::piped())
            .kill_on_drop(true);
        isolate_process_group(&mut cmd);

        let child = match cmd.spawn() {
            Ok(c) => c,
            Err(_) => {
                eprintln!("Skipping test: sh not available");
                return;
            }
        };
        let mut guard = ProcessGroupGuard::new(child);
        let stdout = PipeReader::spawn(guard.child_mut().stdout.take());

        guard.kill_group();
        let status = guard.child_mut().wait().await.unwrap();
        assert!(!status.success());

        // The background sleep shares the pipe; EOF means it died with the group.
        let started = std::time::Instant::now();
        stdout.finish().await;
        assert!(started.elapsed() < DRAIN_GRACE);
    }
}
