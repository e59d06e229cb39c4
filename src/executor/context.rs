//! Caller-side cancellation context
//!
//! A [`CallContext`] pairs a [`CancellationToken`] with an optional deadline.
//! The executor observes it while waiting for a slot and while waiting on the
//! child.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an absolute deadline, keeping the earlier one if already set
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Set a deadline relative to now
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(deadline_after(timeout))
    }

    /// Derive a context cancelled together with this one
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Resolve when the token fires or the deadline passes
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }
}

/// `now + timeout`, saturating at a far-future instant instead of overflowing
pub(crate) fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout).unwrap_or_else(|| now + FAR_FUTURE)
}

/// Roughly 30 years; the same horizon tokio uses for "never"
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);
