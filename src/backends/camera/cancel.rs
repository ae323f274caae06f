// SPDX-License-Identifier: GPL-3.0-only

//! Cancellation for blocking capture calls
//!
//! A [`CancellationToken`] combines a shared stop flag with an optional
//! deadline. Blocking operations check it before every poll and while
//! sleeping, so a cancel or an expired deadline is observed within
//! [`CANCEL_CHECK_INTERVAL`](crate::constants::polling::CANCEL_CHECK_INTERVAL).

use crate::constants::polling::CANCEL_CHECK_INTERVAL;
use crate::errors::{CameraError, CameraResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Cloneable cancel signal with an optional deadline
///
/// Clones share the stop flag: cancelling one cancels all.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    stop_signal: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    /// Token that only fires when [`cancel`](Self::cancel) is called
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that also fires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().child_with_timeout(timeout)
    }

    /// Token sharing this one's stop flag, expiring at the earlier deadline
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            stop_signal: Arc::clone(&self.stop_signal),
            deadline: Some(self.deadline.map_or(deadline, |d| d.min(deadline))),
        }
    }

    pub fn cancel(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Error if cancelled or past the deadline
    pub fn check(&self) -> CameraResult<()> {
        if self.is_cancelled() {
            return Err(CameraError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(CameraError::Timeout("deadline exceeded".into()))
            }
            _ => Ok(()),
        }
    }

    /// Sleep for `duration`, waking early with an error when the token fires
    pub fn sleep(&self, duration: Duration) -> CameraResult<()> {
        let end = Instant::now() + duration;
        loop {
            self.check()?;
            let now = Instant::now();
            if now >= end {
                return Ok(());
            }
            let mut step = (end - now).min(CANCEL_CHECK_INTERVAL);
            if let Some(deadline) = self.deadline {
                step = step.min(deadline.saturating_duration_since(now));
            }
            thread::sleep(step);
        }
    }
}
