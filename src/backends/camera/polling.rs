// SPDX-License-Identifier: GPL-3.0-only

//! Frame polling retry policy
//!
//! Devices may hand out zero-length payloads while warming up or when no
//! buffer is ready. Backends retry up to `attempts_per_fps * round(fps)`
//! times, sleeping one frame interval between empty polls, and give up with
//! [`CameraError::FrameNotDelivered`].

use super::cancel::CancellationToken;
use crate::constants::polling::ATTEMPTS_PER_FPS;
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::Fraction;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// How hard backends try before reporting a missing frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingPolicy {
    /// Attempts per unit of rounded frame rate
    pub attempts_per_fps: u32,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            attempts_per_fps: ATTEMPTS_PER_FPS,
        }
    }
}

impl PollingPolicy {
    /// Attempt budget at `fps`; zero for non-finite or non-positive rates
    pub fn attempts_for(&self, fps: f64) -> u32 {
        if !fps.is_finite() || fps <= 0.0 {
            return 0;
        }
        (fps.round() as u32).saturating_mul(self.attempts_per_fps)
    }

    /// One frame interval at `fps`
    pub fn interval_for(fps: f64) -> Duration {
        if !fps.is_finite() || fps <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(1.0 / fps)
    }

    /// Poller for a negotiated frame rate
    pub fn poller(&self, fps: Fraction) -> FramePoller {
        let fps = fps.as_f64();
        FramePoller::new(self.attempts_for(fps), Self::interval_for(fps))
    }
}

/// Bounded retry loop around a non-blocking frame poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePoller {
    attempts: u32,
    interval: Duration,
}

impl FramePoller {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Same budget with a different pause between empty polls
    pub fn with_interval(self, interval: Duration) -> Self {
        Self { interval, ..self }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Call `poll` until it yields a value, errors, or the budget runs out
    ///
    /// `Ok(None)` from `poll` means "not ready yet". The token is checked
    /// before each poll and during sleeps; no sleep follows the last attempt.
    pub fn poll<T, F>(&self, token: &CancellationToken, mut poll: F) -> CameraResult<T>
    where
        F: FnMut() -> CameraResult<Option<T>>,
    {
        for attempt in 1..=self.attempts {
            token.check()?;
            if let Some(value) = poll()? {
                if attempt > 1 {
                    debug!(attempt, "Frame ready after retries");
                }
                return Ok(value);
            }
            if attempt < self.attempts {
                token.sleep(self.interval)?;
            }
        }
        Err(CameraError::FrameNotDelivered {
            attempts: self.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_attempt_budget() {
        let policy = PollingPolicy::default();
        assert_eq!(policy.attempts_for(10.0), 100);
        assert_eq!(policy.attempts_for(29.97), 300);
        assert_eq!(policy.attempts_for(0.0), 0);
        assert_eq!(policy.attempts_for(f64::INFINITY), 0);
        assert_eq!(policy.attempts_for(f64::NAN), 0);
    }

    #[test]
    fn test_interval() {
        assert_eq!(PollingPolicy::interval_for(10.0), Duration::from_millis(100));
        assert_eq!(PollingPolicy::interval_for(0.0), Duration::ZERO);
    }

    #[test]
    fn test_gives_up_after_budget() {
        let poller = PollingPolicy::default()
            .poller(Fraction::new(10, 1))
            .with_interval(Duration::ZERO);
        let mut calls = 0;
        let result: CameraResult<()> = poller.poll(&CancellationToken::new(), || {
            calls += 1;
            Ok(None)
        });
        assert_eq!(calls, 100);
        assert!(matches!(
            result,
            Err(CameraError::FrameNotDelivered { attempts: 100 })
        ));
    }

    #[test]
    fn test_returns_first_ready_value() {
        let poller = FramePoller::new(5, Duration::ZERO);
        let mut calls = 0;
        let value = poller
            .poll(&CancellationToken::new(), || {
                calls += 1;
                Ok((calls == 3).then_some(calls))
            })
            .unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn test_cancelled_before_first_poll() {
        let token = CancellationToken::new();
        token.cancel();
        let poller = FramePoller::new(5, Duration::ZERO);
        let mut calls = 0;
        let err = poller
            .poll(&token, || -> CameraResult<Option<()>> {
                calls += 1;
                Ok(None)
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_poll_error_propagates() {
        let poller = FramePoller::new(5, Duration::ZERO);
        let err = poller
            .poll(&CancellationToken::new(), || -> CameraResult<Option<()>> {
                Err(CameraError::backend("dequeue", "device unplugged"))
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);
    }
}
