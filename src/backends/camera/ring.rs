// SPDX-License-Identifier: GPL-3.0-only

//! Driver buffer ring bookkeeping
//!
//! Kernel capture queues hand out filled buffers and expect each one back
//! before it can be refilled. Requeueing a buffer the driver already owns
//! fails, so a wait that times out must leave the ring untouched and the
//! next attempt must pick up exactly where the last one stopped.

use std::io;
use std::time::Duration;

/// A driver-owned ring of capture buffers
pub trait BufferRing {
    /// Queue every buffer and turn streaming on
    ///
    /// Returns `true` if a filled buffer was already taken back while arming.
    fn arm(&mut self) -> io::Result<bool>;

    /// Wait up to `timeout` for a filled buffer; `false` on timeout
    fn wait(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Take back a filled buffer without reading it
    fn skip(&mut self) -> io::Result<()>;

    /// Requeue the held buffer, take back the next filled one and pass its
    /// payload and driver sequence to `read`
    ///
    /// Only called after [`BufferRing::wait`] reported a filled buffer.
    fn cycle(&mut self, read: &mut dyn FnMut(&[u8], u32)) -> io::Result<()>;
}

/// Dequeue state over a [`BufferRing`]
///
/// Arms the ring on the first read and holds at most one buffer between
/// reads.
#[derive(Debug)]
pub struct RingReader<R> {
    ring: R,
    armed: bool,
    holding: bool,
}

impl<R: BufferRing> RingReader<R> {
    pub fn new(ring: R) -> Self {
        Self {
            ring,
            armed: false,
            holding: false,
        }
    }

    pub fn ring(&self) -> &R {
        &self.ring
    }

    /// Read one filled buffer if one arrives within `timeout`
    ///
    /// Returns `Ok(false)` when none did; the ring is then left as it was and
    /// the call can simply be repeated.
    pub fn read(&mut self, timeout: Duration, read: &mut dyn FnMut(&[u8], u32)) -> io::Result<bool> {
        if !self.armed {
            self.holding = self.ring.arm()?;
            self.armed = true;
        }
        if !self.ring.wait(timeout)? {
            return Ok(false);
        }
        if !self.holding {
            // Nothing to requeue yet: the first buffer back only seeds the cycle.
            self.ring.skip()?;
            self.holding = true;
            if !self.ring.wait(timeout)? {
                return Ok(false);
            }
        }
        self.ring.cycle(read)?;
        Ok(true)
    }
}
