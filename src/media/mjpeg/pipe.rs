// SPDX-License-Identifier: GPL-3.0-only

//! In-process byte pipe feeding the MJPEG demuxer
//!
//! Writes never block: chunks are queued until the reader pulls them. Reads
//! block until a chunk arrives or every writer handle has been closed, at
//! which point the reader sees end-of-file.

use crate::errors::{CameraError, CameraResult};
use std::io::{self, Read};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};

/// Create a connected writer/reader pair
pub fn pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = mpsc::channel();
    (
        PipeWriter {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        PipeReader {
            rx,
            chunk: Vec::new(),
            pos: 0,
        },
    )
}

/// Producer half; clones share one underlying sender
///
/// Closing any clone closes the pipe for all of them.
#[derive(Clone)]
pub struct PipeWriter {
    tx: Arc<Mutex<Option<Sender<Vec<u8>>>>>,
}

impl PipeWriter {
    /// Queue a copy of `bytes` for the reader
    pub fn write(&self, bytes: &[u8]) -> CameraResult<()> {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = guard.as_ref() else {
            return Err(CameraError::EndOfStream);
        };
        if bytes.is_empty() {
            return Ok(());
        }
        // A dropped reader means nobody will ever consume this.
        tx.send(bytes.to_vec()).map_err(|_| CameraError::EndOfStream)
    }

    /// Close the pipe; a blocked reader wakes up with end-of-file
    pub fn close(&self) {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_closed(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl std::fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeWriter")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Consumer half
#[derive(Debug)]
pub struct PipeReader {
    rx: Receiver<Vec<u8>>,
    chunk: Vec<u8>,
    pos: usize,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.chunk.len() {
            match self.rx.recv() {
                Ok(chunk) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.chunk.len() - self.pos);
        buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
