// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 capture sessions over memory-mapped buffers

use super::io_error;
use crate::backends::camera::cancel::CancellationToken;
use crate::backends::camera::polling::FramePoller;
use crate::backends::camera::ring::{BufferRing, RingReader};
use crate::backends::camera::slots::SlotPool;
use crate::backends::camera::types::{CapturedFrame, CompressedFrame, FrameId, FrameSource};
use crate::backends::camera::{Camera, CameraCompressed};
use crate::constants::v4l2::{BUFFER_COUNT, SLOT_COUNT};
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::{Compression, Format};
use std::io;
use std::time::Duration;
use tracing::{debug, info, trace};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;

/// The memory-mapped buffer ring of one streaming session
struct MmapRing {
    stream: MmapStream<'static>,
}

impl BufferRing for MmapRing {
    fn arm(&mut self) -> io::Result<bool> {
        // A zero timeout makes the first `next` queue every buffer, turn
        // streaming on and return without waiting.
        self.stream.set_timeout(Duration::ZERO);
        let armed = match self.stream.next() {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(false),
            Err(e) => Err(e),
        };
        self.stream.clear_timeout();
        armed
    }

    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        Ok(self.stream.handle().poll(libc::POLLIN, millis)? > 0)
    }

    fn skip(&mut self) -> io::Result<()> {
        CaptureStream::dequeue(&mut self.stream).map(|_| ())
    }

    fn cycle(&mut self, read: &mut dyn FnMut(&[u8], u32)) -> io::Result<()> {
        let (buf, meta) = self.stream.next()?;
        let used = (meta.bytesused as usize).min(buf.len());
        read(&buf[..used], meta.sequence);
        Ok(())
    }
}

/// Dequeue wait when the frame rate is unknown
const FALLBACK_WAIT: Duration = Duration::from_millis(100);

/// An open V4L2 capture device
///
/// Driver buffers are copied into the camera's own slots on dequeue, so a
/// frame held by the caller never blocks the driver's buffer ring.
pub struct V4l2Camera {
    path: String,
    device: Option<Device>,
    stream: Option<RingReader<MmapRing>>,
    format: Format,
    pool: SlotPool,
    poller: FramePoller,
}

impl V4l2Camera {
    pub(super) fn new(path: &str, device: Device, format: Format, poller: FramePoller) -> CameraResult<Self> {
        Ok(Self {
            path: path.to_string(),
            device: Some(device),
            stream: None,
            format,
            pool: SlotPool::new(SLOT_COUNT),
            poller,
        })
    }

    /// Wait for one dequeue; the frame interval when the rate is known
    fn dequeue_wait(&self) -> Duration {
        match self.poller.interval() {
            d if d.is_zero() => FALLBACK_WAIT,
            d => d,
        }
    }

    fn start(&mut self) -> CameraResult<()> {
        let Some(device) = self.device.as_ref() else {
            return Err(CameraError::backend("start streaming", "camera is closed"));
        };
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = MmapStream::with_buffers(device, Type::VideoCapture, BUFFER_COUNT)
            .map_err(|e| io_error("allocate buffers", &self.path, e))?;
        self.stream = Some(RingReader::new(MmapRing { stream }));
        info!(device = %self.path, format = %self.format, "V4L2 streaming started");
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the stream issues STREAMOFF and unmaps the buffers.
        if self.stream.take().is_some() {
            info!(device = %self.path, "V4L2 streaming stopped");
        }
    }

    fn next(&mut self, token: &CancellationToken) -> CameraResult<CapturedFrame> {
        if self.device.is_none() {
            return Err(CameraError::backend("get frame", "camera is closed"));
        }
        if self.stream.is_none() {
            return Err(CameraError::backend("get frame", "camera is not streaming"));
        }
        // Each attempt already waits up to one frame interval for the driver.
        let poller = self.poller.with_interval(Duration::ZERO);
        poller.poll(token, || self.try_dequeue())
    }

    fn try_dequeue(&mut self) -> CameraResult<Option<CapturedFrame>> {
        let wait = self.dequeue_wait();
        let Some(reader) = self.stream.as_mut() else {
            return Err(CameraError::backend("get frame", "camera is not streaming"));
        };
        let Some((id, data)) = self.pool.checkout() else {
            trace!(device = %self.path, "No free frame slot");
            return Ok(None);
        };

        let mut used = 0;
        let mut driver_sequence = 0;
        let read = reader.read(wait, &mut |payload, sequence| {
            let mut bytes = data.write();
            bytes.clear();
            bytes.extend_from_slice(payload);
            used = payload.len();
            driver_sequence = sequence;
        });
        match read {
            Ok(true) if used > 0 => {
                let sequence = self.pool.deliver(id);
                trace!(device = %self.path, sequence, driver_sequence, size = used, "Frame dequeued");
                Ok(Some(CapturedFrame::new(id, sequence, FrameSource::Raw(data))))
            }
            Ok(true) => {
                self.pool.abandon(id);
                trace!(device = %self.path, driver_sequence, "Zero-sized frame");
                Ok(None)
            }
            Ok(false) => {
                self.pool.abandon(id);
                Ok(None)
            }
            Err(e) => {
                self.pool.abandon(id);
                Err(io_error("dequeue buffer", &self.path, e))
            }
        }
    }

    fn release(&mut self, id: FrameId) -> CameraResult<()> {
        if self.device.is_none() {
            return Ok(());
        }
        self.pool.release(id)
    }

    fn shutdown(&mut self) {
        self.stop();
        self.pool.reset();
        if self.device.take().is_some() {
            debug!(device = %self.path, "V4L2 device closed");
        }
    }
}

impl std::fmt::Debug for V4l2Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Camera")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("streaming", &self.stream.is_some())
            .field("open", &self.device.is_some())
            .finish()
    }
}

impl Camera for V4l2Camera {
    fn start_streaming(&mut self) -> CameraResult<()> {
        self.start()
    }

    fn stop_streaming(&mut self) -> CameraResult<()> {
        self.stop();
        Ok(())
    }

    fn format(&self) -> Format {
        self.format
    }

    fn get_frame(&mut self, token: &CancellationToken) -> CameraResult<CapturedFrame> {
        self.next(token)
    }

    fn release_frame(&mut self, frame: CapturedFrame) -> CameraResult<()> {
        self.release(frame.id())
    }

    fn close(&mut self) -> CameraResult<()> {
        self.shutdown();
        Ok(())
    }
}

/// MJPEG capture from a device with a hardware encoder
#[derive(Debug)]
pub struct V4l2CompressedCamera {
    inner: V4l2Camera,
}

impl V4l2CompressedCamera {
    pub(super) fn new(inner: V4l2Camera) -> Self {
        Self { inner }
    }
}

impl CameraCompressed for V4l2CompressedCamera {
    fn start_streaming(&mut self) -> CameraResult<()> {
        self.inner.start()
    }

    fn stop_streaming(&mut self) -> CameraResult<()> {
        self.inner.stop();
        Ok(())
    }

    fn format(&self) -> Format {
        let raw = self.inner.format;
        Format::compressed(raw.width, raw.height, Compression::MJPEG, raw.fps)
    }

    fn compression(&self) -> Compression {
        Compression::MJPEG
    }

    fn get_frame(&mut self, token: &CancellationToken) -> CameraResult<CompressedFrame> {
        let frame = self.inner.next(token)?;
        match frame.source() {
            FrameSource::Raw(data) => Ok(CompressedFrame::new(
                frame.id(),
                frame.sequence(),
                Compression::MJPEG,
                data.clone(),
            )),
            FrameSource::Decoded(_) => {
                self.inner.release(frame.id())?;
                Err(CameraError::backend("get frame", "device delivered a decoded frame"))
            }
        }
    }

    fn release_frame(&mut self, frame: CompressedFrame) -> CameraResult<()> {
        self.inner.release(frame.id())
    }

    fn close(&mut self) -> CameraResult<()> {
        self.inner.shutdown();
        Ok(())
    }
}
