// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic camera sessions

use super::DeviceLease;
use super::pattern;
use crate::backends::camera::cancel::CancellationToken;
use crate::backends::camera::polling::FramePoller;
use crate::backends::camera::slots::SlotPool;
use crate::backends::camera::types::{CapturedFrame, CompressedFrame, FrameData, FrameId, FrameSource};
use crate::backends::camera::{Camera, CameraCompressed};
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::{Compression, CompressionQuality, Format, PixelFormat};
use tracing::{debug, info, trace};

/// Streaming state shared by the raw and compressed cameras
#[derive(Debug)]
struct Session {
    lease: Option<DeviceLease>,
    pool: SlotPool,
    warmup_frames: u32,
    warmup_remaining: u32,
    poller: FramePoller,
    streaming: bool,
}

impl Session {
    fn new(lease: DeviceLease, pool_size: usize, warmup_frames: u32, poller: FramePoller) -> Self {
        Self {
            lease: Some(lease),
            pool: SlotPool::new(pool_size),
            warmup_frames,
            warmup_remaining: 0,
            poller,
            streaming: false,
        }
    }

    fn device(&self) -> &str {
        self.lease.as_ref().map_or("<closed>", |l| l.path())
    }

    fn start(&mut self) -> CameraResult<()> {
        if self.lease.is_none() {
            return Err(CameraError::backend("start streaming", "camera is closed"));
        }
        if !self.streaming {
            self.streaming = true;
            self.warmup_remaining = self.warmup_frames;
            debug!(device = self.device(), "Synthetic streaming started");
        }
        Ok(())
    }

    fn stop(&mut self) {
        if self.streaming {
            self.streaming = false;
            debug!(device = self.device(), "Synthetic streaming stopped");
        }
    }

    fn close(&mut self) {
        self.stop();
        self.pool.reset();
        if let Some(lease) = self.lease.take() {
            info!(device = lease.path(), "Closed synthetic camera");
        }
    }

    /// Poll for a filled slot
    ///
    /// `fill` writes the pattern for the given sequence number into the slot.
    fn next<F>(&mut self, token: &CancellationToken, mut fill: F) -> CameraResult<(FrameId, u64, FrameData)>
    where
        F: FnMut(&FrameData, u64) -> CameraResult<()>,
    {
        if self.lease.is_none() {
            return Err(CameraError::backend("get frame", "camera is closed"));
        }
        if !self.streaming {
            return Err(CameraError::backend("get frame", "camera is not streaming"));
        }
        let poller = self.poller;
        poller.poll(token, || self.try_next(&mut fill))
    }

    fn try_next<F>(&mut self, fill: &mut F) -> CameraResult<Option<(FrameId, u64, FrameData)>>
    where
        F: FnMut(&FrameData, u64) -> CameraResult<()>,
    {
        if self.warmup_remaining > 0 {
            self.warmup_remaining -= 1;
            trace!(remaining = self.warmup_remaining, "Warm-up frame is empty");
            return Ok(None);
        }
        let Some((id, data)) = self.pool.checkout() else {
            trace!(in_use = self.pool.in_use(), "No free frame slot");
            return Ok(None);
        };
        if let Err(e) = fill(&data, self.pool.sequence()) {
            self.pool.abandon(id);
            return Err(e);
        }
        let sequence = self.pool.deliver(id);
        Ok(Some((id, sequence, data)))
    }

    fn release(&mut self, id: FrameId) -> CameraResult<()> {
        // Frames outstanding at close were invalidated with the pool.
        if self.lease.is_none() {
            return Ok(());
        }
        self.pool.release(id)
    }
}

/// Raw synthetic camera
#[derive(Debug)]
pub struct SyntheticCamera {
    session: Session,
    format: Format,
    width: u32,
    height: u32,
}

impl SyntheticCamera {
    pub(super) fn new(
        lease: DeviceLease,
        format: Format,
        pool_size: usize,
        warmup_frames: u32,
        poller: FramePoller,
    ) -> Self {
        // Geometry was checked during negotiation.
        let (width, height) = format.dimensions().unwrap_or_default();
        Self {
            session: Session::new(lease, pool_size, warmup_frames, poller),
            format,
            width,
            height,
        }
    }

    /// Frames currently checked out
    pub fn frames_in_use(&self) -> usize {
        self.session.pool.in_use()
    }
}

impl Camera for SyntheticCamera {
    fn start_streaming(&mut self) -> CameraResult<()> {
        self.session.start()
    }

    fn stop_streaming(&mut self) -> CameraResult<()> {
        self.session.stop();
        Ok(())
    }

    fn format(&self) -> Format {
        self.format
    }

    fn get_frame(&mut self, token: &CancellationToken) -> CameraResult<CapturedFrame> {
        let (width, height, pixel_format) = (self.width, self.height, self.format.pixel_format);
        let (id, sequence, data) = self.session.next(token, |data, sequence| {
            match pixel_format {
                PixelFormat::NV12 => pattern::fill_nv12(&mut data.write(), width, height, sequence),
                PixelFormat::YUYV => pattern::fill_yuyv(&mut data.write(), width, height, sequence),
                PixelFormat::MJPEG => {
                    let jpeg = pattern::jpeg_frame(
                        width,
                        height,
                        sequence,
                        CompressionQuality::default().value(),
                    )?;
                    data.replace(jpeg);
                }
                other => {
                    return Err(CameraError::NotSupported(format!(
                        "synthetic pattern in pixel format '{}'",
                        other
                    )));
                }
            }
            Ok(())
        })?;
        Ok(CapturedFrame::new(id, sequence, FrameSource::Raw(data)))
    }

    fn release_frame(&mut self, frame: CapturedFrame) -> CameraResult<()> {
        self.session.release(frame.id())
    }

    fn close(&mut self) -> CameraResult<()> {
        self.session.close();
        Ok(())
    }
}

/// Synthetic camera delivering MJPEG-compressed frames
#[derive(Debug)]
pub struct SyntheticCompressedCamera {
    session: Session,
    format: Format,
    quality: CompressionQuality,
    width: u32,
    height: u32,
}

impl SyntheticCompressedCamera {
    pub(super) fn new(
        lease: DeviceLease,
        format: Format,
        quality: CompressionQuality,
        pool_size: usize,
        warmup_frames: u32,
        poller: FramePoller,
    ) -> Self {
        let (width, height) = format.dimensions().unwrap_or_default();
        Self {
            session: Session::new(lease, pool_size, warmup_frames, poller),
            format,
            quality,
            width,
            height,
        }
    }

    pub fn quality(&self) -> CompressionQuality {
        self.quality
    }
}

impl CameraCompressed for SyntheticCompressedCamera {
    fn start_streaming(&mut self) -> CameraResult<()> {
        self.session.start()
    }

    fn stop_streaming(&mut self) -> CameraResult<()> {
        self.session.stop();
        Ok(())
    }

    fn format(&self) -> Format {
        self.format
    }

    fn compression(&self) -> Compression {
        self.format.compression
    }

    fn get_frame(&mut self, token: &CancellationToken) -> CameraResult<CompressedFrame> {
        let (width, height, quality) = (self.width, self.height, self.quality.value());
        let (id, sequence, data) = self.session.next(token, |data, sequence| {
            data.replace(pattern::jpeg_frame(width, height, sequence, quality)?);
            Ok(())
        })?;
        Ok(CompressedFrame::new(id, sequence, self.compression(), data))
    }

    fn release_frame(&mut self, frame: CompressedFrame) -> CameraResult<()> {
        self.session.release(frame.id())
    }

    fn close(&mut self) -> CameraResult<()> {
        self.session.close();
        Ok(())
    }
}
