// SPDX-License-Identifier: GPL-3.0-only

//! Streaming Motion JPEG decoding
//!
//! Compressed bytes go into a [`pipe`], a [`MjpegDemuxer`] splits the stream
//! into whole JPEG images and each image is decoded with the `image` crate.

pub mod demux;
pub mod pipe;

pub use demux::MjpegDemuxer;
pub use pipe::{PipeReader, PipeWriter, pipe};

use crate::errors::CameraResult;
use image::{DynamicImage, ImageFormat};

/// Decode one complete JPEG image
pub fn decode_jpeg(bytes: &[u8]) -> CameraResult<DynamicImage> {
    Ok(image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?)
}

/// A pipe whose read side yields decoded images
#[derive(Debug)]
pub struct MjpegStream {
    writer: PipeWriter,
    demuxer: MjpegDemuxer<PipeReader>,
}

impl MjpegStream {
    pub fn new() -> Self {
        let (writer, reader) = pipe();
        Self {
            writer,
            demuxer: MjpegDemuxer::new(reader),
        }
    }

    /// Writer handle usable from another thread
    pub fn writer(&self) -> PipeWriter {
        self.writer.clone()
    }

    pub fn write(&self, bytes: &[u8]) -> CameraResult<()> {
        self.writer.write(bytes)
    }

    /// Bytes of the next complete JPEG image, blocking until one arrives
    pub fn next_jpeg(&mut self) -> CameraResult<Vec<u8>> {
        self.demuxer.next_frame()
    }

    /// The next image, decoded
    pub fn next_image(&mut self) -> CameraResult<DynamicImage> {
        let jpeg = self.next_jpeg()?;
        decode_jpeg(&jpeg)
    }

    /// Close the write side; images already written can still be read
    pub fn close(&self) {
        self.writer.close();
    }
}

impl Default for MjpegStream {
    fn default() -> Self {
        Self::new()
    }
}
