// SPDX-License-Identifier: GPL-3.0-only

//! Streaming Motion JPEG frame decoder

use super::FrameDecoder;
use crate::backends::camera::types::FrameSource;
use crate::errors::{CameraError, CameraResult};
use crate::media::image::Image;
use crate::media::mjpeg::{MjpegStream, PipeWriter};

/// Decodes a stream of concatenated JPEG images
///
/// Written bytes are queued without blocking; `decode_frame` blocks until a
/// whole image has arrived. Use [`writer`](Self::writer) to feed the decoder
/// from a capture thread while another thread decodes.
#[derive(Debug, Default)]
pub struct MjpegFrameDecoder {
    stream: MjpegStream,
}

impl MjpegFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writer(&self) -> PipeWriter {
        self.stream.writer()
    }
}

impl FrameDecoder for MjpegFrameDecoder {
    fn allocate_image(&self) -> Option<Image> {
        None
    }

    fn write_frames(&mut self, frames: FrameSource) -> CameraResult<()> {
        match frames {
            FrameSource::Raw(data) => self.stream.write(&data.bytes()),
            FrameSource::Decoded(_) => Err(CameraError::InvalidFormat(
                "MJPEG decoder expects compressed bytes".into(),
            )),
        }
    }

    fn decode_frame(&mut self, _dst: Option<Image>) -> CameraResult<Image> {
        self.stream.next_image().map(Image::Decoded)
    }

    fn close(&mut self) -> CameraResult<()> {
        self.stream.close();
        Ok(())
    }
}
