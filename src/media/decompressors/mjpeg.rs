// SPDX-License-Identifier: GPL-3.0-only

//! Motion JPEG decompressor

use super::FrameDecompressor;
use crate::backends::camera::types::{DecodedFrame, FramesCompressed};
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::Compression;
use crate::media::image::Image;
use crate::media::mjpeg::{MjpegStream, PipeWriter};

/// Decodes MJPEG frame units through the streaming pipe
#[derive(Debug, Default)]
pub struct MjpegDecompressor {
    stream: MjpegStream,
}

impl MjpegDecompressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writer(&self) -> PipeWriter {
        self.stream.writer()
    }
}

impl FrameDecompressor for MjpegDecompressor {
    fn write_compressed(&mut self, frames: &dyn FramesCompressed) -> CameraResult<()> {
        if frames.compression() != Compression::MJPEG {
            return Err(CameraError::InvalidFormat(format!(
                "MJPEG decompressor got '{}' frames",
                frames.compression()
            )));
        }
        self.stream.write(&frames.bytes())
    }

    fn decompress_next(&mut self) -> CameraResult<DecodedFrame> {
        let image = self.stream.next_image()?;
        Ok(DecodedFrame::new(Image::Decoded(image)))
    }

    fn release_frame(&mut self, _frame: DecodedFrame) {}

    fn close(&mut self) -> CameraResult<()> {
        self.stream.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{CompressedFrame, Frame, FrameId};
    use crate::errors::ErrorKind;
    use crate::media::mjpeg::test_support::solid_jpeg;

    #[test]
    fn test_decompress_frames_in_order() {
        let mut dec = MjpegDecompressor::new();
        for (seq, width) in [(0u64, 8u32), (1, 16)] {
            let frame = CompressedFrame::new(
                FrameId(0),
                seq,
                Compression::MJPEG,
                solid_jpeg(width, 8, [200, 100, 50]).into(),
            );
            dec.write_compressed(&frame).unwrap();
        }
        let a = dec.decompress_next().unwrap();
        assert_eq!(a.image().width(), 8);
        dec.release_frame(a);
        assert_eq!(dec.decompress_next().unwrap().image().width(), 16);
        dec.close().unwrap();
        assert_eq!(dec.decompress_next().unwrap_err().kind(), ErrorKind::EndOfStream);
    }

    #[test]
    fn test_rejects_other_compression() {
        let mut dec = MjpegDecompressor::new();
        let frame = CompressedFrame::new(FrameId(0), 0, Compression::HEIC, vec![1, 2].into());
        assert_eq!(
            dec.write_compressed(&frame).unwrap_err().kind(),
            ErrorKind::Validation
        );
    }
}
