// SPDX-License-Identifier: GPL-3.0-only

//! Frame decoders
//!
//! A [`FrameDecoder`] turns staged frame units into addressable [`Image`]s.
//! [`new_frame_decoder`] picks the implementation for a negotiated format:
//! the streaming MJPEG decoder for Motion JPEG, the zero-copy raw decoder for
//! NV12 and YUYV.

mod mjpeg;
mod raw;

pub use mjpeg::MjpegFrameDecoder;
pub use raw::RawFrameDecoder;

use crate::backends::camera::types::FrameSource;
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::{Compression, Format, PixelFormat};
use crate::media::image::Image;
use tracing::debug;

/// Stage-then-decode interface shared by all decoders
pub trait FrameDecoder: Send {
    /// A zero image shaped for this decoder, reusable as a decode target
    ///
    /// `None` when the decoder always produces fresh images.
    fn allocate_image(&self) -> Option<Image>;

    /// Stage a frame unit for the next [`decode_frame`](Self::decode_frame)
    fn write_frames(&mut self, frames: FrameSource) -> CameraResult<()>;

    /// Decode the staged frame, reusing `dst` when it has the right shape
    fn decode_frame(&mut self, dst: Option<Image>) -> CameraResult<Image>;

    /// Release decoder resources
    fn close(&mut self) -> CameraResult<()>;
}

/// Pick a decoder for a negotiated format
pub fn new_frame_decoder(format: &Format) -> CameraResult<Box<dyn FrameDecoder>> {
    debug!(format = %format, "Creating frame decoder");
    match (format.compression, format.pixel_format) {
        (Compression::MJPEG, PixelFormat::Auto) => Ok(Box::new(MjpegFrameDecoder::new())),
        (Compression::MJPEG, pixel_format) => Err(CameraError::InvalidFormat(format!(
            "compression {} requires pixel format '*', got '{}'",
            format.compression, pixel_format
        ))),
        (Compression::HEIC, _) => Err(CameraError::NotSupported(
            "HEIC frame decoding is not implemented".into(),
        )),
        (Compression::Undefined | Compression::Auto, PixelFormat::MJPEG) => {
            Ok(Box::new(MjpegFrameDecoder::new()))
        }
        (compression, pixel_format) if pixel_format.is_decodable_raw() => {
            debug!(%compression, %pixel_format, "Using raw frame decoder");
            Ok(Box::new(RawFrameDecoder::new(format)?))
        }
        (compression, pixel_format) => Err(CameraError::InvalidFormat(format!(
            "no decoder for compression '{}' and pixel format '{}'",
            compression, pixel_format
        ))),
    }
}
