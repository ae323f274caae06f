// SPDX-License-Identifier: GPL-3.0-only

//! Decompressors for compressed capture streams
//!
//! The compressed-path counterpart of the frame decoders: frame units from a
//! [`CameraCompressed`](crate::backends::camera::CameraCompressed) go in,
//! [`DecodedFrame`]s come out.

mod mjpeg;

pub use mjpeg::MjpegDecompressor;

use crate::backends::camera::types::{DecodedFrame, FramesCompressed};
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::Compression;

/// Write-compressed, read-decoded interface
pub trait FrameDecompressor: Send {
    /// Queue the bytes of a compressed frame unit
    fn write_compressed(&mut self, frames: &dyn FramesCompressed) -> CameraResult<()>;

    /// Block until the next frame is decoded
    fn decompress_next(&mut self) -> CameraResult<DecodedFrame>;

    /// Hand back a frame returned by [`decompress_next`](Self::decompress_next)
    fn release_frame(&mut self, frame: DecodedFrame);

    fn close(&mut self) -> CameraResult<()>;
}

/// Pick a decompressor for a compression container
pub fn new_frame_decompressor(compression: Compression) -> CameraResult<Box<dyn FrameDecompressor>> {
    match compression {
        Compression::MJPEG => Ok(Box::new(MjpegDecompressor::new())),
        Compression::HEIC => Err(CameraError::NotSupported(
            "HEIC decompression is not implemented".into(),
        )),
        other => Err(CameraError::NotSupported(format!(
            "no decompressor for compression '{}'",
            other
        ))),
    }
}
