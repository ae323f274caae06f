// SPDX-License-Identifier: MPL-2.0

//! Frame formats, images and decoding
//!
//! # Formats
//!
//! The [`formats`] module models what a device can deliver: four-character
//! pixel and compression codes, frame rates and capture modes, plus the
//! filtering used to pick one.
//!
//! # Images
//!
//! [`image`] exposes raw NV12 and YUYV frames as addressable YCbCr images
//! without copying the captured bytes.
//!
//! # Decoding
//!
//! - [`decoders`]: stage-then-decode for raw and MJPEG capture formats
//! - [`decompressors`]: the compressed capture path (MJPEG, HEIC placeholder)
//! - [`mjpeg`]: byte pipe, JPEG stream demuxer and JPEG decoding

pub mod decoders;
pub mod decompressors;
pub mod formats;
pub mod image;
pub mod mjpeg;

// Re-export commonly used types
pub use decoders::{FrameDecoder, new_frame_decoder};
pub use decompressors::{FrameDecompressor, new_frame_decompressor};
pub use formats::{Compression, CompressionQuality, Format, Formats, Fraction, PixelFormat};
pub use self::image::{Image, Nv12Image, Rect, YCbCr, YCbCrImage, YuyvImage};
