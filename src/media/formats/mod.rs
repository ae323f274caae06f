// SPDX-License-Identifier: MPL-2.0

//! Format and codec model
//!
//! Four-character codes for raw pixel layouts and compression containers,
//! the [`Format`] a device offers, and selection over lists of them.

pub mod format;
pub mod fourcc;

pub use format::{Format, Formats, Fraction};
pub use fourcc::{Compression, CompressionQuality, PixelFormat};
