// SPDX-License-Identifier: MPL-2.0

//! Camera capture - a cross-platform camera capture abstraction
//!
//! This library enumerates capture devices across platforms, negotiates a
//! capture mode, acquires frames from a bounded buffer pool and decodes them
//! into images, either by addressing raw pixel layouts in place or by
//! decoding MJPEG streams.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Platform registry, camera contract and built-in platforms
//! - [`media`]: Formats, raw image views, frame decoders and decompressors
//! - [`config`]: User configuration handling
//! - [`errors`]: Error taxonomy shared by every module
//!
//! # Example
//!
//! ```no_run
//! use camera_capture::backends::camera::{CancellationToken, list_cameras};
//!
//! let listing = list_cameras();
//! if let Some(device) = listing.cameras.first() {
//!     let formats = device.list_formats()?;
//!     let mut camera = device.open_camera(&formats.best_resolution())?;
//!     camera.start_streaming()?;
//!     let frame = camera.get_frame(&CancellationToken::new())?;
//!     camera.release_frame(frame)?;
//!     camera.close()?;
//! }
//! # Ok::<(), camera_capture::errors::CameraError>(())
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod media;

// Re-export commonly used types
pub use backends::camera::{
    Camera, CameraCompressed, CancellationToken, DevicePathAndPlatform, Platform, PlatformId,
    Registry,
};
pub use config::Config;
pub use errors::{CameraError, CameraResult, ErrorKind};
pub use media::formats::{Compression, CompressionQuality, Format, Formats, Fraction, PixelFormat};
