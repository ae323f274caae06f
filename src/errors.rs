// SPDX-License-Identifier: MPL-2.0

//! Error types for camera capture
//!
//! Every fallible operation in the crate returns [`CameraResult`]. Errors are
//! grouped into coarse categories via [`ErrorKind`] so callers can branch on
//! the category without caring which backend produced the error or how much
//! context was layered on top of it.

use crate::media::formats::PixelFormat;
use std::fmt;

/// Result type alias using CameraError
pub type CameraResult<T> = Result<T, CameraError>;

/// Coarse error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or mutually exclusive format fields, bad arguments
    Validation,
    /// A raw buffer length does not match the declared geometry
    SizeMismatch,
    /// The requested operation or codec is not implemented
    NotSupported,
    /// The underlying device or OS reported a failure
    Backend,
    /// A frame did not arrive in time
    TimedOut,
    /// The caller cancelled the operation
    Cancelled,
    /// A compressed stream was closed
    EndOfStream,
    /// Compressed payload could not be decoded
    Decode,
    /// Configuration file could not be read or parsed
    Config,
}

/// Camera capture error
#[derive(Debug, Clone)]
pub enum CameraError {
    /// Invalid format or argument
    InvalidFormat(String),
    /// A platform with the same id is already registered
    DuplicatePlatform(String),
    /// Raw buffer length mismatch
    SizeMismatch {
        pixel_format: PixelFormat,
        expected: usize,
        received: usize,
    },
    /// Operation not supported
    NotSupported(String),
    /// Backend failure during an operation
    Backend { operation: String, message: String },
    /// Device is already opened by someone else
    DeviceBusy(String),
    /// Deadline expired
    Timeout(String),
    /// All polling attempts returned empty payloads
    FrameNotDelivered { attempts: u32 },
    /// Cancelled by the caller
    Cancelled,
    /// Compressed stream closed
    EndOfStream,
    /// Compressed frame decoding failed
    Decode(String),
    /// Configuration error
    Config(String),
    /// Another error with the operation that produced it
    Context {
        context: String,
        source: Box<CameraError>,
    },
}

impl CameraError {
    /// Shorthand for a [`CameraError::Backend`] error
    pub fn backend(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        CameraError::Backend {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Category of this error, looking through any context wrappers
    pub fn kind(&self) -> ErrorKind {
        match self {
            CameraError::InvalidFormat(_) | CameraError::DuplicatePlatform(_) => {
                ErrorKind::Validation
            }
            CameraError::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            CameraError::NotSupported(_) => ErrorKind::NotSupported,
            CameraError::Backend { .. } | CameraError::DeviceBusy(_) => ErrorKind::Backend,
            CameraError::Timeout(_) | CameraError::FrameNotDelivered { .. } => ErrorKind::TimedOut,
            CameraError::Cancelled => ErrorKind::Cancelled,
            CameraError::EndOfStream => ErrorKind::EndOfStream,
            CameraError::Decode(_) => ErrorKind::Decode,
            CameraError::Config(_) => ErrorKind::Config,
            CameraError::Context { source, .. } => source.kind(),
        }
    }

    /// Innermost error, with all context stripped
    pub fn root(&self) -> &CameraError {
        match self {
            CameraError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Wrap this error with the operation that produced it
    pub fn context(self, context: impl Into<String>) -> Self {
        CameraError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
            CameraError::DuplicatePlatform(id) => {
                write!(f, "Platform '{}' is already registered", id)
            }
            CameraError::SizeMismatch {
                pixel_format,
                expected,
                received,
            } => write!(
                f,
                "{} buffer size mismatch: expected {} bytes, received {}",
                pixel_format, expected, received
            ),
            CameraError::NotSupported(msg) => write!(f, "Not supported: {}", msg),
            CameraError::Backend { operation, message } => {
                write!(f, "Backend error during {}: {}", operation, message)
            }
            CameraError::DeviceBusy(device) => write!(f, "Device {} is busy", device),
            CameraError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            CameraError::FrameNotDelivered { attempts } => write!(
                f,
                "No frame delivered after {} attempts (always got a zero-sized frame)",
                attempts
            ),
            CameraError::Cancelled => write!(f, "Operation cancelled"),
            CameraError::EndOfStream => write!(f, "End of stream"),
            CameraError::Decode(msg) => write!(f, "Decode failed: {}", msg),
            CameraError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CameraError::Context { context, source } => write!(f, "{}: {}", context, source),
        }
    }
}

impl std::error::Error for CameraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CameraError::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::backend("I/O", err)
    }
}

impl From<image::ImageError> for CameraError {
    fn from(err: image::ImageError) -> Self {
        CameraError::Decode(err.to_string())
    }
}

impl From<serde_json::Error> for CameraError {
    fn from(err: serde_json::Error) -> Self {
        CameraError::Config(err.to_string())
    }
}

/// Attach operation context to a result
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> CameraResult<T>;

    fn with_context<F, S>(self, f: F) -> CameraResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> ResultExt<T> for CameraResult<T> {
    fn context(self, context: impl Into<String>) -> CameraResult<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F, S>(self, f: F) -> CameraResult<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| e.context(f()))
    }
}
