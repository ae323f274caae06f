// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::errors::CameraError;
use crate::media::formats::Compression;
use crate::media::image::Image;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Device identifier within a platform (e.g. `/dev/video0`)
pub type DevicePath = String;

/// Shared frame byte storage
///
/// A reference-counted, interior-mutable arena. Backends own one per frame
/// slot and refill it on every capture; image views hold a clone of the
/// handle and address into it by offset, so decoding a raw frame never copies
/// the pixels. Mutations through any clone are visible to all others.
#[derive(Clone, Default)]
pub struct FrameData(Arc<RwLock<Vec<u8>>>);

impl FrameData {
    /// Wrap existing bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        FrameData(Arc::new(RwLock::new(bytes)))
    }

    /// Zero-filled storage of `len` bytes
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    /// Length of the frame data in bytes
    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    /// Check if the frame data is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared read access
    pub fn bytes(&self) -> FrameBytes<'_> {
        FrameBytes(self.0.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Exclusive write access; the length may change
    pub fn write(&self) -> FrameBytesMut<'_> {
        FrameBytesMut(self.0.write().unwrap_or_else(PoisonError::into_inner))
    }

    /// Swap in new contents, returning the old ones
    pub fn replace(&self, bytes: Vec<u8>) -> Vec<u8> {
        std::mem::replace(&mut *self.write(), bytes)
    }

    /// Copy out the current contents
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes().to_vec()
    }

    /// True if both handles refer to the same storage
    pub fn ptr_eq(&self, other: &FrameData) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for FrameData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FrameData({} bytes)", self.len())
    }
}

impl From<Vec<u8>> for FrameData {
    fn from(bytes: Vec<u8>) -> Self {
        FrameData::new(bytes)
    }
}

/// Read guard over [`FrameData`]
pub struct FrameBytes<'a>(RwLockReadGuard<'a, Vec<u8>>);

impl Deref for FrameBytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// Write guard over [`FrameData`]
pub struct FrameBytesMut<'a>(RwLockWriteGuard<'a, Vec<u8>>);

impl Deref for FrameBytesMut<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl DerefMut for FrameBytesMut<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.0
    }
}

/// A frame unit exposing raw bytes
pub trait FramesData {
    fn data(&self) -> &FrameData;

    fn bytes(&self) -> FrameBytes<'_> {
        self.data().bytes()
    }
}

/// A frame unit whose bytes are container-encoded
pub trait FramesCompressed: FramesData {
    fn compression(&self) -> Compression;
}

/// A decoded frame
pub trait Frame {
    fn image(&self) -> &Image;
}

impl FramesData for FrameData {
    fn data(&self) -> &FrameData {
        self
    }
}

/// Identifier of a backend frame slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

/// What a raw frame decoder consumes
#[derive(Debug, Clone)]
pub enum FrameSource {
    /// Device-native bytes to be interpreted per the pixel format
    Raw(FrameData),
    /// Already decoded by the backend; passed through untouched
    Decoded(Image),
}

impl From<FrameData> for FrameSource {
    fn from(data: FrameData) -> Self {
        FrameSource::Raw(data)
    }
}

impl From<Image> for FrameSource {
    fn from(image: Image) -> Self {
        FrameSource::Decoded(image)
    }
}

/// A raw frame checked out of a camera's slot pool
///
/// Hand it back with [`Camera::release_frame`](super::Camera::release_frame)
/// once decoded images built from it are no longer read.
#[derive(Debug)]
pub struct CapturedFrame {
    id: FrameId,
    sequence: u64,
    source: FrameSource,
}

impl CapturedFrame {
    pub fn new(id: FrameId, sequence: u64, source: FrameSource) -> Self {
        Self {
            id,
            sequence,
            source,
        }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Monotonic capture counter of the camera
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn source(&self) -> &FrameSource {
        &self.source
    }
}

/// A compressed frame checked out of a camera's slot pool
#[derive(Debug)]
pub struct CompressedFrame {
    id: FrameId,
    sequence: u64,
    compression: Compression,
    data: FrameData,
}

impl CompressedFrame {
    pub fn new(id: FrameId, sequence: u64, compression: Compression, data: FrameData) -> Self {
        Self {
            id,
            sequence,
            compression,
            data,
        }
    }

    pub fn id(&self) -> FrameId {
        self.id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl FramesData for CompressedFrame {
    fn data(&self) -> &FrameData {
        &self.data
    }
}

impl FramesCompressed for CompressedFrame {
    fn compression(&self) -> Compression {
        self.compression
    }
}

/// Output of a frame decompressor
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    image: Image,
}

impl DecodedFrame {
    pub fn new(image: Image) -> Self {
        Self { image }
    }

    pub fn into_image(self) -> Image {
        self.image
    }
}

impl Frame for DecodedFrame {
    fn image(&self) -> &Image {
        &self.image
    }
}

/// Camera platform identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlatformId {
    /// Video4Linux2 (Linux kernel capture API)
    V4l2,
    /// In-memory test pattern generator
    Synthetic,
    /// Third-party platform
    Other(String),
}

impl PlatformId {
    pub fn as_str(&self) -> &str {
        match self {
            PlatformId::V4l2 => "v4l2",
            PlatformId::Synthetic => "synthetic",
            PlatformId::Other(name) => name,
        }
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformId {
    type Err = CameraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" => Err(CameraError::InvalidFormat("empty platform id".into())),
            "v4l2" => Ok(PlatformId::V4l2),
            "synthetic" => Ok(PlatformId::Synthetic),
            _ => Ok(PlatformId::Other(s.to_string())),
        }
    }
}

impl TryFrom<String> for PlatformId {
    type Error = CameraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlatformId> for String {
    fn from(value: PlatformId) -> Self {
        value.as_str().to_string()
    }
}
