// SPDX-License-Identifier: GPL-3.0-only

//! Four-character codes for pixel layouts and compression containers

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device-native sample layout of a frame
///
/// Either a packed four-byte ASCII tag or one of two sentinels: `Undefined`
/// (no value, serialized as `""`) and `Auto` (wildcard, serialized as `"*"`).
/// Equality is byte-exact.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PixelFormat {
    #[default]
    Undefined,
    Auto,
    FourCc([u8; 4]),
}

impl PixelFormat {
    /// YUYV 4:2:2 - Packed YUV (Y0 Cb Y1 Cr)
    pub const YUYV: PixelFormat = PixelFormat::FourCc(*b"YUYV");
    /// NV12 4:2:0 - Semi-planar (Y + CbCr interleaved)
    pub const NV12: PixelFormat = PixelFormat::FourCc(*b"NV12");
    /// YU12 4:2:0 - Planar (Y + Cb + Cr planes), reported by some V4L2 drivers
    pub const YU12: PixelFormat = PixelFormat::FourCc(*b"YU12");
    /// Motion JPEG reported as a pixel format by V4L2
    pub const MJPEG: PixelFormat = PixelFormat::FourCc(*b"MJPG");

    /// Build a tag from its four bytes
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        PixelFormat::FourCc(bytes)
    }

    /// Build a tag from the integer V4L2 and friends report (native byte order)
    pub fn from_u32(code: u32) -> Self {
        PixelFormat::FourCc(code.to_ne_bytes())
    }

    /// Integer form of the tag in native byte order; sentinels have none
    pub fn to_u32(&self) -> Option<u32> {
        match self {
            PixelFormat::FourCc(bytes) => Some(u32::from_ne_bytes(*bytes)),
            PixelFormat::Undefined | PixelFormat::Auto => None,
        }
    }

    /// The four tag bytes, if this is a concrete tag
    pub fn bytes(&self) -> Option<[u8; 4]> {
        match self {
            PixelFormat::FourCc(bytes) => Some(*bytes),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, PixelFormat::Undefined)
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, PixelFormat::Auto)
    }

    /// Bits per pixel of the raw layout, 0 when unknown or compressed
    ///
    /// Only used as the last tie-break when ranking formats.
    pub fn raw_bit_size(&self) -> u32 {
        match *self {
            Self::YUYV => 16,
            Self::NV12 => 12,
            _ => 0,
        }
    }

    /// Check if this is an uncompressed device-native layout
    pub fn is_raw(&self) -> bool {
        matches!(*self, Self::YUYV | Self::NV12 | Self::YU12)
    }

    /// Check if frames of this layout can be decoded by the raw decoder
    pub fn is_decodable_raw(&self) -> bool {
        matches!(*self, Self::YUYV | Self::NV12)
    }

    /// Long human-readable description, used by the CLI listing
    pub fn description(&self) -> &'static str {
        match *self {
            Self::YUYV => "YUYV 4:2:2 - Packed YUV (Y0 U Y1 V)",
            Self::NV12 => "NV12 4:2:0 - Semi-planar (Y + UV interleaved)",
            Self::YU12 => "YU12 4:2:0 - Planar (Y + U + V planes)",
            Self::MJPEG => "Motion JPEG - Compressed (frame-by-frame JPEG)",
            PixelFormat::Undefined => "Undefined",
            PixelFormat::Auto => "Any pixel format",
            PixelFormat::FourCc(_) => "Unknown pixel format",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Undefined => Ok(()),
            PixelFormat::Auto => f.write_str("*"),
            PixelFormat::FourCc(bytes) => {
                for &b in bytes {
                    if (b.is_ascii_graphic() && b != b'\\') || b == b' ' {
                        write!(f, "{}", b as char)?;
                    } else {
                        write!(f, "\\x{:02x}", b)?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelFormat({:?})", self.to_string())
    }
}

impl FromStr for PixelFormat {
    type Err = CameraError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "" => Ok(PixelFormat::Undefined),
            "*" => Ok(PixelFormat::Auto),
            other => parse_tag(other).map(PixelFormat::FourCc).ok_or_else(|| {
                CameraError::InvalidFormat(format!("unknown pixel format name '{}'", other))
            }),
        }
    }
}

/// Four tag bytes from their display form: ASCII characters, with `\xNN`
/// standing for a byte that has no printable form
fn parse_tag(name: &str) -> Option<[u8; 4]> {
    let mut bytes = [0u8; 4];
    let mut len = 0;
    let mut rest = name.as_bytes();
    while let Some((&first, tail)) = rest.split_first() {
        let (byte, tail) = match (first, tail) {
            (b'\\', [b'x', hi, lo, tail @ ..]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                let hex = [*hi, *lo];
                let hex = std::str::from_utf8(&hex).ok()?;
                (u8::from_str_radix(hex, 16).ok()?, tail)
            }
            (b'\\', _) => return None,
            (b, tail) if b.is_ascii() => (b, tail),
            _ => return None,
        };
        *bytes.get_mut(len)? = byte;
        len += 1;
        rest = tail;
    }
    (len == 4).then_some(bytes)
}

impl TryFrom<String> for PixelFormat {
    type Error = CameraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PixelFormat> for String {
    fn from(value: PixelFormat) -> Self {
        value.to_string()
    }
}

/// Container encoding of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Compression {
    #[default]
    Undefined,
    Auto,
    /// Motion JPEG
    MJPEG,
    /// HEIC still images
    HEIC,
}

impl Compression {
    /// FourCC tag of the container, empty for undefined
    pub fn fourcc(&self) -> &'static str {
        match self {
            Self::Undefined => "",
            Self::Auto => "*",
            Self::MJPEG => "MJPG",
            Self::HEIC => "HEIC",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Set and not the wildcard
    pub fn is_concrete(&self) -> bool {
        matches!(self, Self::MJPEG | Self::HEIC)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fourcc())
    }
}

impl FromStr for Compression {
    type Err = CameraError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_uppercase().as_str() {
            "" => Ok(Self::Undefined),
            "*" => Ok(Self::Auto),
            "MJPG" | "MJPEG" | "JPEG" => Ok(Self::MJPEG),
            "HEIC" => Ok(Self::HEIC),
            _ => Err(CameraError::InvalidFormat(format!(
                "unknown compression '{}'",
                name
            ))),
        }
    }
}

impl TryFrom<String> for Compression {
    type Error = CameraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Compression> for String {
    fn from(value: Compression) -> Self {
        value.fourcc().to_string()
    }
}

/// Encoder quality for compressed capture, 1 (smallest) to 100 (best)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompressionQuality(u8);

impl CompressionQuality {
    pub fn new(quality: u8) -> Self {
        Self(quality.clamp(1, 100))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for CompressionQuality {
    fn default() -> Self {
        Self(crate::constants::jpeg::DEFAULT_QUALITY)
    }
}
