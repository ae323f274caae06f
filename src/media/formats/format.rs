// SPDX-License-Identifier: GPL-3.0-only

//! Capture format model and format selection

use super::fourcc::{Compression, PixelFormat};
use crate::errors::{CameraError, CameraResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Exact rational number, used for frame rates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: u32,
    pub denominator: u32,
}

impl Fraction {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Value as f64; a zero denominator yields infinity or NaN
    pub fn as_f64(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    pub fn as_f32(&self) -> f32 {
        self.numerator as f32 / self.denominator as f32
    }

    /// The reciprocal, e.g. a V4L2 frame interval turned into a frame rate
    pub fn inverse(&self) -> Self {
        Self::new(self.denominator, self.numerator)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// A capture mode offered or negotiated by a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Format {
    pub width: u64,
    pub height: u64,
    pub pixel_format: PixelFormat,
    pub fps: Fraction,
    pub compression: Compression,
    pub compression_level: i64,
}

impl Format {
    /// Raw format with the given geometry
    pub fn raw(width: u64, height: u64, pixel_format: PixelFormat, fps: Fraction) -> Self {
        Self {
            width,
            height,
            pixel_format,
            fps,
            ..Default::default()
        }
    }

    /// Compressed format; the pixel layout is left to the backend
    pub fn compressed(width: u64, height: u64, compression: Compression, fps: Fraction) -> Self {
        Self {
            width,
            height,
            pixel_format: PixelFormat::Auto,
            fps,
            compression,
            compression_level: 0,
        }
    }

    pub fn pixel_count(&self) -> u64 {
        self.width.saturating_mul(self.height)
    }

    /// Reject formats whose compression and pixel layout contradict each other
    pub fn validate(&self) -> CameraResult<()> {
        if self.compression.is_concrete() && !self.pixel_format.is_auto() {
            return Err(CameraError::InvalidFormat(format!(
                "compression {} requires pixel format '*', got '{}'",
                self.compression, self.pixel_format
            )));
        }
        Ok(())
    }

    /// Width and height as u32, failing for geometries an image cannot hold
    pub fn dimensions(&self) -> CameraResult<(u32, u32)> {
        let w = u32::try_from(self.width)
            .map_err(|_| CameraError::InvalidFormat(format!("width {} too large", self.width)))?;
        let h = u32::try_from(self.height)
            .map_err(|_| CameraError::InvalidFormat(format!("height {} too large", self.height)))?;
        Ok((w, h))
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        if self.compression.is_undefined() {
            write!(f, " {}", self.pixel_format)?;
        } else {
            write!(f, " {}", self.compression)?;
        }
        write!(f, " @ {}", self.fps)
    }
}

/// Ordered list of formats with filtering and best-mode selection
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Formats(Vec<Format>);

impl Formats {
    pub fn new(formats: Vec<Format>) -> Self {
        Self(formats)
    }

    pub fn into_vec(self) -> Vec<Format> {
        self.0
    }

    /// Formats whose pixel format equals `pixel_format`, in order
    pub fn filter_by_pixel_format(&self, pixel_format: PixelFormat) -> Formats {
        self.filter(|f| f.pixel_format == pixel_format)
    }

    /// Formats whose width equals `width`, in order
    pub fn filter_by_width(&self, width: u64) -> Formats {
        self.filter(|f| f.width == width)
    }

    /// Formats whose frame rate, as a float, equals `fps`
    ///
    /// Exact float equality: `30000/1001` does not match `29.97`.
    pub fn filter_by_fps(&self, fps: f64) -> Formats {
        self.filter(|f| f.fps.as_f64() == fps)
    }

    /// Formats with the given compression, in order
    pub fn filter_by_compression(&self, compression: Compression) -> Formats {
        self.filter(|f| f.compression == compression)
    }

    fn filter(&self, keep: impl Fn(&Format) -> bool) -> Formats {
        self.0.iter().copied().filter(|f| keep(f)).collect()
    }

    /// The highest-quality format
    ///
    /// Ranks by pixel count, then frame rate, then raw bit size; a candidate
    /// replaces the current best only when strictly greater on the first
    /// differing criterion, so exact ties keep the first one seen. An empty
    /// list yields the zero format.
    pub fn best_resolution(&self) -> Format {
        let mut best = Format::default();
        for candidate in &self.0 {
            if is_better(candidate, &best) {
                best = *candidate;
            }
        }
        best
    }

    /// Pretty-printed JSON, for diagnostics
    pub fn to_json_pretty(&self) -> CameraResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn is_better(candidate: &Format, best: &Format) -> bool {
    let (cand_px, best_px) = (candidate.pixel_count(), best.pixel_count());
    if cand_px != best_px {
        return cand_px > best_px;
    }
    let (cand_fps, best_fps) = (candidate.fps.as_f64(), best.fps.as_f64());
    if cand_fps != best_fps {
        return cand_fps > best_fps;
    }
    candidate.pixel_format.raw_bit_size() > best.pixel_format.raw_bit_size()
}

impl Deref for Formats {
    type Target = [Format];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Format>> for Formats {
    fn from(formats: Vec<Format>) -> Self {
        Self(formats)
    }
}

impl FromIterator<Format> for Formats {
    fn from_iter<I: IntoIterator<Item = Format>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Formats {
    type Item = Format;
    type IntoIter = std::vec::IntoIter<Format>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Formats {
    type Item = &'a Format;
    type IntoIter = std::slice::Iter<'a, Format>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(w: u64, h: u64, pf: PixelFormat, fps: u32) -> Format {
        Format::raw(w, h, pf, Fraction::new(fps, 1))
    }

    #[test]
    fn test_best_resolution_prefers_fps_then_bit_size() {
        let formats = Formats::new(vec![
            fmt(1920, 1080, PixelFormat::NV12, 30),
            fmt(1280, 720, PixelFormat::YUYV, 60),
            fmt(1920, 1080, PixelFormat::YUYV, 60),
        ]);
        assert_eq!(
            formats.best_resolution(),
            fmt(1920, 1080, PixelFormat::YUYV, 60)
        );
    }

    #[test]
    fn test_best_resolution_bit_size_tie_break() {
        let formats = Formats::new(vec![
            fmt(640, 480, PixelFormat::NV12, 30),
            fmt(640, 480, PixelFormat::YUYV, 30),
        ]);
        assert_eq!(formats.best_resolution().pixel_format, PixelFormat::YUYV);
    }

    #[test]
    fn test_best_resolution_exact_tie_keeps_first() {
        let first = Format {
            compression_level: 1,
            ..fmt(640, 480, PixelFormat::NV12, 30)
        };
        let second = Format {
            compression_level: 2,
            ..fmt(640, 480, PixelFormat::NV12, 30)
        };
        let formats = Formats::new(vec![first, second]);
        assert_eq!(formats.best_resolution().compression_level, 1);
    }

    #[test]
    fn test_best_resolution_empty_is_zero_format() {
        assert_eq!(Formats::default().best_resolution(), Format::default());
    }

    #[test]
    fn test_filters_preserve_order() {
        let formats = Formats::new(vec![
            fmt(640, 480, PixelFormat::NV12, 30),
            fmt(1280, 720, PixelFormat::YUYV, 30),
            fmt(640, 480, PixelFormat::YUYV, 15),
        ]);
        let yuyv = formats.filter_by_pixel_format(PixelFormat::YUYV);
        assert_eq!(yuyv.len(), 2);
        assert_eq!(yuyv[0].width, 1280);
        assert_eq!(yuyv[1].width, 640);
        assert_eq!(formats.filter_by_width(640).len(), 2);
        assert_eq!(formats.filter_by_fps(30.0).len(), 2);
        assert!(formats.filter_by_width(1).is_empty());
    }

    #[test]
    fn test_validate_compression_requires_auto() {
        let ok = Format::compressed(640, 480, Compression::MJPEG, Fraction::new(30, 1));
        assert!(ok.validate().is_ok());
        let bad = Format {
            pixel_format: PixelFormat::NV12,
            ..ok
        };
        assert!(bad.validate().is_err());
        assert!(fmt(640, 480, PixelFormat::NV12, 30).validate().is_ok());
    }

    #[test]
    fn test_fraction_zero_denominator_not_guarded() {
        assert!(Fraction::new(30, 0).as_f64().is_infinite());
        assert!(Fraction::new(0, 0).as_f64().is_nan());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            fmt(1920, 1080, PixelFormat::NV12, 30).to_string(),
            "1920x1080 NV12 @ 30/1"
        );
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(fmt(2, 2, PixelFormat::NV12, 30)).unwrap();
        assert_eq!(json["width"], 2);
        assert_eq!(json["pixel_format"], "NV12");
        assert_eq!(json["fps"]["numerator"], 30);
        assert_eq!(json["compression"], "");
    }
}
