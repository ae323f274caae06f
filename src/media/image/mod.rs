// SPDX-License-Identifier: GPL-3.0-only

//! Addressable frame images
//!
//! Raw device layouts (NV12, YUYV) are exposed as zero-copy views over a
//! [`FrameData`] arena: pixels are read straight out of the captured bytes and
//! sub-images alias their parent. Compressed frames decode into an
//! [`image::DynamicImage`].

pub mod nv12;
pub mod raw_image;
pub mod yuyv;

pub use nv12::Nv12Image;
pub use raw_image::{allocate_raw_image, new_raw_image, raw_image_len};
pub use yuyv::YuyvImage;

use crate::backends::camera::types::FrameData;
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::PixelFormat;

/// Integer pixel coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Half-open rectangle `[min, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    /// Rectangle spanning the two corners, swapped into canonical order
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self {
            min: Point::new(x0.min(x1), y0.min(y1)),
            max: Point::new(x0.max(x1), y0.max(y1)),
        }
    }

    /// `(0, 0)` to `(width, height)`, failing when a side overflows i32
    pub fn from_size(width: u64, height: u64) -> CameraResult<Self> {
        let w = i32::try_from(width)
            .map_err(|_| CameraError::InvalidFormat(format!("width {} too large", width)))?;
        let h = i32::try_from(height)
            .map_err(|_| CameraError::InvalidFormat(format!("height {} too large", height)))?;
        Ok(Self::new(0, 0, w, h))
    }

    pub fn dx(&self) -> i32 {
        self.max.x - self.min.x
    }

    pub fn dy(&self) -> i32 {
        self.max.y - self.min.y
    }

    pub fn is_empty(&self) -> bool {
        self.min.x >= self.max.x || self.min.y >= self.max.y
    }

    /// Number of pixels covered, 0 for empty rectangles
    pub fn pixel_count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.dx() as usize * self.dy() as usize
        }
    }

    /// Largest rectangle contained in both; the zero rectangle if disjoint
    pub fn intersect(&self, other: &Rect) -> Rect {
        let r = Rect {
            min: Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        };
        if r.is_empty() { Rect::default() } else { r }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.min.x <= x && x < self.max.x && self.min.y <= y && y < self.max.y
    }
}

/// One luma sample with its chroma
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct YCbCr {
    pub y: u8,
    pub cb: u8,
    pub cr: u8,
}

impl YCbCr {
    pub const fn new(y: u8, cb: u8, cr: u8) -> Self {
        Self { y, cb, cr }
    }
}

/// Color model reported by an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    YCbCr,
    Rgb,
    Rgba,
    Luma,
    LumaAlpha,
}

/// Randomly addressable YCbCr image over a shared byte arena
pub trait YCbCrImage {
    fn pixel_format(&self) -> PixelFormat;

    fn bounds(&self) -> Rect;

    /// Sample at `(x, y)`; the zero color outside the bounds
    fn ycbcr_at(&self, x: i32, y: i32) -> YCbCr;

    /// Overwrite the sample at `(x, y)`; no-op outside the bounds
    ///
    /// Chroma is shared between neighbouring pixels, so writing one pixel
    /// also changes the chroma of the others in its block or pair.
    fn set_ycbcr(&mut self, x: i32, y: i32, color: YCbCr);

    /// Replace the backing storage; the length must match exactly
    fn set_bytes(&mut self, data: FrameData) -> CameraResult<()>;

    /// Backing storage, shared with every alias of this image
    fn data(&self) -> &FrameData;

    fn color_model(&self) -> ColorModel {
        ColorModel::YCbCr
    }

    fn opaque(&self) -> bool {
        true
    }
}

/// A decoded or view-backed frame image
#[derive(Debug, Clone)]
pub enum Image {
    Nv12(Nv12Image),
    Yuyv(YuyvImage),
    /// Output of a compressed-frame decoder
    Decoded(image::DynamicImage),
}

impl Image {
    pub fn bounds(&self) -> Rect {
        match self {
            Image::Nv12(img) => img.bounds(),
            Image::Yuyv(img) => img.bounds(),
            Image::Decoded(img) => Rect::new(0, 0, img.width() as i32, img.height() as i32),
        }
    }

    pub fn width(&self) -> u32 {
        self.bounds().dx().max(0) as u32
    }

    pub fn height(&self) -> u32 {
        self.bounds().dy().max(0) as u32
    }

    pub fn color_model(&self) -> ColorModel {
        match self {
            Image::Nv12(img) => img.color_model(),
            Image::Yuyv(img) => img.color_model(),
            Image::Decoded(img) => match img.color() {
                image::ColorType::L8 | image::ColorType::L16 => ColorModel::Luma,
                image::ColorType::La8 | image::ColorType::La16 => ColorModel::LumaAlpha,
                image::ColorType::Rgb8 | image::ColorType::Rgb16 | image::ColorType::Rgb32F => {
                    ColorModel::Rgb
                }
                _ => ColorModel::Rgba,
            },
        }
    }

    /// Raw layout of the image, `None` for decoded images
    pub fn pixel_format(&self) -> Option<PixelFormat> {
        match self {
            Image::Nv12(img) => Some(img.pixel_format()),
            Image::Yuyv(img) => Some(img.pixel_format()),
            Image::Decoded(_) => None,
        }
    }

    pub fn as_nv12(&self) -> Option<&Nv12Image> {
        match self {
            Image::Nv12(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_yuyv(&self) -> Option<&YuyvImage> {
        match self {
            Image::Yuyv(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_decoded(&self) -> Option<&image::DynamicImage> {
        match self {
            Image::Decoded(img) => Some(img),
            _ => None,
        }
    }

    /// Raw view of the image, `None` for decoded images
    pub fn as_ycbcr(&self) -> Option<&dyn YCbCrImage> {
        match self {
            Image::Nv12(img) => Some(img),
            Image::Yuyv(img) => Some(img),
            Image::Decoded(_) => None,
        }
    }

    /// Replace the backing bytes of a raw image
    pub fn set_bytes(&mut self, data: FrameData) -> CameraResult<()> {
        match self {
            Image::Nv12(img) => img.set_bytes(data),
            Image::Yuyv(img) => img.set_bytes(data),
            Image::Decoded(_) => Err(CameraError::NotSupported(
                "decoded images have no raw backing storage".into(),
            )),
        }
    }

    /// Grayscale copy for saving or previewing
    ///
    /// Raw images contribute their luma plane unchanged.
    pub fn to_luma8(&self) -> image::GrayImage {
        match self.as_ycbcr() {
            Some(raw) => {
                let b = raw.bounds();
                image::GrayImage::from_fn(self.width(), self.height(), |x, y| {
                    image::Luma([raw.ycbcr_at(b.min.x + x as i32, b.min.y + y as i32).y])
                })
            }
            None => match self {
                Image::Decoded(img) => img.to_luma8(),
                _ => image::GrayImage::new(0, 0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_canonical_and_intersect() {
        let r = Rect::new(4, 4, 0, 0);
        assert_eq!(r, Rect::new(0, 0, 4, 4));
        assert_eq!(r.intersect(&Rect::new(2, 2, 8, 8)), Rect::new(2, 2, 4, 4));
        assert!(r.intersect(&Rect::new(5, 5, 8, 8)).is_empty());
        assert_eq!(r.intersect(&Rect::new(5, 5, 8, 8)), Rect::default());
    }

    #[test]
    fn test_rect_contains_half_open() {
        let r = Rect::new(0, 0, 2, 2);
        assert!(r.contains(0, 0));
        assert!(r.contains(1, 1));
        assert!(!r.contains(2, 1));
        assert!(!r.contains(-1, 0));
        assert_eq!(r.pixel_count(), 4);
    }

    #[test]
    fn test_from_size_overflow() {
        assert!(Rect::from_size(u64::MAX, 1).is_err());
        assert_eq!(Rect::from_size(3, 2).unwrap(), Rect::new(0, 0, 3, 2));
    }

    #[test]
    fn test_decoded_image_bounds() {
        let img = Image::Decoded(image::DynamicImage::new_rgb8(4, 3));
        assert_eq!(img.bounds(), Rect::new(0, 0, 4, 3));
        assert_eq!(img.color_model(), ColorModel::Rgb);
        assert!(img.pixel_format().is_none());
    }

    #[test]
    fn test_to_luma8_from_nv12() {
        let data = FrameData::new(vec![10, 20, 30, 40, 128, 128]);
        let img = new_raw_image(PixelFormat::NV12, 2, 2, data).unwrap();
        let gray = img.to_luma8();
        assert_eq!(gray.as_raw(), &vec![10, 20, 30, 40]);
    }
}
