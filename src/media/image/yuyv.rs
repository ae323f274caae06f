// SPDX-License-Identifier: GPL-3.0-only

//! YUYV (4:2:2 packed) image view
//!
//! Pixels are stored in row-major order as 4-byte groups `{Y0, Cb, Y1, Cr}`,
//! each group covering two consecutive pixels that share one chroma pair.

use super::{Rect, YCbCr, YCbCrImage};
use crate::backends::camera::types::FrameData;
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::PixelFormat;
use bytemuck::{Pod, Zeroable};

/// One packed YUYV group
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct Y0CbY1Cr {
    pub y0: u8,
    pub cb: u8,
    pub y1: u8,
    pub cr: u8,
}

const GROUP_SIZE: usize = std::mem::size_of::<Y0CbY1Cr>();

/// YUYV image addressing into a shared arena
#[derive(Debug, Clone)]
pub struct YuyvImage {
    data: FrameData,
    rect: Rect,
    y_stride: usize,
    /// Pixel index, in the arena's packing order, of `rect.min`
    px_start: usize,
}

impl YuyvImage {
    /// Buffer length for a rectangle: two bytes per pixel
    pub fn expected_len(rect: Rect) -> usize {
        rect.pixel_count() * 2
    }

    /// Owned image with a zero-filled buffer
    pub fn new(rect: Rect) -> Self {
        Self {
            data: FrameData::zeroed(Self::expected_len(rect)),
            ..Self::empty(rect)
        }
    }

    /// Image with no storage yet; populate it with [`YCbCrImage::set_bytes`]
    pub fn empty(rect: Rect) -> Self {
        Self {
            data: FrameData::default(),
            rect,
            y_stride: rect.dx().max(0) as usize,
            px_start: 0,
        }
    }

    /// View over existing bytes, validated by length
    pub fn with_data(rect: Rect, data: FrameData) -> CameraResult<Self> {
        let mut img = Self::empty(rect);
        img.set_bytes(data)?;
        Ok(img)
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn y_stride(&self) -> usize {
        self.y_stride
    }

    /// Index of the group holding `(x, y)`, relative to this view's origin
    pub fn y0cby1cr_offset(&self, x: i32, y: i32) -> i64 {
        self.pixel_offset(x, y) / 2
    }

    /// Chroma index for `(x, y)` using 4:2:0 block addressing
    pub fn c_offset(&self, x: i32, y: i32) -> i64 {
        let dy = (y / 2) as i64 - (self.rect.min.y / 2) as i64;
        let dx = (x / 2) as i64 - (self.rect.min.x / 2) as i64;
        dy * self.y_stride as i64 / 2 + dx
    }

    fn pixel_offset(&self, x: i32, y: i32) -> i64 {
        (y as i64 - self.rect.min.y as i64) * self.y_stride as i64
            + (x as i64 - self.rect.min.x as i64)
    }

    /// View of the part of this image inside `r`, sharing storage
    pub fn sub_image(&self, r: Rect) -> YuyvImage {
        let r = r.intersect(&self.rect);
        if r.is_empty() {
            return YuyvImage::empty(Rect::default());
        }
        YuyvImage {
            data: self.data.clone(),
            rect: r,
            y_stride: self.y_stride,
            px_start: self.px_start + self.pixel_offset(r.min.x, r.min.y) as usize,
        }
    }

    /// Arena pixel index for `(x, y)`; its parity selects Y0 or Y1
    fn pixel_index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.rect.contains(x, y) {
            return None;
        }
        Some(usize::try_from(self.pixel_offset(x, y)).ok()? + self.px_start)
    }
}

impl YCbCrImage for YuyvImage {
    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::YUYV
    }

    fn bounds(&self) -> Rect {
        self.rect
    }

    fn ycbcr_at(&self, x: i32, y: i32) -> YCbCr {
        let Some(px) = self.pixel_index(x, y) else {
            return YCbCr::default();
        };
        let bytes = self.data.bytes();
        let groups: &[Y0CbY1Cr] = bytemuck::cast_slice(whole_groups(&bytes));
        match groups.get(px / 2) {
            Some(g) => {
                let luma = if px % 2 == 0 { g.y0 } else { g.y1 };
                YCbCr::new(luma, g.cb, g.cr)
            }
            None => YCbCr::default(),
        }
    }

    fn set_ycbcr(&mut self, x: i32, y: i32, color: YCbCr) {
        let Some(px) = self.pixel_index(x, y) else {
            return;
        };
        let mut bytes = self.data.write();
        let len = bytes.len() / GROUP_SIZE * GROUP_SIZE;
        let groups: &mut [Y0CbY1Cr] = bytemuck::cast_slice_mut(&mut bytes[..len]);
        if let Some(g) = groups.get_mut(px / 2) {
            if px % 2 == 0 {
                g.y0 = color.y;
            } else {
                g.y1 = color.y;
            }
            g.cb = color.cb;
            g.cr = color.cr;
        }
    }

    fn set_bytes(&mut self, data: FrameData) -> CameraResult<()> {
        let expected = Self::expected_len(self.rect);
        let received = data.len();
        if received != expected {
            return Err(CameraError::SizeMismatch {
                pixel_format: PixelFormat::YUYV,
                expected,
                received,
            });
        }
        if received % GROUP_SIZE != 0 {
            // Odd pixel count: the last group would be half missing.
            return Err(CameraError::SizeMismatch {
                pixel_format: PixelFormat::YUYV,
                expected: received.div_ceil(GROUP_SIZE) * GROUP_SIZE,
                received,
            });
        }
        self.data = data;
        self.y_stride = self.rect.dx().max(0) as usize;
        self.px_start = 0;
        Ok(())
    }

    fn data(&self) -> &FrameData {
        &self.data
    }
}

fn whole_groups(bytes: &[u8]) -> &[u8] {
    &bytes[..bytes.len() / GROUP_SIZE * GROUP_SIZE]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_shares_chroma() {
        // Row 0: (Y0=1, Cb=50, Y1=2, Cr=60), row 1: (3, 70, 4, 80)
        let data = FrameData::new(vec![1, 50, 2, 60, 3, 70, 4, 80]);
        let img = YuyvImage::with_data(Rect::new(0, 0, 2, 2), data).unwrap();
        assert_eq!(img.ycbcr_at(0, 0), YCbCr::new(1, 50, 60));
        assert_eq!(img.ycbcr_at(1, 0), YCbCr::new(2, 50, 60));
        assert_eq!(img.ycbcr_at(0, 1), YCbCr::new(3, 70, 80));
        assert_eq!(img.ycbcr_at(1, 1), YCbCr::new(4, 70, 80));
    }

    #[test]
    fn test_group_offset() {
        let img = YuyvImage::new(Rect::new(0, 0, 4, 2));
        assert_eq!(img.y0cby1cr_offset(0, 0), 0);
        assert_eq!(img.y0cby1cr_offset(1, 0), 0);
        assert_eq!(img.y0cby1cr_offset(2, 0), 1);
        assert_eq!(img.y0cby1cr_offset(3, 1), 3);
    }

    #[test]
    fn test_length_mismatch() {
        let err = YuyvImage::with_data(Rect::new(0, 0, 2, 2), FrameData::new(vec![0; 6]))
            .unwrap_err();
        assert!(matches!(
            err,
            CameraError::SizeMismatch {
                expected: 8,
                received: 6,
                ..
            }
        ));
    }

    #[test]
    fn test_odd_pixel_count_rejected() {
        let err = YuyvImage::with_data(Rect::new(0, 0, 3, 1), FrameData::new(vec![0; 6]))
            .unwrap_err();
        assert!(matches!(err, CameraError::SizeMismatch { expected: 8, .. }));
        // Odd width with an even pixel count packs groups across rows.
        assert!(YuyvImage::with_data(Rect::new(0, 0, 3, 2), FrameData::new(vec![0; 12])).is_ok());
    }

    #[test]
    fn test_odd_width_picks_luma_by_linear_index() {
        // 3x2: the middle group straddles the row break, so (0, 1) is its Y1
        // even though x is even.
        let data = FrameData::new(vec![10, 100, 11, 101, 12, 102, 13, 103, 14, 104, 15, 105]);
        let img = YuyvImage::with_data(Rect::new(0, 0, 3, 2), data).unwrap();
        assert_eq!(img.ycbcr_at(0, 0), YCbCr::new(10, 100, 101));
        assert_eq!(img.ycbcr_at(1, 0), YCbCr::new(11, 100, 101));
        assert_eq!(img.ycbcr_at(2, 0), YCbCr::new(12, 102, 103));
        assert_eq!(img.ycbcr_at(0, 1), YCbCr::new(13, 102, 103));
        assert_eq!(img.ycbcr_at(1, 1), YCbCr::new(14, 104, 105));
        assert_eq!(img.ycbcr_at(2, 1), YCbCr::new(15, 104, 105));
        assert_eq!(img.y0cby1cr_offset(0, 1), 1);

        let mut img = img;
        img.set_ycbcr(0, 1, YCbCr::new(99, 1, 2));
        assert_eq!(img.ycbcr_at(2, 0), YCbCr::new(12, 1, 2));
        assert_eq!(img.ycbcr_at(0, 1), YCbCr::new(99, 1, 2));
    }

    #[test]
    fn test_sub_image_with_odd_origin_aliases_parent() {
        let mut img = YuyvImage::new(Rect::new(0, 0, 6, 2));
        for x in 0..6 {
            img.set_ycbcr(x, 1, YCbCr::new(x as u8 * 10, 1, 2));
        }
        let sub = img.sub_image(Rect::new(1, 1, 6, 2));
        for x in 1..6 {
            assert_eq!(sub.ycbcr_at(x, 1), img.ycbcr_at(x, 1));
        }
    }

    #[test]
    fn test_set_ycbcr_out_of_bounds_is_noop() {
        let mut img = YuyvImage::new(Rect::new(0, 0, 2, 1));
        img.set_ycbcr(5, 5, YCbCr::new(1, 1, 1));
        assert_eq!(img.data().to_vec(), vec![0; 4]);
    }
}
