// SPDX-License-Identifier: GPL-3.0-only

//! NV12 (4:2:0 semi-planar) image view
//!
//! Layout: a full-resolution Y plane (`w * h` bytes, row-major) followed by
//! one interleaved `{Cb, Cr}` pair per 2x2 pixel block.

use super::{Rect, YCbCr, YCbCrImage};
use crate::backends::camera::types::FrameData;
use crate::errors::{CameraError, CameraResult};
use crate::media::formats::PixelFormat;
use bytemuck::{Pod, Zeroable};

/// Interleaved chroma pair
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct CbCr {
    pub cb: u8,
    pub cr: u8,
}

/// NV12 image addressing into a shared arena
#[derive(Debug, Clone)]
pub struct Nv12Image {
    data: FrameData,
    rect: Rect,
    y_stride: usize,
    /// Arena index of the luma sample at `rect.min`
    y_start: usize,
    y_end: usize,
    /// Arena index of the chroma pair covering `rect.min`
    c_start: usize,
    c_end: usize,
}

impl Nv12Image {
    /// Buffer length for a rectangle: `(w * h * 3 + 1) / 2`
    pub fn expected_len(rect: Rect) -> usize {
        (rect.pixel_count() * 3 + 1) / 2
    }

    /// Owned image with a zero-filled buffer
    pub fn new(rect: Rect) -> Self {
        let mut img = Self::empty(rect);
        img.attach(FrameData::zeroed(Self::expected_len(rect)));
        img
    }

    /// Image with no storage yet; populate it with [`YCbCrImage::set_bytes`]
    pub fn empty(rect: Rect) -> Self {
        Self {
            data: FrameData::default(),
            rect,
            y_stride: rect.dx().max(0) as usize,
            y_start: 0,
            y_end: 0,
            c_start: 0,
            c_end: 0,
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

    /// Index of the luma sample for `(x, y)` relative to this view's origin
    pub fn y_offset(&self, x: i32, y: i32) -> i64 {
        (y as i64 - self.rect.min.y as i64) * self.y_stride as i64
            + (x as i64 - self.rect.min.x as i64)
    }

    /// Index of the chroma pair for `(x, y)` relative to this view's origin
    pub fn c_offset(&self, x: i32, y: i32) -> i64 {
        let dy = (y / 2) as i64 - (self.rect.min.y / 2) as i64;
        let dx = (x / 2) as i64 - (self.rect.min.x / 2) as i64;
        dy * self.y_stride as i64 / 2 + dx
    }

    /// View of the part of this image inside `r`, sharing storage
    pub fn sub_image(&self, r: Rect) -> Nv12Image {
        let r = r.intersect(&self.rect);
        if r.is_empty() {
            return Nv12Image::empty(Rect::default());
        }
        // Offsets of an in-bounds origin are never negative.
        let y_start = self.y_start + self.y_offset(r.min.x, r.min.y) as usize;
        let c_start = self.c_start + 2 * self.c_offset(r.min.x, r.min.y) as usize;
        Nv12Image {
            data: self.data.clone(),
            rect: r,
            y_stride: self.y_stride,
            y_start,
            y_end: self.y_end,
            c_start,
            c_end: self.c_end,
        }
    }

    fn attach(&mut self, data: FrameData) {
        let luma = self.rect.pixel_count();
        self.y_stride = self.rect.dx().max(0) as usize;
        self.y_start = 0;
        self.y_end = luma;
        self.c_start = luma;
        self.c_end = data.len();
        self.data = data;
    }

    /// Arena indices of the luma byte and the first byte of the chroma pair
    fn indices(&self, x: i32, y: i32) -> Option<(usize, usize)> {
        if !self.rect.contains(x, y) {
            return None;
        }
        let yi = usize::try_from(self.y_offset(x, y)).ok()? + self.y_start;
        let ci = 2 * usize::try_from(self.c_offset(x, y)).ok()? + self.c_start;
        Some((yi, ci))
    }
}

impl YCbCrImage for Nv12Image {
    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::NV12
    }

    fn bounds(&self) -> Rect {
        self.rect
    }

    fn ycbcr_at(&self, x: i32, y: i32) -> YCbCr {
        let Some((yi, ci)) = self.indices(x, y) else {
            return YCbCr::default();
        };
        let bytes = self.data.bytes();
        let luma = if yi < self.y_end {
            bytes.get(yi).copied().unwrap_or(0)
        } else {
            0
        };
        let chroma = chroma_pair(&bytes, ci, self.c_end).unwrap_or(CbCr { cb: 0, cr: 0 });
        YCbCr::new(luma, chroma.cb, chroma.cr)
    }

    fn set_ycbcr(&mut self, x: i32, y: i32, color: YCbCr) {
        let Some((yi, ci)) = self.indices(x, y) else {
            return;
        };
        let mut bytes = self.data.write();
        if yi < self.y_end {
            if let Some(b) = bytes.get_mut(yi) {
                *b = color.y;
            }
        }
        let end = self.c_end.min(bytes.len());
        if ci + 2 <= end {
            let pair: &mut [CbCr] = bytemuck::cast_slice_mut(&mut bytes[ci..ci + 2]);
            pair[0] = CbCr {
                cb: color.cb,
                cr: color.cr,
            };
        }
    }

    fn set_bytes(&mut self, data: FrameData) -> CameraResult<()> {
        let expected = Self::expected_len(self.rect);
        let received = data.len();
        if received != expected {
            return Err(CameraError::SizeMismatch {
                pixel_format: PixelFormat::NV12,
                expected,
                received,
            });
        }
        self.attach(data);
        Ok(())
    }

    fn data(&self) -> &FrameData {
        &self.data
    }
}

fn chroma_pair(bytes: &[u8], start: usize, end: usize) -> Option<CbCr> {
    let end = end.min(bytes.len());
    if start + 2 > end {
        return None;
    }
    let pairs: &[CbCr] = bytemuck::cast_slice(&bytes[start..start + 2]);
    pairs.first().copied()
}
