// SPDX-License-Identifier: GPL-3.0-only

//! Moving test pattern in the layouts the synthetic cameras deliver
//!
//! Luma is a diagonal ramp shifted by the frame sequence number, chroma a
//! horizontal (Cb) and vertical (Cr) ramp around neutral grey.

use crate::errors::{CameraError, CameraResult};
use image::{Rgb, RgbImage};

/// Luma of pixel `(x, y)` in frame `sequence`
pub fn luma_at(x: u32, y: u32, sequence: u64) -> u8 {
    (x as u64 + y as u64 + sequence) as u8
}

fn cb_at(x: u32) -> u8 {
    128u8.wrapping_add((x / 2) as u8)
}

fn cr_at(y: u32) -> u8 {
    128u8.wrapping_sub((y / 2) as u8)
}

/// Fill `buf` with an NV12 frame, resizing it to fit
pub fn fill_nv12(buf: &mut Vec<u8>, width: u32, height: u32, sequence: u64) {
    let luma_len = width as usize * height as usize;
    buf.resize((luma_len * 3 + 1) / 2, 0);
    let (luma, chroma) = buf.split_at_mut(luma_len);
    for (i, px) in luma.iter_mut().enumerate() {
        let (x, y) = ((i % width as usize) as u32, (i / width as usize) as u32);
        *px = luma_at(x, y, sequence);
    }
    // Chroma pairs follow the 2x2 block layout with a half-width row stride.
    let row_pairs = (width / 2).max(1) as usize;
    for (i, pair) in chroma.chunks_exact_mut(2).enumerate() {
        let bx = (i % row_pairs) as u32 * 2;
        let by = (i / row_pairs) as u32 * 2;
        pair[0] = cb_at(bx);
        pair[1] = cr_at(by);
    }
}

/// Fill `buf` with a YUYV frame, resizing it to fit
pub fn fill_yuyv(buf: &mut Vec<u8>, width: u32, height: u32, sequence: u64) {
    let pixels = width as usize * height as usize;
    buf.resize(pixels * 2, 0);
    for (g, group) in buf.chunks_exact_mut(4).enumerate() {
        let p0 = g * 2;
        let (x0, y0) = ((p0 % width as usize) as u32, (p0 / width as usize) as u32);
        let p1 = p0 + 1;
        let (x1, y1) = ((p1 % width as usize) as u32, (p1 / width as usize) as u32);
        group[0] = luma_at(x0, y0, sequence);
        group[1] = cb_at(x0);
        group[2] = luma_at(x1, y1, sequence);
        group[3] = cr_at(y0);
    }
}

/// RGB rendition of the pattern
pub fn rgb_pattern(width: u32, height: u32, sequence: u64) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let l = luma_at(x, y, sequence);
        Rgb([l, cb_at(x), cr_at(y)])
    })
}

/// JPEG-encode the pattern
pub fn jpeg_frame(width: u32, height: u32, sequence: u64, quality: u8) -> CameraResult<Vec<u8>> {
    let img = rgb_pattern(width, height, sequence);
    let mut buf = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode_image(&img)
        .map_err(|e| CameraError::backend("encode synthetic JPEG", e))?;
    Ok(buf)
}
