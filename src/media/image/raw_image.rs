// SPDX-License-Identifier: GPL-3.0-only

//! Construct raw images from a pixel format and geometry

use super::{Image, Nv12Image, Rect, YuyvImage};
use crate::backends::camera::types::FrameData;
use crate::errors::{CameraError, CameraResult, ResultExt};
use crate::media::formats::PixelFormat;

/// Exact buffer length a raw frame of this format and geometry must have
pub fn raw_image_len(pixel_format: PixelFormat, width: u64, height: u64) -> CameraResult<usize> {
    let rect = Rect::from_size(width, height)?;
    match pixel_format {
        PixelFormat::NV12 => Ok(Nv12Image::expected_len(rect)),
        PixelFormat::YUYV => Ok(YuyvImage::expected_len(rect)),
        other => Err(unsupported(other)),
    }
}

/// Zero-copy image over `data`, validated against the geometry
pub fn new_raw_image(
    pixel_format: PixelFormat,
    width: u64,
    height: u64,
    data: FrameData,
) -> CameraResult<Image> {
    let rect = Rect::from_size(width, height)?;
    let image = match pixel_format {
        PixelFormat::NV12 => Nv12Image::with_data(rect, data).map(Image::Nv12),
        PixelFormat::YUYV => YuyvImage::with_data(rect, data).map(Image::Yuyv),
        other => Err(unsupported(other)),
    };
    image.with_context(|| format!("pixel format {}", pixel_format))
}

/// Zero-filled image of the given format and geometry
pub fn allocate_raw_image(pixel_format: PixelFormat, width: u64, height: u64) -> CameraResult<Image> {
    let rect = Rect::from_size(width, height)?;
    match pixel_format {
        PixelFormat::NV12 => Ok(Image::Nv12(Nv12Image::new(rect))),
        PixelFormat::YUYV => Ok(Image::Yuyv(YuyvImage::new(rect))),
        other => Err(unsupported(other)),
    }
}

fn unsupported(pixel_format: PixelFormat) -> CameraError {
    CameraError::InvalidFormat(format!("unsupported raw pixel format '{}'", pixel_format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_three_bytes_for_2x2_nv12() {
        let err = new_raw_image(PixelFormat::NV12, 2, 2, FrameData::new(vec![0; 3])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SizeMismatch);
        assert!(err.to_string().contains("NV12"));
    }

    #[test]
    fn test_unsupported_format() {
        let err = new_raw_image(PixelFormat::MJPEG, 2, 2, FrameData::new(vec![0; 8])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(raw_image_len(PixelFormat::YU12, 2, 2).is_err());
    }

    #[test]
    fn test_lengths() {
        assert_eq!(raw_image_len(PixelFormat::NV12, 640, 480).unwrap(), 460_800);
        assert_eq!(raw_image_len(PixelFormat::YUYV, 640, 480).unwrap(), 614_400);
    }

    #[test]
    fn test_allocate_matches_len() {
        let img = allocate_raw_image(PixelFormat::YUYV, 4, 2).unwrap();
        assert_eq!(img.as_yuyv().unwrap().rect(), Rect::new(0, 0, 4, 2));
        assert_eq!(img.width(), 4);
    }
}
