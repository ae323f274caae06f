// SPDX-License-Identifier: GPL-3.0-only

//! Zero-copy decoder for raw NV12 and YUYV frames

use super::FrameDecoder;
use crate::backends::camera::types::{FrameData, FrameSource};
use crate::errors::{CameraError, CameraResult, ResultExt};
use crate::media::formats::{Format, PixelFormat};
use crate::media::image::{Image, allocate_raw_image, new_raw_image};
use tracing::warn;

/// Decoder for device-native raw layouts
///
/// Holds at most one staged frame. A successful decode clears it; a failed
/// one leaves it in place so the caller can inspect or replace it.
#[derive(Debug)]
pub struct RawFrameDecoder {
    pixel_format: PixelFormat,
    width: u64,
    height: u64,
    staged: Option<FrameSource>,
}

impl RawFrameDecoder {
    pub fn new(format: &Format) -> CameraResult<Self> {
        if !format.pixel_format.is_decodable_raw() {
            return Err(CameraError::InvalidFormat(format!(
                "raw decoder cannot handle pixel format '{}'",
                format.pixel_format
            )));
        }
        Ok(Self {
            pixel_format: format.pixel_format,
            width: format.width,
            height: format.height,
            staged: None,
        })
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// The frame waiting to be decoded, if any
    pub fn staged(&self) -> Option<&FrameSource> {
        self.staged.as_ref()
    }

    fn decode_raw(&self, data: &FrameData, dst: Option<Image>) -> CameraResult<Image> {
        match dst {
            Some(mut image) if image.pixel_format() == Some(self.pixel_format) => {
                image.set_bytes(data.clone())?;
                Ok(image)
            }
            _ => new_raw_image(self.pixel_format, self.width, self.height, data.clone()),
        }
    }
}

impl FrameDecoder for RawFrameDecoder {
    fn allocate_image(&self) -> Option<Image> {
        allocate_raw_image(self.pixel_format, self.width, self.height).ok()
    }

    fn write_frames(&mut self, frames: FrameSource) -> CameraResult<()> {
        self.staged = Some(frames);
        Ok(())
    }

    fn decode_frame(&mut self, dst: Option<Image>) -> CameraResult<Image> {
        let data = match self.staged.take() {
            None => {
                return Err(CameraError::InvalidFormat("no frame staged for decoding".into()));
            }
            Some(FrameSource::Decoded(image)) => return Ok(image),
            Some(FrameSource::Raw(data)) => data,
        };
        match self
            .decode_raw(&data, dst)
            .with_context(|| format!("pixel format {}", self.pixel_format))
        {
            Ok(image) => Ok(image),
            Err(e) => {
                warn!(error = %e, "Raw frame decode failed");
                self.staged = Some(FrameSource::Raw(data));
                Err(e)
            }
        }
    }

    fn close(&mut self) -> CameraResult<()> {
        self.staged = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::FrameData;
    use crate::errors::ErrorKind;
    use crate::media::formats::Fraction;
    use crate::media::image::{YCbCr, YCbCrImage};

    fn nv12_2x2() -> RawFrameDecoder {
        RawFrameDecoder::new(&Format::raw(2, 2, PixelFormat::NV12, Fraction::new(30, 1))).unwrap()
    }

    #[test]
    fn test_decode_without_stage_fails() {
        let mut decoder = nv12_2x2();
        let err = decoder.decode_frame(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_decode_clears_stage() {
        let mut decoder = nv12_2x2();
        let data = FrameData::new(vec![1, 2, 3, 4, 5, 6]);
        decoder.write_frames(data.clone().into()).unwrap();
        let image = decoder.decode_frame(None).unwrap();
        assert!(decoder.staged().is_none());
        let nv12 = image.as_nv12().unwrap();
        assert!(nv12.data().ptr_eq(&data));
        assert_eq!(nv12.ycbcr_at(1, 1), YCbCr::new(4, 5, 6));
    }

    #[test]
    fn test_size_mismatch_retains_stage() {
        let mut decoder = nv12_2x2();
        decoder
            .write_frames(FrameData::new(vec![0; 3]).into())
            .unwrap();
        let err = decoder.decode_frame(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SizeMismatch);
        assert!(err.to_string().contains("NV12"));
        assert!(decoder.staged().is_some());
    }

    #[test]
    fn test_second_write_overwrites_stage() {
        let mut decoder = nv12_2x2();
        decoder.write_frames(FrameData::new(vec![0; 3]).into()).unwrap();
        decoder.write_frames(FrameData::new(vec![9; 6]).into()).unwrap();
        let image = decoder.decode_frame(None).unwrap();
        assert_eq!(image.as_nv12().unwrap().ycbcr_at(0, 0).y, 9);
    }

    #[test]
    fn test_reuses_destination_of_matching_kind() {
        let mut decoder = nv12_2x2();
        let dst = decoder.allocate_image();
        let data = FrameData::new(vec![7; 6]);
        decoder.write_frames(data.clone().into()).unwrap();
        let image = decoder.decode_frame(dst).unwrap();
        assert!(image.as_nv12().unwrap().data().ptr_eq(&data));
    }

    #[test]
    fn test_wrong_destination_kind_is_replaced() {
        let mut decoder = nv12_2x2();
        let dst = allocate_raw_image(PixelFormat::YUYV, 2, 2).unwrap();
        decoder.write_frames(FrameData::new(vec![7; 6]).into()).unwrap();
        let image = decoder.decode_frame(Some(dst)).unwrap();
        assert_eq!(image.pixel_format(), Some(PixelFormat::NV12));
    }

    #[test]
    fn test_pre_decoded_passes_through() {
        let mut decoder = nv12_2x2();
        let img = Image::Decoded(image::DynamicImage::new_rgb8(1920, 1080));
        let pixels = img.as_decoded().unwrap().as_bytes().as_ptr();
        decoder.write_frames(img.into()).unwrap();
        let out = decoder.decode_frame(None).unwrap();
        assert!(decoder.staged().is_none());
        let decoded = out.as_decoded().unwrap();
        assert_eq!(decoded.width(), 1920);
        // Handed over, not copied
        assert_eq!(decoded.as_bytes().as_ptr(), pixels);
    }
}
