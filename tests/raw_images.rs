// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for zero-copy raw image views

use camera_capture::backends::camera::FrameData;
use camera_capture::media::image::{
    Image, Nv12Image, Rect, YCbCr, YCbCrImage, YuyvImage, new_raw_image, raw_image_len,
};
use camera_capture::{CameraError, ErrorKind, PixelFormat};

#[test]
fn test_nv12_every_pixel_readable_for_exact_lengths() {
    for width in 1..=7u64 {
        for height in 1..=5u64 {
            let len = raw_image_len(PixelFormat::NV12, width, height).unwrap();
            assert_eq!(len, ((width * height * 3 + 1) / 2) as usize);
            let bytes: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let image = new_raw_image(PixelFormat::NV12, width, height, FrameData::new(bytes))
                .unwrap();
            let view = image.as_ycbcr().unwrap();
            for y in 0..height as i32 {
                for x in 0..width as i32 {
                    let px = view.ycbcr_at(x, y);
                    assert_eq!(px.y, (y as u64 * width + x as u64) as u8, "{}x{} at ({}, {})", width, height, x, y);
                }
            }
        }
    }
}

#[test]
fn test_nv12_other_lengths_mismatch() {
    for (width, height) in [(2u64, 2u64), (4, 2), (3, 3), (640, 480)] {
        let exact = raw_image_len(PixelFormat::NV12, width, height).unwrap();
        for len in [0, exact - 1, exact + 1, exact * 2] {
            let err = new_raw_image(PixelFormat::NV12, width, height, FrameData::zeroed(len))
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::SizeMismatch);
        }
    }
}

#[test]
fn test_nv12_three_bytes_for_2x2() {
    let err = new_raw_image(PixelFormat::NV12, 2, 2, FrameData::new(vec![1, 2, 3])).unwrap_err();
    match err.root() {
        CameraError::SizeMismatch {
            pixel_format,
            expected,
            received,
        } => {
            assert_eq!(*pixel_format, PixelFormat::NV12);
            assert_eq!((*expected, *received), (6, 3));
        }
        other => panic!("unexpected error {}", other),
    }
    assert!(err.to_string().contains("NV12"));
}

#[test]
fn test_nv12_2x2_shares_one_chroma_pair() {
    let image = Nv12Image::with_data(
        Rect::new(0, 0, 2, 2),
        FrameData::new(vec![10, 20, 30, 40, 100, 200]),
    )
    .unwrap();
    assert_eq!(image.ycbcr_at(0, 0), YCbCr::new(10, 100, 200));
    assert_eq!(image.ycbcr_at(1, 0), YCbCr::new(20, 100, 200));
    assert_eq!(image.ycbcr_at(0, 1), YCbCr::new(30, 100, 200));
    assert_eq!(image.ycbcr_at(1, 1), YCbCr::new(40, 100, 200));
}

#[test]
fn test_yuyv_pairs_share_chroma() {
    let (width, height) = (6u64, 3u64);
    let len = raw_image_len(PixelFormat::YUYV, width, height).unwrap();
    assert_eq!(len, 36);
    let bytes: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
    let image = YuyvImage::with_data(Rect::new(0, 0, 6, 3), FrameData::new(bytes)).unwrap();
    for y in 0..3 {
        for k in 0..3 {
            let even = image.ycbcr_at(2 * k, y);
            let odd = image.ycbcr_at(2 * k + 1, y);
            assert_eq!((even.cb, even.cr), (odd.cb, odd.cr));
        }
    }
}

#[test]
fn test_yuyv_length_mismatch() {
    let err = new_raw_image(PixelFormat::YUYV, 4, 2, FrameData::zeroed(15)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SizeMismatch);
    assert!(err.to_string().contains("YUYV"));
}

#[test]
fn test_unsupported_pixel_format() {
    let err = new_raw_image(PixelFormat::MJPEG, 4, 2, FrameData::zeroed(16)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_nv12_sub_image_aliases_parent() {
    let mut parent = Nv12Image::new(Rect::new(0, 0, 8, 6));
    let mut sub = parent.sub_image(Rect::new(2, 2, 6, 6));
    assert_eq!(sub.bounds(), Rect::new(2, 2, 6, 6));

    parent.set_ycbcr(3, 3, YCbCr::new(7, 8, 9));
    assert_eq!(sub.ycbcr_at(3, 3), YCbCr::new(7, 8, 9));

    sub.set_ycbcr(5, 4, YCbCr::new(50, 60, 70));
    assert_eq!(parent.ycbcr_at(5, 4), YCbCr::new(50, 60, 70));
    assert!(sub.data().ptr_eq(parent.data()));
}

#[test]
fn test_yuyv_sub_image_aliases_parent() {
    let mut parent = YuyvImage::new(Rect::new(0, 0, 8, 4));
    let mut sub = parent.sub_image(Rect::new(2, 1, 6, 3));

    sub.set_ycbcr(4, 2, YCbCr::new(11, 22, 33));
    assert_eq!(parent.ycbcr_at(4, 2), YCbCr::new(11, 22, 33));

    parent.set_ycbcr(3, 1, YCbCr::new(44, 55, 66));
    assert_eq!(sub.ycbcr_at(3, 1).y, 44);
}

#[test]
fn test_sub_image_outside_is_empty() {
    let parent = Nv12Image::new(Rect::new(0, 0, 4, 4));
    let sub = parent.sub_image(Rect::new(10, 10, 12, 12));
    assert!(sub.bounds().is_empty());
}

#[test]
fn test_reads_see_rewritten_slot() {
    let data = FrameData::zeroed(6);
    let image = new_raw_image(PixelFormat::NV12, 2, 2, data.clone()).unwrap();
    data.write()[0] = 99;
    let Image::Nv12(nv12) = &image else {
        panic!("expected NV12 image");
    };
    assert_eq!(nv12.ycbcr_at(0, 0).y, 99);
}
