// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Listing the capture modes of a camera
//! - Taking photos

use camera_capture::backends::camera::synthetic::SyntheticPlatform;
use camera_capture::backends::camera::{
    CancellationToken, DevicePathAndPlatform, Frame, FramesCompressed, FramesData, Registry,
};
use camera_capture::media::decoders::new_frame_decoder;
use camera_capture::media::decompressors::new_frame_decompressor;
use camera_capture::media::formats::{Format, Formats};
use camera_capture::media::image::Image;
use camera_capture::Config;
use std::path::Path;
use std::sync::Arc;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Read the configuration file, or defaults when none is given
pub fn load_config(path: Option<&Path>) -> CliResult<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None => Ok(Config::default()),
    }
}

/// Registry holding the platforms the configuration asks for
fn build_registry(config: &Config) -> CliResult<Registry> {
    let registry = Registry::new();
    #[cfg(all(target_os = "linux", feature = "v4l2"))]
    registry.register_platform(Arc::new(
        camera_capture::backends::camera::v4l2::V4l2Platform::with_polling(config.polling),
    ))?;
    if config.synthetic {
        registry.register_platform(Arc::new(SyntheticPlatform::new().with_polling(config.polling)))?;
    }
    Ok(registry)
}

/// Cameras matching the configured platform and device, in listing order
fn cameras(config: &Config) -> CliResult<Vec<DevicePathAndPlatform>> {
    let listing = build_registry(config)?.list_cameras();
    for failure in &listing.failures {
        eprintln!("Warning: {} cameras unavailable: {}", failure.platform, failure.error);
    }
    Ok(listing
        .cameras
        .into_iter()
        .filter(|c| config.platform.as_ref().is_none_or(|p| &c.platform_id() == p))
        .filter(|c| config.device.as_ref().is_none_or(|d| &c.device_path == d))
        .collect())
}

fn select_camera(config: &Config, index: usize) -> CliResult<DevicePathAndPlatform> {
    let mut cameras = cameras(config)?;
    if cameras.is_empty() {
        return Err("No cameras found".into());
    }
    if index >= cameras.len() {
        return Err(format!(
            "Camera index {} out of range (0-{})",
            index,
            cameras.len() - 1
        )
        .into());
    }
    Ok(cameras.swap_remove(index))
}

/// Distinct resolutions with their best frame rate, largest first
fn resolution_summary(formats: &Formats) -> Vec<String> {
    let mut resolutions: Vec<(u64, u64, f64)> = Vec::new();
    for format in formats.iter() {
        let fps = format.fps.as_f64();
        if let Some(existing) = resolutions
            .iter_mut()
            .find(|(w, h, _)| *w == format.width && *h == format.height)
        {
            if fps > existing.2 {
                existing.2 = fps;
            }
        } else {
            resolutions.push((format.width, format.height, fps));
        }
    }
    resolutions.sort_by(|a, b| (b.0 * b.1).cmp(&(a.0 * a.1)));
    resolutions
        .iter()
        .map(|(w, h, fps)| format!("{}x{}@{}fps", w, h, fps.round()))
        .collect()
}

/// List all available cameras
pub fn list_cameras(config: &Config) -> CliResult<()> {
    let cameras = cameras(config)?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera);
        match camera.list_formats() {
            Ok(formats) if !formats.is_empty() => {
                let summary = resolution_summary(&formats);
                // Show top 3 resolutions
                let shown: Vec<&str> = summary.iter().take(3).map(String::as_str).collect();
                println!("      Formats: {}", shown.join(", "));
            }
            Ok(_) => println!("      Formats: none"),
            Err(e) => println!("      Formats unavailable: {}", e),
        }
        println!();
    }

    Ok(())
}

/// List the capture modes of one camera
pub fn list_formats(config: &Config, camera_index: usize, json: bool) -> CliResult<()> {
    let camera = select_camera(config, camera_index)?;
    let formats = config.apply_filters(&camera.list_formats()?);

    if json {
        println!("{}", formats.to_json_pretty()?);
        return Ok(());
    }

    println!("Formats of {}:", camera);
    for format in formats.iter() {
        println!("  {}", format);
    }
    Ok(())
}

/// Capture one frame and save it to `output`
pub fn take_photo(config: &Config, camera_index: usize, output: &Path) -> CliResult<()> {
    let camera = select_camera(config, camera_index)?;
    println!("Using camera: {}", camera);

    let formats = config.apply_filters(&camera.list_formats()?);
    if formats.is_empty() {
        return Err("No capture mode matches the requested filters".into());
    }
    let format = formats.best_resolution();
    println!("Capture format: {}", format);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    println!("Capturing...");
    match config.compression {
        Some(compression) if compression.is_concrete() => {
            let request = Format::compressed(format.width, format.height, compression, format.fps);
            capture_compressed(config, &camera, &request, output)?
        }
        _ => capture_raw(config, &camera, &format, output)?,
    }

    println!("Photo saved: {}", output.display());
    Ok(())
}

fn save_image(image: &Image, output: &Path) -> CliResult<()> {
    match image.as_decoded() {
        Some(decoded) => decoded.save(output)?,
        None => image.to_luma8().save(output)?,
    }
    Ok(())
}

fn capture_raw(
    config: &Config,
    camera: &DevicePathAndPlatform,
    format: &Format,
    output: &Path,
) -> CliResult<()> {
    let mut session = camera.open_camera(format)?;
    let negotiated = session.format();
    let mut decoder = new_frame_decoder(&negotiated)?;
    session.start_streaming()?;

    let token = CancellationToken::with_timeout(config.frame_timeout());
    // The first frame after start often carries stale exposure.
    let warmup = session.get_frame(&token)?;
    session.release_frame(warmup)?;

    let frame = session.get_frame(&token)?;
    decoder.write_frames(frame.source().clone())?;
    let dst = decoder.allocate_image();
    let image = decoder.decode_frame(dst);
    // Raw images alias the frame slot, so save before handing it back.
    let saved = match image {
        Ok(img) => save_image(&img, output),
        Err(e) => Err(e.into()),
    };
    session.release_frame(frame)?;

    decoder.close()?;
    session.stop_streaming()?;
    session.close()?;
    saved
}

fn capture_compressed(
    config: &Config,
    camera: &DevicePathAndPlatform,
    format: &Format,
    output: &Path,
) -> CliResult<()> {
    let mut session =
        camera.open_camera_compressed(format, format.compression, config.compression_quality)?;
    let mut decompressor = new_frame_decompressor(session.compression())?;
    session.start_streaming()?;

    let token = CancellationToken::with_timeout(config.frame_timeout());
    let frame = session.get_frame(&token)?;
    println!("Compressed frame: {} bytes ({})", frame.bytes().len(), frame.compression());
    decompressor.write_compressed(&frame)?;
    session.release_frame(frame)?;

    let decoded = decompressor.decompress_next()?;
    save_image(decoded.image(), output)?;
    decompressor.release_frame(decoded);

    decompressor.close()?;
    session.stop_streaming()?;
    session.close()?;
    Ok(())
}
