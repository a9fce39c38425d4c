use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageBuffer, ImageFormat, Luma};
use ndarray::Array2;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{colortype, TiffEncoder};

use crate::error::{EsiError, Result};
use crate::filters::normalize::normalize_unit;
use crate::frame::Frame;

const IMAGE_EXTENSIONS: &[&str] = &["tif", "tiff", "png", "jpg", "jpeg", "bmp"];

/// Load a grayscale image file into a Frame with samples in `[0, 1]`.
pub fn load_image(path: &Path) -> Result<Frame> {
    let img = image::open(path)?;
    let gray = img.to_luma16();
    let (w, h) = gray.dimensions();
    let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        gray.get_pixel(col as u32, row as u32).0[0] as f32 / 65535.0
    });
    Ok(Frame::new(data, 16))
}

/// Load every page of a grayscale TIFF.
///
/// 8- and 16-bit pages are scaled to `[0, 1]`; 32-bit float pages are kept
/// as stored. All pages must share the first page's size.
pub fn load_tiff_stack(path: &Path) -> Result<Vec<Frame>> {
    let reader = BufReader::new(File::open(path)?);
    let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());

    let mut frames: Vec<Frame> = Vec::new();
    loop {
        let frame = decode_page(&mut decoder)?;
        if let Some(first) = frames.first() {
            check_same_size(first, &frame, frames.len())?;
        }
        frames.push(frame);

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }
    Ok(frames)
}

fn decode_page(decoder: &mut Decoder<BufReader<File>>) -> Result<Frame> {
    match decoder.colortype()? {
        tiff::ColorType::Gray(_) => {}
        other => return Err(EsiError::UnsupportedFormat(format!("{other:?} TIFF page"))),
    }
    let (w, h) = decoder.dimensions()?;

    let (samples, bit_depth): (Vec<f32>, u8) = match decoder.read_image()? {
        DecodingResult::U8(buf) => (buf.iter().map(|&v| v as f32 / 255.0).collect(), 8),
        DecodingResult::U16(buf) => (buf.iter().map(|&v| v as f32 / 65535.0).collect(), 16),
        DecodingResult::F32(buf) => (buf, 32),
        _ => {
            return Err(EsiError::UnsupportedFormat(
                "TIFF pages must be 8-bit, 16-bit or 32-bit float".into(),
            ))
        }
    };

    let (w, h) = (w as usize, h as usize);
    let data = Array2::from_shape_vec((h, w), samples).map_err(|_| EsiError::InvalidDimensions {
        width: w,
        height: h,
    })?;
    Ok(Frame::new(data, bit_depth))
}

fn check_same_size(first: &Frame, frame: &Frame, index: usize) -> Result<()> {
    if first.data.dim() != frame.data.dim() {
        return Err(EsiError::FrameSizeMismatch {
            index,
            width: first.width(),
            height: first.height(),
            found_width: frame.width(),
            found_height: frame.height(),
        });
    }
    Ok(())
}

pub(crate) fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "tif" | "tiff"))
}

/// Image files in `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_image_extension(p))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Load every file of `paths` as one frame sequence. Multi-page TIFFs
/// contribute all of their pages in order.
pub fn load_frames(paths: &[PathBuf]) -> Result<Vec<Frame>> {
    let mut frames: Vec<Frame> = Vec::with_capacity(paths.len());
    for path in paths {
        let pages = if is_tiff(path) {
            load_tiff_stack(path)?
        } else {
            vec![load_image(path)?]
        };
        for frame in pages {
            if let Some(first) = frames.first() {
                check_same_size(first, &frame, frames.len())?;
            }
            frames.push(frame);
        }
    }
    Ok(frames)
}

pub(crate) fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Samples ready for quantization: unchanged when already inside `[0, 1]`,
/// otherwise stretched from their own range.
fn display_range(frame: &Frame) -> Array2<f32> {
    let mut data = frame.data.clone();
    if data.iter().any(|v| !(0.0..=1.0).contains(v)) {
        normalize_unit(&mut data);
    }
    data
}

/// Save a frame as 16-bit grayscale TIFF.
pub fn save_tiff(frame: &Frame, path: &Path) -> Result<()> {
    let data = display_range(frame);
    let (h, w) = data.dim();
    let pixels: Vec<u16> = data
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 65535.0) as u16)
        .collect();

    let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
        .ok_or(EsiError::InvalidDimensions {
            width: w,
            height: h,
        })?;
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save a frame as 32-bit float TIFF with its values unchanged.
pub fn save_tiff_f32(frame: &Frame, path: &Path) -> Result<()> {
    save_tiff_stack(std::slice::from_ref(frame), path)
}

/// Save frames as one multi-page 32-bit float TIFF, one page per frame.
pub fn save_tiff_stack(frames: &[Frame], path: &Path) -> Result<()> {
    if frames.is_empty() {
        return Err(EsiError::EmptySequence);
    }
    let mut encoder = TiffEncoder::new(File::create(path)?)?;
    for frame in frames {
        let samples: Vec<f32> = frame.data.iter().copied().collect();
        encoder.write_image::<colortype::Gray32Float>(
            frame.width() as u32,
            frame.height() as u32,
            &samples,
        )?;
    }
    Ok(())
}

/// Save a frame as 8-bit grayscale PNG.
pub fn save_png(frame: &Frame, path: &Path) -> Result<()> {
    let data = display_range(frame);
    let (h, w) = data.dim();
    let pixels: Vec<u8> = data
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8)
        .collect();

    let img = GrayImage::from_raw(w as u32, h as u32, pixels).ok_or(
        EsiError::InvalidDimensions {
            width: w,
            height: h,
        },
    )?;
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save frame, choosing format from file extension.
pub fn save_image(frame: &Frame, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_png(frame, path),
        _ => save_tiff(frame, path),
    }
}
