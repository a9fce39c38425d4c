use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use memmap2::Mmap;
use ndarray::Array2;

use crate::error::{EsiError, Result};
use crate::frame::{Frame, FrameSource};

pub const SER_HEADER_SIZE: usize = 178;
const SER_MAGIC: &[u8; 14] = b"LUCAM-RECORDER";

/// Color IDs of the interleaved three-plane layouts.
const SER_COLOR_RGB: i32 = 100;
const SER_COLOR_BGR: i32 = 101;

/// SER file header (178 bytes).
#[derive(Clone, Debug)]
pub struct SerHeader {
    pub color_id: i32,
    pub little_endian: bool,
    pub width: u32,
    pub height: u32,
    pub pixel_depth: u32,
    pub frame_count: u32,
    pub observer: String,
    pub instrument: String,
    pub telescope: String,
}

impl SerHeader {
    /// Bytes per sample (1 for 8-bit, 2 for 9-16 bit).
    pub fn bytes_per_sample(&self) -> usize {
        if self.pixel_depth <= 8 { 1 } else { 2 }
    }

    /// Number of planes per pixel (1 for mono/bayer, 3 for RGB/BGR).
    pub fn planes_per_pixel(&self) -> usize {
        match self.color_id {
            SER_COLOR_RGB | SER_COLOR_BGR => 3,
            _ => 1,
        }
    }

    pub fn frame_byte_size(&self) -> Result<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|px| px.checked_mul(self.bytes_per_sample() * self.planes_per_pixel()))
            .ok_or_else(|| EsiError::InvalidSer("frame size overflows".into()))
    }
}

/// Memory-mapped SER file reader.
///
/// Samples are scaled to `[0, 1]` by the header bit depth. Three-plane color
/// recordings are read through their green plane.
pub struct SerReader {
    mmap: Mmap,
    frame_bytes: usize,
    pub header: SerHeader,
}

impl SerReader {
    /// Open a SER file and parse its header.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is read-only and lives as long as the reader.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < SER_HEADER_SIZE {
            return Err(EsiError::InvalidSer("File too small for SER header".into()));
        }
        if &mmap[0..14] != SER_MAGIC {
            return Err(EsiError::InvalidSer("Missing LUCAM-RECORDER magic".into()));
        }

        let header = parse_header(&mmap[..SER_HEADER_SIZE])?;
        let frame_bytes = header.frame_byte_size()?;

        let expected = SER_HEADER_SIZE + frame_bytes * header.frame_count as usize;
        if mmap.len() < expected {
            return Err(EsiError::InvalidSer(format!(
                "File truncated: expected at least {} bytes, got {}",
                expected,
                mmap.len()
            )));
        }

        Ok(Self {
            mmap,
            frame_bytes,
            header,
        })
    }

    /// Raw bytes of one frame (zero-copy from the mapping).
    pub fn frame_raw(&self, index: usize) -> Result<&[u8]> {
        let total = self.header.frame_count as usize;
        if index >= total {
            return Err(EsiError::FrameIndexOutOfRange { index, total });
        }
        let offset = SER_HEADER_SIZE + index * self.frame_bytes;
        Ok(&self.mmap[offset..offset + self.frame_bytes])
    }

    /// Decode one frame to f32 samples.
    pub fn read_frame(&self, index: usize) -> Result<Frame> {
        let raw = self.frame_raw(index)?;
        let plane = if self.header.planes_per_pixel() == 1 { 0 } else { 1 };
        let data = decode_plane(raw, &self.header, plane);
        Ok(Frame::new(data, (self.header.bytes_per_sample() * 8) as u8))
    }
}

impl FrameSource for SerReader {
    fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.header.width as usize, self.header.height as usize)
    }

    fn frame(&self, index: usize) -> Result<Cow<'_, Frame>> {
        self.read_frame(index).map(Cow::Owned)
    }
}

fn parse_header(buf: &[u8]) -> Result<SerHeader> {
    let mut cursor = std::io::Cursor::new(&buf[14..]);

    let _lu_id = cursor.read_i32::<LittleEndian>()?;
    let color_id = cursor.read_i32::<LittleEndian>()?;
    let le_flag = cursor.read_i32::<LittleEndian>()?;
    let width = cursor.read_i32::<LittleEndian>()?;
    let height = cursor.read_i32::<LittleEndian>()?;
    let pixel_depth = cursor.read_i32::<LittleEndian>()?;
    let frame_count = cursor.read_i32::<LittleEndian>()?;

    if width <= 0 || height <= 0 {
        return Err(EsiError::InvalidDimensions {
            width: width.max(0) as usize,
            height: height.max(0) as usize,
        });
    }
    if !(1..=16).contains(&pixel_depth) {
        return Err(EsiError::InvalidSer(format!(
            "unsupported pixel depth {pixel_depth}"
        )));
    }
    if frame_count < 0 {
        return Err(EsiError::InvalidSer(format!(
            "negative frame count {frame_count}"
        )));
    }

    // Siril convention: anything but 1 is little-endian pixel data.
    let little_endian = le_flag != 1;

    Ok(SerHeader {
        color_id,
        little_endian,
        width: width as u32,
        height: height as u32,
        pixel_depth: pixel_depth as u32,
        frame_count: frame_count as u32,
        observer: read_fixed_string(&buf[42..82]),
        instrument: read_fixed_string(&buf[82..122]),
        telescope: read_fixed_string(&buf[122..162]),
    })
}

fn read_fixed_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

fn decode_plane(raw: &[u8], header: &SerHeader, plane: usize) -> Array2<f32> {
    let h = header.height as usize;
    let w = header.width as usize;
    let bps = header.bytes_per_sample();
    let planes = header.planes_per_pixel();
    let max_val = ((1u32 << header.pixel_depth) - 1) as f32;

    Array2::from_shape_fn((h, w), |(row, col)| {
        let idx = ((row * w + col) * planes + plane) * bps;
        let val = if bps == 1 {
            raw[idx] as f32
        } else {
            let pair = [raw[idx], raw[idx + 1]];
            if header.little_endian {
                u16::from_le_bytes(pair) as f32
            } else {
                u16::from_be_bytes(pair) as f32
            }
        };
        val / max_val
    })
}
