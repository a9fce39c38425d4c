#![allow(dead_code)]

use esi_core::frame::Frame;
use esi_core::io::ser::SER_HEADER_SIZE;
use esi_core::trace::TraceStack;
use ndarray::Array2;

/// `count` frames of `height x width` where every sample equals `value`.
pub fn constant_frames(width: usize, height: usize, count: usize, value: f32) -> Vec<Frame> {
    (0..count)
        .map(|_| Frame::new(Array2::from_elem((height, width), value), 32))
        .collect()
}

/// Deterministic pseudo-random frames with samples in `[0, 100)`.
pub fn noisy_frames(width: usize, height: usize, count: usize, seed: u64) -> Vec<Frame> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..count)
        .map(|_| {
            let data = Array2::from_shape_fn((height, width), |_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 33) % 10_000) as f32 / 100.0
            });
            Frame::new(data, 32)
        })
        .collect()
}

/// Trace stack over `frames`, normalized with `[min, max]` and binned.
pub fn prepared_stack(frames: &[Frame], min: f32, max: f32, nr_bins: usize) -> TraceStack {
    let mut stack = TraceStack::from_frames(frames).expect("build stack");
    stack.normalize_from(min, max).expect("normalize");
    stack.create_norm_binning(nr_bins).expect("bin");
    stack
}

/// Build a SER file header for mono frames.
pub fn build_ser_header(width: u32, height: u32, bit_depth: u32, num_frames: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);

    buf.extend_from_slice(b"LUCAM-RECORDER");
    // LuID
    buf.extend_from_slice(&0i32.to_le_bytes());
    // ColorID = MONO
    buf.extend_from_slice(&0i32.to_le_bytes());
    // LittleEndian = 0 (little-endian per Siril convention)
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    // Observer, Instrument, Telescope
    buf.extend_from_slice(&[0u8; 120]);
    // DateTime, DateTimeUTC
    buf.extend_from_slice(&[0u8; 16]);

    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Complete mono 8-bit SER file with the given frame data.
pub fn build_ser_with_frames(width: u32, height: u32, frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = build_ser_header(width, height, 8, frames.len());
    for frame in frames {
        buf.extend_from_slice(frame);
    }
    buf
}

/// Write bytes to a temporary file that lives as long as the handle.
pub fn write_temp_file(data: &[u8]) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut f = tempfile::NamedTempFile::new().expect("create temp file");
    f.write_all(data).expect("write data");
    f.flush().expect("flush");
    f
}
