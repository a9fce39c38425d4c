use std::borrow::Cow;

use ndarray::Array2;
use num_traits::Float;

use crate::error::{EsiError, Result};

/// A single grayscale image frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Pixel data, row-major, shape = (height, width)
    pub data: Array2<f32>,
    /// Bit depth of the source samples (8, 16, or 32 for float input)
    pub original_bit_depth: u8,
}

impl Frame {
    pub fn new(data: Array2<f32>, bit_depth: u8) -> Self {
        Self {
            data,
            original_bit_depth: bit_depth,
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }
}

/// An indexed sequence of equally sized frames.
///
/// Implemented for in-memory frame lists and for file-backed readers, so the
/// trace stack can be populated from either without copying the sequence.
pub trait FrameSource {
    fn frame_count(&self) -> usize;

    /// `(width, height)` shared by every frame.
    fn dimensions(&self) -> (usize, usize);

    fn frame(&self, index: usize) -> Result<Cow<'_, Frame>>;
}

impl FrameSource for [Frame] {
    fn frame_count(&self) -> usize {
        self.len()
    }

    fn dimensions(&self) -> (usize, usize) {
        self.first().map_or((0, 0), |f| (f.width(), f.height()))
    }

    fn frame(&self, index: usize) -> Result<Cow<'_, Frame>> {
        self.get(index)
            .map(Cow::Borrowed)
            .ok_or(EsiError::FrameIndexOutOfRange {
                index,
                total: self.len(),
            })
    }
}

impl FrameSource for Vec<Frame> {
    fn frame_count(&self) -> usize {
        self.as_slice().frame_count()
    }

    fn dimensions(&self) -> (usize, usize) {
        self.as_slice().dimensions()
    }

    fn frame(&self, index: usize) -> Result<Cow<'_, Frame>> {
        self.as_slice().frame(index)
    }
}

/// Minimum and maximum of a sequence of floats.
///
/// Seeded with the most positive / most negative finite values, so an empty
/// input returns `(MAX, MIN)` and all-negative input is handled.
pub fn scan_min_max<T, I>(values: I) -> (T, T)
where
    T: Float,
    I: IntoIterator<Item = T>,
{
    values
        .into_iter()
        .fold((T::max_value(), T::min_value()), |(lo, hi), v| {
            (if v < lo { v } else { lo }, if v > hi { v } else { hi })
        })
}

/// Global pixel range over every frame of a source.
pub fn stack_min_max<S: FrameSource + ?Sized>(source: &S) -> Result<(f32, f32)> {
    if source.frame_count() == 0 {
        return Err(EsiError::EmptySequence);
    }

    let mut range = (f32::MAX, f32::MIN);
    for index in 0..source.frame_count() {
        let frame = source.frame(index)?;
        let (lo, hi) = scan_min_max(frame.data.iter().copied());
        range = (range.0.min(lo), range.1.max(hi));
    }
    Ok(range)
}
