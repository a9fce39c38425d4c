use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::consts::EPSILON;
use crate::error::{EsiError, Result};
use crate::frame::scan_min_max;

/// Output scaling applied after the blur.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum OutputNormalization {
    /// Keep raw entropy scores.
    None,
    /// Stretch to `[0, 1]`.
    #[default]
    Unit,
    /// Stretch to `[low, high]`.
    Range { low: f32, high: f32 },
}

impl std::fmt::Display for OutputNormalization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Unit => write!(f, "[0, 1]"),
            Self::Range { low, high } => write!(f, "[{low}, {high}]"),
        }
    }
}

impl OutputNormalization {
    pub fn apply(&self, data: &mut Array2<f32>) {
        match *self {
            Self::None => {}
            Self::Unit => normalize_unit(data),
            Self::Range { low, high } => normalize_range(data, low, high),
        }
    }
}

/// Linear stretch of the image's own range onto `[low, high]`.
///
/// A constant image maps to `low`.
pub fn normalize_range(data: &mut Array2<f32>, low: f32, high: f32) {
    if data.is_empty() {
        return;
    }
    let (min, max) = scan_min_max(data.iter().copied());
    let range = max - min;
    let range = if range.abs() < EPSILON { 1.0 } else { range };
    let span = high - low;
    data.mapv_inplace(|v| (v - min) / range * span + low);
}

pub fn normalize_unit(data: &mut Array2<f32>) {
    normalize_range(data, 0.0, 1.0);
}

/// Accumulate `image` into `sum`.
pub fn add_into(sum: &mut Array2<f32>, image: &Array2<f32>) -> Result<()> {
    if sum.dim() != image.dim() {
        let (h, w) = image.dim();
        return Err(EsiError::InvalidDimensions {
            width: w,
            height: h,
        });
    }
    *sum += image;
    Ok(())
}
