use ndarray::{Array2, ArrayViewMut1, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_BLUR_ACCURACY, DEFAULT_BLUR_SIGMA, PARALLEL_PIXEL_THRESHOLD};
use crate::frame::Frame;

/// Gaussian smoothing applied to each reconstruction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlurConfig {
    pub sigma_x: f32,
    pub sigma_y: f32,
    /// Kernel values below this fraction of the peak are truncated.
    pub accuracy: f32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            sigma_x: DEFAULT_BLUR_SIGMA,
            sigma_y: DEFAULT_BLUR_SIGMA,
            accuracy: DEFAULT_BLUR_ACCURACY,
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Horizontal,
    Vertical,
}

/// Apply Gaussian blur to a frame using separable 1D convolution.
pub fn gaussian_blur(frame: &Frame, config: &BlurConfig) -> Frame {
    let blurred = gaussian_blur_array(&frame.data, config.sigma_x, config.sigma_y, config.accuracy);
    Frame::new(blurred, frame.original_bit_depth)
}

/// Apply Gaussian blur to a raw array. Pixels beyond the edge repeat the
/// edge value.
pub fn gaussian_blur_array(
    data: &Array2<f32>,
    sigma_x: f32,
    sigma_y: f32,
    accuracy: f32,
) -> Array2<f32> {
    let row_pass = convolve(data, &make_gaussian_kernel(sigma_x, accuracy), Direction::Horizontal);
    convolve(&row_pass, &make_gaussian_kernel(sigma_y, accuracy), Direction::Vertical)
}

/// Normalized 1D kernel with radius `ceil(sigma * sqrt(-2 ln accuracy)) + 1`.
///
/// A non-positive sigma yields the identity kernel.
pub fn make_gaussian_kernel(sigma: f32, accuracy: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let accuracy = accuracy.clamp(f32::EPSILON, 0.5);
    let radius = (sigma * (-2.0 * accuracy.ln()).sqrt()).ceil() as usize + 1;
    let size = 2 * radius + 1;
    let mut kernel = vec![0.0f32; size];
    let s2 = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;

    for (i, k) in kernel.iter_mut().enumerate() {
        let x = i as f32 - radius as f32;
        *k = (-x * x / s2).exp();
        sum += *k;
    }

    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

fn convolve(data: &Array2<f32>, kernel: &[f32], direction: Direction) -> Array2<f32> {
    let (h, w) = data.dim();
    let radius = (kernel.len() / 2) as isize;

    let fill_row = |row: usize, mut out: ArrayViewMut1<f32>| {
        for (col, v) in out.iter_mut().enumerate() {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let offset = ki as isize - radius;
                let sample = match direction {
                    Direction::Horizontal => {
                        let src = (col as isize + offset).clamp(0, w as isize - 1) as usize;
                        data[[row, src]]
                    }
                    Direction::Vertical => {
                        let src = (row as isize + offset).clamp(0, h as isize - 1) as usize;
                        data[[src, col]]
                    }
                };
                sum += sample * kv;
            }
            *v = sum;
        }
    };

    let mut result = Array2::<f32>::zeros((h, w));
    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        result
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(row, out)| fill_row(row, out));
    } else {
        for (row, out) in result.axis_iter_mut(Axis(0)).enumerate() {
            fill_row(row, out);
        }
    }
    result
}
