use crate::error::{EsiError, Result};
use crate::frame::scan_min_max;

/// Intensity time-series of one pixel across the frames of a sub-stack.
///
/// The sample count (`depth`) is fixed at construction. The probability
/// histogram is absent until [`PixelTrace::create_binning`] runs and is
/// dropped again whenever the samples change.
#[derive(Clone, Debug)]
pub struct PixelTrace {
    data: Vec<f32>,
    probs: Option<Vec<f64>>,
}

impl PixelTrace {
    /// Zero-filled trace of `depth` samples.
    pub fn new(depth: usize) -> Self {
        Self {
            data: vec![0.0; depth],
            probs: None,
        }
    }

    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self {
            data: samples,
            probs: None,
        }
    }

    pub fn depth(&self) -> usize {
        self.data.len()
    }

    pub fn samples(&self) -> &[f32] {
        &self.data
    }

    /// Relative bin frequencies, if binning has been computed.
    pub fn probabilities(&self) -> Option<&[f64]> {
        self.probs.as_deref()
    }

    pub fn is_binned(&self) -> bool {
        self.probs.is_some()
    }

    pub fn get(&self, n: usize) -> Result<f32> {
        self.data
            .get(n)
            .copied()
            .ok_or(EsiError::SampleIndexOutOfRange {
                index: n,
                depth: self.depth(),
            })
    }

    pub fn set(&mut self, n: usize, value: f32) -> Result<()> {
        let depth = self.depth();
        let slot = self
            .data
            .get_mut(n)
            .ok_or(EsiError::SampleIndexOutOfRange { index: n, depth })?;
        *slot = value;
        self.probs = None;
        Ok(())
    }

    /// Direct sample access for bulk population by the owning stack.
    pub(crate) fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Linear remap of every sample to `(v - min) / (max - min)`.
    ///
    /// Values outside `[min, max]` land outside `[0, 1]`; nothing is clamped.
    pub fn scale(&mut self, min: f32, max: f32) -> Result<()> {
        check_range(min, max)?;
        let range = max - min;
        for v in &mut self.data {
            *v = (*v - min) / range;
        }
        self.probs = None;
        Ok(())
    }

    /// Build a relative-frequency histogram of `nr_bins` equal-width buckets
    /// over `[min, max]`.
    ///
    /// Out-of-range samples collapse into the first or last bucket.
    pub fn create_binning(&mut self, nr_bins: usize, min: f32, max: f32) -> Result<()> {
        if nr_bins == 0 {
            return Err(EsiError::InvalidParameter(
                "bin count must be at least 1".into(),
            ));
        }
        check_range(min, max)?;

        let range = max - min;
        let last = nr_bins - 1;
        let mut probs = vec![0.0f64; nr_bins];
        for &v in &self.data {
            // NaN saturates to 0 in the cast.
            let idx = (((v - min) / range) * nr_bins as f32).floor() as isize;
            probs[idx.clamp(0, last as isize) as usize] += 1.0;
        }

        if !self.data.is_empty() {
            let depth = self.data.len() as f64;
            for p in &mut probs {
                *p /= depth;
            }
        }

        self.probs = Some(probs);
        Ok(())
    }

    /// Binning over the normalized range `[0, 1]`.
    pub fn create_norm_binning(&mut self, nr_bins: usize) -> Result<()> {
        self.create_binning(nr_bins, 0.0, 1.0)
    }

    /// Arithmetic mean of all samples.
    pub fn mean(&self) -> f32 {
        self.data.iter().sum::<f32>() / self.depth() as f32
    }

    /// Mean of `sample^order` (not centered).
    pub fn raw_moment(&self, order: f32) -> f32 {
        self.data.iter().map(|v| v.powf(order)).sum::<f32>() / self.depth() as f32
    }

    /// Time-weighted mean: the factor grows linearly from `weight` to
    /// `2 * weight` across the trace, so later samples count more.
    pub fn weighted_mean(&self, weight: f64) -> f64 {
        weighted_mean_of(self.data.iter().map(|&v| v as f64), self.depth(), weight)
    }

    pub fn min(&self) -> f32 {
        scan_min_max(self.data.iter().copied()).0
    }

    pub fn max(&self) -> f32 {
        scan_min_max(self.data.iter().copied()).1
    }

    /// Joint moment of two traces about their time-weighted means.
    ///
    /// Fails with [`EsiError::NanMoment`] when the result is NaN, e.g. for a
    /// fractional `order` applied to a negative deviation.
    pub fn joint_moment(x: &PixelTrace, y: &PixelTrace, order: f64) -> Result<f64> {
        if x.depth() != y.depth() {
            return Err(EsiError::DepthMismatch {
                left: x.depth(),
                right: y.depth(),
            });
        }

        let mean_x = x.weighted_mean(1.0);
        let mean_y = y.weighted_mean(1.0);

        let products = x.data.iter().zip(&y.data).map(|(&xv, &yv)| {
            (xv as f64 - mean_x).powf(order) * (yv as f64 - mean_y).powf(order)
        });
        let moment = weighted_mean_of(products, x.depth(), 1.0);

        if moment.is_nan() {
            return Err(EsiError::NanMoment { order });
        }
        Ok(moment)
    }

    /// Cross-entropy score of two binned traces, scaled by their joint moment.
    ///
    /// Both histograms must exist. Empty bins are skipped term by term, so no
    /// `log2(0)` is ever evaluated. The result is symmetric in `x` and `y`.
    pub fn cross_entropy(x: &PixelTrace, y: &PixelTrace, order: f64) -> Result<f32> {
        let (Some(px), Some(py)) = (x.probabilities(), y.probabilities()) else {
            return Err(EsiError::BinningNotInitialized);
        };
        if px.len() != py.len() {
            return Err(EsiError::BinCountMismatch {
                left: px.len(),
                right: py.len(),
            });
        }

        let mut h_sum = 0.0f64;
        for (&a, &b) in px.iter().zip(py) {
            let a_log_b = if b > 0.0 { a * b.log2() } else { 0.0 };
            let b_log_a = if a > 0.0 { b * a.log2() } else { 0.0 };
            h_sum += a_log_b + b_log_a;
        }

        let moment = Self::joint_moment(x, y, order)?;
        Ok((-h_sum * moment / 2.0) as f32)
    }
}

fn check_range(min: f32, max: f32) -> Result<()> {
    if !min.is_finite() || !max.is_finite() || min == max {
        return Err(EsiError::DegenerateRange { min, max });
    }
    Ok(())
}

fn weighted_mean_of<I>(values: I, depth: usize, weight: f64) -> f64
where
    I: Iterator<Item = f64>,
{
    let step = weight / depth as f64;
    let mut factor = weight;
    let mut acc = 0.0f64;
    for v in values {
        factor += step;
        acc += factor * v;
    }
    acc / depth as f64
}
