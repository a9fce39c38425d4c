use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_NR_BINS, DEFAULT_OUTPUT_IMAGES};
use crate::error::{EsiError, Result};
use crate::filters::gaussian_blur::BlurConfig;
use crate::filters::normalize::OutputNormalization;
use crate::reconstruct::{Execution, ReconstructionParams};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of reconstructions; the input is split into this many
    /// equally long sub-stacks.
    #[serde(default = "default_output_images")]
    pub output_images: usize,
    /// Histogram bins per trace.
    #[serde(default = "default_nr_bins")]
    pub nr_bins: usize,
    #[serde(default)]
    pub reconstruction: ReconstructionParams,
    #[serde(default)]
    pub execution: Execution,
    #[serde(default)]
    pub normalization: OutputNormalization,
    /// Global sample range used to normalize every trace. Computed from the
    /// whole input when absent.
    #[serde(default)]
    pub pixel_range: Option<PixelRange>,
    #[serde(default)]
    pub blur: BlurConfig,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PixelRange {
    pub min: f32,
    pub max: f32,
}

fn default_output_images() -> usize {
    DEFAULT_OUTPUT_IMAGES
}

fn default_nr_bins() -> usize {
    DEFAULT_NR_BINS
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            output_images: DEFAULT_OUTPUT_IMAGES,
            nr_bins: DEFAULT_NR_BINS,
            reconstruction: ReconstructionParams::default(),
            execution: Execution::default(),
            normalization: OutputNormalization::default(),
            pixel_range: None,
            blur: BlurConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output_images == 0 {
            return Err(invalid("output image count must be at least 1"));
        }
        if self.nr_bins == 0 {
            return Err(invalid("bin count must be at least 1"));
        }
        if !self.reconstruction.order.is_finite() {
            return Err(invalid("moment order must be finite"));
        }
        if self.execution == (Execution::Parallel { threads: Some(0) }) {
            return Err(invalid("thread count must be at least 1"));
        }
        if let Some(range) = self.pixel_range {
            if !range.min.is_finite() || !range.max.is_finite() || range.min >= range.max {
                return Err(EsiError::DegenerateRange {
                    min: range.min,
                    max: range.max,
                });
            }
        }
        if self.blur.sigma_x < 0.0 || self.blur.sigma_y < 0.0 {
            return Err(invalid("blur sigma must not be negative"));
        }
        if !(self.blur.accuracy > 0.0 && self.blur.accuracy < 1.0) {
            return Err(invalid("blur accuracy must be in (0, 1)"));
        }
        Ok(())
    }

    /// Frames per sub-stack for an input of `total_frames`. Trailing frames
    /// that do not fill a whole sub-stack are ignored.
    pub fn frames_per_chunk(&self, total_frames: usize) -> Result<usize> {
        if self.output_images == 0 {
            return Err(invalid("output image count must be at least 1"));
        }
        match total_frames / self.output_images {
            0 => Err(EsiError::InvalidParameter(format!(
                "{} frames cannot fill {} output images",
                total_frames, self.output_images
            ))),
            n => Ok(n),
        }
    }
}

fn invalid(msg: &str) -> EsiError {
    EsiError::InvalidParameter(msg.into())
}
