use std::time::Instant;

use ndarray::Array2;
use tracing::{debug, info, warn};

use crate::consts::{MIN_INPUT_FRAMES, UPSAMPLE_FACTOR};
use crate::error::{EsiError, Result};
use crate::filters::normalize::add_into;
use crate::filters::postprocess;
use crate::frame::{stack_min_max, Frame, FrameSource};
use crate::reconstruct::reconstruct_with;
use crate::trace::TraceStack;

use super::config::AnalysisConfig;
use super::types::{AnalysisOutput, NoOpReporter, ProgressReporter};

/// Bit depth recorded on reconstructed frames.
const RESULT_BIT_DEPTH: u8 = 32;

/// Run the full analysis.
pub fn run_analysis<S>(source: &S, config: &AnalysisConfig) -> Result<AnalysisOutput>
where
    S: FrameSource + ?Sized,
{
    run_analysis_reported(source, config, &NoOpReporter)
}

/// Run the full analysis with a progress reporter.
///
/// The input is cut into `config.output_images` consecutive sub-stacks; each
/// is reconstructed, post-processed and added to the running sum.
pub fn run_analysis_reported<S>(
    source: &S,
    config: &AnalysisConfig,
    reporter: &dyn ProgressReporter,
) -> Result<AnalysisOutput>
where
    S: FrameSource + ?Sized,
{
    config.validate()?;

    let total = source.frame_count();
    if total < MIN_INPUT_FRAMES {
        warn!(total, min_frames = MIN_INPUT_FRAMES, "Too few input frames");
        return Err(EsiError::InvalidParameter(format!(
            "at least {MIN_INPUT_FRAMES} frames required, got {total}"
        )));
    }
    if total < config.output_images {
        warn!(
            total,
            output_images = config.output_images,
            "Fewer frames than output images"
        );
    }
    let per_chunk = config.frames_per_chunk(total)?;
    let chunks = config.output_images;
    if total % chunks != 0 {
        debug!(ignored = total % chunks, "Trailing frames do not fill a sub-stack");
    }

    let (min, max) = match config.pixel_range {
        Some(range) => (range.min, range.max),
        None => stack_min_max(source)?,
    };
    if min >= max {
        warn!(min, max, "Input has no usable intensity range");
        return Err(EsiError::DegenerateRange { min, max });
    }

    info!(
        total_frames = total,
        frames_per_chunk = per_chunk,
        chunks,
        min,
        max,
        execution = %config.execution,
        "Starting ESI analysis"
    );

    let (w, h) = source.dimensions();
    let mut summed = Array2::<f32>::zeros((UPSAMPLE_FACTOR * h, UPSAMPLE_FACTOR * w));
    let mut reconstructions = Vec::with_capacity(chunks);

    reporter.begin_analysis(chunks);
    for k in 0..chunks {
        reporter.begin_chunk(k, chunks);
        let started = Instant::now();

        let frame = reconstruct_chunk(source, k * per_chunk, (k + 1) * per_chunk, min, max, config)?;
        add_into(&mut summed, &frame.data)?;

        let elapsed = started.elapsed();
        info!(
            chunk = k + 1,
            chunks,
            elapsed_ms = elapsed.as_millis() as u64,
            "Sub-stack reconstructed"
        );
        reporter.chunk_ready(k, &frame);
        reporter.finish_chunk(k, elapsed);
        reconstructions.push(frame);
    }
    reporter.finish_analysis();

    Ok(AnalysisOutput {
        reconstructions,
        summed: Frame::new(summed, RESULT_BIT_DEPTH),
    })
}

/// Reconstruct frames `[start, end)` of `source`, normalized with the global
/// range `[min, max]`, and apply the configured post-processing.
pub fn reconstruct_chunk<S>(
    source: &S,
    start: usize,
    end: usize,
    min: f32,
    max: f32,
    config: &AnalysisConfig,
) -> Result<Frame>
where
    S: FrameSource + ?Sized,
{
    let mut stack = TraceStack::from_source(source, start, end)?;
    stack.normalize_from(min, max)?;
    stack.create_norm_binning(config.nr_bins)?;

    let raw = reconstruct_with(&stack, &config.reconstruction, config.execution)?;
    let data = postprocess(&raw, &config.blur, &config.normalization);
    Ok(Frame::new(data, RESULT_BIT_DEPTH))
}
