use tracing::debug;

use crate::error::{EsiError, Result};
use crate::frame::{scan_min_max, Frame, FrameSource};

use super::pixel::PixelTrace;

/// One [`PixelTrace`] per pixel of a frame, built from a contiguous range of
/// source frames. Traces are stored row-major (`n = y * width + x`).
#[derive(Clone, Debug)]
pub struct TraceStack {
    width: usize,
    height: usize,
    depth: usize,
    traces: Vec<PixelTrace>,
}

impl TraceStack {
    /// Build the stack from frames `[start, end)` of `source`.
    ///
    /// `end` is clamped to the source length; an empty range is an error.
    pub fn from_source<S: FrameSource + ?Sized>(
        source: &S,
        start: usize,
        end: usize,
    ) -> Result<Self> {
        let total = source.frame_count();
        let end = end.min(total);
        let start = start.min(end);
        if start == end {
            return Err(EsiError::EmptySequence);
        }

        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(EsiError::InvalidDimensions { width, height });
        }

        let depth = end - start;
        let mut traces = vec![PixelTrace::new(depth); width * height];

        for z in 0..depth {
            let index = start + z;
            let frame = source.frame(index)?;
            if frame.width() != width || frame.height() != height {
                return Err(EsiError::FrameSizeMismatch {
                    index,
                    width,
                    height,
                    found_width: frame.width(),
                    found_height: frame.height(),
                });
            }
            for (trace, &v) in traces.iter_mut().zip(frame.data.iter()) {
                trace.samples_mut()[z] = v;
            }
        }

        debug!(width, height, depth, start, "Trace stack populated");

        Ok(Self {
            width,
            height,
            depth,
            traces,
        })
    }

    /// Build the stack from a whole in-memory frame sequence.
    pub fn from_frames(frames: &[Frame]) -> Result<Self> {
        Self::from_source(frames, 0, frames.len())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn nr_traces(&self) -> usize {
        self.traces.len()
    }

    /// Trace at pixel `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the frame.
    pub fn get(&self, x: usize, y: usize) -> &PixelTrace {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) outside frame");
        &self.traces[y * self.width + x]
    }

    /// Trace at row-major index `n`.
    pub fn get_index(&self, n: usize) -> Result<&PixelTrace> {
        self.traces.get(n).ok_or(EsiError::TraceIndexOutOfRange {
            index: n,
            total: self.traces.len(),
        })
    }

    pub fn traces(&self) -> impl Iterator<Item = &PixelTrace> {
        self.traces.iter()
    }

    /// Rescale every trace with one shared range so that scores stay
    /// comparable between pixel locations.
    pub fn normalize_from(&mut self, min: f32, max: f32) -> Result<()> {
        for trace in &mut self.traces {
            trace.scale(min, max)?;
        }
        Ok(())
    }

    /// Histogram every trace over `[min, max]`; outliers go to the edge bins.
    pub fn create_binning(&mut self, nr_bins: usize, min: f32, max: f32) -> Result<()> {
        for trace in &mut self.traces {
            trace.create_binning(nr_bins, min, max)?;
        }
        Ok(())
    }

    /// Histogram every trace over `[0, 1]`.
    pub fn create_norm_binning(&mut self, nr_bins: usize) -> Result<()> {
        self.create_binning(nr_bins, 0.0, 1.0)
    }

    pub fn is_binned(&self) -> bool {
        self.traces.iter().all(PixelTrace::is_binned)
    }

    /// Sample range over the whole stack.
    pub fn min_max(&self) -> (f32, f32) {
        scan_min_max(self.traces.iter().flat_map(|t| t.samples().iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;

    use super::*;

    /// Frame `z` holds `100 * z + y * width + x` at `(x, y)`.
    fn numbered_frames(width: usize, height: usize, count: usize) -> Vec<Frame> {
        (0..count)
            .map(|z| {
                let data = Array2::from_shape_fn((height, width), |(y, x)| {
                    (100 * z + y * width + x) as f32
                });
                Frame::new(data, 32)
            })
            .collect()
    }

    #[test]
    fn traces_follow_frames_in_order() {
        let frames = numbered_frames(3, 2, 4);
        let stack = TraceStack::from_frames(&frames).unwrap();
        assert_eq!((stack.width(), stack.height(), stack.depth()), (3, 2, 4));
        assert_eq!(stack.nr_traces(), 6);
        assert_eq!(stack.get(2, 1).samples(), &[5.0, 105.0, 205.0, 305.0]);
        assert_eq!(stack.get_index(5).unwrap().samples(), stack.get(2, 1).samples());
    }

    #[test]
    fn sub_range_is_clamped_to_source() {
        let frames = numbered_frames(2, 2, 5);
        let stack = TraceStack::from_source(&frames, 3, 99).unwrap();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.get(0, 0).samples(), &[300.0, 400.0]);
    }

    #[test]
    fn empty_range_is_rejected() {
        let frames = numbered_frames(2, 2, 5);
        assert!(matches!(
            TraceStack::from_source(&frames, 4, 4),
            Err(EsiError::EmptySequence)
        ));
        assert!(matches!(
            TraceStack::from_source(&frames, 9, 12),
            Err(EsiError::EmptySequence)
        ));
    }

    #[test]
    fn mismatched_frame_is_rejected() {
        let mut frames = numbered_frames(2, 2, 3);
        frames[2] = Frame::new(Array2::zeros((3, 2)), 32);
        assert!(matches!(
            TraceStack::from_frames(&frames),
            Err(EsiError::FrameSizeMismatch { index: 2, .. })
        ));
    }

    #[test]
    fn trace_index_is_bounds_checked() {
        let stack = TraceStack::from_frames(&numbered_frames(2, 2, 1)).unwrap();
        assert!(matches!(
            stack.get_index(4),
            Err(EsiError::TraceIndexOutOfRange { index: 4, total: 4 })
        ));
    }

    #[test]
    fn normalize_then_bin_every_trace() {
        let mut stack = TraceStack::from_frames(&numbered_frames(2, 2, 3)).unwrap();
        let (lo, hi) = stack.min_max();
        assert_eq!((lo, hi), (0.0, 203.0));

        stack.normalize_from(lo, hi).unwrap();
        assert_eq!(stack.get(0, 0).samples()[0], 0.0);
        assert_eq!(stack.get(1, 1).samples()[2], 1.0);
        assert!(!stack.is_binned());

        stack.create_norm_binning(10).unwrap();
        assert!(stack.is_binned());
    }

    #[test]
    fn degenerate_normalization_is_rejected() {
        let mut stack = TraceStack::from_frames(&numbered_frames(2, 2, 2)).unwrap();
        assert!(matches!(
            stack.normalize_from(1.0, 1.0),
            Err(EsiError::DegenerateRange { .. })
        ));
        assert_eq!(stack.get(1, 0).samples(), &[1.0, 101.0]);
    }
}
