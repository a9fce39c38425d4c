use std::time::Duration;

use crate::frame::Frame;

/// Result of a full analysis.
#[derive(Clone, Debug)]
pub struct AnalysisOutput {
    /// One post-processed reconstruction per sub-stack, in input order.
    pub reconstructions: Vec<Frame>,
    /// Sum of all reconstructions.
    pub summed: Frame,
}

/// Thread-safe progress reporting for the analysis.
///
/// Every method defaults to a no-op.
pub trait ProgressReporter: Send + Sync {
    /// The analysis will produce `chunks` reconstructions.
    fn begin_analysis(&self, _chunks: usize) {}

    /// Sub-stack `index` of `total` has started.
    fn begin_chunk(&self, _index: usize, _total: usize) {}

    /// Reconstruction of sub-stack `index` is available.
    fn chunk_ready(&self, _index: usize, _frame: &Frame) {}

    /// Sub-stack `index` is finished after `elapsed`.
    fn finish_chunk(&self, _index: usize, _elapsed: Duration) {}

    fn finish_analysis(&self) {}
}

/// No-op progress reporter, used when `run_analysis` delegates.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
