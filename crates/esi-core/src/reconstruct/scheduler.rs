use std::ops::Range;

use ndarray::{Array2, ArrayViewMut2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::UPSAMPLE_FACTOR;
use crate::error::{EsiError, Result};
use crate::trace::TraceStack;

use super::kernel::{reconstruct, reconstruct_into, ReconstructionParams};

/// How a reconstruction is executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Execution {
    /// One pass of the kernel over every row on the calling thread.
    Single,
    /// Row partitions on a dedicated worker pool. `None` uses one worker per
    /// available CPU.
    Parallel { threads: Option<usize> },
}

impl Default for Execution {
    fn default() -> Self {
        Self::Parallel { threads: None }
    }
}

impl std::fmt::Display for Execution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "Single thread"),
            Self::Parallel { threads: None } => write!(f, "Parallel (all cores)"),
            Self::Parallel { threads: Some(n) } => write!(f, "Parallel ({n} threads)"),
        }
    }
}

impl Execution {
    /// Worker count this execution mode resolves to on the current machine.
    pub fn worker_count(&self) -> usize {
        match self {
            Self::Single => 1,
            Self::Parallel { threads: Some(n) } => *n,
            Self::Parallel { threads: None } => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// Split source rows `[0, height)` into `nr_threads` contiguous partitions.
///
/// Partition `i` starts at `(height / nr_threads) * i`. The last partition
/// always ends at `height - 1`, so no interior row is lost when `height` is
/// not divisible by `nr_threads`; row `height - 1` is a border row.
pub fn partition_rows(height: usize, nr_threads: usize) -> Result<Vec<Range<usize>>> {
    if nr_threads == 0 {
        return Err(EsiError::InvalidParameter(
            "thread count must be at least 1".into(),
        ));
    }

    let step = height / nr_threads;
    let last_row = height.saturating_sub(1);
    Ok((0..nr_threads)
        .map(|i| {
            let start = (step * i).min(last_row);
            let end = if i + 1 == nr_threads {
                last_row
            } else {
                (step * (i + 1)).min(last_row)
            };
            start..end
        })
        .collect())
}

/// Run the kernel over every row on the calling thread.
pub fn reconstruct_single(
    stack: &TraceStack,
    params: &ReconstructionParams,
) -> Result<Array2<f32>> {
    reconstruct(stack, params, 0..stack.height().saturating_sub(1))
}

/// Run the kernel on `nr_threads` workers, one row partition each.
///
/// Every worker writes to its own disjoint band of the output buffer. The
/// call returns once all workers have finished; if any failed, the error of
/// the lowest partition is returned.
pub fn reconstruct_parallel(
    stack: &TraceStack,
    params: &ReconstructionParams,
    nr_threads: usize,
) -> Result<Array2<f32>> {
    if !stack.is_binned() {
        return Err(EsiError::BinningNotInitialized);
    }

    let (w, h) = (stack.width(), stack.height());
    let partitions = partition_rows(h, nr_threads)?;
    debug!(threads = nr_threads, ?partitions, "Partitioned reconstruction rows");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(nr_threads)
        .thread_name(|i| format!("esi-worker-{i}"))
        .build()
        .map_err(|e| EsiError::ThreadPool(e.to_string()))?;

    let mut out = Array2::<f32>::zeros((UPSAMPLE_FACTOR * h, UPSAMPLE_FACTOR * w));
    let bands = split_bands(out.view_mut(), &partitions);

    let results: Vec<Result<()>> = pool.install(|| {
        bands
            .into_par_iter()
            .zip(partitions.par_iter())
            .map(|(band, rows)| reconstruct_into(stack, params, rows.clone(), band))
            .collect()
    });
    results.into_iter().collect::<Result<Vec<()>>>()?;

    Ok(out)
}

/// Run the kernel with the given execution mode.
pub fn reconstruct_with(
    stack: &TraceStack,
    params: &ReconstructionParams,
    execution: Execution,
) -> Result<Array2<f32>> {
    match execution {
        Execution::Single => reconstruct_single(stack, params),
        Execution::Parallel { .. } => {
            reconstruct_parallel(stack, params, execution.worker_count())
        }
    }
}

/// Cut the output buffer into one mutable band per row partition.
fn split_bands<'a>(
    out: ArrayViewMut2<'a, f32>,
    partitions: &[Range<usize>],
) -> Vec<ArrayViewMut2<'a, f32>> {
    let mut bands = Vec::with_capacity(partitions.len());
    let mut rest = out;
    let mut offset = 0;
    for rows in partitions {
        let (_, tail) = rest.split_at(Axis(0), UPSAMPLE_FACTOR * (rows.start - offset));
        let (band, tail) = tail.split_at(Axis(0), UPSAMPLE_FACTOR * rows.len());
        bands.push(band);
        rest = tail;
        offset = rows.end;
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_cover_interior_rows() {
        assert_eq!(partition_rows(8, 2).unwrap(), vec![0..4, 4..7]);
        assert_eq!(partition_rows(5, 3).unwrap(), vec![0..1, 1..2, 2..4]);
        assert_eq!(partition_rows(6, 1).unwrap(), vec![0..5]);
    }

    #[test]
    fn more_threads_than_rows() {
        assert_eq!(partition_rows(3, 5).unwrap(), vec![0..0, 0..0, 0..0, 0..0, 0..2]);
        assert_eq!(partition_rows(0, 2).unwrap(), vec![0..0, 0..0]);
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(matches!(
            partition_rows(10, 0),
            Err(EsiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn bands_are_disjoint_and_ordered() {
        let mut out = Array2::<f32>::zeros((10, 4));
        let partitions = partition_rows(5, 3).unwrap();
        let bands = split_bands(out.view_mut(), &partitions);
        let rows: Vec<usize> = bands.iter().map(|b| b.nrows()).collect();
        assert_eq!(rows, vec![2, 2, 4]);
        for (i, mut band) in bands.into_iter().enumerate() {
            band.fill(i as f32 + 1.0);
        }
        assert_eq!(out.column(0).to_vec(), vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn worker_count_resolution() {
        assert_eq!(Execution::Single.worker_count(), 1);
        assert_eq!(Execution::Parallel { threads: Some(3) }.worker_count(), 3);
        assert!(Execution::default().worker_count() >= 1);
    }
}
