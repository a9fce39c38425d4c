use std::ops::Range;

use ndarray::{s, Array2, ArrayViewMut2};
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_ORDER, UPSAMPLE_FACTOR};
use crate::error::{EsiError, Result};
use crate::trace::{PixelTrace, TraceStack};

/// Which diagonal neighbour pairs feed the output pixel that coincides with
/// a source pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CenterPairing {
    /// Average of the `(x-1, y-1)`/`(x+1, y+1)` and `(x+1, y-1)`/`(x-1, y+1)`
    /// scores.
    #[default]
    BothDiagonals,
    /// The `(x-1, y-1)`/`(x+1, y+1)` score counted twice.
    Duplicated,
}

impl std::fmt::Display for CenterPairing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BothDiagonals => write!(f, "Both diagonals"),
            Self::Duplicated => write!(f, "Duplicated"),
        }
    }
}

/// Parameters shared by every cross-entropy evaluation of one reconstruction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionParams {
    /// Order of the joint moment.
    pub order: f64,
    #[serde(default)]
    pub center: CenterPairing,
}

impl Default for ReconstructionParams {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            center: CenterPairing::default(),
        }
    }
}

/// Source rows actually computed for a requested range.
///
/// The first and last rows are borders: row 0 has no upper neighbours and
/// row `height - 1` has no lower ones.
pub fn effective_rows(rows: &Range<usize>, height: usize) -> Range<usize> {
    let start = rows.start.max(1);
    let end = rows.end.min(height.saturating_sub(1));
    start..end.max(start)
}

/// Reconstruct source rows `rows` into a full-size `(2h, 2w)` buffer.
///
/// Only output rows `[2 * rows.start, 2 * rows.end)` are written; every other
/// cell stays zero.
pub fn reconstruct(
    stack: &TraceStack,
    params: &ReconstructionParams,
    rows: Range<usize>,
) -> Result<Array2<f32>> {
    let (w, h) = (stack.width(), stack.height());
    let mut out = Array2::<f32>::zeros((UPSAMPLE_FACTOR * h, UPSAMPLE_FACTOR * w));

    let end = rows.end.min(h);
    let start = rows.start.min(end);
    let view = out.slice_mut(s![UPSAMPLE_FACTOR * start..UPSAMPLE_FACTOR * end, ..]);
    reconstruct_into(stack, params, start..end, view)?;
    Ok(out)
}

/// Reconstruct source rows `rows` into `out`, which covers exactly the output
/// rows `[2 * rows.start, 2 * rows.end)` at full output width.
///
/// Each interior source pixel `(x, y)` fills the 2x2 output block at
/// `(2x, 2y)`:
///
/// - `(0, 0)`: averaged diagonal scores around `(x, y)`, see [`CenterPairing`]
/// - `(1, 0)`: score of `(x, y)` against `(x + 1, y)`
/// - `(0, 1)`: score of `(x, y)` against `(x, y + 1)`
/// - `(1, 1)`: mean of the `(x, y)`/`(x + 1, y + 1)` and
///   `(x + 1, y)`/`(x, y + 1)` scores
pub fn reconstruct_into(
    stack: &TraceStack,
    params: &ReconstructionParams,
    rows: Range<usize>,
    mut out: ArrayViewMut2<'_, f32>,
) -> Result<()> {
    if !stack.is_binned() {
        return Err(EsiError::BinningNotInitialized);
    }

    let (w, h) = (stack.width(), stack.height());
    if rows.start > rows.end || rows.end > h {
        return Err(EsiError::InvalidParameter(format!(
            "row range {}..{} outside image height {}",
            rows.start, rows.end, h
        )));
    }
    let expected = (UPSAMPLE_FACTOR * rows.len(), UPSAMPLE_FACTOR * w);
    if out.dim() != expected {
        return Err(EsiError::InvalidParameter(format!(
            "output view is {:?}, expected {:?}",
            out.dim(),
            expected
        )));
    }

    let order = params.order;
    let score = |a: &PixelTrace, b: &PixelTrace| PixelTrace::cross_entropy(a, b, order);

    for y in effective_rows(&rows, h) {
        let r = UPSAMPLE_FACTOR * (y - rows.start);
        for x in 1..w.saturating_sub(1) {
            let here = stack.get(x, y);
            let right = stack.get(x + 1, y);
            let below = stack.get(x, y + 1);
            let diagonal = stack.get(x + 1, y + 1);

            let falling = score(stack.get(x - 1, y - 1), diagonal)?;
            let center = match params.center {
                CenterPairing::BothDiagonals => {
                    let rising = score(stack.get(x + 1, y - 1), stack.get(x - 1, y + 1))?;
                    (falling + rising) / 2.0
                }
                CenterPairing::Duplicated => (falling + falling) / 2.0,
            };

            let c = UPSAMPLE_FACTOR * x;
            out[[r, c]] = center;
            out[[r, c + 1]] = score(here, right)?;
            out[[r + 1, c]] = score(here, below)?;
            out[[r + 1, c + 1]] = (score(here, diagonal)? + score(right, below)?) / 2.0;
        }
    }

    Ok(())
}
