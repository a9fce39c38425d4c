mod common;

use esi_core::error::EsiError;
use esi_core::reconstruct::{
    partition_rows, reconstruct, reconstruct_parallel, reconstruct_single, reconstruct_with,
    CenterPairing, Execution, ReconstructionParams,
};
use esi_core::trace::TraceStack;
use ndarray::s;

use common::{constant_frames, noisy_frames, prepared_stack};

fn params(order: f64, center: CenterPairing) -> ReconstructionParams {
    ReconstructionParams { order, center }
}

// ---------------------------------------------------------------------------
// End-to-end scenario
// ---------------------------------------------------------------------------

#[test]
fn test_constant_stack_reconstructs_to_zero() {
    let frames = constant_frames(4, 4, 8, 5.0);
    let stack = prepared_stack(&frames, 0.0, 10.0, 4);

    for trace in stack.traces() {
        assert_eq!(trace.probabilities().unwrap(), &[0.0, 0.0, 1.0, 0.0]);
    }

    let out = reconstruct_single(&stack, &ReconstructionParams::default()).unwrap();
    assert_eq!(out.dim(), (8, 8));
    assert!(out.iter().all(|&v| v == 0.0));
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[test]
fn test_one_thread_matches_single_path() {
    let frames = noisy_frames(9, 7, 16, 42);
    let stack = prepared_stack(&frames, 0.0, 100.0, 12);
    let p = params(4.0, CenterPairing::BothDiagonals);

    let single = reconstruct_single(&stack, &p).unwrap();
    let parallel = reconstruct_parallel(&stack, &p, 1).unwrap();
    assert_eq!(single, parallel);
}

#[test]
fn test_thread_count_does_not_change_output() {
    let frames = noisy_frames(11, 13, 10, 5);
    let stack = prepared_stack(&frames, 0.0, 100.0, 8);
    let p = params(2.0, CenterPairing::Duplicated);

    let single = reconstruct_single(&stack, &p).unwrap();
    for threads in [2, 3, 4, 7, 20] {
        let parallel = reconstruct_parallel(&stack, &p, threads).unwrap();
        assert_eq!(single, parallel, "mismatch with {threads} threads");
    }
}

#[test]
fn test_execution_modes_agree() {
    let frames = noisy_frames(6, 6, 12, 9);
    let stack = prepared_stack(&frames, 0.0, 100.0, 10);
    let p = ReconstructionParams::default();

    let single = reconstruct_with(&stack, &p, Execution::Single).unwrap();
    let auto = reconstruct_with(&stack, &p, Execution::Parallel { threads: None }).unwrap();
    let fixed = reconstruct_with(&stack, &p, Execution::Parallel { threads: Some(2) }).unwrap();
    assert_eq!(single, auto);
    assert_eq!(single, fixed);
}

// ---------------------------------------------------------------------------
// Row partition boundary
// ---------------------------------------------------------------------------

#[test]
fn test_height_five_three_threads_keeps_row_three() {
    assert_eq!(partition_rows(5, 3).unwrap(), vec![0..1, 1..2, 2..4]);

    let frames = noisy_frames(4, 5, 12, 77);
    let stack = prepared_stack(&frames, 0.0, 100.0, 10);
    let p = ReconstructionParams::default();

    let parallel = reconstruct_parallel(&stack, &p, 3).unwrap();
    let single = reconstruct_single(&stack, &p).unwrap();
    assert_eq!(parallel, single);

    // source row 3 is interior and reconstructed
    assert!(parallel.slice(s![6..8, 2..6]).iter().any(|&v| v != 0.0));
    // source rows 0 and 4 are borders
    assert!(parallel.slice(s![0..2, ..]).iter().all(|&v| v == 0.0));
    assert!(parallel.slice(s![8..10, ..]).iter().all(|&v| v == 0.0));
}

// ---------------------------------------------------------------------------
// Center pairing
// ---------------------------------------------------------------------------

#[test]
fn test_center_pairing_only_changes_center_pixels() {
    let frames = noisy_frames(6, 6, 14, 21);
    let stack = prepared_stack(&frames, 0.0, 100.0, 10);

    let both = reconstruct_single(&stack, &params(2.0, CenterPairing::BothDiagonals)).unwrap();
    let dup = reconstruct_single(&stack, &params(2.0, CenterPairing::Duplicated)).unwrap();

    for ((row, col), &v) in both.indexed_iter() {
        if row % 2 == 1 || col % 2 == 1 {
            assert_eq!(v, dup[[row, col]], "sub-pixel ({row}, {col}) differs");
        }
    }
    assert_ne!(both, dup);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn test_worker_error_propagates_after_join() {
    let frames = constant_frames(6, 9, 6, 5.0);
    let stack = prepared_stack(&frames, 0.0, 10.0, 4);
    let p = params(0.5, CenterPairing::BothDiagonals);

    let err = reconstruct_parallel(&stack, &p, 3).unwrap_err();
    assert!(matches!(err, EsiError::NanMoment { .. }));
    let err = reconstruct_single(&stack, &p).unwrap_err();
    assert!(matches!(err, EsiError::NanMoment { .. }));
}

#[test]
fn test_unbinned_stack_fails_before_reconstruction() {
    let frames = noisy_frames(5, 5, 4, 2);
    let stack = TraceStack::from_frames(&frames).unwrap();
    let p = ReconstructionParams::default();
    assert!(matches!(
        reconstruct_parallel(&stack, &p, 2),
        Err(EsiError::BinningNotInitialized)
    ));
    assert!(matches!(
        reconstruct(&stack, &p, 0..5),
        Err(EsiError::BinningNotInitialized)
    ));
}

#[test]
fn test_zero_threads_is_rejected() {
    let frames = noisy_frames(5, 5, 4, 2);
    let stack = prepared_stack(&frames, 0.0, 100.0, 4);
    assert!(matches!(
        reconstruct_parallel(&stack, &ReconstructionParams::default(), 0),
        Err(EsiError::InvalidParameter(_))
    ));
}

#[test]
fn test_tiny_stack_has_no_interior() {
    let frames = noisy_frames(2, 2, 5, 8);
    let stack = prepared_stack(&frames, 0.0, 100.0, 4);
    let out = reconstruct_parallel(&stack, &ReconstructionParams::default(), 4).unwrap();
    assert_eq!(out.dim(), (4, 4));
    assert!(out.iter().all(|&v| v == 0.0));
}
