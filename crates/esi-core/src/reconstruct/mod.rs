pub mod kernel;
pub mod scheduler;

pub use kernel::{reconstruct, reconstruct_into, CenterPairing, ReconstructionParams};
pub use scheduler::{
    partition_rows, reconstruct_parallel, reconstruct_single, reconstruct_with, Execution,
};
