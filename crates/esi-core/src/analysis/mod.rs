pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{reconstruct_chunk, run_analysis, run_analysis_reported};
pub use types::{AnalysisOutput, NoOpReporter, ProgressReporter};
