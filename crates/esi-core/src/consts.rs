/// Minimum pixel count (h*w) to use row-level Rayon parallelism in filters.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Linear upsampling factor of the reconstruction.
pub const UPSAMPLE_FACTOR: usize = 2;

/// Default number of reconstructed images per analysis.
pub const DEFAULT_OUTPUT_IMAGES: usize = 100;

/// Fewest input frames an analysis accepts.
pub const MIN_INPUT_FRAMES: usize = 3;

/// Default number of histogram bins for the entropy calculation.
pub const DEFAULT_NR_BINS: usize = 100;

/// Default order of the joint moment.
pub const DEFAULT_ORDER: f64 = 4.0;

/// Gaussian sigma (both axes) applied to each reconstruction to suppress
/// the 2x2 checkerboard left by the per-offset computation.
pub const DEFAULT_BLUR_SIGMA: f32 = 0.8;

/// Kernel truncation accuracy for the post-reconstruction blur.
pub const DEFAULT_BLUR_ACCURACY: f32 = 0.01;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f32 = 1e-10;
