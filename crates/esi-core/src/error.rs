use thiserror::Error;

#[derive(Error, Debug)]
pub enum EsiError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Frame {index} is {found_width}x{found_height}, expected {width}x{height}")]
    FrameSizeMismatch {
        index: usize,
        width: usize,
        height: usize,
        found_width: usize,
        found_height: usize,
    },

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Sample index {index} out of range (depth: {depth})")]
    SampleIndexOutOfRange { index: usize, depth: usize },

    #[error("Trace index {index} out of range (traces: {total})")]
    TraceIndexOutOfRange { index: usize, total: usize },

    #[error("Trace depth mismatch: {left} vs {right}")]
    DepthMismatch { left: usize, right: usize },

    #[error("Histogram bin count mismatch: {left} vs {right}")]
    BinCountMismatch { left: usize, right: usize },

    /// Cross-entropy was requested before the histograms were built.
    #[error("Binning not initialized")]
    BinningNotInitialized,

    #[error("Joint moment of order {order} is NaN")]
    NanMoment { order: f64 },

    #[error("Degenerate value range [{min}, {max}]")]
    DegenerateRange { min: f32, max: f32 },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, EsiError>;
