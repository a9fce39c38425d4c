use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use esi_core::analysis::config::{AnalysisConfig, PixelRange};
use esi_core::analysis::{run_analysis_reported, ProgressReporter};
use esi_core::filters::normalize::OutputNormalization;
use esi_core::frame::Frame;
use esi_core::io::image_io::{save_image, save_tiff_f32, save_tiff_stack};
use esi_core::io::InputStack;
use esi_core::reconstruct::{CenterPairing, Execution, ReconstructionParams};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::summary::print_run_summary;

#[derive(Clone, ValueEnum)]
pub enum CenterPairingArg {
    BothDiagonals,
    Duplicated,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// 16-bit TIFF stretched to the image's own range
    Tiff,
    /// 8-bit PNG stretched to the image's own range
    Png,
    /// 32-bit float TIFF with values unchanged
    Float,
}

impl FormatArg {
    fn extension(self) -> &'static str {
        match self {
            Self::Tiff | Self::Float => "tiff",
            Self::Png => "png",
        }
    }

    fn save(self, frame: &Frame, path: &Path) -> Result<()> {
        match self {
            Self::Float => save_tiff_f32(frame, path),
            Self::Tiff | Self::Png => save_image(frame, path),
        }
        .with_context(|| format!("Failed to save {}", path.display()))
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// Input SER file, TIFF stack or directory of images
    pub input: PathBuf,

    /// Analysis config file (TOML); replaces the analysis flags below
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of reconstructions; the input is split into this many sub-stacks
    #[arg(long, default_value = "100")]
    pub images: usize,

    /// Histogram bins per pixel trace
    #[arg(long, default_value = "100")]
    pub bins: usize,

    /// Order of the joint moment
    #[arg(long, default_value = "4")]
    pub order: f64,

    /// Lower bound of the pixel range (computed from the input if omitted)
    #[arg(long, requires = "max")]
    pub min: Option<f32>,

    /// Upper bound of the pixel range (computed from the input if omitted)
    #[arg(long, requires = "min")]
    pub max: Option<f32>,

    /// Worker threads per reconstruction (defaults to all cores)
    #[arg(long, conflicts_with = "single_thread")]
    pub threads: Option<usize>,

    /// Reconstruct on the calling thread only
    #[arg(long)]
    pub single_thread: bool,

    /// Keep raw entropy scores instead of stretching each image to [0, 1]
    #[arg(long)]
    pub no_normalize: bool,

    /// Diagonal pairs used for the output pixel on top of each source pixel
    #[arg(long, value_enum, default_value = "both-diagonals")]
    pub center_pairing: CenterPairingArg,

    /// Directory receiving one image per reconstruction
    #[arg(short, long, default_value = "esi_output")]
    pub output_dir: PathBuf,

    /// Path of the summed image (defaults to <output-dir>/esi_sum.tiff)
    #[arg(long)]
    pub sum: Option<PathBuf>,

    /// Also write every reconstruction into one multi-page float TIFF
    #[arg(long)]
    pub stack: Option<PathBuf>,

    /// Output image format (defaults to tiff for normalized output, float
    /// otherwise; the sum image defaults to float)
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid analysis config")?
    } else {
        build_config_from_args(args)?
    };

    let input = InputStack::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let source = input.source();

    print_run_summary(&config, &args.input, &args.output_dir, source.frame_count());

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory {}", args.output_dir.display())
    })?;

    let reporter = BarReporter::new()?;
    let output = run_analysis_reported(source, &config, &reporter)?;

    let format = args.format.unwrap_or(match config.normalization {
        OutputNormalization::Unit => FormatArg::Tiff,
        _ => FormatArg::Float,
    });
    for (index, frame) in output.reconstructions.iter().enumerate() {
        let path = args
            .output_dir
            .join(format!("esi_{index:03}.{}", format.extension()));
        format.save(frame, &path)?;
    }

    let sum_format = args.format.unwrap_or(FormatArg::Float);
    let sum_path = args.sum.clone().unwrap_or_else(|| {
        args.output_dir
            .join(format!("esi_sum.{}", sum_format.extension()))
    });
    sum_format.save(&output.summed, &sum_path)?;

    if let Some(ref stack_path) = args.stack {
        save_tiff_stack(&output.reconstructions, stack_path)
            .with_context(|| format!("Failed to save {}", stack_path.display()))?;
        println!("Float stack saved to {}", stack_path.display());
    }

    println!(
        "\n{} reconstructions saved to {}",
        output.reconstructions.len(),
        args.output_dir.display()
    );
    println!("Sum image saved to {}", sum_path.display());

    Ok(())
}

fn build_config_from_args(args: &RunArgs) -> Result<AnalysisConfig> {
    let pixel_range = match (args.min, args.max) {
        (Some(min), Some(max)) => Some(PixelRange { min, max }),
        (None, None) => None,
        _ => bail!("--min and --max must be given together"),
    };

    let execution = if args.single_thread {
        Execution::Single
    } else {
        Execution::Parallel {
            threads: args.threads,
        }
    };

    let center = match args.center_pairing {
        CenterPairingArg::BothDiagonals => CenterPairing::BothDiagonals,
        CenterPairingArg::Duplicated => CenterPairing::Duplicated,
    };

    let normalization = if args.no_normalize {
        OutputNormalization::None
    } else {
        OutputNormalization::Unit
    };

    Ok(AnalysisConfig {
        output_images: args.images,
        nr_bins: args.bins,
        reconstruction: ReconstructionParams {
            order: args.order,
            center,
        },
        execution,
        normalization,
        pixel_range,
        ..Default::default()
    })
}

/// Progress bar advanced once per finished sub-stack.
struct BarReporter {
    pb: ProgressBar,
}

impl BarReporter {
    fn new() -> Result<Self> {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg:20} [{bar:40}] {pos}/{len} ({eta})")?
                .progress_chars("=> "),
        );
        Ok(Self { pb })
    }
}

impl ProgressReporter for BarReporter {
    fn begin_analysis(&self, chunks: usize) {
        self.pb.set_length(chunks as u64);
        self.pb.set_message("Reconstructing");
    }

    fn begin_chunk(&self, index: usize, total: usize) {
        self.pb
            .set_message(format!("Sub-stack {}/{}", index + 1, total));
    }

    fn finish_chunk(&self, index: usize, elapsed: Duration) {
        debug!(index, elapsed_ms = elapsed.as_millis() as u64, "Sub-stack done");
        self.pb.inc(1);
    }

    fn finish_analysis(&self) {
        self.pb.finish_with_message("Done");
    }
}
