use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use esi_core::frame::stack_min_max;
use esi_core::io::InputStack;

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file, TIFF stack or directory of images
    pub input: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let input = InputStack::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;
    let source = input.source();
    let (width, height) = source.dimensions();

    println!("Input:       {}", args.input.display());
    println!("Frames:      {}", source.frame_count());
    println!("Dimensions:  {}x{}", width, height);
    println!("Output:      {}x{}", width * 2, height * 2);

    match &input {
        InputStack::Ser(reader) => {
            let header = &reader.header;
            println!("Format:      SER, {}-bit", header.pixel_depth);
            for (label, value) in [
                ("Observer:", &header.observer),
                ("Telescope:", &header.telescope),
                ("Instrument:", &header.instrument),
            ] {
                if !value.is_empty() {
                    println!("{:<13}{}", label, value);
                }
            }
            let total_mb = (header.frame_byte_size()? * source.frame_count()) as f64
                / (1024.0 * 1024.0);
            println!("Data size:   {:.1} MB", total_mb);
        }
        InputStack::Images(_) => println!("Format:      image sequence"),
    }

    if source.frame_count() > 0 {
        let (min, max) = stack_min_max(source)?;
        println!("Pixel range: [{:.6}, {:.6}]", min, max);
    }

    Ok(())
}
