use std::path::Path;

use console::Style;
use esi_core::analysis::config::AnalysisConfig;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_run_summary(
    config: &AnalysisConfig,
    input: &Path,
    output_dir: &Path,
    total_frames: usize,
) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("ESI Analysis"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(12)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output_dir.display())
    );
    println!();

    // Sub-stacks
    println!("  {}", s.header.apply_to("Sub-stacks"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(total_frames)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Images"),
        s.value.apply_to(config.output_images)
    );
    match config.frames_per_chunk(total_frames) {
        Ok(per_chunk) => println!(
            "    {:<12}{}",
            s.label.apply_to("Per image"),
            s.value.apply_to(format!("{per_chunk} frames"))
        ),
        Err(_) => println!(
            "    {:<12}{}",
            s.label.apply_to("Per image"),
            s.disabled.apply_to("too few frames")
        ),
    }
    println!();

    // Entropy
    println!("  {}", s.header.apply_to("Entropy"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Bins"),
        s.value.apply_to(config.nr_bins)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Order"),
        s.value.apply_to(config.reconstruction.order)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Center"),
        s.method.apply_to(config.reconstruction.center)
    );
    match config.pixel_range {
        Some(range) => println!(
            "    {:<12}{}",
            s.label.apply_to("Range"),
            s.value.apply_to(format!("[{}, {}]", range.min, range.max))
        ),
        None => println!(
            "    {:<12}{}",
            s.label.apply_to("Range"),
            s.disabled.apply_to("from input")
        ),
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Execution"),
        s.method.apply_to(config.execution)
    );
    println!();

    // Post-processing
    println!("  {}", s.header.apply_to("Post-processing"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Blur"),
        s.value.apply_to(format!(
            "sigma {}x{}, accuracy {}",
            config.blur.sigma_x, config.blur.sigma_y, config.blur.accuracy
        ))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Normalize"),
        s.value.apply_to(config.normalization)
    );
    println!();
}
