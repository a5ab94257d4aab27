use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;
use tracing::{info, info_span};

use microscopy_augment::logging::setup_logging;
use microscopy_augment::{sample_from_image, sample_to_image, GeneratorSettings, ImageGenerator};

/// Renders augmented variants of one image so a generator configuration can
/// be checked by eye.
#[derive(Parser, Debug)]
#[command(name = "augment-preview")]
#[command(about = "Preview standardization and augmentation on a single image")]
struct Args {
    /// Image to augment
    input: PathBuf,

    /// Generator settings (JSON). Defaults to the per-user settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory receiving the rendered variants
    #[arg(short, long, default_value = "augmented")]
    output_dir: PathBuf,

    /// Number of variants to render
    #[arg(short = 'n', long, default_value_t = 8)]
    count: usize,

    /// Seed for reproducible variants
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory for log files
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_dir, "augment_preview")?;

    let settings = match &args.config {
        Some(path) => GeneratorSettings::load(path)?,
        None => GeneratorSettings::load_or_default(),
    };
    let format = settings.data_format;
    let generator = ImageGenerator::new(settings.to_options());

    let img = image::open(&args.input)
        .with_context(|| format!("Failed to open image {}", args.input.display()))?;
    let sample = sample_from_image(&img, format);
    info!(
        "Loaded {:?} as {:?} sample ({})",
        args.input,
        sample.dim(),
        format.as_str()
    );

    let standardized = generator
        .standardize(sample)
        .with_context(|| format!("Failed to standardize {}", args.input.display()))?;

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory {}", args.output_dir.display())
    })?;

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sample".to_string());

    for i in 0..args.count {
        let _span = info_span!("variant", index = i).entered();
        let augmented = generator.transform(standardized.clone(), &mut rng);
        let out_path = args.output_dir.join(format!("{}_{:03}.png", stem, i));
        sample_to_image(&augmented, format)?
            .save(&out_path)
            .with_context(|| format!("Failed to write {}", out_path.display()))?;
        info!("Wrote {:?}", out_path);
    }

    info!("Rendered {} variants into {:?}", args.count, args.output_dir);
    Ok(())
}
