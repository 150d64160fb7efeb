use std::{fs::File, io::BufReader, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;

use scenesmith::{
    BackgroundSource, DatasetConfig, SceneConfig, SizeConstraints, generate_dataset,
};

#[derive(Parser, Debug)]
#[command(name = "scenesmith", version)]
#[command(about = "Generate synthetic object-detection scenes with YOLO annotations")]
struct Cli {
    /// Directory with foreground objects: `<stem>.<ext>` images paired with
    /// `<stem>_mask.<ext>` masks.
    #[arg(short = 'p', long)]
    objects_dir: PathBuf,

    /// Background image file. Mutually exclusive with --background-dir.
    #[arg(short = 'b', long, conflicts_with = "background_dir")]
    background: Option<PathBuf>,

    /// Directory of background images; one is drawn at random per scene.
    #[arg(long)]
    background_dir: Option<PathBuf>,

    /// Resize the background so its long side equals this (only with
    /// --background).
    #[arg(long, requires = "background")]
    resize_max: Option<u32>,

    /// Force the background's short side (only with --resize-max).
    #[arg(long, requires = "resize_max")]
    resize_min: Option<u32>,

    /// Flat-canvas width used when no background file/dir is given.
    #[arg(long, default_value_t = 1920)]
    flat_width: u32,

    /// Flat-canvas height used when no background file/dir is given.
    #[arg(long, default_value_t = 1080)]
    flat_height: u32,

    /// Output folder; images land in `images/`, labels in `labels/`.
    #[arg(short = 'o', long, default_value = "dataset/synthetic")]
    out: PathBuf,

    /// Number of scenes to generate.
    #[arg(short = 'n', long, default_value_t = 100)]
    num_images: u32,

    /// Minimum objects per scene.
    #[arg(long, default_value_t = 5)]
    min_objects: u32,

    /// Maximum objects per scene.
    #[arg(long, default_value_t = 40)]
    max_objects: u32,

    /// Maximum tolerated occlusion fraction of any placed object.
    #[arg(long, default_value_t = 0.2)]
    max_overlap: f64,

    /// Placement attempts per object before the scene is truncated.
    #[arg(long, default_value_t = 10)]
    max_attempts: u32,

    /// Smallest randomized longest-side of a placed object, in pixels.
    #[arg(long, default_value_t = 100)]
    size_min: u32,

    /// Largest randomized longest-side of a placed object, in pixels.
    #[arg(long, default_value_t = 100)]
    size_max: u32,

    /// Mask binarization threshold (intensities above count as object).
    #[arg(long, default_value_t = 10)]
    mask_threshold: u8,

    /// Base RNG seed; scene i uses stream seed + i.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Generate scenes in parallel.
    #[arg(long)]
    parallel: bool,

    /// Worker thread count for --parallel (defaults to all cores).
    #[arg(long, requires = "parallel")]
    threads: Option<usize>,

    /// JSON dataset config; overrides all tuning flags above.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let background = background_source(&cli);
    let config = dataset_config(&cli)?;

    let stats = generate_dataset(&cli.objects_dir, &background, &cli.out, &config)?;
    eprintln!(
        "wrote {} scenes ({} instances, {} truncated) to {}",
        stats.scenes,
        stats.instances,
        stats.truncated,
        cli.out.display()
    );
    Ok(())
}

fn background_source(cli: &Cli) -> BackgroundSource {
    if let Some(dir) = &cli.background_dir {
        return BackgroundSource::RandomDir { dir: dir.clone() };
    }
    if let Some(path) = &cli.background {
        return match cli.resize_max {
            Some(desired_max) => BackgroundSource::Resized {
                path: path.clone(),
                desired_max,
                desired_min: cli.resize_min,
            },
            None => BackgroundSource::Fixed { path: path.clone() },
        };
    }
    BackgroundSource::Flat {
        width: cli.flat_width,
        height: cli.flat_height,
    }
}

fn dataset_config(cli: &Cli) -> anyhow::Result<DatasetConfig> {
    if let Some(path) = &cli.config {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let config: DatasetConfig =
            serde_json::from_reader(BufReader::new(f)).with_context(|| "parse config JSON")?;
        return Ok(config);
    }

    Ok(DatasetConfig {
        num_images: cli.num_images,
        scene: SceneConfig {
            min_objects: cli.min_objects,
            max_objects: cli.max_objects,
            max_overlap: cli.max_overlap,
            max_attempts: cli.max_attempts,
        },
        size: SizeConstraints {
            longest_min: cli.size_min,
            longest_max: cli.size_max,
        },
        mask_threshold: cli.mask_threshold,
        seed: cli.seed,
        parallel: cli.parallel,
        threads: cli.threads,
        ..Default::default()
    })
}
