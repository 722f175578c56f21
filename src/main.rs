use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chalk_dither::DitherAlgorithm;
use pawcessor::models::{ColorSpace, ProcessConfig};
use pawcessor::services::{CancelToken, Progress, StampPipeline};

#[derive(Parser)]
#[command(name = "pawcessor")]
#[command(about = "Convert images and animations into chalk stamp files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an image or animation into stamp.txt (and frames.txt)
    Process {
        /// Input image (PNG, JPEG, BMP, WebP, GIF or APNG)
        input: PathBuf,

        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output directory (overrides the config)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Dithering method by name or id, e.g. "Floyd Dither" or "floyd"
        #[arg(short, long)]
        algorithm: Option<String>,

        /// Method strength
        #[arg(short, long)]
        strength: Option<f32>,

        /// Match colors in CIE LAB instead of RGB
        #[arg(long)]
        lab: bool,

        /// Run the tone preprocessor
        #[arg(long)]
        preprocess: bool,

        /// Resize so the longer side has this many pixels
        #[arg(long)]
        resize: Option<u32>,

        /// Seed for random dithering
        #[arg(long)]
        seed: Option<u64>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the available dithering methods
    Methods {
        #[arg(long)]
        json: bool,
    },
    /// Show the palette a configuration resolves to
    Palette {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawcessor=info,chalk_dither=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Process {
            input,
            config,
            out,
            algorithm,
            strength,
            lab,
            preprocess,
            resize,
            seed,
            json,
        } => {
            let mut config = ProcessConfig::resolve(config.as_deref())?;
            if let Some(out) = out {
                config.output_dir = out;
            }
            if let Some(algorithm) = algorithm {
                config.algorithm = algorithm;
                config.strength = None;
            }
            if strength.is_some() {
                config.strength = strength;
            }
            if lab {
                config.color_space = ColorSpace::Lab;
            }
            if preprocess {
                config.preprocess = true;
            }
            if resize.is_some() {
                config.resize = resize;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            run_process(config, &input, json)
        }
        Commands::Methods { json } => {
            run_methods(json)?;
            Ok(())
        }
        Commands::Palette { config } => {
            let config = ProcessConfig::resolve(config.as_deref())?;
            let palette = config.to_palette()?;
            println!("{} colors ({:?})", palette.len(), config.color_space);
            for entry in palette.entries() {
                println!(
                    "  {:>3}  #{:02x}{:02x}{:02x}  boost {:.2}  threshold {:.1}",
                    entry.number, entry.rgb.r, entry.rgb.g, entry.rgb.b, entry.boost, entry.threshold
                );
            }
            Ok(())
        }
    }
}

fn run_process(config: ProcessConfig, input: &std::path::Path, json: bool) -> anyhow::Result<()> {
    let pipeline = StampPipeline::new(config)?;
    let progress = if json {
        Progress::none()
    } else {
        Progress::new(|p| {
            eprint!("\r{p:5.1}%");
            let _ = std::io::stderr().flush();
        })
    };

    let output = pipeline.run(input, &progress, &CancelToken::new())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    eprintln!();
    println!(
        "Wrote {} ({}x{}, {} frame(s), {} points)",
        output.stamp_path.display(),
        output.width,
        output.height,
        output.frame_count,
        output.points
    );
    if let Some(frames) = &output.frames_path {
        println!("Wrote {}", frames.display());
    }
    println!("Wrote {}", output.preview_path.display());
    Ok(())
}

fn run_methods(json: bool) -> anyhow::Result<()> {
    if json {
        let methods: Vec<serde_json::Value> = DitherAlgorithm::ALL
            .iter()
            .map(|a| {
                serde_json::json!({
                    "id": a.id(),
                    "name": a.name(),
                    "description": a.description(),
                    "uses_strength": a.uses_strength(),
                    "default_strength": a.default_options().strength,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&methods)?);
        return Ok(());
    }

    for algorithm in DitherAlgorithm::ALL {
        println!("{:<16} {:<18} {}", algorithm.id(), algorithm.name(), algorithm.description());
    }
    Ok(())
}
