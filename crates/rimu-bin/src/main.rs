// rimu: decode osu! charts and drive the playback clock against simulated audio.

mod info;
mod simulate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use log::{LevelFilter, info};
use osu_model::{BeatmapData, BeatmapDecoder};
use rimu_config::Config;

use simulate::SimulateOptions;

#[derive(Parser, Debug)]
#[command(name = "rimu", about = "osu! chart decoder and playback clock simulator")]
struct Cli {
    /// Path to the JSON config file.
    #[arg(long, global = true, default_value = "rimu.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a chart and print a summary.
    Info {
        /// Path to the .osu file.
        file: PathBuf,
        /// Skip the [HitObjects] section.
        #[arg(long)]
        no_hit_objects: bool,
        /// Print the decoded chart as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Play a chart against simulated audio and report the clock state.
    Simulate {
        /// Path to the .osu file.
        file: PathBuf,
        /// Seconds of playback to simulate.
        #[arg(long, default_value_t = 10.0)]
        seconds: f64,
        /// Rendered frames per second.
        #[arg(long, default_value_t = 60.0)]
        fps: f64,
        /// Audio playback speed.
        #[arg(long, default_value_t = 1.0)]
        speed: f32,
        /// Audio position in seconds at which to seek.
        #[arg(long)]
        seek_at: Option<f64>,
        /// Seconds to seek by; negative seeks backwards.
        #[arg(long, default_value_t = 3.0, allow_hyphen_values = true)]
        seek_by: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logger first so config loading is reported; RUST_LOG wins over the config level
    let env_filter = std::env::var_os("RUST_LOG").is_some();
    let _ = env_logger::Builder::new()
        .filter_level(LevelFilter::Trace)
        .parse_default_env()
        .try_init();
    if !env_filter {
        log::set_max_level(LevelFilter::Info);
    }

    let config = load_config(&cli.config);
    if !env_filter {
        log::set_max_level(config.log_level.parse().unwrap_or(LevelFilter::Info));
    }

    match cli.command {
        Commands::Info {
            file,
            no_hit_objects,
            json,
        } => {
            let with_hit_objects = config.decode.with_hit_objects && !no_hit_objects;
            let data = decode(&file, with_hit_objects)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print!("{}", info::summary(&data));
            }
        }
        Commands::Simulate {
            file,
            seconds,
            fps,
            speed,
            seek_at,
            seek_by,
        } => {
            ensure!(fps > 0.0 && fps.is_finite(), "--fps must be positive");
            ensure!(seconds >= 0.0 && seconds.is_finite(), "--seconds must not be negative");
            ensure!(speed > 0.0 && speed.is_finite(), "--speed must be positive");

            let data = decode(&file, config.decode.with_hit_objects)?;
            let options = SimulateOptions {
                seconds,
                fps,
                speed,
                seek_at,
                seek_by,
            };
            let report = simulate::run(&data, config.clock.clone(), &options);
            print!("{report}");
        }
    }
    Ok(())
}

/// Load config from file, falling back to defaults if not found
fn load_config(path: &Path) -> Config {
    match Config::read(path) {
        Ok(c) => {
            info!("Loaded config from {}", path.display());
            c
        }
        Err(e) => {
            info!("Config not found at {} ({e}), using defaults", path.display());
            Config::default()
        }
    }
}

fn decode(path: &Path, with_hit_objects: bool) -> Result<BeatmapData> {
    BeatmapDecoder::new()
        .with_hit_objects(with_hit_objects)
        .decode_file(path)
        .with_context(|| format!("Failed to decode {}", path.display()))
}
