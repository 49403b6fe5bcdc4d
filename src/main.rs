use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dog_vision::{
    buffer::PixelBuffer,
    color::ColorModel,
    config::Config,
    live::{DirectoryProvider, DisplaySink, FrameSession, SessionDriver, SourceId},
    still::{self, OutputFormat, StillImageProcessor},
};

#[derive(Parser)]
#[command(
    name = "dog-vision",
    version,
    about = "See photos and live video the way a dog does",
    long_about = "Dog-Vision remaps image colors to simulate dichromatic (dog-like) color perception, for single images or a live stream of frames."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Transform a single image file
    Image {
        /// Input image (PNG, JPEG, BMP)
        #[arg(short, long)]
        input: PathBuf,

        /// Output image path; format follows the extension
        #[arg(short, long)]
        output: PathBuf,

        /// Color model (canine, dichromatic)
        #[arg(short, long)]
        model: Option<ColorModel>,

        /// Also write a before/after split view here
        #[arg(long)]
        compare: Option<PathBuf>,

        /// Where the split view switches from original to transformed (0.0-1.0)
        #[arg(long, default_value_t = 0.5)]
        split: f32,
    },

    /// Transform a directory of frames as a live stream
    Live {
        /// Directory of numbered frames
        #[arg(short, long)]
        frames: PathBuf,

        /// Directory the transformed frames are written to
        #[arg(short, long)]
        output: PathBuf,

        /// Color model (canine, dichromatic)
        #[arg(short, long)]
        model: Option<ColorModel>,

        /// Ticks per second
        #[arg(long)]
        fps: Option<f64>,

        /// Stop after this many frames
        #[arg(long)]
        max_frames: Option<u64>,

        /// Loop the frame directory until cancelled
        #[arg(long = "loop")]
        loop_frames: bool,
    },

    /// List the available color models
    Models,
}

/// Writes every presented frame into a directory as a numbered image
struct FrameDirectorySink {
    directory: PathBuf,
    format: OutputFormat,
    next_index: u64,
}

impl FrameDirectorySink {
    fn create(directory: &Path, format: OutputFormat) -> Result<Self> {
        std::fs::create_dir_all(directory)
            .with_context(|| format!("Could not create output directory {:?}", directory))?;
        Ok(Self {
            directory: directory.to_path_buf(),
            format,
            next_index: 0,
        })
    }
}

impl DisplaySink for FrameDirectorySink {
    fn present(&mut self, frame: &PixelBuffer) -> dog_vision::Result<()> {
        let bytes = still::encode(frame, self.format)?;
        let path = self
            .directory
            .join(format!("frame_{:05}.{}", self.next_index, self.format.extension()));
        std::fs::write(path, bytes)?;
        self.next_index += 1;
        Ok(())
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    info!("Starting Dog-Vision v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };

    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(config.processing_threads)
        .build_global()
    {
        warn!("Could not size the processing pool: {}", e);
    }

    match cli.command {
        Command::Image { input, output, model, compare, split } => {
            run_image(&config, &input, &output, model, compare.as_deref(), split)
        }
        Command::Live { frames, output, model, fps, max_frames, loop_frames } => {
            let mut config = config;
            if let Some(model) = model {
                config.filter.model = model;
            }
            if let Some(fps) = fps {
                config.live.fps = fps;
            }
            if max_frames.is_some() {
                config.live.max_frames = max_frames;
            }
            config.live.loop_frames |= loop_frames;
            config.validate()?;
            run_live(&config, &frames, &output).await
        }
        Command::Models => {
            for model in ColorModel::ALL {
                println!("{:<12} {}", model.name(), model.description());
            }
            Ok(())
        }
    }
}

fn run_image(
    config: &Config,
    input: &Path,
    output: &Path,
    model: Option<ColorModel>,
    compare: Option<&Path>,
    split: f32,
) -> Result<()> {
    let mut filter = config.filter.clone();
    if let Some(model) = model {
        filter.model = model;
    }

    let processor = StillImageProcessor::with_transformer(filter.transformer());
    let processed = processor
        .process_file(input)
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    info!(
        "Applied {} model to {}x{} image",
        processed.model,
        processed.original.width(),
        processed.original.height()
    );

    let bytes = processed.encode_transformed(config.output.format_for(output))?;
    std::fs::write(output, bytes).with_context(|| format!("Could not write {:?}", output))?;
    info!("Saved transformed image to {:?}", output);

    if let Some(compare) = compare {
        let split_view = processed.comparison(split);
        let bytes = still::encode(&split_view, config.output.format_for(compare))?;
        std::fs::write(compare, bytes).with_context(|| format!("Could not write {:?}", compare))?;
        info!("Saved comparison view to {:?}", compare);
    }

    Ok(())
}

async fn run_live(config: &Config, frames: &Path, output: &Path) -> Result<()> {
    let sink = FrameDirectorySink::create(output, config.output.output_format())?;
    let provider = DirectoryProvider::new(config.live.loop_frames);

    let mut session = FrameSession::with_transformer(
        Box::new(provider),
        Box::new(sink),
        config.filter.transformer(),
    );

    session
        .start(SourceId::new(frames.display().to_string()))
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let cancel = session.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping live session");
            cancel.cancel();
        }
    });

    let stats = SessionDriver::from_config(&config.live).run(&mut session).await?;
    info!(
        "Wrote {} frames to {:?} ({} ticks, {} without a new frame)",
        stats.frames_rendered, output, stats.ticks, stats.idle_ticks
    );
    Ok(())
}
