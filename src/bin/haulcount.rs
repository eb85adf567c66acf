use anyhow::Context;
use clap::Parser;
use haulcount::{replay::read_frame_logs, Config, CountingPipeline};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "haulcount",
    about = "Count excavator passing and truck ritase from tracked detections",
    version = "0.1.0"
)]
struct Args {
    /// Frame log (JSON lines) produced by the tracking stage
    #[arg(short, long, required = true)]
    input: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report output path; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Frames per second of the source video
    #[arg(long)]
    fps: Option<f64>,

    /// Minimum confidence for a passing
    #[arg(long)]
    passing_threshold: Option<f32>,

    /// Minimum confidence for a ritase
    #[arg(long)]
    ritase_threshold: Option<f32>,
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(fps) = args.fps {
        cfg.fps = fps;
    }
    if let Some(threshold) = args.passing_threshold {
        cfg.passing_min_confidence = threshold;
    }
    if let Some(threshold) = args.ritase_threshold {
        cfg.ritase_min_confidence = threshold;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("haulcount=info")),
        )
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;

    let file = File::open(&args.input)
        .with_context(|| format!("opening frame log {}", args.input.display()))?;
    let frames = read_frame_logs(BufReader::new(file))?;
    info!(frames = frames.len(), input = %args.input.display(), "frame log loaded");

    let mut pipeline = CountingPipeline::new(cfg);
    for frame in &frames {
        pipeline.process_frame(frame.frame_index, &frame.tracked_detections());
    }

    let report = pipeline.report();
    info!(
        frames = report.stats.total_frames,
        passing = report.stats.passing_detections,
        ritase = report.stats.ritase_detections,
        cycle = report.final_display_cycle,
        "processing finished"
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating report {}", path.display()))?;
            serde_json::to_writer_pretty(file, &report)?;
            info!(output = %path.display(), "report written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}
