use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use linecount_rs::{
    ClassVocabulary, CountingConfig, CountingPipeline, CountingSession, ReplayDetector, RunSummary,
};

#[derive(Parser, Debug)]
#[command(name = "linecount", about = "Count tracked objects crossing a horizontal line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count crossings from recorded detections without decoding video
    Count(CountArgs),
    /// Count crossings and write an annotated copy of the input video
    #[cfg(feature = "opencv")]
    Annotate(AnnotateArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON Lines file with one `{"frame": n, "detections": [...]}` record per frame
    #[arg(long, value_name = "PATH")]
    detections: PathBuf,
    /// JSON configuration file; flags below override it
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Comma-separated classes to count, e.g. `car,truck`
    #[arg(long, value_delimiter = ',')]
    classes: Option<Vec<String>>,
    /// Half-height of the counting band in pixels
    #[arg(long)]
    margin: Option<i32>,
    /// Write a JSON summary of the run here
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,
    /// Log and pass through frames whose detection fails instead of aborting
    #[arg(long)]
    skip_failed_frames: bool,
}

#[derive(Args, Debug)]
struct CountArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Frame height in pixels; the counting line sits at its middle row
    #[arg(long)]
    height: u32,
    /// Frame width in pixels
    #[arg(long, default_value_t = 0)]
    width: u32,
    /// Number of frames in the video; defaults to running until the recorded detections end
    #[arg(long)]
    frames: Option<u64>,
}

#[cfg(feature = "opencv")]
#[derive(Args, Debug)]
struct AnnotateArgs {
    #[command(flatten)]
    run: RunArgs,
    /// Input video (mp4, mov or avi)
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
    /// Output MP4 path
    #[arg(long, value_name = "PATH", default_value = "output_counted.mp4")]
    output: PathBuf,
}

impl RunArgs {
    fn load_config(&self) -> Result<CountingConfig> {
        let mut config = match &self.config {
            Some(path) => CountingConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => CountingConfig::default(),
        };
        if let Some(classes) = &self.classes {
            config.classes = classes.iter().map(|c| c.trim().to_string()).collect();
        }
        if let Some(margin) = self.margin {
            config.band_margin = margin;
        }
        config.validate()?;

        let vocabulary = ClassVocabulary::coco();
        for class in config.classes.iter().filter(|c| !vocabulary.contains(c)) {
            warn!(class = %class, "class is not a COCO label; a pretrained detector will never report it");
        }
        Ok(config)
    }

    fn write_summary(&self, summary: &RunSummary) -> Result<()> {
        if let Some(path) = &self.summary {
            summary
                .write_json(path)
                .with_context(|| format!("writing summary {}", path.display()))?;
            info!(path = %path.display(), "wrote run summary");
        }
        Ok(())
    }
}

fn count(args: CountArgs) -> Result<()> {
    let config = args.run.load_config()?;
    let detector = ReplayDetector::open(&args.run.detections)
        .with_context(|| format!("opening detections {}", args.run.detections.display()))?;
    let pipeline = CountingPipeline::from_config(detector, &config, args.height)?;
    let mut session = CountingSession::new(pipeline, args.run.skip_failed_frames);

    info!(line_y = session.summary().line.y, classes = ?config.classes, "counting from recorded detections");
    session
        .run_recorded(args.frames, args.width, args.height)
        .with_context(|| format!("replaying {}", args.run.detections.display()))?;

    let summary = session.into_summary();
    info!(frames = summary.frames, counted = summary.crossings.len(), skipped = summary.skipped_frames.len(), "finished");
    println!("{}", summary.tally);
    args.run.write_summary(&summary)
}

#[cfg(feature = "opencv")]
fn annotate(args: AnnotateArgs) -> Result<()> {
    use linecount_rs::Overlay;
    use linecount_rs::config::check_input_container;
    use linecount_rs::video::{FrameSource, VideoSink, frame_bytes};

    let config = args.run.load_config()?;
    check_input_container(&args.input)?;
    let mut source = FrameSource::open(&args.input)
        .with_context(|| format!("opening input video {}", args.input.display()))?;
    let (width, height) = (source.width(), source.height());

    let detector = ReplayDetector::open(&args.run.detections)
        .with_context(|| format!("opening detections {}", args.run.detections.display()))?;
    let pipeline = CountingPipeline::from_config(detector, &config, height)?;
    let line = pipeline.counter().line();
    let mut session = CountingSession::new(pipeline, args.run.skip_failed_frames);

    let mut sink = VideoSink::create(&args.output, width, height, source.fps())
        .with_context(|| format!("creating output video {}", args.output.display()))?;

    let mut run = || -> Result<()> {
        while let Some(mut frame) = source.read_frame()? {
            let frame_index = session.pipeline().frames_processed();
            let report = {
                let bytes = frame_bytes(&frame)?;
                session
                    .step(&bytes, width, height)
                    .with_context(|| format!("processing frame {frame_index}"))?
            };
            let overlay = report.map(|r| Overlay::build(width, &r.objects, line, &r.tally));
            sink.write(&mut frame, overlay.as_ref())?;
        }
        Ok(())
    };

    if let Err(err) = run() {
        drop(sink);
        if let Err(remove_err) = std::fs::remove_file(&args.output) {
            warn!(path = %args.output.display(), error = %remove_err, "could not remove partial output");
        }
        return Err(err);
    }

    let written = sink.frames_written();
    if let Some(advertised) = source.frame_count().filter(|&n| n != written) {
        warn!(advertised, written, "container frame count differs from frames decoded");
    }
    sink.release()?;

    let summary = session.into_summary();
    info!(frames = summary.frames, skipped = summary.skipped_frames.len(), counted = summary.crossings.len(), output = %args.output.display(), "finished");
    println!("{}", summary.tally);
    args.run.write_summary(&summary)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Count(args) => count(args),
        #[cfg(feature = "opencv")]
        Command::Annotate(args) => annotate(args),
    }
}
