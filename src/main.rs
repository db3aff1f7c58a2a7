use anyhow::{Context, Result};
#[cfg(not(feature = "webcam"))]
use anyhow::bail;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use vibe_fx::capture::{CaptureSource, ImageSequence};
use vibe_fx::output::{ImageDirOutput, OutputSink, V4L2Output};
use vibe_fx::segmentation::{
    self, ChannelOrder, DisplayMode, Preprocessor, SegmentationModel, VibeConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Read frames from a directory of still images instead of a webcam
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Write segmentation frames as PNG files into this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output v4l2loopback device path
    #[arg(short, long, default_value = "/dev/video10")]
    output_device: String,

    /// Capture resolution width
    #[arg(long, default_value_t = 1280)]
    capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 720)]
    capture_height: u32,

    /// Output resolution width
    #[arg(long, default_value_t = 1280)]
    output_width: u32,

    /// Output resolution height
    #[arg(long, default_value_t = 720)]
    output_height: u32,

    /// Model resolution width (defaults to the capture width)
    #[arg(long)]
    model_width: Option<u32>,

    /// Model resolution height (defaults to the capture height)
    #[arg(long)]
    model_height: Option<u32>,

    /// Target frames per second, 0 disables rate limiting
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Pass frames through without segmentation
    #[arg(long)]
    passthrough: bool,

    /// Samples kept per pixel
    #[arg(long, default_value_t = 20)]
    samples: usize,

    /// Per-channel colour distance under which a sample matches
    #[arg(long, default_value_t = 20)]
    radius: u16,

    /// Matching samples required to call a pixel background
    #[arg(long, default_value_t = 2)]
    min_matches: usize,

    /// Update probability denominator (larger values learn slower)
    #[arg(long, default_value_t = 16)]
    phi: u32,

    /// Detect camera shake and rebuild the model when it happens
    #[arg(long)]
    shaky_camera: bool,

    /// Reinitialize when fewer than this share of pixels keep their luma
    #[arg(long, default_value_t = 0.125)]
    frame_difference: f64,

    /// How the segmentation is drawn
    #[arg(long, value_enum, default_value_t = DisplayMode::Mask)]
    display_mode: DisplayMode,

    /// Channel layout of captured frames
    #[arg(long, value_enum, default_value_t = ChannelOrder::Rgb)]
    channel_order: ChannelOrder,

    /// Worker threads per frame (defaults to available cores)
    #[arg(long)]
    workers: Option<usize>,

    /// Seed for the model's random stream
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn vibe_config(&self) -> VibeConfig {
        VibeConfig {
            samples: self.samples,
            radius: self.radius,
            min_matches: self.min_matches,
            phi: self.phi,
            frame_difference_percentage: self.frame_difference,
            shaky_camera: self.shaky_camera,
            display_mode: self.display_mode,
            channel_order: self.channel_order,
            workers: self.workers,
            seed: self.seed,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("vibe-fx starting");

    let mut capture = open_capture(&args)?;
    let (capture_width, capture_height) = capture.resolution();
    tracing::info!("Capture: {}x{}", capture_width, capture_height);
    tracing::info!("Output: {}x{}", args.output_width, args.output_height);
    tracing::info!("Target FPS: {}", args.fps);

    let mut output = open_output(&args)?;

    let model: Option<Box<dyn SegmentationModel>> = if args.passthrough {
        tracing::info!("Running in passthrough mode (no segmentation)");
        None
    } else {
        let width = args.model_width.unwrap_or(capture_width);
        let height = args.model_height.unwrap_or(capture_height);
        let config = args.vibe_config();
        tracing::info!(
            "ViBe model {}x{}, display mode {:?}, shaky camera {}",
            width,
            height,
            config.display_mode,
            config.shaky_camera
        );
        let model = segmentation::create_default_model(config, width, height)
            .context("Failed to create ViBe model")?;
        Some(model)
    };

    run_pipeline(capture.as_mut(), output.as_mut(), model, args.fps)?;

    Ok(())
}

fn open_capture(args: &Args) -> Result<Box<dyn CaptureSource>> {
    if let Some(dir) = &args.frames {
        let source = ImageSequence::open(dir).context("Failed to open frame directory")?;
        return Ok(Box::new(source));
    }
    open_webcam(args)
}

#[cfg(feature = "webcam")]
fn open_webcam(args: &Args) -> Result<Box<dyn CaptureSource>> {
    let camera = vibe_fx::capture::WebcamCapture::new(
        args.input_device,
        args.capture_width,
        args.capture_height,
    )
    .context("Failed to initialize webcam capture")?;
    Ok(Box::new(camera))
}

#[cfg(not(feature = "webcam"))]
fn open_webcam(args: &Args) -> Result<Box<dyn CaptureSource>> {
    bail!(
        "no --frames directory given and webcam {} is unavailable: built without the `webcam` feature",
        args.input_device
    )
}

fn open_output(args: &Args) -> Result<Box<dyn OutputSink>> {
    if let Some(dir) = &args.output_dir {
        let sink = ImageDirOutput::new(dir, args.output_width, args.output_height)
            .context("Failed to open output directory")?;
        return Ok(Box::new(sink));
    }

    let sink = V4L2Output::new(&args.output_device, args.output_width, args.output_height)
        .context("Failed to initialize v4l2loopback output")?;
    Ok(Box::new(sink))
}

fn run_pipeline(
    capture: &mut dyn CaptureSource,
    output: &mut dyn OutputSink,
    mut model: Option<Box<dyn SegmentationModel>>,
    target_fps: u32,
) -> Result<()> {
    let frame_duration = (target_fps > 0).then(|| Duration::from_secs_f32(1.0 / target_fps as f32));
    let mut frame_count = 0u64;
    let mut reinit_count = 0u64;
    let mut total_capture_time = Duration::ZERO;
    let mut total_segment_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    let preprocessor = model.as_ref().map(|m| {
        let (width, height) = m.input_size();
        Preprocessor::new(width, height)
    });

    tracing::info!("Starting main pipeline loop");
    tracing::info!("Press Ctrl+C to stop");

    loop {
        let loop_start = Instant::now();

        // Capture frame
        let capture_start = Instant::now();
        let Some(frame) = capture
            .capture_frame()
            .context("Failed to capture frame")?
        else {
            tracing::info!("Capture source exhausted after {} frames", frame_count);
            break;
        };
        total_capture_time += capture_start.elapsed();

        let output_frame = match (model.as_mut(), preprocessor.as_ref()) {
            (Some(model), Some(preprocessor)) => {
                let segment_start = Instant::now();
                let input = preprocessor.preprocess(&frame);
                let segmentation = model
                    .segment(&input)
                    .context("Failed to segment frame")?;
                total_segment_time += segment_start.elapsed();

                if segmentation.reinitialized {
                    reinit_count += 1;
                }

                let (width, height) = frame.dimensions();
                Preprocessor::postprocess(segmentation.image, width, height)
            }
            _ => frame,
        };

        // Output frame
        let output_start = Instant::now();
        output
            .write_frame(&output_frame)
            .context("Failed to write frame")?;
        total_output_time += output_start.elapsed();

        frame_count += 1;

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_segment_ms = total_segment_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let total_ms = avg_capture_ms + avg_segment_ms + avg_output_ms;
            let actual_fps = 1000.0 / total_ms;

            tracing::info!(
                "Frame {}: capture={:.1}ms, segment={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}, reinits={}",
                frame_count,
                avg_capture_ms,
                avg_segment_ms,
                avg_output_ms,
                total_ms,
                actual_fps,
                reinit_count
            );
        }

        // Frame rate limiting
        if let Some(frame_duration) = frame_duration {
            let elapsed = loop_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }
    }

    Ok(())
}
