use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use codemorph::{
    AnimationFrame, CancellationToken, CpuRenderer, EncoderCapabilities, ExportFormat,
    ExportObserver, ExportOptions, ExportOutcome, FrameCaptureExporter, GlyphMetrics,
    PlaybackOptions, Project, RenderRequest, RenderSurface, Resolution, SystemEncoders,
    calculate_total_duration, diff_tokens, play, select_strategy,
};

#[derive(Parser, Debug)]
#[command(name = "codemorph", version)]
struct Cli {
    /// Log at DEBUG level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export a project as MP4, WebM or GIF.
    Export(ExportArgs),
    /// Render a single timeline frame as a PNG.
    Frame(FrameArgs),
    /// Print the character diff of two files as JSON.
    Diff(DiffArgs),
    /// Print timeline totals for a project.
    Info(InfoArgs),
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path. The format defaults to the extension.
    #[arg(long)]
    out: PathBuf,

    /// Output format (mp4, webm, gif).
    #[arg(long, value_parser = parse_format)]
    format: Option<ExportFormat>,

    /// Override frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// Override resolution (720p, 1080p).
    #[arg(long, value_parser = parse_resolution)]
    resolution: Option<Resolution>,

    /// Override the monospace font file.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Video bitrate in bits per second.
    #[arg(long)]
    bitrate: Option<u32>,

    /// Reuse captures for consecutive identical frames.
    #[arg(long, default_value_t = false)]
    static_frame_elision: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    index: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Override the monospace font file.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct DiffArgs {
    /// Source file.
    #[arg(long)]
    from: PathBuf,

    /// Destination file.
    #[arg(long)]
    to: PathBuf,

    /// Font size used to derive pixel positions.
    #[arg(long, default_value_t = 24.0)]
    font_size: f64,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn parse_format(s: &str) -> Result<ExportFormat, String> {
    ExportFormat::from_extension(s).ok_or_else(|| format!("unknown format '{s}'"))
}

fn parse_resolution(s: &str) -> Result<Resolution, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("unknown resolution '{s}' (expected 720p or 1080p)"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();

    match cli.cmd {
        Command::Export(args) => cmd_export(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Diff(args) => cmd_diff(args),
        Command::Info(args) => cmd_info(args),
    }
}

fn load_project(path: &Path, font: Option<PathBuf>) -> anyhow::Result<Project> {
    let mut project = Project::from_path(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    project.resolve_paths(base);
    if font.is_some() {
        project.editor.font_path = font;
    }
    project.validate()?;
    Ok(project)
}

struct CliProgress {
    last_pct: u32,
}

impl ExportObserver for CliProgress {
    fn on_progress(&mut self, progress: f64) {
        let pct = (progress * 100.0).floor() as u32;
        if pct >= self.last_pct + 10 || pct == 100 {
            self.last_pct = pct;
            tracing::info!("export {pct}%");
        }
    }
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut project = load_project(&args.in_path, args.font)?;
    let by_extension = args
        .out
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ExportFormat::from_extension);
    if let Some(format) = args.format.or(by_extension) {
        project.settings.export_format = format;
    }
    if let Some(fps) = args.fps {
        project.settings.fps = fps;
    }
    if let Some(resolution) = args.resolution {
        project.settings.resolution = resolution;
    }

    let options = ExportOptions {
        bitrate: args.bitrate,
        elide_static_frames: args.static_frame_elision,
        ..ExportOptions::default()
    };
    let mut exporter = FrameCaptureExporter::new(CpuRenderer::new(), SystemEncoders::new())
        .with_options(options);
    let outcome = exporter.export(
        &project.slides,
        &project.settings,
        &project.editor,
        &mut CliProgress { last_pct: 0 },
        &CancellationToken::new(),
    );

    match outcome {
        ExportOutcome::Completed(blob) => {
            blob.write_to(&args.out)?;
            let stats = exporter.stats();
            eprintln!(
                "wrote {} ({} bytes, {} frames, {} elided)",
                args.out.display(),
                blob.len(),
                stats.frames_total,
                stats.frames_elided
            );
            Ok(())
        }
        ExportOutcome::Cancelled => anyhow::bail!("export cancelled"),
        ExportOutcome::Failed(err) => Err(err.into()),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let project = load_project(&args.in_path, args.font)?;
    let opts = PlaybackOptions {
        metrics: GlyphMetrics::for_font_size(project.editor.font_size),
        ..PlaybackOptions::instant()
    };
    let mut playback = play(&project.slides, &project.settings, opts)?;
    let total = playback.total_frames();
    let frame: AnimationFrame = playback
        .nth(args.index as usize)
        .transpose()?
        .with_context(|| format!("frame {} is out of range (timeline has {total})", args.index))?;

    let mut renderer = CpuRenderer::new();
    let req = RenderRequest {
        settings: &project.settings,
        editor: &project.editor,
    };
    renderer.render(&frame, &req)?;
    let bitmap = renderer.capture(project.settings.resolution.canvas())?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &bitmap.straight_alpha(),
        bitmap.width,
        bitmap.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_diff(args: DiffArgs) -> anyhow::Result<()> {
    let from = std::fs::read_to_string(&args.from)
        .with_context(|| format!("read '{}'", args.from.display()))?;
    let to = std::fs::read_to_string(&args.to)
        .with_context(|| format!("read '{}'", args.to.display()))?;
    let metrics = GlyphMetrics::new(args.font_size * 0.6, args.font_size * 1.5)?;
    let diff = diff_tokens(&from, &to, metrics);
    let stats = diff.stats();

    println!(
        "{}",
        serde_json::to_string_pretty(&diff).context("serialize diff")?
    );
    eprintln!(
        "kept {} added {} removed {}",
        stats.kept, stats.added, stats.removed
    );
    Ok(())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let project = load_project(&args.in_path, None)?;
    let settings = &project.settings;
    let frames = play(&project.slides, settings, PlaybackOptions::instant())?.total_frames();
    let strategy = select_strategy(settings.export_format, &EncoderCapabilities::detect())
        .map(|s| s.name().to_string())
        .unwrap_or_else(|e| format!("unavailable ({e})"));

    println!("slides: {}", project.slides.len());
    println!("fps: {}", settings.fps);
    let canvas = settings.resolution.canvas();
    println!("resolution: {}x{}", canvas.width, canvas.height);
    println!("frames: {frames}");
    println!(
        "duration: {:.2}s ({:.2}s without transitions)",
        calculate_total_duration(&project.slides, true),
        calculate_total_duration(&project.slides, false)
    );
    println!(
        "encoder: {} -> {}",
        settings.export_format.extension(),
        strategy
    );
    Ok(())
}
