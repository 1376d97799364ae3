use super::*;
use crate::encode::sink::{EncodedFrame, InMemoryEncoder};
use crate::export::strategy::EncoderCapabilities;
use crate::foundation::core::Canvas;
use crate::model::slide::ExportFormat;
use crate::playback::orchestrator::{AnimationFrame, total_frame_count};
use std::sync::Mutex;

#[derive(Default)]
struct SolidSurface {
    renders: usize,
    color: [u8; 4],
    fail_at: Option<usize>,
    cancel_after: Option<(usize, CancellationToken)>,
    render_time: Duration,
    captured_canvas: Option<Canvas>,
}

impl RenderSurface for SolidSurface {
    fn render(&mut self, frame: &AnimationFrame, _req: &RenderRequest<'_>) -> MorphResult<()> {
        if self.fail_at == Some(self.renders) {
            return Err(MorphError::capture("blocked resource"));
        }
        if !self.render_time.is_zero() {
            std::thread::sleep(self.render_time);
        }
        self.color = [
            frame.slide_index() as u8 * 50,
            if frame.is_transition() { 255 } else { 0 },
            self.renders as u8,
            255,
        ];
        self.renders += 1;
        Ok(())
    }

    fn capture(&mut self, canvas: Canvas) -> MorphResult<FrameRGBA> {
        if let Some((n, token)) = &self.cancel_after
            && *n == self.renders
        {
            token.cancel();
        }
        Ok(FrameRGBA::solid(
            self.captured_canvas.unwrap_or(canvas),
            self.color,
        ))
    }
}

struct MemoryProvider {
    caps: EncoderCapabilities,
    encoder: InMemoryEncoder,
}

impl MemoryProvider {
    fn new() -> Self {
        Self {
            caps: EncoderCapabilities::with_encoders(["libx264"]),
            encoder: InMemoryEncoder::new(),
        }
    }

    fn frames(&self) -> Arc<Mutex<Vec<EncodedFrame>>> {
        self.encoder.frames()
    }
}

impl EncoderProvider for MemoryProvider {
    fn capabilities(&self) -> MorphResult<EncoderCapabilities> {
        Ok(self.caps.clone())
    }

    fn create(&self, _strategy: EncoderStrategy) -> MorphResult<Box<dyn FrameEncoder>> {
        Ok(Box::new(self.encoder.clone()))
    }
}

#[derive(Default)]
struct Recorder {
    progress: Vec<f64>,
    completed: usize,
    errors: Vec<String>,
    cancelled: usize,
}

impl ExportObserver for Recorder {
    fn on_progress(&mut self, progress: f64) {
        self.progress.push(progress);
    }
    fn on_complete(&mut self, _blob: &Blob) {
        self.completed += 1;
    }
    fn on_error(&mut self, error: &MorphError) {
        self.errors.push(error.to_string());
    }
    fn on_cancelled(&mut self) {
        self.cancelled += 1;
    }
}

#[derive(Clone, Default)]
struct CountingClock(Arc<Mutex<Vec<Duration>>>);

impl Clock for CountingClock {
    fn sleep(&mut self, d: Duration) {
        self.0.lock().unwrap().push(d);
    }
}

fn slides() -> Vec<AnimationSlide> {
    vec![
        AnimationSlide::new("a", "let a = 1;", "rust", 0.2),
        AnimationSlide::new("b", "let a = 2;", "rust", 0.2),
        AnimationSlide::new("c", "let b = 2;", "rust", 0.2),
    ]
}

fn settings() -> AnimationSettings {
    AnimationSettings {
        fps: 10,
        resolution: Resolution::Hd720,
        export_format: ExportFormat::Mp4,
        ..Default::default()
    }
}

fn options() -> ExportOptions {
    ExportOptions {
        transition_secs: 0.2,
        ..Default::default()
    }
}

const TOTAL: u64 = 2 + 2 + 2 + 2 * 2;

fn exporter(
    surface: SolidSurface,
) -> (
    FrameCaptureExporter<SolidSurface, MemoryProvider>,
    Arc<Mutex<Vec<EncodedFrame>>>,
) {
    let provider = MemoryProvider::new();
    let frames = provider.frames();
    (
        FrameCaptureExporter::new(surface, provider).with_options(options()),
        frames,
    )
}

#[test]
fn completes_with_every_frame_in_timeline_order() {
    let (mut ex, frames) = exporter(SolidSurface::default());
    let mut obs = Recorder::default();
    let outcome = ex.export(
        &slides(),
        &settings(),
        &EditorSettings::default(),
        &mut obs,
        &CancellationToken::new(),
    );

    assert!(matches!(outcome, ExportOutcome::Completed(ref b) if b.mime == "video/mp4"));
    assert_eq!(total_frame_count(&slides(), 10, 0.2), Some(TOTAL));
    let frames = frames.lock().unwrap();
    assert_eq!(frames.len() as u64, TOTAL);
    for (i, f) in frames.iter().enumerate() {
        assert_eq!(f.timestamp_us, i as u64 * 100_000);
        assert_eq!(f.frame.canvas(), Resolution::Hd720.canvas());
    }
    let kinds: Vec<u8> = frames.iter().map(|f| f.frame.data[1]).collect();
    assert_eq!(kinds, vec![0, 0, 255, 255, 0, 0, 255, 255, 0, 0]);

    assert_eq!(obs.completed, 1);
    assert!(obs.errors.is_empty());
    assert_eq!(obs.cancelled, 0);
    assert!(obs.progress.windows(2).all(|w| w[0] < w[1]));
    assert!(obs.progress.iter().all(|p| (0.0..=1.0).contains(p)));
    assert_eq!(obs.progress.last().copied(), Some(1.0));
    assert!(obs.progress.iter().filter(|p| **p < 1.0).all(|p| *p <= 0.99));

    let stats = ex.stats();
    assert_eq!(stats.frames_total, TOTAL);
    assert_eq!(stats.frames_rendered, TOTAL);
    assert_eq!(stats.frames_elided, 0);
    assert_eq!(
        stats.strategy,
        Some(EncoderStrategy::StreamingVideo(
            crate::encode::ffmpeg::VideoCodec::H264
        ))
    );
}

#[test]
fn fewer_than_two_slides_fail_before_any_work() {
    let (mut ex, frames) = exporter(SolidSurface::default());
    let mut obs = Recorder::default();
    let one = vec![AnimationSlide::new("a", "x", "rust", 1.0)];
    let outcome = ex.export(
        &one,
        &settings(),
        &EditorSettings::default(),
        &mut obs,
        &CancellationToken::new(),
    );
    assert!(matches!(
        outcome,
        ExportOutcome::Failed(MorphError::InsufficientSlides { count: 1 })
    ));
    assert_eq!(obs.errors.len(), 1);
    assert_eq!(obs.completed, 0);
    assert_eq!(ex.renderer().renders, 0);
    assert!(frames.lock().unwrap().is_empty());
}

#[test]
fn unsupported_encoder_fails_before_rendering() {
    let mut provider = MemoryProvider::new();
    provider.caps = EncoderCapabilities::default();
    let mut ex = FrameCaptureExporter::new(SolidSurface::default(), provider);
    let mut obs = Recorder::default();
    let outcome = ex.export(
        &slides(),
        &settings(),
        &EditorSettings::default(),
        &mut obs,
        &CancellationToken::new(),
    );
    assert!(matches!(
        outcome,
        ExportOutcome::Failed(MorphError::EncoderConfiguration(_))
    ));
    assert_eq!(ex.renderer().renders, 0);
    assert_eq!(obs.errors.len(), 1);
}

#[test]
fn cancellation_stops_at_the_next_frame_boundary() {
    let token = CancellationToken::new();
    let surface = SolidSurface {
        cancel_after: Some((3, token.clone())),
        ..Default::default()
    };
    let (mut ex, frames) = exporter(surface);
    let mut obs = Recorder::default();
    let outcome = ex.export(
        &slides(),
        &settings(),
        &EditorSettings::default(),
        &mut obs,
        &token,
    );

    assert!(matches!(outcome, ExportOutcome::Cancelled));
    assert_eq!(obs.cancelled, 1);
    assert_eq!(obs.completed, 0);
    assert!(obs.errors.is_empty());
    assert_eq!(ex.renderer().renders, 3);
    assert_eq!(frames.lock().unwrap().len(), 3);
}

#[test]
fn cancelled_before_start_captures_nothing() {
    let token = CancellationToken::new();
    token.cancel();
    let (mut ex, frames) = exporter(SolidSurface::default());
    let mut obs = Recorder::default();
    let outcome = ex.export(
        &slides(),
        &settings(),
        &EditorSettings::default(),
        &mut obs,
        &token,
    );
    assert!(outcome.into_result().unwrap().is_none());
    assert_eq!(obs.cancelled, 1);
    assert_eq!(ex.renderer().renders, 0);
    assert!(frames.lock().unwrap().is_empty());
}

#[test]
fn capture_failure_aborts_once_without_blob() {
    let surface = SolidSurface {
        fail_at: Some(4),
        ..Default::default()
    };
    let (mut ex, frames) = exporter(surface);
    let mut obs = Recorder::default();
    let outcome = ex.export(
        &slides(),
        &settings(),
        &EditorSettings::default(),
        &mut obs,
        &CancellationToken::new(),
    );
    assert!(matches!(outcome, ExportOutcome::Failed(MorphError::Capture(_))));
    assert_eq!(obs.errors, vec!["capture error: blocked resource".to_string()]);
    assert_eq!(obs.completed, 0);
    assert_eq!(frames.lock().unwrap().len(), 4);
}

#[test]
fn wrong_capture_size_is_a_capture_error() {
    let surface = SolidSurface {
        captured_canvas: Some(Canvas {
            width: 2,
            height: 2,
        }),
        ..Default::default()
    };
    let (mut ex, _) = exporter(surface);
    let outcome = ex.export(
        &slides(),
        &settings(),
        &EditorSettings::default(),
        &mut (),
        &CancellationToken::new(),
    );
    assert!(matches!(outcome, ExportOutcome::Failed(MorphError::Capture(_))));
}

#[test]
fn static_hold_frames_are_elided_when_enabled() {
    let provider = MemoryProvider::new();
    let frames = provider.frames();
    let mut ex = FrameCaptureExporter::new(SolidSurface::default(), provider).with_options(
        ExportOptions {
            elide_static_frames: true,
            ..options()
        },
    );
    let outcome = ex.export(
        &slides(),
        &settings(),
        &EditorSettings::default(),
        &mut (),
        &CancellationToken::new(),
    );
    assert!(matches!(outcome, ExportOutcome::Completed(_)));
    let stats = ex.stats();
    assert_eq!(stats.frames_elided, 3);
    assert_eq!(stats.frames_rendered, TOTAL - 3);
    let frames = frames.lock().unwrap();
    assert_eq!(frames.len() as u64, TOTAL);
    assert_eq!(frames[0].frame, frames[1].frame);
}

#[test]
fn settle_delay_runs_once_per_rendered_frame() {
    let clock = CountingClock::default();
    let sleeps = Arc::clone(&clock.0);
    let provider = MemoryProvider::new();
    let mut ex = FrameCaptureExporter::new(SolidSurface::default(), provider)
        .with_options(ExportOptions {
            settle_delay: Duration::from_millis(16),
            ..options()
        })
        .with_clock(clock);
    let outcome = ex.export(
        &slides(),
        &settings(),
        &EditorSettings::default(),
        &mut (),
        &CancellationToken::new(),
    );
    assert!(matches!(outcome, ExportOutcome::Completed(_)));
    let sleeps = sleeps.lock().unwrap();
    assert_eq!(sleeps.len() as u64, TOTAL);
    assert!(sleeps.iter().all(|d| *d == Duration::from_millis(16)));
}

#[test]
fn frame_budget_overrun_fails_the_export() {
    let surface = SolidSurface {
        render_time: Duration::from_millis(20),
        ..Default::default()
    };
    let provider = MemoryProvider::new();
    let mut ex = FrameCaptureExporter::new(surface, provider).with_options(ExportOptions {
        frame_budget: Some(Duration::from_millis(1)),
        ..options()
    });
    let mut obs = Recorder::default();
    let outcome = ex.export(
        &slides(),
        &settings(),
        &EditorSettings::default(),
        &mut obs,
        &CancellationToken::new(),
    );
    assert!(matches!(outcome, ExportOutcome::Failed(MorphError::Capture(_))));
    assert!(obs.errors[0].contains("budget"));
    assert_eq!(ex.renderer().renders, 1);
}

#[test]
fn bitrate_defaults_follow_resolution() {
    let o = ExportOptions::default();
    assert_eq!(o.bitrate_for(Resolution::Hd1080), 8_000_000);
    assert_eq!(o.bitrate_for(Resolution::Hd720), 5_000_000);
    let custom = ExportOptions {
        bitrate: Some(1),
        ..o
    };
    assert_eq!(custom.bitrate_for(Resolution::Hd1080), 1);
}
