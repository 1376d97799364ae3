use crate::encode::sink::{Blob, EncodeConfig, FrameEncoder};
use crate::export::fingerprint::{FrameFingerprint, fingerprint_frame};
use crate::export::progress::ProgressReporter;
use crate::export::strategy::{EncoderProvider, EncoderStrategy, select_strategy};
use crate::foundation::core::{FrameIndex, GlyphMetrics};
use crate::foundation::error::{MorphError, MorphResult};
use crate::model::slide::{AnimationSettings, AnimationSlide, EditorSettings, Resolution};
use crate::playback::clock::{Clock, SystemClock};
use crate::playback::orchestrator::{DEFAULT_TRANSITION_SECS, Playback, PlaybackOptions, play};
use crate::render::backend::{FrameRGBA, RenderRequest, RenderSurface};
use crate::render::theme::Theme;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cooperative cancellation flag, polled once per frame.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Work already in flight for the current frame completes first.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Return `true` once [`CancellationToken::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Callbacks for one export. Exactly one of `on_complete`, `on_error`, `on_cancelled` fires.
pub trait ExportObserver {
    /// Monotonic progress in `[0, 1]`.
    fn on_progress(&mut self, _progress: f64) {}
    /// The export produced `blob`.
    fn on_complete(&mut self, _blob: &Blob) {}
    /// The export failed; no blob is produced.
    fn on_error(&mut self, _error: &MorphError) {}
    /// The export was cancelled; no blob is produced.
    fn on_cancelled(&mut self) {}
}

impl ExportObserver for () {}

/// Terminal state of an export.
#[derive(Debug)]
pub enum ExportOutcome {
    /// Encoded output.
    Completed(Blob),
    /// Stopped through the [`CancellationToken`].
    Cancelled,
    /// Aborted by the first error.
    Failed(MorphError),
}

impl ExportOutcome {
    /// The blob of a completed export.
    pub fn into_result(self) -> MorphResult<Option<Blob>> {
        match self {
            Self::Completed(blob) => Ok(Some(blob)),
            Self::Cancelled => Ok(None),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Export tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportOptions {
    /// Pause between render and capture.
    pub settle_delay: Duration,
    /// Video bitrate in bits per second; `None` picks a per-resolution default.
    pub bitrate: Option<u32>,
    /// GIF quantizer speed, 1 (best) to 30 (fastest).
    pub gif_speed: i32,
    /// Transition length in seconds.
    pub transition_secs: f64,
    /// Reuse the previous capture when a frame's fingerprint matches the last rendered one.
    pub elide_static_frames: bool,
    /// Fail with a capture error when one render+capture exceeds this.
    pub frame_budget: Option<Duration>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            bitrate: None,
            gif_speed: 10,
            transition_secs: DEFAULT_TRANSITION_SECS,
            elide_static_frames: false,
            frame_budget: None,
        }
    }
}

impl ExportOptions {
    /// Effective video bitrate at `resolution`.
    pub fn bitrate_for(&self, resolution: Resolution) -> u32 {
        self.bitrate.unwrap_or(match resolution {
            Resolution::Hd1080 => 8_000_000,
            Resolution::Hd720 => 5_000_000,
        })
    }
}

/// Counters of the last export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Frames in the timeline.
    pub frames_total: u64,
    /// Frames rendered and captured.
    pub frames_rendered: u64,
    /// Frames that reused the previous capture.
    pub frames_elided: u64,
    /// Strategy used, once selected.
    pub strategy: Option<EncoderStrategy>,
}

/// Drives instant playback through a [`RenderSurface`] into an encoder from an
/// [`EncoderProvider`].
///
/// Frames are rendered, captured and encoded strictly in timeline order on the calling thread.
pub struct FrameCaptureExporter<R, P> {
    renderer: R,
    provider: P,
    options: ExportOptions,
    clock: Box<dyn Clock>,
    stats: ExportStats,
}

impl<R: RenderSurface, P: EncoderProvider> FrameCaptureExporter<R, P> {
    /// Exporter with default [`ExportOptions`].
    pub fn new(renderer: R, provider: P) -> Self {
        Self {
            renderer,
            provider,
            options: ExportOptions::default(),
            clock: Box::new(SystemClock),
            stats: ExportStats::default(),
        }
    }

    /// Replace the export options.
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the clock used for the settle delay.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Current options.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Counters of the most recent export.
    pub fn stats(&self) -> ExportStats {
        self.stats
    }

    /// The render surface.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Give back the render surface.
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Export `slides` into a single blob.
    ///
    /// Exactly one terminal observer callback fires, matching the returned outcome.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(slides = slides.len(), format = ?settings.export_format, fps = settings.fps)
    )]
    pub fn export(
        &mut self,
        slides: &[AnimationSlide],
        settings: &AnimationSettings,
        editor: &EditorSettings,
        observer: &mut dyn ExportObserver,
        cancel: &CancellationToken,
    ) -> ExportOutcome {
        self.stats = ExportStats::default();
        match self.run(slides, settings, editor, observer, cancel) {
            Ok(Some(blob)) => {
                tracing::info!(
                    bytes = blob.len(),
                    mime = %blob.mime,
                    rendered = self.stats.frames_rendered,
                    elided = self.stats.frames_elided,
                    "export complete"
                );
                observer.on_complete(&blob);
                ExportOutcome::Completed(blob)
            }
            Ok(None) => {
                tracing::info!(rendered = self.stats.frames_rendered, "export cancelled");
                observer.on_cancelled();
                ExportOutcome::Cancelled
            }
            Err(err) => {
                tracing::warn!(error = %err, "export failed");
                observer.on_error(&err);
                ExportOutcome::Failed(err)
            }
        }
    }

    fn run(
        &mut self,
        slides: &[AnimationSlide],
        settings: &AnimationSettings,
        editor: &EditorSettings,
        observer: &mut dyn ExportObserver,
        cancel: &CancellationToken,
    ) -> MorphResult<Option<Blob>> {
        if slides.len() < 2 {
            return Err(MorphError::insufficient_slides(slides.len()));
        }
        settings.validate()?;
        editor.validate()?;

        let strategy = select_strategy(settings.export_format, &self.provider.capabilities()?)?;
        self.stats.strategy = Some(strategy);
        tracing::debug!(strategy = strategy.name(), "encoder strategy selected");

        let canvas = settings.resolution.canvas();
        let cfg = EncodeConfig {
            width: canvas.width,
            height: canvas.height,
            fps: settings.fps,
            bitrate: self.options.bitrate_for(settings.resolution),
            format: settings.export_format,
            background: Theme::named(&editor.background).background,
            gif_speed: self.options.gif_speed,
        };
        cfg.validate()?;

        let playback = play(
            slides,
            settings,
            PlaybackOptions {
                skip_delays: true,
                transition_secs: self.options.transition_secs,
                metrics: GlyphMetrics::for_font_size(editor.font_size),
                ..PlaybackOptions::instant()
            },
        )?;
        self.stats.frames_total = playback.total_frames();

        let mut encoder = self.provider.create(strategy)?;
        encoder.begin(cfg)?;
        self.renderer.reset();

        let mut progress = ProgressReporter::new(strategy.capture_progress_cap());
        let captured = self.capture_all(
            playback,
            settings,
            editor,
            encoder.as_mut(),
            &mut progress,
            observer,
            cancel,
        );
        match captured {
            Ok(true) => {}
            Ok(false) => {
                encoder.abort();
                return Ok(None);
            }
            Err(err) => {
                encoder.abort();
                return Err(err);
            }
        }

        let blob = encoder.finish(&mut |p| {
            if let Some(v) = progress.finalize(p) {
                observer.on_progress(v);
            }
        })?;
        if let Some(v) = progress.finalize(1.0) {
            observer.on_progress(v);
        }
        Ok(Some(blob))
    }

    /// Returns `false` when cancelled.
    #[allow(clippy::too_many_arguments)]
    fn capture_all(
        &mut self,
        playback: Playback<'_>,
        settings: &AnimationSettings,
        editor: &EditorSettings,
        encoder: &mut dyn FrameEncoder,
        progress: &mut ProgressReporter,
        observer: &mut dyn ExportObserver,
        cancel: &CancellationToken,
    ) -> MorphResult<bool> {
        let canvas = settings.resolution.canvas();
        let total = playback.total_frames();
        let req = RenderRequest { settings, editor };
        let mut last: Option<(Option<FrameFingerprint>, FrameRGBA)> = None;

        for (i, frame) in playback.enumerate() {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            let frame = frame?;
            let idx = FrameIndex(i as u64);

            let fp = self
                .options
                .elide_static_frames
                .then(|| fingerprint_frame(&frame, settings.transition_type));
            let reuse = fp.is_some() && last.as_ref().is_some_and(|(prev, _)| *prev == fp);

            if reuse {
                self.stats.frames_elided += 1;
            } else {
                let started = Instant::now();
                self.renderer.render(&frame, &req)?;
                if !self.options.settle_delay.is_zero() {
                    self.clock.sleep(self.options.settle_delay);
                }
                let bitmap = self.renderer.capture(canvas)?;
                if bitmap.canvas() != canvas {
                    return Err(MorphError::capture(format!(
                        "surface captured at {}x{}, expected {}x{}",
                        bitmap.width, bitmap.height, canvas.width, canvas.height
                    )));
                }
                if let Some(budget) = self.options.frame_budget {
                    let took = started.elapsed();
                    if took > budget {
                        return Err(MorphError::capture(format!(
                            "frame {} took {} ms, budget is {} ms",
                            idx.0,
                            took.as_millis(),
                            budget.as_millis()
                        )));
                    }
                }
                self.stats.frames_rendered += 1;
                last = Some((fp, bitmap));
            }

            let Some((_, bitmap)) = last.as_ref() else {
                return Err(MorphError::capture("no captured frame available"));
            };
            encoder.push_frame(bitmap, idx.timestamp_us(settings.fps))?;

            if let Some(v) = progress.capture(idx.0 + 1, total) {
                observer.on_progress(v);
            }
        }

        Ok(!cancel.is_cancelled())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/exporter.rs"]
mod tests;
