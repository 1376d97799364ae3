use crate::animation::ease::Ease;
use crate::animation::transition::{TransitionFrame, TransitionFrames, generate_transition};
use crate::foundation::core::{FrameIndex, GlyphMetrics};
use crate::foundation::error::{MorphError, MorphResult};
use crate::model::slide::{AnimationSettings, AnimationSlide, checked_frames_for_secs};
use crate::playback::clock::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Fixed transition length between adjacent slides, independent of slide durations.
pub const DEFAULT_TRANSITION_SECS: f64 = 1.0;

/// One step of the playback timeline.
#[derive(Clone, Debug)]
pub enum AnimationFrame {
    /// Static hold of a slide.
    Slide {
        /// Index of the held slide.
        slide_index: usize,
        /// The held slide.
        slide: Arc<AnimationSlide>,
    },
    /// Morph from `slide_index` to `slide_index + 1`.
    Transition {
        /// Index of the source slide.
        slide_index: usize,
        /// Transition state for this step.
        frame: TransitionFrame,
    },
}

impl AnimationFrame {
    /// Slide index this frame belongs to (the source slide for transitions).
    pub fn slide_index(&self) -> usize {
        match self {
            Self::Slide { slide_index, .. } | Self::Transition { slide_index, .. } => *slide_index,
        }
    }

    /// Return `true` for transition frames.
    pub fn is_transition(&self) -> bool {
        matches!(self, Self::Transition { .. })
    }
}

/// Progress of a playback: `current` frames of `total` yielded so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameProgress {
    /// Frames yielded so far (1-based after the first frame).
    pub current: u64,
    /// Precomputed total frame count.
    pub total: u64,
}

impl FrameProgress {
    /// `current / total` in `[0, 1]`.
    pub fn fraction(self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        (self.current as f64 / self.total as f64).min(1.0)
    }
}

/// Options controlling [`play`].
#[derive(Clone, Copy, Debug)]
pub struct PlaybackOptions {
    /// Do not pace frames against the clock (export). Frame content is identical either way.
    pub skip_delays: bool,
    /// Transition length in seconds.
    pub transition_secs: f64,
    /// Easing applied to transition progress.
    pub ease: Ease,
    /// Cell size used to position diff entities.
    pub metrics: GlyphMetrics,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            skip_delays: false,
            transition_secs: DEFAULT_TRANSITION_SECS,
            ease: Ease::default(),
            metrics: GlyphMetrics::default(),
        }
    }
}

impl PlaybackOptions {
    /// Unpaced options for export.
    pub fn instant() -> Self {
        Self {
            skip_delays: true,
            ..Self::default()
        }
    }
}

enum State {
    Hold { slide: usize, remaining: u64 },
    Transition { slide: usize, frames: TransitionFrames },
    Done,
}

/// Single-pass playback timeline.
///
/// Yields `Σ ceil(duration·fps)` hold frames and `ceil(transition_secs·fps)` transition frames
/// per adjacent pair. The terminal `progress = 1` frame of each transition is not yielded since
/// it matches the next slide's first hold frame. Restart by calling [`play`] again.
pub struct Playback<'a> {
    slides: Vec<Arc<AnimationSlide>>,
    fps: u32,
    opts: PlaybackOptions,
    clock: Box<dyn Clock + 'a>,
    on_progress: Option<Box<dyn FnMut(FrameProgress) + 'a>>,
    state: State,
    current: u64,
    total: u64,
}

/// Start a playback of `slides`.
///
/// Fails with [`MorphError::InsufficientSlides`] for fewer than two slides, before any work, and
/// with [`MorphError::Validation`] when the timeline has more than `u64::MAX` frames.
pub fn play<'a>(
    slides: &[AnimationSlide],
    settings: &AnimationSettings,
    opts: PlaybackOptions,
) -> MorphResult<Playback<'a>> {
    if slides.len() < 2 {
        return Err(MorphError::insufficient_slides(slides.len()));
    }
    settings.validate()?;
    if !opts.transition_secs.is_finite() || opts.transition_secs < 0.0 {
        return Err(MorphError::validation(
            "transition duration must be finite and >= 0",
        ));
    }
    for slide in slides {
        slide.validate()?;
    }

    let slides: Vec<_> = slides.iter().cloned().map(Arc::new).collect();
    let total = total_frame_count(&slides, settings.fps, opts.transition_secs)
        .ok_or_else(|| MorphError::validation("timeline too long: frame count overflows u64"))?;
    let first_hold = slides[0].hold_frames(settings.fps);
    tracing::debug!(
        slides = slides.len(),
        fps = settings.fps,
        total,
        skip_delays = opts.skip_delays,
        "playback started"
    );

    Ok(Playback {
        slides,
        fps: settings.fps,
        opts,
        clock: Box::new(SystemClock),
        on_progress: None,
        state: State::Hold {
            slide: 0,
            remaining: first_hold,
        },
        current: 0,
        total,
    })
}

impl<'a> Playback<'a> {
    /// Install a progress callback invoked once per yielded frame.
    pub fn with_progress(mut self, f: impl FnMut(FrameProgress) + 'a) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Replace the pacing clock used when delays are not skipped.
    pub fn with_clock(mut self, clock: impl Clock + 'a) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Precomputed number of frames this playback yields.
    pub fn total_frames(&self) -> u64 {
        self.total
    }

    /// Frames yielded so far.
    pub fn current_frame(&self) -> u64 {
        self.current
    }

    /// Frames per second of the timeline.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Return `true` once the timeline is exhausted or aborted.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Hand every frame to `consumer` in order.
    ///
    /// The first error, from the timeline or the consumer, aborts the playback and is returned.
    /// Returns the number of frames consumed.
    pub fn drive(
        mut self,
        mut consumer: impl FnMut(FrameIndex, &AnimationFrame) -> MorphResult<()>,
    ) -> MorphResult<u64> {
        let mut n = 0u64;
        while let Some(frame) = self.next() {
            let frame = frame?;
            if let Err(err) = consumer(FrameIndex(n), &frame) {
                self.state = State::Done;
                tracing::warn!(frame = n, error = %err, "playback aborted by consumer");
                return Err(err);
            }
            n += 1;
        }
        Ok(n)
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.fps))
    }

    fn emit(&mut self, frame: AnimationFrame) -> Option<MorphResult<AnimationFrame>> {
        // Single pacing gate shared by preview and export.
        if !self.opts.skip_delays && self.current > 0 {
            let d = self.frame_interval();
            self.clock.sleep(d);
        }
        self.current += 1;
        let progress = FrameProgress {
            current: self.current,
            total: self.total,
        };
        if let Some(cb) = self.on_progress.as_mut() {
            cb(progress);
        }
        Some(Ok(frame))
    }

    fn start_transition(&self, slide: usize) -> MorphResult<TransitionFrames> {
        let frames = generate_transition(
            Arc::clone(&self.slides[slide]),
            Arc::clone(&self.slides[slide + 1]),
            self.opts.transition_secs * 1000.0,
            self.fps,
            self.opts.metrics,
        )?;
        Ok(frames.with_ease(self.opts.ease))
    }
}

impl Iterator for Playback<'_> {
    type Item = MorphResult<AnimationFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                State::Hold { slide, remaining } if *remaining > 0 => {
                    *remaining -= 1;
                    let slide_index = *slide;
                    let frame = AnimationFrame::Slide {
                        slide_index,
                        slide: Arc::clone(&self.slides[slide_index]),
                    };
                    return self.emit(frame);
                }
                State::Hold { slide, .. } => {
                    let slide = *slide;
                    if slide + 1 >= self.slides.len() {
                        self.state = State::Done;
                        continue;
                    }
                    match self.start_transition(slide) {
                        Ok(frames) => self.state = State::Transition { slide, frames },
                        Err(err) => {
                            self.state = State::Done;
                            return Some(Err(err));
                        }
                    }
                }
                State::Transition { slide, frames } => {
                    let slide_index = *slide;
                    let segments = frames.segments();
                    match frames.next() {
                        Some(frame) if frame.index < segments => {
                            return self.emit(AnimationFrame::Transition { slide_index, frame });
                        }
                        _ => {
                            let next = slide_index + 1;
                            self.state = State::Hold {
                                slide: next,
                                remaining: self.slides[next].hold_frames(self.fps),
                            };
                        }
                    }
                }
                State::Done => {
                    if self.current != self.total {
                        tracing::warn!(
                            yielded = self.current,
                            expected = self.total,
                            "playback frame count mismatch"
                        );
                    }
                    return None;
                }
            }
        }
    }
}

/// Total frames of a playback: hold frames plus `n - 1` transitions.
///
/// `None` when the count overflows a `u64`.
pub fn total_frame_count<S: std::borrow::Borrow<AnimationSlide>>(
    slides: &[S],
    fps: u32,
    transition_secs: f64,
) -> Option<u64> {
    use std::borrow::Borrow as _;

    let pairs = u64::try_from(slides.len().saturating_sub(1)).ok()?;
    let transitions = pairs.checked_mul(checked_frames_for_secs(transition_secs, fps)?)?;
    slides.iter().try_fold(transitions, |acc, s| {
        acc.checked_add(checked_frames_for_secs(s.borrow().duration, fps)?)
    })
}

/// Total wall-clock duration in seconds, optionally including the fixed transitions.
pub fn calculate_total_duration(slides: &[AnimationSlide], include_transitions: bool) -> f64 {
    let holds: f64 = slides.iter().map(|s| s.duration).sum();
    if include_transitions {
        holds + slides.len().saturating_sub(1) as f64 * DEFAULT_TRANSITION_SECS
    } else {
        holds
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/orchestrator.rs"]
mod tests;
