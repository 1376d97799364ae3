use crate::animation::ease::Ease;
use crate::diff::token::{TokenDiff, diff_tokens};
use crate::foundation::core::GlyphMetrics;
use crate::foundation::error::{MorphError, MorphResult};
use crate::model::slide::{AnimationSlide, frames_for_secs};
use std::sync::Arc;

/// One frame of a slide-to-slide morph.
///
/// Every frame of a transition shares the same [`TokenDiff`].
#[derive(Clone, Debug)]
pub struct TransitionFrame {
    /// Source slide.
    pub from_slide: Arc<AnimationSlide>,
    /// Destination slide.
    pub to_slide: Arc<AnimationSlide>,
    /// 0-based index within the transition.
    pub index: u64,
    /// Un-eased progress `index / segments`.
    pub linear: f64,
    /// Eased progress in `[0, 1]`.
    pub progress: f64,
    /// Opacity of added entities (`progress`).
    pub added_opacity: f64,
    /// Opacity of removed entities (`1 - progress`).
    pub removed_opacity: f64,
    /// Shared diff of the two slides.
    pub diff: Arc<TokenDiff>,
}

/// Lazy, ordered transition frames: `segments + 1` frames from progress 0 to 1 inclusive.
#[derive(Clone, Debug)]
pub struct TransitionFrames {
    from: Arc<AnimationSlide>,
    to: Arc<AnimationSlide>,
    diff: Arc<TokenDiff>,
    ease: Ease,
    segments: u64,
    next: u64,
}

impl TransitionFrames {
    /// Replace the easing curve (defaults to [`Ease::InOutCubic`]).
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// The diff shared by all frames.
    pub fn diff(&self) -> &Arc<TokenDiff> {
        &self.diff
    }

    /// `ceil(duration_secs * fps)`; the sequence yields one more frame than this.
    pub fn segments(&self) -> u64 {
        self.segments
    }

    fn frame_at(&self, index: u64) -> TransitionFrame {
        let linear = if self.segments == 0 {
            1.0
        } else {
            index as f64 / self.segments as f64
        };
        let progress = self.ease.apply(linear);
        TransitionFrame {
            from_slide: Arc::clone(&self.from),
            to_slide: Arc::clone(&self.to),
            index,
            linear,
            progress,
            added_opacity: progress,
            removed_opacity: 1.0 - progress,
            diff: Arc::clone(&self.diff),
        }
    }
}

impl Iterator for TransitionFrames {
    type Item = TransitionFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.segments {
            return None;
        }
        let frame = self.frame_at(self.next);
        self.next += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.segments + 1).saturating_sub(self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for TransitionFrames {}

/// Build the transition between two slides.
///
/// The diff is computed once here. Yields `ceil(duration_ms / 1000 * fps) + 1` frames.
pub fn generate_transition(
    from: Arc<AnimationSlide>,
    to: Arc<AnimationSlide>,
    duration_ms: f64,
    fps: u32,
    metrics: GlyphMetrics,
) -> MorphResult<TransitionFrames> {
    if fps == 0 {
        return Err(MorphError::validation("transition fps must be > 0"));
    }
    if !duration_ms.is_finite() || duration_ms < 0.0 {
        return Err(MorphError::validation(
            "transition duration must be finite and >= 0",
        ));
    }
    let segments = frames_for_secs(duration_ms / 1000.0, fps);
    let diff = Arc::new(diff_tokens(&from.code, &to.code, metrics));
    tracing::debug!(
        from = %from.id,
        to = %to.id,
        segments,
        entities = diff.entities.len(),
        "transition prepared"
    );
    Ok(TransitionFrames {
        from,
        to,
        diff,
        ease: Ease::default(),
        segments,
        next: 0,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/animation/transition.rs"]
mod tests;
