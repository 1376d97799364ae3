use crate::model::slide::{AnimationSlide, TransitionType};
use crate::playback::orchestrator::AnimationFrame;
use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x5c0d_e40f_a11d_e5a1;

/// Stable fingerprint of what a frame shows.
///
/// The frame index and slide index are not hashed, so consecutive hold frames of one slide
/// share a fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameFingerprint {
    /// High 64 bits.
    pub hi: u64,
    /// Low 64 bits.
    pub lo: u64,
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_u8(&mut self, v: u8) {
        self.inner.update(&[v]);
    }

    fn write_u64(&mut self, v: u64) {
        self.inner.update(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.inner.update(s.as_bytes());
    }

    fn finish(self) -> FrameFingerprint {
        let v = self.inner.digest128();
        FrameFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

fn write_slide(h: &mut StableHasher, slide: &AnimationSlide) {
    h.write_str(&slide.language);
    h.write_str(&slide.title);
    h.write_str(&slide.code);
}

/// Fingerprint `frame` as drawn with `transition_type`.
pub fn fingerprint_frame(frame: &AnimationFrame, transition_type: TransitionType) -> FrameFingerprint {
    let mut h = StableHasher::new();
    match frame {
        AnimationFrame::Slide { slide, .. } => {
            h.write_u8(0);
            write_slide(&mut h, slide);
        }
        AnimationFrame::Transition { frame, .. } => {
            h.write_u8(1);
            h.write_u8(match transition_type {
                TransitionType::Diff => 0,
                TransitionType::Fade => 1,
            });
            write_slide(&mut h, &frame.from_slide);
            write_slide(&mut h, &frame.to_slide);
            h.write_f64(frame.progress);
            h.write_f64(frame.added_opacity);
            h.write_f64(frame.removed_opacity);
        }
    }
    h.finish()
}

#[cfg(test)]
#[path = "../../tests/unit/export/fingerprint.rs"]
mod tests;
