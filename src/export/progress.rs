/// Monotonic export progress in `[0, 1]`.
///
/// Capture progress is `min(done / total, cap)`; finalize progress maps the encoder's own
/// `[0, 1]` onto `[cap, 1]`. Values that would not increase progress are dropped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressReporter {
    cap: f64,
    last: Option<f64>,
}

impl ProgressReporter {
    /// Reporter whose capture phase stops at `cap`.
    pub fn new(cap: f64) -> Self {
        Self {
            cap: cap.clamp(0.0, 1.0),
            last: None,
        }
    }

    /// Capture-phase cap.
    pub fn cap(&self) -> f64 {
        self.cap
    }

    /// Last reported value.
    pub fn last(&self) -> Option<f64> {
        self.last
    }

    /// Progress after `done` of `total` frames were captured.
    pub fn capture(&mut self, done: u64, total: u64) -> Option<f64> {
        let fraction = if total == 0 {
            1.0
        } else {
            done as f64 / total as f64
        };
        self.advance(fraction.min(self.cap))
    }

    /// Progress for the encoder's internal finalize progress `internal` in `[0, 1]`.
    pub fn finalize(&mut self, internal: f64) -> Option<f64> {
        let internal = if internal.is_finite() {
            internal.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if internal >= 1.0 {
            return self.advance(1.0);
        }
        self.advance(self.cap + (1.0 - self.cap) * internal)
    }

    fn advance(&mut self, value: f64) -> Option<f64> {
        if self.last.is_some_and(|last| value <= last) {
            return None;
        }
        self.last = Some(value);
        Some(value)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/progress.rs"]
mod tests;
