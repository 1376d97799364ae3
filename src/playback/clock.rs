use std::time::Duration;

/// Wall-clock pacing used by real-time playback.
pub trait Clock {
    /// Block the current thread for `d`.
    fn sleep(&mut self, d: Duration);
}

/// [`Clock`] backed by `std::thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&mut self, d: Duration) {
        if !d.is_zero() {
            std::thread::sleep(d);
        }
    }
}
