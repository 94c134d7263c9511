/// Per-frame delta from a caller-supplied clock.
///
/// The clock is passed in rather than read here so tests can script it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTimer {
    previous: Option<f64>,
    fresh: bool,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the baseline. The next [`tick`](Self::tick) yields 0 however far
    /// the clock has moved, and re-baselines there.
    pub fn start(&mut self, now: f64) {
        self.previous = Some(now);
        self.fresh = true;
    }

    /// Seconds since the previous tick. Never negative; a clock that steps
    /// backwards yields 0 and keeps the later baseline.
    pub fn tick(&mut self, now: f64) -> f32 {
        let previous = self.previous.unwrap_or(now);
        let delta = if std::mem::take(&mut self.fresh) {
            0.0
        } else {
            (now - previous).max(0.0)
        };
        self.previous = Some(previous.max(now));
        delta as f32
    }

    pub fn is_started(&self) -> bool {
        self.previous.is_some()
    }
}
