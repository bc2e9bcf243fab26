/// Fixed-period ticker fed with frame deltas.
#[derive(Debug, Clone, Copy)]
pub struct Interval {
    period: f32,
    elapsed: f32,
}

impl Interval {
    pub fn new(period_secs: f32) -> Self {
        Self {
            period: period_secs.max(f32::EPSILON),
            elapsed: 0.0,
        }
    }

    /// True once the accumulated time crosses a period. Long frames fire
    /// once, not once per missed period.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt.max(0.0);
        if self.elapsed < self.period {
            return false;
        }
        self.elapsed -= self.period;
        if self.elapsed >= self.period {
            self.elapsed = 0.0;
        }
        true
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}
