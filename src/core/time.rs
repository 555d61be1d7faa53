//! Fixed-step time source

/// Converts variable frame times into a whole number of fixed simulation ticks
#[derive(Debug, Clone)]
pub struct Time {
    fixed_delta: f32,
    accumulator: f32,
    elapsed: f64,
    ticks: u64,
    max_steps_per_frame: u32,
}

impl Time {
    /// Default tick length (60 Hz)
    pub const DEFAULT_FIXED_DELTA: f32 = 1.0 / 60.0;

    /// Create a time source with the given tick length in seconds
    ///
    /// Non-positive or non-finite lengths fall back to the 60 Hz default.
    pub fn new(fixed_delta: f32) -> Self {
        let fixed_delta = if fixed_delta.is_finite() && fixed_delta > 0.0 {
            fixed_delta
        } else {
            Self::DEFAULT_FIXED_DELTA
        };
        Self {
            fixed_delta,
            accumulator: 0.0,
            elapsed: 0.0,
            ticks: 0,
            max_steps_per_frame: 8,
        }
    }

    /// Cap the number of ticks a single frame may produce
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps_per_frame = max_steps.max(1);
        self
    }

    /// Feed one frame's wall time, returning how many ticks to run
    ///
    /// Negative frame times count as zero. Time beyond the per-frame cap is
    /// dropped so a long stall does not cause a burst of catch-up ticks.
    pub fn advance(&mut self, frame_delta: f32) -> u32 {
        if frame_delta.is_finite() && frame_delta > 0.0 {
            self.accumulator += frame_delta;
        }

        let mut steps = 0;
        while self.accumulator >= self.fixed_delta && steps < self.max_steps_per_frame {
            self.accumulator -= self.fixed_delta;
            steps += 1;
        }
        if steps == self.max_steps_per_frame && self.accumulator >= self.fixed_delta {
            log::warn!(
                "dropping {:.3}s of simulation time after {} ticks",
                self.accumulator,
                steps
            );
            self.accumulator = 0.0;
        }

        self.ticks += u64::from(steps);
        self.elapsed += f64::from(self.fixed_delta) * f64::from(steps);
        steps
    }

    /// Tick length in seconds
    pub fn fixed_delta(&self) -> f32 {
        self.fixed_delta
    }

    /// Simulated seconds so far
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed
    }

    /// Ticks produced so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Fraction of a tick waiting in the accumulator, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.fixed_delta
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FIXED_DELTA)
    }
}
