//! Parameter smoothing for the audio thread.
//!
//! Control values arrive once per block; applying them as a step produces
//! clicks. [`LinearRamp`] walks to each new target in equal steps, so
//! consecutive samples never differ by more than one step.

/// Linear ramp toward a target over a fixed number of samples.
#[derive(Debug, Clone)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    step: f32,
    remaining: usize,
    ramp_samples: usize,
}

impl LinearRamp {
    pub fn new(initial: f32, ramp_samples: usize) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            remaining: 0,
            ramp_samples,
        }
    }

    /// Start a new ramp from the current value. A zero ramp length snaps.
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        if self.ramp_samples == 0 {
            self.current = target;
            self.remaining = 0;
            return;
        }
        self.step = (target - self.current) / self.ramp_samples as f32;
        self.remaining = self.ramp_samples;
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_ramping(&self) -> bool {
        self.remaining > 0
    }

    /// Jump straight to `value`.
    pub fn reset(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.remaining = 0;
    }
}
