//! Ramped parameter values for click-free parameter changes.
//!
//! A [`ParameterRamper`] sits on the render side of an engine, one per parameter.
//! Pending-initialization writes land with [`set_immediate`](ParameterRamper::set_immediate);
//! observer writes start a linear ramp whose length comes from the engine's ramp time.
//!
//! # Example
//!
//! ```
//! use pwmbank_core::ParameterRamper;
//!
//! let mut width = ParameterRamper::new(0.5);
//!
//! // 4 samples to reach the new target
//! width.start_ramp(0.9, 4);
//!
//! // Once per render block
//! let value = width.get_and_step(2);
//! assert!(value > 0.5 && value < 0.9);
//! ```

/// Linearly ramped parameter value.
#[derive(Debug, Clone)]
pub struct ParameterRamper {
    current: f32,
    target: f32,
    step: f32,
    samples_remaining: u32,
}

impl ParameterRamper {
    pub fn new(initial: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            samples_remaining: 0,
        }
    }

    /// Jump to `value`, cancelling any ramp in flight.
    #[inline]
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.samples_remaining = 0;
    }

    /// Ramp from the current value to `target` over `duration_samples`.
    ///
    /// A zero duration jumps immediately. Retargeting mid-ramp starts from
    /// wherever the ramp currently is.
    #[inline]
    pub fn start_ramp(&mut self, target: f32, duration_samples: u32) {
        if duration_samples == 0 {
            self.set_immediate(target);
            return;
        }

        self.target = target;
        self.samples_remaining = duration_samples;
        self.step = (self.target - self.current) / duration_samples as f32;
    }

    /// Advance by `samples` and return the value reached.
    #[inline]
    pub fn get_and_step(&mut self, samples: u32) -> f32 {
        if self.samples_remaining > 0 {
            let advance = samples.min(self.samples_remaining);
            self.current += self.step * advance as f32;
            self.samples_remaining -= advance;

            // Snap to target when done to avoid floating point drift
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }

        self.current
    }

    /// Call once per sample.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        self.get_and_step(1)
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_ramping(&self) -> bool {
        self.samples_remaining > 0
    }

    #[inline]
    pub fn samples_remaining(&self) -> u32 {
        self.samples_remaining
    }

    #[inline]
    pub fn skip_to_target(&mut self) {
        self.set_immediate(self.target);
    }
}

impl Default for ParameterRamper {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Ramp length in samples for a ramp time in seconds.
#[inline]
pub fn ramp_samples(ramp_time_secs: f64, sample_rate: f64) -> u32 {
    if !ramp_time_secs.is_finite() || ramp_time_secs <= 0.0 {
        return 0;
    }
    (ramp_time_secs * sample_rate).round().min(u32::MAX as f64) as u32
}
