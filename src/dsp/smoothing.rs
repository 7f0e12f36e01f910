//! Parameter smoothing.
//!
//! `SmoothedParam` glides toward a target with a one-pole response so that
//! knob moves and tempo changes never step a delay read position. A moved read
//! position sweeps through buffered audio as a short pitch bend instead of a
//! click, and the audio already in the line is never touched.
//!
//! `LinearRamp` moves at a constant rate and reports when it arrives. Engines
//! use it to fade a network out and back in around a topology change.

use super::guard::sanitize;

/// Relative distance from the target at which a glide snaps onto it.
const SETTLE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
}

impl SmoothedParam {
    /// `ramp_ms` is the time to cover roughly 63% of a step.
    pub fn new(initial: f32, ramp_ms: f32, sample_rate: f32) -> Self {
        let samples = (ramp_ms * 0.001 * sample_rate).max(1.0);
        Self {
            current: initial,
            target: initial,
            coeff: (-1.0 / samples).exp(),
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = sanitize(target);
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        let next = self.target + (self.current - self.target) * self.coeff;
        // Close to the target a step can round back onto the same float
        let settled = (next - self.target).abs() <= SETTLE_EPSILON * self.target.abs().max(1.0);
        self.current = if settled || next == self.current { self.target } else { next };
        self.current
    }

    pub fn is_smoothing(&self) -> bool {
        self.current != self.target
    }

    pub fn reset(&mut self) {
        self.current = self.target;
    }
}

/// Constant-rate ramp between 0.0 and 1.0.
#[derive(Debug, Clone, Copy)]
pub struct LinearRamp {
    value: f32,
    target: f32,
    step: f32,
}

impl LinearRamp {
    /// `duration_ms` is the time for a full 0 → 1 sweep.
    pub fn new(initial: f32, duration_ms: f32, sample_rate: f32) -> Self {
        let samples = (duration_ms * 0.001 * sample_rate).max(1.0);
        let initial = initial.clamp(0.0, 1.0);
        Self {
            value: initial,
            target: initial,
            step: 1.0 / samples,
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target.clamp(0.0, 1.0);
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn arrived(&self) -> bool {
        self.value == self.target
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.value < self.target {
            self.value = (self.value + self.step).min(self.target);
        } else if self.value > self.target {
            self.value = (self.value - self.step).max(self.target);
        }
        self.value
    }

    pub fn reset(&mut self, value: f32) {
        let value = value.clamp(0.0, 1.0);
        self.value = value;
        self.target = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothed_param_converges() {
        let mut param = SmoothedParam::new(0.0, 10.0, 48_000.0);
        param.set_target(1.0);
        assert!(param.is_smoothing());
        let first = param.next();
        assert!(first > 0.0 && first < 0.01, "first step should be small, got {}", first);
        for _ in 0..48_000 {
            param.next();
        }
        assert_eq!(param.current(), 1.0);
        assert!(!param.is_smoothing());
    }

    #[test]
    fn test_slow_glide_reaches_large_targets() {
        // Delay times in samples glide over 100 ms
        let mut param = SmoothedParam::new(480.0, 100.0, 48_000.0);
        param.set_target(144_000.0);
        let mut steps = 0;
        while param.is_smoothing() {
            param.next();
            steps += 1;
            assert!(steps < 200_000, "stalled at {}", param.current());
        }
        assert_eq!(param.current(), 144_000.0);
    }

    #[test]
    fn test_smoothed_param_is_monotonic() {
        let mut param = SmoothedParam::new(100.0, 5.0, 48_000.0);
        param.set_target(50.0);
        let mut previous = param.current();
        for _ in 0..2000 {
            let next = param.next();
            assert!(next <= previous);
            previous = next;
        }
    }

    #[test]
    fn test_smoothed_param_rejects_nan() {
        let mut param = SmoothedParam::new(1.0, 5.0, 48_000.0);
        param.set_target(f32::NAN);
        assert_eq!(param.target(), 0.0);
    }

    #[test]
    fn test_linear_ramp_duration() {
        let mut ramp = LinearRamp::new(1.0, 10.0, 48_000.0);
        ramp.set_target(0.0);
        let mut steps = 0;
        while !ramp.arrived() {
            ramp.next();
            steps += 1;
        }
        assert!((479..=481).contains(&steps), "10ms at 48kHz should take ~480 steps, took {}", steps);
        assert_eq!(ramp.value(), 0.0);
    }

    #[test]
    fn test_linear_ramp_holds_at_target() {
        let mut ramp = LinearRamp::new(0.5, 1.0, 1000.0);
        assert!(ramp.arrived());
        assert_eq!(ramp.next(), 0.5);
    }
}
