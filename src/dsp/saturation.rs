//! Saturation / Waveshaping
//!
//! Feedback loops need a limiter that cannot itself add harsh energy. A
//! waveshaper applies a smooth transfer function to each sample:
//!   output = headroom * f(input / headroom)
//!
//! # Soft Clip (rational tanh)
//!
//!   f(x) = x * (27 + x²) / (27 + 9x²)      for |x| < 3
//!   f(x) = ±1                              beyond
//!
//!   - Slope 1.0 at the origin, so quiet signals pass untouched and the loop
//!     gain of a decaying tail is unchanged
//!   - Reaches ±1 with zero slope at ±3, so the curve is continuous
//!   - No transcendental functions in the per-sample path
//!
//! Hard clipping at the same point would add broadband harmonics, and inside a
//! resonant loop those recirculate as audible flutter.
//!
//! # Headroom ("drive")
//!
//! Different loop characters tolerate different amounts of saturation:
//!
//!   2.0  = loops peak near ±2 before compressing (delay repeats)
//!   1.4  = tighter, more colored tanks
//!   1.0  = plain unit soft clip
//!
//! # Lo-fi
//!
//! Bit crushing and sample-and-hold degrade repeats on purpose. They stay
//! bounded by their input, so they are safe inside a guarded loop.

/// Input magnitude at which [`soft_clip`] reaches ±1.
pub const SOFT_CLIP_KNEE: f32 = 3.0;

/// Rational tanh approximation, exactly ±1 for `|x| >= 3`.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    if x >= SOFT_CLIP_KNEE {
        1.0
    } else if x <= -SOFT_CLIP_KNEE {
        -1.0
    } else {
        let x2 = x * x;
        // Rounding near the knee can land a hair past unity
        (x * (27.0 + x2) / (27.0 + 9.0 * x2)).clamp(-1.0, 1.0)
    }
}

/// Soft clip scaled to a per-loop headroom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Saturator {
    headroom: f32,
    inv_headroom: f32,
}

impl Saturator {
    pub fn new(headroom: f32) -> Self {
        let headroom = headroom.clamp(0.1, 2.0);
        Self {
            headroom,
            inv_headroom: 1.0 / headroom,
        }
    }

    pub fn headroom(&self) -> f32 {
        self.headroom
    }

    #[inline]
    pub fn process(&self, sample: f32) -> f32 {
        soft_clip(sample * self.inv_headroom) * self.headroom
    }
}

impl Default for Saturator {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Quantize to `bits` of resolution over `[-1, 1]`.
#[inline]
pub fn bit_crush(sample: f32, bits: f32) -> f32 {
    let steps = (bits.clamp(1.0, 24.0) - 1.0).exp2();
    (sample * steps).round() / steps
}

/// Holds a sample for a fractional number of input samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleHold {
    held: f32,
    counter: f32,
}

impl SampleHold {
    pub fn new() -> Self {
        Self::default()
    }

    /// `hold` is the number of input samples each output value lasts (>= 1).
    #[inline]
    pub fn process(&mut self, sample: f32, hold: f32) -> f32 {
        self.counter += 1.0;
        if self.counter >= hold.max(1.0) {
            self.counter = 0.0;
            self.held = sample;
        }
        self.held
    }

    pub fn reset(&mut self) {
        self.held = 0.0;
        self.counter = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_clip_is_bounded() {
        for i in -1000..=1000 {
            let x = i as f32 * 0.01;
            let y = soft_clip(x);
            assert!(y.abs() <= 1.0, "soft_clip({}) = {} out of range", x, y);
        }
    }

    #[test]
    fn test_soft_clip_never_passes_unity_near_knee() {
        let mut x = SOFT_CLIP_KNEE - 0.05;
        while x < SOFT_CLIP_KNEE {
            assert!(soft_clip(x) <= 1.0, "soft_clip({}) = {}", x, soft_clip(x));
            assert!(soft_clip(-x) >= -1.0, "soft_clip({}) = {}", -x, soft_clip(-x));
            x += 1e-5;
        }
        assert!(Saturator::new(2.0).process(-5.98).abs() <= 2.0);
    }

    #[test]
    fn test_soft_clip_is_continuous_at_knee() {
        let inside = soft_clip(SOFT_CLIP_KNEE - 1e-4);
        assert!((inside - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_soft_clip_small_signal_is_linear() {
        for &x in &[0.001f32, -0.01, 0.05] {
            assert!((soft_clip(x) - x).abs() < x.abs() * 0.01);
        }
    }

    #[test]
    fn test_soft_clip_never_amplifies() {
        for i in 1..300 {
            let x = i as f32 * 0.01;
            assert!(soft_clip(x) <= x);
        }
    }

    #[test]
    fn test_saturator_headroom() {
        let sat = Saturator::new(2.0);
        assert_eq!(sat.process(100.0), 2.0);
        assert_eq!(sat.process(-100.0), -2.0);
        assert!((sat.process(0.01) - 0.01).abs() < 1e-4);
    }

    #[test]
    fn test_bit_crush_reduces_resolution() {
        let crushed = bit_crush(0.3, 2.0);
        assert_eq!(crushed, 0.5);
        assert_eq!(bit_crush(0.0, 4.0), 0.0);
    }

    #[test]
    fn test_sample_hold_repeats_values() {
        let mut hold = SampleHold::new();
        let out: Vec<f32> = (1..=6).map(|i| hold.process(i as f32, 2.0)).collect();
        assert_eq!(out, [0.0, 2.0, 2.0, 4.0, 4.0, 6.0]);
    }
}
