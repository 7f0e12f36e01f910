//! Stability guard for feedback networks.

/*
Keeping Feedback Loops Finite
=============================

A delay line that feeds back into itself is an IIR filter with a very long
impulse response. Any loop gain at or above 1.0 grows without bound, and
floating-point rounding means "just under 1.0" is not safe either. Every
point where a signal re-enters a loop goes through the same guards:

  gain clamp      Feedback never reaches 1.0. The ceiling is a hand-tuned
                  0.93 and drops further as the nominal decay grows.

  soft clip       The pre-write signal is saturated (see `saturation`) so a
                  single transient cannot start exponential runaway.

  adaptive damp   Damping rises with feedback. High feedback with a bright
                  loop is the recipe for a whistle at the line's resonance.

  denormal flush  Filter states below 1e-15 are forced to exactly zero.
                  Near-silent loops otherwise drift into subnormals and the
                  CPU cost explodes.

  finite guard    NaN and infinity are replaced by silence before being
                  written or output. One NaN in a loop would persist forever.

  bound           Buffers never hold more than +/-2.0. The final output is
                  clamped to +/-1.0.
*/

/// Magnitude below which filter state is flushed to exactly zero.
pub const DENORMAL_THRESHOLD: f32 = 1e-15;

/// Largest value ever written into a delay buffer.
pub const INTERNAL_LIMIT: f32 = 2.0;

/// Largest value handed back to the host.
pub const OUTPUT_LIMIT: f32 = 1.0;

/// Absolute feedback ceiling for any loop.
pub const FEEDBACK_CEILING: f32 = 0.93;

#[inline]
pub fn flush_denormal(value: f32) -> f32 {
    if value.abs() < DENORMAL_THRESHOLD {
        0.0
    } else {
        value
    }
}

/// Replace NaN and infinities with silence.
#[inline]
pub fn sanitize(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Finite guard plus the internal +/-2.0 bound, for anything about to be
/// written into a delay buffer.
#[inline]
pub fn bound(value: f32) -> f32 {
    sanitize(value).clamp(-INTERNAL_LIMIT, INTERNAL_LIMIT)
}

/// Finite guard plus the +/-1.0 output bound.
#[inline]
pub fn limit_output(value: f32) -> f32 {
    sanitize(value).clamp(-OUTPUT_LIMIT, OUTPUT_LIMIT)
}

/// Sub-unity feedback ceiling that tightens as nominal decay grows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackCeiling {
    /// Ceiling at the shortest decay.
    pub base: f32,
    /// How much the ceiling drops at the longest decay.
    pub tighten: f32,
}

impl Default for FeedbackCeiling {
    fn default() -> Self {
        Self {
            base: FEEDBACK_CEILING,
            tighten: 0.03,
        }
    }
}

impl FeedbackCeiling {
    /// Ceiling for a loop whose nominal length is `length` in `0.0..=1.0` of
    /// its range.
    #[inline]
    pub fn ceiling(&self, length: f32) -> f32 {
        let length = sanitize(length).clamp(0.0, 1.0);
        (self.base - self.tighten * length).min(FEEDBACK_CEILING)
    }

    /// Clamp a requested feedback gain to `[0, ceiling(length)]`.
    #[inline]
    pub fn clamp(&self, feedback: f32, length: f32) -> f32 {
        sanitize(feedback).clamp(0.0, self.ceiling(length))
    }
}

/// Couples damping to feedback: `damping + feedback * coupling`, clamped to
/// `[min, max]`. Both damping and the result are "how dark" in `0..1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveDamping {
    pub coupling: f32,
    pub min: f32,
    pub max: f32,
}

impl Default for AdaptiveDamping {
    fn default() -> Self {
        Self {
            coupling: 0.15,
            min: 0.3,
            max: 0.85,
        }
    }
}

impl AdaptiveDamping {
    #[inline]
    pub fn apply(&self, damping: f32, feedback: f32) -> f32 {
        let damping = sanitize(damping) + sanitize(feedback).max(0.0) * self.coupling;
        damping.clamp(self.min, self.max)
    }
}
