//! Low Frequency Oscillator for delay modulation.

/*
Modulating Delay Lines
======================

An LFO is an oscillator running at control rate (0.05 to 20 Hz here). In a
feedback network it nudges each line's read position back and forth:

    delay(t) = base + depth * sin(2π * (phase + offset))

A moving read position is a tiny pitch glide. In a reverb tank that smears
the fixed resonances every comb line would otherwise have, which is what
turns a metallic ring into a smooth tail. In a delay it gives tape-like
wobble.

Vocabulary
----------

  phase         Position inside one cycle, 0.0 to 1.0, wrapping.
                  phase += rate / sample_rate; if phase >= 1 { phase -= 1 }

  offset        A fixed phase added per line. Offsets are spread evenly
                across 0..1 (line i of n gets i / n) so lines move
                independently instead of in unison.

  reset phase   Where the accumulator restarts on reset. Not zero: every
                line starting at sin(0) makes an audible unison swell.


Rate Mapping
------------

Knob travel is mapped exponentially so equal turns feel like equal musical
steps:

    rate = 0.05 * 400^u        u = 0.0 → 0.05 Hz, 0.5 → 1 Hz, 1.0 → 20 Hz

    0.05 - 0.3 Hz   slow drift, large rooms
    0.3 - 2 Hz      classic chorused tails
    2 - 7 Hz        vibrato
    7 - 20 Hz       warble, approaching audio rate
*/

use std::f32::consts::TAU;

pub const MIN_RATE_HZ: f32 = 0.05;
pub const MAX_RATE_HZ: f32 = 20.0;

/// Phase every LFO restarts from.
pub const RESET_PHASE: f32 = 0.125;

/// Exponential knob mapping onto `[MIN_RATE_HZ, MAX_RATE_HZ]`.
#[inline]
pub fn rate_from_unit(unit: f32) -> f32 {
    let unit = unit.clamp(0.0, 1.0);
    MIN_RATE_HZ * (MAX_RATE_HZ / MIN_RATE_HZ).powf(unit)
}

/// Evenly spread phase offset for line `index` of `count`.
#[inline]
pub fn spread(index: usize, count: usize) -> f32 {
    if count == 0 {
        0.0
    } else {
        index as f32 / count as f32
    }
}

/// Sine phase accumulator shared by all lines of a network.
#[derive(Debug, Clone, Copy)]
pub struct Lfo {
    phase: f32,
    increment: f32,
    sample_rate: f32,
}

impl Lfo {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: RESET_PHASE,
            increment: MIN_RATE_HZ / sample_rate,
            sample_rate,
        }
    }

    /// Rate in Hz, clamped to `[MIN_RATE_HZ, MAX_RATE_HZ]`.
    pub fn set_rate(&mut self, rate_hz: f32) {
        let rate_hz = if rate_hz.is_finite() { rate_hz } else { MIN_RATE_HZ };
        self.increment = rate_hz.clamp(MIN_RATE_HZ, MAX_RATE_HZ) / self.sample_rate;
    }

    pub fn rate(&self) -> f32 {
        self.increment * self.sample_rate
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Move one sample forward.
    #[inline]
    pub fn advance(&mut self) {
        self.phase += self.increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
    }

    /// Bipolar sine at the current phase.
    #[inline]
    pub fn value(&self) -> f32 {
        (TAU * self.phase).sin()
    }

    /// Bipolar sine at the current phase plus a fixed `offset` in cycles.
    #[inline]
    pub fn value_at(&self, offset: f32) -> f32 {
        (TAU * (self.phase + offset)).sin()
    }

    pub fn reset(&mut self) {
        self.phase = RESET_PHASE;
    }
}
