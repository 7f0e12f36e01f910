//! One-pole damping and tone filters.

/*
One-Pole Filters in Feedback Loops
==================================

The cheapest useful filter is a single pole:

    y[n] = y[n-1] + g * (x[n] - y[n-1])

g is a "how much of the new sample gets through" coefficient:

    g = 0.95   almost transparent, only the very top is rounded off
    g = 0.50   noticeably dark
    g = 0.05   heavy lowpass, only the low end survives

Placed inside a delay loop, every trip around the loop passes the signal
through the filter once more, so highs decay faster than lows. That is how
real rooms behave (air and soft surfaces absorb treble first), and it is also
the main defense against whistling resonances.

g is kept inside [0.05, 0.95]:

    g = 0     the filter locks up and the loop goes silent
    g = 1     the filter is a wire and damping does nothing

The complementary highpass is just x - lowpass(x). A tilt control blends
between darkening (below center) and brightening (above center).

Every update flushes the state to exactly zero once it falls below 1e-15.
*/

use super::guard::flush_denormal;

/// Smallest one-pole coefficient.
pub const MIN_COEFFICIENT: f32 = 0.05;
/// Largest one-pole coefficient.
pub const MAX_COEFFICIENT: f32 = 0.95;

#[inline]
pub fn clamp_coefficient(g: f32) -> f32 {
    if g.is_finite() {
        g.clamp(MIN_COEFFICIENT, MAX_COEFFICIENT)
    } else {
        MAX_COEFFICIENT
    }
}

/// Map a damping amount (0 = bright, 1 = dark) to a lowpass coefficient.
#[inline]
pub fn damping_coefficient(damping: f32) -> f32 {
    clamp_coefficient(MAX_COEFFICIENT - damping * (MAX_COEFFICIENT - MIN_COEFFICIENT))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OnePole {
    state: f32,
}

impl OnePole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> f32 {
        self.state
    }

    #[inline]
    pub fn lowpass(&mut self, input: f32, g: f32) -> f32 {
        self.state = flush_denormal(self.state + g * (input - self.state));
        self.state
    }

    #[inline]
    pub fn highpass(&mut self, input: f32, g: f32) -> f32 {
        input - self.lowpass(input, g)
    }

    /// Tilt EQ. `tilt` of 0.5 is flat, 0.0 darkest, 1.0 brightest.
    #[inline]
    pub fn tilt(&mut self, input: f32, tilt: f32) -> f32 {
        let tilt = tilt.clamp(0.0, 1.0);
        if tilt < 0.5 {
            let g = clamp_coefficient(MIN_COEFFICIENT + tilt * 2.0 * (MAX_COEFFICIENT - MIN_COEFFICIENT));
            self.lowpass(input, g)
        } else {
            // Fixed low corner; the amount of high band added rises with tilt
            let low = self.lowpass(input, 0.2);
            input + (input - low) * (tilt - 0.5) * 2.0
        }
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}
