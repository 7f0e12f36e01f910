//! Single-sideband frequency shifting.
//!
//! A frequency shifter moves every partial by the same number of Hz, unlike a
//! pitch shifter which multiplies. Harmonic sounds turn inharmonic, and inside
//! a delay loop each repeat climbs (or falls) further: the classic
//! "barber-pole" dub echo.
//!
//! ```text
//!            ┌─[allpass chain A]─[z⁻¹]─ I ─┐
//!   x ───────┤                             ├── I·cos(φ) ∓ Q·sin(φ) ──→ y
//!            └─[allpass chain B]──────── Q ─┘
//! ```
//!
//! The two allpass chains keep a 90° phase difference across most of the
//! audio band (an IIR Hilbert transformer), giving the analytic pair (I, Q).
//! Multiplying by a quadrature oscillator and summing cancels one sideband:
//! `+` shifts up, `-` shifts down.

use std::f32::consts::TAU;

use super::guard::flush_denormal;

/// Allpass coefficients (a, applied as a²) for the in-phase chain.
const CHAIN_A: [f32; 4] = [0.692_387_8, 0.936_065_4, 0.988_229_5, 0.998_748_8];
/// Allpass coefficients for the quadrature chain.
const CHAIN_B: [f32; 4] = [0.402_192_1, 0.856_171_1, 0.972_290_9, 0.995_288_5];

pub const MAX_SHIFT_HZ: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftDirection {
    Off,
    #[default]
    Up,
    Down,
}

impl ShiftDirection {
    pub const NAMES: &'static [&'static str] = &["OFF", "UP", "DOWN"];

    pub fn from_index(index: i32) -> Self {
        match index {
            1 => ShiftDirection::Up,
            2 => ShiftDirection::Down,
            _ => ShiftDirection::Off,
        }
    }
}

/// Second-order allpass section `y = a²(x + y[n-2]) - x[n-2]`.
#[derive(Debug, Clone, Copy, Default)]
struct AllpassSection {
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl AllpassSection {
    fn new(a: f32) -> Self {
        Self {
            a2: a * a,
            ..Self::default()
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = flush_denormal(self.a2 * (input + self.y2) - self.x2);
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// IIR Hilbert transformer producing an (in-phase, quadrature) pair.
#[derive(Debug, Clone, Copy)]
pub struct Hilbert {
    chain_a: [AllpassSection; 4],
    chain_b: [AllpassSection; 4],
    a_delay: f32,
}

impl Default for Hilbert {
    fn default() -> Self {
        Self::new()
    }
}

impl Hilbert {
    pub fn new() -> Self {
        Self {
            chain_a: CHAIN_A.map(AllpassSection::new),
            chain_b: CHAIN_B.map(AllpassSection::new),
            a_delay: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> (f32, f32) {
        let a = self.chain_a.iter_mut().fold(input, |x, section| section.process(x));
        let q = self.chain_b.iter_mut().fold(input, |x, section| section.process(x));
        let i = self.a_delay;
        self.a_delay = a;
        (i, q)
    }

    pub fn reset(&mut self) {
        for section in self.chain_a.iter_mut().chain(self.chain_b.iter_mut()) {
            section.reset();
        }
        self.a_delay = 0.0;
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FrequencyShifter {
    hilbert: Hilbert,
    phase: f32,
    sample_rate: f32,
}

impl FrequencyShifter {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            hilbert: Hilbert::new(),
            phase: 0.0,
            sample_rate,
        }
    }

    /// Shift `input` by `shift_hz` in `direction`. `phase_offset` (cycles)
    /// rotates the oscillator, which lets two channels share a shift amount
    /// while staying decorrelated.
    #[inline]
    pub fn process(&mut self, input: f32, shift_hz: f32, direction: ShiftDirection, phase_offset: f32) -> f32 {
        let (i, q) = self.hilbert.process(input);

        let shift_hz = shift_hz.clamp(0.0, MAX_SHIFT_HZ);
        self.phase += shift_hz / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        let angle = TAU * (self.phase + phase_offset);
        let (sin, cos) = angle.sin_cos();
        match direction {
            ShiftDirection::Off => input,
            ShiftDirection::Up => i * cos + q * sin,
            ShiftDirection::Down => i * cos - q * sin,
        }
    }

    pub fn reset(&mut self) {
        self.hilbert.reset();
        self.phase = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::{num_complex::Complex, FftPlanner};

    const SR: usize = 16_384;

    /// Magnitude spectrum with 1 Hz bins over one second of `signal`.
    fn spectrum(signal: &[f32]) -> Vec<f32> {
        let mut buffer: Vec<Complex<f32>> = signal[..SR].iter().map(|&s| Complex::new(s, 0.0)).collect();
        FftPlanner::new().plan_fft_forward(SR).process(&mut buffer);
        buffer.iter().map(|c| c.norm() / SR as f32).collect()
    }

    fn shifted_tone(direction: ShiftDirection) -> Vec<f32> {
        let mut shifter = FrequencyShifter::new(SR as f32);
        (0..SR * 2)
            .map(|n| {
                let x = (TAU * 1000.0 * n as f32 / SR as f32).sin();
                shifter.process(x, 50.0, direction, 0.0)
            })
            .skip(SR)
            .collect()
    }

    #[test]
    fn test_hilbert_outputs_are_in_quadrature() {
        let mut hilbert = Hilbert::new();
        let mut min_env = f32::MAX;
        let mut max_env = 0.0f32;
        for n in 0..20_000 {
            let x = (TAU * 1000.0 * n as f32 / 48_000.0).sin();
            let (i, q) = hilbert.process(x);
            if n > 10_000 {
                let env = (i * i + q * q).sqrt();
                min_env = min_env.min(env);
                max_env = max_env.max(env);
            }
        }
        assert!(min_env > 0.98 && max_env < 1.02, "envelope {}..{}", min_env, max_env);
    }

    #[test]
    fn test_shift_up_moves_tone_up() {
        let mags = spectrum(&shifted_tone(ShiftDirection::Up));
        assert!(mags[1050] > 0.4, "upper sideband {}", mags[1050]);
        assert!(mags[950] < 0.02, "lower sideband should cancel, got {}", mags[950]);
    }

    #[test]
    fn test_shift_down_moves_tone_down() {
        let mags = spectrum(&shifted_tone(ShiftDirection::Down));
        assert!(mags[950] > 0.4, "lower sideband {}", mags[950]);
        assert!(mags[1050] < 0.02, "upper sideband should cancel, got {}", mags[1050]);
    }

    #[test]
    fn test_off_is_bypass() {
        let mut shifter = FrequencyShifter::new(48_000.0);
        assert_eq!(shifter.process(0.25, 40.0, ShiftDirection::Off, 0.0), 0.25);
    }

    #[test]
    fn test_direction_from_index() {
        assert_eq!(ShiftDirection::from_index(0), ShiftDirection::Off);
        assert_eq!(ShiftDirection::from_index(1), ShiftDirection::Up);
        assert_eq!(ShiftDirection::from_index(2), ShiftDirection::Down);
        assert_eq!(ShiftDirection::from_index(9), ShiftDirection::Off);
    }
}
