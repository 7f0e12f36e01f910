//! Feedback comb line: a delay line with damping in its feedback path.
//!
//! ```text
//! y[n] = x[n - d]
//! write: sat(x[n] + feedback * lowpass(y[n]))
//! ```
//!
//! The echoes are equally spaced and each one passes through the lowpass
//! once more than the last, so highs die away faster than lows.

use crate::engine::EngineError;
use crate::memory::Carve;

use super::delay::DelayLine;
use super::filter::OnePole;
use super::guard::{bound, flush_denormal, sanitize};
use super::saturation::Saturator;

#[derive(Debug, Default, Clone, Copy)]
pub struct CombLine {
    line: DelayLine,
    damping: OnePole,
}

impl CombLine {
    pub fn allocate<C: Carve>(carve: &mut C, capacity: usize) -> Result<Self, EngineError> {
        Ok(Self {
            line: DelayLine::new(carve.carve(capacity)?),
            damping: OnePole::new(),
        })
    }

    pub fn max_delay(&self) -> f32 {
        self.line.max_delay()
    }

    /// Delayed sample passed through the damping filter.
    #[inline]
    pub fn read_damped(&mut self, memory: &[f32], delay: f32, damping: f32) -> f32 {
        let delayed = sanitize(self.line.read(memory, delay));
        self.damping.lowpass(delayed, damping)
    }

    /// Saturate, bound and store the next loop sample.
    #[inline]
    pub fn write_guarded(&mut self, memory: &mut [f32], sample: f32, saturator: Saturator) {
        self.line
            .write(memory, flush_denormal(bound(saturator.process(sanitize(sample)))));
    }

    /// One step of a self-feeding comb. Returns the damped delayed sample.
    #[inline]
    pub fn process(
        &mut self,
        memory: &mut [f32],
        input: f32,
        delay: f32,
        feedback: f32,
        damping: f32,
        saturator: Saturator,
    ) -> f32 {
        let delayed = self.read_damped(memory, delay, damping);
        self.write_guarded(memory, input + delayed * feedback, saturator);
        delayed
    }

    pub fn clear(&mut self, memory: &mut [f32]) {
        self.line.clear(memory);
        self.damping.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::DelayMemory;

    fn comb(capacity: usize) -> (CombLine, DelayMemory) {
        let mut memory = DelayMemory::new(capacity);
        let comb = CombLine::allocate(&mut memory, capacity).unwrap();
        (comb, memory)
    }

    #[test]
    fn test_comb_creates_echo() {
        let (mut comb, mut memory) = comb(32);
        let sat = Saturator::new(2.0);
        let first = comb.process(memory.as_mut_slice(), 1.0, 10.0, 0.5, 0.95, sat);
        assert!(first.abs() < 0.01); // No output yet (delayed)

        let mut echo = 0.0;
        for _ in 0..10 {
            echo = comb.process(memory.as_mut_slice(), 0.0, 10.0, 0.5, 0.95, sat);
        }
        assert!(echo > 0.4, "echo expected after 10 samples, got {}", echo);
    }

    #[test]
    fn test_comb_decays() {
        let (mut comb, mut memory) = comb(64);
        let sat = Saturator::new(2.0);
        comb.process(memory.as_mut_slice(), 1.0, 20.0, 0.9, 0.5, sat);
        let mut last_peak = f32::MAX;
        for _ in 0..20 {
            let mut peak = 0.0f32;
            for _ in 0..20 {
                peak = peak.max(comb.process(memory.as_mut_slice(), 0.0, 20.0, 0.9, 0.5, sat).abs());
            }
            assert!(peak <= last_peak, "tail should not grow: {} -> {}", last_peak, peak);
            last_peak = peak;
        }
        assert!(last_peak < 0.1);
    }

    #[test]
    fn test_comb_survives_nan_input() {
        let (mut comb, mut memory) = comb(16);
        let sat = Saturator::new(1.0);
        comb.process(memory.as_mut_slice(), f32::NAN, 5.0, 0.9, 0.5, sat);
        for _ in 0..50 {
            let out = comb.process(memory.as_mut_slice(), f32::INFINITY, 5.0, 0.9, 0.5, sat);
            assert!(out.is_finite());
        }
    }

    #[test]
    fn test_clear_silences() {
        let (mut comb, mut memory) = comb(16);
        let sat = Saturator::default();
        for _ in 0..10 {
            comb.process(memory.as_mut_slice(), 1.0, 4.0, 0.5, 0.5, sat);
        }
        comb.clear(memory.as_mut_slice());
        let out = comb.process(memory.as_mut_slice(), 0.0, 4.0, 0.5, 0.5, sat);
        assert_eq!(out, 0.0);
    }
}
