//! All-pass diffusers.
//!
//! ```text
//! out[n]      = -g * x[n] + v[n - N]
//! v[n]        =  x[n] + g * out[n]      (what gets written)
//! ```
//!
//! The magnitude response is flat, so a diffuser smears transients in time
//! without coloring the tail. One stage rings at its own period; a series
//! chain with mutually prime lengths builds a dense, smooth texture.

use crate::engine::EngineError;
use crate::memory::{Carve, MIN_REGION_LEN};

use super::delay::DelayLine;
use super::guard::{bound, flush_denormal};

/// Lowest diffusion coefficient that still audibly diffuses.
pub const MIN_DIFFUSION: f32 = 0.2;
/// Highest diffusion coefficient that stays free of metallic ringing.
pub const MAX_DIFFUSION: f32 = 0.75;

#[inline]
pub fn clamp_diffusion(g: f32) -> f32 {
    if g.is_finite() {
        g.clamp(MIN_DIFFUSION, MAX_DIFFUSION)
    } else {
        MIN_DIFFUSION
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AllpassDiffuser {
    line: DelayLine,
    length: usize,
}

impl AllpassDiffuser {
    pub fn allocate<C: Carve>(carve: &mut C, length: usize) -> Result<Self, EngineError> {
        let length = length.max(1);
        let region = carve.carve(length + MIN_REGION_LEN)?;
        Ok(Self {
            line: DelayLine::new(region),
            length,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn process(&mut self, memory: &mut [f32], input: f32, g: f32) -> f32 {
        let delayed = self.line.tap(memory, self.length);
        let g = clamp_diffusion(g);
        let output = -g * input + delayed;
        self.line.write(memory, flush_denormal(bound(input + g * output)));
        output
    }

    pub fn clear(&mut self, memory: &mut [f32]) {
        self.line.clear(memory);
    }
}

/// `N` diffusers in series.
#[derive(Debug, Clone, Copy)]
pub struct DiffuserChain<const N: usize> {
    stages: [AllpassDiffuser; N],
}

impl<const N: usize> DiffuserChain<N> {
    /// Lengths are in samples and should be mutually prime.
    pub fn allocate<C: Carve>(carve: &mut C, lengths: [usize; N]) -> Result<Self, EngineError> {
        let mut stages = [AllpassDiffuser::default(); N];
        for (stage, &length) in stages.iter_mut().zip(lengths.iter()) {
            *stage = AllpassDiffuser::allocate(carve, length)?;
        }
        Ok(Self { stages })
    }

    #[inline]
    pub fn process(&mut self, memory: &mut [f32], input: f32, g: f32) -> f32 {
        let mut x = input;
        for stage in self.stages.iter_mut() {
            x = stage.process(memory, x, g);
        }
        x
    }

    /// Sum of all stage lengths in samples.
    pub fn total_delay(&self) -> usize {
        self.stages.iter().map(AllpassDiffuser::length).sum()
    }

    /// Samples for the chain's ring-out to fall 60 dB at coefficient `g`.
    pub fn ring_time(&self, g: f32) -> usize {
        let g = clamp_diffusion(g);
        let longest = self.stages.iter().map(AllpassDiffuser::length).max().unwrap_or(0);
        // g^k = 1e-3 after k round trips of the longest stage
        let trips = (-3.0 / g.log10()).ceil() as usize;
        self.total_delay() + longest * trips
    }

    pub fn clear(&mut self, memory: &mut [f32]) {
        for stage in self.stages.iter_mut() {
            stage.clear(memory);
        }
    }
}
