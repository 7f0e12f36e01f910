//! Effect engines assembled from the [`dsp`](crate::dsp) primitives.
//!
//! | effect        | network                                   |
//! |---------------|-------------------------------------------|
//! | `Cathedral`   | predelay, early taps, diffusers, 4x2 tank  |
//! | `Raindrop`    | 10x2 parallel comb lines with chaos offsets |
//! | `ShiftDelay`  | stereo delay with a frequency shifter loop |
//!
//! Every engine carves its lines in one `layout` function that runs twice:
//! once against a [`MemoryPlan`](crate::memory::MemoryPlan) to report the
//! memory it needs, once against the host's arena.

pub mod raindrop;
pub mod reverb;
pub mod shift_delay;

pub use raindrop::RaindropDelay;
pub use reverb::{CathedralReverb, ReverbMode};
pub use shift_delay::ShiftDelay;

use crate::DESIGN_SAMPLE_RATE;

/// Length designed at 48 kHz, rescaled to `sample_rate`.
#[inline]
pub(crate) fn scaled_len(samples: usize, sample_rate: f32) -> usize {
    ((samples as f32 * sample_rate / DESIGN_SAMPLE_RATE).round() as usize).max(1)
}

/// `sample_rate / 48000`.
#[inline]
pub(crate) fn rate_scale(sample_rate: f32) -> f32 {
    sample_rate / DESIGN_SAMPLE_RATE
}
