pub mod dsp;
pub mod effects; // Reverb and delay engines built from the dsp primitives
pub mod engine; // Host-facing lifecycle, render loop and parameter handoff
pub mod memory;
pub mod params;
pub mod sequencing; // Tempo and note-value timing

pub use engine::{Effect, EffectKind, Engine, EngineConfig, EngineError};
pub use memory::DelayMemory;

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Sample rate every delay length in this crate is designed at. Other rates
/// scale lengths by `sample_rate / DESIGN_SAMPLE_RATE`.
pub const DESIGN_SAMPLE_RATE: f32 = 48_000.0;

/// Longest delay any single line supports.
pub const MAX_DELAY_SECONDS: f32 = 3.0;
