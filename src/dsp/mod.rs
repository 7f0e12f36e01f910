//! Low-level DSP primitives the effect engines are assembled from.
//!
//! These components are allocation-free and realtime-safe. Anything that
//! needs sample storage holds a region of the engine's delay memory and takes
//! the arena slice as an argument, so the primitives themselves stay small
//! `Copy` structs of cursors and filter state.

/// Feedback comb line with damping.
pub mod comb;
/// Circular delay line with fractional reads.
pub mod delay;
/// All-pass diffusers and series chains.
pub mod diffuser;
/// One-pole damping and tone filters.
pub mod filter;
/// Gain ceilings, denormal flush and finite guards for feedback loops.
pub mod guard;
pub mod lfo;
pub mod mix;
/// Soft clipping and lo-fi degradation.
pub mod saturation;
/// Hilbert transformer and single-sideband frequency shifter.
pub mod shifter;
pub mod smoothing;
/// Parallel and cross-coupled line networks.
pub mod tank;

pub use tank::Topology;
