//! Benchmarks for the allocation-free primitives.

mod delay;
mod diffuser;
mod shifter;
mod tank;

pub use delay::bench_delay;
pub use diffuser::bench_diffuser;
pub use shifter::bench_shifter;
pub use tank::bench_tank;
