pub mod duration;
pub mod tempo;

pub use duration::Duration;
pub use tempo::{sync_division, TempoClock, SYNC_NAMES};
