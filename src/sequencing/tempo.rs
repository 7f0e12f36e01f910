//! Host tempo and clock.
//!
//! Hosts send tempo as 16.16 fixed-point BPM and a running clock counter at 4
//! ticks per quarter note. Neither is required: an engine that never hears a
//! tempo runs at [`DEFAULT_BPM`].

use super::duration::Duration;

pub const MIN_BPM: f32 = 60.0;
pub const MAX_BPM: f32 = 240.0;
pub const DEFAULT_BPM: f32 = 120.0;

/// Clock ticks per quarter note.
pub const CLOCK_PPQ: u32 = 4;

/// Names of the tempo-synced delay divisions, index 0 meaning free-running.
pub const SYNC_NAMES: &[&str] = &["OFF", "1/16", "1/8", "3/16", "1/4", "3/8", "1/2", "3/4", "1/1"];

const SYNC_DIVISIONS: [Duration; 8] = [
    Duration::SIXTEENTH,
    Duration::EIGHTH,
    Duration::DOTTED_EIGHTH,
    Duration::QUARTER,
    Duration::DOTTED_QUARTER,
    Duration::HALF,
    Duration::DOTTED_HALF,
    Duration::WHOLE,
];

/// Note value for a sync selector, `None` when free-running.
pub fn sync_division(index: i32) -> Option<Duration> {
    if index <= 0 {
        return None;
    }
    SYNC_DIVISIONS.get(index as usize - 1).copied()
}

/// Decode 16.16 fixed-point BPM, clamped to `[MIN_BPM, MAX_BPM]`.
pub fn bpm_from_fixed(fixed: u32) -> f32 {
    let whole = (fixed >> 16) as f32;
    let frac = (fixed & 0xFFFF) as f32 / 65_536.0;
    (whole + frac).clamp(MIN_BPM, MAX_BPM)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoClock {
    bpm: f32,
    received: bool,
    ticks: u32,
}

impl Default for TempoClock {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            received: false,
            ticks: 0,
        }
    }
}

impl TempoClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tempo(&mut self, fixed: u32) {
        self.bpm = bpm_from_fixed(fixed);
        self.received = true;
    }

    /// Record the host's clock counter.
    pub fn tick(&mut self, counter: u32) {
        self.ticks = counter;
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    /// Whether the host has ever sent a tempo.
    pub fn has_tempo(&self) -> bool {
        self.received
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Position inside the current quarter note, `0..CLOCK_PPQ`.
    pub fn tick_in_beat(&self) -> u32 {
        self.ticks % CLOCK_PPQ
    }

    /// Seconds for `division` at the current tempo.
    pub fn seconds(&self, division: Duration) -> f32 {
        division.seconds_at(self.bpm)
    }
}
