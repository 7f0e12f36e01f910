//! Circular delay line over an arena region.
//!
//! The line only keeps a cursor; samples live in the [`Region`] of the engine's
//! [`DelayMemory`](crate::memory::DelayMemory). Every call takes the arena
//! slice explicitly so many lines can share one allocation without aliasing.
//!
//! ```text
//! write(x): buf[cursor] = x; cursor = (cursor + 1) % capacity
//!
//! read(d):  newest sample is d = 1, so reads only see strictly earlier writes
//!           d is clamped to [1, capacity - 2] and linearly interpolated
//! ```

use crate::memory::Region;

#[derive(Debug, Default, Clone, Copy)]
pub struct DelayLine {
    region: Region,
    write_pos: usize,
}

impl DelayLine {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            write_pos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.region.len()
    }

    /// Longest delay that [`read`](Self::read) will honour without clamping.
    pub fn max_delay(&self) -> f32 {
        (self.capacity() - 2) as f32
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Store one sample at the cursor and advance it.
    #[inline]
    pub fn write(&mut self, memory: &mut [f32], sample: f32) {
        let buffer = self.region.slice_mut(memory);
        buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos >= buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Linearly interpolated read `delay` samples behind the newest write.
    #[inline]
    pub fn read(&self, memory: &[f32], delay: f32) -> f32 {
        let buffer = self.region.slice(memory);
        let capacity = buffer.len();
        // NaN fails both comparisons of clamp's contract, so catch it first.
        let delay = if delay.is_finite() { delay } else { 1.0 };
        let delay = delay.clamp(1.0, (capacity - 2) as f32);

        let whole = delay as usize;
        let frac = delay - whole as f32;

        let index_a = (self.write_pos + capacity - whole) % capacity;
        let index_b = if index_a == 0 { capacity - 1 } else { index_a - 1 };

        let a = buffer[index_a];
        let b = buffer[index_b];
        a + (b - a) * frac
    }

    /// Integer read with the same clamping as [`read`](Self::read).
    #[inline]
    pub fn tap(&self, memory: &[f32], delay: usize) -> f32 {
        let buffer = self.region.slice(memory);
        let capacity = buffer.len();
        let delay = delay.clamp(1, capacity - 2);
        buffer[(self.write_pos + capacity - delay) % capacity]
    }

    /// Silence the line's region and rewind the cursor.
    pub fn clear(&mut self, memory: &mut [f32]) {
        self.region.slice_mut(memory).fill(0.0);
        self.write_pos = 0;
    }
}
