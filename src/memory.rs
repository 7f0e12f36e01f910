//! Delay memory arena.
//!
//! Every engine draws all of its delay storage from one contiguous allocation
//! handed over at initialization. Lines receive a [`Region`] (offset + length)
//! inside that allocation and index into it through the slice the engine
//! passes down each sample. Nothing is allocated or resized after the engine
//! has been built.
//!
//! ```text
//! DelayMemory: [ predelay | tank L0 | tank L1 | ... | diffuser R3 | unused ]
//!                ^offset 0  ^offset a  ^offset b
//! ```
//!
//! [`MemoryPlan`] walks the same layout code without storage so an engine can
//! report exactly how many samples it needs before the host allocates them.

use crate::engine::EngineError;

/// Smallest region a delay line can use: one sample being written, one being
/// read, and the interpolation neighbour.
pub const MIN_REGION_LEN: usize = 4;

/// A contiguous slice of the arena owned by one delay line. The default
/// region is empty and only serves as a placeholder before carving.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    offset: usize,
    len: usize,
}

impl Region {
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn slice<'a>(&self, memory: &'a [f32]) -> &'a [f32] {
        &memory[self.offset..self.offset + self.len]
    }

    #[inline]
    pub fn slice_mut<'a>(&self, memory: &'a mut [f32]) -> &'a mut [f32] {
        &mut memory[self.offset..self.offset + self.len]
    }
}

/// Anything regions can be carved from.
pub trait Carve {
    fn carve(&mut self, len: usize) -> Result<Region, EngineError>;
}

/// Host-provided sample storage, partitioned by a bump allocator.
#[derive(Debug)]
pub struct DelayMemory {
    samples: Box<[f32]>,
    carved: usize,
}

impl DelayMemory {
    /// Allocate a zeroed region of `len` samples.
    pub fn new(len: usize) -> Self {
        Self::from_vec(vec![0.0; len])
    }

    /// Adopt an existing buffer. Its contents are cleared.
    pub fn from_vec(mut samples: Vec<f32>) -> Self {
        samples.fill(0.0);
        Self {
            samples: samples.into_boxed_slice(),
            carved: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples already handed out to regions.
    pub fn carved(&self) -> usize {
        self.carved
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.samples
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Silence every region without giving any of them back.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }

    /// Forget every region and silence the samples, ready to be carved again.
    pub fn reclaim(&mut self) {
        self.samples.fill(0.0);
        self.carved = 0;
    }
}

impl Carve for DelayMemory {
    fn carve(&mut self, len: usize) -> Result<Region, EngineError> {
        let len = len.max(MIN_REGION_LEN);
        let end = self.carved + len;
        if end > self.samples.len() {
            return Err(EngineError::MemoryTooSmall {
                required: end,
                provided: self.samples.len(),
            });
        }
        let region = Region {
            offset: self.carved,
            len,
        };
        self.carved = end;
        Ok(region)
    }
}

/// Dry-run allocator: counts what a layout would carve.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryPlan {
    total: usize,
}

impl MemoryPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl Carve for MemoryPlan {
    fn carve(&mut self, len: usize) -> Result<Region, EngineError> {
        let len = len.max(MIN_REGION_LEN);
        let region = Region {
            offset: self.total,
            len,
        };
        self.total += len;
        Ok(region)
    }
}

/// Samples needed for `seconds` of audio at `sample_rate`, plus the
/// interpolation guard.
#[inline]
pub fn samples_for(seconds: f32, sample_rate: f32) -> usize {
    (seconds * sample_rate).ceil() as usize + MIN_REGION_LEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carve_is_contiguous() {
        let mut memory = DelayMemory::new(100);
        let a = memory.carve(10).unwrap();
        let b = memory.carve(20).unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 10);
        assert_eq!(memory.carved(), 30);
    }

    #[test]
    fn test_carve_fails_when_exhausted() {
        let mut memory = DelayMemory::new(16);
        memory.carve(12).unwrap();
        match memory.carve(8) {
            Err(EngineError::MemoryTooSmall { required, provided }) => {
                assert_eq!(required, 20);
                assert_eq!(provided, 16);
            }
            other => panic!("expected MemoryTooSmall, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_matches_real_layout() {
        let lens = [7usize, 1, 300, 42];
        let mut plan = MemoryPlan::new();
        for &len in &lens {
            plan.carve(len).unwrap();
        }
        let mut memory = DelayMemory::new(plan.total());
        for &len in &lens {
            assert!(memory.carve(len).is_ok());
        }
        assert_eq!(memory.carved(), memory.len());
    }

    #[test]
    fn test_regions_do_not_overlap() {
        let mut memory = DelayMemory::new(64);
        let a = memory.carve(8).unwrap();
        let b = memory.carve(8).unwrap();
        a.slice_mut(memory.as_mut_slice()).fill(1.0);
        assert!(b.slice(memory.as_slice()).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_reclaim_rewinds() {
        let mut memory = DelayMemory::new(32);
        let region = memory.carve(32).unwrap();
        region.slice_mut(memory.as_mut_slice()).fill(0.5);
        memory.reclaim();
        assert_eq!(memory.carved(), 0);
        assert!(memory.as_slice().iter().all(|&s| s == 0.0));
        assert!(memory.carve(32).is_ok());
    }

    #[test]
    fn test_from_vec_clears_contents() {
        let memory = DelayMemory::from_vec(vec![3.0; 8]);
        assert!(memory.as_slice().iter().all(|&s| s == 0.0));
    }
}
