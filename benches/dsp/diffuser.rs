//! Benchmarks for all-pass diffusion chains.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fdnfx::dsp::diffuser::DiffuserChain;
use fdnfx::memory::{DelayMemory, MemoryPlan};

use crate::BLOCK_SIZES;

const LENGTHS: [usize; 4] = [229, 173, 613, 443];

pub fn bench_diffuser(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/diffuser");

    let mut plan = MemoryPlan::new();
    DiffuserChain::allocate(&mut plan, LENGTHS).expect("plan never fails");
    let mut memory = DelayMemory::new(plan.total());
    let mut chain = DiffuserChain::allocate(&mut memory, LENGTHS).expect("memory was planned");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| if i < 10 { 1.0 - i as f32 / 10.0 } else { 0.0 })
            .collect();

        group.bench_with_input(BenchmarkId::new("chain_4", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    sum += chain.process(memory.as_mut_slice(), black_box(sample), 0.6);
                }
                sum
            })
        });
    }

    group.finish();
}
