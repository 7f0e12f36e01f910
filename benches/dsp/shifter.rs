//! Benchmarks for the Hilbert frequency shifter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fdnfx::dsp::shifter::{FrequencyShifter, ShiftDirection};

use crate::BLOCK_SIZES;

pub fn bench_shifter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/shifter");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        let mut shifter = FrequencyShifter::new(48_000.0);
        group.bench_with_input(BenchmarkId::new("shift_up_30hz", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for &sample in &input {
                    sum += shifter.process(black_box(sample), 30.0, ShiftDirection::Up, 0.0);
                }
                sum
            })
        });
    }

    group.finish();
}
