//! Benchmarks for delay line operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fdnfx::dsp::delay::DelayLine;
use fdnfx::memory::{Carve, DelayMemory};

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay times in samples
    let delay_times: &[usize] = &[
        480,    // 10ms at 48kHz
        4800,   // 100ms at 48kHz
        48000,  // 1 second at 48kHz
    ];

    let mut memory = DelayMemory::new(48_004);
    let region = memory.carve(48_004).expect("region fits");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        for &delay_samples in delay_times {
            let delay_ms = delay_samples as f32 / 48.0;

            // Integer tap, read then write
            let mut line = DelayLine::new(region);
            group.bench_with_input(
                BenchmarkId::new(format!("tap_{}ms", delay_ms as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        let mut sum = 0.0f32;
                        for &sample in &input {
                            sum += line.tap(memory.as_slice(), black_box(delay_samples));
                            line.write(memory.as_mut_slice(), sample);
                        }
                        sum
                    })
                },
            );
        }

        // Interpolated read under modulation
        let mut line = DelayLine::new(region);
        group.bench_with_input(BenchmarkId::new("read_modulated", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for (i, &sample) in input.iter().enumerate() {
                    let delay = 480.0 + (i as f32 * 0.1).sin() * 48.0;
                    sum += line.read(memory.as_slice(), black_box(delay));
                    line.write(memory.as_mut_slice(), sample);
                }
                sum
            })
        });
    }

    group.finish();
}
