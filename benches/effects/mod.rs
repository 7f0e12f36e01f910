//! Benchmarks for complete engines.
//!
//! Each engine renders interleaved stereo at its default settings and at a
//! worst case (longest decay, everything modulated).

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fdnfx::{EffectKind, Engine, EngineConfig};

use crate::BLOCK_SIZES;

fn engine(kind: EffectKind) -> Engine {
    Engine::with_owned_memory(kind, EngineConfig::default()).expect("default config is supported")
}

fn max_out(engine: &mut Engine) {
    let descriptor = engine.descriptor();
    for (id, param) in descriptor.params.iter().enumerate() {
        engine.set_parameter(id as u8, param.max);
    }
}

pub fn bench_effects(c: &mut Criterion) {
    let mut group = c.benchmark_group("effects");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size * 2)
            .map(|i| if i < 20 { 1.0 } else { (i as f32 * 0.05).sin() * 0.1 })
            .collect();
        let mut output = vec![0.0f32; size * 2];

        for kind in EffectKind::ALL {
            let mut defaults = engine(kind);
            group.bench_with_input(
                BenchmarkId::new(format!("{}_default", kind.name().to_lowercase()), size),
                &size,
                |b, _| b.iter(|| defaults.render(black_box(&input), &mut output, size)),
            );

            let mut worst = engine(kind);
            max_out(&mut worst);
            group.bench_with_input(
                BenchmarkId::new(format!("{}_max", kind.name().to_lowercase()), size),
                &size,
                |b, _| b.iter(|| worst.render(black_box(&input), &mut output, size)),
            );
        }
    }

    group.finish();
}
