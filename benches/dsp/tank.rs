//! Benchmarks for the comb/tank network in both wirings.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use fdnfx::dsp::saturation::Saturator;
use fdnfx::dsp::tank::{scaled_gain, Tank, TankControls, Topology};
use fdnfx::memory::{DelayMemory, MemoryPlan};

use crate::BLOCK_SIZES;

const LENGTHS: [[f32; 4]; 2] = [[1557.0, 1617.0, 1491.0, 1422.0], [1580.0, 1640.0, 1514.0, 1445.0]];

pub fn bench_tank(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/tank");

    let capacities = [[2_200; 4]; 2];
    let mut plan = MemoryPlan::new();
    Tank::<4>::allocate(&mut plan, capacities).expect("plan never fails");
    let mut memory = DelayMemory::new(plan.total());
    let mut tank = Tank::<4>::allocate(&mut memory, capacities).expect("memory was planned");

    let gains = LENGTHS.map(|side| side.map(|len| scaled_gain(0.85, len, 1422.0)));
    let controls = TankControls {
        delays: &LENGTHS,
        gains: &gains,
        damping: 0.5,
        saturator: Saturator::new(2.0),
    };

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 0.1).collect();

        for (name, topology) in [("parallel", Topology::Parallel), ("cross_coupled", Topology::CrossCoupled)] {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    let mut sum = 0.0f32;
                    for &sample in &input {
                        let [l, r] = tank.process(memory.as_mut_slice(), topology, black_box([sample, sample]), &controls);
                        sum += l + r;
                    }
                    sum
                })
            });
        }
    }

    group.finish();
}
