#![allow(dead_code)]

use fdnfx::{EffectKind, Engine, EngineConfig};

pub const SR: u32 = 48_000;
pub const BLOCK: usize = 128;

pub fn engine(kind: EffectKind) -> Engine {
    Engine::with_owned_memory(kind, EngineConfig::stereo(SR)).unwrap()
}

/// Set a parameter by name.
pub fn set(engine: &mut Engine, name: &str, value: i32) {
    let id = engine
        .descriptor()
        .find(name)
        .unwrap_or_else(|| panic!("{} has no parameter {}", engine.kind(), name));
    engine.set_parameter(id, value);
}

/// Render `frames` stereo frames in host-sized blocks. `source` gives the
/// input frame for each absolute frame index.
pub fn render(engine: &mut Engine, frames: usize, mut source: impl FnMut(usize) -> (f32, f32)) -> Vec<(f32, f32)> {
    let mut out = Vec::with_capacity(frames);
    let mut input = [0.0f32; BLOCK * 2];
    let mut output = [0.0f32; BLOCK * 2];
    let mut start = 0;
    while start < frames {
        let len = BLOCK.min(frames - start);
        for i in 0..len {
            let (l, r) = source(start + i);
            input[i * 2] = l;
            input[i * 2 + 1] = r;
        }
        let rendered = engine.render(&input[..len * 2], &mut output[..len * 2], len);
        assert_eq!(rendered, len);
        out.extend(output[..len * 2].chunks_exact(2).map(|f| (f[0], f[1])));
        start += len;
    }
    out
}

pub fn seconds(s: f32) -> usize {
    (s * SR as f32) as usize
}

pub fn peak(frames: &[(f32, f32)]) -> f32 {
    frames.iter().fold(0.0f32, |p, &(l, r)| p.max(l.abs()).max(r.abs()))
}

pub fn rms(samples: impl Iterator<Item = f32>) -> f32 {
    let (sum, n) = samples.fold((0.0f64, 0usize), |(s, n), x| (s + (x as f64) * (x as f64), n + 1));
    if n == 0 {
        0.0
    } else {
        (sum / n as f64).sqrt() as f32
    }
}

/// Index of the last frame whose magnitude exceeds `threshold`.
pub fn last_above(frames: &[(f32, f32)], threshold: f32) -> usize {
    frames
        .iter()
        .rposition(|&(l, r)| l.abs() > threshold || r.abs() > threshold)
        .unwrap_or(0)
}
