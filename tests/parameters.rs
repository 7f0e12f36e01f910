mod common;

use common::*;
use fdnfx::params::ParamKind;
use fdnfx::EffectKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn every_value_round_trips() {
    for kind in EffectKind::ALL {
        let mut engine = engine(kind);
        let descriptor = engine.descriptor();
        for (id, param) in descriptor.params.iter().enumerate() {
            let id = id as u8;
            for value in param.min..=param.max {
                engine.set_parameter(id, value);
                assert_eq!(engine.get_parameter(id), value, "{} {} lost {}", kind, param.name, value);
            }
        }
    }
}

#[test]
fn out_of_range_values_clamp() {
    for kind in EffectKind::ALL {
        let mut engine = engine(kind);
        let descriptor = engine.descriptor();
        for (id, param) in descriptor.params.iter().enumerate() {
            let id = id as u8;
            engine.set_parameter(id, param.max + 1);
            assert_eq!(engine.get_parameter(id), param.max, "{} {}", kind, param.name);
            engine.set_parameter(id, i32::MIN);
            assert_eq!(engine.get_parameter(id), param.min, "{} {}", kind, param.name);
        }
        // Unknown ids are ignored
        engine.set_parameter(200, 5);
        assert_eq!(engine.get_parameter(200), 0);
    }
}

#[test]
fn enumerated_values_have_display_text() {
    let engine = engine(EffectKind::Cathedral);
    let mode = engine.descriptor().find("MODE").unwrap();
    let names: Vec<_> = (0..4).map(|v| engine.parameter_text(mode, v).unwrap()).collect();
    assert_eq!(names, ["CATHDRL", "HALL", "REVERSE", "SHIMMER"]);
    let time = engine.descriptor().find("TIME").unwrap();
    assert_eq!(engine.parameter_text(time, 100), None);

    let engine = common::engine(EffectKind::ShiftDelay);
    let direct = engine.descriptor().find("DIRECT").unwrap();
    assert_eq!(engine.parameter_text(direct, 0), Some("OFF"));
    assert_eq!(engine.parameter_text(direct, 2), Some("DOWN"));
    let sync = engine.descriptor().find("SYNC").unwrap();
    assert_eq!(engine.parameter_text(sync, 8), Some("1/1"));

    let engine = common::engine(EffectKind::Raindrop);
    let freeze = engine.descriptor().find("FREEZE").unwrap();
    assert_eq!(engine.parameter_text(freeze, 1), Some("ON"));

    for kind in EffectKind::ALL {
        let descriptor = kind.descriptor();
        for param in descriptor.params {
            if let ParamKind::Enum(names) = param.kind {
                assert_eq!(names.len() as i32, param.max + 1, "{} {}", kind, param.name);
            }
            assert!((param.min..=param.max).contains(&param.init), "{} {}", kind, param.name);
        }
    }
}

fn raindrop_level(lines: i32, settings: &[(&str, i32)], source: impl FnMut(usize) -> (f32, f32)) -> f32 {
    let mut engine = engine(EffectKind::Raindrop);
    for &(name, value) in settings {
        set(&mut engine, name, value);
    }
    set(&mut engine, "MIX", 100);
    set(&mut engine, "LINES", lines);
    engine.reset();
    let out = render(&mut engine, seconds(2.0), source);
    rms(out[seconds(1.0)..].iter().flat_map(|&(l, r)| [l, r]))
}

fn assert_within_db(one: f32, many: f32, db: f32) {
    assert!(one > 1e-3);
    let diff = 20.0 * (many / one).log10();
    assert!(diff.abs() <= db, "1 line {} vs 10 lines {} ({} dB)", one, many, diff);
}

#[test]
fn line_count_keeps_level_for_identical_lines() {
    let settings = [("CHAOS", 0), ("MODINT", 0), ("DIFFUSE", 0), ("TIME", 0)];
    let sine = |n: usize| {
        let x = (n as f32 * 440.0 * std::f32::consts::TAU / SR as f32).sin() * 0.25;
        (x, x)
    };
    assert_within_db(raindrop_level(1, &settings, sine), raindrop_level(10, &settings, sine), 1.0);
}

#[test]
fn line_count_keeps_level_for_scattered_lines() {
    // Default CHAOS spreads the lines over a quarter second
    let settings = [("MODINT", 0), ("DIFFUSE", 0), ("DEPTH", 0), ("TIME", 205)];
    let noise = || {
        let mut rng = StdRng::seed_from_u64(11);
        move |_: usize| {
            let x: f32 = rng.random_range(-0.5..0.5);
            (x, x)
        }
    };
    assert_within_db(raindrop_level(1, &settings, noise()), raindrop_level(10, &settings, noise()), 1.0);
}

fn correlation(frames: &[(f32, f32)]) -> f32 {
    let (mut lr, mut ll, mut rr) = (0.0f64, 0.0f64, 0.0f64);
    for &(l, r) in frames {
        lr += l as f64 * r as f64;
        ll += l as f64 * l as f64;
        rr += r as f64 * r as f64;
    }
    (lr / (ll * rr).sqrt()) as f32
}

#[test]
fn sides_decorrelate_a_mono_source() {
    for kind in [EffectKind::Raindrop, EffectKind::Cathedral] {
        let mut engine = engine(kind);
        set(&mut engine, "MIX", 100);
        if kind == EffectKind::Raindrop {
            set(&mut engine, "TIME", 0);
            engine.reset();
        }
        let mut rng = StdRng::seed_from_u64(7);
        let out = render(&mut engine, seconds(1.5), |_| {
            let x = rng.random_range(-0.5..0.5);
            (x, x)
        });
        let settled = &out[seconds(0.5)..];
        assert!(settled.iter().any(|&(l, r)| l != r), "{} is bit-identical across sides", kind);
        let c = correlation(settled);
        assert!(c < 0.99, "{} correlation {}", kind, c);
    }
}

#[test]
fn host_tempo_moves_synced_echo() {
    let mut engine = engine(EffectKind::ShiftDelay);
    for (name, value) in [("FEEDBCK", 0), ("DIRECT", 0), ("WANDER", 0), ("MIX", 100)] {
        set(&mut engine, name, value);
    }
    // 3/16 at 90 BPM is half a second
    engine.set_tempo(90 << 16);
    engine.reset();

    let out = render(&mut engine, seconds(0.75), |n| if n == 0 { (1.0, 1.0) } else { (0.0, 0.0) });
    let (at, value) = out
        .iter()
        .enumerate()
        .fold((0, 0.0f32), |best, (n, &(l, _))| if l.abs() > best.1 { (n, l.abs()) } else { best });
    assert_eq!(at, 24_000);
    assert!(value > 0.5);
}

#[test]
fn snapshot_restores_into_a_fresh_engine() {
    let mut original = engine(EffectKind::Raindrop);
    set(&mut original, "TIME", 100);
    set(&mut original, "LINES", 4);
    set(&mut original, "SYNC", 5);
    let snapshot = original.snapshot();
    assert_eq!(snapshot.effect, "Raindrop");

    let mut restored = engine(EffectKind::Raindrop);
    restored.restore(&snapshot);
    for id in 0..original.descriptor().params.len() as u8 {
        assert_eq!(restored.get_parameter(id), original.get_parameter(id));
    }
    assert_eq!(restored.snapshot(), snapshot);
}
