//! Offline impulse-response rendering

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use fdnfx::{EffectKind, Engine, EngineConfig, MAX_BLOCK_SIZE};

const SAMPLE_RATE: u32 = 48_000;

/// Render the response to a unit impulse into a 32-bit float stereo WAV.
/// Without an explicit length the engine's own tail estimate is used.
pub fn render_to_wav(
    kind: EffectKind,
    settings: &[(u8, i32)],
    path: &str,
    seconds: Option<f32>,
) -> EyreResult<()> {
    let mut engine = Engine::with_owned_memory(kind, EngineConfig::stereo(SAMPLE_RATE))?;
    for &(id, value) in settings {
        engine.set_parameter(id, value);
    }
    // Start from the settled parameter values
    engine.reset();

    let seconds = seconds.unwrap_or_else(|| engine.tail_seconds() + 0.5).max(0.01);
    let total = (seconds * SAMPLE_RATE as f32) as usize;

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec).wrap_err_with(|| format!("failed to create {}", path))?;

    let mut input = vec![0.0f32; MAX_BLOCK_SIZE * 2];
    let mut output = vec![0.0f32; MAX_BLOCK_SIZE * 2];
    let mut written = 0;
    while written < total {
        let frames = (total - written).min(MAX_BLOCK_SIZE);
        input.fill(0.0);
        if written == 0 {
            input[0] = 1.0;
            input[1] = 1.0;
        }
        let frames = engine.render(&input[..frames * 2], &mut output[..frames * 2], frames);
        for &sample in &output[..frames * 2] {
            writer.write_sample(sample)?;
        }
        written += frames;
    }
    writer.finalize()?;

    println!(
        "{}: {:.2} s impulse response written to {}",
        engine.descriptor().name,
        seconds,
        path
    );
    Ok(())
}
