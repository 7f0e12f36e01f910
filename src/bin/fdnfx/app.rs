//! Live playback through the default output device

use std::io::BufRead;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use fdnfx::engine::{message_channel, EngineMessage, SUPPORTED_SAMPLE_RATES};
use fdnfx::{EffectKind, Engine, EngineConfig, MAX_BLOCK_SIZE};

/// Pluck decay per sample.
const PLUCK_DECAY: f32 = 0.9992;
const PLUCK_LEVEL: f32 = 0.5;

/// Noise burst struck on every beat, the test signal fed into the effect.
struct Pluck {
    rng: ChaCha8Rng,
    envelope: f32,
    samples_per_beat: usize,
    position: usize,
}

impl Pluck {
    fn new(bpm: f32, sample_rate: f32) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(1),
            envelope: 0.0,
            samples_per_beat: (60.0 / bpm * sample_rate) as usize,
            position: 0,
        }
    }

    #[inline]
    fn next(&mut self) -> f32 {
        if self.position == 0 {
            self.envelope = PLUCK_LEVEL;
        }
        self.position = (self.position + 1) % self.samples_per_beat.max(1);
        let sample = self.rng.random_range(-1.0..1.0) * self.envelope;
        self.envelope *= PLUCK_DECAY;
        sample
    }
}

/// Builder for a live effect session
pub struct Player {
    kind: EffectKind,
    bpm: f32,
    settings: Vec<(u8, i32)>,
}

impl Player {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            bpm: 120.0,
            settings: Vec::new(),
        }
    }

    pub fn bpm(mut self, bpm: f32) -> Self {
        self.bpm = bpm;
        self
    }

    /// Parameter values applied before the stream starts
    pub fn settings(mut self, settings: Vec<(u8, i32)>) -> Self {
        self.settings = settings;
        self
    }

    /// Run until `quit` or end of input
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
            return Err(eyre!(
                "output device runs at {} Hz, supported rates are {:?}",
                sample_rate,
                SUPPORTED_SAMPLE_RATES
            ));
        }

        let mut engine = Engine::with_owned_memory(self.kind, EngineConfig::stereo(sample_rate))?;
        for &(id, value) in &self.settings {
            engine.set_parameter(id, value);
        }
        engine.set_tempo((self.bpm * 65_536.0) as u32);
        engine.reset();

        let descriptor = engine.descriptor();
        println!("=== fdnfx: {} ===", descriptor.name);
        println!("BPM: {}", self.bpm);
        println!("Sample rate: {} Hz", sample_rate);
        println!("Channels: {}", channels);
        println!();
        for (id, param) in descriptor.params.iter().enumerate() {
            let value = engine.get_parameter(id as u8);
            match engine.parameter_text(id as u8, value) {
                Some(text) => println!("  {:<9} {} ({})", param.name, value, text),
                None => println!("  {:<9} {}", param.name, value),
            }
        }
        println!();
        println!("Type NAME VALUE to change a parameter, `reset`, or `quit`");

        let (mut producer, mut consumer) = message_channel(64);
        let mut pluck = Pluck::new(self.bpm, sample_rate as f32);
        let mut input = vec![0.0f32; MAX_BLOCK_SIZE * 2];
        let mut output = vec![0.0f32; MAX_BLOCK_SIZE * 2];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                engine.drain(&mut consumer);

                let total_frames = data.len() / channels;
                let mut frames_written = 0;
                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    for frame in input[..frames * 2].chunks_exact_mut(2) {
                        let x = pluck.next();
                        frame[0] = x;
                        frame[1] = x;
                    }
                    engine.render(&input[..frames * 2], &mut output[..frames * 2], frames);

                    let out_off = frames_written * channels;
                    for (i, frame) in output[..frames * 2].chunks_exact(2).enumerate() {
                        let slot = &mut data[out_off + i * channels..out_off + (i + 1) * channels];
                        if channels == 1 {
                            slot[0] = 0.5 * (frame[0] + frame[1]);
                        } else {
                            slot[0] = frame[0];
                            slot[1] = frame[1];
                            slot[2..].fill(0.0);
                        }
                    }
                    frames_written += frames;
                }
            },
            |err| eprintln!("Audio error: {}", err),
            None,
        )?;
        stream.play()?;

        for line in std::io::stdin().lock().lines() {
            let line = line?;
            let mut words = line.split_whitespace();
            let message = match (words.next(), words.next()) {
                (Some("quit"), _) | (Some("q"), _) => break,
                (Some("reset"), _) => EngineMessage::Reset,
                (Some(name), Some(value)) => {
                    let Some(id) = descriptor.find(name) else {
                        println!("no parameter {}", name);
                        continue;
                    };
                    let Ok(value) = value.parse::<i32>() else {
                        println!("bad value {}", value);
                        continue;
                    };
                    EngineMessage::SetParameter { id, value }
                }
                _ => continue,
            };
            if producer.push(message).is_err() {
                println!("audio thread is behind, dropped {:?}", message);
            }
        }
        Ok(())
    }
}
