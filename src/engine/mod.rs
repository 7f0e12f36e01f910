//! Host-facing engine.
//!
//! An [`Engine`] owns one effect and the delay memory it was carved from. The
//! host drives it with a small lifecycle:
//!
//! ```text
//! Engine::initialize(kind, config, memory) ─→ Err: effect unavailable, bypass
//!        │
//!        ├─ set_parameter / get_parameter / parameter_text
//!        ├─ set_tempo / tempo_tick
//!        ├─ render(input, output, frames)      once per host block
//!        ├─ reset()                            silence, keep memory
//!        └─ suspend() / resume()               no-ops
//! ```
//!
//! Parameter calls and rendering must happen on the same thread. Hosts that
//! control the engine from elsewhere queue [`EngineMessage`]s through
//! [`message_channel`] and call [`Engine::drain`] at the top of each block.

pub mod config;
pub mod error;
pub mod message;

use std::fmt;
use std::str::FromStr;

pub use config::{EngineConfig, SUPPORTED_SAMPLE_RATES};
pub use error::EngineError;
#[cfg(feature = "rtrb")]
pub use message::message_channel;
pub use message::{EngineMessage, MessageReceiver};

use crate::dsp::guard::{limit_output, sanitize};
use crate::effects::{CathedralReverb, RaindropDelay, ShiftDelay};
use crate::memory::DelayMemory;
use crate::params::{EffectDescriptor, ParamSet, ParamSnapshot};

/// One effect algorithm. Implementations own their filter and cursor state;
/// all delay samples live in the arena slice passed to every call.
pub trait Effect: Send {
    fn params(&self) -> &ParamSet;

    fn descriptor(&self) -> &'static EffectDescriptor {
        self.params().descriptor()
    }

    /// Store `value` (clamped) for `id` and derive whatever it controls.
    /// Unknown ids are ignored.
    fn set_parameter(&mut self, id: u8, value: i32);

    fn get_parameter(&self, id: u8) -> i32 {
        self.params().get(id)
    }

    fn parameter_text(&self, id: u8, value: i32) -> Option<&'static str> {
        self.params().display(id, value)
    }

    /// Called once before the frames of each block.
    fn begin_block(&mut self, _memory: &mut [f32]) {
        // Default: nothing deferred
    }

    fn process_frame(&mut self, memory: &mut [f32], left: f32, right: f32) -> (f32, f32);

    /// Silence every line, filter and modulator the effect owns.
    fn reset(&mut self, memory: &mut [f32]);

    fn set_tempo(&mut self, _fixed_bpm: u32) {
        // Default: tempo has no effect
    }

    fn tempo_tick(&mut self, _counter: u32) {
        // Default: clock has no effect
    }

    /// Conservative time for the tail to fall 60 dB after input stops.
    fn tail_seconds(&self) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    Cathedral,
    Raindrop,
    ShiftDelay,
}

impl EffectKind {
    pub const ALL: [EffectKind; 3] = [EffectKind::Cathedral, EffectKind::Raindrop, EffectKind::ShiftDelay];

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    pub fn descriptor(&self) -> &'static EffectDescriptor {
        match self {
            EffectKind::Cathedral => &crate::effects::reverb::DESCRIPTOR,
            EffectKind::Raindrop => &crate::effects::raindrop::DESCRIPTOR,
            EffectKind::ShiftDelay => &crate::effects::shift_delay::DESCRIPTOR,
        }
    }

    /// Delay memory, in samples, this effect needs at `sample_rate`.
    pub fn required_memory(&self, sample_rate: u32) -> usize {
        let sample_rate = sample_rate as f32;
        match self {
            EffectKind::Cathedral => CathedralReverb::required_memory(sample_rate),
            EffectKind::Raindrop => RaindropDelay::required_memory(sample_rate),
            EffectKind::ShiftDelay => ShiftDelay::required_memory(sample_rate),
        }
    }

    fn build(&self, sample_rate: f32, memory: &mut DelayMemory) -> Result<Box<dyn Effect>, EngineError> {
        Ok(match self {
            EffectKind::Cathedral => Box::new(CathedralReverb::new(sample_rate, memory)?),
            EffectKind::Raindrop => Box::new(RaindropDelay::new(sample_rate, memory)?),
            EffectKind::ShiftDelay => Box::new(ShiftDelay::new(sample_rate, memory)?),
        })
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EffectKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cathedral" | "reverb" => Ok(EffectKind::Cathedral),
            "raindrop" => Ok(EffectKind::Raindrop),
            "shift" | "shiftdelay" | "shift-delay" => Ok(EffectKind::ShiftDelay),
            _ => Err(EngineError::UnknownEffect(s.to_string())),
        }
    }
}

pub struct Engine {
    config: EngineConfig,
    kind: EffectKind,
    effect: Box<dyn Effect>,
    memory: DelayMemory,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("kind", &self.kind)
            .field("memory", &self.memory.len())
            .finish()
    }
}

impl Engine {
    /// Samples of delay memory the host must provide for `kind`.
    pub fn required_memory(kind: EffectKind, sample_rate: u32) -> usize {
        kind.required_memory(sample_rate)
    }

    /// Bring up `kind` inside the host-provided `memory`.
    pub fn initialize(
        kind: EffectKind,
        config: EngineConfig,
        memory: Option<DelayMemory>,
    ) -> Result<Self, EngineError> {
        let result = Self::try_initialize(kind, config, memory);
        match &result {
            Ok(engine) => log::debug!(
                "initialized {} at {} Hz, {} of {} delay samples",
                kind,
                config.sample_rate,
                engine.memory.carved(),
                engine.memory.len()
            ),
            Err(err) => log::warn!("could not initialize {}: {}", kind, err),
        }
        result
    }

    fn try_initialize(
        kind: EffectKind,
        config: EngineConfig,
        memory: Option<DelayMemory>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let mut memory = memory.ok_or(EngineError::MemoryMissing)?;
        let required = kind.required_memory(config.sample_rate);
        if memory.len() < required {
            return Err(EngineError::MemoryTooSmall {
                required,
                provided: memory.len(),
            });
        }
        memory.reclaim();
        let effect = kind.build(config.sample_rate_f32(), &mut memory)?;
        Ok(Self {
            config,
            kind,
            effect,
            memory,
        })
    }

    /// Allocate exactly the memory `kind` needs and initialize into it.
    pub fn with_owned_memory(kind: EffectKind, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let memory = DelayMemory::new(kind.required_memory(config.sample_rate));
        Self::initialize(kind, config, Some(memory))
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn descriptor(&self) -> &'static EffectDescriptor {
        self.effect.descriptor()
    }

    pub fn set_parameter(&mut self, id: u8, value: i32) {
        self.effect.set_parameter(id, value);
    }

    pub fn get_parameter(&self, id: u8) -> i32 {
        self.effect.get_parameter(id)
    }

    /// Display string for enumerated values, e.g. mode names.
    pub fn parameter_text(&self, id: u8, value: i32) -> Option<&'static str> {
        self.effect.parameter_text(id, value)
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        self.effect.params().snapshot()
    }

    /// Apply every value of a snapshot taken from the same effect kind.
    pub fn restore(&mut self, snapshot: &ParamSnapshot) {
        for (id, &value) in snapshot.values.iter().enumerate() {
            if let Ok(id) = u8::try_from(id) {
                self.effect.set_parameter(id, value);
            }
        }
    }

    pub fn set_tempo(&mut self, fixed_bpm: u32) {
        self.effect.set_tempo(fixed_bpm);
    }

    pub fn tempo_tick(&mut self, counter: u32) {
        self.effect.tempo_tick(counter);
    }

    /// Apply every queued message. Returns how many were applied.
    pub fn drain<R: MessageReceiver + ?Sized>(&mut self, receiver: &mut R) -> usize {
        let mut applied = 0;
        while let Some(message) = receiver.pop() {
            match message {
                EngineMessage::SetParameter { id, value } => self.set_parameter(id, value),
                EngineMessage::SetTempo(fixed) => self.set_tempo(fixed),
                EngineMessage::TempoTick(counter) => self.tempo_tick(counter),
                EngineMessage::Reset => self.reset(),
            }
            applied += 1;
        }
        applied
    }

    /// Silence every delay line and filter without releasing memory.
    pub fn reset(&mut self) {
        log::trace!("reset {}", self.kind);
        self.effect.reset(self.memory.as_mut_slice());
    }

    /// State is left untouched across a pause.
    pub fn suspend(&mut self) {}

    pub fn resume(&mut self) {}

    pub fn tail_seconds(&self) -> f32 {
        self.effect.tail_seconds()
    }

    /// Process one stereo frame outside of a block.
    #[inline]
    pub fn process_frame(&mut self, left: f32, right: f32) -> (f32, f32) {
        let (l, r) = self
            .effect
            .process_frame(self.memory.as_mut_slice(), sanitize(left), sanitize(right));
        (limit_output(l), limit_output(r))
    }

    /// Render interleaved audio. `input` holds `input_channels` samples per
    /// frame and `output` two. Never reads or writes past either buffer, so
    /// the frame count actually processed is returned.
    pub fn render(&mut self, input: &[f32], output: &mut [f32], frames: usize) -> usize {
        let channels = self.config.input_channels.max(1) as usize;
        let frames = frames.min(input.len() / channels).min(output.len() / 2);

        self.effect.begin_block(self.memory.as_mut_slice());
        for (frame_in, frame_out) in input
            .chunks_exact(channels)
            .zip(output.chunks_exact_mut(2))
            .take(frames)
        {
            let left = frame_in[0];
            let right = if channels > 1 { frame_in[1] } else { left };
            let (l, r) = self.process_frame(left, right);
            frame_out[0] = l;
            frame_out[1] = r;
        }
        frames
    }

    /// Render planar audio. With a mono config only `inputs[0]` is read.
    pub fn render_planar(
        &mut self,
        inputs: [&[f32]; 2],
        outputs: [&mut [f32]; 2],
        frames: usize,
    ) -> usize {
        let mono = self.config.input_channels == 1;
        let [out_l, out_r] = outputs;
        let mut frames = frames.min(inputs[0].len()).min(out_l.len()).min(out_r.len());
        if !mono {
            frames = frames.min(inputs[1].len());
        }

        self.effect.begin_block(self.memory.as_mut_slice());
        for i in 0..frames {
            let left = inputs[0][i];
            let right = if mono { left } else { inputs[1][i] };
            let (l, r) = self.process_frame(left, right);
            out_l[i] = l;
            out_r[i] = r;
        }
        frames
    }

    /// Give the delay memory back to the host.
    pub fn into_memory(self) -> DelayMemory {
        self.memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_kind_parsing() {
        assert_eq!("Cathedral".parse::<EffectKind>(), Ok(EffectKind::Cathedral));
        assert_eq!("raindrop".parse::<EffectKind>(), Ok(EffectKind::Raindrop));
        assert_eq!("shift".parse::<EffectKind>(), Ok(EffectKind::ShiftDelay));
        assert!("flanger".parse::<EffectKind>().is_err());
    }

    #[test]
    fn test_missing_memory_fails() {
        let err = Engine::initialize(EffectKind::ShiftDelay, EngineConfig::default(), None).unwrap_err();
        assert_eq!(err, EngineError::MemoryMissing);
    }

    #[test]
    fn test_render_respects_buffer_lengths() {
        let mut engine = Engine::with_owned_memory(EffectKind::ShiftDelay, EngineConfig::default()).unwrap();
        let input = [0.1f32; 64];
        let mut output = [9.0f32; 40];
        // 32 stereo input frames, room for 20 output frames
        let frames = engine.render(&input, &mut output, 1000);
        assert_eq!(frames, 20);
        assert!(output.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_mono_input_feeds_both_sides() {
        let config = EngineConfig::mono_in(48_000);
        let mut engine = Engine::with_owned_memory(EffectKind::ShiftDelay, config).unwrap();
        // Fully dry: output is the input on both sides
        let mix = engine.descriptor().find("MIX").unwrap();
        engine.set_parameter(mix, -100);
        let input = [0.25f32; 16];
        let mut output = [0.0f32; 32];
        assert_eq!(engine.render(&input, &mut output, 16), 16);
        for frame in output.chunks_exact(2) {
            assert_eq!(frame[0], 0.25);
            assert_eq!(frame[1], 0.25);
        }
    }

    #[test]
    fn test_drain_applies_messages() {
        let mut engine = Engine::with_owned_memory(EffectKind::Raindrop, EngineConfig::default()).unwrap();
        let messages = [
            EngineMessage::SetParameter { id: 0, value: 100 },
            EngineMessage::SetTempo(90 << 16),
            EngineMessage::Reset,
        ];
        let applied = engine.drain(&mut messages.iter());
        assert_eq!(applied, 3);
        assert_eq!(engine.get_parameter(0), 100);
    }

    #[cfg(feature = "rtrb")]
    #[test]
    fn test_message_channel_handoff() {
        let (mut producer, mut consumer) = message_channel(8);
        let mut engine = Engine::with_owned_memory(EffectKind::Cathedral, EngineConfig::default()).unwrap();
        producer.push(EngineMessage::SetParameter { id: 13, value: 2 }).unwrap();
        assert_eq!(engine.drain(&mut consumer), 1);
        assert_eq!(engine.get_parameter(13), 2);
        assert_eq!(engine.parameter_text(13, 2), Some("REVERSE"));
    }
}
