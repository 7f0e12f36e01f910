//! Cathedral reverb.
//!
//! ```text
//!  L ─┐                                 ┌→ early taps (8, alternating L/R) ───────────┐
//!     ├→ mono ─→ predelay (0..500 ms) ──┤                                             │
//!  R ─┘                                 └→ input diffusers (4) ─→ tank 4x2 ─→ fade    │
//!                                                                  │                  │
//!                     ┌────────────────────────────────────────────┘                  │
//!                     ↓                                                               ↓
//!      output diffusers per side ─→ depth² ─→ [shimmer / reverse] ─→ Σ ─→ -9 dB ─→ soft clip
//!                                                                                    │
//!                                                          width ─→ dry/wet ←────────┘
//! ```
//!
//! MODE picks both the tank wiring and the extras:
//!
//! | mode      | tank           | extra                                   |
//! |-----------|----------------|-----------------------------------------|
//! | `CATHDRL` | parallel       |                                         |
//! | `HALL`    | cross-coupled  |                                         |
//! | `REVERSE` | parallel       | windowed backwards playback of the tail |
//! | `SHIMMER` | cross-coupled  | double modulation, tail +50 %           |
//!
//! Switching wiring mid-tail would splice two unrelated loop states together,
//! so a topology change fades the tank out over 20 ms, clears it at the next
//! block boundary and fades back in. Changes that keep the wiring apply at
//! once.

use std::f32::consts::PI;

use crate::dsp::delay::DelayLine;
use crate::dsp::diffuser::DiffuserChain;
use crate::dsp::filter::damping_coefficient;
use crate::dsp::guard::{AdaptiveDamping, FeedbackCeiling};
use crate::dsp::lfo::{rate_from_unit, spread, Lfo};
use crate::dsp::mix::{mono_sum, DryWet, StereoWidth};
use crate::dsp::saturation::{soft_clip, Saturator};
use crate::dsp::smoothing::{LinearRamp, SmoothedParam};
use crate::dsp::tank::{scaled_gain, Tank, TankControls, Topology, LEFT, RIGHT};
use crate::engine::{Effect, EngineError};
use crate::memory::{samples_for, Carve, MemoryPlan};
use crate::params::{EffectDescriptor, ParamDescriptor, ParamSet};

use super::{rate_scale, scaled_len};

pub const MODE_NAMES: &[&str] = &["CATHDRL", "HALL", "REVERSE", "SHIMMER"];

pub static PARAMS: [ParamDescriptor; 14] = [
    ParamDescriptor::percent("TIME", 307),
    ParamDescriptor::percent("DEPTH", 205),
    ParamDescriptor::dry_wet("MIX", 35),
    ParamDescriptor::percent("SIZE", 409),
    ParamDescriptor::percent("DAMP", 512),
    ParamDescriptor::percent("DIFF", 256),
    ParamDescriptor::percent("EARLY", 102),
    ParamDescriptor::percent("PREDLY", 154),
    ParamDescriptor::percent("MODRATE", 307),
    ParamDescriptor::percent("MODDEPTH", 205),
    ParamDescriptor::percent("WIDTH", 512),
    ParamDescriptor::percent("REVSPEED", 0),
    ParamDescriptor::percent("REVMIX", 512),
    ParamDescriptor::enumerated("MODE", MODE_NAMES, 0),
];

pub static DESCRIPTOR: EffectDescriptor = EffectDescriptor {
    name: "Cathedral",
    params: &PARAMS,
};

pub mod id {
    pub const TIME: u8 = 0;
    pub const DEPTH: u8 = 1;
    pub const MIX: u8 = 2;
    pub const SIZE: u8 = 3;
    pub const DAMP: u8 = 4;
    pub const DIFF: u8 = 5;
    pub const EARLY: u8 = 6;
    pub const PREDLY: u8 = 7;
    pub const MODRATE: u8 = 8;
    pub const MODDEPTH: u8 = 9;
    pub const WIDTH: u8 = 10;
    pub const REVSPEED: u8 = 11;
    pub const REVMIX: u8 = 12;
    pub const MODE: u8 = 13;
}

// Lengths in samples at 48 kHz
const TANK_LENGTHS: [usize; 4] = [1557, 1617, 1491, 1422];
const TANK_STEREO_SPREAD: usize = 23;
const INPUT_DIFFUSERS: [usize; 4] = [229, 173, 613, 443];
const OUTPUT_DIFFUSERS: [usize; 4] = [225, 341, 441, 556];
const OUTPUT_STEREO_SPREAD: usize = 17;
const EARLY_TAPS: [usize; 8] = [480, 960, 1440, 2400, 3360, 4320, 5760, 7200];
const EARLY_WEIGHTS: [f32; 8] = [1.0, 0.925, 0.85, 0.775, 0.7, 0.625, 0.55, 0.475];

const MAX_PREDELAY_SECONDS: f32 = 0.5;
const MIN_SIZE: f32 = 0.7;
const MAX_SIZE: f32 = 1.3;
const MAX_MOD_SAMPLES: f32 = 12.0;
const MOD_HEADROOM: f32 = 32.0;
const REVERSE_SECONDS: f32 = 2.0;

/// -9 dB makeup so a dense tail sits near the dry level.
const COMPENSATION: f32 = 0.35;
const SHIMMER_BOOST: f32 = 1.5;
const FADE_MS: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReverbMode {
    #[default]
    Cathedral,
    Hall,
    Reverse,
    Shimmer,
}

impl ReverbMode {
    pub fn from_index(index: i32) -> Self {
        match index {
            1 => ReverbMode::Hall,
            2 => ReverbMode::Reverse,
            3 => ReverbMode::Shimmer,
            _ => ReverbMode::Cathedral,
        }
    }

    pub fn topology(&self) -> Topology {
        match self {
            ReverbMode::Cathedral | ReverbMode::Reverse => Topology::Parallel,
            ReverbMode::Hall | ReverbMode::Shimmer => Topology::CrossCoupled,
        }
    }
}

/// The ring recirculates through every line before it decays, so it gets
/// less headroom than the comb bank.
fn saturator_for(topology: Topology) -> Saturator {
    match topology {
        Topology::Parallel => Saturator::new(2.0),
        Topology::CrossCoupled => Saturator::new(1.4),
    }
}

/// Records the wet signal and plays it backwards through two read heads half
/// a window apart. Each head fades in and out with `sin²`, and the two
/// windows sum to one, so segment joins never click.
#[derive(Debug, Clone, Copy)]
struct ReversePlayer {
    lines: [DelayLine; 2],
    window: f32,
    offset: f32,
}

impl ReversePlayer {
    fn allocate<C: Carve>(carve: &mut C, sample_rate: f32) -> Result<Self, EngineError> {
        let capacity = samples_for(REVERSE_SECONDS, sample_rate);
        let left = DelayLine::new(carve.carve(capacity)?);
        let right = DelayLine::new(carve.carve(capacity)?);
        Ok(Self {
            lines: [left, right],
            window: left.max_delay() - 2.0,
            offset: 0.0,
        })
    }

    /// `speed` is playback speed, 1.0 being the recorded rate.
    #[inline]
    fn process(&mut self, memory: &mut [f32], input: [f32; 2], speed: f32) -> [f32; 2] {
        for (line, &x) in self.lines.iter_mut().zip(input.iter()) {
            line.write(memory, x);
        }

        // The head's delay grows faster than the cursor moves, so it walks
        // backwards through what was recorded.
        self.offset += 1.0 + speed;
        if self.offset >= self.window {
            self.offset -= self.window;
        }

        let mut out = [0.0f32; 2];
        for head in [self.offset, (self.offset + 0.5 * self.window) % self.window] {
            let gain = (PI * head / self.window).sin().powi(2);
            for side in [LEFT, RIGHT] {
                out[side] += self.lines[side].read(memory, head + 1.0) * gain;
            }
        }
        out
    }

    fn clear(&mut self, memory: &mut [f32]) {
        for line in self.lines.iter_mut() {
            line.clear(memory);
        }
        self.offset = 0.0;
    }
}

#[derive(Debug, Clone, Copy)]
struct Network {
    predelay: DelayLine,
    input: DiffuserChain<4>,
    tank: Tank<4>,
    output: [DiffuserChain<4>; 2],
    reverse: ReversePlayer,
}

impl Network {
    fn layout<C: Carve>(carve: &mut C, sample_rate: f32) -> Result<Self, EngineError> {
        let predelay_capacity = samples_for(MAX_PREDELAY_SECONDS, sample_rate)
            + scaled_len(EARLY_TAPS[EARLY_TAPS.len() - 1], sample_rate)
            + 2;
        let predelay = DelayLine::new(carve.carve(predelay_capacity)?);

        let input = DiffuserChain::allocate(carve, INPUT_DIFFUSERS.map(|len| scaled_len(len, sample_rate)))?;

        let headroom = (MOD_HEADROOM * rate_scale(sample_rate)).ceil() as usize + 8;
        let capacities = tank_lengths(sample_rate)
            .map(|side| side.map(|len| (len * MAX_SIZE).ceil() as usize + headroom));
        let tank = Tank::allocate(carve, capacities)?;

        let left = DiffuserChain::allocate(carve, OUTPUT_DIFFUSERS.map(|len| scaled_len(len, sample_rate)))?;
        let right = DiffuserChain::allocate(
            carve,
            OUTPUT_DIFFUSERS.map(|len| scaled_len(len + OUTPUT_STEREO_SPREAD, sample_rate)),
        )?;

        let reverse = ReversePlayer::allocate(carve, sample_rate)?;

        Ok(Self {
            predelay,
            input,
            tank,
            output: [left, right],
            reverse,
        })
    }

    fn clear(&mut self, memory: &mut [f32]) {
        self.predelay.clear(memory);
        self.input.clear(memory);
        self.tank.clear(memory);
        for chain in self.output.iter_mut() {
            chain.clear(memory);
        }
        self.reverse.clear(memory);
    }
}

fn tank_lengths(sample_rate: f32) -> [[f32; 4]; 2] {
    [
        TANK_LENGTHS.map(|len| scaled_len(len, sample_rate) as f32),
        TANK_LENGTHS.map(|len| scaled_len(len + TANK_STEREO_SPREAD, sample_rate) as f32),
    ]
}

pub struct CathedralReverb {
    params: ParamSet,
    sample_rate: f32,
    net: Network,

    lengths: [[f32; 4]; 2],
    early_taps: [f32; 8],
    gains: [[f32; 4]; 2],
    delays: [[f32; 4]; 2],

    mode: ReverbMode,
    topology: Topology,
    pending: Option<Topology>,
    fade: LinearRamp,
    saturator: Saturator,

    lfo: Lfo,
    size: SmoothedParam,
    predelay: SmoothedParam,

    feedback: f32,
    damping: f32,
    diffusion: f32,
    depth: f32,
    early: f32,
    mod_depth: f32,
    reverse_speed: f32,
    reverse_mix: f32,
    width: StereoWidth,
    mix: DryWet,
}

impl CathedralReverb {
    pub fn required_memory(sample_rate: f32) -> usize {
        let mut plan = MemoryPlan::new();
        match Network::layout(&mut plan, sample_rate) {
            Ok(_) => plan.total(),
            Err(_) => 0,
        }
    }

    pub fn new<C: Carve>(sample_rate: f32, carve: &mut C) -> Result<Self, EngineError> {
        let net = Network::layout(carve, sample_rate)?;
        let params = ParamSet::new(&DESCRIPTOR);
        let mode = ReverbMode::from_index(params.get(id::MODE));
        let topology = mode.topology();

        let mut reverb = Self {
            params,
            sample_rate,
            net,
            lengths: tank_lengths(sample_rate),
            early_taps: EARLY_TAPS.map(|len| scaled_len(len, sample_rate) as f32),
            gains: [[0.0; 4]; 2],
            delays: [[0.0; 4]; 2],
            mode,
            topology,
            pending: None,
            fade: LinearRamp::new(1.0, FADE_MS, sample_rate),
            saturator: saturator_for(topology),
            lfo: Lfo::new(sample_rate),
            size: SmoothedParam::new(1.0, 50.0, sample_rate),
            predelay: SmoothedParam::new(0.0, 50.0, sample_rate),
            feedback: 0.0,
            damping: 0.5,
            diffusion: 0.5,
            depth: 0.0,
            early: 0.0,
            mod_depth: 0.0,
            reverse_speed: 1.0,
            reverse_mix: 0.0,
            width: StereoWidth::default(),
            mix: DryWet::default(),
        };
        for param in 0..PARAMS.len() as u8 {
            reverb.apply(param);
        }
        reverb.size.reset();
        reverb.predelay.reset();
        Ok(reverb)
    }

    pub fn mode(&self) -> ReverbMode {
        self.mode
    }

    /// Wiring currently running. Lags [`mode`](Self::mode) while a topology
    /// fade is in progress.
    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    fn apply(&mut self, param: u8) {
        let unit = self.params.unit(param);
        match param {
            id::TIME | id::SIZE | id::DAMP => self.update_loop(),
            id::DEPTH => self.depth = unit * unit,
            id::MIX => self.mix = DryWet::from_percent(self.params.get(param)),
            id::DIFF => self.diffusion = 0.3 + 0.4 * unit,
            id::EARLY => self.early = unit,
            id::PREDLY => self
                .predelay
                .set_target(unit * MAX_PREDELAY_SECONDS * self.sample_rate),
            id::MODRATE => self.lfo.set_rate(rate_from_unit(unit)),
            id::MODDEPTH => self.mod_depth = unit * MAX_MOD_SAMPLES * rate_scale(self.sample_rate),
            id::WIDTH => self.width = StereoWidth::from_unit(unit),
            id::REVSPEED => self.reverse_speed = 1.0 + 3.0 * unit,
            id::REVMIX => self.reverse_mix = unit,
            id::MODE => self.set_mode(ReverbMode::from_index(self.params.get(param))),
            _ => {}
        }
    }

    fn update_loop(&mut self) {
        let size = self.params.unit(id::SIZE);
        self.size.set_target(MIN_SIZE + (MAX_SIZE - MIN_SIZE) * size);

        let requested = 0.65 + 0.30 * self.params.unit(id::TIME);
        let feedback = FeedbackCeiling::default().clamp(requested, size);
        let reference = self.reference_length();
        self.gains = self
            .lengths
            .map(|side| side.map(|len| scaled_gain(feedback, len, reference)));
        self.feedback = feedback;

        let damping = AdaptiveDamping::default().apply(self.params.unit(id::DAMP), feedback);
        self.damping = damping_coefficient(damping);
    }

    /// Shortest tank line; it gets the nominal feedback.
    fn reference_length(&self) -> f32 {
        self.lengths[LEFT].iter().copied().fold(f32::MAX, f32::min)
    }

    fn set_mode(&mut self, mode: ReverbMode) {
        self.mode = mode;
        let topology = mode.topology();
        if topology == self.topology {
            // Also cancels a swap that has not happened yet
            self.pending = None;
            self.fade.set_target(1.0);
        } else {
            self.pending = Some(topology);
            self.fade.set_target(0.0);
        }
    }

    fn switch_topology(&mut self, topology: Topology) {
        self.topology = topology;
        self.saturator = saturator_for(topology);
        self.pending = None;
    }
}

impl Effect for CathedralReverb {
    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn set_parameter(&mut self, id: u8, value: i32) {
        if self.params.set(id, value).is_some() {
            self.apply(id);
        }
    }

    fn begin_block(&mut self, memory: &mut [f32]) {
        let Some(topology) = self.pending else {
            return;
        };
        if self.fade.arrived() && self.fade.value() == 0.0 {
            self.net.tank.clear(memory);
            self.switch_topology(topology);
            self.fade.set_target(1.0);
        }
    }

    #[inline]
    fn process_frame(&mut self, memory: &mut [f32], left: f32, right: f32) -> (f32, f32) {
        let size = self.size.next();
        let predelay = self.predelay.next();
        let fade = self.fade.next();
        self.lfo.advance();

        let net = &mut self.net;

        net.predelay.write(memory, mono_sum(left, right));
        let delayed = net.predelay.read(memory, predelay);
        let mut early = [0.0f32; 2];
        for (k, (&tap, &weight)) in self.early_taps.iter().zip(EARLY_WEIGHTS.iter()).enumerate() {
            early[k % 2] += net.predelay.read(memory, predelay + tap) * weight;
        }

        let diffused = net.input.process(memory, delayed, self.diffusion);

        let mod_depth = if self.mode == ReverbMode::Shimmer {
            self.mod_depth * 2.0
        } else {
            self.mod_depth
        };
        for side in [LEFT, RIGHT] {
            for i in 0..4 {
                let phase = spread(i, 4) + side as f32 * 0.125;
                self.delays[side][i] = self.lengths[side][i] * size + self.lfo.value_at(phase) * mod_depth;
            }
        }

        let controls = TankControls {
            delays: &self.delays,
            gains: &self.gains,
            damping: self.damping,
            saturator: self.saturator,
        };
        let tank = net.tank.process(memory, self.topology, [diffused, diffused], &controls);

        let mut tail = [0.0f32; 2];
        for side in [LEFT, RIGHT] {
            tail[side] = net.output[side].process(memory, tank[side] * fade, self.diffusion) * self.depth;
        }
        if self.mode == ReverbMode::Shimmer {
            tail = tail.map(|x| x * SHIMMER_BOOST);
        }

        let reversed = net.reverse.process(memory, tail, self.reverse_speed);
        if self.mode == ReverbMode::Reverse {
            for side in [LEFT, RIGHT] {
                tail[side] = tail[side] * (1.0 - self.reverse_mix) + reversed[side] * self.reverse_mix;
            }
        }

        // Four taps land on each side
        let early_gain = self.early * 0.25;
        let wet_l = soft_clip((tail[LEFT] + early[LEFT] * early_gain) * COMPENSATION);
        let wet_r = soft_clip((tail[RIGHT] + early[RIGHT] * early_gain) * COMPENSATION);
        let (wet_l, wet_r) = self.width.apply(wet_l, wet_r);

        (self.mix.apply(left, wet_l), self.mix.apply(right, wet_r))
    }

    fn reset(&mut self, memory: &mut [f32]) {
        self.net.clear(memory);
        if let Some(topology) = self.pending {
            self.switch_topology(topology);
        }
        self.fade.reset(1.0);
        self.lfo.reset();
        self.size.reset();
        self.predelay.reset();
    }

    fn tail_seconds(&self) -> f32 {
        let sr = self.sample_rate;
        let size = self.size.target().max(self.size.current());
        let loop_seconds = self.reference_length() * size / sr;
        // feedback^k = 1e-3 after k trips round the reference loop
        let decay = if self.feedback > 0.0 {
            loop_seconds * -3.0 / self.feedback.log10()
        } else {
            loop_seconds
        };
        let predelay = self.predelay.target().max(self.predelay.current()) / sr;
        let early = self.early_taps[self.early_taps.len() - 1] / sr;
        let diffusers = (self.net.input.ring_time(self.diffusion)
            + self.net.output[RIGHT].ring_time(self.diffusion)) as f32
            / sr;
        let reverse = if self.mode == ReverbMode::Reverse {
            self.net.reverse.window / sr
        } else {
            0.0
        };
        decay * 1.1 + predelay + early + diffusers + reverse
    }
}
