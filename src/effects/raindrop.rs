//! Raindrop: ten stereo delay lines scattered around one base time.
//!
//! Every line reads near the base time, pushed early or late by a fixed
//! per-line "chaos" offset and wobbled by the shared LFO at its own phase.
//! Repeats from lines that land close together smear into a cloud; lines
//! that land apart ring out as separate drops.
//!
//! ```text
//!          ┌─[line 0: base + c0]↺──┐
//! in_L ────┼─[line 1: base + c1]↺──┼── Σ / active ─→ diffusers ─→ width ─→ dry/wet
//!          └─[line 9: base + c9]↺──┘
//! ```
//!
//! Chaos offsets are drawn once per instance from a seeded generator and
//! never re-drawn; a jumping read head would click. LINES only changes how
//! many lines are heard, every line keeps running.
//!
//! With CHAOS and MODINT at zero every line reads the same delay and the
//! lines sum in amplitude. A few milliseconds of spread is enough for them
//! to sum in power instead, and the tank normalization follows.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::dsp::diffuser::DiffuserChain;
use crate::dsp::filter::clamp_coefficient;
use crate::dsp::guard::FeedbackCeiling;
use crate::dsp::lfo::{rate_from_unit, spread, Lfo};
use crate::dsp::mix::{DryWet, StereoWidth};
use crate::dsp::saturation::Saturator;
use crate::dsp::smoothing::SmoothedParam;
use crate::dsp::tank::{scaled_gain, Tank, TankControls, Topology, LEFT, RIGHT};
use crate::engine::{Effect, EngineError};
use crate::memory::{samples_for, Carve, MemoryPlan};
use crate::params::{EffectDescriptor, ParamDescriptor, ParamSet};
use crate::sequencing::{sync_division, TempoClock, SYNC_NAMES};
use crate::MAX_DELAY_SECONDS;

use super::scaled_len;

pub const LINES: usize = 10;

pub static PARAMS: [ParamDescriptor; 12] = [
    ParamDescriptor::percent("TIME", 819),
    ParamDescriptor::percent("DEPTH", 768),
    ParamDescriptor::dry_wet("MIX", 0),
    ParamDescriptor::percent("CHAOS", 512),
    ParamDescriptor::percent("MODINT", 307),
    ParamDescriptor::percent("MODRATE", 102),
    ParamDescriptor::percent("TONE", 512),
    ParamDescriptor::percent("STEREO", 768),
    ParamDescriptor::integer("LINES", 1, LINES as i32, LINES as i32),
    ParamDescriptor::percent("DIFFUSE", 409),
    ParamDescriptor::toggle("FREEZE", 0),
    ParamDescriptor::enumerated("SYNC", SYNC_NAMES, 0),
];

pub static DESCRIPTOR: EffectDescriptor = EffectDescriptor {
    name: "Raindrop",
    params: &PARAMS,
};

pub mod id {
    pub const TIME: u8 = 0;
    pub const DEPTH: u8 = 1;
    pub const MIX: u8 = 2;
    pub const CHAOS: u8 = 3;
    pub const MODINT: u8 = 4;
    pub const MODRATE: u8 = 5;
    pub const TONE: u8 = 6;
    pub const STEREO: u8 = 7;
    pub const LINES: u8 = 8;
    pub const DIFFUSE: u8 = 9;
    pub const FREEZE: u8 = 10;
    pub const SYNC: u8 = 11;
}

/// Seed used by [`RaindropDelay::new`].
pub const DEFAULT_SEED: u64 = 0x5241_494e_4452_4f50;

const MIN_TIME: f32 = 0.1;
const TIME_RANGE: f32 = 2.9;
/// Largest chaos displacement, in seconds either way.
const MAX_CHAOS_SECONDS: f32 = 0.25;
/// Largest modulation swing as a fraction of each line's time.
const MAX_MOD_FRACTION: f32 = 0.1;
const MAX_FEEDBACK: f32 = 0.8;
const MIN_LINE_SECONDS: f32 = 0.01;
/// Spread between lines past which they no longer add coherently.
const DECORRELATED_SECONDS: f32 = 0.002;
const DIFFUSERS: [[usize; 2]; 2] = [[113, 163], [127, 179]];

#[derive(Debug, Clone, Copy)]
struct Network {
    tank: Tank<LINES>,
    diffusers: [DiffuserChain<2>; 2],
}

impl Network {
    fn layout<C: Carve>(carve: &mut C, sample_rate: f32) -> Result<Self, EngineError> {
        let capacity = samples_for(MAX_DELAY_SECONDS, sample_rate);
        let tank = Tank::allocate(carve, [[capacity; LINES]; 2])?;
        let left = DiffuserChain::allocate(carve, DIFFUSERS[LEFT].map(|len| scaled_len(len, sample_rate)))?;
        let right = DiffuserChain::allocate(carve, DIFFUSERS[RIGHT].map(|len| scaled_len(len, sample_rate)))?;
        Ok(Self {
            tank,
            diffusers: [left, right],
        })
    }

    fn clear(&mut self, memory: &mut [f32]) {
        self.tank.clear(memory);
        for chain in self.diffusers.iter_mut() {
            chain.clear(memory);
        }
    }
}

/// Fixed per-line offsets in `[-0.5, 0.5)`, deterministic for a seed.
pub fn chaos_offsets(seed: u64) -> [[f32; LINES]; 2] {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut offsets = [[0.0f32; LINES]; 2];
    for offset in offsets.iter_mut().flatten() {
        *offset = rng.random::<f32>() - 0.5;
    }
    offsets
}

pub struct RaindropDelay {
    params: ParamSet,
    sample_rate: f32,
    net: Network,
    offsets: [[f32; LINES]; 2],
    delays: [[f32; LINES]; 2],
    gains: [[f32; LINES]; 2],

    lfo: Lfo,
    clock: TempoClock,
    time: SmoothedParam,

    feedback: f32,
    damping: f32,
    saturator: Saturator,
    chaos: f32,
    mod_amount: f32,
    diffuse: f32,
    diffusion: f32,
    frozen: bool,
    width: StereoWidth,
    mix: DryWet,
}

impl RaindropDelay {
    pub fn required_memory(sample_rate: f32) -> usize {
        let mut plan = MemoryPlan::new();
        match Network::layout(&mut plan, sample_rate) {
            Ok(_) => plan.total(),
            Err(_) => 0,
        }
    }

    pub fn new<C: Carve>(sample_rate: f32, carve: &mut C) -> Result<Self, EngineError> {
        Self::with_seed(sample_rate, carve, DEFAULT_SEED)
    }

    pub fn with_seed<C: Carve>(sample_rate: f32, carve: &mut C, seed: u64) -> Result<Self, EngineError> {
        let net = Network::layout(carve, sample_rate)?;
        let mut delay = Self {
            params: ParamSet::new(&DESCRIPTOR),
            sample_rate,
            net,
            offsets: chaos_offsets(seed),
            delays: [[0.0; LINES]; 2],
            gains: [[0.0; LINES]; 2],
            lfo: Lfo::new(sample_rate),
            clock: TempoClock::new(),
            time: SmoothedParam::new(1.0, 100.0, sample_rate),
            feedback: 0.0,
            damping: 0.5,
            saturator: Saturator::new(2.0),
            chaos: 0.0,
            mod_amount: 0.0,
            diffuse: 0.0,
            diffusion: 0.5,
            frozen: false,
            width: StereoWidth::default(),
            mix: DryWet::default(),
        };
        for param in 0..PARAMS.len() as u8 {
            delay.apply(param);
        }
        delay.time.reset();
        Ok(delay)
    }

    /// Base delay time the lines are gliding toward, in seconds.
    pub fn target_time(&self) -> f32 {
        self.time.target()
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn active_lines(&self) -> usize {
        self.net.tank.active()
    }

    fn apply(&mut self, param: u8) {
        let unit = self.params.unit(param);
        match param {
            id::TIME | id::SYNC => {
                self.update_time();
                self.update_loop();
            }
            id::DEPTH | id::TONE | id::FREEZE => self.update_loop(),
            id::MIX => self.mix = DryWet::from_percent(self.params.get(param)),
            id::CHAOS => {
                self.chaos = unit;
                self.update_spread();
            }
            id::MODINT => {
                self.mod_amount = unit * MAX_MOD_FRACTION;
                self.update_spread();
            }
            id::MODRATE => self.lfo.set_rate(rate_from_unit(unit)),
            id::STEREO => self.width = StereoWidth::from_unit(unit),
            id::LINES => self.net.tank.set_active(self.params.get(param) as usize),
            id::DIFFUSE => {
                self.diffuse = unit;
                self.diffusion = 0.3 + 0.4 * unit;
            }
            _ => {}
        }
    }

    fn update_time(&mut self) {
        let seconds = match sync_division(self.params.get(id::SYNC)) {
            Some(division) => self.clock.seconds(division),
            None => MIN_TIME + TIME_RANGE * self.params.unit(id::TIME),
        };
        self.time.set_target(seconds.clamp(MIN_TIME, MAX_DELAY_SECONDS));
        self.update_spread();
    }

    fn update_spread(&mut self) {
        let spread = self.chaos * 2.0 * MAX_CHAOS_SECONDS + self.time.target() * self.mod_amount * 2.0;
        self.net.tank.set_decorrelation(spread / DECORRELATED_SECONDS);
    }

    fn update_loop(&mut self) {
        let length = self.time.target() / MAX_DELAY_SECONDS;
        let ceiling = FeedbackCeiling::default();
        self.frozen = self.params.get(id::FREEZE) != 0;
        self.feedback = if self.frozen {
            ceiling.ceiling(length)
        } else {
            ceiling.clamp(MAX_FEEDBACK * self.params.unit(id::DEPTH), length)
        };
        // Darker as feedback rises so long holds do not whistle
        let tone = self.params.unit(id::TONE);
        self.damping = clamp_coefficient(0.3 + 0.4 * tone - 0.15 * self.feedback);
    }
}

impl Effect for RaindropDelay {
    fn params(&self) -> &ParamSet {
        &self.params
    }

    fn set_parameter(&mut self, id: u8, value: i32) {
        if self.params.set(id, value).is_some() {
            self.apply(id);
        }
    }

    #[inline]
    fn process_frame(&mut self, memory: &mut [f32], left: f32, right: f32) -> (f32, f32) {
        let base = self.time.next();
        self.lfo.advance();

        let sr = self.sample_rate;
        let reference = base * sr;
        for side in [LEFT, RIGHT] {
            for i in 0..LINES {
                let seconds = (base + self.offsets[side][i] * self.chaos * 2.0 * MAX_CHAOS_SECONDS).max(MIN_LINE_SECONDS);
                let length = seconds * sr;
                let phase = spread(i, LINES) + side as f32 * 0.25;
                self.delays[side][i] = length * (1.0 + self.lfo.value_at(phase) * self.mod_amount);
                self.gains[side][i] = scaled_gain(self.feedback, length, reference);
            }
        }

        let input = if self.frozen { [0.0, 0.0] } else { [left, right] };
        let controls = TankControls {
            delays: &self.delays,
            gains: &self.gains,
            damping: self.damping,
            saturator: self.saturator,
        };
        let wet = self.net.tank.process(memory, Topology::Parallel, input, &controls);

        let mut out = [0.0f32; 2];
        for side in [LEFT, RIGHT] {
            let diffused = self.net.diffusers[side].process(memory, wet[side], self.diffusion);
            out[side] = wet[side] + (diffused - wet[side]) * self.diffuse;
        }
        let (wet_l, wet_r) = self.width.apply(out[LEFT], out[RIGHT]);

        (self.mix.apply(left, wet_l), self.mix.apply(right, wet_r))
    }

    fn reset(&mut self, memory: &mut [f32]) {
        self.net.clear(memory);
        self.lfo.reset();
        self.time.reset();
    }

    fn set_tempo(&mut self, fixed_bpm: u32) {
        self.clock.set_tempo(fixed_bpm);
        if self.params.get(id::SYNC) != 0 {
            self.update_time();
            self.update_loop();
        }
    }

    fn tempo_tick(&mut self, counter: u32) {
        self.clock.tick(counter);
    }

    fn tail_seconds(&self) -> f32 {
        let base = self.time.target().max(self.time.current());
        let longest = ((base + self.chaos * MAX_CHAOS_SECONDS) * (1.0 + self.mod_amount)).min(MAX_DELAY_SECONDS);
        // feedback^k = 1e-3 after k trips round the base time
        let decay = if self.feedback > 1e-3 {
            base * -3.0 / self.feedback.log10()
        } else {
            0.0
        };
        let ring = self.net.diffusers[RIGHT].ring_time(self.diffusion) as f32 / self.sample_rate;
        decay * 1.1 + longest + ring
    }
}
