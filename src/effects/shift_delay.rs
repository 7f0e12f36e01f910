//! Frequency-shifting dub delay.
//!
//! ```text
//!  in ──(+)──→ [delay line] ──┬──────────────────────────────────→ tilt ─→ wet
//!        ↑                    │
//!        └─ sat ← ×fb ← lo-fi ← low cut ← damp ← shifter ←┘
//! ```
//!
//! Inside the loop there is only ever cut: the damping lowpass darkens as
//! feedback rises and the low cut keeps the shifter's band edges from
//! piling up. TONE above center brightens the wet output instead, so no
//! frequency ever sees a loop gain above the feedback amount.
//!
//! Every repeat passes through the shifter once more, so with DIRECT set to
//! `UP` or `DOWN` the echoes spiral away from the source pitch. The right
//! side's shifter oscillator runs SPREAD of a quarter cycle ahead of the
//! left, and WANDER drifts the two read heads a quarter LFO cycle apart.

use std::f32::consts::TAU;

use crate::dsp::delay::DelayLine;
use crate::dsp::filter::{damping_coefficient, OnePole};
use crate::dsp::guard::{bound, flush_denormal, sanitize, AdaptiveDamping, FeedbackCeiling};
use crate::dsp::lfo::Lfo;
use crate::dsp::mix::{DryWet, StereoWidth};
use crate::dsp::saturation::{bit_crush, SampleHold, Saturator};
use crate::dsp::shifter::{FrequencyShifter, ShiftDirection, MAX_SHIFT_HZ};
use crate::dsp::smoothing::SmoothedParam;
use crate::dsp::tank::{LEFT, RIGHT};
use crate::engine::{Effect, EngineError};
use crate::memory::{samples_for, Carve, MemoryPlan};
use crate::params::{EffectDescriptor, ParamDescriptor, ParamSet};
use crate::sequencing::{sync_division, TempoClock, SYNC_NAMES};
use crate::MAX_DELAY_SECONDS;

pub static PARAMS: [ParamDescriptor; 11] = [
    ParamDescriptor::percent("TIME", 512),
    ParamDescriptor::percent("FEEDBCK", 614),
    ParamDescriptor::dry_wet("MIX", 0),
    ParamDescriptor::percent("SHIFT", 307),
    ParamDescriptor::enumerated("DIRECT", ShiftDirection::NAMES, 1),
    ParamDescriptor::percent("TONE", 409),
    ParamDescriptor::percent("STEREO", 768),
    ParamDescriptor::percent("WANDER", 256),
    ParamDescriptor::enumerated("SYNC", SYNC_NAMES, 3),
    ParamDescriptor::percent("LOFI", 205),
    ParamDescriptor::percent("SPREAD", 256),
];

pub static DESCRIPTOR: EffectDescriptor = EffectDescriptor {
    name: "ShiftDelay",
    params: &PARAMS,
};

pub mod id {
    pub const TIME: u8 = 0;
    pub const FEEDBCK: u8 = 1;
    pub const MIX: u8 = 2;
    pub const SHIFT: u8 = 3;
    pub const DIRECT: u8 = 4;
    pub const TONE: u8 = 5;
    pub const STEREO: u8 = 6;
    pub const WANDER: u8 = 7;
    pub const SYNC: u8 = 8;
    pub const LOFI: u8 = 9;
    pub const SPREAD: u8 = 10;
}

const MIN_TIME: f32 = 0.01;
const MIN_WANDER_HZ: f32 = 0.1;
const WANDER_RANGE_HZ: f32 = 2.9;
const MAX_WANDER_DEPTH: f32 = 0.15;
const LOW_CUT_HZ: f32 = 40.0;

/// Lo-fi degradation of one side's feedback path.
#[derive(Debug, Clone, Copy, Default)]
struct LoFi {
    hold: SampleHold,
}

impl LoFi {
    /// `amount` 0 is transparent, 1 is 4 bits held for 8 samples.
    #[inline]
    fn process(&mut self, sample: f32, amount: f32) -> f32 {
        let bits = 16.0 - 12.0 * amount;
        let hold = 1.0 + 7.0 * amount;
        let crushed = self.hold.process(bit_crush(sample, bits), hold);
        sample + (crushed - sample) * amount
    }

    fn reset(&mut self) {
        self.hold.reset();
    }
}

/// One side of the loop.
#[derive(Debug, Clone, Copy)]
struct Channel {
    line: DelayLine,
    shifter: FrequencyShifter,
    damp: OnePole,
    low_cut: OnePole,
    tone: OnePole,
    lofi: LoFi,
}

impl Channel {
    fn allocate<C: Carve>(carve: &mut C, sample_rate: f32) -> Result<Self, EngineError> {
        Ok(Self {
            line: DelayLine::new(carve.carve(samples_for(MAX_DELAY_SECONDS, sample_rate))?),
            shifter: FrequencyShifter::new(sample_rate),
            damp: OnePole::new(),
            low_cut: OnePole::new(),
            tone: OnePole::new(),
            lofi: LoFi::default(),
        })
    }

    fn clear(&mut self, memory: &mut [f32]) {
        self.line.clear(memory);
        self.shifter.reset();
        self.damp.reset();
        self.low_cut.reset();
        self.tone.reset();
        self.lofi.reset();
    }
}

fn layout<C: Carve>(carve: &mut C, sample_rate: f32) -> Result<[Channel; 2], EngineError> {
    let left = Channel::allocate(carve, sample_rate)?;
    let right = Channel::allocate(carve, sample_rate)?;
    Ok([left, right])
}

pub struct ShiftDelay {
    params: ParamSet,
    sample_rate: f32,
    channels: [Channel; 2],

    lfo: Lfo,
    clock: TempoClock,
    time: SmoothedParam,

    feedback: f32,
    shift_hz: f32,
    direction: ShiftDirection,
    tone: f32,
    damping: f32,
    low_cut: f32,
    wander: f32,
    lofi: f32,
    spread: f32,
    saturator: Saturator,
    width: StereoWidth,
    mix: DryWet,
}

impl ShiftDelay {
    pub fn required_memory(sample_rate: f32) -> usize {
        let mut plan = MemoryPlan::new();
        match layout(&mut plan, sample_rate) {
            Ok(_) => plan.total(),
            Err(_) => 0,
        }
    }

    pub fn new<C: Carve>(sample_rate: f32, carve: &mut C) -> Result<Self, EngineError> {
        let channels = layout(carve, sample_rate)?;
        let mut delay = Self {
            params: ParamSet::new(&DESCRIPTOR),
            sample_rate,
            channels,
            lfo: Lfo::new(sample_rate),
            clock: TempoClock::new(),
            time: SmoothedParam::new(0.5, 100.0, sample_rate),
            feedback: 0.0,
            shift_hz: 0.0,
            direction: ShiftDirection::default(),
            tone: 0.5,
            damping: 0.5,
            low_cut: 1.0 - (-TAU * LOW_CUT_HZ / sample_rate).exp(),
            wander: 0.0,
            lofi: 0.0,
            spread: 0.0,
            saturator: Saturator::new(2.0),
            width: StereoWidth::default(),
            mix: DryWet::default(),
        };
        for param in 0..PARAMS.len() as u8 {
            delay.apply(param);
        }
        delay.time.reset();
        Ok(delay)
    }

    /// Delay time the heads are gliding toward, in seconds.
    pub fn target_time(&self) -> f32 {
        self.time.target()
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn direction(&self) -> ShiftDirection {
        self.direction
    }

    fn apply(&mut self, param: u8) {
        let unit = self.params.unit(param);
        match param {
            id::TIME | id::SYNC => {
                self.update_time();
                self.update_loop();
            }
            id::FEEDBCK => self.update_loop(),
            id::MIX => self.mix = DryWet::from_percent(self.params.get(param)),
            id::SHIFT => self.shift_hz = unit * MAX_SHIFT_HZ,
            id::DIRECT => self.direction = ShiftDirection::from_index(self.params.get(param)),
            id::TONE => {
                self.tone = unit;
                self.update_loop();
            }
            id::STEREO => self.width = StereoWidth::from_unit(unit),
            id::WANDER => {
                self.wander = unit * MAX_WANDER_DEPTH;
                self.lfo.set_rate(MIN_WANDER_HZ + WANDER_RANGE_HZ * unit);
            }
            id::LOFI => self.lofi = unit,
            id::SPREAD => self.spread = unit * 0.25,
            _ => {}
        }
    }

    fn update_time(&mut self) {
        let seconds = match sync_division(self.params.get(id::SYNC)) {
            Some(division) => self.clock.seconds(division),
            None => MIN_TIME + (MAX_DELAY_SECONDS - MIN_TIME) * self.params.unit(id::TIME),
        };
        self.time.set_target(seconds.clamp(MIN_TIME, MAX_DELAY_SECONDS));
    }

    fn update_loop(&mut self) {
        let length = self.time.target() / MAX_DELAY_SECONDS;
        self.feedback = FeedbackCeiling::default().clamp(self.params.unit(id::FEEDBCK), length);
        let darkness = AdaptiveDamping::default().apply(1.0 - self.tone, self.feedback);
        self.damping = damping_coefficient(darkness);
    }

    /// Lowpass coefficient inside the loop.
    pub fn damping(&self) -> f32 {
        self.damping
    }
}

impl Effect for ShiftDelay {
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
        let time = self.time.next() * self.sample_rate;
        self.lfo.advance();

        let input = [left, right];
        let mut wet = [0.0f32; 2];
        for side in [LEFT, RIGHT] {
            let channel = &mut self.channels[side];
            let offset = side as f32 * 0.25;
            let delay = time * (1.0 + self.lfo.value_at(offset) * self.wander);
            let delayed = sanitize(channel.line.read(memory, delay));

            let phase = if side == RIGHT { self.spread } else { 0.0 };
            let shifted = channel.shifter.process(delayed, self.shift_hz, self.direction, phase);
            let damped = channel.damp.lowpass(shifted, self.damping);
            let cut = channel.low_cut.highpass(damped, self.low_cut);
            let degraded = channel.lofi.process(cut, self.lofi);

            let write = self.saturator.process(sanitize(input[side] + degraded * self.feedback));
            channel.line.write(memory, flush_denormal(bound(write)));
            wet[side] = channel.tone.tilt(delayed, self.tone);
        }

        let (wet_l, wet_r) = self.width.apply(wet[LEFT], wet[RIGHT]);
        (self.mix.apply(left, wet_l), self.mix.apply(right, wet_r))
    }

    fn reset(&mut self, memory: &mut [f32]) {
        for channel in self.channels.iter_mut() {
            channel.clear(memory);
        }
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
        let time = self.time.target().max(self.time.current()) * (1.0 + self.wander);
        // feedback^k = 1e-3 after k repeats
        let repeats = if self.feedback > 1e-3 {
            -3.0 / self.feedback.log10() * 1.1
        } else {
            0.0
        };
        time * (repeats + 1.0)
    }
}
