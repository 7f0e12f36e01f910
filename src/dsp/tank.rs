//! Comb / tank network.
//!
//! `N` lines per stereo side, wired one of two ways:
//!
//! ```text
//! Parallel (Schroeder comb bank)          CrossCoupled (figure-8 ring)
//!
//! in_L ──┬─[L0]↺──┐                        in_L ─→[L0]→[L1]→ … →[Ln]─┐
//!        ├─[L1]↺──┼─ Σ / n ─→ out_L             ↑                     │
//!        └─[Ln]↺──┘                             └──[Rn]← … ←[R0]←─────┘
//!                                                               ↑
//! (right side mirrored)                                        in_R
//! ```
//!
//! Parallel lines each feed back into themselves. Cheap, bright, a little
//! metallic. In the ring every line feeds the next and the last line of each
//! side feeds the first line of the other, so left and right tails keep
//! exchanging energy and decorrelate into a smoother decay. The input of a
//! side reaches every line of that side in both topologies. Both topologies
//! use the same lines, so switching between them needs no extra memory.
//!
//! Output of each side is the sum of its active lines scaled so loudness does
//! not follow the number of enabled lines. Lines reading the same delay add
//! in amplitude and are divided by the count `n`; lines spread far enough
//! apart to be uncorrelated add in power and are divided by `√n`. The
//! owner says where between the two its lines sit with
//! [`Tank::set_decorrelation`]. Parallel
//! lines past the active count keep running but are left out of the sum, so
//! the cost per sample stays flat and a line that comes back holds no stale
//! tail.
//!
//! Per-line gains come from [`scaled_gain`]: a line `k` times longer than the
//! reference gets `feedback^k`, so every line (and the ring as a whole) loses
//! the same fraction of energy per second and the tail decays monotonically.

use crate::engine::EngineError;
use crate::memory::Carve;

use super::comb::CombLine;
use super::guard::sanitize;
use super::saturation::Saturator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Topology {
    #[default]
    Parallel,
    CrossCoupled,
}

pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;

/// Feedback for a line of `length` samples when the reference line of
/// `reference` samples gets `feedback`.
#[inline]
pub fn scaled_gain(feedback: f32, length: f32, reference: f32) -> f32 {
    let feedback = sanitize(feedback).clamp(0.0, 1.0);
    if reference <= 0.0 || length <= 0.0 {
        return feedback;
    }
    feedback.powf(length / reference)
}

/// Per-sample controls for one tank step.
#[derive(Debug, Clone, Copy)]
pub struct TankControls<'a, const N: usize> {
    /// Read delay per side and line, in samples.
    pub delays: &'a [[f32; N]; 2],
    /// Feedback gain per side and line.
    pub gains: &'a [[f32; N]; 2],
    /// One-pole damping coefficient shared by every line.
    pub damping: f32,
    pub saturator: Saturator,
}

#[derive(Debug, Clone, Copy)]
pub struct Tank<const N: usize> {
    lines: [[CombLine; N]; 2],
    active: usize,
    decorrelation: f32,
    norm: f32,
}

impl<const N: usize> Tank<N> {
    /// Carve every line with its capacity in samples.
    pub fn allocate<C: Carve>(carve: &mut C, capacities: [[usize; N]; 2]) -> Result<Self, EngineError> {
        let mut lines = [[CombLine::default(); N]; 2];
        for (side, caps) in lines.iter_mut().zip(capacities.iter()) {
            for (line, &capacity) in side.iter_mut().zip(caps.iter()) {
                *line = CombLine::allocate(carve, capacity)?;
            }
        }
        let mut tank = Self {
            lines,
            active: N,
            decorrelation: 0.0,
            norm: 1.0,
        };
        tank.update_norm();
        Ok(tank)
    }

    pub fn active(&self) -> usize {
        self.active
    }

    /// Number of lines per side that take part, `1..=N`.
    pub fn set_active(&mut self, count: usize) {
        self.active = count.clamp(1, N);
        self.update_norm();
    }

    /// 0 when every line carries the same signal, 1 when the lines are
    /// uncorrelated.
    pub fn set_decorrelation(&mut self, amount: f32) {
        self.decorrelation = sanitize(amount).clamp(0.0, 1.0);
        self.update_norm();
    }

    /// Output scale applied to the sum of the active lines.
    pub fn norm(&self) -> f32 {
        self.norm
    }

    fn update_norm(&mut self) {
        let exponent = 1.0 - 0.5 * self.decorrelation;
        self.norm = (self.active as f32).powf(-exponent);
    }

    pub fn max_delay(&self, side: usize, index: usize) -> f32 {
        self.lines[side][index].max_delay()
    }

    #[inline]
    pub fn process(
        &mut self,
        memory: &mut [f32],
        topology: Topology,
        input: [f32; 2],
        controls: &TankControls<'_, N>,
    ) -> [f32; 2] {
        let active = self.active.clamp(1, N);
        let norm = self.norm;
        match topology {
            Topology::Parallel => {
                let mut out = [0.0f32; 2];
                for side in [LEFT, RIGHT] {
                    let mut sum = 0.0;
                    for i in 0..N {
                        let delayed = self.lines[side][i].process(
                            memory,
                            input[side],
                            controls.delays[side][i],
                            controls.gains[side][i],
                            controls.damping,
                            controls.saturator,
                        );
                        if i < active {
                            sum += delayed;
                        }
                    }
                    out[side] = sum * norm;
                }
                out
            }
            Topology::CrossCoupled => {
                // Read every line before writing any, so the ring only ever
                // sees the previous sample's state.
                let mut reads = [[0.0f32; N]; 2];
                let mut out = [0.0f32; 2];
                for side in [LEFT, RIGHT] {
                    for i in 0..active {
                        let read = self.lines[side][i].read_damped(
                            memory,
                            controls.delays[side][i],
                            controls.damping,
                        );
                        reads[side][i] = read;
                        out[side] += read;
                    }
                }

                for side in [LEFT, RIGHT] {
                    for i in 0..active {
                        let feed = if i == 0 {
                            reads[1 - side][active - 1]
                        } else {
                            reads[side][i - 1]
                        };
                        self.lines[side][i].write_guarded(
                            memory,
                            input[side] + feed * controls.gains[side][i],
                            controls.saturator,
                        );
                    }
                }

                [out[LEFT] * norm, out[RIGHT] * norm]
            }
        }
    }

    pub fn clear(&mut self, memory: &mut [f32]) {
        for line in self.lines.iter_mut().flatten() {
            line.clear(memory);
        }
    }
}
