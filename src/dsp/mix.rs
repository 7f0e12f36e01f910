//! Dry/wet mixing and stereo width.

/*
Output Stage
============

The last step of every engine turns the processed ("wet") stereo pair and
the incoming ("dry") pair into what the host receives.

Vocabulary
----------

  balance       Host-facing signed percent, -100..100, mapped onto 0..1:
                  balance = (raw + 100) / 200
                  -100  →  0.0  all dry
                     0  →  0.5  equal
                   100  →  1.0  all wet

  dry/wet       dry = input as received, wet = engine output.
                A linear crossfade keeps the weights summing to 1.0:
                  out = dry × (1 - balance) + wet × balance

  mid/side      A stereo pair re-expressed as what both channels share
                (mid) and what differs between them (side):
                  mid  = (L + R) / 2
                  side = (L - R) / 2
                  L = mid + side,  R = mid - side

  width         Scales the side signal only.
                  width 0.0  →  mono (side removed)
                  width 1.0  →  unchanged
                  width 2.0  →  side doubled, very wide
                Mid is untouched, so the mono sum never changes level.


Linear vs Equal-Power
---------------------

A linear crossfade dips in perceived loudness around balance = 0.5 when
dry and wet are uncorrelated. For an effect return that dip is usually
wanted: the middle of the knob should not be louder than either end. The
weights summing to 1.0 also means two full-scale signals can never sum past
full scale.
*/

/// Average of a stereo pair.
#[inline]
pub fn mono_sum(left: f32, right: f32) -> f32 {
    (left + right) * 0.5
}

/// Dry and wet gains derived from a signed percent balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DryWet {
    pub dry: f32,
    pub wet: f32,
}

impl DryWet {
    /// `balance` in `0.0..=1.0`, 1.0 being fully wet.
    pub fn from_balance(balance: f32) -> Self {
        let balance = if balance.is_finite() { balance.clamp(0.0, 1.0) } else { 0.5 };
        Self {
            dry: 1.0 - balance,
            wet: balance,
        }
    }

    /// Host signed percent, `-100..=100`.
    pub fn from_percent(raw: i32) -> Self {
        Self::from_balance((raw.clamp(-100, 100) + 100) as f32 / 200.0)
    }

    #[inline]
    pub fn apply(&self, dry: f32, wet: f32) -> f32 {
        dry * self.dry + wet * self.wet
    }
}

impl Default for DryWet {
    fn default() -> Self {
        Self::from_balance(0.5)
    }
}

/// Mid/side width, `0.0..=2.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StereoWidth {
    width: f32,
}

impl StereoWidth {
    pub const MAX: f32 = 2.0;

    pub fn new(width: f32) -> Self {
        let width = if width.is_finite() { width.clamp(0.0, Self::MAX) } else { 1.0 };
        Self { width }
    }

    /// Width from a `0..1` knob, where the middle of travel leaves the image
    /// untouched.
    pub fn from_unit(unit: f32) -> Self {
        Self::new(unit * Self::MAX)
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    #[inline]
    pub fn apply(&self, left: f32, right: f32) -> (f32, f32) {
        let mid = (left + right) * 0.5;
        let side = (left - right) * 0.5 * self.width;
        (mid + side, mid - side)
    }
}

impl Default for StereoWidth {
    fn default() -> Self {
        Self::new(1.0)
    }
}
