//! Parameter surface.
//!
//! Hosts talk to an engine in small integers: a parameter id and a raw value
//! inside the parameter's declared `[min, max]`. The engine stores the raw
//! value (clamped, never rejected) so `get` always returns exactly what the
//! last `set` landed on, and derives physical units from it on demand.
//!
//! | kind      | raw range    | unit value                      |
//! |-----------|--------------|---------------------------------|
//! | `Percent` | `0..=1023`   | `raw / 1023`                    |
//! | `DryWet`  | `-100..=100` | `(raw + 100) / 200`             |
//! | `Enum`    | `0..=k`      | index, with a display name      |
//! | `Integer` | `min..=max`  | the integer itself              |
//! | `Toggle`  | `0..=1`      | off / on                        |

/// Upper bound on parameters per engine.
pub const MAX_PARAMS: usize = 16;

pub const PERCENT_MAX: i32 = 1023;

pub const TOGGLE_NAMES: &[&str] = &["OFF", "ON"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Percent,
    DryWet,
    Enum(&'static [&'static str]),
    Integer,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub min: i32,
    pub max: i32,
    pub init: i32,
    pub kind: ParamKind,
}

impl ParamDescriptor {
    pub const fn percent(name: &'static str, init: i32) -> Self {
        Self {
            name,
            min: 0,
            max: PERCENT_MAX,
            init,
            kind: ParamKind::Percent,
        }
    }

    pub const fn dry_wet(name: &'static str, init: i32) -> Self {
        Self {
            name,
            min: -100,
            max: 100,
            init,
            kind: ParamKind::DryWet,
        }
    }

    pub const fn enumerated(name: &'static str, names: &'static [&'static str], init: i32) -> Self {
        Self {
            name,
            min: 0,
            max: names.len() as i32 - 1,
            init,
            kind: ParamKind::Enum(names),
        }
    }

    pub const fn integer(name: &'static str, min: i32, max: i32, init: i32) -> Self {
        Self {
            name,
            min,
            max,
            init,
            kind: ParamKind::Integer,
        }
    }

    pub const fn toggle(name: &'static str, init: i32) -> Self {
        Self {
            name,
            min: 0,
            max: 1,
            init,
            kind: ParamKind::Toggle,
        }
    }

    #[inline]
    pub fn clamp(&self, raw: i32) -> i32 {
        raw.clamp(self.min, self.max)
    }

    /// Raw value mapped onto `0.0..=1.0` across the declared range.
    #[inline]
    pub fn unit(&self, raw: i32) -> f32 {
        let span = (self.max - self.min) as f32;
        if span <= 0.0 {
            return 0.0;
        }
        (self.clamp(raw) - self.min) as f32 / span
    }

    /// Display name for enumerated and toggle values.
    pub fn display(&self, raw: i32) -> Option<&'static str> {
        let names = match self.kind {
            ParamKind::Enum(names) => names,
            ParamKind::Toggle => TOGGLE_NAMES,
            _ => return None,
        };
        names.get((self.clamp(raw) - self.min) as usize).copied()
    }
}

/// Name and parameter table of one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectDescriptor {
    pub name: &'static str,
    pub params: &'static [ParamDescriptor],
}

impl EffectDescriptor {
    pub fn param(&self, id: u8) -> Option<&'static ParamDescriptor> {
        self.params.get(id as usize)
    }

    pub fn find(&self, name: &str) -> Option<u8> {
        self.params
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
            .map(|i| i as u8)
    }
}

/// Current raw values for one engine instance.
#[derive(Debug, Clone, Copy)]
pub struct ParamSet {
    descriptor: &'static EffectDescriptor,
    values: [i32; MAX_PARAMS],
}

impl ParamSet {
    pub fn new(descriptor: &'static EffectDescriptor) -> Self {
        debug_assert!(descriptor.params.len() <= MAX_PARAMS);
        let mut values = [0; MAX_PARAMS];
        for (value, param) in values.iter_mut().zip(descriptor.params.iter()) {
            *value = param.clamp(param.init);
        }
        Self { descriptor, values }
    }

    pub fn descriptor(&self) -> &'static EffectDescriptor {
        self.descriptor
    }

    pub fn len(&self) -> usize {
        self.descriptor.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptor.params.is_empty()
    }

    /// Store `raw` clamped to the declared range. Returns the stored value,
    /// or `None` for an unknown id.
    pub fn set(&mut self, id: u8, raw: i32) -> Option<i32> {
        let param = self.descriptor.param(id)?;
        let value = param.clamp(raw);
        self.values[id as usize] = value;
        Some(value)
    }

    /// Raw value of `id`; unknown ids read as 0.
    pub fn get(&self, id: u8) -> i32 {
        if (id as usize) < self.len() {
            self.values[id as usize]
        } else {
            0
        }
    }

    /// `0.0..=1.0` view of `id`.
    pub fn unit(&self, id: u8) -> f32 {
        match self.descriptor.param(id) {
            Some(param) => param.unit(self.values[id as usize]),
            None => 0.0,
        }
    }

    pub fn display(&self, id: u8, raw: i32) -> Option<&'static str> {
        self.descriptor.param(id)?.display(raw)
    }

    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            effect: self.descriptor.name.to_string(),
            values: self.values[..self.len()].to_vec(),
        }
    }
}

/// Owned copy of an engine's raw values, for storing outside the audio path.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamSnapshot {
    pub effect: String,
    pub values: Vec<i32>,
}
