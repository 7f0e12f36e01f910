use super::error::EngineError;

pub const SUPPORTED_SAMPLE_RATES: &[u32] = &[44_100, 48_000, 88_200, 96_000];

/// Sample rate and channel geometry an engine runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// 1 (mono, copied to both sides) or 2.
    pub input_channels: u8,
    /// Always 2.
    pub output_channels: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            input_channels: 2,
            output_channels: 2,
        }
    }
}

impl EngineConfig {
    pub fn stereo(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn mono_in(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            input_channels: 1,
            output_channels: 2,
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !SUPPORTED_SAMPLE_RATES.contains(&self.sample_rate) {
            return Err(EngineError::UnsupportedSampleRate(self.sample_rate));
        }
        if !matches!(self.input_channels, 1 | 2) || self.output_channels != 2 {
            return Err(EngineError::UnsupportedGeometry {
                input: self.input_channels,
                output: self.output_channels,
            });
        }
        Ok(())
    }

    pub fn sample_rate_f32(&self) -> f32 {
        self.sample_rate as f32
    }
}
