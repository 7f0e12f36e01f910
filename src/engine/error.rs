use thiserror::Error;

/// Reasons an engine cannot be brought up. Only initialization and memory
/// carving return these; the render path never fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unsupported sample rate {0} Hz")]
    UnsupportedSampleRate(u32),

    #[error("unsupported channel geometry: {input} in / {output} out")]
    UnsupportedGeometry { input: u8, output: u8 },

    #[error("no delay memory was provided")]
    MemoryMissing,

    #[error("delay memory too small: need {required} samples, got {provided}")]
    MemoryTooSmall { required: usize, provided: usize },

    #[error("unknown effect `{0}`")]
    UnknownEffect(String),
}
