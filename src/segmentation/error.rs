use thiserror::Error;

/// Errors raised by the ViBe background model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VibeError {
    /// Frame does not match the dimensions the model was built for
    #[error("frame is {}x{}, model expects {}x{}", actual.0, actual.1, expected.0, expected.1)]
    InvalidDimension {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Sample address outside the store
    #[error("sample ({x}, {y}) slot {slot} is outside the model")]
    SampleOutOfRange { x: u32, y: u32, slot: usize },
}

pub type Result<T> = std::result::Result<T, VibeError>;
