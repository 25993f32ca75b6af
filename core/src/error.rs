use thiserror::Error;

use crate::types::Side;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("paddle height bounds inverted: min {min} > max {max}")]
    InvertedHeightBounds { min: f64, max: f64 },

    #[error("base paddle height {base} outside [{min}, {max}]")]
    BaseHeightOutOfBounds { base: f64, min: f64, max: f64 },

    #[error("max paddle height {max} does not fit a {canvas} pixel tall arena")]
    PaddleTallerThanArena { max: f64, canvas: f64 },

    #[error("sample count must be at least 1")]
    NoSamples,

    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} is {value}, above the limit of {max}")]
    TooLarge { field: &'static str, value: u64, max: u64 },

    #[error("countdown interval {interval} ms exceeds the {duration} ms match")]
    CountdownSlowerThanMatch { interval: i64, duration: i64 },

    #[error("end grace {grace} ms must lie within [0, {duration}] ms")]
    GraceOutOfRange { grace: i64, duration: i64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("both competitors must be selected")]
    InvalidSelection,

    #[error("competitors must be distinct, got '{0}' twice")]
    SameAsset(String),

    #[error("price series for side {0} is empty")]
    EmptySeries(Side),

    #[error("a match is already {0}; reset before starting another")]
    NotIdle(&'static str),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl MatchError {
    /// Precondition failures are the caller's to fix; nothing was mutated.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            MatchError::InvalidSelection | MatchError::SameAsset(_) | MatchError::EmptySeries(_)
        )
    }
}
