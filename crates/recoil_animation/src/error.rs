//! Animation error types

use thiserror::Error;

/// Invalid spring or animation parameters
#[derive(Error, Debug)]
pub enum SpringError {
    /// Stiffness must be strictly positive
    #[error("spring stiffness must be greater than 0, got {0}")]
    NonPositiveStiffness(f64),

    /// The stiffness form needs a strictly positive damping ratio
    #[error("spring damping ratio must be greater than 0, got {0}")]
    NonPositiveDampingRatio(f64),

    /// Damping ratio below zero
    #[error("spring damping ratio must be 0 or greater, got {0}")]
    NegativeDampingRatio(f64),

    /// Response below zero
    #[error("spring response must be 0 or greater, got {0}")]
    NegativeResponse(f64),

    /// Mass must be strictly positive
    #[error("spring mass must be greater than 0, got {0}")]
    NonPositiveMass(f64),

    /// Start delay below zero
    #[error("animation delay must be 0 or greater, got {0}")]
    NegativeDelay(f64),

    /// NaN or infinite parameter
    #[error("spring parameter `{name}` must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    /// Unknown preset name in a config file
    #[error("unknown spring preset: {0}")]
    UnknownPreset(String),

    /// Config file could not be parsed
    #[error("invalid animation config: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for spring and animation construction
pub type Result<T> = std::result::Result<T, SpringError>;
