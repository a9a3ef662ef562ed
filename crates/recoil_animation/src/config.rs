//! Animation configuration
//!
//! Springs and playback options can be described in TOML (or any serde
//! format) and turned into a [`Spring`] / [`SpringAnimation`]:
//!
//! ```toml
//! delay = 0.1
//! repeats = true
//! autoreverse = true
//!
//! [spring]
//! preset = "bouncy"
//! duration = 0.6
//! ```
//!
//! The `[spring]` table takes one of four shapes:
//!
//! | keys                                 | meaning                      |
//! |--------------------------------------|------------------------------|
//! | `preset`, `duration?`, `extra_bounce?` | named preset               |
//! | `stiffness`, `damping_ratio`, `mass?`  | physical parameters        |
//! | `response`, `damping_ratio`, `mass?`   | response-based parameters  |
//! | `duration`, `bounce?`                  | perceptual parameters      |
//!
//! [`SpringAnimation`]: crate::animation::SpringAnimation

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpringError};
use crate::spring::Spring;

/// Named spring presets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpringPreset {
    Interactive,
    Bouncy,
    Smooth,
    Snappy,
    NonAnimated,
}

impl SpringPreset {
    pub fn all() -> &'static [SpringPreset] {
        &[
            SpringPreset::Interactive,
            SpringPreset::Bouncy,
            SpringPreset::Smooth,
            SpringPreset::Snappy,
            SpringPreset::NonAnimated,
        ]
    }

    pub fn id(&self) -> &'static str {
        match self {
            SpringPreset::Interactive => "interactive",
            SpringPreset::Bouncy => "bouncy",
            SpringPreset::Smooth => "smooth",
            SpringPreset::Snappy => "snappy",
            SpringPreset::NonAnimated => "non_animated",
        }
    }

    /// Build the preset. `interactive` and `non_animated` ignore both arguments.
    pub fn to_spring(&self, duration: f64, extra_bounce: f64) -> Result<Spring> {
        match self {
            SpringPreset::Interactive => Ok(Spring::interactive()),
            SpringPreset::NonAnimated => Ok(Spring::non_animated()),
            SpringPreset::Bouncy => Spring::try_with_response(duration, 0.7 - extra_bounce, 1.0),
            SpringPreset::Smooth => Spring::try_with_response(duration, 1.0 - extra_bounce, 1.0),
            SpringPreset::Snappy => Spring::try_with_response(duration, 0.85 - extra_bounce, 1.0),
        }
    }
}

impl FromStr for SpringPreset {
    type Err = SpringError;

    fn from_str(s: &str) -> Result<Self> {
        SpringPreset::all()
            .iter()
            .find(|preset| preset.id() == s)
            .copied()
            .ok_or_else(|| SpringError::UnknownPreset(s.to_string()))
    }
}

/// Serializable description of a [`Spring`]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SpringConfig {
    Preset {
        preset: String,
        #[serde(default = "default_duration")]
        duration: f64,
        #[serde(default)]
        extra_bounce: f64,
    },
    Stiffness {
        stiffness: f64,
        damping_ratio: f64,
        #[serde(default = "default_mass")]
        mass: f64,
    },
    Response {
        response: f64,
        damping_ratio: f64,
        #[serde(default = "default_mass")]
        mass: f64,
    },
    Duration {
        duration: f64,
        #[serde(default)]
        bounce: f64,
    },
}

fn default_duration() -> f64 {
    0.5
}

fn default_mass() -> f64 {
    1.0
}

impl SpringConfig {
    pub fn to_spring(&self) -> Result<Spring> {
        match self {
            SpringConfig::Preset {
                preset,
                duration,
                extra_bounce,
            } => preset.parse::<SpringPreset>()?.to_spring(*duration, *extra_bounce),
            SpringConfig::Stiffness {
                stiffness,
                damping_ratio,
                mass,
            } => Spring::try_with_stiffness(*stiffness, *damping_ratio, *mass),
            SpringConfig::Response {
                response,
                damping_ratio,
                mass,
            } => Spring::try_with_response(*response, *damping_ratio, *mass),
            SpringConfig::Duration { duration, bounce } => {
                Spring::try_with_duration(*duration, *bounce)
            }
        }
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        SpringConfig::Preset {
            preset: SpringPreset::Smooth.id().to_string(),
            duration: default_duration(),
            extra_bounce: 0.0,
        }
    }
}

impl From<Spring> for SpringConfig {
    fn from(spring: Spring) -> Self {
        SpringConfig::Response {
            response: spring.response(),
            damping_ratio: spring.damping_ratio(),
            mass: spring.mass(),
        }
    }
}

/// Spring plus playback options for a [`SpringAnimation`]
///
/// [`SpringAnimation`]: crate::animation::SpringAnimation
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AnimationConfig {
    #[serde(default)]
    pub spring: SpringConfig,
    /// Seconds to wait before a plain `start()` begins running
    #[serde(default)]
    pub delay: f64,
    #[serde(default)]
    pub repeats: bool,
    #[serde(default)]
    pub autoreverse: bool,
    #[serde(default)]
    pub auto_starts: bool,
    #[serde(default)]
    pub integralize_values: bool,
}

impl AnimationConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: AnimationConfig = toml::from_str(source)?;
        config.validate()?;
        tracing::debug!(?config, "animation config loaded");
        Ok(config)
    }

    /// Check the spring parameters and delay without building anything
    pub fn validate(&self) -> Result<()> {
        if !(self.delay >= 0.0) {
            return Err(SpringError::NegativeDelay(self.delay));
        }
        self.spring.to_spring().map(|_| ())
    }
}
