//! Recoil Animation System
//!
//! Spring physics and a per-frame spring animation driver.
//!
//! # Features
//!
//! - **Spring Model**: damped harmonic oscillator built from response, stiffness
//!   or duration/bounce, with a closed-form settling estimate
//! - **Spring Animations**: drive any [`VectorQuantity`](recoil_core::VectorQuantity)
//!   with retargeting, reversal, repeats and delayed starts
//! - **Frame Scheduler**: explicit, injectable tick source for running animations
//! - **Configuration**: springs and playback options from TOML

pub mod animation;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod spring;

pub use animation::{AnimationEvent, AnimationState, SpringAnimation, StopPosition};
pub use config::{AnimationConfig, SpringConfig, SpringPreset};
pub use error::{Result, SpringError};
pub use scheduler::{
    AnimationId, CancellationToken, FrameScheduler, FrameTick, SchedulerHandle, SharedTicker,
};
pub use spring::{Spring, DEFAULT_SETTLING_EPSILON};
