//! # unrealgym
//!
//! Multi-agent reinforcement-learning environments on top of a running
//! Unreal Engine instance.
//!
//! ## Overview
//!
//! unrealgym provides:
//! - An ordered agent roster that keeps action spaces, observation spaces
//!   and camera ids aligned while agents join and leave mid-episode
//! - Space construction for discrete, continuous and mixed action types
//! - Batched command dispatch: one round trip to the engine per step
//! - Sensor fusion into Color, Depth, Mask, Rgbd, MaskDepth, ColorMask and
//!   Pose observation tensors
//! - Pairwise relative geometry (distance, bearing, collisions) for task layers
//!
//! The engine itself sits behind the [`env::SensorService`] trait.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use unrealgym::prelude::*;
//! use unrealgym_envs::{demo_setting, MockUnreal};
//!
//! let setting = demo_setting(2);
//! let service = MockUnreal::from_setting(&setting, (160, 120));
//! let mut env = UnrealEnv::new(service, setting, EnvConfig::default())?;
//!
//! let obs = env.reset()?;
//! let out = env.step(&[Some(AgentAction::Discrete(0)), None])?;
//! ```

pub mod agent;
pub mod augment;
pub mod config;
pub mod dispatch;
pub mod env;
pub mod fusion;
pub mod geometry;
pub mod log;
pub mod sampling;
pub mod spaces;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::agent::{AgentCategory, AgentConfig, AgentRecord, AgentRegistry, Roster};
    pub use crate::config::{ActionType, EnvConfig, EnvSetting, ObservationMode};
    pub use crate::dispatch::{map_actions, AgentAction, CommandBatch, MixedAction, SubAction};
    pub use crate::env::{
        Command, EpisodeInfo, EpisodeStats, MultiAgentEnv, SensorService, Session, StepInfo,
        StepOutput, UnrealEnv,
    };
    pub use crate::fusion::{compose_observation, project_for_display, CameraFlags, SensorBatch};
    pub use crate::geometry::{Pose, RelativeGeometry, RelativeMetrics};
    pub use crate::log::{CompositeLogger, ConsoleLogger, JsonlLogger, MetricLogger, NoOpLogger};
    pub use crate::spaces::{ActionSpace, Discrete, ObservationSpace, Space};
    pub use crate::{Result, UnrealError};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum UnrealError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Agent not found: {0}")]
    NotFound(String),

    #[error("Index {index} out of range for {vocabulary} vocabulary of length {len}")]
    IndexOutOfRange {
        vocabulary: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Sensor service error: {0}")]
    Service(String),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Setting parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, UnrealError>;
