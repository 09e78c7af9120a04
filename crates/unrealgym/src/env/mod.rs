//! Environment traits, the engine seam and wrappers.
//!
//! [`UnrealEnv`] drives a [`SensorService`] through reset and step;
//! [`MultiAgentEnv`] lets wrappers such as [`EpisodeStats`] compose over it.

mod service;
mod session;
mod traits;
mod unreal;
mod wrappers;

pub use service::{Command, SensorService};
pub use session::Session;
pub use traits::{EpisodeInfo, MultiAgentEnv, StepInfo, StepOutput};
pub use unreal::UnrealEnv;
pub use wrappers::{EpisodeStats, PEAK_COLLISIONS};
