//! Agents and the roster that controls them.
//!
//! The roster is one ordered collection of [`AgentRecord`]s. Each record
//! carries its own action space, observation space and camera id, so the
//! per-agent views handed to policies can never drift out of alignment.

mod config;
mod registry;
mod roster;

pub use config::{AgentCategory, AgentConfig, ContinuousBounds, NO_CAMERA};
pub use registry::{AgentRecord, AgentRegistry};
pub use roster::Roster;
