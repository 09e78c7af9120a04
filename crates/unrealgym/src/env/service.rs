//! The seam between the environment and a running engine instance.

use crate::fusion::{CameraFlags, SensorBatch};
use crate::Result;
use serde::{Deserialize, Serialize};

/// One engine command of a batched round trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Apply a move vector (`[angle, velocity]` for walkers, 4 values for drones)
    Move { agent: String, values: Vec<f32> },
    /// Turn the agent's head camera, mounted at `location` relative to the body
    Head {
        agent: String,
        location: [f32; 3],
        rotation: Vec<f32>,
    },
    /// Play a named animation
    Animate { agent: String, animation: String },
}

impl Command {
    pub fn agent(&self) -> &str {
        match self {
            Command::Move { agent, .. } | Command::Head { agent, .. } | Command::Animate { agent, .. } => agent,
        }
    }
}

/// Actuator and sensor access to the engine.
///
/// Every call is a synchronous round trip. Failures are reported as
/// [`crate::UnrealError::Service`] and abort the operation that issued them.
///
/// Camera ids are dense: destroying an entity that owns camera `c` shifts
/// every camera above `c` down by one, and spawning an entity with a camera
/// appends it at id `camera_count()`.
pub trait SensorService: Send {
    /// Deliver all commands in order, in one round trip.
    fn send_batched_commands(&mut self, commands: &[Command]) -> Result<()>;

    /// Read poses and the requested image channels for every named agent.
    ///
    /// `agents` and `cam_ids` are aligned; a negative camera id means the
    /// agent has no viewpoint.
    fn read_batch(&mut self, agents: &[&str], cam_ids: &[i32], flags: CameraFlags) -> Result<SensorBatch>;

    fn spawn_entity(&mut self, class_name: &str, name: &str, location: [f32; 3]) -> Result<()>;

    fn destroy_entity(&mut self, name: &str) -> Result<()>;

    fn camera_count(&mut self) -> Result<usize>;

    fn set_entity_location(&mut self, name: &str, location: [f32; 3]) -> Result<()>;

    fn set_entity_rotation(&mut self, name: &str, rotation: [f32; 3]) -> Result<()>;

    fn set_entity_appearance(&mut self, name: &str, appearance: u32) -> Result<()>;

    fn set_entity_scale(&mut self, name: &str, scale: [f32; 3]) -> Result<()>;

    fn set_entity_color(&mut self, name: &str, rgb: [u8; 3]) -> Result<()>;

    fn set_entity_physics(&mut self, name: &str, enabled: bool) -> Result<()>;

    /// Engine ticks between two agent decisions.
    fn set_entity_interval(&mut self, name: &str, interval: u32) -> Result<()>;

    /// Toggle the engine's own random wandering for an entity.
    fn set_entity_random(&mut self, name: &str, enabled: bool) -> Result<()>;

    /// Attach an entity's camera at an offset relative to its body.
    fn set_camera_mount(&mut self, name: &str, location: [f32; 3], rotation: [f32; 3]) -> Result<()>;

    fn set_camera_location(&mut self, cam_id: i32, location: [f32; 3]) -> Result<()>;

    fn set_camera_rotation(&mut self, cam_id: i32, rotation: [f32; 3]) -> Result<()>;

    fn set_map(&mut self, map: &str) -> Result<()>;

    /// Release the connection.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
