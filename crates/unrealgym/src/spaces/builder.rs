//! Derive per-agent spaces from agent configuration.

use super::{ActionSpace, Box, Discrete, Dtype, ImageSpace, ObservationSpace};
use crate::agent::{AgentConfig, ContinuousBounds};
use crate::config::{ActionType, ObservationMode};
use crate::{Result, UnrealError};

/// Length of a pose observation `(x, y, z, roll, yaw, pitch)`.
pub const POSE_DIM: usize = 6;
/// Symmetric bound of the pose observation box.
pub const POSE_BOUND: f32 = 100.0;

const MAX_RGB: f32 = 255.0;
const MAX_DEPTH: f32 = 100.0;
/// Head and animation sub-spaces default to a binary choice.
const DEFAULT_SUBSPACE: usize = 2;

/// Build the action space of one agent.
pub fn build_action_space(action_type: ActionType, agent: &AgentConfig) -> Result<ActionSpace> {
    match action_type {
        ActionType::Discrete => Ok(ActionSpace::Discrete(Discrete::for_vocabulary(
            agent.move_action.len(),
            "move",
        )?)),
        ActionType::Continuous => Ok(ActionSpace::Continuous(continuous_move(agent)?)),
        ActionType::Mixed => {
            let head = match &agent.head_action {
                Some(heads) => Discrete::for_vocabulary(heads.len(), "head")?,
                None => Discrete::new(DEFAULT_SUBSPACE),
            };
            let animation = match &agent.animation_action {
                Some(animations) => Discrete::for_vocabulary(animations.len(), "animation")?,
                None => Discrete::new(DEFAULT_SUBSPACE),
            };
            Ok(ActionSpace::Mixed {
                movement: continuous_move(agent)?,
                head,
                animation,
            })
        }
    }
}

fn continuous_move(agent: &AgentConfig) -> Result<Box> {
    let ContinuousBounds { low, high } = agent.move_action_continuous.as_ref().ok_or_else(|| {
        UnrealError::Config(format!("agent '{}' has no continuous move bounds", agent.name))
    })?;
    Box::from_bounds(low, high)
}

fn pose_space() -> ObservationSpace {
    ObservationSpace::Pose(Box::uniform(&[POSE_DIM], -POSE_BOUND, POSE_BOUND))
}

/// Build the observation space of one agent.
///
/// `resolution` is `(width, height)`; image spaces are stored as
/// `(height, width, channels)`. An agent without a camera can only ever
/// report its pose, whatever the mode.
pub fn build_observation_space(
    cam_id: i32,
    mode: ObservationMode,
    resolution: (usize, usize),
) -> Result<ObservationSpace> {
    if cam_id < 0 {
        return Ok(pose_space());
    }

    let (width, height) = resolution;
    let space = match mode {
        ObservationMode::Pose => return Ok(pose_space()),
        ObservationMode::Color | ObservationMode::Cg | ObservationMode::Mask => {
            ImageSpace::uniform(height, width, 3, Dtype::U8, 0.0, MAX_RGB)
        }
        ObservationMode::Depth => ImageSpace::uniform(height, width, 1, Dtype::F16, 0.0, MAX_DEPTH),
        ObservationMode::Rgbd | ObservationMode::MaskDepth => ImageSpace::new(
            height,
            width,
            Dtype::F16,
            vec![0.0; 4],
            vec![MAX_RGB, MAX_RGB, MAX_RGB, MAX_DEPTH],
        ),
        ObservationMode::ColorMask => ImageSpace::uniform(height, width, 6, Dtype::U8, 0.0, MAX_RGB),
    };
    if width == 0 || height == 0 {
        return Err(UnrealError::Config(format!(
            "resolution {width}x{height} has a zero dimension"
        )));
    }
    Ok(ObservationSpace::Image(space))
}
