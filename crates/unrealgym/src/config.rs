//! Environment configuration and setting files.
//!
//! `EnvConfig` holds the knobs chosen by the caller (action type, observation
//! mode, resolution). `EnvSetting` describes a map: its agents, start points
//! and reset area, and is usually deserialized from a JSON setting file.

use crate::agent::{AgentCategory, AgentConfig};
use crate::{Result, UnrealError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// How agents are controlled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    /// One index into the move vocabulary
    #[default]
    Discrete,
    /// A raw move vector inside the continuous bounds
    Continuous,
    /// Continuous move plus discrete head and animation sub-actions
    Mixed,
}

impl FromStr for ActionType {
    type Err = UnrealError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "discrete" => Ok(ActionType::Discrete),
            "continuous" => Ok(ActionType::Continuous),
            "mixed" | "hybrid" => Ok(ActionType::Mixed),
            other => Err(UnrealError::Config(format!(
                "unknown action type '{other}' (expected Discrete, Continuous or Mixed)"
            ))),
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionType::Discrete => "Discrete",
            ActionType::Continuous => "Continuous",
            ActionType::Mixed => "Mixed",
        };
        f.write_str(name)
    }
}

/// Which sensor channels make up an observation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationMode {
    #[default]
    Color,
    Depth,
    Mask,
    Rgbd,
    /// Color image under the engine's CG render path. Composes like `Color`.
    #[serde(rename = "CG")]
    Cg,
    MaskDepth,
    ColorMask,
    Pose,
}

impl ObservationMode {
    pub const ALL: [ObservationMode; 8] = [
        ObservationMode::Color,
        ObservationMode::Depth,
        ObservationMode::Mask,
        ObservationMode::Rgbd,
        ObservationMode::Cg,
        ObservationMode::MaskDepth,
        ObservationMode::ColorMask,
        ObservationMode::Pose,
    ];

    /// Number of image channels per frame, `None` for pose observations.
    pub fn channels(&self) -> Option<usize> {
        match self {
            ObservationMode::Color | ObservationMode::Cg | ObservationMode::Mask => Some(3),
            ObservationMode::Depth => Some(1),
            ObservationMode::Rgbd | ObservationMode::MaskDepth => Some(4),
            ObservationMode::ColorMask => Some(6),
            ObservationMode::Pose => None,
        }
    }
}

impl FromStr for ObservationMode {
    type Err = UnrealError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "color" => Ok(ObservationMode::Color),
            "depth" => Ok(ObservationMode::Depth),
            "mask" => Ok(ObservationMode::Mask),
            "rgbd" => Ok(ObservationMode::Rgbd),
            "cg" => Ok(ObservationMode::Cg),
            "maskdepth" | "mask_depth" => Ok(ObservationMode::MaskDepth),
            "colormask" | "color_mask" => Ok(ObservationMode::ColorMask),
            "pose" => Ok(ObservationMode::Pose),
            "gray" => Err(UnrealError::Config(
                "Gray observations are not supported; use Color and convert downstream".into(),
            )),
            other => Err(UnrealError::Config(format!(
                "unknown observation mode '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ObservationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObservationMode::Color => "Color",
            ObservationMode::Depth => "Depth",
            ObservationMode::Mask => "Mask",
            ObservationMode::Rgbd => "Rgbd",
            ObservationMode::Cg => "CG",
            ObservationMode::MaskDepth => "MaskDepth",
            ObservationMode::ColorMask => "ColorMask",
            ObservationMode::Pose => "Pose",
        };
        f.write_str(name)
    }
}

/// Caller-side environment options.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub action_type: ActionType,
    pub observation_mode: ObservationMode,
    /// Frame size as (width, height).
    pub resolution: (usize, usize),
    /// Reserved for task layers that vary how episodes start.
    pub reset_type: u32,
    /// Sample start locations from the reset area instead of safe starts.
    pub random_init: bool,
    /// Agent categories kept on the roster when the environment launches.
    pub controlled_categories: Vec<AgentCategory>,
    /// Agent whose view is projected by `render`.
    pub protagonist: usize,
    /// Seed for start-point sampling and roster growth.
    pub seed: Option<u64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            action_type: ActionType::Discrete,
            observation_mode: ObservationMode::Color,
            resolution: (160, 160),
            reset_type: 0,
            random_init: false,
            controlled_categories: vec![AgentCategory::Player],
            protagonist: 0,
            seed: None,
        }
    }
}

impl EnvConfig {
    pub fn with_action_type(mut self, action_type: ActionType) -> Self {
        self.action_type = action_type;
        self
    }

    pub fn with_observation_mode(mut self, mode: ObservationMode) -> Self {
        self.observation_mode = mode;
        self
    }

    pub fn with_resolution(mut self, width: usize, height: usize) -> Self {
        self.resolution = (width, height);
        self
    }

    pub fn with_categories(mut self, categories: Vec<AgentCategory>) -> Self {
        self.controlled_categories = categories;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// The bird's-eye camera placed above the protagonist on reset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThirdCamera {
    pub cam_id: i32,
    pub height_top_view: f32,
}

fn default_interval() -> u32 {
    1
}

/// Map description loaded from a setting file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvSetting {
    pub env_name: String,
    #[serde(default)]
    pub height: f32,
    pub third_cam: ThirdCamera,
    /// Agents in control order.
    pub agents: Vec<AgentConfig>,
    /// Predefined collision-free start points.
    pub safe_start: Vec<[f32; 3]>,
    /// `[x_min, x_max, y_min, y_max, z_min, z_max]`
    pub reset_area: [i32; 6],
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub random_init: bool,
}

impl EnvSetting {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let setting: EnvSetting = serde_json::from_str(json)?;
        setting.validate()?;
        Ok(setting)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    fn validate(&self) -> Result<()> {
        let [x0, x1, y0, y1, z0, z1] = self.reset_area;
        if x0 > x1 || y0 > y1 || z0 > z1 {
            return Err(UnrealError::Config(format!(
                "reset area {:?} has an inverted range",
                self.reset_area
            )));
        }
        if self.safe_start.is_empty() {
            return Err(UnrealError::Config(
                "setting must list at least one safe start point".into(),
            ));
        }
        Ok(())
    }
}
