//! Static per-agent configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Camera id of an agent that has no attached viewpoint.
pub const NO_CAMERA: i32 = -1;

/// Kind of entity an agent is.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentCategory {
    Player,
    Npc,
    Drone,
    Animal,
    Other(String),
}

impl From<String> for AgentCategory {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "player" => AgentCategory::Player,
            "npc" => AgentCategory::Npc,
            "drone" => AgentCategory::Drone,
            "animal" => AgentCategory::Animal,
            _ => AgentCategory::Other(value),
        }
    }
}

impl From<AgentCategory> for String {
    fn from(value: AgentCategory) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentCategory::Player => f.write_str("player"),
            AgentCategory::Npc => f.write_str("npc"),
            AgentCategory::Drone => f.write_str("drone"),
            AgentCategory::Animal => f.write_str("animal"),
            AgentCategory::Other(name) => f.write_str(name),
        }
    }
}

/// Elementwise bounds of the continuous move vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContinuousBounds {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

fn no_camera() -> i32 {
    NO_CAMERA
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Configuration of one controllable entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    #[serde(rename = "agent_type")]
    pub category: AgentCategory,
    #[serde(default = "no_camera")]
    pub cam_id: i32,
    /// Engine blueprint class used when spawning clones.
    #[serde(default)]
    pub class_name: String,
    /// Discrete move vocabulary, e.g. `[angle, velocity]` for walkers.
    #[serde(default)]
    pub move_action: Vec<Vec<f32>>,
    #[serde(default)]
    pub move_action_continuous: Option<ContinuousBounds>,
    /// Head rotations `[roll, yaw, pitch]` relative to the body.
    #[serde(default)]
    pub head_action: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    pub animation_action: Option<Vec<String>>,
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    /// Camera mount offset relative to the agent.
    #[serde(default)]
    pub relative_location: [f32; 3],
    #[serde(default)]
    pub relative_rotation: [f32; 3],
    /// The engine steers this agent itself.
    #[serde(default)]
    pub internal_nav: bool,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, category: AgentCategory) -> Self {
        Self {
            name: name.into(),
            category,
            cam_id: NO_CAMERA,
            class_name: String::new(),
            move_action: Vec::new(),
            move_action_continuous: None,
            head_action: None,
            animation_action: None,
            scale: unit_scale(),
            relative_location: [0.0; 3],
            relative_rotation: [0.0; 3],
            internal_nav: false,
        }
    }

    pub fn with_camera(mut self, cam_id: i32) -> Self {
        self.cam_id = cam_id;
        self
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    pub fn with_move_actions(mut self, moves: Vec<Vec<f32>>) -> Self {
        self.move_action = moves;
        self
    }

    pub fn with_continuous(mut self, low: Vec<f32>, high: Vec<f32>) -> Self {
        self.move_action_continuous = Some(ContinuousBounds { low, high });
        self
    }

    pub fn with_head_actions(mut self, heads: Vec<Vec<f32>>) -> Self {
        self.head_action = Some(heads);
        self
    }

    pub fn with_animations(mut self, animations: Vec<String>) -> Self {
        self.animation_action = Some(animations);
        self
    }

    pub fn with_camera_mount(mut self, location: [f32; 3], rotation: [f32; 3]) -> Self {
        self.relative_location = location;
        self.relative_rotation = rotation;
        self
    }

    /// Clone this config under a new name, keeping everything else.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn has_camera(&self) -> bool {
        self.cam_id >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_through_strings() {
        let parsed: AgentCategory = String::from("Drone").into();
        assert_eq!(parsed, AgentCategory::Drone);
        let other: AgentCategory = String::from("car").into();
        assert_eq!(other, AgentCategory::Other("car".into()));
        assert_eq!(String::from(other), "car");
    }

    #[test]
    fn test_defaults_from_json() {
        let config: AgentConfig =
            serde_json::from_str(r#"{ "name": "npc_0", "agent_type": "npc" }"#).unwrap();
        assert_eq!(config.cam_id, NO_CAMERA);
        assert!(!config.has_camera());
        assert_eq!(config.scale, [1.0, 1.0, 1.0]);
        assert!(config.head_action.is_none());
    }

    #[test]
    fn test_renamed_keeps_vocabulary() {
        let base = AgentConfig::new("a", AgentCategory::Player)
            .with_camera(2)
            .with_move_actions(vec![vec![0.0, 100.0]]);
        let clone = base.renamed("b");
        assert_eq!(clone.name, "b");
        assert_eq!(clone.cam_id, 2);
        assert_eq!(clone.move_action, base.move_action);
    }
}
