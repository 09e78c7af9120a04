//! Preset agents and a small demo map.

use unrealgym::agent::{AgentCategory, AgentConfig};
use unrealgym::config::{EnvSetting, ThirdCamera};

/// Spacing between consecutive safe start points in the demo map.
const START_SPACING: f32 = 300.0;

/// A walking character with a head camera.
pub fn player_template(name: &str, cam_id: i32) -> AgentConfig {
    AgentConfig::new(name, AgentCategory::Player)
        .with_class("bp_character_C")
        .with_camera(cam_id)
        .with_move_actions(vec![
            vec![0.0, 100.0],
            vec![0.0, -100.0],
            vec![15.0, 50.0],
            vec![-15.0, 50.0],
            vec![30.0, 0.0],
            vec![-30.0, 0.0],
            vec![0.0, 0.0],
        ])
        .with_continuous(vec![-30.0, -100.0], vec![30.0, 100.0])
        .with_head_actions(vec![vec![0.0, 0.0, 0.0], vec![0.0, 30.0, 0.0], vec![0.0, -30.0, 0.0]])
        .with_animations(vec![
            "stand".to_string(),
            "crouch".to_string(),
            "liedown".to_string(),
            "pick_up".to_string(),
        ])
        .with_camera_mount([20.0, 0.0, 60.0], [0.0, 0.0, 0.0])
}

/// A quadcopter steered by `[vx, vy, vz, yaw_rate]`.
pub fn drone_template(name: &str, cam_id: i32) -> AgentConfig {
    AgentConfig::new(name, AgentCategory::Drone)
        .with_class("BP_drone01_C")
        .with_camera(cam_id)
        .with_move_actions(vec![
            vec![1.0, 0.0, 0.0, 0.0],
            vec![-1.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0],
            vec![0.0, -1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, -1.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0, -1.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ])
        .with_continuous(vec![-1.0; 4], vec![1.0; 4])
        .with_camera_mount([0.0, 0.0, -10.0], [0.0, 0.0, 0.0])
}

/// A bystander without a camera.
pub fn npc_template(name: &str) -> AgentConfig {
    AgentConfig::new(name, AgentCategory::Npc)
        .with_class("bp_npc_C")
        .with_move_actions(vec![vec![0.0, 100.0], vec![0.0, 0.0]])
        .with_continuous(vec![-30.0, -100.0], vec![30.0, 100.0])
}

/// `players` walkers with cameras 1..=players, one drone and one npc.
///
/// The drone and the npc only stay on the roster when their categories are
/// controlled.
pub fn demo_setting(players: usize) -> EnvSetting {
    let mut agents: Vec<AgentConfig> = (0..players)
        .map(|k| player_template(&format!("player_{k}"), k as i32 + 1))
        .collect();
    agents.push(drone_template("drone_0", players as i32 + 1));
    agents.push(npc_template("npc_0"));

    let safe_start = (0..agents.len())
        .map(|k| [k as f32 * START_SPACING, 0.0, 100.0])
        .collect();

    EnvSetting {
        env_name: "FlexibleRoom".to_string(),
        height: 100.0,
        third_cam: ThirdCamera {
            cam_id: 0,
            height_top_view: 1500.0,
        },
        agents,
        safe_start,
        reset_area: [-1000, 1000, -1000, 1000, 0, 200],
        interval: 1,
        random_init: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_setting_layout() {
        let setting = demo_setting(3);
        assert_eq!(setting.agents.len(), 5);
        let cams: Vec<i32> = setting.agents.iter().map(|a| a.cam_id).collect();
        assert_eq!(cams, vec![1, 2, 3, 4, -1]);
        assert_eq!(setting.safe_start.len(), 5);
    }
}
