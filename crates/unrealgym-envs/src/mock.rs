//! In-process scene standing in for a running engine.

use ndarray::Array3;
use std::collections::HashMap;
use unrealgym::config::EnvSetting;
use unrealgym::env::{Command, SensorService};
use unrealgym::fusion::{CameraFlags, SensorBatch};
use unrealgym::geometry::Pose;
use unrealgym::{Result, UnrealError};

/// Seconds of motion simulated per batched command.
const MOVE_DT: f32 = 0.1;
/// Depth reported by every camera pixel.
const MOCK_DEPTH: f32 = 50.0;

#[derive(Clone, Debug)]
struct Entity {
    name: String,
    class_name: String,
    pose: Pose,
    appearance: u32,
    scale: [f32; 3],
    color: [u8; 3],
    physics: bool,
    interval: u32,
    random: bool,
    mount: ([f32; 3], [f32; 3]),
    head: Vec<f32>,
    animation: Option<String>,
}

impl Entity {
    fn new(name: &str, class_name: &str, location: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            class_name: class_name.to_string(),
            pose: Pose::at(location),
            appearance: 0,
            scale: [1.0; 3],
            color: [0; 3],
            physics: true,
            interval: 1,
            random: true,
            mount: ([0.0; 3], [0.0; 3]),
            head: Vec::new(),
            animation: None,
        }
    }

    /// Walkers take `[angle, velocity]`, drones `[vx, vy, vz, yaw_rate]`.
    fn apply_move(&mut self, values: &[f32]) {
        match values {
            &[angle, velocity] => {
                self.pose.yaw += angle;
                let heading = self.pose.yaw.to_radians();
                self.pose.x += velocity * MOVE_DT * heading.cos();
                self.pose.y += velocity * MOVE_DT * heading.sin();
            }
            &[vx, vy, vz, yaw_rate] => {
                self.pose.x += vx * MOVE_DT;
                self.pose.y += vy * MOVE_DT;
                self.pose.z += vz * MOVE_DT;
                self.pose.yaw += yaw_rate;
            }
            _ => {}
        }
    }
}

/// A scripted scene that implements [`SensorService`].
///
/// Camera 0 is the free world camera. Every entity whose class was seen
/// with a camera in the setting gets one when spawned, appended at the end;
/// destroying it closes the gap the way the engine does.
///
/// Frames are constant per camera so tests can tell agents apart: color
/// pixels hold `cam_id`, mask pixels hold `255 - cam_id` and depth pixels
/// hold a fixed distance. Agents without a camera read zero frames.
#[derive(Clone, Debug)]
pub struct MockUnreal {
    width: usize,
    height: usize,
    entities: Vec<Entity>,
    /// Owner of each camera id, `None` for the world camera
    cameras: Vec<Option<String>>,
    camera_classes: Vec<String>,
    camera_poses: HashMap<i32, ([f32; 3], [f32; 3])>,
    map: Option<String>,
    sent: Vec<Vec<Command>>,
    calls: Vec<String>,
    fail_on: Option<String>,
    closed: bool,
}

impl MockUnreal {
    /// Empty scene with only the world camera.
    pub fn new(resolution: (usize, usize)) -> Self {
        Self {
            width: resolution.0,
            height: resolution.1,
            entities: Vec::new(),
            cameras: vec![None],
            camera_classes: Vec::new(),
            camera_poses: HashMap::new(),
            map: None,
            sent: Vec::new(),
            calls: Vec::new(),
            fail_on: None,
            closed: false,
        }
    }

    /// Scene pre-populated with the setting's agents at their configured cameras.
    pub fn from_setting(setting: &EnvSetting, resolution: (usize, usize)) -> Self {
        let mut mock = Self::new(resolution);
        for (k, agent) in setting.agents.iter().enumerate() {
            let location = setting.safe_start.get(k).copied().unwrap_or([0.0; 3]);
            mock.entities.push(Entity::new(&agent.name, &agent.class_name, location));
            if agent.cam_id >= 0 {
                let cam = agent.cam_id as usize;
                if mock.cameras.len() <= cam {
                    mock.cameras.resize(cam + 1, None);
                }
                mock.cameras[cam] = Some(agent.name.clone());
                if !mock.camera_classes.contains(&agent.class_name) {
                    mock.camera_classes.push(agent.class_name.clone());
                }
            }
        }
        mock
    }

    /// Make the next call of `operation` fail with a service error.
    pub fn fail_next(&mut self, operation: &str) {
        self.fail_on = Some(operation.to_string());
    }

    /// Every command batch received, in order.
    pub fn sent_batches(&self) -> &[Vec<Command>] {
        &self.sent
    }

    /// Names of every service call made, in order.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    pub fn map(&self) -> Option<&str> {
        self.map.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.iter().any(|e| e.name == name)
    }

    pub fn pose_of(&self, name: &str) -> Option<Pose> {
        self.entity(name).ok().map(|e| e.pose)
    }

    /// Camera id currently owned by `name`.
    pub fn camera_of(&self, name: &str) -> Option<i32> {
        self.cameras
            .iter()
            .position(|owner| owner.as_deref() == Some(name))
            .map(|cam| cam as i32)
    }

    pub fn camera_pose(&self, cam_id: i32) -> Option<([f32; 3], [f32; 3])> {
        self.camera_poses.get(&cam_id).copied()
    }

    pub fn class_of(&self, name: &str) -> Option<&str> {
        self.entity(name).ok().map(|e| e.class_name.as_str())
    }

    pub fn appearance_of(&self, name: &str) -> Option<u32> {
        self.entity(name).ok().map(|e| e.appearance)
    }

    pub fn physics_of(&self, name: &str) -> Option<bool> {
        self.entity(name).ok().map(|e| e.physics)
    }

    pub fn interval_of(&self, name: &str) -> Option<u32> {
        self.entity(name).ok().map(|e| e.interval)
    }

    pub fn scale_of(&self, name: &str) -> Option<[f32; 3]> {
        self.entity(name).ok().map(|e| e.scale)
    }

    pub fn is_random(&self, name: &str) -> Option<bool> {
        self.entity(name).ok().map(|e| e.random)
    }

    pub fn color_of(&self, name: &str) -> Option<[u8; 3]> {
        self.entity(name).ok().map(|e| e.color)
    }

    pub fn mount_of(&self, name: &str) -> Option<([f32; 3], [f32; 3])> {
        self.entity(name).ok().map(|e| e.mount)
    }

    pub fn head_of(&self, name: &str) -> Option<Vec<f32>> {
        self.entity(name).ok().map(|e| e.head.clone())
    }

    pub fn animation_of(&self, name: &str) -> Option<String> {
        self.entity(name).ok().and_then(|e| e.animation.clone())
    }

    fn record(&mut self, operation: &str) -> Result<()> {
        self.calls.push(operation.to_string());
        if self.closed {
            return Err(UnrealError::Service(format!("{operation}: connection is closed")));
        }
        if self.fail_on.as_deref() == Some(operation) {
            self.fail_on = None;
            return Err(UnrealError::Service(format!("{operation}: injected failure")));
        }
        Ok(())
    }

    fn entity(&self, name: &str) -> Result<&Entity> {
        self.entities
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| UnrealError::Service(format!("no entity named '{name}'")))
    }

    fn entity_mut(&mut self, name: &str) -> Result<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| UnrealError::Service(format!("no entity named '{name}'")))
    }

    fn frame(&self, channels: usize, value: f32) -> Array3<f32> {
        Array3::from_elem((self.height, self.width, channels), value)
    }

    fn check_camera(&self, name: &str, cam_id: i32) -> Result<()> {
        if cam_id < 0 {
            return Ok(());
        }
        match self.cameras.get(cam_id as usize) {
            Some(Some(owner)) if owner == name => Ok(()),
            _ => Err(UnrealError::Service(format!(
                "camera {cam_id} does not belong to '{name}'"
            ))),
        }
    }
}

impl SensorService for MockUnreal {
    fn send_batched_commands(&mut self, commands: &[Command]) -> Result<()> {
        self.record("send_batched_commands")?;
        for command in commands {
            let entity = self.entity_mut(command.agent())?;
            match command {
                Command::Move { values, .. } => entity.apply_move(values),
                Command::Head { rotation, .. } => entity.head = rotation.clone(),
                Command::Animate { animation, .. } => entity.animation = Some(animation.clone()),
            }
        }
        self.sent.push(commands.to_vec());
        Ok(())
    }

    fn read_batch(&mut self, agents: &[&str], cam_ids: &[i32], flags: CameraFlags) -> Result<SensorBatch> {
        self.record("read_batch")?;
        if agents.len() != cam_ids.len() {
            return Err(UnrealError::Service(format!(
                "{} agents but {} camera ids",
                agents.len(),
                cam_ids.len()
            )));
        }

        let mut batch = SensorBatch::default();
        for (&name, &cam_id) in agents.iter().zip(cam_ids) {
            let pose = self.entity(name)?.pose;
            self.check_camera(name, cam_id)?;
            let has_camera = cam_id >= 0;

            batch.object_poses.push(pose);
            if flags.cam_pose {
                batch.camera_poses.push(if has_camera { pose } else { Pose::default() });
            }
            if flags.color {
                let value = if has_camera { cam_id as f32 } else { 0.0 };
                batch.images.push(self.frame(3, value));
            }
            if flags.mask {
                let value = if has_camera { 255.0 - cam_id as f32 } else { 0.0 };
                batch.masks.push(self.frame(3, value));
            }
            if flags.depth {
                let value = if has_camera { MOCK_DEPTH } else { 0.0 };
                batch.depths.push(self.frame(1, value));
            }
        }
        Ok(batch)
    }

    fn spawn_entity(&mut self, class_name: &str, name: &str, location: [f32; 3]) -> Result<()> {
        self.record("spawn_entity")?;
        if self.contains(name) {
            return Err(UnrealError::Service(format!("entity '{name}' already exists")));
        }
        self.entities.push(Entity::new(name, class_name, location));
        if self.camera_classes.iter().any(|c| c == class_name) {
            self.cameras.push(Some(name.to_string()));
        }
        tracing::trace!(name, class_name, cameras = self.cameras.len(), "mock spawn");
        Ok(())
    }

    fn destroy_entity(&mut self, name: &str) -> Result<()> {
        self.record("destroy_entity")?;
        let index = self
            .entities
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| UnrealError::Service(format!("no entity named '{name}'")))?;
        self.entities.remove(index);
        self.cameras.retain(|owner| owner.as_deref() != Some(name));
        Ok(())
    }

    fn camera_count(&mut self) -> Result<usize> {
        self.record("camera_count")?;
        Ok(self.cameras.len())
    }

    fn set_entity_location(&mut self, name: &str, location: [f32; 3]) -> Result<()> {
        self.record("set_entity_location")?;
        let entity = self.entity_mut(name)?;
        entity.pose.x = location[0];
        entity.pose.y = location[1];
        entity.pose.z = location[2];
        Ok(())
    }

    fn set_entity_rotation(&mut self, name: &str, rotation: [f32; 3]) -> Result<()> {
        self.record("set_entity_rotation")?;
        let entity = self.entity_mut(name)?;
        entity.pose.roll = rotation[0];
        entity.pose.yaw = rotation[1];
        entity.pose.pitch = rotation[2];
        Ok(())
    }

    fn set_entity_appearance(&mut self, name: &str, appearance: u32) -> Result<()> {
        self.record("set_entity_appearance")?;
        self.entity_mut(name)?.appearance = appearance;
        Ok(())
    }

    fn set_entity_scale(&mut self, name: &str, scale: [f32; 3]) -> Result<()> {
        self.record("set_entity_scale")?;
        self.entity_mut(name)?.scale = scale;
        Ok(())
    }

    fn set_entity_color(&mut self, name: &str, rgb: [u8; 3]) -> Result<()> {
        self.record("set_entity_color")?;
        self.entity_mut(name)?.color = rgb;
        Ok(())
    }

    fn set_entity_physics(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.record("set_entity_physics")?;
        self.entity_mut(name)?.physics = enabled;
        Ok(())
    }

    fn set_entity_interval(&mut self, name: &str, interval: u32) -> Result<()> {
        self.record("set_entity_interval")?;
        self.entity_mut(name)?.interval = interval;
        Ok(())
    }

    fn set_entity_random(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.record("set_entity_random")?;
        self.entity_mut(name)?.random = enabled;
        Ok(())
    }

    fn set_camera_mount(&mut self, name: &str, location: [f32; 3], rotation: [f32; 3]) -> Result<()> {
        self.record("set_camera_mount")?;
        self.entity_mut(name)?.mount = (location, rotation);
        Ok(())
    }

    fn set_camera_location(&mut self, cam_id: i32, location: [f32; 3]) -> Result<()> {
        self.record("set_camera_location")?;
        self.camera_poses.entry(cam_id).or_insert(([0.0; 3], [0.0; 3])).0 = location;
        Ok(())
    }

    fn set_camera_rotation(&mut self, cam_id: i32, rotation: [f32; 3]) -> Result<()> {
        self.record("set_camera_rotation")?;
        self.camera_poses.entry(cam_id).or_insert(([0.0; 3], [0.0; 3])).1 = rotation;
        Ok(())
    }

    fn set_map(&mut self, map: &str) -> Result<()> {
        self.record("set_map")?;
        self.map = Some(map.to_string());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.record("close")?;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene() -> MockUnreal {
        let mut mock = MockUnreal::new((8, 6));
        mock.camera_classes.push("walker".into());
        mock
    }

    #[test]
    fn test_cameras_stay_dense() {
        let mut mock = scene();
        mock.spawn_entity("walker", "a", [0.0; 3]).unwrap();
        mock.spawn_entity("walker", "b", [0.0; 3]).unwrap();
        mock.spawn_entity("crate", "box", [0.0; 3]).unwrap();
        mock.spawn_entity("walker", "c", [0.0; 3]).unwrap();
        assert_eq!(mock.camera_count().unwrap(), 4);
        assert_eq!(mock.camera_of("c"), Some(3));
        assert_eq!(mock.camera_of("box"), None);
        assert_eq!(mock.class_of("box"), Some("crate"));

        mock.destroy_entity("a").unwrap();
        assert_eq!(mock.camera_of("b"), Some(1));
        assert_eq!(mock.camera_of("c"), Some(2));
    }

    #[test]
    fn test_read_batch_frames() {
        let mut mock = scene();
        mock.spawn_entity("walker", "a", [1.0, 2.0, 3.0]).unwrap();
        mock.spawn_entity("crate", "box", [0.0; 3]).unwrap();
        let flags = CameraFlags {
            cam_pose: false,
            color: true,
            mask: false,
            depth: true,
        };
        let batch = mock.read_batch(&["a", "box"], &[1, -1], flags).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.images[0].shape(), &[6, 8, 3]);
        assert_eq!(batch.images[0][[0, 0, 0]], 1.0);
        assert_eq!(batch.depths[1][[0, 0, 0]], 0.0);
        assert!(batch.masks.is_empty());
        assert_eq!(batch.object_poses[0].location(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_stale_camera_id_rejected() {
        let mut mock = scene();
        mock.spawn_entity("walker", "a", [0.0; 3]).unwrap();
        let flags = CameraFlags::default();
        assert!(mock.read_batch(&["a"], &[2], flags).is_err());
    }

    #[test]
    fn test_walker_moves_along_heading() {
        let mut mock = scene();
        mock.spawn_entity("walker", "a", [0.0; 3]).unwrap();
        let step = Command::Move {
            agent: "a".into(),
            values: vec![90.0, 100.0],
        };
        mock.send_batched_commands(&[step]).unwrap();
        let pose = mock.pose_of("a").unwrap();
        assert!(pose.x.abs() < 1e-3);
        assert!((pose.y - 10.0).abs() < 1e-3);
        assert_eq!(mock.sent_batches().len(), 1);
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let mut mock = scene();
        mock.fail_next("camera_count");
        assert!(matches!(mock.camera_count(), Err(UnrealError::Service(_))));
        assert!(mock.camera_count().is_ok());
    }
}
