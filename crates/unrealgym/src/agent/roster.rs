//! Roster mutation: agents joining and leaving a live scene.
//!
//! Every mutation keeps the engine and the registry in step. Records are
//! appended only once complete, and removals close the camera id gap the
//! engine opens when it destroys a camera.

use super::{AgentCategory, AgentConfig, AgentRecord, AgentRegistry};
use crate::config::{ActionType, EnvConfig, EnvSetting, ObservationMode};
use crate::env::SensorService;
use crate::{Result, UnrealError};
use rand::seq::SliceRandom;
use rand::Rng;

/// The registry plus everything needed to derive spaces for newcomers.
#[derive(Clone, Debug)]
pub struct Roster {
    registry: AgentRegistry,
    action_type: ActionType,
    mode: ObservationMode,
    resolution: (usize, usize),
    interval: u32,
}

impl Roster {
    pub fn new(
        registry: AgentRegistry,
        action_type: ActionType,
        mode: ObservationMode,
        resolution: (usize, usize),
        interval: u32,
    ) -> Self {
        Self {
            registry,
            action_type,
            mode,
            resolution,
            interval,
        }
    }

    /// Roster over the setting's agents, in file order.
    pub fn from_setting(setting: &EnvSetting, config: &EnvConfig) -> Result<Self> {
        let registry = AgentRegistry::from_configs(
            setting.agents.clone(),
            config.action_type,
            config.observation_mode,
            config.resolution,
        )?;
        Ok(Self::new(
            registry,
            config.action_type,
            config.observation_mode,
            config.resolution,
            setting.interval,
        ))
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Spawn a clone of `template` named `name` at `location`.
    ///
    /// The clone gets a camera id only if the engine reports a new camera
    /// after spawning, in which case it is the previous camera count.
    pub fn add<S, R>(
        &mut self,
        service: &mut S,
        name: &str,
        location: [f32; 3],
        template: &AgentConfig,
        rng: &mut R,
    ) -> Result<AgentConfig>
    where
        S: SensorService + ?Sized,
        R: Rng + ?Sized,
    {
        if self.registry.contains(name) {
            return Err(UnrealError::Config(format!("agent '{name}' is already on the roster")));
        }

        let cameras_before = service.camera_count()?;
        service.spawn_entity(&template.class_name, name, location)?;
        let cam_id = if service.camera_count()? > cameras_before {
            cameras_before as i32
        } else {
            super::NO_CAMERA
        };
        let config = template.renamed(name).with_camera(cam_id);

        let record = AgentRecord::build(config, self.action_type, self.mode, self.resolution)
            .and_then(|record| {
                service.set_entity_scale(name, template.scale)?;
                service.set_entity_color(name, rng.gen())?;
                service.set_entity_random(name, false)?;
                service.set_entity_interval(name, self.interval)?;
                service.set_entity_location(name, location)?;
                service.set_entity_physics(name, false)?;
                Ok(record)
            });
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(agent = name, error = %e, "agent setup failed, destroying the spawned entity");
                service.destroy_entity(name)?;
                return Err(e);
            }
        };

        let config = record.config.clone();
        self.registry.push(record)?;
        tracing::info!(agent = name, cam_id, agents = self.registry.len(), "agent added");
        Ok(config)
    }

    /// Destroy `name` and drop its record.
    pub fn remove<S>(&mut self, service: &mut S, name: &str) -> Result<AgentConfig>
    where
        S: SensorService + ?Sized,
    {
        self.registry.index_of(name)?;
        service.destroy_entity(name)?;
        let record = self.registry.remove(name)?;
        let removed_cam = record.cam_id();
        if removed_cam >= 0 {
            self.registry.shift_cameras_above(removed_cam);
        }
        tracing::info!(agent = name, cam_id = removed_cam, agents = self.registry.len(), "agent removed");
        Ok(record.config)
    }

    /// Grow or shrink the roster to `target` agents.
    ///
    /// Newcomers clone a random current agent, are named
    /// `{category}_EP{episode}_{index}` and start at a random point of
    /// `spawn_points`. Shrinking removes from the tail.
    pub fn set_population<S, R>(
        &mut self,
        service: &mut S,
        target: usize,
        episode: u32,
        spawn_points: &[[f32; 3]],
        rng: &mut R,
    ) -> Result<()>
    where
        S: SensorService + ?Sized,
        R: Rng + ?Sized,
    {
        while self.registry.len() < target {
            let template = self
                .registry
                .records()
                .choose(rng)
                .map(|r| r.config.clone())
                .ok_or_else(|| UnrealError::Config("cannot grow an empty roster".to_string()))?;
            let location = spawn_points
                .choose(rng)
                .copied()
                .ok_or_else(|| UnrealError::Config("no spawn points to place new agents".to_string()))?;
            let name = self.fresh_name(&template.category, episode);
            self.add(service, &name, location, &template, rng)?;
        }
        while self.registry.len() > target {
            let Some(last) = self.registry.records().last().map(|r| r.name().to_string()) else {
                break;
            };
            self.remove(service, &last)?;
        }
        Ok(())
    }

    /// `{category}_EP{episode}_{index}` with the lowest index at or above the
    /// roster length that no agent uses yet.
    fn fresh_name(&self, category: &AgentCategory, episode: u32) -> String {
        (self.registry.len()..)
            .map(|index| format!("{category}_EP{episode}_{index}"))
            .find(|name| !self.registry.contains(name))
            .unwrap_or_default()
    }

    /// Remove every agent whose category is not in `categories`.
    /// Returns the removed names in roster order.
    pub fn retain_categories<S>(&mut self, service: &mut S, categories: &[AgentCategory]) -> Result<Vec<String>>
    where
        S: SensorService + ?Sized,
    {
        let dropped: Vec<String> = self
            .registry
            .records()
            .iter()
            .filter(|r| !categories.contains(&r.config.category))
            .map(|r| r.name().to_string())
            .collect();
        for name in &dropped {
            self.remove(service, name)?;
        }
        Ok(dropped)
    }
}
