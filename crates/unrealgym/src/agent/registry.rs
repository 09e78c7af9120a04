//! Ordered agent roster.

use super::{AgentCategory, AgentConfig};
use crate::config::{ActionType, ObservationMode};
use crate::spaces::{build_action_space, build_observation_space, ActionSpace, ObservationSpace};
use crate::{Result, UnrealError};

/// One agent together with the spaces derived from it.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentRecord {
    pub config: AgentConfig,
    pub action_space: ActionSpace,
    pub observation_space: ObservationSpace,
}

impl AgentRecord {
    /// Derive both spaces and bundle them with the config.
    pub fn build(
        config: AgentConfig,
        action_type: ActionType,
        mode: ObservationMode,
        resolution: (usize, usize),
    ) -> Result<Self> {
        let action_space = build_action_space(action_type, &config)?;
        let observation_space = build_observation_space(config.cam_id, mode, resolution)?;
        Ok(Self {
            config,
            action_space,
            observation_space,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn cam_id(&self) -> i32 {
        self.config.cam_id
    }
}

/// Agents in control order. Insertion order is the index space shared by
/// actions, observations, cameras and poses.
#[derive(Clone, Debug, Default)]
pub struct AgentRegistry {
    records: Vec<AgentRecord>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from configs, deriving every agent's spaces.
    pub fn from_configs(
        configs: Vec<AgentConfig>,
        action_type: ActionType,
        mode: ObservationMode,
        resolution: (usize, usize),
    ) -> Result<Self> {
        let mut registry = Self::new();
        for config in configs {
            registry.push(AgentRecord::build(config, action_type, mode, resolution)?)?;
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name() == name)
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.name() == name)
            .ok_or_else(|| UnrealError::NotFound(name.to_string()))
    }

    pub fn record(&self, name: &str) -> Result<&AgentRecord> {
        self.index_of(name).map(|i| &self.records[i])
    }

    pub fn get(&self, name: &str) -> Result<&AgentConfig> {
        self.record(name).map(|r| &r.config)
    }

    pub fn category(&self, name: &str) -> Result<&AgentCategory> {
        self.get(name).map(|c| &c.category)
    }

    pub fn at(&self, index: usize) -> Option<&AgentRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[AgentRecord] {
        &self.records
    }

    /// Agent names in control order.
    pub fn all(&self) -> Vec<&str> {
        self.records.iter().map(AgentRecord::name).collect()
    }

    pub fn cam_list(&self) -> Vec<i32> {
        self.records.iter().map(AgentRecord::cam_id).collect()
    }

    pub fn action_spaces(&self) -> Vec<&ActionSpace> {
        self.records.iter().map(|r| &r.action_space).collect()
    }

    pub fn observation_spaces(&self) -> Vec<&ObservationSpace> {
        self.records.iter().map(|r| &r.observation_space).collect()
    }

    pub(crate) fn push(&mut self, record: AgentRecord) -> Result<()> {
        if self.contains(record.name()) {
            return Err(UnrealError::Config(format!(
                "agent '{}' is already on the roster",
                record.name()
            )));
        }
        self.records.push(record);
        Ok(())
    }

    pub(crate) fn remove(&mut self, name: &str) -> Result<AgentRecord> {
        let index = self.index_of(name)?;
        Ok(self.records.remove(index))
    }

    /// Close the gap left by a removed camera: ids above `removed` move down by one.
    pub(crate) fn shift_cameras_above(&mut self, removed: i32) {
        for record in &mut self.records {
            if record.config.cam_id > removed {
                record.config.cam_id -= 1;
            }
        }
    }
}
