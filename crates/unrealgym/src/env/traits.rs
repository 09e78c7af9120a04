//! Core environment trait definitions.

use crate::dispatch::AgentAction;
use crate::geometry::Pose;
use crate::spaces::{ActionSpace, ObservationSpace};
use crate::Result;
use ndarray::{Array2, Array3, ArrayD};

/// Episode summary attached by wrappers once an episode ends.
#[derive(Clone, Debug, Default)]
pub struct EpisodeInfo {
    /// Steps taken in the episode
    pub episode_length: Option<f32>,
    /// Colliding agent pairs summed over the episode
    pub episode_collisions: Option<f32>,
    /// Per-step mean pair distance averaged over the episode
    pub episode_mean_distance: Option<f32>,
    /// Custom metrics (kept minimal)
    pub extra: smallvec::SmallVec<[(&'static str, f32); 4]>,
}

impl EpisodeInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_episode_stats(mut self, length: u32, collisions: f32, mean_distance: f32) -> Self {
        self.episode_length = Some(length as f32);
        self.episode_collisions = Some(collisions);
        self.episode_mean_distance = Some(mean_distance);
        self
    }

    pub fn with_extra(mut self, key: &'static str, value: f32) -> Self {
        self.extra.push((key, value));
        self
    }

    /// Get a value by key (including the named stats)
    pub fn get(&self, key: &str) -> Option<f32> {
        match key {
            "episode_length" => self.episode_length,
            "episode_collisions" => self.episode_collisions,
            "episode_mean_distance" => self.episode_mean_distance,
            _ => self.extra.iter().find(|(k, _)| k == &key).map(|(_, v)| *v),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.episode_length.is_none() && self.extra.is_empty()
    }
}

/// Auxiliary per-step record for task layers.
#[derive(Clone, Debug)]
pub struct StepInfo {
    /// (N, N), 1.0 where agent j would collide with agent i
    pub collision: Array2<f32>,
    pub mean_distance: f32,
    /// World poses in roster order
    pub pose: Vec<Pose>,
    /// (N, N, 2) distance and bearing
    pub relative_pose: Array3<f32>,
    /// (N, N, 10) relative features
    pub pose_obs: Array3<f32>,
    /// Steps taken in this episode, this one included
    pub steps: u32,
    /// Actions as received
    pub action: Vec<Option<AgentAction>>,
    pub episode: EpisodeInfo,
}

/// Result of one multi-agent step.
#[derive(Clone, Debug)]
pub struct StepOutput {
    pub observation: ArrayD<f32>,
    /// One per agent; task layers fill these in
    pub rewards: Vec<f32>,
    pub done: bool,
    pub info: StepInfo,
}

/// A multi-agent environment whose agents act simultaneously.
///
/// Actions and observations are aligned to the current roster; the roster
/// may change between steps, so callers re-read `num_agents` after any
/// population change.
pub trait MultiAgentEnv {
    /// Start a new episode and return the first observation.
    fn reset(&mut self) -> Result<ArrayD<f32>>;

    /// Apply one action per agent (`None` leaves the agent alone).
    fn step(&mut self, actions: &[Option<AgentAction>]) -> Result<StepOutput>;

    fn num_agents(&self) -> usize;

    fn action_spaces(&self) -> Vec<&ActionSpace>;

    fn observation_spaces(&self) -> Vec<&ObservationSpace>;

    /// Optional: frame of the protagonist for display
    fn render(&self) -> Option<&ArrayD<f32>> {
        None
    }

    /// Optional: release the engine connection
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
