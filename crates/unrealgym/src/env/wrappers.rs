//! Environment wrappers for common functionality.

use super::{EpisodeInfo, MultiAgentEnv, StepOutput};
use crate::dispatch::AgentAction;
use crate::log::{MetricLogger, NoOpLogger};
use crate::spaces::{ActionSpace, ObservationSpace};
use crate::Result;
use ndarray::ArrayD;
use std::collections::HashMap;

/// Extra metric: most colliding pairs seen in a single step of the episode.
pub const PEAK_COLLISIONS: &str = "episode_peak_collisions";

/// Wrapper that tracks collision and crowding statistics per episode.
///
/// A finished episode is reported to the logger when the next one starts
/// (or when the inner environment signals `done`), and attached to the
/// `info.episode` of a terminal step.
pub struct EpisodeStats<E: MultiAgentEnv> {
    env: E,
    logger: Box<dyn MetricLogger>,
    episodes: u64,
    episode_length: u32,
    episode_collisions: f32,
    distance_sum: f32,
    peak_collisions: f32,
}

impl<E: MultiAgentEnv> EpisodeStats<E> {
    /// Wrap an environment without reporting anywhere.
    pub fn new(env: E) -> Self {
        Self::with_logger(env, Box::new(NoOpLogger))
    }

    pub fn with_logger(env: E, logger: Box<dyn MetricLogger>) -> Self {
        Self {
            env,
            logger,
            episodes: 0,
            episode_length: 0,
            episode_collisions: 0.0,
            distance_sum: 0.0,
            peak_collisions: 0.0,
        }
    }

    /// Get a reference to the inner environment
    pub fn inner(&self) -> &E {
        &self.env
    }

    /// Get a mutable reference to the inner environment
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.env
    }

    /// Statistics of the episode in progress.
    pub fn current(&self) -> EpisodeInfo {
        let mean_distance = if self.episode_length == 0 {
            0.0
        } else {
            self.distance_sum / self.episode_length as f32
        };
        EpisodeInfo::new()
            .with_episode_stats(self.episode_length, self.episode_collisions, mean_distance)
            .with_extra(PEAK_COLLISIONS, self.peak_collisions)
    }

    fn report(&mut self) {
        if self.episode_length == 0 {
            return;
        }
        let info = self.current();
        let metrics: HashMap<String, f64> = ["episode_length", "episode_collisions", "episode_mean_distance"]
            .into_iter()
            .filter_map(|key| info.get(key).map(|v| (key.to_string(), v as f64)))
            .chain(info.extra.iter().map(|(key, v)| (key.to_string(), *v as f64)))
            .collect();
        self.logger.log_metrics(&metrics, self.episodes);
    }

    fn clear(&mut self) {
        self.episode_length = 0;
        self.episode_collisions = 0.0;
        self.distance_sum = 0.0;
        self.peak_collisions = 0.0;
    }
}

impl<E: MultiAgentEnv> MultiAgentEnv for EpisodeStats<E> {
    fn reset(&mut self) -> Result<ArrayD<f32>> {
        self.report();
        self.clear();
        self.episodes += 1;
        self.env.reset()
    }

    fn step(&mut self, actions: &[Option<AgentAction>]) -> Result<StepOutput> {
        let mut output = self.env.step(actions)?;

        let collisions = output
            .info
            .collision
            .indexed_iter()
            .filter(|((j, i), v)| j != i && **v > 0.0)
            .count();
        self.episode_length += 1;
        self.episode_collisions += collisions as f32;
        self.distance_sum += output.info.mean_distance;
        self.peak_collisions = self.peak_collisions.max(collisions as f32);

        if output.done {
            output.info.episode = self.current();
            self.report();
            // Counters restart here; the caller resets the inner env
            self.clear();
        }

        Ok(output)
    }

    fn num_agents(&self) -> usize {
        self.env.num_agents()
    }

    fn action_spaces(&self) -> Vec<&ActionSpace> {
        self.env.action_spaces()
    }

    fn observation_spaces(&self) -> Vec<&ObservationSpace> {
        self.env.observation_spaces()
    }

    fn render(&self) -> Option<&ArrayD<f32>> {
        self.env.render()
    }

    fn close(&mut self) -> Result<()> {
        self.report();
        self.clear();
        self.logger.close();
        self.env.close()
    }
}
