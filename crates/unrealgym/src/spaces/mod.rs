//! Observation and action space types.
//!
//! Action spaces are one of three shapes (discrete, continuous, mixed) and
//! observation spaces are either a pose box or an image. Both are plain sum
//! types; callers match on them instead of inspecting mode strings.

mod r#box;
mod builder;
mod discrete;
mod image;

pub use builder::{build_action_space, build_observation_space, POSE_BOUND, POSE_DIM};
pub use discrete::Discrete;
pub use image::{Dtype, ImageSpace};
pub use r#box::Box;

use crate::dispatch::{AgentAction, MixedAction, SubAction};
use ndarray::ArrayD;
use rand::Rng;

/// Trait for observation and action spaces
pub trait Space: Clone + Send + Sync {
    /// The type of samples from this space
    type Sample;

    /// Sample a random element from this space
    fn sample<R: Rng>(&self, rng: &mut R) -> Self::Sample;

    /// Check if a value is contained in this space
    fn contains(&self, value: &Self::Sample) -> bool;

    /// Get the shape of samples from this space
    fn shape(&self) -> &[usize];

    /// Get the total number of elements in a sample
    fn num_elements(&self) -> usize {
        self.shape().iter().product()
    }
}

/// Per-agent action space.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionSpace {
    Discrete(Discrete),
    Continuous(Box),
    Mixed {
        movement: Box,
        head: Discrete,
        animation: Discrete,
    },
}

impl ActionSpace {
    /// Flat shape of an action from this space
    pub fn shape(&self) -> Vec<usize> {
        match self {
            ActionSpace::Discrete(s) => s.shape().to_vec(),
            ActionSpace::Continuous(s) => s.shape().to_vec(),
            ActionSpace::Mixed { movement, .. } => vec![movement.num_elements() + 2],
        }
    }

    /// Sample a random action for this space
    pub fn sample<R: Rng>(&self, rng: &mut R) -> AgentAction {
        match self {
            ActionSpace::Discrete(s) => AgentAction::Discrete(s.sample(rng)),
            ActionSpace::Continuous(s) => AgentAction::Continuous(s.sample(rng).iter().copied().collect()),
            ActionSpace::Mixed {
                movement,
                head,
                animation,
            } => AgentAction::Mixed(MixedAction {
                movement: SubAction::Value(movement.sample(rng).iter().copied().collect()),
                head: SubAction::Index(head.sample(rng)),
                animation: animation.sample(rng),
            }),
        }
    }

    /// Check whether the action has the right variant and lies in bounds
    pub fn contains(&self, action: &AgentAction) -> bool {
        match (self, action) {
            (ActionSpace::Discrete(s), AgentAction::Discrete(i)) => s.contains(i),
            (ActionSpace::Continuous(s), AgentAction::Continuous(v)) => s.contains_slice(v),
            (
                ActionSpace::Mixed {
                    movement,
                    head,
                    animation,
                },
                AgentAction::Mixed(m),
            ) => {
                let movement_ok = match &m.movement {
                    SubAction::Value(v) => movement.contains_slice(v),
                    // Indexed moves resolve through the vocabulary, bounds are not checked here
                    SubAction::Index(_) => true,
                };
                let head_ok = match &m.head {
                    SubAction::Index(i) => head.contains(i),
                    SubAction::Value(_) => true,
                };
                movement_ok && head_ok && animation.contains(&m.animation)
            }
            _ => false,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ActionSpace::Discrete(_) => "Discrete",
            ActionSpace::Continuous(_) => "Continuous",
            ActionSpace::Mixed { .. } => "Mixed",
        }
    }
}

/// Per-agent observation space.
#[derive(Clone, Debug, PartialEq)]
pub enum ObservationSpace {
    /// `(x, y, z, roll, yaw, pitch)` in a fixed box
    Pose(Box),
    Image(ImageSpace),
}

impl ObservationSpace {
    pub fn shape(&self) -> Vec<usize> {
        match self {
            ObservationSpace::Pose(s) => s.shape().to_vec(),
            ObservationSpace::Image(s) => s.shape().to_vec(),
        }
    }

    pub fn contains(&self, value: &ArrayD<f32>) -> bool {
        match self {
            ObservationSpace::Pose(s) => s.contains(value),
            ObservationSpace::Image(s) => s.contains(value),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ObservationSpace::Image(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn mixed() -> ActionSpace {
        ActionSpace::Mixed {
            movement: Box::from_bounds(&[-30.0, -100.0], &[30.0, 100.0]).unwrap(),
            head: Discrete::new(3),
            animation: Discrete::new(2),
        }
    }

    #[test]
    fn test_sampled_actions_are_contained() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let spaces = [
            ActionSpace::Discrete(Discrete::new(5)),
            ActionSpace::Continuous(Box::from_bounds(&[-1.0, 0.0], &[1.0, 2.0]).unwrap()),
            mixed(),
        ];
        for space in &spaces {
            for _ in 0..50 {
                let action = space.sample(&mut rng);
                assert!(space.contains(&action), "{:?} not in {}", action, space.kind());
            }
        }
    }

    #[test]
    fn test_variant_mismatch_not_contained() {
        let space = ActionSpace::Discrete(Discrete::new(3));
        assert!(!space.contains(&AgentAction::Continuous(vec![0.0, 1.0])));
        assert!(!mixed().contains(&AgentAction::Discrete(0)));
    }

    #[test]
    fn test_mixed_shape() {
        assert_eq!(mixed().shape(), vec![4]);
    }
}
