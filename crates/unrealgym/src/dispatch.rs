//! Map external per-agent actions onto engine move/head/animation commands.
//!
//! Mapping is pure: it reads the roster and returns three streams aligned to
//! it. Sending them is the environment's job.

use crate::agent::{AgentConfig, AgentRegistry};
use crate::env::Command;
use crate::spaces::ActionSpace;
use crate::{Result, UnrealError};
use serde::{Deserialize, Serialize};

/// A sub-action of a mixed action: either a raw value or a vocabulary index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SubAction {
    Index(usize),
    Value(Vec<f32>),
}

/// Continuous move, head turn and animation chosen together.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MixedAction {
    pub movement: SubAction,
    pub head: SubAction,
    /// Index into the animation vocabulary
    pub animation: usize,
}

/// One agent's action for a step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AgentAction {
    /// Index into the move vocabulary
    Discrete(usize),
    /// Raw move vector
    Continuous(Vec<f32>),
    Mixed(MixedAction),
}

/// Per-agent engine commands, positionally aligned to the roster.
/// `None` means the agent is left alone this step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandBatch {
    pub moves: Vec<Option<Vec<f32>>>,
    pub heads: Vec<Option<Vec<f32>>>,
    pub animations: Vec<Option<String>>,
}

impl CommandBatch {
    fn with_capacity(n: usize) -> Self {
        Self {
            moves: Vec::with_capacity(n),
            heads: Vec::with_capacity(n),
            animations: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, movement: Option<Vec<f32>>, head: Option<Vec<f32>>, animation: Option<String>) {
        self.moves.push(movement);
        self.heads.push(head);
        self.animations.push(animation);
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Flatten into the wire order: every move, then every head turn, then
    /// every animation. Uncontrolled entries are skipped.
    pub fn commands(&self, registry: &AgentRegistry) -> Vec<Command> {
        let records = registry.records();
        let mut commands = Vec::new();

        for (record, movement) in records.iter().zip(&self.moves) {
            if let Some(values) = movement {
                commands.push(Command::Move {
                    agent: record.name().to_string(),
                    values: values.clone(),
                });
            }
        }
        for (record, head) in records.iter().zip(&self.heads) {
            if let Some(rotation) = head {
                commands.push(Command::Head {
                    agent: record.name().to_string(),
                    location: record.config.relative_location,
                    rotation: rotation.clone(),
                });
            }
        }
        for (record, animation) in records.iter().zip(&self.animations) {
            if let Some(animation) = animation {
                commands.push(Command::Animate {
                    agent: record.name().to_string(),
                    animation: animation.clone(),
                });
            }
        }
        commands
    }
}

fn lookup<'a, T>(vocabulary: &'a [T], index: usize, name: &'static str) -> Result<&'a T> {
    vocabulary.get(index).ok_or(UnrealError::IndexOutOfRange {
        vocabulary: name,
        index,
        len: vocabulary.len(),
    })
}

fn resolve_move(agent: &AgentConfig, action: &SubAction) -> Result<Vec<f32>> {
    match action {
        SubAction::Index(i) => lookup(&agent.move_action, *i, "move").cloned(),
        SubAction::Value(v) => Ok(v.clone()),
    }
}

fn resolve_head(agent: &AgentConfig, action: &SubAction) -> Result<Vec<f32>> {
    match action {
        SubAction::Index(i) => {
            let heads = agent.head_action.as_deref().unwrap_or(&[]);
            lookup(heads, *i, "head").cloned()
        }
        SubAction::Value(v) => Ok(v.clone()),
    }
}

fn resolve_animation(agent: &AgentConfig, index: usize) -> Result<String> {
    let animations = agent.animation_action.as_deref().unwrap_or(&[]);
    lookup(animations, index, "animation").cloned()
}

/// Resolve one action per agent into engine commands.
///
/// `actions` must be aligned to the roster. Vocabulary indices out of range
/// are errors, never clamped.
pub fn map_actions(actions: &[Option<AgentAction>], registry: &AgentRegistry) -> Result<CommandBatch> {
    if actions.len() != registry.len() {
        return Err(UnrealError::ShapeMismatch {
            expected: vec![registry.len()],
            actual: vec![actions.len()],
        });
    }

    let mut batch = CommandBatch::with_capacity(actions.len());
    for (record, action) in registry.records().iter().zip(actions) {
        let Some(action) = action else {
            batch.push(None, None, None);
            continue;
        };
        let agent = &record.config;
        match (&record.action_space, action) {
            (ActionSpace::Discrete(_), AgentAction::Discrete(i)) => {
                let movement = lookup(&agent.move_action, *i, "move")?.clone();
                batch.push(Some(movement), None, None);
            }
            (ActionSpace::Continuous(_), AgentAction::Continuous(v)) => {
                batch.push(Some(v.clone()), None, None);
            }
            (ActionSpace::Mixed { .. }, AgentAction::Mixed(m)) => {
                batch.push(
                    Some(resolve_move(agent, &m.movement)?),
                    Some(resolve_head(agent, &m.head)?),
                    Some(resolve_animation(agent, m.animation)?),
                );
            }
            (space, _) => {
                return Err(UnrealError::InvalidAction(format!(
                    "agent '{}' has a {} action space but got {:?}",
                    agent.name,
                    space.kind(),
                    action
                )));
            }
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentCategory;
    use crate::config::{ActionType, ObservationMode};

    fn walker(name: &str) -> AgentConfig {
        AgentConfig::new(name, AgentCategory::Player)
            .with_camera(1)
            .with_move_actions(vec![vec![0.0, 100.0], vec![30.0, 0.0], vec![-30.0, 0.0]])
            .with_continuous(vec![-30.0, -100.0], vec![30.0, 100.0])
            .with_head_actions(vec![vec![0.0, 0.0, 0.0], vec![0.0, 30.0, 0.0]])
            .with_animations(vec!["stand".into(), "jump".into()])
            .with_camera_mount([0.0, 0.0, 80.0], [0.0, 0.0, 0.0])
    }

    fn roster(action_type: ActionType) -> AgentRegistry {
        AgentRegistry::from_configs(
            vec![walker("a"), walker("b")],
            action_type,
            ObservationMode::Pose,
            (16, 16),
        )
        .unwrap()
    }

    #[test]
    fn test_none_leaves_agent_uncontrolled() {
        let registry = roster(ActionType::Discrete);
        let batch = map_actions(&[None, Some(AgentAction::Discrete(2))], &registry).unwrap();
        assert_eq!(batch.moves[0], None);
        assert_eq!(batch.heads[0], None);
        assert_eq!(batch.animations[0], None);
        assert_eq!(batch.moves[1], Some(vec![-30.0, 0.0]));
    }

    #[test]
    fn test_discrete_resolves_move_vector() {
        let registry = roster(ActionType::Discrete);
        let batch = map_actions(
            &[Some(AgentAction::Discrete(1)), Some(AgentAction::Discrete(0))],
            &registry,
        )
        .unwrap();
        assert_eq!(batch.moves[0], Some(vec![30.0, 0.0]));
        assert_eq!(batch.moves[1], Some(vec![0.0, 100.0]));
        assert!(batch.heads.iter().all(Option::is_none));
    }

    #[test]
    fn test_discrete_out_of_range_is_error() {
        let registry = roster(ActionType::Discrete);
        let err = map_actions(&[Some(AgentAction::Discrete(3)), None], &registry).unwrap_err();
        assert!(matches!(
            err,
            UnrealError::IndexOutOfRange {
                vocabulary: "move",
                index: 3,
                len: 3
            }
        ));
    }

    #[test]
    fn test_continuous_passthrough() {
        let registry = roster(ActionType::Continuous);
        let batch = map_actions(
            &[Some(AgentAction::Continuous(vec![12.5, -40.0])), None],
            &registry,
        )
        .unwrap();
        assert_eq!(batch.moves[0], Some(vec![12.5, -40.0]));
        assert_eq!(batch.animations[0], None);
    }

    #[test]
    fn test_mixed_resolves_each_sub_action() {
        let registry = roster(ActionType::Mixed);
        let actions = [
            Some(AgentAction::Mixed(MixedAction {
                movement: SubAction::Value(vec![5.0, 50.0]),
                head: SubAction::Index(1),
                animation: 1,
            })),
            Some(AgentAction::Mixed(MixedAction {
                movement: SubAction::Index(2),
                head: SubAction::Value(vec![0.0, -15.0, 0.0]),
                animation: 0,
            })),
        ];
        let batch = map_actions(&actions, &registry).unwrap();
        assert_eq!(batch.moves, vec![Some(vec![5.0, 50.0]), Some(vec![-30.0, 0.0])]);
        assert_eq!(
            batch.heads,
            vec![Some(vec![0.0, 30.0, 0.0]), Some(vec![0.0, -15.0, 0.0])]
        );
        assert_eq!(
            batch.animations,
            vec![Some("jump".to_string()), Some("stand".to_string())]
        );
    }

    #[test]
    fn test_mixed_animation_out_of_range() {
        let registry = roster(ActionType::Mixed);
        let action = AgentAction::Mixed(MixedAction {
            movement: SubAction::Index(0),
            head: SubAction::Index(0),
            animation: 5,
        });
        assert!(matches!(
            map_actions(&[None, Some(action)], &registry),
            Err(UnrealError::IndexOutOfRange {
                vocabulary: "animation",
                ..
            })
        ));
    }

    #[test]
    fn test_variant_mismatch_and_length() {
        let registry = roster(ActionType::Discrete);
        assert!(matches!(
            map_actions(&[Some(AgentAction::Continuous(vec![0.0, 0.0])), None], &registry),
            Err(UnrealError::InvalidAction(_))
        ));
        assert!(matches!(
            map_actions(&[None], &registry),
            Err(UnrealError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_commands_wire_order() {
        let registry = roster(ActionType::Mixed);
        let action = AgentAction::Mixed(MixedAction {
            movement: SubAction::Index(0),
            head: SubAction::Index(1),
            animation: 0,
        });
        let batch = map_actions(&[Some(action.clone()), Some(action)], &registry).unwrap();
        let commands = batch.commands(&registry);
        assert_eq!(commands.len(), 6);
        assert!(matches!(&commands[0], Command::Move { agent, .. } if agent == "a"));
        assert!(matches!(&commands[1], Command::Move { agent, .. } if agent == "b"));
        assert!(matches!(
            &commands[2],
            Command::Head { location, .. } if *location == [0.0, 0.0, 80.0]
        ));
        assert!(matches!(&commands[5], Command::Animate { animation, .. } if animation == "stand"));
    }
}
