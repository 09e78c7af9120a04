//! Appearance randomization.

use crate::agent::{AgentCategory, AgentRegistry};
use crate::env::SensorService;
use crate::Result;
use rand::Rng;
use std::ops::Range;

/// Appearance ids the engine ships for a category, if any.
pub fn appearance_range(category: &AgentCategory) -> Option<Range<u32>> {
    match category {
        AgentCategory::Player => Some(1..19),
        AgentCategory::Animal => Some(0..27),
        AgentCategory::Drone => Some(0..1),
        _ => None,
    }
}

/// Give every agent with a known appearance range a random appearance.
/// Agents of other categories are left untouched.
pub fn randomize_appearance<S, R>(service: &mut S, registry: &AgentRegistry, rng: &mut R) -> Result<()>
where
    S: SensorService + ?Sized,
    R: Rng + ?Sized,
{
    for record in registry.records() {
        let Some(range) = appearance_range(&record.config.category) else {
            continue;
        };
        let appearance = rng.gen_range(range);
        service.set_entity_appearance(record.name(), appearance)?;
    }
    Ok(())
}
