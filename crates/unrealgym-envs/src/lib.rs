//! Built-in sensor services and agent presets for unrealgym.
//!
//! Provides:
//! - `MockUnreal` - an in-process scene that answers every `SensorService`
//!   call without a running engine
//! - Agent templates and a ready-made demo setting

mod mock;
mod presets;

pub use mock::MockUnreal;
pub use presets::{demo_setting, drone_template, npc_template, player_template};
