//! Input contracts for the engine.
//!
//! The entity/command layer builds these and passes them into
//! `Engine::update()` once per tick.

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Inputs {
    /// Applied in order before any timeline advances.
    #[serde(default)]
    pub commands: Vec<EntityCommand>,
}

impl Inputs {
    pub fn with(commands: impl IntoIterator<Item = EntityCommand>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EntityCommand {
    /// Start (or restart) a registered combo by name.
    Play { entity: EntityId, combo: String },
    /// Drop every timeline of the entity.
    Stop { entity: EntityId },
    /// Deactivate or reactivate one animation, or all of them when `animation` is `None`.
    SetActive {
        entity: EntityId,
        #[serde(default)]
        animation: Option<String>,
        active: bool,
    },
    /// Rewind one animation, or all of them, to the start of its range.
    Restart {
        entity: EntityId,
        #[serde(default)]
        animation: Option<String>,
    },
}
