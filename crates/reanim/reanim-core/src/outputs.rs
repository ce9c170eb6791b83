//! Output contracts from the engine.
//!
//! Outputs carry the semantic events of one tick. Poses are pulled separately
//! through `Engine::compose` by the renderer.

use serde::{Deserialize, Serialize};

use crate::diagnostics::Warning;
use crate::ids::{ComboId, EntityId};

/// Discrete signals emitted during a tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoreEvent {
    PlaybackStarted {
        entity: EntityId,
        combo: ComboId,
    },
    PlaybackStopped {
        entity: EntityId,
    },
    LoopCompleted {
        entity: EntityId,
        animation: String,
    },
    DelayStarted {
        entity: EntityId,
        animation: String,
    },
    DelayElapsed {
        entity: EntityId,
        animation: String,
    },
    Locked {
        entity: EntityId,
        animation: String,
        frame: u32,
    },
    Warning(Warning),
}

/// Outputs returned by `Engine::update()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Warning> + '_ {
        self.events.iter().filter_map(|e| match e {
            CoreEvent::Warning(w) => Some(w),
            _ => None,
        })
    }
}
