//! Non-fatal runtime degradations.
//!
//! Warnings are logged through the `log` facade and also handed back to the
//! caller as values, so a host without a logger still sees them.

use serde::{Deserialize, Serialize};

use crate::ids::EntityId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Warning {
    /// A document track is owned by no timeline and renders its static pose.
    UnboundTrack { track: String },
    /// No track in the set ever sets Y; the fallback alignment offset was used.
    MissingBoundingBox { tracks: Vec<String> },
    /// A command addressed an entity that does not exist.
    UnknownEntity { entity: EntityId },
    /// `Play` named a combo that was never registered.
    UnknownCombo { combo: String },
    /// A command named an animation the entity is not playing.
    UnknownAnimation { animation: String },
}

impl Warning {
    /// Log this warning and pass it through.
    pub fn emit(self) -> Self {
        match &self {
            Warning::UnboundTrack { track } => {
                log::warn!("track '{track}' is not bound to any animation; using static pose")
            }
            Warning::MissingBoundingBox { tracks } => {
                log::warn!("no Y keyframes in tracks {tracks:?}; using fallback alignment offset")
            }
            Warning::UnknownEntity { entity } => log::warn!("unknown entity {entity:?}"),
            Warning::UnknownCombo { combo } => log::warn!("unknown combo '{combo}'"),
            Warning::UnknownAnimation { animation } => {
                log::warn!("animation '{animation}' is not playing on this entity")
            }
        }
        self
    }
}
