//! Reanim Core (renderer-agnostic)
//!
//! Loads multi-track keyframe documents and declarative combo configurations,
//! binds document tracks to independently timed animations, advances their
//! timelines per tick and composes one ordered draw list per entity. Also
//! provides the bounding-box aligner used to place free-floating animations
//! against world targets.

pub mod align;
pub mod binding;
pub mod combo;
pub mod compose;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod ids;
pub mod inputs;
pub mod outputs;
pub mod playback;
pub mod sampling;
pub mod stored_reanim;
pub mod timeline;
pub mod transform;

// Re-exports for consumers (renderer / entity layer)
pub use align::{align_offset, bounding_box, bounding_rect, Alignment, Rect, YExtent};
pub use binding::{bind_tracks, infer_animation, MatchRule, NamingConventions, TrackBindings};
pub use combo::{resolve_combo, AnimationCombo, BindingStrategy, RawComboConfig};
pub use compose::{compose_frame, ComposedFrame, Compositor, DrawItem};
pub use config::{EngineConfig, InterpolationMode};
pub use data::{Field, FrameRange, Keyframe, ReanimDocument, Track};
pub use diagnostics::Warning;
pub use engine::{Engine, Entity, ResolvedCombo};
pub use error::{LoadError, ParseError, ValidationError};
pub use ids::{ComboId, DocId, EntityId};
pub use inputs::{EntityCommand, Inputs};
pub use outputs::{CoreEvent, Outputs};
pub use playback::{
    AnimationCatalogue, IndependentAnimationConfig, PlaybackMode, RawAnimationConfig,
};
pub use sampling::{resolve_pose, sample_pose, ResolvedPose};
pub use stored_reanim::{parse_reanim_json, parse_reanim_value};
pub use timeline::{spawn_timelines, RuntimeTimeline, TimelineEvent, TimelineState};
pub use transform::Affine2;
