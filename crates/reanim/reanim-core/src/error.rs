//! Error types for document parsing and combo validation.
//!
//! Every load-time failure is fail-fast: the first problem found is returned
//! and the asset is not loaded. Runtime degradations are not errors; they are
//! reported through [`crate::diagnostics::Warning`].

use serde::{Deserialize, Serialize};

/// Malformed reanim document.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ParseError {
    /// The raw asset is not valid JSON for the document schema
    #[error("Malformed document: {reason}")]
    Json { reason: String },

    /// FPS must be finite and strictly positive
    #[error("Invalid fps {fps}: must be finite and > 0")]
    InvalidFps { fps: f64 },

    /// Frame index that cannot be represented (negative or too large)
    #[error("Malformed frame index {frame} in track '{track}'")]
    MalformedFrameIndex { track: String, frame: i64 },

    /// Frame indices went backwards within one track
    #[error("Frame indices must be non-decreasing in track '{track}': {frame} follows {previous}")]
    NonMonotonicFrames {
        track: String,
        previous: u32,
        frame: u32,
    },

    /// Two tracks share a name
    #[error("Duplicate track name: {track}")]
    DuplicateTrack { track: String },

    /// A track without a name
    #[error("Track names must not be empty")]
    EmptyTrackName,

    /// Track-declared parent that does not exist in the document
    #[error("Track '{track}' declares unknown parent '{parent}'")]
    UnknownParent { track: String, parent: String },

    /// Track-declared parents form a cycle
    #[error("Cyclic parent declaration involving track '{track}'")]
    CyclicParent { track: String },

    /// The document carries no keyframes at all
    #[error("Document has no keyframes")]
    NoFrames,
}

impl ParseError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Json { .. } => "serialization",
            Self::InvalidFps { .. }
            | Self::MalformedFrameIndex { .. }
            | Self::NonMonotonicFrames { .. }
            | Self::NoFrames => "timing",
            Self::DuplicateTrack { .. }
            | Self::EmptyTrackName
            | Self::UnknownParent { .. }
            | Self::CyclicParent { .. } => "structure",
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            reason: err.to_string(),
        }
    }
}

/// Combo configuration rejected by [`crate::combo::resolve_combo`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ValidationError {
    /// A required field is absent or empty
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// `animations` is empty
    #[error("Combo '{combo}' lists no animations")]
    EmptyAnimationList { combo: String },

    /// The same animation is listed twice
    #[error("Animation '{name}' is listed more than once")]
    DuplicateAnimation { name: String },

    /// Animation name not present in the catalogue or combo
    #[error("Undefined animation reference: {name}")]
    UndefinedAnimationReference { name: String },

    /// `binding_strategy` is neither "auto" nor "manual"
    #[error("Invalid binding strategy '{value}' (expected \"auto\" or \"manual\")")]
    InvalidBindingStrategy { value: String },

    /// Manual strategy without any bindings
    #[error("Combo '{combo}' uses manual binding but declares no manual_bindings")]
    MissingManualBindings { combo: String },

    /// The parent hierarchy contains a cycle
    #[error("Cyclic parent_tracks involving track '{track}'")]
    CyclicParentTracks { track: String },

    /// Track name not present in the document
    #[error("Unknown track: {track}")]
    UnknownTrack { track: String },

    /// `mode` string is not a known playback mode
    #[error("Invalid playback mode '{value}'")]
    InvalidPlaybackMode { value: String },

    /// Blended animation without a `parent_bone`
    #[error("Blended animation '{animation}' requires parent_bone")]
    MissingParentBone { animation: String },

    /// Explicit frame range outside the document or inverted
    #[error("Invalid frame range [{start}, {end}] for animation '{animation}'")]
    InvalidFrameRange {
        animation: String,
        start: u32,
        end: u32,
    },

    /// Negative or non-finite numeric setting
    #[error("Invalid {field} for animation '{animation}': {value}")]
    InvalidNumber {
        animation: String,
        field: String,
        value: f32,
    },

    /// `reanim_file` names a document that was never loaded
    #[error("Unknown reanim document: {reanim_file}")]
    UnknownDocument { reanim_file: String },
}

impl ValidationError {
    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingField { .. }
            | Self::EmptyAnimationList { .. }
            | Self::MissingManualBindings { .. }
            | Self::MissingParentBone { .. } => "required",
            Self::DuplicateAnimation { .. }
            | Self::UndefinedAnimationReference { .. }
            | Self::UnknownTrack { .. }
            | Self::UnknownDocument { .. } => "reference",
            Self::InvalidBindingStrategy { .. }
            | Self::InvalidPlaybackMode { .. }
            | Self::InvalidFrameRange { .. }
            | Self::InvalidNumber { .. } => "value",
            Self::CyclicParentTracks { .. } => "hierarchy",
        }
    }
}

/// Either failure of a parse-then-resolve load.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl LoadError {
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse(e) => e.category(),
            Self::Validation(e) => e.category(),
        }
    }
}
