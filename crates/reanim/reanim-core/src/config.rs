//! Core configuration for reanim-core.
//!
//! Passed explicitly into the engine, binder and compositor; there is no
//! process-wide playback state.

use serde::{Deserialize, Serialize};

use crate::binding::NamingConventions;

/// How a fractional frame cursor is turned into a pose.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    /// Sample at the integer-truncated frame.
    #[default]
    Hold,
    /// Blend numeric fields between the current and next frame of the range.
    Linear,
}

/// Configuration for binding heuristics, sampling and output limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ordered auto-binding rules.
    pub naming: NamingConventions,
    pub interpolation: InterpolationMode,
    /// Maximum events to retain per tick; the rest are dropped with a warning.
    pub max_events_per_tick: usize,
    /// Offset used by the spatial aligner when no Y data exists.
    pub default_alignment_offset: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            naming: NamingConventions::default(),
            interpolation: InterpolationMode::Hold,
            max_events_per_tick: 1024,
            default_alignment_offset: 0.0,
        }
    }
}
