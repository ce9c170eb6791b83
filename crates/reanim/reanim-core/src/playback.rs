//! Per-animation playback configuration and the standalone catalogue.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::data::{FrameRange, ReanimDocument};
use crate::error::{ParseError, ValidationError};

/// How an independent animation is composed into its entity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackMode {
    #[default]
    Simple,
    Skeleton,
    Sequence,
    ComplexScene,
    /// Tracks without an explicit parent are attached under `parent_bone`.
    Blended { parent_bone: String },
}

impl PlaybackMode {
    /// Parse the `mode` string of an animation config.
    pub fn parse(
        animation: &str,
        mode: Option<&str>,
        parent_bone: Option<&str>,
    ) -> Result<Self, ValidationError> {
        match mode.unwrap_or("Simple") {
            "Simple" => Ok(Self::Simple),
            "Skeleton" => Ok(Self::Skeleton),
            "Sequence" => Ok(Self::Sequence),
            "ComplexScene" => Ok(Self::ComplexScene),
            "Blended" => match parent_bone.filter(|b| !b.is_empty()) {
                Some(bone) => Ok(Self::Blended {
                    parent_bone: bone.to_string(),
                }),
                None => Err(ValidationError::MissingParentBone {
                    animation: animation.to_string(),
                }),
            },
            other => Err(ValidationError::InvalidPlaybackMode {
                value: other.to_string(),
            }),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple => "Simple",
            Self::Skeleton => "Skeleton",
            Self::Sequence => "Sequence",
            Self::ComplexScene => "ComplexScene",
            Self::Blended { .. } => "Blended",
        }
    }

    #[inline]
    pub fn parent_bone(&self) -> Option<&str> {
        match self {
            Self::Blended { parent_bone } => Some(parent_bone),
            _ => None,
        }
    }
}

/// Declarative per-animation settings as they appear in config files.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAnimationConfig {
    pub mode: Option<String>,
    /// Seconds to pause between loop iterations.
    pub delay_duration: Option<f32>,
    pub is_looping: Option<bool>,
    pub is_active: Option<bool>,
    pub render_when_stopped: Option<bool>,
    pub lock_at_frame: Option<u32>,
    pub controlled_tracks: Option<Vec<String>>,
    pub parent_bone: Option<String>,
    pub speed: Option<f32>,
    /// Inclusive `[start, end]` in document frames.
    pub frame_range: Option<[u32; 2]>,
}

/// Validated settings for one independent animation of a combo.
#[derive(Clone, Debug, PartialEq)]
pub struct IndependentAnimationConfig {
    pub name: String,
    pub mode: PlaybackMode,
    pub delay_duration: f32,
    /// Effective loop flag after combo-level and per-animation overrides.
    pub is_looping: bool,
    pub is_active: bool,
    pub render_when_stopped: bool,
    /// Range-local frame to pin at when a non-looping run ends; `None` = last frame.
    pub lock_at_frame: Option<u32>,
    pub controlled_tracks: Option<Vec<String>>,
    pub speed: f32,
    /// Resolved document span this animation plays.
    pub frame_range: FrameRange,
}

impl IndependentAnimationConfig {
    /// Resolve a raw config against the document.
    ///
    /// `loop_override` comes from the combo's `animation_loop_states`; it beats
    /// the animation's own `is_looping`, which beats the combo-level `combo_loop`.
    pub fn resolve(
        name: &str,
        raw: &RawAnimationConfig,
        loop_override: Option<bool>,
        combo_loop: bool,
        document: &ReanimDocument,
    ) -> Result<Self, ValidationError> {
        let mode = PlaybackMode::parse(name, raw.mode.as_deref(), raw.parent_bone.as_deref())?;
        if let Some(bone) = mode.parent_bone() {
            require_track(document, bone)?;
        }

        let delay_duration = non_negative(name, "delay_duration", raw.delay_duration, 0.0)?;
        let speed = non_negative(name, "speed", raw.speed, 1.0)?;

        if let Some(tracks) = &raw.controlled_tracks {
            for track in tracks {
                require_track(document, track)?;
            }
        }

        let frame_range = match raw.frame_range {
            Some([start, end]) => {
                if start > end || end >= document.total_frames() {
                    return Err(ValidationError::InvalidFrameRange {
                        animation: name.to_string(),
                        start,
                        end,
                    });
                }
                FrameRange::new(start, end)
            }
            None => document
                .animation_range(name)
                .unwrap_or_else(|| document.full_range()),
        };

        Ok(Self {
            name: name.to_string(),
            mode,
            delay_duration,
            is_looping: loop_override.or(raw.is_looping).unwrap_or(combo_loop),
            is_active: raw.is_active.unwrap_or(true),
            render_when_stopped: raw.render_when_stopped.unwrap_or(true),
            lock_at_frame: raw.lock_at_frame,
            controlled_tracks: raw.controlled_tracks.clone(),
            speed,
            frame_range,
        })
    }

    /// Range-local lock frame, clamped into the range.
    #[inline]
    pub fn lock_frame(&self) -> u32 {
        let last = self.frame_range.len() - 1;
        self.lock_at_frame.map_or(last, |f| f.min(last))
    }
}

fn require_track(document: &ReanimDocument, track: &str) -> Result<(), ValidationError> {
    if document.contains_track(track) {
        Ok(())
    } else {
        Err(ValidationError::UnknownTrack {
            track: track.to_string(),
        })
    }
}

fn non_negative(
    animation: &str,
    field: &str,
    value: Option<f32>,
    default: f32,
) -> Result<f32, ValidationError> {
    match value {
        None => Ok(default),
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(ValidationError::InvalidNumber {
            animation: animation.to_string(),
            field: field.to_string(),
            value: v,
        }),
    }
}

/// Standalone catalogue of animation names and their default settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationCatalogue {
    #[serde(default)]
    pub animations: HashMap<String, RawAnimationConfig>,
}

impl AnimationCatalogue {
    pub fn from_json_str(s: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(s)?)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&RawAnimationConfig> {
        self.animations.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, cfg: RawAnimationConfig) {
        self.animations.insert(name.into(), cfg);
    }
}
