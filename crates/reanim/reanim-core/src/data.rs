//! Immutable reanim document model.
//!
//! A document is a frame rate plus an ordered list of named tracks. Each track
//! carries sparse keyframes: a field absent at frame N holds the last value set
//! before N on the same track, or the field's identity value if none was set.
//! Every field is stored as its own sorted stream so resolution is a binary
//! search and the document never needs per-frame caches.

use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::hierarchy::find_parent_cycle;

/// Prefix of range-marker tracks (`anim_<name>`).
pub const RANGE_MARKER_PREFIX: &str = "anim_";

/// Numeric keyframe fields.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    X,
    Y,
    ScaleX,
    ScaleY,
    Rotation,
    Opacity,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::X,
        Field::Y,
        Field::ScaleX,
        Field::ScaleY,
        Field::Rotation,
        Field::Opacity,
    ];

    /// Value used when no keyframe on the track ever set this field.
    #[inline]
    pub fn identity(self) -> f32 {
        match self {
            Field::ScaleX | Field::ScaleY | Field::Opacity => 1.0,
            Field::X | Field::Y | Field::Rotation => 0.0,
        }
    }

    #[inline]
    fn slot(self) -> usize {
        self as usize
    }
}

/// One sparse keyframe record. Absent fields hold the previous value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: u32,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub scale_x: Option<f32>,
    #[serde(default)]
    pub scale_y: Option<f32>,
    /// Degrees.
    #[serde(default)]
    pub rotation: Option<f32>,
    #[serde(default)]
    pub opacity: Option<f32>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
}

impl Keyframe {
    pub fn at(frame: u32) -> Self {
        Self {
            frame,
            ..Default::default()
        }
    }

    #[inline]
    pub fn field(&self, field: Field) -> Option<f32> {
        match field {
            Field::X => self.x,
            Field::Y => self.y,
            Field::ScaleX => self.scale_x,
            Field::ScaleY => self.scale_y,
            Field::Rotation => self.rotation,
            Field::Opacity => self.opacity,
        }
    }
}

/// Sorted (frame, value) pairs for a single field of a single track.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldStream<T> {
    frames: Vec<u32>,
    values: Vec<T>,
}

impl<T> Default for FieldStream<T> {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T> FieldStream<T> {
    /// Append a value. Frames must arrive in non-decreasing order; a repeated
    /// frame replaces the previous value.
    fn push(&mut self, frame: u32, value: T) {
        if self.frames.last() == Some(&frame) {
            if let Some(last) = self.values.last_mut() {
                *last = value;
            }
            return;
        }
        self.frames.push(frame);
        self.values.push(value);
    }

    /// Last value set at or before `frame`.
    #[inline]
    pub fn last_at(&self, frame: u32) -> Option<&T> {
        let idx = self.frames.partition_point(|&f| f <= frame);
        if idx == 0 {
            None
        } else {
            self.values.get(idx - 1)
        }
    }

    #[inline]
    pub fn first_frame(&self) -> Option<u32> {
        self.frames.first().copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> + '_ {
        self.frames.iter().copied().zip(self.values.iter())
    }
}

/// A named channel of keyframes.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    name: String,
    parent: Option<String>,
    keyframes: Vec<Keyframe>,
    numeric: [FieldStream<f32>; 6],
    images: FieldStream<Arc<str>>,
    visibility: FieldStream<bool>,
}

impl Track {
    /// Build a track from keyframes in non-decreasing frame order.
    pub fn new(
        name: impl Into<String>,
        parent: Option<String>,
        keyframes: Vec<Keyframe>,
    ) -> Result<Self, ParseError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ParseError::EmptyTrackName);
        }
        let mut numeric: [FieldStream<f32>; 6] = Default::default();
        let mut images = FieldStream::default();
        let mut visibility = FieldStream::default();

        let mut previous: Option<u32> = None;
        for kf in &keyframes {
            if let Some(prev) = previous {
                if kf.frame < prev {
                    return Err(ParseError::NonMonotonicFrames {
                        track: name,
                        previous: prev,
                        frame: kf.frame,
                    });
                }
            }
            previous = Some(kf.frame);

            for field in Field::ALL {
                if let Some(v) = kf.field(field) {
                    numeric[field.slot()].push(kf.frame, v);
                }
            }
            if let Some(image) = &kf.image {
                images.push(kf.frame, Arc::from(image.as_str()));
            }
            if let Some(visible) = kf.visible {
                visibility.push(kf.frame, visible);
            }
        }

        Ok(Self {
            name,
            parent: parent.filter(|p| !p.is_empty()),
            keyframes,
            numeric,
            images,
            visibility,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent declared by the document itself (combo `parent_tracks` may override).
    #[inline]
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    #[inline]
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    #[inline]
    pub fn stream(&self, field: Field) -> &FieldStream<f32> {
        &self.numeric[field.slot()]
    }

    #[inline]
    pub fn image_stream(&self) -> &FieldStream<Arc<str>> {
        &self.images
    }

    #[inline]
    pub fn visibility_stream(&self) -> &FieldStream<bool> {
        &self.visibility
    }

    /// Whether any keyframe on this track sets `field`.
    #[inline]
    pub fn sets(&self, field: Field) -> bool {
        !self.stream(field).is_empty()
    }

    pub fn last_frame(&self) -> Option<u32> {
        self.keyframes.last().map(|k| k.frame)
    }

    /// Hold-forward value of `field` at `frame`, if any keyframe at or before it set one.
    #[inline]
    pub fn field_at(&self, frame: u32, field: Field) -> Option<f32> {
        self.stream(field).last_at(frame).copied()
    }

    /// Hold-forward value of `field` at `frame`, defaulting to the identity value.
    #[inline]
    pub fn resolve(&self, frame: u32, field: Field) -> f32 {
        self.field_at(frame, field)
            .unwrap_or_else(|| field.identity())
    }

    #[inline]
    pub fn image_at(&self, frame: u32) -> Option<&Arc<str>> {
        self.images.last_at(frame)
    }

    #[inline]
    pub fn visible_at(&self, frame: u32) -> bool {
        self.visibility.last_at(frame).copied().unwrap_or(true)
    }
}

/// Inclusive span of document frames.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: u32,
    pub end: u32,
}

impl FrameRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of frames covered; never zero for a well-formed range.
    #[inline]
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start) + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn contains(&self, frame: u32) -> bool {
        frame >= self.start && frame <= self.end
    }
}

/// Parsed reanim asset. Immutable after construction and shared by reference.
#[derive(Clone, Debug, PartialEq)]
pub struct ReanimDocument {
    fps: f32,
    tracks: Vec<Track>,
    index: HashMap<String, usize>,
    total_frames: u32,
}

impl ReanimDocument {
    /// Validate and assemble a document. Track order is render order.
    pub fn new(fps: f32, tracks: Vec<Track>) -> Result<Self, ParseError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ParseError::InvalidFps { fps: fps as f64 });
        }

        let mut index = HashMap::with_capacity(tracks.len());
        for (i, track) in tracks.iter().enumerate() {
            if index.insert(track.name.clone(), i).is_some() {
                return Err(ParseError::DuplicateTrack {
                    track: track.name.clone(),
                });
            }
        }

        let mut declared: HashMap<String, String> = HashMap::new();
        for track in &tracks {
            if let Some(parent) = track.parent() {
                if !index.contains_key(parent) {
                    return Err(ParseError::UnknownParent {
                        track: track.name.clone(),
                        parent: parent.to_string(),
                    });
                }
                declared.insert(track.name.clone(), parent.to_string());
            }
        }
        if let Some(track) = find_parent_cycle(&declared) {
            return Err(ParseError::CyclicParent { track });
        }

        let total_frames = match tracks.iter().filter_map(Track::last_frame).max() {
            Some(last) => last.saturating_add(1),
            None => return Err(ParseError::NoFrames),
        };

        Ok(Self {
            fps,
            tracks,
            index,
            total_frames,
        })
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[inline]
    pub fn track_by_name(&self, name: &str) -> Option<&Track> {
        self.index.get(name).map(|&i| &self.tracks[i])
    }

    #[inline]
    pub fn track_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    #[inline]
    pub fn contains_track(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Max keyframe index across all tracks + 1.
    #[inline]
    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    #[inline]
    pub fn full_range(&self) -> FrameRange {
        FrameRange::new(0, self.total_frames - 1)
    }

    /// Hold-forward resolution of one field of `track` at `frame`.
    #[inline]
    pub fn resolve_field(&self, track: &Track, frame: u32, field: Field) -> f32 {
        track.resolve(frame, field)
    }

    /// Span of the `anim_<name>` marker track: its first visible run, up to the
    /// frame before the next hidden keyframe or the document end.
    pub fn animation_range(&self, animation: &str) -> Option<FrameRange> {
        let marker = self.track_by_name(&marker_name(animation))?;
        let first = marker
            .keyframes()
            .iter()
            .map(|kf| kf.frame)
            .find(|&f| marker.visible_at(f))?;
        let end = marker
            .visibility_stream()
            .iter()
            .find(|(f, v)| *f > first && !**v)
            .map(|(f, _)| f - 1)
            .unwrap_or(self.total_frames - 1);
        Some(FrameRange::new(first, end))
    }

    /// Names of range-marker tracks for the given animations that exist in this document.
    pub fn range_markers<'a>(&self, animations: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
        animations
            .into_iter()
            .map(marker_name)
            .filter(|m| self.contains_track(m))
            .collect()
    }
}

#[inline]
pub fn marker_name(animation: &str) -> String {
    format!("{RANGE_MARKER_PREFIX}{animation}")
}
