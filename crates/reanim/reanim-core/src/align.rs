//! Spatial aligner: keyframe-space extents used to place free-floating
//! animations against a world target.
//!
//! Only frames at or after a track's first keyframe for a field contribute;
//! identity defaults before that point are never scanned. Because fields hold
//! forward, the extent over a range is the value held at the range start plus
//! every keyframe value inside the range.

use serde::{Deserialize, Serialize};

use crate::data::{Field, FrameRange, ReanimDocument, Track};
use crate::diagnostics::Warning;

/// Vertical extent in keyframe space.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct YExtent {
    pub min_y: f32,
    pub max_y: f32,
}

impl YExtent {
    #[inline]
    pub fn center(&self) -> f32 {
        (self.min_y + self.max_y) * 0.5
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

/// Axis-aligned box in keyframe space.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect {
    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }
}

/// Running min/max.
#[derive(Copy, Clone, Debug)]
struct Extent {
    min: f32,
    max: f32,
}

impl Extent {
    fn merge(acc: Option<Self>, v: f32) -> Option<Self> {
        Some(match acc {
            None => Extent { min: v, max: v },
            Some(e) => Extent {
                min: e.min.min(v),
                max: e.max.max(v),
            },
        })
    }

    fn union(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (Some(a), Some(b)) => Some(Extent {
                min: a.min.min(b.min),
                max: a.max.max(b.max),
            }),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

/// Extent of one field of one track over `range`.
fn field_extent(track: &Track, field: Field, range: FrameRange) -> Option<Extent> {
    let stream = track.stream(field);
    let first = stream.first_frame()?;
    let from = range.start.max(first);
    if from > range.end {
        return None;
    }
    let mut acc = stream.last_at(from).copied().and_then(|v| Extent::merge(None, v));
    for (frame, &value) in stream.iter() {
        if frame > from && frame <= range.end {
            acc = Extent::merge(acc, value);
        }
    }
    acc
}

fn clamp_range(document: &ReanimDocument, range: FrameRange) -> FrameRange {
    let last = document.total_frames() - 1;
    FrameRange::new(range.start.min(last), range.end.min(last))
}

fn scan(
    document: &ReanimDocument,
    track_names: &[&str],
    range: FrameRange,
    field: Field,
) -> Option<Extent> {
    let range = clamp_range(document, range);
    let mut acc = None;
    for name in track_names {
        match document.track_by_name(name) {
            Some(track) => acc = Extent::union(acc, field_extent(track, field, range)),
            None => log::warn!("bounding box: unknown track '{name}' skipped"),
        }
    }
    acc
}

/// `(min_y, max_y)` over `track_names` and `range`, or `None` when no listed
/// track sets Y inside the range.
pub fn bounding_box(
    document: &ReanimDocument,
    track_names: &[&str],
    range: FrameRange,
) -> Option<YExtent> {
    scan(document, track_names, range, Field::Y).map(|e| YExtent {
        min_y: e.min,
        max_y: e.max,
    })
}

/// Full box by the same rules. An axis without keyframes collapses to its
/// identity value; `None` only when neither axis has data.
pub fn bounding_rect(
    document: &ReanimDocument,
    track_names: &[&str],
    range: FrameRange,
) -> Option<Rect> {
    let xs = scan(document, track_names, range, Field::X);
    let ys = scan(document, track_names, range, Field::Y);
    if xs.is_none() && ys.is_none() {
        return None;
    }
    let identity = |f: Field| Extent {
        min: f.identity(),
        max: f.identity(),
    };
    let x = xs.unwrap_or_else(|| identity(Field::X));
    let y = ys.unwrap_or_else(|| identity(Field::Y));
    Some(Rect {
        min_x: x.min,
        min_y: y.min,
        max_x: x.max,
        max_y: y.max,
    })
}

/// Vertical offset that puts the tracks' keyframe-space center on a world target.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    pub offset: f32,
    /// `true` when no Y data existed and `fallback` was used instead.
    pub degraded: bool,
    pub warning: Option<Warning>,
}

/// `offset = target_world_y - center_y + fine_tune`.
///
/// Without Y data the result is `fallback + fine_tune`, flagged degraded and
/// carrying a `MissingBoundingBox` warning.
pub fn align_offset(
    document: &ReanimDocument,
    track_names: &[&str],
    range: FrameRange,
    target_world_y: f32,
    fine_tune: f32,
    fallback: f32,
) -> Alignment {
    match bounding_box(document, track_names, range) {
        Some(extent) => Alignment {
            offset: target_world_y - extent.center() + fine_tune,
            degraded: false,
            warning: None,
        },
        None => Alignment {
            offset: fallback + fine_tune,
            degraded: true,
            warning: Some(
                Warning::MissingBoundingBox {
                    tracks: track_names.iter().map(|s| s.to_string()).collect(),
                }
                .emit(),
            ),
        },
    }
}
