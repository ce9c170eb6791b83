use serde::Deserialize;

use crate::data::{Keyframe, ReanimDocument, Track};
use crate::error::ParseError;

/// Public API: parse a reanim document from its JSON rendition into the
/// canonical, immutable [`ReanimDocument`].
///
/// Notes:
/// - `frame` may be omitted on a keyframe; it then follows the previous keyframe
///   on the same track (first keyframe = frame 0).
/// - Negative explicit frames, and frames of `u32::MAX` or more, are
///   `MalformedFrameIndex`; frames going backwards are `NonMonotonicFrames`.
///   Repeated frames are accepted and the later record wins field by field.
/// - `frames` is accepted as an alias of `keyframes`, and `sx`/`sy`/`kx`/`a`/`i`
///   as aliases of the long field names used by exported assets.
pub fn parse_reanim_json(s: &str) -> Result<ReanimDocument, ParseError> {
    let raw: RawDocument = serde_json::from_str(s)?;
    document_from_raw(raw)
}

/// Same as [`parse_reanim_json`] for an already-decoded JSON value.
pub fn parse_reanim_value(value: serde_json::Value) -> Result<ReanimDocument, ParseError> {
    let raw: RawDocument = serde_json::from_value(value)?;
    document_from_raw(raw)
}

fn document_from_raw(raw: RawDocument) -> Result<ReanimDocument, ParseError> {
    if !raw.fps.is_finite() || raw.fps <= 0.0 {
        return Err(ParseError::InvalidFps { fps: raw.fps });
    }

    let mut tracks = Vec::with_capacity(raw.tracks.len());
    for rt in raw.tracks {
        let mut keyframes = Vec::with_capacity(rt.keyframes.len());
        let mut next_implicit: i64 = 0;
        for rk in rt.keyframes {
            let frame = rk.frame.unwrap_or(next_implicit);
            // `u32::MAX` would leave no room for `total_frames`.
            let frame = u32::try_from(frame)
                .ok()
                .filter(|&f| f < u32::MAX)
                .ok_or_else(|| ParseError::MalformedFrameIndex {
                    track: rt.name.clone(),
                    frame,
                })?;
            next_implicit = i64::from(frame) + 1;
            keyframes.push(Keyframe {
                frame,
                x: rk.x,
                y: rk.y,
                scale_x: rk.scale_x,
                scale_y: rk.scale_y,
                rotation: rk.rotation,
                opacity: rk.opacity,
                image: rk.image.filter(|i| !i.is_empty()),
                visible: rk.visible,
            });
        }
        tracks.push(Track::new(rt.name, rt.parent, keyframes)?);
    }

    ReanimDocument::new(raw.fps as f32, tracks)
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct RawDocument {
    fps: f64,
    #[serde(default)]
    tracks: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    name: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default, alias = "frames")]
    keyframes: Vec<RawKeyframe>,
}

#[derive(Debug, Deserialize)]
struct RawKeyframe {
    #[serde(default)]
    frame: Option<i64>,
    #[serde(default)]
    x: Option<f32>,
    #[serde(default)]
    y: Option<f32>,
    #[serde(default, alias = "sx")]
    scale_x: Option<f32>,
    #[serde(default, alias = "sy")]
    scale_y: Option<f32>,
    #[serde(default, alias = "kx")]
    rotation: Option<f32>,
    #[serde(default, alias = "a")]
    opacity: Option<f32>,
    #[serde(default, alias = "i")]
    image: Option<String>,
    #[serde(default)]
    visible: Option<bool>,
}
