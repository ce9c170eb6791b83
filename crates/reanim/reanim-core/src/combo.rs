//! Combo configuration: raw schema, resolved model and fail-fast validation.
//!
//! A combo names the independent animations that play together on one
//! entity, how document tracks are assigned to them, the parent hierarchy
//! and which tracks are never drawn. `resolve_combo` checks the raw config in
//! a fixed order and returns the first problem it finds.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::data::ReanimDocument;
use crate::error::{ParseError, ValidationError};
use crate::hierarchy::find_parent_cycle;
use crate::playback::{AnimationCatalogue, IndependentAnimationConfig, RawAnimationConfig};

/// How document tracks are assigned to independent animations.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingStrategy {
    #[default]
    Auto,
    Manual,
}

impl BindingStrategy {
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value {
            "auto" => Ok(Self::Auto),
            "manual" => Ok(Self::Manual),
            other => Err(ValidationError::InvalidBindingStrategy {
                value: other.to_string(),
            }),
        }
    }
}

/// Combo configuration as authored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawComboConfig {
    pub reanim_file: Option<String>,
    pub name: Option<String>,
    pub animations: Vec<String>,
    #[serde(rename = "loop")]
    pub loop_all: Option<bool>,
    /// Per-animation loop overrides.
    pub animation_loop_states: HashMap<String, bool>,
    /// "auto" (default) or "manual".
    pub binding_strategy: Option<String>,
    pub manual_bindings: HashMap<String, String>,
    /// child track -> parent track
    pub parent_tracks: HashMap<String, String>,
    pub hidden_tracks: Vec<String>,
    /// Per-animation settings embedded in the combo; these beat catalogue entries.
    pub animation_configs: HashMap<String, RawAnimationConfig>,
}

impl RawComboConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Validated combo, read-only and shared by every entity playing it.
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationCombo {
    pub name: String,
    pub reanim_file: String,
    /// Declaration order; index `i` matches `animation_configs[i]`.
    pub animations: Vec<String>,
    pub looping: bool,
    pub strategy: BindingStrategy,
    pub manual_bindings: HashMap<String, String>,
    pub parent_tracks: HashMap<String, String>,
    pub hidden_tracks: HashSet<String>,
    pub animation_configs: Vec<IndependentAnimationConfig>,
}

impl AnimationCombo {
    #[inline]
    pub fn animation_index(&self, name: &str) -> Option<usize> {
        self.animations.iter().position(|a| a == name)
    }

    #[inline]
    pub fn animation_config(&self, name: &str) -> Option<&IndependentAnimationConfig> {
        self.animation_configs.iter().find(|c| c.name == name)
    }

    #[inline]
    pub fn is_hidden(&self, track: &str) -> bool {
        self.hidden_tracks.contains(track)
    }

    /// Effective parent of `track`: combo override first, then the document's own.
    pub fn parent_of<'a>(&'a self, document: &'a ReanimDocument, track: &str) -> Option<&'a str> {
        self.parent_tracks
            .get(track)
            .map(String::as_str)
            .or_else(|| document.track_by_name(track).and_then(|t| t.parent()))
    }
}

/// Validate `raw` against `document` (and the catalogue, when supplied).
///
/// Check order:
/// 1. `reanim_file` present and non-empty
/// 2. `name` non-empty, `animations` non-empty and without duplicates
/// 3. catalogue membership of every animation / manual-binding target
/// 4. `binding_strategy` is "auto" or "manual"
/// 5. manual strategy has bindings
/// 6. `parent_tracks` is acyclic
///
/// then track existence, manual targets, per-animation settings, and
/// acyclicity of the merged document + combo hierarchy.
pub fn resolve_combo(
    raw: &RawComboConfig,
    document: &ReanimDocument,
    catalogue: Option<&AnimationCatalogue>,
) -> Result<AnimationCombo, ValidationError> {
    let reanim_file = non_empty(raw.reanim_file.as_deref(), "reanim_file")?;
    let name = non_empty(raw.name.as_deref(), "name")?;
    if raw.animations.is_empty() {
        return Err(ValidationError::EmptyAnimationList {
            combo: name.to_string(),
        });
    }
    let mut seen: HashSet<&str> = HashSet::with_capacity(raw.animations.len());
    for anim in &raw.animations {
        if anim.is_empty() {
            return Err(ValidationError::MissingField {
                field: "animations[]".into(),
            });
        }
        if !seen.insert(anim.as_str()) {
            return Err(ValidationError::DuplicateAnimation { name: anim.clone() });
        }
    }

    if let Some(catalogue) = catalogue {
        let referenced = raw
            .animations
            .iter()
            .chain(sorted_values(&raw.manual_bindings));
        for anim in referenced {
            if !catalogue.contains(anim) {
                return Err(ValidationError::UndefinedAnimationReference { name: anim.clone() });
            }
        }
    }

    let strategy = match raw.binding_strategy.as_deref() {
        Some(value) => BindingStrategy::parse(value)?,
        None => BindingStrategy::Auto,
    };

    if strategy == BindingStrategy::Manual && raw.manual_bindings.is_empty() {
        return Err(ValidationError::MissingManualBindings {
            combo: name.to_string(),
        });
    }

    if let Some(track) = find_parent_cycle(&raw.parent_tracks) {
        return Err(ValidationError::CyclicParentTracks { track });
    }

    for track in sorted_keys(&raw.manual_bindings)
        .chain(sorted_keys(&raw.parent_tracks))
        .chain(sorted_values(&raw.parent_tracks))
        .chain(raw.hidden_tracks.iter())
    {
        if !document.contains_track(track) {
            return Err(ValidationError::UnknownTrack {
                track: track.clone(),
            });
        }
    }
    for target in sorted_values(&raw.manual_bindings) {
        if !seen.contains(target.as_str()) {
            return Err(ValidationError::UndefinedAnimationReference {
                name: target.clone(),
            });
        }
    }

    let merged = merged_parents(&raw.parent_tracks, document);
    if let Some(track) = find_parent_cycle(&merged) {
        return Err(ValidationError::CyclicParentTracks { track });
    }

    let combo_loop = raw.loop_all.unwrap_or(true);
    let default_cfg = RawAnimationConfig::default();
    let mut animation_configs = Vec::with_capacity(raw.animations.len());
    for anim in &raw.animations {
        let cfg = raw
            .animation_configs
            .get(anim)
            .or_else(|| catalogue.and_then(|c| c.get(anim)))
            .unwrap_or(&default_cfg);
        animation_configs.push(IndependentAnimationConfig::resolve(
            anim,
            cfg,
            raw.animation_loop_states.get(anim).copied(),
            combo_loop,
            document,
        )?);
    }

    log::debug!(
        "resolved combo '{}' ({:?}, {} animations) against '{}'",
        name,
        strategy,
        animation_configs.len(),
        reanim_file
    );

    Ok(AnimationCombo {
        name: name.to_string(),
        reanim_file: reanim_file.to_string(),
        animations: raw.animations.clone(),
        looping: combo_loop,
        strategy,
        manual_bindings: raw.manual_bindings.clone(),
        parent_tracks: raw.parent_tracks.clone(),
        hidden_tracks: raw.hidden_tracks.iter().cloned().collect(),
        animation_configs,
    })
}

/// Document-declared parents overridden by the combo's `parent_tracks`.
pub(crate) fn merged_parents(
    overrides: &HashMap<String, String>,
    document: &ReanimDocument,
) -> HashMap<String, String> {
    let mut merged: HashMap<String, String> = document
        .tracks()
        .iter()
        .filter_map(|t| t.parent().map(|p| (t.name().to_string(), p.to_string())))
        .collect();
    for (child, parent) in overrides {
        merged.insert(child.clone(), parent.clone());
    }
    merged
}

fn non_empty<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ValidationError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField {
            field: field.to_string(),
        }),
    }
}

// Map iteration order is unspecified; sort so the reported error is stable.
fn sorted_keys(map: &HashMap<String, String>) -> impl Iterator<Item = &String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort_unstable();
    keys.into_iter()
}

fn sorted_values(map: &HashMap<String, String>) -> impl Iterator<Item = &String> {
    let mut entries: Vec<(&String, &String)> = map.iter().collect();
    entries.sort_unstable();
    entries.into_iter().map(|(_, v)| v)
}
