//! Track binding: assigns each document track to at most one independent animation.
//!
//! Manual combos use their `manual_bindings` verbatim. Auto combos first honour
//! explicit `controlled_tracks` lists, then run the remaining tracks through an
//! ordered list of naming rules. Rules are plain data so the heuristic can be
//! tuned per project and tested without a document.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::combo::{AnimationCombo, BindingStrategy};
use crate::data::ReanimDocument;
use crate::diagnostics::Warning;
use crate::error::ValidationError;

/// One auto-binding predicate. Evaluated in list order; the first rule that
/// decides wins.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum MatchRule {
    /// Tracks whose name contains `pattern` (ASCII case-insensitive) stay unbound.
    ConventionExclude { pattern: String },
    /// Track name equals an animation name.
    ExactMatch,
    /// Track name starts with an animation name.
    PrefixMatch,
    /// Bind to the first candidate animation.
    PrimaryFallback,
}

/// Result of evaluating one rule against one track.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RuleOutcome<'a> {
    Exclude,
    Bind(&'a str),
    Pass,
}

impl MatchRule {
    /// Candidates are tried in declaration order, which makes the first
    /// declared animation win ties.
    pub fn evaluate<'a>(&self, track: &str, candidates: &[&'a str]) -> RuleOutcome<'a> {
        match self {
            MatchRule::ConventionExclude { pattern } => {
                if contains_ignore_ascii_case(track, pattern) {
                    RuleOutcome::Exclude
                } else {
                    RuleOutcome::Pass
                }
            }
            MatchRule::ExactMatch => candidates
                .iter()
                .copied()
                .find(|a| track == *a)
                .map_or(RuleOutcome::Pass, RuleOutcome::Bind),
            MatchRule::PrefixMatch => candidates
                .iter()
                .copied()
                .find(|a| !a.is_empty() && track.starts_with(*a))
                .map_or(RuleOutcome::Pass, RuleOutcome::Bind),
            MatchRule::PrimaryFallback => candidates
                .first()
                .copied()
                .map_or(RuleOutcome::Pass, RuleOutcome::Bind),
        }
    }
}

fn contains_ignore_ascii_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack
        .to_ascii_lowercase()
        .contains(&needle.to_ascii_lowercase())
}

/// Ordered naming rules used by auto binding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConventions {
    pub rules: Vec<MatchRule>,
}

impl Default for NamingConventions {
    fn default() -> Self {
        Self {
            rules: vec![
                MatchRule::ConventionExclude {
                    pattern: "blink".into(),
                },
                MatchRule::ExactMatch,
                MatchRule::PrefixMatch,
            ],
        }
    }
}

/// Pure heuristic: which candidate animation owns `track`, if any.
pub fn infer_animation<'a>(
    track: &str,
    candidates: &[&'a str],
    conventions: &NamingConventions,
) -> Option<&'a str> {
    for rule in &conventions.rules {
        match rule.evaluate(track, candidates) {
            RuleOutcome::Exclude => return None,
            RuleOutcome::Bind(anim) => return Some(anim),
            RuleOutcome::Pass => {}
        }
    }
    None
}

/// Track -> animation assignment for one combo on one document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackBindings {
    assignments: HashMap<String, String>,
    unbound: Vec<String>,
}

impl TrackBindings {
    #[inline]
    pub fn animation_for(&self, track: &str) -> Option<&str> {
        self.assignments.get(track).map(String::as_str)
    }

    #[inline]
    pub fn assignments(&self) -> &HashMap<String, String> {
        &self.assignments
    }

    /// Tracks owned by no animation, in document order.
    #[inline]
    pub fn unbound(&self) -> &[String] {
        &self.unbound
    }

    /// Document indices of the tracks bound to `animation`, in document order.
    pub fn track_indices(&self, document: &ReanimDocument, animation: &str) -> Vec<usize> {
        document
            .tracks()
            .iter()
            .enumerate()
            .filter(|(_, t)| self.animation_for(t.name()) == Some(animation))
            .map(|(i, _)| i)
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

/// Assign document tracks to the combo's animations.
///
/// Returns the bindings plus one `UnboundTrack` warning per track that ends
/// up without an owner (hidden tracks and range markers excepted).
pub fn bind_tracks(
    document: &ReanimDocument,
    combo: &AnimationCombo,
    conventions: &NamingConventions,
) -> Result<(TrackBindings, Vec<Warning>), ValidationError> {
    let mut assignments: HashMap<String, String> = HashMap::new();
    let markers = document.range_markers(combo.animations.iter().map(String::as_str));

    match combo.strategy {
        BindingStrategy::Manual => {
            for (track, anim) in &combo.manual_bindings {
                if !document.contains_track(track) {
                    return Err(ValidationError::UnknownTrack {
                        track: track.clone(),
                    });
                }
                assignments.insert(track.clone(), anim.clone());
            }
        }
        BindingStrategy::Auto => {
            for cfg in &combo.animation_configs {
                for track in cfg.controlled_tracks.iter().flatten() {
                    if !document.contains_track(track) {
                        return Err(ValidationError::UnknownTrack {
                            track: track.clone(),
                        });
                    }
                    assignments
                        .entry(track.clone())
                        .or_insert_with(|| cfg.name.clone());
                }
            }

            let candidates: Vec<&str> = combo
                .animation_configs
                .iter()
                .filter(|c| c.controlled_tracks.is_none())
                .map(|c| c.name.as_str())
                .collect();

            for track in document.tracks() {
                let name = track.name();
                if assignments.contains_key(name) || markers.contains(name) {
                    continue;
                }
                if let Some(anim) = infer_animation(name, &candidates, conventions) {
                    assignments.insert(name.to_string(), anim.to_string());
                }
            }
        }
    }

    let mut unbound = Vec::new();
    let mut warnings = Vec::new();
    for track in document.tracks() {
        let name = track.name();
        if assignments.contains_key(name) {
            continue;
        }
        unbound.push(name.to_string());
        if !combo.is_hidden(name) && !markers.contains(name) {
            warnings.push(
                Warning::UnboundTrack {
                    track: name.to_string(),
                }
                .emit(),
            );
        }
    }

    log::debug!(
        "bound {} of {} tracks for combo '{}'",
        assignments.len(),
        document.tracks().len(),
        combo.name
    );

    Ok((
        TrackBindings {
            assignments,
            unbound,
        },
        warnings,
    ))
}
