//! Compositor: one ordered draw list per entity per frame.
//!
//! Parent links (document, combo overrides and Blended parent bones) are
//! lowered once into a [`HierarchyIndex`]; per frame the compositor walks the
//! evaluation order so every parent's world transform exists before its
//! children are composed, then emits tracks in document order.

use std::sync::Arc;

use crate::binding::TrackBindings;
use crate::combo::AnimationCombo;
use crate::config::InterpolationMode;
use crate::data::ReanimDocument;
use crate::error::ValidationError;
use crate::hierarchy::HierarchyIndex;
use crate::sampling::resolve_pose;
use crate::timeline::RuntimeTimeline;
use crate::transform::Affine2;

/// One composed track, ready for the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawItem {
    pub track: String,
    /// Document index of the track.
    pub index: usize,
    pub transform: Affine2,
    /// Own opacity multiplied by every ancestor's.
    pub opacity: f32,
    pub image: Option<Arc<str>>,
    /// Own flag and-ed with every ancestor's.
    pub visible: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComposedFrame {
    pub items: Vec<DrawItem>,
}

impl ComposedFrame {
    pub fn item(&self, track: &str) -> Option<&DrawItem> {
        self.items.iter().find(|i| i.track == track)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn track_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(|i| i.track.as_str())
    }
}

/// Precomputed hierarchy and ownership for one combo on one document.
#[derive(Clone, Debug, PartialEq)]
pub struct Compositor {
    hierarchy: HierarchyIndex,
    /// Per track: index into `combo.animations` of the owning animation.
    owner: Vec<Option<usize>>,
    hidden: Vec<bool>,
}

impl Compositor {
    pub fn new(
        document: &ReanimDocument,
        combo: &AnimationCombo,
        bindings: &TrackBindings,
    ) -> Result<Self, ValidationError> {
        let tracks = document.tracks();
        let mut parents: Vec<Option<usize>> = tracks
            .iter()
            .map(|t| {
                combo
                    .parent_of(document, t.name())
                    .and_then(|p| document.track_index(p))
            })
            .collect();

        let owner: Vec<Option<usize>> = tracks
            .iter()
            .map(|t| {
                bindings
                    .animation_for(t.name())
                    .and_then(|a| combo.animation_index(a))
            })
            .collect();

        for (anim_idx, cfg) in combo.animation_configs.iter().enumerate() {
            let Some(bone) = cfg.mode.parent_bone().and_then(|b| document.track_index(b)) else {
                continue;
            };
            for (i, parent) in parents.iter_mut().enumerate() {
                if i != bone && parent.is_none() && owner[i] == Some(anim_idx) {
                    *parent = Some(bone);
                }
            }
        }

        let hierarchy = HierarchyIndex::new(parents).map_err(|i| {
            ValidationError::CyclicParentTracks {
                track: tracks
                    .get(i)
                    .map(|t| t.name().to_string())
                    .unwrap_or_default(),
            }
        })?;

        let hidden = tracks.iter().map(|t| combo.is_hidden(t.name())).collect();

        Ok(Self {
            hierarchy,
            owner,
            hidden,
        })
    }

    #[inline]
    pub fn hierarchy(&self) -> &HierarchyIndex {
        &self.hierarchy
    }

    /// Index into the combo's animation list of the animation owning `track`.
    #[inline]
    pub fn owner(&self, track: usize) -> Option<usize> {
        self.owner.get(track).copied().flatten()
    }

    /// Compose one frame. `timelines[i]` must be the timeline of the combo's
    /// `i`-th animation; unowned tracks render their frame-0 pose.
    pub fn compose(
        &self,
        document: &ReanimDocument,
        timelines: &[RuntimeTimeline],
        mode: InterpolationMode,
    ) -> ComposedFrame {
        let tracks = document.tracks();
        let n = tracks.len();
        let mut world = vec![Affine2::IDENTITY; n];
        let mut opacity = vec![1.0_f32; n];
        let mut visible = vec![true; n];
        let mut images: Vec<Option<Arc<str>>> = vec![None; n];

        for &i in self.hierarchy.evaluation_order() {
            let Some(track) = tracks.get(i) else {
                continue;
            };
            let pose = match self.owner(i).and_then(|a| timelines.get(a)) {
                Some(timeline) => timeline.sample(track, mode),
                None => resolve_pose(track, 0),
            };
            let local =
                Affine2::from_parts(pose.x, pose.y, pose.scale_x, pose.scale_y, pose.rotation);
            match self.hierarchy.parent(i) {
                Some(p) => {
                    world[i] = world[p].then(&local);
                    opacity[i] = opacity[p] * pose.opacity;
                    visible[i] = visible[p] && pose.visible;
                }
                None => {
                    world[i] = local;
                    opacity[i] = pose.opacity;
                    visible[i] = pose.visible;
                }
            }
            images[i] = pose.image;
        }

        let mut items = Vec::with_capacity(n);
        for (i, track) in tracks.iter().enumerate() {
            if self.hidden[i] {
                continue;
            }
            let drawn = self
                .owner(i)
                .and_then(|a| timelines.get(a))
                .map_or(true, RuntimeTimeline::renders);
            if !drawn {
                continue;
            }
            items.push(DrawItem {
                track: track.name().to_string(),
                index: i,
                transform: world[i],
                opacity: opacity[i],
                image: images[i].take(),
                visible: visible[i],
            });
        }
        ComposedFrame { items }
    }
}

/// One-shot composition without a cached [`Compositor`].
pub fn compose_frame(
    document: &ReanimDocument,
    combo: &AnimationCombo,
    bindings: &TrackBindings,
    timelines: &[RuntimeTimeline],
    mode: InterpolationMode,
) -> Result<ComposedFrame, ValidationError> {
    Ok(Compositor::new(document, combo, bindings)?.compose(document, timelines, mode))
}
