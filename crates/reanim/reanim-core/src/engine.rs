//! Engine: owns documents, resolved combos and entities; advances timelines per tick.
//!
//! Methods:
//! - new, load_document, insert_document, set_catalogue, register_combo
//! - create_entity, destroy_entity, update (apply commands -> advance timelines -> events)
//! - compose, current_frame, timeline_state, align

use std::sync::Arc;

use hashbrown::HashMap;

use crate::align::{align_offset, Alignment};
use crate::binding::{bind_tracks, TrackBindings};
use crate::combo::{resolve_combo, AnimationCombo, RawComboConfig};
use crate::compose::{ComposedFrame, Compositor};
use crate::config::EngineConfig;
use crate::data::{FrameRange, ReanimDocument};
use crate::diagnostics::Warning;
use crate::error::{LoadError, ParseError, ValidationError};
use crate::ids::{ComboId, DocId, EntityId, IdAllocator};
use crate::inputs::{EntityCommand, Inputs};
use crate::outputs::{CoreEvent, Outputs};
use crate::playback::AnimationCatalogue;
use crate::stored_reanim::parse_reanim_json;
use crate::timeline::{spawn_timelines, RuntimeTimeline, TimelineEvent, TimelineState};

/// A combo resolved and bound against its document. Shared by every entity playing it.
#[derive(Debug)]
pub struct ResolvedCombo {
    pub id: ComboId,
    pub combo: AnimationCombo,
    pub bindings: TrackBindings,
    pub compositor: Compositor,
    pub document: Arc<ReanimDocument>,
}

#[derive(Debug)]
struct DocumentEntry {
    id: DocId,
    document: Arc<ReanimDocument>,
}

#[derive(Debug)]
struct Playing {
    combo: Arc<ResolvedCombo>,
    /// `timelines[i]` plays `combo.combo.animations[i]`.
    timelines: Vec<RuntimeTimeline>,
}

impl Playing {
    fn timeline_mut(&mut self, animation: &str) -> Option<&mut RuntimeTimeline> {
        self.timelines.iter_mut().find(|t| t.animation() == animation)
    }

    fn timeline(&self, animation: &str) -> Option<&RuntimeTimeline> {
        self.timelines.iter().find(|t| t.animation() == animation)
    }
}

/// One visual entity and its current playback, if any.
#[derive(Debug)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    playing: Option<Playing>,
}

impl Entity {
    /// Name of the combo currently playing.
    pub fn combo(&self) -> Option<&str> {
        self.playing.as_ref().map(|p| p.combo.combo.name.as_str())
    }

    pub fn timelines(&self) -> &[RuntimeTimeline] {
        self.playing
            .as_ref()
            .map(|p| p.timelines.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct Engine {
    cfg: EngineConfig,
    ids: IdAllocator,
    documents: HashMap<String, DocumentEntry>,
    combos: HashMap<String, Arc<ResolvedCombo>>,
    catalogue: Option<AnimationCatalogue>,
    entities: Vec<Entity>,
    // EntityId -> position in `entities`.
    entity_slots: HashMap<EntityId, usize>,

    // Raised outside `update` (binding, alignment); surfaced on the next tick.
    pending_warnings: Vec<Warning>,
    outputs: Outputs,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Self {
        Self {
            cfg,
            ..Default::default()
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Parse a JSON document and register it under `name` (the combos' `reanim_file`).
    pub fn load_document(&mut self, name: &str, json: &str) -> Result<DocId, ParseError> {
        let document = parse_reanim_json(json)?;
        Ok(self.insert_document(name, document))
    }

    /// Register an already-built document. Re-using a name replaces the
    /// document for combos registered afterwards.
    pub fn insert_document(&mut self, name: &str, document: ReanimDocument) -> DocId {
        let id = self.ids.alloc_doc();
        log::debug!(
            "loaded document '{}' ({} tracks, {} frames @ {} fps)",
            name,
            document.tracks().len(),
            document.total_frames(),
            document.fps()
        );
        self.documents.insert(
            name.to_string(),
            DocumentEntry {
                id,
                document: Arc::new(document),
            },
        );
        id
    }

    pub fn document(&self, name: &str) -> Option<&Arc<ReanimDocument>> {
        self.documents.get(name).map(|e| &e.document)
    }

    pub fn document_id(&self, name: &str) -> Option<DocId> {
        self.documents.get(name).map(|e| e.id)
    }

    /// Catalogue consulted by combos registered from now on.
    pub fn set_catalogue(&mut self, catalogue: AnimationCatalogue) {
        self.catalogue = Some(catalogue);
    }

    /// Resolve, validate and bind a combo once. Binding warnings are surfaced
    /// in the next `update`'s outputs.
    pub fn register_combo(&mut self, raw: &RawComboConfig) -> Result<ComboId, LoadError> {
        let reanim_file = match raw.reanim_file.as_deref().map(str::trim) {
            Some(f) if !f.is_empty() => f,
            _ => {
                return Err(ValidationError::MissingField {
                    field: "reanim_file".into(),
                }
                .into())
            }
        };
        let document = self
            .documents
            .get(reanim_file)
            .map(|e| Arc::clone(&e.document))
            .ok_or_else(|| ValidationError::UnknownDocument {
                reanim_file: reanim_file.to_string(),
            })?;

        let combo = resolve_combo(raw, &document, self.catalogue.as_ref())?;
        let (bindings, warnings) = bind_tracks(&document, &combo, &self.cfg.naming)?;
        let compositor = Compositor::new(&document, &combo, &bindings)?;
        self.pending_warnings.extend(warnings);

        let id = self.ids.alloc_combo();
        let name = combo.name.clone();
        let resolved = Arc::new(ResolvedCombo {
            id,
            combo,
            bindings,
            compositor,
            document,
        });
        if self.combos.insert(name.clone(), resolved).is_some() {
            log::debug!("combo '{name}' re-registered; running entities keep the old one");
        }
        Ok(id)
    }

    pub fn register_combo_json(&mut self, json: &str) -> Result<ComboId, LoadError> {
        let raw = RawComboConfig::from_json_str(json)?;
        self.register_combo(&raw)
    }

    pub fn combo(&self, name: &str) -> Option<&Arc<ResolvedCombo>> {
        self.combos.get(name)
    }

    pub fn create_entity(&mut self, name: &str) -> EntityId {
        let id = self.ids.alloc_entity();
        self.entity_slots.insert(id, self.entities.len());
        self.entities.push(Entity {
            id,
            name: name.to_string(),
            playing: None,
        });
        id
    }

    /// Remove an entity and whatever it was playing. Returns `false` for an
    /// unknown id. Later commands naming it warn `UnknownEntity`.
    pub fn destroy_entity(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.entity_slots.remove(&id) else {
            return false;
        };
        self.entities.swap_remove(slot);
        if let Some(moved) = self.entities.get(slot) {
            self.entity_slots.insert(moved.id, slot);
        }
        log::debug!("entity {id:?} destroyed");
        true
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        let slot = *self.entity_slots.get(&id)?;
        self.entities.get(slot)
    }

    fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        let slot = *self.entity_slots.get(&id)?;
        self.entities.get_mut(slot)
    }

    fn warn(&mut self, warning: Warning) {
        self.outputs.push_event(CoreEvent::Warning(warning.emit()));
    }

    fn apply_inputs(&mut self, inputs: Inputs) {
        for cmd in inputs.commands {
            match cmd {
                EntityCommand::Play { entity, combo } => {
                    let Some(resolved) = self.combos.get(&combo).cloned() else {
                        self.warn(Warning::UnknownCombo { combo });
                        continue;
                    };
                    let Some(e) = self.entity_mut(entity) else {
                        self.warn(Warning::UnknownEntity { entity });
                        continue;
                    };
                    let timelines =
                        spawn_timelines(&resolved.document, &resolved.combo, &resolved.bindings);
                    log::debug!("entity {:?} plays '{}'", entity, resolved.combo.name);
                    let combo_id = resolved.id;
                    e.playing = Some(Playing {
                        combo: resolved,
                        timelines,
                    });
                    self.outputs.push_event(CoreEvent::PlaybackStarted {
                        entity,
                        combo: combo_id,
                    });
                }
                EntityCommand::Stop { entity } => {
                    let Some(e) = self.entity_mut(entity) else {
                        self.warn(Warning::UnknownEntity { entity });
                        continue;
                    };
                    if e.playing.take().is_some() {
                        self.outputs.push_event(CoreEvent::PlaybackStopped { entity });
                    }
                }
                EntityCommand::SetActive {
                    entity,
                    animation,
                    active,
                } => {
                    let outcome = self.with_timelines(entity, animation, |t| t.set_active(active));
                    if let Err(w) = outcome {
                        self.warn(w);
                    }
                }
                EntityCommand::Restart { entity, animation } => {
                    let outcome = self.with_timelines(entity, animation, RuntimeTimeline::restart);
                    if let Err(w) = outcome {
                        self.warn(w);
                    }
                }
            }
        }
    }

    /// Apply `f` to one named timeline of `entity`, or to all when `animation` is `None`.
    /// An idle entity is left alone.
    fn with_timelines(
        &mut self,
        entity: EntityId,
        animation: Option<String>,
        f: impl Fn(&mut RuntimeTimeline),
    ) -> Result<(), Warning> {
        let e = self
            .entity_mut(entity)
            .ok_or(Warning::UnknownEntity { entity })?;
        let Some(playing) = e.playing.as_mut() else {
            log::debug!("entity {entity:?} is idle; command ignored");
            return Ok(());
        };
        match animation {
            Some(name) => {
                let timeline = playing
                    .timeline_mut(&name)
                    .ok_or(Warning::UnknownAnimation { animation: name })?;
                f(timeline);
            }
            None => playing.timelines.iter_mut().for_each(f),
        }
        Ok(())
    }

    fn advance_timelines(&mut self, dt: f32) {
        for e in &mut self.entities {
            let Some(playing) = e.playing.as_mut() else {
                continue;
            };
            for timeline in &mut playing.timelines {
                let Some(event) = timeline.update(dt) else {
                    continue;
                };
                let animation = timeline.animation().to_string();
                let entity = e.id;
                self.outputs.push_event(match event {
                    TimelineEvent::LoopCompleted => CoreEvent::LoopCompleted { entity, animation },
                    TimelineEvent::DelayStarted => CoreEvent::DelayStarted { entity, animation },
                    TimelineEvent::DelayElapsed => CoreEvent::DelayElapsed { entity, animation },
                    TimelineEvent::Locked { frame } => CoreEvent::Locked {
                        entity,
                        animation,
                        frame,
                    },
                });
            }
        }
    }

    /// Step every live timeline by `dt` seconds after applying `inputs`.
    pub fn update(&mut self, dt: f32, inputs: Inputs) -> &Outputs {
        self.outputs.clear();

        for w in std::mem::take(&mut self.pending_warnings) {
            self.outputs.push_event(CoreEvent::Warning(w));
        }

        // 1) Commands
        self.apply_inputs(inputs);

        // 2) Timelines
        self.advance_timelines(dt);

        let cap = self.cfg.max_events_per_tick;
        if self.outputs.events.len() > cap {
            let dropped = self.outputs.events.len() - cap;
            self.outputs.events.truncate(cap);
            log::warn!("dropped {dropped} events over the per-tick cap of {cap}");
        }

        &self.outputs
    }

    /// Draw list for the entity's current combo, `None` when the entity is
    /// unknown or idle.
    pub fn compose(&self, entity: EntityId) -> Option<ComposedFrame> {
        let playing = self.entity(entity)?.playing.as_ref()?;
        let resolved = &playing.combo;
        Some(resolved.compositor.compose(
            &resolved.document,
            &playing.timelines,
            self.cfg.interpolation,
        ))
    }

    /// Document frame currently shown by `animation` on `entity`.
    pub fn current_frame(&self, entity: EntityId, animation: &str) -> Option<u32> {
        self.timeline(entity, animation).map(RuntimeTimeline::current_frame)
    }

    pub fn timeline_state(&self, entity: EntityId, animation: &str) -> Option<TimelineState> {
        self.timeline(entity, animation).map(RuntimeTimeline::state)
    }

    pub fn timeline(&self, entity: EntityId, animation: &str) -> Option<&RuntimeTimeline> {
        self.entity(entity)?.playing.as_ref()?.timeline(animation)
    }

    /// Align tracks of a loaded document to a world Y target, falling back to
    /// `default_alignment_offset` when they carry no Y data. A degraded result
    /// also queues its warning for the next tick.
    pub fn align(
        &mut self,
        document: &str,
        tracks: &[&str],
        range: Option<FrameRange>,
        target_world_y: f32,
        fine_tune: f32,
    ) -> Option<Alignment> {
        let doc = self.document(document)?;
        let range = range.unwrap_or_else(|| doc.full_range());
        let alignment = align_offset(
            doc,
            tracks,
            range,
            target_world_y,
            fine_tune,
            self.cfg.default_alignment_offset,
        );
        if let Some(w) = &alignment.warning {
            self.pending_warnings.push(w.clone());
        }
        Some(alignment)
    }
}
