use reanim_core::{
    binding::{bind_tracks, NamingConventions, TrackBindings},
    combo::{resolve_combo, AnimationCombo, RawComboConfig},
    compose::{compose_frame, ComposedFrame, Compositor},
    config::InterpolationMode,
    data::ReanimDocument,
    error::ValidationError,
    parse_reanim_value,
    timeline::{spawn_timelines, RuntimeTimeline},
};
use serde_json::{json, Value};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

struct Rig {
    doc: ReanimDocument,
    combo: AnimationCombo,
    bindings: TrackBindings,
}

impl Rig {
    fn new(doc: Value, combo: Value) -> Self {
        let doc = parse_reanim_value(doc).expect("parse document");
        let raw: RawComboConfig = serde_json::from_value(combo).expect("raw combo");
        let combo = resolve_combo(&raw, &doc, None).expect("resolve combo");
        let (bindings, _) =
            bind_tracks(&doc, &combo, &NamingConventions::default()).expect("bind tracks");
        Self {
            doc,
            combo,
            bindings,
        }
    }

    fn timelines(&self) -> Vec<RuntimeTimeline> {
        spawn_timelines(&self.doc, &self.combo, &self.bindings)
    }

    fn compose(&self, timelines: &[RuntimeTimeline]) -> ComposedFrame {
        self.compose_with(timelines, InterpolationMode::Hold)
    }

    fn compose_with(&self, timelines: &[RuntimeTimeline], mode: InterpolationMode) -> ComposedFrame {
        compose_frame(&self.doc, &self.combo, &self.bindings, timelines, mode).expect("compose")
    }
}

fn arm_doc() -> Value {
    json!({
        "fps": 10,
        "tracks": [
            { "name": "body", "keyframes": [
                { "frame": 0, "x": 100, "y": 50, "opacity": 0.5, "image": "IMAGE_BODY" },
                { "frame": 5, "x": 110 },
                { "frame": 9 }
            ] },
            { "name": "arm", "parent": "body", "keyframes": [
                { "frame": 0, "x": 10, "rotation": 90, "opacity": 0.5 }
            ] },
            { "name": "hand", "parent": "arm", "keyframes": [
                { "frame": 0, "x": 5, "image": "IMAGE_HAND" }
            ] }
        ]
    })
}

fn body_combo(extra: Value) -> Value {
    let mut combo = json!({
        "reanim_file": "arm",
        "name": "arm_combo",
        "animations": ["body"]
    });
    if let (Some(base), Value::Object(extra)) = (combo.as_object_mut(), extra) {
        base.extend(extra);
    }
    combo
}

#[test]
fn parent_chain_composes_world_transforms() {
    let rig = Rig::new(arm_doc(), body_combo(json!({})));
    let frame = rig.compose(&rig.timelines());

    assert_eq!(frame.track_names().collect::<Vec<_>>(), ["body", "arm", "hand"]);

    let hand = frame.item("hand").expect("hand");
    let (x, y) = hand.transform.translation();
    // hand (5, 0) rotated 90 degrees by arm, offset by arm (10, 0) and body (100, 50).
    approx(x, 110.0, 1e-4);
    approx(y, 55.0, 1e-4);
    approx(hand.opacity, 0.25, 1e-6);
    assert_eq!(hand.image.as_deref(), Some("IMAGE_HAND"));
    assert!(hand.visible);
    assert_eq!(hand.index, 2);
}

#[test]
fn visibility_is_inherited() {
    let mut doc = arm_doc();
    doc["tracks"][1]["keyframes"][0]["visible"] = json!(false);
    let rig = Rig::new(doc, body_combo(json!({})));
    let frame = rig.compose(&rig.timelines());
    assert!(frame.item("body").expect("body").visible);
    assert!(!frame.item("arm").expect("arm").visible);
    assert!(!frame.item("hand").expect("hand").visible);
}

#[test]
fn hidden_tracks_are_filtered_but_still_parent() {
    let rig = Rig::new(arm_doc(), body_combo(json!({ "hidden_tracks": ["arm"] })));
    let frame = rig.compose(&rig.timelines());
    assert_eq!(frame.track_names().collect::<Vec<_>>(), ["body", "hand"]);
    let (x, y) = frame.item("hand").expect("hand").transform.translation();
    approx(x, 110.0, 1e-4);
    approx(y, 55.0, 1e-4);
}

#[test]
fn combo_parent_override_replaces_document_parent() {
    let rig = Rig::new(
        arm_doc(),
        body_combo(json!({ "parent_tracks": { "hand": "body" } })),
    );
    let frame = rig.compose(&rig.timelines());
    let (x, y) = frame.item("hand").expect("hand").transform.translation();
    approx(x, 105.0, 1e-4);
    approx(y, 50.0, 1e-4);
}

#[test]
fn children_declared_before_parents_still_compose() {
    let doc = json!({
        "fps": 10,
        "tracks": [
            { "name": "hand", "parent": "arm", "keyframes": [ { "frame": 0, "x": 1 } ] },
            { "name": "arm", "keyframes": [ { "frame": 0, "x": 20, "y": 2 } ] }
        ]
    });
    let combo = json!({ "reanim_file": "d", "name": "c", "animations": ["arm"] });
    let rig = Rig::new(doc, combo);
    let frame = rig.compose(&rig.timelines());
    assert_eq!(frame.track_names().collect::<Vec<_>>(), ["hand", "arm"]);
    let (x, y) = frame.item("hand").expect("hand").transform.translation();
    approx(x, 21.0, 1e-5);
    approx(y, 2.0, 1e-5);
}

#[test]
fn bound_tracks_follow_their_timeline_and_unbound_stay_static() {
    let mut doc = arm_doc();
    // Give the unbound hand a keyframe the static pose must ignore.
    doc["tracks"][2]["keyframes"] = json!([
        { "frame": 0, "x": 5 },
        { "frame": 5, "x": 50 }
    ]);
    let rig = Rig::new(doc, body_combo(json!({})));
    let mut timelines = rig.timelines();
    for t in &mut timelines {
        t.update(0.55);
    }
    assert_eq!(timelines[0].current_frame(), 5);

    let frame = rig.compose(&timelines);
    let (bx, _) = frame.item("body").expect("body").transform.translation();
    approx(bx, 110.0, 1e-4);
    // arm and hand are unbound: frame 0 local poses under the moving body.
    let (hx, _) = frame.item("hand").expect("hand").transform.translation();
    approx(hx, 120.0, 1e-4);
}

#[test]
fn linear_mode_blends_bound_tracks_only() {
    let mut doc = arm_doc();
    doc["tracks"][2]["keyframes"] = json!([
        { "frame": 0, "x": 5 },
        { "frame": 5, "x": 50 }
    ]);
    let rig = Rig::new(doc, body_combo(json!({})));
    let mut timelines = rig.timelines();
    for t in &mut timelines {
        t.update(0.45);
    }
    assert_eq!(timelines[0].current_frame(), 4);

    let hold = rig.compose_with(&timelines, InterpolationMode::Hold);
    let (bx, _) = hold.item("body").expect("body").transform.translation();
    approx(bx, 100.0, 1e-3);

    // Halfway between body x=100 (frame 4, held) and x=110 (frame 5).
    let linear = rig.compose_with(&timelines, InterpolationMode::Linear);
    let (bx, by) = linear.item("body").expect("body").transform.translation();
    approx(bx, 105.0, 1e-3);
    approx(by, 50.0, 1e-3);
    // The unbound hand keeps its frame-0 pose under the blended body.
    let (hx, hy) = linear.item("hand").expect("hand").transform.translation();
    approx(hx, 115.0, 1e-3);
    approx(hy, 55.0, 1e-3);
}

#[test]
fn stopped_timeline_without_render_when_stopped_is_omitted() {
    let rig = Rig::new(
        arm_doc(),
        body_combo(json!({
            "animation_configs": { "body": { "is_active": false, "render_when_stopped": false } }
        })),
    );
    let frame = rig.compose(&rig.timelines());
    // body is omitted; its children still hang off its transform.
    assert_eq!(frame.track_names().collect::<Vec<_>>(), ["arm", "hand"]);
    let (x, _) = frame.item("arm").expect("arm").transform.translation();
    approx(x, 110.0, 1e-4);
}

#[test]
fn blended_tracks_attach_under_parent_bone() {
    let doc = json!({
        "fps": 10,
        "tracks": [
            { "name": "body", "keyframes": [ { "frame": 0, "x": 100, "y": 10 } ] },
            { "name": "hat_top", "keyframes": [ { "frame": 0, "y": -5 } ] },
            { "name": "hat_band", "parent": "hat_top", "keyframes": [ { "frame": 0, "x": 1 } ] }
        ]
    });
    let combo = json!({
        "reanim_file": "d",
        "name": "c",
        "animations": ["body", "hat"],
        "animation_configs": { "hat": { "mode": "Blended", "parent_bone": "body" } }
    });
    let rig = Rig::new(doc, combo);
    let compositor = Compositor::new(&rig.doc, &rig.combo, &rig.bindings).expect("compositor");
    assert_eq!(compositor.hierarchy().parent(1), Some(0));
    // Explicitly parented tracks keep their parent.
    assert_eq!(compositor.hierarchy().parent(2), Some(1));
    assert_eq!(compositor.owner(2), Some(1));

    let frame = compositor.compose(&rig.doc, &rig.timelines(), InterpolationMode::Hold);
    let (x, y) = frame.item("hat_top").expect("hat").transform.translation();
    approx(x, 100.0, 1e-4);
    approx(y, 5.0, 1e-4);
    let (x, y) = frame.item("hat_band").expect("band").transform.translation();
    approx(x, 101.0, 1e-4);
    approx(y, 5.0, 1e-4);
}

#[test]
fn blended_attachment_cannot_close_a_cycle() {
    let doc = json!({
        "fps": 10,
        "tracks": [
            { "name": "bone", "parent": "cap_tip", "keyframes": [ { "frame": 0 } ] },
            { "name": "cap_tip", "keyframes": [ { "frame": 0 } ] }
        ]
    });
    let combo = json!({
        "reanim_file": "d",
        "name": "c",
        "animations": ["cap"],
        "animation_configs": { "cap": { "mode": "Blended", "parent_bone": "bone" } }
    });
    let rig = Rig::new(doc, combo);
    let err = Compositor::new(&rig.doc, &rig.combo, &rig.bindings).unwrap_err();
    assert!(matches!(err, ValidationError::CyclicParentTracks { .. }));
}
