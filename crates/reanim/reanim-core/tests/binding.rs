use reanim_core::{
    binding::{bind_tracks, infer_animation, MatchRule, NamingConventions},
    combo::{resolve_combo, AnimationCombo, RawComboConfig},
    data::ReanimDocument,
    diagnostics::Warning,
    parse_reanim_json,
};
use serde_json::{json, Value};

fn doc(name: &str) -> ReanimDocument {
    let json = reanim_test_fixtures::documents::json(name).expect("load document fixture");
    parse_reanim_json(&json).expect("parse document fixture")
}

fn fixture_combo(name: &str, document: &ReanimDocument) -> AnimationCombo {
    let raw: RawComboConfig = reanim_test_fixtures::combos::load(name).expect("combo fixture");
    resolve_combo(&raw, document, None).expect("resolve combo")
}

fn inline_combo(value: Value, document: &ReanimDocument) -> AnimationCombo {
    let raw: RawComboConfig = serde_json::from_value(value).expect("raw combo");
    resolve_combo(&raw, document, None).expect("resolve combo")
}

#[test]
fn manual_binding_scenario() {
    let document = doc("three_tracks");
    let combo = fixture_combo("manual_xyz", &document);
    let (bindings, warnings) =
        bind_tracks(&document, &combo, &NamingConventions::default()).expect("bind");

    assert_eq!(bindings.animation_for("trackX"), Some("a"));
    assert_eq!(bindings.animation_for("trackY"), Some("b"));
    assert_eq!(bindings.animation_for("trackZ"), None);
    assert_eq!(bindings.unbound(), ["trackZ".to_string()]);
    assert_eq!(
        warnings,
        vec![Warning::UnboundTrack {
            track: "trackZ".into()
        }]
    );

    // Manual bindings come back unchanged.
    assert_eq!(bindings.assignments(), &combo.manual_bindings);
    assert_eq!(bindings.track_indices(&document, "a"), vec![0]);
    assert_eq!(bindings.track_indices(&document, "b"), vec![1]);
}

#[test]
fn manual_mode_ignores_controlled_tracks() {
    let document = doc("three_tracks");
    let combo = inline_combo(
        json!({
            "reanim_file": "three_tracks",
            "name": "m",
            "animations": ["a"],
            "binding_strategy": "manual",
            "manual_bindings": { "trackY": "a" },
            "animation_configs": { "a": { "controlled_tracks": ["trackX"] } }
        }),
        &document,
    );
    let (bindings, _) = bind_tracks(&document, &combo, &NamingConventions::default()).expect("bind");
    assert_eq!(bindings.len(), 1);
    assert_eq!(bindings.animation_for("trackY"), Some("a"));
    assert_eq!(bindings.animation_for("trackX"), None);
}

#[test]
fn auto_binding_on_fixture() {
    let document = doc("peashooter");
    let combo = fixture_combo("peashooter_idle", &document);
    let (bindings, warnings) =
        bind_tracks(&document, &combo, &NamingConventions::default()).expect("bind");

    assert_eq!(bindings.animation_for("head"), Some("head"));
    assert_eq!(bindings.animation_for("idle_leaf"), Some("idle"));
    // Excluded by the blink convention.
    assert_eq!(bindings.animation_for("head_blink"), None);
    // Range markers are never bound.
    assert_eq!(bindings.animation_for("anim_idle"), None);
    assert_eq!(bindings.animation_for("stalk"), None);

    assert_eq!(
        bindings.unbound(),
        ["stalk", "head_blink", "anim_idle"].map(String::from)
    );
    // Hidden tracks and markers stay quiet.
    assert_eq!(
        warnings,
        vec![Warning::UnboundTrack {
            track: "stalk".into()
        }]
    );
}

#[test]
fn controlled_tracks_take_precedence_over_inference() {
    let document = doc("three_tracks");
    let combo = inline_combo(
        json!({
            "reanim_file": "three_tracks",
            "name": "c",
            "animations": ["a", "trackY", "b"],
            "animation_configs": {
                "a": { "controlled_tracks": ["trackZ", "trackX"] },
                "b": { "controlled_tracks": ["trackX"] }
            }
        }),
        &document,
    );
    let (bindings, warnings) =
        bind_tracks(&document, &combo, &NamingConventions::default()).expect("bind");
    // First declared animation wins a track listed twice.
    assert_eq!(bindings.animation_for("trackX"), Some("a"));
    assert_eq!(bindings.animation_for("trackZ"), Some("a"));
    assert_eq!(bindings.animation_for("trackY"), Some("trackY"));
    assert!(bindings.unbound().is_empty());
    assert!(warnings.is_empty());
}

#[test]
fn inference_rules_in_order() {
    let rules = NamingConventions::default();
    let candidates = ["body", "body_arm"];

    // Exact match is tried before prefix match.
    assert_eq!(infer_animation("body_arm", &candidates, &rules), Some("body_arm"));
    // Prefix ties resolve to the first declared animation.
    assert_eq!(infer_animation("body_arm_upper", &candidates, &rules), Some("body"));
    assert_eq!(infer_animation("leg", &candidates, &rules), None);
    // Convention exclusion is case-insensitive and wins over any match.
    assert_eq!(infer_animation("Body_Blink", &candidates, &rules), None);
}

#[test]
fn primary_fallback_is_opt_in() {
    let candidates = ["idle", "shoot"];
    assert_eq!(
        infer_animation("stalk", &candidates, &NamingConventions::default()),
        None
    );

    let mut rules = NamingConventions::default();
    rules.rules.push(MatchRule::PrimaryFallback);
    assert_eq!(infer_animation("stalk", &candidates, &rules), Some("idle"));
    assert_eq!(infer_animation("head_blink", &candidates, &rules), None);
    assert_eq!(infer_animation("stalk", &[], &rules), None);
}

#[test]
fn naming_rules_deserialize_from_tagged_json() {
    let rules: NamingConventions = serde_json::from_value(json!({
        "rules": [
            { "rule": "convention_exclude", "pattern": "eye" },
            { "rule": "prefix_match" },
            { "rule": "primary_fallback" }
        ]
    }))
    .expect("rules");
    assert_eq!(rules.rules.len(), 3);
    assert_eq!(
        rules.rules[0],
        MatchRule::ConventionExclude {
            pattern: "eye".into()
        }
    );
    // The default list excludes blink tracks; this one does not.
    assert_eq!(infer_animation("head_blink", &["head"], &rules), Some("head"));
    assert_eq!(infer_animation("left_eye", &["head"], &rules), None);
}
