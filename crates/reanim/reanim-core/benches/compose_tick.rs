use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reanim_core::{Engine, EngineConfig, EntityCommand, EntityId, Inputs, InterpolationMode};

fn setup(cfg: EngineConfig, entities: usize) -> (Engine, Vec<EntityId>) {
    let mut engine = Engine::new(cfg);
    let doc = reanim_test_fixtures::documents::json("peashooter").expect("document fixture");
    engine.load_document("peashooter", &doc).expect("load");
    let combo = reanim_test_fixtures::combos::json("peashooter_idle").expect("combo fixture");
    engine.register_combo_json(&combo).expect("register");

    let ids: Vec<_> = (0..entities)
        .map(|i| engine.create_entity(&format!("plant{i}")))
        .collect();
    let play = ids.iter().map(|&entity| EntityCommand::Play {
        entity,
        combo: "peashooter_idle".into(),
    });
    engine.update(0.0, Inputs::with(play));
    (engine, ids)
}

fn bench_compose_tick(c: &mut Criterion) {
    let (mut engine, ids) = setup(EngineConfig::default(), 1);
    c.bench_function("update+compose 1 entity (hold)", |b| {
        b.iter(|| {
            engine.update(black_box(1.0 / 60.0), Inputs::default());
            for &id in &ids {
                black_box(engine.compose(id));
            }
        })
    });

    let linear = EngineConfig {
        interpolation: InterpolationMode::Linear,
        ..EngineConfig::default()
    };
    let (mut engine, ids) = setup(linear, 256);
    c.bench_function("update+compose 256 entities (linear)", |b| {
        b.iter(|| {
            engine.update(black_box(1.0 / 60.0), Inputs::default());
            for &id in &ids {
                black_box(engine.compose(id));
            }
        })
    });
}

criterion_group!(benches, bench_compose_tick);
criterion_main!(benches);
