//! Benchmark for essence selection and effect matching.
//!
//! Run with: cargo bench --package fabricate-crafting --bench selection_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fabricate_crafting::alchemy::{
    AlchemicalEffect, AlchemicalResultSet, EffectAction, EffectKind, EffectMatcher,
};
use fabricate_crafting::{Combination, CraftingComponent, EssenceDefinition, Selector};

const ELEMENTS: [&str; 5] = ["fire", "air", "earth", "water", "positive"];

fn essence(id: &str) -> EssenceDefinition {
    EssenceDefinition::new(id, "bench", id, "")
}

/// 30 component kinds, each contributing one or two elements.
fn wide_inventory() -> Combination<CraftingComponent> {
    (0..30usize)
        .map(|i| {
            let first = ELEMENTS[i % ELEMENTS.len()];
            let second = ELEMENTS[(i / ELEMENTS.len()) % ELEMENTS.len()];
            let essences: Combination<EssenceDefinition> =
                [(essence(first), 1 + (i % 2) as u32), (essence(second), 1)].into_iter().collect();
            let component = CraftingComponent::new(format!("component-{i:02}"), "bench", format!("Component {i}"))
                .with_essences(essences);
            (component, 1 + (i % 3) as u32)
        })
        .collect()
}

fn effect_catalog() -> AlchemicalResultSet {
    let mut effects = Vec::new();
    for (i, first) in ELEMENTS.iter().enumerate() {
        for second in &ELEMENTS[i..] {
            let essences: Combination<EssenceDefinition> =
                [(essence(first), 1), (essence(second), 1)].into_iter().collect();
            effects.push(AlchemicalEffect::new(
                format!("{first}-{second}"),
                essences,
                EffectKind::Basic,
                format!("{first} and {second}."),
                vec![EffectAction::Damage {
                    roll: "1d6".parse().expect("valid roll"),
                    damage_type: (*first).to_string(),
                }],
            ));
        }
    }
    AlchemicalResultSet::from_effects(effects).expect("valid effect set")
}

fn benchmark_essence_selection(c: &mut Criterion) {
    let inventory = wide_inventory();
    let target: Combination<EssenceDefinition> = [
        (essence("fire"), 3),
        (essence("water"), 2),
        (essence("earth"), 2),
    ]
    .into_iter()
    .collect();
    let selector = Selector::default();

    c.bench_function("essence_selection_30_components", |b| {
        b.iter(|| black_box(selector.select_essences(black_box(&target), black_box(&inventory))));
    });
}

fn benchmark_effect_matching(c: &mut Criterion) {
    let catalog = effect_catalog();
    let aggregate: Combination<EssenceDefinition> = ELEMENTS
        .iter()
        .map(|id| (essence(id), 2))
        .collect();
    let matcher = EffectMatcher::default();

    c.bench_function("effect_matching_15_effects", |b| {
        b.iter(|| black_box(matcher.match_effects(&catalog, black_box(&aggregate)).effects.len()));
    });
}

criterion_group!(benches, benchmark_essence_selection, benchmark_effect_matching);
criterion_main!(benches);
