use anyhow::{Context, Result, ensure};
use std::collections::HashSet;

use checklist_core::{
    ChecklistConfig, ChecklistFixture, DisplayMode, ExperimentCache, ExperimentFilter,
    situation_possible,
};

fn build(fixture: &ChecklistFixture) -> ExperimentCache {
    ExperimentCache::build(&fixture.catalog)
}

pub fn smoke(fixture: &ChecklistFixture) -> Result<()> {
    ensure!(fixture.catalog.ready, "catalog is not initialised");
    let cache = build(fixture);
    ensure!(cache.is_ready(), "cache did not build");
    ensure!(!cache.is_empty(), "no experiments enumerated");
    fixture
        .clone()
        .into_parts()
        .context("vessel context does not resolve")?;
    Ok(())
}

pub fn deterministic_enumeration(fixture: &ChecklistFixture) -> Result<()> {
    let first: Vec<String> = build(fixture).identities().map(str::to_string).collect();
    let second: Vec<String> = build(fixture).identities().map(str::to_string).collect();
    ensure!(
        first == second,
        "rebuild produced a different order ({} vs {} experiments)",
        first.len(),
        second.len()
    );
    Ok(())
}

pub fn unique_identities(fixture: &ChecklistFixture) -> Result<()> {
    let cache = build(fixture);
    let mut seen = HashSet::new();
    for identity in cache.identities() {
        ensure!(seen.insert(identity), "duplicate identity {identity}");
    }
    Ok(())
}

pub fn exclusion_rules(fixture: &ChecklistFixture) -> Result<()> {
    for experiment in build(fixture).experiments() {
        let situation = experiment.situation();
        ensure!(
            situation_possible(situation.location(), situation.kind()),
            "{} is physically impossible",
            experiment.identity()
        );
        ensure!(
            !experiment.definition().requires_atmosphere || situation.location().atmosphere,
            "{} requires an atmosphere",
            experiment.identity()
        );
    }
    Ok(())
}

pub fn biome_expansion(fixture: &ChecklistFixture) -> Result<()> {
    for experiment in build(fixture).experiments() {
        let definition = experiment.definition();
        let situation = experiment.situation();
        ensure!(
            experiment.uses_sub_biomes() == situation.sub_biome().is_some(),
            "{} has inconsistent sub-biome state",
            experiment.identity()
        );
        // recovered masks are checked by the cache's own diagnostics
        if definition.has_no_masks() {
            continue;
        }
        let per_biome = definition.biome_mask.includes(situation.kind())
            && !situation.location().biomes.is_empty();
        let has_region = situation.biome().is_some() || situation.sub_biome().is_some();
        ensure!(
            per_biome == has_region,
            "{} expected {} biome",
            experiment.identity(),
            if per_biome { "a" } else { "no" }
        );
    }
    Ok(())
}

pub fn filter_pipeline(fixture: &ChecklistFixture) -> Result<()> {
    let (catalog, progress, context) = fixture.clone().into_parts()?;
    for mode in DisplayMode::ALL {
        for hide_complete in [false, true] {
            let config = ChecklistConfig {
                display_mode: mode,
                hide_complete,
                ..ChecklistConfig::default()
            };
            let mut filter = ExperimentFilter::new(&config);
            filter.rebuild_cache(&catalog, &progress, &context);

            let label = format!("{mode:?} (hide complete: {hide_complete})");
            let totals: Vec<f32> = filter.display_iter().map(|e| e.total_score()).collect();
            ensure!(
                totals.windows(2).all(|pair| pair[0] <= pair[1]),
                "{label}: display list is not sorted by total"
            );
            ensure!(
                filter.complete_count() <= filter.total_count(),
                "{label}: more complete than matched"
            );
            let expected = if hide_complete {
                filter.total_count() - filter.complete_count()
            } else {
                filter.total_count()
            };
            ensure!(
                filter.display_len() == expected,
                "{label}: {} shown, expected {expected}",
                filter.display_len()
            );
            ensure!(
                !hide_complete || filter.display_iter().all(|e| !e.is_complete()),
                "{label}: complete experiment left visible"
            );
        }
    }
    Ok(())
}
