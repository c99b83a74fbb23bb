use std::collections::HashSet;

use checklist_core::{
    CatalogData, ChecklistFixture, Experiment, ExperimentCache, MaskResolution, SituationKind,
    situation_possible,
};

fn stock_catalog() -> CatalogData {
    ChecklistFixture::stock().unwrap().catalog
}

fn at<'a>(cache: &'a ExperimentCache, id: &'a str, body: &'a str) -> Vec<&'a Experiment> {
    cache
        .experiments()
        .iter()
        .filter(|e| e.definition().id == id && e.situation().location().name == body)
        .collect()
}

#[test]
fn enumeration_is_deterministic() {
    let catalog = stock_catalog();
    let first: Vec<String> = ExperimentCache::build(&catalog)
        .identities()
        .map(str::to_string)
        .collect();
    let second: Vec<String> = ExperimentCache::build(&catalog)
        .identities()
        .map(str::to_string)
        .collect();
    assert!(!first.is_empty());
    assert_eq!(first, second, "rebuild changed enumeration order");
}

#[test]
fn identities_are_unique() {
    let cache = ExperimentCache::build(&stock_catalog());
    let mut seen = HashSet::new();
    for identity in cache.identities() {
        assert!(seen.insert(identity), "duplicate identity {identity}");
    }
}

#[test]
fn every_experiment_respects_physical_exclusions() {
    let cache = ExperimentCache::build(&stock_catalog());
    for experiment in cache.experiments() {
        let situation = experiment.situation();
        assert!(
            situation_possible(situation.location(), situation.kind()),
            "{} is physically impossible",
            experiment.identity()
        );
        assert!(
            !experiment.definition().requires_atmosphere || situation.location().atmosphere,
            "{} needs an atmosphere",
            experiment.identity()
        );
    }

    let impossible = [
        ("Mun", SituationKind::SrfSplashed),
        ("Minmus", SituationKind::SrfSplashed),
        ("Duna", SituationKind::SrfSplashed),
        ("Sun", SituationKind::SrfLanded),
        ("Jool", SituationKind::SrfLanded),
        ("Mun", SituationKind::FlyingLow),
        ("Minmus", SituationKind::FlyingHigh),
    ];
    for (body, kind) in impossible {
        assert!(
            !cache
                .experiments()
                .iter()
                .any(|e| e.situation().location().name == body && e.situation().kind() == kind),
            "{body} {kind:?} should not appear"
        );
    }
}

#[test]
fn atmosphere_analysis_stays_on_atmospheric_bodies() {
    let cache = ExperimentCache::build(&stock_catalog());
    let bodies: HashSet<&str> = cache
        .experiments()
        .iter()
        .filter(|e| e.definition().id == "atmosphereAnalysis")
        .map(|e| e.situation().location().name.as_str())
        .collect();
    assert_eq!(bodies, HashSet::from(["Kerbin", "Eve", "Duna", "Jool"]));

    let jool: Vec<&str> = at(&cache, "atmosphereAnalysis", "Jool")
        .into_iter()
        .map(Experiment::identity)
        .collect();
    assert_eq!(
        jool,
        vec![
            "atmosphereAnalysis@JoolFlyingLow",
            "atmosphereAnalysis@JoolFlyingHigh"
        ]
    );
}

#[test]
fn biome_expansion_includes_extra_regions() {
    let cache = ExperimentCache::build(&stock_catalog());

    let mun = at(&cache, "surfaceSample", "Mun");
    assert_eq!(mun.len(), 7);
    assert!(mun.iter().all(|e| e.situation().kind() == SituationKind::SrfLanded));

    // 11 landed + 3 launch-site regions + 11 splashed
    let kerbin = at(&cache, "surfaceSample", "Kerbin");
    assert_eq!(kerbin.len(), 25);
    let regions: Vec<&str> = kerbin
        .iter()
        .filter(|e| e.uses_sub_biomes())
        .filter_map(|e| e.situation().sub_biome())
        .collect();
    assert_eq!(regions, vec!["LaunchPad", "Runway", "KSC"]);
    assert!(
        kerbin
            .iter()
            .filter(|e| e.uses_sub_biomes())
            .all(|e| e.situation().kind() == SituationKind::SrfLanded)
    );

    let pad = cache
        .experiments()
        .iter()
        .find(|e| e.identity() == "surfaceSample@KerbinSrfLandedLaunchPad")
        .unwrap();
    assert_eq!(
        pad.description(),
        "Surface Sample while landed at Kerbin's Launch Pad"
    );
}

#[test]
fn zero_mask_definitions_are_diagnosed() {
    let cache = ExperimentCache::build(&stock_catalog());
    let diagnostics = cache.diagnostics();
    assert_eq!(diagnostics.len(), 2);

    assert_eq!(diagnostics[0].experiment_id, "magScan");
    assert_eq!(diagnostics[0].module.as_deref(), Some("MagBoom"));
    assert!(matches!(
        diagnostics[0].resolution,
        MaskResolution::Recovered(_)
    ));
    // in space low per biome, in space high once
    assert_eq!(at(&cache, "magScan", "Mun").len(), 8);
    assert!(at(&cache, "magScan", "Kerbin").iter().all(|e| matches!(
        e.situation().kind(),
        SituationKind::InSpaceLow | SituationKind::InSpaceHigh
    )));

    assert_eq!(diagnostics[1].experiment_id, "radiationScan");
    assert_eq!(diagnostics[1].resolution, MaskResolution::Unrestricted);
    let kerbin = at(&cache, "radiationScan", "Kerbin");
    assert_eq!(kerbin.len(), 6);
    assert!(kerbin.iter().all(|e| e.situation().biome().is_none()));
}

#[test]
fn single_landed_definition_over_two_biomes() {
    let catalog = CatalogData::from_json(
        r#"{
            "experiments": [
                { "id": "surfaceSample", "title": "Surface Sample",
                  "situation_mask": 1, "biome_mask": 1, "science_cap": 30 }
            ],
            "bodies": [ { "name": "Kerbin", "biomes": ["Shores", "Highlands"] } ]
        }"#,
    )
    .unwrap();
    let cache = ExperimentCache::build(&catalog);
    let identities: Vec<&str> = cache.identities().collect();
    assert_eq!(
        identities,
        vec![
            "surfaceSample@KerbinSrfLandedShores",
            "surfaceSample@KerbinSrfLandedHighlands"
        ]
    );
}

#[test]
fn uninitialised_catalog_builds_nothing() {
    let mut catalog = stock_catalog();
    catalog.ready = false;
    let cache = ExperimentCache::build(&catalog);
    assert!(!cache.is_ready());
    assert!(cache.is_empty());
}
