//! Named consistency checks run against a fixture universe.
use anyhow::Result;

use checklist_core::ChecklistFixture;

mod checks;

pub type ScenarioCheck = fn(&ChecklistFixture) -> Result<()>;

#[derive(Debug, Clone, Copy)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub check: ScenarioCheck,
}

impl TestScenario {
    const fn new(key: &'static str, name: &'static str, check: ScenarioCheck) -> Self {
        Self { key, name, check }
    }

    /// # Errors
    ///
    /// Returns the first violated expectation.
    pub fn run(&self, fixture: &ChecklistFixture) -> Result<()> {
        (self.check)(fixture)
    }
}

const SCENARIOS: [TestScenario; 6] = [
    TestScenario::new("smoke", "Smoke Test", checks::smoke),
    TestScenario::new(
        "determinism",
        "Deterministic Enumeration",
        checks::deterministic_enumeration,
    ),
    TestScenario::new("unique-identities", "Unique Identities", checks::unique_identities),
    TestScenario::new("exclusions", "Physical Exclusion Rules", checks::exclusion_rules),
    TestScenario::new("biomes", "Biome Expansion", checks::biome_expansion),
    TestScenario::new("filter", "Filter Pipeline Invariants", checks::filter_pipeline),
];

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS
        .iter()
        .map(|scenario| (scenario.key, scenario.name))
        .collect()
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let name = name.to_lowercase();
    SCENARIOS.iter().copied().find(|scenario| scenario.key == name)
}

/// Expand `all` into every known scenario key, keeping other entries.
pub fn expand_scenarios(requested: Vec<String>) -> Vec<String> {
    if !requested.iter().any(|s| s == "all") {
        return requested;
    }
    let mut scenarios: Vec<String> = requested.into_iter().filter(|s| s != "all").collect();
    for scenario in &SCENARIOS {
        if !scenarios.iter().any(|s| s == scenario.key) {
            scenarios.push(scenario.key.to_string());
        }
    }
    scenarios
}
