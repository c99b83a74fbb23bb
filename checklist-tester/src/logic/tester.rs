use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use checklist_core::ChecklistFixture;

use crate::scenario::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

pub struct LogicTester<'a> {
    fixture: &'a ChecklistFixture,
    verbose: bool,
}

impl<'a> LogicTester<'a> {
    pub const fn new(fixture: &'a ChecklistFixture, verbose: bool) -> Self {
        Self { fixture, verbose }
    }

    pub fn run_scenario(&self, scenario: &TestScenario) -> ScenarioResult {
        if self.verbose {
            println!("🧪 Testing scenario: {}", scenario.name.bright_white());
        }

        let start = Instant::now();
        let outcome = scenario.run(self.fixture);
        let duration = start.elapsed();

        let failures = match outcome {
            Ok(()) => Vec::new(),
            Err(err) => {
                log::debug!("scenario {} failed: {err:#}", scenario.key);
                vec![format!("{err:#}")]
            }
        };

        ScenarioResult {
            scenario_name: scenario.name.to_string(),
            passed: failures.is_empty(),
            failures,
            duration,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::get_scenario;

    #[test]
    fn stock_smoke_scenario_passes() {
        let fixture = ChecklistFixture::stock().unwrap();
        let tester = LogicTester::new(&fixture, false);
        let result = tester.run_scenario(&get_scenario("smoke").unwrap());
        assert!(result.passed, "{:?}", result.failures);
        assert_eq!(result.scenario_name, "Smoke Test");
    }

    #[test]
    fn failing_scenario_records_reason() {
        let mut fixture = ChecklistFixture::stock().unwrap();
        fixture.catalog.ready = false;
        let tester = LogicTester::new(&fixture, false);
        let result = tester.run_scenario(&get_scenario("smoke").unwrap());
        assert!(!result.passed);
        assert!(result.failures[0].contains("not initialised"));
    }

    #[test]
    fn result_serializes_duration_as_micros() {
        let result = ScenarioResult {
            scenario_name: "Smoke Test".to_string(),
            passed: true,
            failures: Vec::new(),
            duration: Duration::from_millis(3),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["duration"], 3_000);
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.duration, Duration::from_millis(3));
    }
}
