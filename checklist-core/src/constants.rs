//! Shared constants for the checklist core.
//!
//! Baseline experiment ids and tuning defaults live here so the enumeration,
//! progress and filter code agree on them.

// Baseline experiments ------------------------------------------------------
pub const CREW_REPORT_ID: &str = "crewReport";
pub const EVA_REPORT_ID: &str = "evaReport";
pub const SURFACE_SAMPLE_ID: &str = "surfaceSample";

/// Experiments every player has from the start and that need crew to perform.
pub const BASELINE_EXPERIMENT_IDS: [&str; 3] = [CREW_REPORT_ID, EVA_REPORT_ID, SURFACE_SAMPLE_ID];

// Progress tuning -----------------------------------------------------------
/// Remaining score below this counts as complete.
pub const DEFAULT_COMPLETION_EPSILON: f32 = 0.1;

// Scheduling ----------------------------------------------------------------
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 500;
pub const DEFAULT_REBUILD_DEBOUNCE_MS: u64 = 1_000;

/// Returns true for the three always-available baseline experiments.
#[must_use]
pub fn is_baseline_experiment(id: &str) -> bool {
    BASELINE_EXPERIMENT_IDS.contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_ids_are_recognised() {
        assert!(is_baseline_experiment("crewReport"));
        assert!(is_baseline_experiment("evaReport"));
        assert!(is_baseline_experiment("surfaceSample"));
        assert!(!is_baseline_experiment("temperatureScan"));
        assert!(!is_baseline_experiment("CrewReport"));
    }
}
