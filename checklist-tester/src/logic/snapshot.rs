use anyhow::Result;
use serde::Serialize;
use std::time::Instant;

use checklist_core::{
    ChecklistConfig, ChecklistEngine, ChecklistFixture, DisplayMode, Experiment, ExperimentFilter,
    MaskDiagnostic,
};

/// How the checklist should be filtered for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistView {
    pub display_mode: DisplayMode,
    pub query: String,
    pub hide_complete: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChecklistEntry {
    pub identity: String,
    pub description: String,
    pub completed: f32,
    pub onboard: f32,
    pub total: f32,
    pub complete: bool,
}

impl From<&Experiment> for ChecklistEntry {
    fn from(experiment: &Experiment) -> Self {
        Self {
            identity: experiment.identity().to_string(),
            description: experiment.description().to_string(),
            completed: experiment.completed_score(),
            onboard: experiment.onboard_score(),
            total: experiment.total_score(),
            complete: experiment.is_complete(),
        }
    }
}

/// Display list and counters for one view of a fixture.
#[derive(Debug, Clone, Serialize)]
pub struct ChecklistSnapshot {
    pub display_mode: DisplayMode,
    pub query: String,
    pub hide_complete: bool,
    pub enumerated: usize,
    pub complete_count: usize,
    pub total_count: usize,
    pub entries: Vec<ChecklistEntry>,
    pub diagnostics: Vec<MaskDiagnostic>,
}

impl ChecklistSnapshot {
    #[must_use]
    pub const fn display_mode_label(&self) -> &'static str {
        self.display_mode.label()
    }

    fn capture(filter: &ExperimentFilter) -> Self {
        Self {
            display_mode: filter.display_mode(),
            query: filter.query().to_string(),
            hide_complete: filter.hide_complete(),
            enumerated: filter.all_experiments().len(),
            complete_count: filter.complete_count(),
            total_count: filter.total_count(),
            entries: filter.display_iter().map(ChecklistEntry::from).collect(),
            diagnostics: filter.cache().diagnostics().to_vec(),
        }
    }
}

/// Drive an engine over the fixture and capture the requested view.
pub fn take_snapshot(fixture: &ChecklistFixture, view: &ChecklistView) -> Result<ChecklistSnapshot> {
    let (catalog, progress, context) = fixture.clone().into_parts()?;
    let config = ChecklistConfig {
        display_mode: view.display_mode,
        hide_complete: view.hide_complete,
        ..ChecklistConfig::default()
    };
    let mut engine = ChecklistEngine::new(catalog, progress, context, &config);
    let work = engine.tick(Instant::now());
    log::debug!("initial tick ran {work:?}");
    engine.filter_mut().set_query(&view.query);
    Ok(ChecklistSnapshot::capture(engine.filter()))
}
