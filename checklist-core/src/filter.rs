//! The display filter over the experiment cache.
//!
//! The filter owns the cache and a view configuration. Any change to the
//! configuration, a rebuild or a progress refresh recomputes the display
//! list wholesale: mode filter, text filter, stable sort by total score,
//! counts, then the hide-complete partition.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::cache::ExperimentCache;
use crate::config::ChecklistConfig;
use crate::constants::{CREW_REPORT_ID, is_baseline_experiment};
use crate::experiment::{Experiment, PendingSample};
use crate::query::SearchQuery;
use crate::situation::Situation;
use crate::{ContextProvider, ProgressOracle, ReferenceCatalog};

/// Coarse visibility filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// Doable with the active vessel in its current situation.
    CurrentSituation,
    /// Doable with the active vessel anywhere.
    ActiveVessel,
    #[default]
    Unlocked,
    All,
}

impl DisplayMode {
    pub const ALL: [Self; 4] = [
        Self::CurrentSituation,
        Self::ActiveVessel,
        Self::Unlocked,
        Self::All,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CurrentSituation => "Available right now",
            Self::ActiveVessel => "Available on this vessel",
            Self::Unlocked => "All unlocked",
            Self::All => "All",
        }
    }
}

/// Instruments and crew on the active vessel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Loadout {
    pub instrument_ids: BTreeSet<String>,
    pub has_crew: bool,
}

impl Loadout {
    #[must_use]
    pub fn from_context(context: &dyn ContextProvider) -> Self {
        Self {
            instrument_ids: context.available_instrument_ids(),
            has_crew: context.has_crew(),
        }
    }

    /// Whether the vessel can perform the experiment.
    ///
    /// Crew reports need crew even when a capsule module advertises them.
    #[must_use]
    pub fn can_dispatch(&self, experiment_id: &str) -> bool {
        (experiment_id != CREW_REPORT_ID && self.instrument_ids.contains(experiment_id))
            || (self.has_crew && is_baseline_experiment(experiment_id))
    }
}

/// Whether an experiment can be attempted in the current situation.
///
/// Biome is only compared when the experiment has one; sub-biome only when
/// the experiment uses sub-biomes.
#[must_use]
pub fn matches_current_situation(experiment: &Experiment, current: &Situation) -> bool {
    let situation = experiment.situation();
    situation.location().name == current.location().name
        && situation.kind() == current.kind()
        && situation
            .biome()
            .is_none_or(|biome| current.biome() == Some(biome))
        && (!experiment.uses_sub_biomes() || situation.sub_biome() == current.sub_biome())
}

/// Owns the experiment cache and derives the visible list from it.
#[derive(Debug, Clone)]
pub struct ExperimentFilter {
    cache: ExperimentCache,
    display_mode: DisplayMode,
    hide_complete: bool,
    query: SearchQuery,
    current_situation: Option<Situation>,
    loadout: Loadout,
    completion_epsilon: f32,
    track_onboard_science: bool,
    display: Vec<usize>,
    complete_count: usize,
    total_count: usize,
}

impl Default for ExperimentFilter {
    fn default() -> Self {
        Self::new(&ChecklistConfig::default())
    }
}

impl ExperimentFilter {
    #[must_use]
    pub fn new(config: &ChecklistConfig) -> Self {
        Self {
            cache: ExperimentCache::not_ready(),
            display_mode: config.display_mode,
            hide_complete: config.hide_complete,
            query: SearchQuery::default(),
            current_situation: None,
            loadout: Loadout::default(),
            completion_epsilon: config.completion_epsilon,
            track_onboard_science: config.track_onboard_science,
            display: Vec::new(),
            complete_count: 0,
            total_count: 0,
        }
    }

    /// Re-enumerate the experiment universe and refresh its progress.
    pub fn rebuild_cache(
        &mut self,
        catalog: &dyn ReferenceCatalog,
        oracle: &dyn ProgressOracle,
        context: &dyn ContextProvider,
    ) {
        log::trace!("rebuild_cache");
        self.cache = ExperimentCache::build(catalog);
        self.capture_context(context);
        self.update_progress(oracle);
        self.recompute();
    }

    /// Update every held experiment from the oracle without re-enumerating.
    pub fn refresh_progress(&mut self, oracle: &dyn ProgressOracle, context: &dyn ContextProvider) {
        log::trace!("refresh_progress");
        self.capture_context(context);
        self.update_progress(oracle);
        self.recompute();
    }

    /// Pull loadout and situation from the host; recomputes only on change.
    pub fn sync_context(&mut self, context: &dyn ContextProvider) -> bool {
        let loadout = Loadout::from_context(context);
        let situation = context.current_situation();
        if loadout == self.loadout && situation == self.current_situation {
            return false;
        }
        self.loadout = loadout;
        self.current_situation = situation;
        self.recompute();
        true
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) -> bool {
        if self.display_mode == mode {
            return false;
        }
        self.display_mode = mode;
        self.recompute();
        true
    }

    pub fn set_hide_complete(&mut self, hide: bool) -> bool {
        if self.hide_complete == hide {
            return false;
        }
        self.hide_complete = hide;
        self.recompute();
        true
    }

    pub fn set_query(&mut self, text: &str) -> bool {
        if self.query.text() == text {
            return false;
        }
        self.query = SearchQuery::parse(text);
        self.recompute();
        true
    }

    pub fn set_current_situation(&mut self, situation: Option<Situation>) -> bool {
        if self.current_situation == situation {
            return false;
        }
        self.current_situation = situation;
        self.recompute();
        true
    }

    pub fn set_loadout(&mut self, loadout: Loadout) -> bool {
        if self.loadout == loadout {
            return false;
        }
        self.loadout = loadout;
        self.recompute();
        true
    }

    #[must_use]
    pub const fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    #[must_use]
    pub const fn hide_complete(&self) -> bool {
        self.hide_complete
    }

    #[must_use]
    pub fn query(&self) -> &str {
        self.query.text()
    }

    #[must_use]
    pub const fn current_situation(&self) -> Option<&Situation> {
        self.current_situation.as_ref()
    }

    #[must_use]
    pub const fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    #[must_use]
    pub const fn cache(&self) -> &ExperimentCache {
        &self.cache
    }

    #[must_use]
    pub fn all_experiments(&self) -> &[Experiment] {
        self.cache.experiments()
    }

    /// Visible experiments in display order.
    #[must_use]
    pub fn display_list(&self) -> Vec<&Experiment> {
        self.display_iter().collect()
    }

    pub fn display_iter(&self) -> impl Iterator<Item = &Experiment> {
        let experiments = self.cache.experiments();
        self.display.iter().map(move |&idx| &experiments[idx])
    }

    #[must_use]
    pub fn display_len(&self) -> usize {
        self.display.len()
    }

    /// Complete experiments among the mode and text matches, hidden ones included.
    #[must_use]
    pub const fn complete_count(&self) -> usize {
        self.complete_count
    }

    /// Mode and text matches, hidden ones included.
    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.total_count
    }

    #[must_use]
    pub fn find(&self, identity: &str) -> Option<&Experiment> {
        self.cache
            .experiments()
            .iter()
            .find(|experiment| experiment.identity() == identity)
    }

    fn capture_context(&mut self, context: &dyn ContextProvider) {
        self.loadout = Loadout::from_context(context);
        self.current_situation = context.current_situation();
    }

    fn update_progress(&mut self, oracle: &dyn ProgressOracle) {
        let pending = if self.track_onboard_science {
            oracle.pending_samples()
        } else {
            Vec::new()
        };
        let mut by_subject: HashMap<&str, Vec<&PendingSample>> = HashMap::new();
        for sample in &pending {
            by_subject
                .entry(sample.subject_id.as_str())
                .or_default()
                .push(sample);
        }

        let epsilon = self.completion_epsilon;
        for experiment in self.cache.experiments_mut() {
            let samples = by_subject
                .get(experiment.identity())
                .map_or(&[][..], Vec::as_slice);
            experiment.update(oracle, samples.iter().copied(), epsilon);
        }
    }

    fn mode_matches(&self, experiment: &Experiment) -> bool {
        match self.display_mode {
            DisplayMode::All => true,
            DisplayMode::Unlocked => experiment.is_unlocked(),
            DisplayMode::ActiveVessel => self.loadout.can_dispatch(&experiment.definition().id),
            DisplayMode::CurrentSituation => {
                self.loadout.can_dispatch(&experiment.definition().id)
                    && self
                        .current_situation
                        .as_ref()
                        .is_some_and(|current| matches_current_situation(experiment, current))
            }
        }
    }

    /// Rebuild the display list and counters from the current configuration.
    pub fn recompute(&mut self) {
        log::trace!("recompute display list");
        let experiments = self.cache.experiments();
        let mut visible: Vec<usize> = experiments
            .iter()
            .enumerate()
            .filter(|(_, experiment)| self.mode_matches(experiment))
            .filter(|(_, experiment)| self.query.matches_lowercase(experiment.search_text()))
            .map(|(idx, _)| idx)
            .collect();

        // Vec::sort_by is stable; equal totals keep enumeration order.
        visible.sort_by(|&a, &b| {
            experiments[a]
                .total_score()
                .total_cmp(&experiments[b].total_score())
        });

        let total_count = visible.len();
        let complete_count = visible
            .iter()
            .filter(|&&idx| experiments[idx].is_complete())
            .count();
        if self.hide_complete {
            visible.retain(|&idx| !experiments[idx].is_complete());
        }

        self.total_count = total_count;
        self.complete_count = complete_count;
        self.display = visible;
    }
}
