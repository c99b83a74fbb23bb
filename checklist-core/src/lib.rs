//! Science Checklist Core
//!
//! Platform-agnostic experiment tracking: enumerates every experiment the
//! reference data allows, keeps per-experiment progress current, and derives
//! a filtered display list. Host state arrives through the collaborator
//! traits below; nothing is read from globals.

pub mod cache;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod experiment;
pub mod filter;
pub mod query;
pub mod scheduler;
pub mod situation;

use std::collections::BTreeSet;
use std::time::Instant;

// Re-export commonly used types
pub use cache::{
    ExperimentCache, InstrumentModule, MaskDiagnostic, MaskOverride, MaskResolution,
    situation_possible,
};
pub use config::ChecklistConfig;
pub use data::{
    CatalogData, ChecklistFixture, ExtraBiomeEntry, InstrumentEntry, LiveContext, ProgressLedger,
    SituationRef, VesselContext,
};
pub use error::{ConfigError, FixtureError};
pub use experiment::{
    Experiment, ExperimentDefinition, ExperimentProgress, PendingSample, ProgressRecord,
    is_complete,
};
pub use filter::{DisplayMode, ExperimentFilter, Loadout, matches_current_situation};
pub use query::SearchQuery;
pub use scheduler::{RefreshScheduler, ScheduledWork};
pub use situation::{Location, Situation, SituationKind, SituationMask, format_biome};

/// Static reference data: definitions, bodies, instruments.
pub trait ReferenceCatalog {
    /// Whether the upstream catalogs are initialised.
    fn is_ready(&self) -> bool;

    fn experiment_definitions(&self) -> Vec<ExperimentDefinition>;

    fn locations(&self) -> Vec<Location>;

    fn situation_kinds(&self) -> Vec<SituationKind> {
        SituationKind::ALL.to_vec()
    }

    fn biome_names(&self, location: &Location) -> Vec<String> {
        location.biomes.clone()
    }

    /// Sub-region biomes available only for this body and situation.
    fn extra_biomes(&self, _location: &Location, _kind: SituationKind) -> Vec<String> {
        Vec::new()
    }

    /// Every loaded instrument module, in load order.
    fn instrument_modules(&self) -> Vec<InstrumentModule> {
        Vec::new()
    }

    fn mask_overrides(&self) -> &dyn MaskOverrideProvider {
        &NoMaskOverrides
    }
}

/// Supplies masks for modules whose definition carries none.
pub trait MaskOverrideProvider {
    fn mask_override(&self, module: &InstrumentModule) -> Option<MaskOverride>;
}

/// Provider for hosts without third-party instruments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMaskOverrides;

impl MaskOverrideProvider for NoMaskOverrides {
    fn mask_override(&self, _module: &InstrumentModule) -> Option<MaskOverride> {
        None
    }
}

/// Source of truth for collected science.
pub trait ProgressOracle {
    /// Recorded progress for an identity, if any has been recorded.
    fn lookup_progress(&self, identity: &str) -> Option<ProgressRecord>;

    fn is_experiment_unlocked(&self, experiment_id: &str) -> bool;

    /// Collected results not yet banked.
    fn pending_samples(&self) -> Vec<PendingSample>;
}

/// What the player can do right now.
pub trait ContextProvider {
    fn available_instrument_ids(&self) -> BTreeSet<String>;

    fn has_crew(&self) -> bool;

    /// `None` outside a live session.
    fn current_situation(&self) -> Option<Situation>;
}

/// Owns the host collaborators, the filter and the refresh schedule.
pub struct ChecklistEngine<C, P, X>
where
    C: ReferenceCatalog,
    P: ProgressOracle,
    X: ContextProvider,
{
    catalog: C,
    oracle: P,
    context: X,
    filter: ExperimentFilter,
    scheduler: RefreshScheduler,
}

impl<C, P, X> ChecklistEngine<C, P, X>
where
    C: ReferenceCatalog,
    P: ProgressOracle,
    X: ContextProvider,
{
    /// Create an engine; the cache stays empty until the first rebuild.
    #[must_use]
    pub fn new(catalog: C, oracle: P, context: X, config: &ChecklistConfig) -> Self {
        Self {
            catalog,
            oracle,
            context,
            filter: ExperimentFilter::new(config),
            scheduler: RefreshScheduler::from_config(config),
        }
    }

    /// Re-enumerate immediately, bypassing the scheduler.
    pub fn rebuild_now(&mut self) {
        self.filter
            .rebuild_cache(&self.catalog, &self.oracle, &self.context);
    }

    /// Refresh progress immediately, bypassing the scheduler.
    pub fn refresh_now(&mut self) {
        self.filter.refresh_progress(&self.oracle, &self.context);
    }

    /// Reference data changed (part unlocked, vessel modified).
    pub fn notify_structure_changed(&mut self, now: Instant) {
        self.scheduler.request_rebuild(now);
    }

    /// Science was collected or banked.
    pub fn notify_progress_changed(&mut self) {
        self.scheduler.request_refresh();
    }

    /// Run whatever work is due and re-sync the vessel context.
    pub fn tick(&mut self, now: Instant) -> ScheduledWork {
        if !self.filter.cache().is_ready() && self.catalog.is_ready() {
            self.scheduler.request_rebuild_now(now);
        }

        let work = self.scheduler.tick(now);
        match work {
            ScheduledWork::RebuildCache => self.rebuild_now(),
            ScheduledWork::RefreshProgress => self.refresh_now(),
            ScheduledWork::Idle => {
                self.filter.sync_context(&self.context);
            }
        }
        work
    }

    #[must_use]
    pub const fn filter(&self) -> &ExperimentFilter {
        &self.filter
    }

    /// Filter settings (mode, query, hide-complete) are changed through here.
    pub const fn filter_mut(&mut self) -> &mut ExperimentFilter {
        &mut self.filter
    }

    #[must_use]
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    pub const fn catalog_mut(&mut self) -> &mut C {
        &mut self.catalog
    }

    #[must_use]
    pub const fn oracle(&self) -> &P {
        &self.oracle
    }

    pub const fn oracle_mut(&mut self) -> &mut P {
        &mut self.oracle
    }

    #[must_use]
    pub const fn context(&self) -> &X {
        &self.context
    }

    pub const fn context_mut(&mut self) -> &mut X {
        &mut self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stock_engine() -> ChecklistEngine<CatalogData, ProgressLedger, LiveContext> {
        let (catalog, progress, context) = ChecklistFixture::stock()
            .unwrap()
            .into_parts()
            .unwrap();
        ChecklistEngine::new(catalog, progress, context, &ChecklistConfig::default())
    }

    #[test]
    fn first_tick_builds_once_catalog_is_ready() {
        let mut engine = stock_engine();
        let start = Instant::now();
        assert!(engine.filter().all_experiments().is_empty());
        assert_eq!(engine.tick(start), ScheduledWork::RebuildCache);
        assert!(!engine.filter().all_experiments().is_empty());
        assert_eq!(engine.tick(start), ScheduledWork::Idle);
    }

    #[test]
    fn not_ready_catalog_waits_then_builds() {
        let mut engine = stock_engine();
        engine.catalog_mut().ready = false;
        let start = Instant::now();
        assert_eq!(engine.tick(start), ScheduledWork::Idle);
        assert!(engine.filter().all_experiments().is_empty());

        engine.catalog_mut().ready = true;
        assert_eq!(
            engine.tick(start + Duration::from_millis(10)),
            ScheduledWork::RebuildCache
        );
        assert!(engine.filter().cache().is_ready());
    }

    #[test]
    fn progress_notifications_refresh_without_rebuild() {
        let mut engine = stock_engine();
        let start = Instant::now();
        engine.tick(start);
        let built = engine.filter().all_experiments().len();

        engine
            .oracle_mut()
            .record("seismicScan@MunSrfLandedMidlands", 22.0, 22.0);
        engine.notify_progress_changed();
        assert_eq!(
            engine.tick(start + Duration::from_secs(1)),
            ScheduledWork::RefreshProgress
        );
        assert_eq!(engine.filter().all_experiments().len(), built);
        assert!(
            engine
                .filter()
                .find("seismicScan@MunSrfLandedMidlands")
                .unwrap()
                .is_complete()
        );
    }

    #[test]
    fn structure_changes_are_debounced() {
        let mut engine = stock_engine();
        let start = Instant::now();
        engine.tick(start);
        engine.notify_structure_changed(start);
        assert_eq!(
            engine.tick(start + Duration::from_millis(100)),
            ScheduledWork::Idle
        );
        assert_eq!(
            engine.tick(start + Duration::from_secs(2)),
            ScheduledWork::RebuildCache
        );
    }

    #[test]
    fn idle_ticks_pick_up_context_changes() {
        let mut engine = stock_engine();
        let start = Instant::now();
        engine.tick(start);
        engine.filter_mut().set_display_mode(DisplayMode::CurrentSituation);
        assert!(engine.filter().display_len() > 0);

        engine.context_mut().situation = None;
        assert_eq!(engine.tick(start), ScheduledWork::Idle);
        assert_eq!(engine.filter().display_len(), 0);
    }
}
