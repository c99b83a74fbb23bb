//! JSON-backed host collaborators.
//!
//! Hosts normally implement the catalog, oracle and context traits against
//! live game state. These serde types implement the same traits from static
//! data so the core can be driven by fixtures and the tester.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::cache::{InstrumentModule, MaskOverride};
use crate::error::FixtureError;
use crate::experiment::{ExperimentDefinition, PendingSample, ProgressRecord};
use crate::filter::Loadout;
use crate::situation::{Location, Situation, SituationKind, SituationMask};
use crate::{ContextProvider, MaskOverrideProvider, ProgressOracle, ReferenceCatalog};

const STOCK_FIXTURE: &str = include_str!("../assets/data/stock.json");

const fn default_true() -> bool {
    true
}

/// An instrument module as listed in reference data.
///
/// Third-party modules may carry their masks in `sit_mask`/`bio_mask`
/// instead of on the experiment definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentEntry {
    pub name: String,
    pub experiment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sit_mask: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio_mask: Option<u32>,
}

impl InstrumentEntry {
    #[must_use]
    pub fn module(&self) -> InstrumentModule {
        InstrumentModule {
            name: self.name.clone(),
            experiment_id: self.experiment_id.clone(),
        }
    }

    #[must_use]
    pub fn mask_override(&self) -> Option<MaskOverride> {
        self.sit_mask.map(|situations| MaskOverride {
            situation_mask: SituationMask::from_raw(situations),
            biome_mask: SituationMask::from_raw(self.bio_mask.unwrap_or(0)),
        })
    }
}

/// Extra sub-region biomes exposed only at one body/situation pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraBiomeEntry {
    pub body: String,
    pub situation: SituationKind,
    pub biomes: Vec<String>,
}

/// Static reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default = "default_true")]
    pub ready: bool,
    pub experiments: Vec<ExperimentDefinition>,
    pub bodies: Vec<Location>,
    #[serde(default)]
    pub instruments: Vec<InstrumentEntry>,
    #[serde(default)]
    pub extra_biomes: Vec<ExtraBiomeEntry>,
}

impl CatalogData {
    /// Create an empty, uninitialised catalog.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            ready: false,
            experiments: Vec::new(),
            bodies: Vec::new(),
            instruments: Vec::new(),
            extra_biomes: Vec::new(),
        }
    }

    /// Load catalog data from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into catalog data.
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn body(&self, name: &str) -> Option<&Location> {
        self.bodies.iter().find(|body| body.name == name)
    }

    #[must_use]
    pub fn definition(&self, id: &str) -> Option<&ExperimentDefinition> {
        self.experiments.iter().find(|definition| definition.id == id)
    }
}

impl MaskOverrideProvider for CatalogData {
    fn mask_override(&self, module: &InstrumentModule) -> Option<MaskOverride> {
        self.instruments
            .iter()
            .find(|entry| entry.name == module.name && entry.experiment_id == module.experiment_id)
            .and_then(InstrumentEntry::mask_override)
    }
}

impl ReferenceCatalog for CatalogData {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn experiment_definitions(&self) -> Vec<ExperimentDefinition> {
        self.experiments.clone()
    }

    fn locations(&self) -> Vec<Location> {
        self.bodies.clone()
    }

    fn extra_biomes(&self, location: &Location, kind: SituationKind) -> Vec<String> {
        self.extra_biomes
            .iter()
            .filter(|entry| entry.body == location.name && entry.situation == kind)
            .flat_map(|entry| entry.biomes.iter().cloned())
            .collect()
    }

    fn instrument_modules(&self) -> Vec<InstrumentModule> {
        self.instruments.iter().map(InstrumentEntry::module).collect()
    }

    fn mask_overrides(&self) -> &dyn MaskOverrideProvider {
        self
    }
}

/// Recorded and pending science.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressLedger {
    #[serde(default)]
    pub subjects: BTreeMap<String, ProgressRecord>,
    #[serde(default)]
    pub unlocked: BTreeSet<String>,
    #[serde(default)]
    pub pending: Vec<PendingSample>,
}

impl ProgressLedger {
    pub fn record(&mut self, identity: impl Into<String>, completed: f32, total: f32) {
        self.subjects
            .insert(identity.into(), ProgressRecord { completed, total });
    }

    pub fn unlock(&mut self, experiment_id: impl Into<String>) {
        self.unlocked.insert(experiment_id.into());
    }

    pub fn add_pending(&mut self, subject_id: impl Into<String>, amount: f32) {
        self.pending.push(PendingSample {
            subject_id: subject_id.into(),
            amount,
        });
    }

    /// Bank every pending sample: its onboard value becomes recorded science.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }
}

impl ProgressOracle for ProgressLedger {
    fn lookup_progress(&self, identity: &str) -> Option<ProgressRecord> {
        self.subjects.get(identity).copied()
    }

    fn is_experiment_unlocked(&self, experiment_id: &str) -> bool {
        self.unlocked.contains(experiment_id)
    }

    fn pending_samples(&self) -> Vec<PendingSample> {
        self.pending.clone()
    }
}

/// A situation referenced by body name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationRef {
    pub body: String,
    pub kind: SituationKind,
    #[serde(default)]
    pub biome: Option<String>,
    #[serde(default)]
    pub sub_biome: Option<String>,
}

impl SituationRef {
    /// Resolve the body against a catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog has no body with this name.
    pub fn resolve(&self, catalog: &CatalogData) -> Result<Situation, FixtureError> {
        let body = catalog
            .body(&self.body)
            .ok_or_else(|| FixtureError::UnknownBody(self.body.clone()))?;
        Ok(Situation::new(
            Arc::new(body.clone()),
            self.kind,
            self.biome.clone(),
            self.sub_biome.clone(),
        ))
    }
}

/// Serialisable description of the active vessel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VesselContext {
    #[serde(default)]
    pub instruments: BTreeSet<String>,
    #[serde(default)]
    pub crew: bool,
    #[serde(default)]
    pub situation: Option<SituationRef>,
}

impl VesselContext {
    /// Build a live context provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the situation references an unknown body.
    pub fn resolve(&self, catalog: &CatalogData) -> Result<LiveContext, FixtureError> {
        let situation = self
            .situation
            .as_ref()
            .map(|reference| reference.resolve(catalog))
            .transpose()?;
        Ok(LiveContext {
            loadout: Loadout {
                instrument_ids: self.instruments.clone(),
                has_crew: self.crew,
            },
            situation,
        })
    }
}

/// Context provider with resolved situation.
#[derive(Debug, Clone, Default)]
pub struct LiveContext {
    pub loadout: Loadout,
    pub situation: Option<Situation>,
}

impl ContextProvider for LiveContext {
    fn available_instrument_ids(&self) -> BTreeSet<String> {
        self.loadout.instrument_ids.clone()
    }

    fn has_crew(&self) -> bool {
        self.loadout.has_crew
    }

    fn current_situation(&self) -> Option<Situation> {
        self.situation.clone()
    }
}

/// Catalog, progress and vessel context in one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistFixture {
    pub catalog: CatalogData,
    #[serde(default)]
    pub progress: ProgressLedger,
    #[serde(default)]
    pub context: VesselContext,
}

impl ChecklistFixture {
    /// Load a fixture from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a fixture.
    pub fn from_json(json: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The bundled stock solar system fixture.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset fails to parse.
    pub fn stock() -> Result<Self, FixtureError> {
        Self::from_json(STOCK_FIXTURE)
    }

    /// Split into host collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the vessel context references an unknown body.
    pub fn into_parts(self) -> Result<(CatalogData, ProgressLedger, LiveContext), FixtureError> {
        let context = self.context.resolve(&self.catalog)?;
        Ok((self.catalog, self.progress, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_from_json_applies_defaults() {
        let json = r#"{
            "experiments": [
                { "id": "gooObservation", "title": "Mystery Goo Observation",
                  "situation_mask": 63, "biome_mask": 3, "science_cap": 13 }
            ],
            "bodies": [
                { "name": "Kerbin", "atmosphere": true, "ocean": true,
                  "biomes": ["Shores", "Highlands"] },
                { "name": "Sun", "surface": false }
            ],
            "instruments": [
                { "name": "GooCanister", "experiment_id": "gooObservation" }
            ]
        }"#;
        let catalog = CatalogData::from_json(json).unwrap();
        assert!(catalog.is_ready());
        let goo = catalog.definition("gooObservation").unwrap();
        assert_eq!(goo.situation_mask, SituationMask::all());
        assert!((goo.base_value - 1.0).abs() < f32::EPSILON);
        assert!(catalog.body("Kerbin").unwrap().surface);
        assert!(!catalog.body("Sun").unwrap().surface);
        assert_eq!(catalog.instrument_modules().len(), 1);
        assert!(catalog.mask_override(&catalog.instrument_modules()[0]).is_none());
    }

    #[test]
    fn instrument_masks_become_overrides() {
        let entry = InstrumentEntry {
            name: "MagBoom".to_string(),
            experiment_id: "magScan".to_string(),
            sit_mask: Some(48),
            bio_mask: None,
        };
        let masks = entry.mask_override().unwrap();
        assert!(masks.situation_mask.includes(SituationKind::InSpaceLow));
        assert!(masks.situation_mask.includes(SituationKind::InSpaceHigh));
        assert!(masks.biome_mask.is_empty());
    }

    #[test]
    fn extra_biomes_filter_by_body_and_kind() {
        let mut catalog = CatalogData::empty();
        catalog.extra_biomes.push(ExtraBiomeEntry {
            body: "Kerbin".to_string(),
            situation: SituationKind::SrfLanded,
            biomes: vec!["LaunchPad".to_string(), "Runway".to_string()],
        });
        let kerbin = Location::new("Kerbin");
        assert_eq!(
            catalog.extra_biomes(&kerbin, SituationKind::SrfLanded),
            vec!["LaunchPad", "Runway"]
        );
        assert!(catalog.extra_biomes(&kerbin, SituationKind::SrfSplashed).is_empty());
        assert!(
            catalog
                .extra_biomes(&Location::new("Mun"), SituationKind::SrfLanded)
                .is_empty()
        );
    }

    #[test]
    fn ledger_reports_progress_and_unlocks() {
        let mut ledger = ProgressLedger::default();
        ledger.record("crewReport@KerbinSrfLanded", 1.5, 5.0);
        ledger.unlock("temperatureScan");
        ledger.add_pending("crewReport@KerbinSrfLanded", 3.0);
        assert_eq!(
            ledger.lookup_progress("crewReport@KerbinSrfLanded"),
            Some(ProgressRecord {
                completed: 1.5,
                total: 5.0
            })
        );
        assert!(ledger.lookup_progress("crewReport@MunSrfLanded").is_none());
        assert!(ledger.is_experiment_unlocked("temperatureScan"));
        assert_eq!(ledger.pending_samples().len(), 1);
        ledger.clear_pending();
        assert!(ledger.pending_samples().is_empty());
    }

    #[test]
    fn vessel_context_resolves_known_bodies() {
        let mut catalog = CatalogData::empty();
        catalog.bodies.push(Location::new("Mun"));
        let vessel = VesselContext {
            instruments: ["thermometer".to_string()].into_iter().collect(),
            crew: true,
            situation: Some(SituationRef {
                body: "Mun".to_string(),
                kind: SituationKind::SrfLanded,
                biome: Some("Midlands".to_string()),
                sub_biome: None,
            }),
        };
        let live = vessel.resolve(&catalog).unwrap();
        assert!(live.has_crew());
        assert!(live.available_instrument_ids().contains("thermometer"));
        assert_eq!(
            live.current_situation().unwrap().description(),
            "landed at Mun's Midlands"
        );

        let lost = VesselContext {
            situation: Some(SituationRef {
                body: "Eeloo".to_string(),
                kind: SituationKind::InSpaceHigh,
                biome: None,
                sub_biome: None,
            }),
            ..VesselContext::default()
        };
        assert!(matches!(
            lost.resolve(&catalog),
            Err(FixtureError::UnknownBody(name)) if name == "Eeloo"
        ));
    }

    #[test]
    fn stock_fixture_parses() {
        let fixture = ChecklistFixture::stock().unwrap();
        assert!(fixture.catalog.is_ready());
        assert!(fixture.catalog.body("Kerbin").is_some());
        assert!(fixture.catalog.definition("crewReport").is_some());
        let (catalog, _, context) = fixture.into_parts().unwrap();
        assert!(!catalog.experiments.is_empty());
        assert!(context.current_situation().is_some());
    }
}
