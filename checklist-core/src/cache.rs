//! Enumeration of the full experiment universe.
//!
//! Expands definitions x locations x situation kinds x biomes into
//! [`Experiment`] instances. This is the expensive step and should only run
//! when reference data changes.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::ReferenceCatalog;
use crate::experiment::{Experiment, ExperimentDefinition};
use crate::situation::{Location, Situation, SituationKind, SituationMask, mask_bits};

/// An instrument part module and the experiment it performs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentModule {
    pub name: String,
    pub experiment_id: String,
}

/// Masks recovered for a definition that carries none of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskOverride {
    #[serde(with = "mask_bits")]
    pub situation_mask: SituationMask,
    #[serde(with = "mask_bits")]
    pub biome_mask: SituationMask,
}

/// How a zero-mask definition was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskResolution {
    /// Masks came from the instrument module's override.
    Recovered(MaskOverride),
    /// Nothing found; valid everywhere not excluded, no biome relevance.
    Unrestricted,
}

/// Reference data outside the expected shape, reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskDiagnostic {
    pub experiment_id: String,
    pub module: Option<String>,
    pub resolution: MaskResolution,
}

/// Result of one enumeration pass.
#[derive(Debug, Clone, Default)]
pub struct ExperimentCache {
    experiments: Vec<Experiment>,
    ready: bool,
    diagnostics: Vec<MaskDiagnostic>,
}

impl ExperimentCache {
    /// Empty cache for a catalog that is not initialised yet.
    #[must_use]
    pub fn not_ready() -> Self {
        Self::default()
    }

    /// Enumerate every valid experiment for the catalog snapshot.
    #[must_use]
    pub fn build(catalog: &dyn ReferenceCatalog) -> Self {
        log::trace!("rebuilding experiment cache");
        if !catalog.is_ready() {
            log::debug!("reference catalog not ready, cache left empty");
            return Self::not_ready();
        }

        let instruments = canonical_instruments(catalog.instrument_modules());
        let locations: Vec<Arc<Location>> =
            catalog.locations().into_iter().map(Arc::new).collect();
        let biomes: Vec<Vec<String>> = locations
            .iter()
            .map(|location| catalog.biome_names(location))
            .collect();
        let kinds = catalog.situation_kinds();

        let mut builder = CacheBuilder::default();
        let mut definition_ids = HashSet::new();

        for definition in catalog.experiment_definitions() {
            if !definition_ids.insert(definition.id.clone()) {
                log::debug!("duplicate definition {} ignored", definition.id);
                continue;
            }
            let (situation_mask, biome_mask) =
                builder.resolve_masks(catalog, &definition, instruments.get(&definition.id));
            let definition = Arc::new(definition);

            for (location, location_biomes) in locations.iter().zip(&biomes) {
                if definition.requires_atmosphere && !location.atmosphere {
                    continue;
                }
                for &kind in &kinds {
                    if !situation_possible(location, kind) || !situation_mask.includes(kind) {
                        continue;
                    }
                    if !location_biomes.is_empty() && biome_mask.includes(kind) {
                        for biome in location_biomes {
                            let situation = Situation::new(
                                Arc::clone(location),
                                kind,
                                Some(biome.clone()),
                                None,
                            );
                            builder.push(Experiment::new(Arc::clone(&definition), situation));
                        }
                        for extra in catalog.extra_biomes(location, kind) {
                            let situation =
                                Situation::new(Arc::clone(location), kind, None, Some(extra));
                            builder.push(Experiment::with_sub_biomes(
                                Arc::clone(&definition),
                                situation,
                            ));
                        }
                    } else {
                        let situation = Situation::global(Arc::clone(location), kind);
                        builder.push(Experiment::new(Arc::clone(&definition), situation));
                    }
                }
            }
        }

        log::debug!(
            "experiment cache rebuilt: {} experiments",
            builder.experiments.len()
        );
        Self {
            experiments: builder.experiments,
            ready: true,
            diagnostics: builder.diagnostics,
        }
    }

    #[must_use]
    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    pub(crate) fn experiments_mut(&mut self) -> &mut [Experiment] {
        &mut self.experiments
    }

    /// Whether the catalog was initialised when this cache was built.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[MaskDiagnostic] {
        &self.diagnostics
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.experiments.iter().map(Experiment::identity)
    }
}

#[derive(Default)]
struct CacheBuilder {
    experiments: Vec<Experiment>,
    identities: HashSet<String>,
    diagnostics: Vec<MaskDiagnostic>,
}

impl CacheBuilder {
    fn push(&mut self, experiment: Experiment) {
        if self.identities.insert(experiment.identity().to_string()) {
            self.experiments.push(experiment);
        } else {
            log::debug!("duplicate identity {} skipped", experiment.identity());
        }
    }

    fn resolve_masks(
        &mut self,
        catalog: &dyn ReferenceCatalog,
        definition: &ExperimentDefinition,
        module: Option<&InstrumentModule>,
    ) -> (SituationMask, SituationMask) {
        if !definition.has_no_masks() {
            return (definition.situation_mask, definition.biome_mask);
        }

        // an override without situations would drop the experiment entirely
        let recovered = module
            .and_then(|m| catalog.mask_overrides().mask_override(m))
            .filter(|masks| !masks.situation_mask.is_empty());
        let (resolution, masks) = match recovered {
            Some(masks) => {
                log::info!(
                    "recovered masks for {} from module {}: situations {} biomes {}",
                    definition.id,
                    module.map_or("-", |m| m.name.as_str()),
                    masks.situation_mask.bits(),
                    masks.biome_mask.bits()
                );
                (
                    MaskResolution::Recovered(masks),
                    (masks.situation_mask, masks.biome_mask),
                )
            }
            None => {
                log::warn!(
                    "{} has no situation or biome mask, treating it as valid everywhere",
                    definition.id
                );
                (
                    MaskResolution::Unrestricted,
                    (SituationMask::all(), SituationMask::empty()),
                )
            }
        };
        self.diagnostics.push(MaskDiagnostic {
            experiment_id: definition.id.clone(),
            module: module.map(|m| m.name.clone()),
            resolution,
        });
        masks
    }
}

/// First module seen for each experiment id wins.
fn canonical_instruments(modules: Vec<InstrumentModule>) -> HashMap<String, InstrumentModule> {
    let mut canonical = HashMap::new();
    for module in modules {
        canonical
            .entry(module.experiment_id.clone())
            .or_insert(module);
    }
    canonical
}

/// Physical exclusions that hold for every experiment.
#[must_use]
pub fn situation_possible(location: &Location, kind: SituationKind) -> bool {
    match kind {
        SituationKind::SrfSplashed => location.ocean,
        SituationKind::SrfLanded => location.surface,
        SituationKind::FlyingLow | SituationKind::FlyingHigh => location.atmosphere,
        SituationKind::InSpaceLow | SituationKind::InSpaceHigh => true,
    }
}
