//! Experiment definitions and the per-situation experiment entity.
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ProgressOracle;
use crate::constants::is_baseline_experiment;
use crate::situation::{Situation, SituationMask, mask_bits};

const fn empty_mask() -> SituationMask {
    SituationMask::empty()
}

const fn default_base_value() -> f32 {
    1.0
}

/// A kind of measurement a player can attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentDefinition {
    pub id: String,
    pub title: String,
    /// Situations the experiment can be performed in.
    #[serde(default = "empty_mask", with = "mask_bits")]
    pub situation_mask: SituationMask,
    /// Situations where the result differs per biome.
    #[serde(default = "empty_mask", with = "mask_bits")]
    pub biome_mask: SituationMask,
    #[serde(default)]
    pub requires_atmosphere: bool,
    #[serde(default = "default_base_value")]
    pub base_value: f32,
    pub science_cap: f32,
}

impl ExperimentDefinition {
    /// Score multiplier applied to each pending sample.
    #[must_use]
    pub fn sample_multiplier(&self) -> f32 {
        if self.science_cap > 0.0 {
            self.base_value / self.science_cap
        } else {
            0.0
        }
    }

    /// True when the definition carries no mask metadata at all.
    #[must_use]
    pub const fn has_no_masks(&self) -> bool {
        self.situation_mask.is_empty() && self.biome_mask.is_empty()
    }
}

/// Recorded progress for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub completed: f32,
    pub total: f32,
}

/// A collected result that has not been banked yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSample {
    pub subject_id: String,
    /// Raw amount as reported by the host. Kept for the host's own bookkeeping;
    /// onboard valuation uses the remaining gap to the total instead.
    #[serde(default)]
    pub amount: f32,
}

/// Progress state captured by one [`Experiment::update`] call.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExperimentProgress {
    pub completed: f32,
    pub total: f32,
    pub onboard: f32,
    pub unlocked: bool,
    pub complete: bool,
}

impl ExperimentProgress {
    /// Snapshot before any oracle lookup: nothing collected against the cap.
    #[must_use]
    pub fn initial(definition: &ExperimentDefinition) -> Self {
        Self {
            completed: 0.0,
            total: definition.science_cap,
            onboard: 0.0,
            unlocked: is_baseline_experiment(&definition.id),
            complete: false,
        }
    }

    /// Derive a fresh snapshot from the oracle and the pending samples.
    ///
    /// Samples for other identities are ignored. Each matching sample is
    /// valued against the gap left after earlier samples, so onboard never
    /// pushes completed + onboard past the total.
    pub fn evaluate<'a, I>(
        definition: &ExperimentDefinition,
        identity: &str,
        oracle: &dyn ProgressOracle,
        pending: I,
        epsilon: f32,
    ) -> Self
    where
        I: IntoIterator<Item = &'a PendingSample>,
    {
        let unlocked =
            is_baseline_experiment(&definition.id) || oracle.is_experiment_unlocked(&definition.id);
        let record = oracle.lookup_progress(identity).unwrap_or(ProgressRecord {
            completed: 0.0,
            total: definition.science_cap,
        });

        let multiplier = definition.sample_multiplier();
        let mut onboard = 0.0_f32;
        for sample in pending {
            if sample.subject_id != identity {
                continue;
            }
            let gap = (record.total - (record.completed + onboard)).max(0.0);
            onboard += gap * multiplier;
        }

        Self {
            completed: record.completed,
            total: record.total,
            onboard,
            unlocked,
            complete: is_complete(record.completed, record.total, epsilon),
        }
    }

    /// Score still to be collected, ignoring onboard samples.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        (self.total - self.completed).max(0.0)
    }
}

/// Completion check tolerant of scoring round-off.
#[must_use]
pub fn is_complete(completed: f32, total: f32, epsilon: f32) -> bool {
    completed >= total || total - completed < epsilon
}

/// One definition bound to one situation.
#[derive(Debug, Clone)]
pub struct Experiment {
    definition: Arc<ExperimentDefinition>,
    situation: Situation,
    uses_sub_biomes: bool,
    identity: String,
    description: String,
    search_text: String,
    progress: ExperimentProgress,
}

impl Experiment {
    #[must_use]
    pub fn new(definition: Arc<ExperimentDefinition>, situation: Situation) -> Self {
        Self::build(definition, situation, false)
    }

    /// Experiment bound to a sub-biome region (e.g. a launch site).
    #[must_use]
    pub fn with_sub_biomes(definition: Arc<ExperimentDefinition>, situation: Situation) -> Self {
        Self::build(definition, situation, true)
    }

    fn build(
        definition: Arc<ExperimentDefinition>,
        situation: Situation,
        uses_sub_biomes: bool,
    ) -> Self {
        let identity = situation.identity(&definition.id);
        let description = format!("{} while {}", definition.title, situation.description());
        let search_text = description.to_lowercase();
        let progress = ExperimentProgress::initial(&definition);
        Self {
            definition,
            situation,
            uses_sub_biomes,
            identity,
            description,
            search_text,
            progress,
        }
    }

    /// Replace the progress snapshot with one freshly derived from the oracle.
    pub fn update<'a, I>(&mut self, oracle: &dyn ProgressOracle, pending: I, epsilon: f32)
    where
        I: IntoIterator<Item = &'a PendingSample>,
    {
        self.progress =
            ExperimentProgress::evaluate(&self.definition, &self.identity, oracle, pending, epsilon);
    }

    #[must_use]
    pub fn definition(&self) -> &ExperimentDefinition {
        &self.definition
    }

    #[must_use]
    pub fn situation(&self) -> &Situation {
        &self.situation
    }

    #[must_use]
    pub const fn uses_sub_biomes(&self) -> bool {
        self.uses_sub_biomes
    }

    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Lower-cased description used by text search.
    #[must_use]
    pub(crate) fn search_text(&self) -> &str {
        &self.search_text
    }

    #[must_use]
    pub const fn progress(&self) -> &ExperimentProgress {
        &self.progress
    }

    #[must_use]
    pub const fn completed_score(&self) -> f32 {
        self.progress.completed
    }

    #[must_use]
    pub const fn total_score(&self) -> f32 {
        self.progress.total
    }

    #[must_use]
    pub const fn onboard_score(&self) -> f32 {
        self.progress.onboard
    }

    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        self.progress.unlocked
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.progress.complete
    }
}
