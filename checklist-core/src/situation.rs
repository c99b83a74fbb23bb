//! Physical contexts an experiment can be attempted in.
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The six situation kinds, each with a fixed mask bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SituationKind {
    SrfLanded,
    SrfSplashed,
    FlyingLow,
    FlyingHigh,
    InSpaceLow,
    InSpaceHigh,
}

impl SituationKind {
    pub const ALL: [Self; 6] = [
        Self::SrfLanded,
        Self::SrfSplashed,
        Self::FlyingLow,
        Self::FlyingHigh,
        Self::InSpaceLow,
        Self::InSpaceHigh,
    ];

    /// Mask bit as stored in experiment definitions.
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::SrfLanded => 1,
            Self::SrfSplashed => 2,
            Self::FlyingLow => 4,
            Self::FlyingHigh => 8,
            Self::InSpaceLow => 16,
            Self::InSpaceHigh => 32,
        }
    }

    /// Token used inside progress identities.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::SrfLanded => "SrfLanded",
            Self::SrfSplashed => "SrfSplashed",
            Self::FlyingLow => "FlyingLow",
            Self::FlyingHigh => "FlyingHigh",
            Self::InSpaceLow => "InSpaceLow",
            Self::InSpaceHigh => "InSpaceHigh",
        }
    }

    /// Present-participle phrase used in descriptions.
    #[must_use]
    pub const fn phrase(self) -> &'static str {
        match self {
            Self::FlyingHigh => "flying high over",
            Self::FlyingLow => "flying low over",
            Self::InSpaceHigh => "in space high over",
            Self::InSpaceLow => "in space near",
            Self::SrfLanded => "landed at",
            Self::SrfSplashed => "splashed down at",
        }
    }

    #[must_use]
    pub const fn is_flying(self) -> bool {
        matches!(self, Self::FlyingLow | Self::FlyingHigh)
    }

    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.token() == token)
    }
}

impl fmt::Display for SituationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

bitflags! {
    /// Set of situation kinds, as used by applicability and biome masks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SituationMask: u32 {
        const SRF_LANDED    = 1;
        const SRF_SPLASHED  = 2;
        const FLYING_LOW    = 4;
        const FLYING_HIGH   = 8;
        const IN_SPACE_LOW  = 16;
        const IN_SPACE_HIGH = 32;
    }
}

impl SituationMask {
    /// Build a mask from raw reference data, dropping unknown bits.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self::from_bits_truncate(raw)
    }

    #[must_use]
    pub const fn includes(self, kind: SituationKind) -> bool {
        self.bits() & kind.bit() != 0
    }
}

impl From<SituationKind> for SituationMask {
    fn from(kind: SituationKind) -> Self {
        Self::from_raw(kind.bit())
    }
}

/// Serde adapter storing a [`SituationMask`] as its raw integer.
pub mod mask_bits {
    use super::SituationMask;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(mask: &SituationMask, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        mask.bits().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SituationMask, D::Error>
    where
        D: Deserializer<'de>,
    {
        u32::deserialize(deserializer).map(SituationMask::from_raw)
    }
}

const fn default_true() -> bool {
    true
}

/// A celestial body experiments can be performed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub atmosphere: bool,
    #[serde(default)]
    pub ocean: bool,
    #[serde(default = "default_true")]
    pub surface: bool,
    #[serde(default)]
    pub biomes: Vec<String>,
}

impl Location {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            atmosphere: false,
            ocean: false,
            surface: true,
            biomes: Vec::new(),
        }
    }

    /// Name used in descriptions (e.g. "the Mun"); falls back to the key.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// One (location, kind, biome, sub-biome) tuple.
///
/// Immutable once built; the description is derived up front.
#[derive(Debug, Clone)]
pub struct Situation {
    location: Arc<Location>,
    kind: SituationKind,
    biome: Option<String>,
    sub_biome: Option<String>,
    description: String,
}

impl Situation {
    #[must_use]
    pub fn new(
        location: Arc<Location>,
        kind: SituationKind,
        biome: Option<String>,
        sub_biome: Option<String>,
    ) -> Self {
        let biome = biome.filter(|b| !b.is_empty());
        let sub_biome = sub_biome.filter(|b| !b.is_empty());
        let formatted = format_biome(sub_biome.as_deref().or(biome.as_deref()).unwrap_or(""));
        let description = if formatted.is_empty() {
            format!("{} {}", kind.phrase(), location.display_name())
        } else {
            format!("{} {}'s {formatted}", kind.phrase(), location.display_name())
        };
        Self {
            location,
            kind,
            biome,
            sub_biome,
            description,
        }
    }

    #[must_use]
    pub fn global(location: Arc<Location>, kind: SituationKind) -> Self {
        Self::new(location, kind, None, None)
    }

    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    #[must_use]
    pub fn location_handle(&self) -> &Arc<Location> {
        &self.location
    }

    #[must_use]
    pub const fn kind(&self) -> SituationKind {
        self.kind
    }

    #[must_use]
    pub fn biome(&self) -> Option<&str> {
        self.biome.as_deref()
    }

    #[must_use]
    pub fn sub_biome(&self) -> Option<&str> {
        self.sub_biome.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Progress join key: `{id}@{location}{kind}{sub-biome or biome}`.
    #[must_use]
    pub fn identity(&self, definition_id: &str) -> String {
        let region = self
            .sub_biome
            .as_deref()
            .or(self.biome.as_deref())
            .unwrap_or_default();
        format!(
            "{definition_id}@{}{}{region}",
            self.location.name,
            self.kind.token()
        )
    }
}

impl PartialEq for Situation {
    fn eq(&self, other: &Self) -> bool {
        self.location.name == other.location.name
            && self.kind == other.kind
            && self.biome == other.biome
            && self.sub_biome == other.sub_biome
    }
}

impl Eq for Situation {}

impl Hash for Situation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.location.name.hash(state);
        self.kind.hash(state);
        self.biome.hash(state);
        self.sub_biome.hash(state);
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Split camel-case biome names into words ("HighlandsNorth" -> "Highlands North").
/// Only ASCII case changes split; other letters stay attached to their word.
#[must_use]
pub fn format_biome(biome: &str) -> String {
    let chars: Vec<char> = biome.chars().collect();
    let mut spaced = String::with_capacity(biome.len() + 4);
    for (idx, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_uppercase() {
            let after_lower = idx > 0 && chars[idx - 1].is_ascii_lowercase();
            let before_lower = chars
                .get(idx + 1)
                .is_some_and(|next| next.is_ascii_lowercase());
            if after_lower || before_lower {
                spaced.push(' ');
            }
        }
        spaced.push(ch);
    }
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
