//! Authored character records and the per-calculation resolved view.
//!
//! Records are deserialized once from the dataset and never mutated. Variant
//! overlays are applied with one merge function per field group, each of which
//! overrides one level deep: a key present in the overlay replaces the base's
//! key wholesale, keys it omits are inherited.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::mechanics::Mechanics;

/// Cycle length used when a character defines neither `pitch` nor `phases`.
pub const DEFAULT_CYCLE_MS: f64 = 1000.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, rename = "altNames", alias = "alt_names", skip_serializing_if = "Vec::is_empty")]
    pub alt_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cn_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_variant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_label: Option<String>,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub base_action: BaseAction,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub hero_action: Map<String, Value>,
    #[serde(default)]
    pub mechanics: Mechanics,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<String, VariantOverlay>,
}

impl CharacterRecord {
    pub fn variant(&self, key: &str) -> Option<&VariantOverlay> {
        self.variants.get(key)
    }

    /// The authored default variant, if it names a variant that exists.
    pub fn default_variant(&self) -> Option<&str> {
        self.default_variant_id
            .as_deref()
            .filter(|key| self.variants.contains_key(*key))
    }
}

/// Partial record applied on top of a base record to form an alternate state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_action: Option<BaseAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero_action: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanics: Option<Mechanics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_scaling_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defense_multiplier: Option<f64>,
}

impl Stats {
    pub fn overlay(&self, overlay: &Stats) -> Stats {
        Stats {
            attack_multiplier: overlay.attack_multiplier.or(self.attack_multiplier),
            attack_scaling_factor: overlay.attack_scaling_factor.or(self.attack_scaling_factor),
            defense_multiplier: overlay.defense_multiplier.or(self.defense_multiplier),
        }
    }

    /// `attack_multiplier × attack_scaling_factor`, each defaulting to 1.0.
    pub fn composed_attack_multiplier(&self) -> f64 {
        self.attack_multiplier.unwrap_or(1.0) * self.attack_scaling_factor.unwrap_or(1.0)
    }

    pub fn defense_multiplier(&self) -> f64 {
        self.defense_multiplier.unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<Pitch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phases: Option<Vec<Phase>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion_multiplier: Option<MotionMultiplier>,
}

impl BaseAction {
    pub fn overlay(&self, overlay: &BaseAction) -> BaseAction {
        BaseAction {
            pitch: overlay.pitch.clone().or_else(|| self.pitch.clone()),
            phases: overlay.phases.clone().or_else(|| self.phases.clone()),
            motion_multiplier: overlay
                .motion_multiplier
                .clone()
                .or_else(|| self.motion_multiplier.clone()),
        }
    }

    /// Phases, when a non-empty list is authored. An empty list means "no phases".
    pub fn phases(&self) -> Option<&[Phase]> {
        self.phases.as_deref().filter(|phases| !phases.is_empty())
    }

    pub fn static_pitch(&self) -> Pitch {
        self.pitch.clone().unwrap_or_default()
    }

    pub fn motion_multiplier(&self) -> MotionMultiplier {
        self.motion_multiplier.clone().unwrap_or_default()
    }
}

/// `[cycle_length_ms, hit_offset_1, hit_offset_2, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pitch(pub Vec<f64>);

impl Default for Pitch {
    fn default() -> Self {
        Pitch(vec![DEFAULT_CYCLE_MS])
    }
}

impl Pitch {
    /// Element 0; an empty pitch has no usable cycle and reports 0.
    pub fn cycle_length(&self) -> f64 {
        self.0.first().copied().unwrap_or(0.0)
    }

    /// `(hit_index, offset_ms)` pairs with 1-based indices, including offsets
    /// past the cycle end (the scheduler filters those).
    pub fn offsets(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.0
            .iter()
            .skip(1)
            .zip(1u32..)
            .map(|(offset, index)| (index, *offset))
    }

    pub fn scaled(&self, scale: f64) -> Pitch {
        if scale == 1.0 {
            return self.clone();
        }
        Pitch(self.0.iter().map(|value| value * scale).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub pitch: Pitch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion_multiplier: Option<MotionMultiplier>,
    /// Cycles to run before advancing; absent or negative (canonically -1) repeats forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<i64>,
}

impl Phase {
    /// `None` when the phase never ends.
    pub fn repeat_limit(&self) -> Option<u64> {
        match self.repeat {
            Some(repeat) if repeat >= 0 => Some(repeat as u64),
            _ => None,
        }
    }
}

/// Per-hit damage scalar: one value for every hit, or a sequence indexed by hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MotionMultiplier {
    Scalar(f64),
    PerHit(Vec<f64>),
}

impl Default for MotionMultiplier {
    fn default() -> Self {
        MotionMultiplier::Scalar(1.0)
    }
}

impl MotionMultiplier {
    /// Value for a 1-based hit index; sequences wrap so short patterns repeat.
    pub fn for_hit(&self, hit_index: u32) -> f64 {
        match self {
            Self::Scalar(value) => *value,
            Self::PerHit(values) if values.is_empty() => 1.0,
            Self::PerHit(values) => {
                let slot = hit_index.saturating_sub(1) as usize % values.len();
                values[slot]
            }
        }
    }
}

fn overlay_object(base: &Map<String, Value>, overlay: Option<&Map<String, Value>>) -> Map<String, Value> {
    let mut merged = base.clone();
    if let Some(overlay) = overlay {
        for (key, value) in overlay {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// A record with one variant (or none) applied. Owned by a single calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCharacter {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub stats: Stats,
    pub attributes: Map<String, Value>,
    pub base_action: BaseAction,
    pub hero_action: Map<String, Value>,
    pub mechanics: Mechanics,
}

impl ResolvedCharacter {
    pub fn from_record(record: &CharacterRecord) -> Self {
        ResolvedCharacter {
            id: record.id.clone(),
            name: record.name.clone(),
            variant: None,
            stats: record.stats,
            attributes: record.attributes.clone(),
            base_action: record.base_action.clone(),
            hero_action: record.hero_action.clone(),
            mechanics: record.mechanics.clone(),
        }
    }

    pub fn with_variant(record: &CharacterRecord, key: &str, overlay: &VariantOverlay) -> Self {
        ResolvedCharacter {
            id: record.id.clone(),
            name: record.name.clone(),
            variant: Some(key.to_string()),
            stats: overlay
                .stats
                .as_ref()
                .map_or(record.stats, |stats| record.stats.overlay(stats)),
            attributes: overlay_object(&record.attributes, overlay.attributes.as_ref()),
            base_action: overlay
                .base_action
                .as_ref()
                .map_or_else(|| record.base_action.clone(), |action| record.base_action.overlay(action)),
            hero_action: overlay_object(&record.hero_action, overlay.hero_action.as_ref()),
            mechanics: overlay
                .mechanics
                .as_ref()
                .map_or_else(|| record.mechanics.clone(), |mechanics| record.mechanics.overlay(mechanics)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn motion_multiplier_wraps_short_sequences() {
        let motion = MotionMultiplier::PerHit(vec![1.0, 1.2, 1.5]);
        assert_eq!(motion.for_hit(1), 1.0);
        assert_eq!(motion.for_hit(3), 1.5);
        assert_eq!(motion.for_hit(4), 1.0);
        assert_eq!(motion.for_hit(5), 1.2);
    }

    #[test]
    fn motion_multiplier_parses_scalar_or_sequence() {
        let scalar: MotionMultiplier = serde_json::from_str("1.25").unwrap();
        let sequence: MotionMultiplier = serde_json::from_str("[0.5, 2]").unwrap();
        assert_eq!(scalar, MotionMultiplier::Scalar(1.25));
        assert_eq!(sequence, MotionMultiplier::PerHit(vec![0.5, 2.0]));
        assert_eq!(MotionMultiplier::PerHit(Vec::new()).for_hit(3), 1.0);
    }

    #[test]
    fn pitch_offsets_are_one_based() {
        let pitch = Pitch(vec![1000.0, 300.0, 700.0]);
        let offsets: Vec<_> = pitch.offsets().collect();
        assert_eq!(offsets, vec![(1, 300.0), (2, 700.0)]);
        assert_eq!(Pitch(Vec::new()).cycle_length(), 0.0);
    }

    #[test]
    fn stats_overlay_keeps_unspecified_fields() {
        let base = Stats {
            attack_multiplier: Some(1.0),
            attack_scaling_factor: Some(1.1),
            defense_multiplier: None,
        };
        let merged = base.overlay(&Stats {
            attack_multiplier: Some(1.4),
            ..Stats::default()
        });
        assert_eq!(merged.attack_multiplier, Some(1.4));
        assert_eq!(merged.attack_scaling_factor, Some(1.1));
        assert_eq!(merged.defense_multiplier(), 1.0);
    }

    #[test]
    fn negative_repeat_is_infinite() {
        let phase: Phase = serde_json::from_str(r#"{"pitch": [500, 100], "repeat": -1}"#).unwrap();
        assert_eq!(phase.repeat_limit(), None);
        let phase: Phase = serde_json::from_str(r#"{"pitch": [500, 100], "repeat": 2}"#).unwrap();
        assert_eq!(phase.repeat_limit(), Some(2));
    }

    #[test]
    fn attribute_overlay_is_key_by_key() {
        let record: CharacterRecord = serde_json::from_str(
            r#"{"name": "x", "attributes": {"element": "fire", "tier": 3},
                "variants": {"awakened": {"attributes": {"tier": 4}}}}"#,
        )
        .unwrap();
        let overlay = record.variant("awakened").unwrap();
        let resolved = ResolvedCharacter::with_variant(&record, "awakened", overlay);
        assert_eq!(resolved.attributes["element"], "fire");
        assert_eq!(resolved.attributes["tier"], 4);
    }
}
