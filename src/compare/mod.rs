//! Comparison board: a list of (character, variant, stat modifier) entries
//! calculated under shared settings and ranked by total damage.

pub mod ranking;

use serde::{Deserialize, Serialize};

use crate::combat::{CalculateOptions, CalculateRequest, NORMAL_STATE};
use crate::data::{CharacterRecord, CharacterRepository};

pub use ranking::{rank_entries, RankedEntry};

/// Variant key meaning "the base record".
pub const DEFAULT_VARIANT: &str = "default";
pub const DEFAULT_COLOR: &str = "#808080";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSettings {
    #[serde(default = "default_attack")]
    pub attack: f64,
    #[serde(default = "default_defense")]
    pub defense: f64,
    /// Seconds.
    #[serde(default = "default_duration")]
    pub duration: f64,
}

fn default_attack() -> f64 {
    1000.0
}

fn default_defense() -> f64 {
    200.0
}

fn default_duration() -> f64 {
    3.0
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            attack: default_attack(),
            defense: default_defense(),
            duration: default_duration(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    #[serde(default = "new_entry_id")]
    pub id: String,
    pub character: String,
    #[serde(default = "default_variant")]
    pub variant: String,
    #[serde(default = "unit_modifier")]
    pub atk_mod: f64,
    #[serde(default = "unit_modifier")]
    pub def_mod: f64,
    #[serde(default = "default_color")]
    pub color: String,
}

fn new_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn default_variant() -> String {
    DEFAULT_VARIANT.to_string()
}

fn unit_modifier() -> f64 {
    1.0
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl ComparisonEntry {
    pub fn new(character: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            id: new_entry_id(),
            character: character.into(),
            variant: variant.into(),
            atk_mod: 1.0,
            def_mod: 1.0,
            color: default_color(),
        }
    }

    fn for_record(record: &CharacterRecord, variant: &str) -> Self {
        let mut entry = Self::new(lookup_key(record), variant);
        if let Some(color) = &record.theme_color {
            entry.color = color.clone();
        }
        entry
    }

    pub fn is_default_variant(&self) -> bool {
        self.variant.is_empty() || self.variant == DEFAULT_VARIANT
    }

    /// Calculation request for this entry under the shared settings.
    pub fn request(&self, settings: &ComparisonSettings) -> CalculateRequest {
        let mut options = CalculateOptions::default()
            .with_base_atk(settings.attack * self.atk_mod)
            .with_duration_ms(settings.duration * 1000.0);
        let state = if self.is_default_variant() {
            NORMAL_STATE.to_string()
        } else {
            options = options.with_variant(self.variant.clone());
            self.variant.clone()
        };
        CalculateRequest::new(self.character.clone())
            .state(state)
            .target_defense(settings.defense * self.def_mod)
            .options(options)
    }
}

fn lookup_key(record: &CharacterRecord) -> String {
    if record.id.is_empty() {
        record.name.clone()
    } else {
        record.id.clone()
    }
}

fn primary_variant(record: &CharacterRecord) -> &str {
    record.default_variant().unwrap_or(DEFAULT_VARIANT)
}

/// One entry per character, on its authored default variant when it has one.
pub fn default_entries(repository: &CharacterRepository) -> Vec<ComparisonEntry> {
    repository
        .records()
        .iter()
        .map(|record| ComparisonEntry::for_record(record, primary_variant(record)))
        .collect()
}

/// Entries for every character with `role` (all when `None`). With
/// `include_variants`, the base record plus every variant is added.
pub fn bulk_entries(
    repository: &CharacterRepository,
    role: Option<&str>,
    include_variants: bool,
) -> Vec<ComparisonEntry> {
    let mut entries = Vec::new();
    for record in repository.records() {
        if role.is_some_and(|role| record.role.as_deref() != Some(role)) {
            continue;
        }
        let primary = if include_variants {
            DEFAULT_VARIANT
        } else {
            primary_variant(record)
        };
        entries.push(ComparisonEntry::for_record(record, primary));
        if include_variants {
            entries.extend(
                record
                    .variants
                    .keys()
                    .map(|key| ComparisonEntry::for_record(record, key)),
            );
        }
    }
    entries
}
