//! Read-only character repository: exact lookup by id/name/alt-name, with a
//! substring fallback on names, and variant resolution.
//!
//! Built once at startup and shared behind `Arc` by the server and the
//! comparison board; calculations only ever borrow it.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::data::character::{CharacterRecord, ResolvedCharacter};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Character '{key}' not found.")]
    NotFound { key: String },
}

#[derive(Debug, Clone, Default)]
pub struct CharacterRepository {
    /// Records in registration order.
    records: Vec<CharacterRecord>,
    /// Exact lookup key -> position in `records`.
    index: HashMap<String, usize>,
}

impl CharacterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = CharacterRecord>,
    {
        let mut repository = Self::new();
        repository.register(records);
        repository
    }

    /// Index each record under its name, id and alt names. A later record
    /// claiming an existing key takes it over.
    pub fn register<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = CharacterRecord>,
    {
        for record in records {
            let slot = self.records.len();
            self.index.insert(record.name.clone(), slot);
            if !record.id.is_empty() {
                self.index.insert(record.id.clone(), slot);
            }
            for alt in &record.alt_names {
                self.index.insert(alt.clone(), slot);
            }
            self.records.push(record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CharacterRecord] {
        &self.records
    }

    pub fn resolve(&self, key: &str) -> Result<&CharacterRecord, RepositoryError> {
        if let Some(&slot) = self.index.get(key) {
            return Ok(&self.records[slot]);
        }
        let fallback = self.records.iter().find(|record| record.name.contains(key));
        if let Some(record) = fallback {
            debug!(key, matched = %record.name, "resolved character by name substring");
        }
        fallback.ok_or_else(|| RepositoryError::NotFound {
            key: key.to_string(),
        })
    }

    /// Apply `variant_key` to `record`. An absent or unknown key yields the base record.
    pub fn resolve_variant(record: &CharacterRecord, variant_key: Option<&str>) -> ResolvedCharacter {
        match variant_key.and_then(|key| record.variant(key).map(|overlay| (key, overlay))) {
            Some((key, overlay)) => ResolvedCharacter::with_variant(record, key, overlay),
            None => ResolvedCharacter::from_record(record),
        }
    }
}
