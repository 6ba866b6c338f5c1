//! Dataset loading: JSON (`{"characters": [...]}` or a bare array) or YAML with
//! the same shapes. The repository itself does not care where records come from.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::data::character::CharacterRecord;
use crate::data::repository::CharacterRepository;

pub const DEFAULT_DATASET_PATH: &str = "data/grouped_characters.json";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON dataset: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML dataset: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported dataset extension '{0}' (expected .json, .yaml or .yml)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DatasetFile {
    Grouped { characters: Vec<CharacterRecord> },
    Flat(Vec<CharacterRecord>),
}

impl DatasetFile {
    fn into_records(self) -> Vec<CharacterRecord> {
        match self {
            Self::Grouped { characters } => characters,
            Self::Flat(characters) => characters,
        }
    }
}

pub fn parse_dataset_json(raw: &str) -> Result<Vec<CharacterRecord>, DatasetError> {
    let parsed: DatasetFile = serde_json::from_str(raw)?;
    Ok(parsed.into_records())
}

pub fn parse_dataset_yaml(raw: &str) -> Result<Vec<CharacterRecord>, DatasetError> {
    let parsed: DatasetFile = serde_yaml::from_str(raw)?;
    Ok(parsed.into_records())
}

pub fn load_dataset(path: impl AsRef<Path>) -> Result<Vec<CharacterRecord>, DatasetError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match extension.as_str() {
        "json" => parse_dataset_json(&raw),
        "yaml" | "yml" => parse_dataset_yaml(&raw),
        other => Err(DatasetError::UnsupportedFormat(other.to_string())),
    }
}

/// Load a dataset file and index it.
pub fn load_repository(path: impl AsRef<Path>) -> Result<CharacterRepository, DatasetError> {
    let path = path.as_ref();
    let records = load_dataset(path)?;
    info!(path = %path.display(), characters = records.len(), "loaded character dataset");
    Ok(CharacterRepository::from_records(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_accepts_grouped_and_flat_shapes() {
        let grouped = parse_dataset_json(r#"{"characters": [{"name": "a"}, {"name": "b"}]}"#).unwrap();
        let flat = parse_dataset_json(r#"[{"name": "a"}]"#).unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(flat.len(), 1);
    }

    #[test]
    fn yaml_dataset_parses() {
        let records = parse_dataset_yaml(
            "characters:\n  - id: lancer\n    name: Lancer\n    base_action:\n      pitch: [1000, 300, 700]\n",
        )
        .unwrap();
        assert_eq!(records[0].id, "lancer");
        assert_eq!(
            records[0].base_action.pitch.as_ref().map(|p| p.cycle_length()),
            Some(1000.0)
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_dataset("does/not/exist.json").unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
