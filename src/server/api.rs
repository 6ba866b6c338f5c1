//! Request/response payloads for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::compare::{default_entries, rank_entries, ComparisonEntry, ComparisonSettings, RankedEntry};
use crate::data::{CharacterRepository, MechanicKind};
use crate::parallel::WorkerPool;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub characters: usize,
}

pub fn health(repository: &CharacterRepository) -> HealthResponse {
    HealthResponse {
        status: "ok",
        service: "pitchsim-api",
        version: env!("CARGO_PKG_VERSION"),
        characters: repository.len(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterListItem {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_variant: Option<String>,
    pub variants: Vec<String>,
    pub mechanics: Vec<MechanicKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CharacterListResponse {
    pub characters: Vec<CharacterListItem>,
}

pub fn character_list(repository: &CharacterRepository) -> CharacterListResponse {
    let characters = repository
        .records()
        .iter()
        .map(|record| CharacterListItem {
            id: record.id.clone(),
            name: record.name.clone(),
            role: record.role.clone(),
            default_variant: record.default_variant().map(str::to_string),
            variants: record.variants.keys().cloned().collect(),
            mechanics: record.mechanics.kinds(),
        })
        .collect();
    CharacterListResponse { characters }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeaderboardRequest {
    #[serde(default)]
    pub settings: Option<ComparisonSettings>,
    /// When omitted, every character on its default variant.
    #[serde(default)]
    pub entries: Option<Vec<ComparisonEntry>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardResponse {
    pub settings: ComparisonSettings,
    pub entries: Vec<RankedEntry>,
}

pub fn leaderboard(
    repository: &CharacterRepository,
    request: LeaderboardRequest,
    pool: &WorkerPool,
) -> LeaderboardResponse {
    let settings = request.settings.unwrap_or_default();
    let entries = request
        .entries
        .unwrap_or_else(|| default_entries(repository));
    LeaderboardResponse {
        settings,
        entries: rank_entries(repository, &entries, &settings, pool),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}
