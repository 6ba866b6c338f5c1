//! Calculation entry point: resolve character and variant, build the timeline,
//! resolve every event in time order, and aggregate the report.
//!
//! A calculation is a pure function of the repository snapshot and the
//! request. It owns its resolved character and run context and mutates
//! nothing else, so concurrent calls over a shared repository are independent.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::combat::report::{DamageReport, ReportBuilder};
use crate::combat::resolver::{resolve, RunContext, DEFAULT_BASE_ATK, DEFAULT_TARGET_DEFENSE};
use crate::combat::schedule::{schedule, SimulationWindow};
use crate::data::repository::{CharacterRepository, RepositoryError};

pub const NORMAL_STATE: &str = "normal";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculateError {
    #[error(transparent)]
    NotFound(#[from] RepositoryError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculateOptions {
    #[serde(default, alias = "baseAtk", skip_serializing_if = "Option::is_none")]
    pub base_atk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, alias = "durationMs", skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    /// Seconds; `duration_ms` wins when both are set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

impl CalculateOptions {
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_base_atk(mut self, base_atk: f64) -> Self {
        self.base_atk = Some(base_atk);
        self
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = Some(variant.into());
        self
    }

    /// Explicit duration in milliseconds, if one was requested.
    pub fn explicit_duration_ms(&self) -> Option<f64> {
        positive(self.duration_ms).or_else(|| positive(self.duration).map(|seconds| seconds * 1000.0))
    }

    pub fn effective_base_atk(&self) -> f64 {
        positive(self.base_atk).unwrap_or(DEFAULT_BASE_ATK)
    }

    /// Explicit variant, else the state when it is not `normal`.
    pub fn variant_key<'a>(&'a self, state: &'a str) -> Option<&'a str> {
        self.variant
            .as_deref()
            .filter(|variant| !variant.is_empty())
            .or_else(|| (state != NORMAL_STATE && !state.is_empty()).then_some(state))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculateRequest {
    pub character: String,
    #[serde(default = "default_state")]
    pub state: String,
    #[serde(default = "default_target_defense", alias = "targetDefense")]
    pub target_defense: f64,
    #[serde(default)]
    pub options: CalculateOptions,
}

fn default_state() -> String {
    NORMAL_STATE.to_string()
}

fn default_target_defense() -> f64 {
    DEFAULT_TARGET_DEFENSE
}

impl CalculateRequest {
    pub fn new(character: impl Into<String>) -> Self {
        Self {
            character: character.into(),
            state: default_state(),
            target_defense: DEFAULT_TARGET_DEFENSE,
            options: CalculateOptions::default(),
        }
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn target_defense(mut self, target_defense: f64) -> Self {
        self.target_defense = target_defense;
        self
    }

    pub fn options(mut self, options: CalculateOptions) -> Self {
        self.options = options;
        self
    }
}

pub fn calculate(
    repository: &CharacterRepository,
    request: &CalculateRequest,
) -> Result<DamageReport, CalculateError> {
    let record = repository.resolve(&request.character)?;
    let variant_key = request.options.variant_key(&request.state);
    let character = CharacterRepository::resolve_variant(record, variant_key);
    let mechanics = &character.mechanics;

    let window = match request.options.explicit_duration_ms() {
        Some(duration_ms) => SimulationWindow::duration_ms(duration_ms),
        None => SimulationWindow::single_cycle(&character, mechanics),
    };

    let timeline = schedule(&character, mechanics, window);
    debug!(
        character = %character.name,
        variant = ?character.variant,
        window_ms = window.limit_ms,
        events = timeline.events.len(),
        "calculating damage"
    );

    let mut context = RunContext::new(
        &character,
        &request.state,
        request.options.effective_base_atk(),
        request.target_defense,
    );
    let mut report = ReportBuilder::new(character.name.clone(), character.variant.clone());
    for diagnostic in &timeline.diagnostics {
        report.diagnostic(diagnostic.to_string());
    }
    for event in &timeline.events {
        let resolution = resolve(event, &mut context);
        report.record(event, resolution);
    }

    Ok(report.finish(window.limit_ms / 1000.0))
}

pub fn serialize_report_json(report: &DamageReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
