//! Folds resolved events into the damage report.

use serde::{Deserialize, Serialize};

use crate::combat::resolver::Resolution;
use crate::combat::schedule::{Event, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitKind {
    Hit,
    Periodic,
    Extra,
}

impl HitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Periodic => "periodic",
            Self::Extra => "extra",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitRecord {
    /// Seconds from simulation start.
    pub time: f64,
    pub damage: u64,
    #[serde(rename = "type")]
    pub kind: HitKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_index: Option<u32>,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageReport {
    pub character: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub total_damage: u64,
    /// Simulated window in seconds (not the last hit's timestamp).
    pub total_time: f64,
    pub hits: Vec<HitRecord>,
    pub dps: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl DamageReport {
    pub fn hit_count(&self, kind: HitKind) -> usize {
        self.hits.iter().filter(|hit| hit.kind == kind).count()
    }
}

#[derive(Debug, Clone)]
pub struct ReportBuilder {
    character: String,
    variant: Option<String>,
    total_damage: u64,
    hits: Vec<HitRecord>,
    diagnostics: Vec<String>,
}

impl ReportBuilder {
    pub fn new(character: impl Into<String>, variant: Option<String>) -> Self {
        Self {
            character: character.into(),
            variant,
            total_damage: 0,
            hits: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, record: HitRecord) {
        self.total_damage = self.total_damage.saturating_add(record.damage);
        self.hits.push(record);
    }

    /// Append an event's bonus entries, then its own entry when it dealt damage.
    pub fn record(&mut self, event: &Event<'_>, resolution: Resolution) {
        let time = event.time_ms / 1000.0;
        for extra in resolution.extras {
            self.push(HitRecord {
                time,
                damage: extra.damage,
                kind: HitKind::Extra,
                hit_index: None,
                note: extra.note,
            });
        }
        if resolution.damage > 0 {
            let kind = match event.kind {
                EventKind::Hit(_) => HitKind::Hit,
                EventKind::Periodic(_) => HitKind::Periodic,
            };
            self.push(HitRecord {
                time,
                damage: resolution.damage,
                kind,
                hit_index: event.hit_index(),
                note: resolution.note,
            });
        }
    }

    pub fn diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics.push(message.into());
    }

    pub fn finish(self, total_time: f64) -> DamageReport {
        let dps = if total_time > 0.0 {
            self.total_damage as f64 / total_time
        } else {
            0.0
        };
        DamageReport {
            character: self.character,
            variant: self.variant,
            total_damage: self.total_damage,
            total_time,
            hits: self.hits,
            dps,
            diagnostics: self.diagnostics,
        }
    }
}
