use rayon::prelude::*;
use serde::Serialize;

use crate::combat::{calculate, DamageReport};
use crate::compare::{ComparisonEntry, ComparisonSettings};
use crate::data::CharacterRepository;
use crate::parallel::WorkerPool;

#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    /// 1-based position on the board.
    pub rank: usize,
    pub id: String,
    pub character: String,
    pub variant: String,
    pub atk_mod: f64,
    pub def_mod: f64,
    pub color: String,
    pub total_damage: u64,
    /// DPS over the simulated window: the board duration, or one cycle when it is not positive.
    pub dps: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    pub report: Option<DamageReport>,
}

/// Calculate every entry in parallel and rank by total damage, highest first.
/// Ties keep input order; entries whose character cannot be resolved sink to the bottom.
pub fn rank_entries(
    repository: &CharacterRepository,
    entries: &[ComparisonEntry],
    settings: &ComparisonSettings,
    pool: &WorkerPool,
) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = pool.install(|| {
        entries
            .par_iter()
            .map(|entry| {
                let outcome = calculate(repository, &entry.request(settings));
                let (total_damage, dps, error, report) = match outcome {
                    Ok(report) => (report.total_damage, report.dps, None, Some(report)),
                    Err(err) => (0, 0.0, Some(err.to_string()), None),
                };
                RankedEntry {
                    rank: 0,
                    id: entry.id.clone(),
                    character: entry.character.clone(),
                    variant: entry.variant.clone(),
                    atk_mod: entry.atk_mod,
                    def_mod: entry.def_mod,
                    color: entry.color.clone(),
                    total_damage,
                    dps,
                    error,
                    report,
                }
            })
            .collect()
    });

    ranked.sort_by(|left, right| {
        left.error
            .is_some()
            .cmp(&right.error.is_some())
            .then_with(|| right.total_damage.cmp(&left.total_damage))
    });
    for (position, entry) in ranked.iter_mut().enumerate() {
        entry.rank = position + 1;
    }
    ranked
}
