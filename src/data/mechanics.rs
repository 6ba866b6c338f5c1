//! Typed mechanic sections attached to a character record.
//!
//! Every section is optional. An absent section is a no-op for the scheduler
//! and resolver; unknown `state_evolution` tags deserialize to an inert variant
//! instead of failing the whole dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Closed set of mechanic kinds the engine recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MechanicKind {
    SpeedModifier,
    HitOverrides,
    StackingBuff,
    ExtraHits,
    Periodic,
    DefenseMultiplier,
    ConditionalMultiplier,
}

impl MechanicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SpeedModifier => "speed_modifier",
            Self::HitOverrides => "hit_overrides",
            Self::StackingBuff => "stacking_buff",
            Self::ExtraHits => "extra_hits",
            Self::Periodic => "periodic",
            Self::DefenseMultiplier => "defense_multiplier",
            Self::ConditionalMultiplier => "conditional_multiplier",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mechanics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_modifier: Option<SpeedModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_overrides: Option<BTreeMap<u32, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_evolution: Option<StateEvolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_hits: Option<Vec<ExtraHit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub periodic: Option<Periodic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_def_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_multiplier: Option<ConditionalMultiplier>,
}

impl Mechanics {
    /// Section-by-section override: a section present in `overlay` replaces the
    /// whole section of `self`; sections it omits are kept.
    pub fn overlay(&self, overlay: &Mechanics) -> Mechanics {
        Mechanics {
            speed_modifier: overlay.speed_modifier.or(self.speed_modifier),
            hit_overrides: overlay
                .hit_overrides
                .clone()
                .or_else(|| self.hit_overrides.clone()),
            state_evolution: overlay
                .state_evolution
                .clone()
                .or_else(|| self.state_evolution.clone()),
            extra_hits: overlay
                .extra_hits
                .clone()
                .or_else(|| self.extra_hits.clone()),
            periodic: overlay.periodic.clone().or_else(|| self.periodic.clone()),
            target_def_multiplier: overlay.target_def_multiplier.or(self.target_def_multiplier),
            conditional_multiplier: overlay
                .conditional_multiplier
                .clone()
                .or_else(|| self.conditional_multiplier.clone()),
        }
    }

    /// Kinds present on this record, in a fixed order.
    pub fn kinds(&self) -> Vec<MechanicKind> {
        let mut kinds = Vec::new();
        if self.speed_modifier.is_some() {
            kinds.push(MechanicKind::SpeedModifier);
        }
        if self.hit_overrides.is_some() {
            kinds.push(MechanicKind::HitOverrides);
        }
        if self.stacking_buff().is_some() {
            kinds.push(MechanicKind::StackingBuff);
        }
        if self.extra_hits.as_ref().is_some_and(|rules| !rules.is_empty()) {
            kinds.push(MechanicKind::ExtraHits);
        }
        if self.periodic.is_some() {
            kinds.push(MechanicKind::Periodic);
        }
        if self.target_def_multiplier.is_some() {
            kinds.push(MechanicKind::DefenseMultiplier);
        }
        if self.conditional_multiplier.is_some() {
            kinds.push(MechanicKind::ConditionalMultiplier);
        }
        kinds
    }

    /// Scale applied to every pitch element; 1.0 when no speed modifier is set.
    pub fn cycle_time_scale(&self) -> f64 {
        self.speed_modifier
            .map(|modifier| modifier.cycle_time_scale)
            .unwrap_or(1.0)
    }

    /// Replacement motion multiplier for a 1-based hit index. Zero entries are ignored.
    pub fn hit_override(&self, hit_index: u32) -> Option<f64> {
        self.hit_overrides
            .as_ref()?
            .get(&hit_index)
            .copied()
            .filter(|value| *value != 0.0)
    }

    pub fn stacking_buff(&self) -> Option<StackingBuff<'_>> {
        match self.state_evolution.as_ref()? {
            StateEvolution::HitCountBuff(buff) => buff.mode(),
            StateEvolution::Unsupported => None,
        }
    }

    pub fn target_defense_scale(&self) -> f64 {
        self.target_def_multiplier.unwrap_or(1.0)
    }
}

/// Multiplier on cycle *time*: 0.8 shortens every cycle to 80% (faster attacks).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedModifier {
    #[serde(alias = "multiplier")]
    pub cycle_time_scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvolution {
    HitCountBuff(HitCountBuff),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitCountBuff {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Vec<StackThreshold>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub increment_per_stack: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stacks: Option<u32>,
}

impl HitCountBuff {
    /// Threshold mode wins when both fields are authored. A zero increment disables linear mode.
    pub fn mode(&self) -> Option<StackingBuff<'_>> {
        if let Some(thresholds) = self.thresholds.as_deref() {
            return Some(StackingBuff::Threshold(thresholds));
        }
        match self.increment_per_stack {
            Some(increment) if increment != 0.0 => Some(StackingBuff::Linear {
                increment_per_stack: increment,
                max_stacks: self.max_stacks,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackThreshold {
    pub count: u32,
    pub multiplier: f64,
}

/// Active stacking-buff mode, borrowed from the mechanics it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StackingBuff<'a> {
    Threshold(&'a [StackThreshold]),
    Linear {
        increment_per_stack: f64,
        /// `None` means uncapped.
        max_stacks: Option<u32>,
    },
}

impl StackingBuff<'_> {
    /// Returns `(multiplier, stacks)` for the running hit count (which already
    /// includes the current hit). Threshold mode reports zero stacks.
    pub fn multiplier_for(&self, hit_count: u32) -> (f64, u32) {
        match self {
            Self::Threshold(thresholds) => {
                let best = thresholds
                    .iter()
                    .filter(|threshold| hit_count >= threshold.count)
                    .fold(None::<&StackThreshold>, |best, threshold| match best {
                        Some(current) if current.count > threshold.count => Some(current),
                        _ => Some(threshold),
                    });
                (best.map_or(1.0, |threshold| threshold.multiplier), 0)
            }
            Self::Linear {
                increment_per_stack,
                max_stacks,
            } => {
                let earned = hit_count.saturating_sub(1);
                let stacks = max_stacks.map_or(earned, |cap| earned.min(cap));
                (1.0 + f64::from(stacks) * increment_per_stack, stacks)
            }
        }
    }
}

/// Bonus entries a single extra-hit rule may add per triggering hit.
pub const MAX_EXTRA_HIT_REPETITIONS: u32 = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraHit {
    #[serde(default)]
    pub name: String,
    pub multiplier: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hit_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_hit_index: Option<TriggerHitIndex>,
}

impl ExtraHit {
    pub fn fires_on(&self, hit_index: u32) -> bool {
        match &self.trigger_hit_index {
            None => true,
            Some(TriggerHitIndex::Index(index)) => *index == hit_index,
            Some(TriggerHitIndex::Keyword(keyword)) => keyword == "all",
        }
    }

    /// Authored `hit_count`, defaulting to 1 and capped at [`MAX_EXTRA_HIT_REPETITIONS`].
    pub fn repetitions(&self) -> u32 {
        self.hit_count
            .filter(|count| *count > 0)
            .unwrap_or(1)
            .min(MAX_EXTRA_HIT_REPETITIONS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerHitIndex {
    Index(u32),
    Keyword(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Periodic {
    /// Tick interval in milliseconds; non-positive disables the ticks.
    pub interval: f64,
    #[serde(default = "default_periodic_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub name: String,
}

fn default_periodic_multiplier() -> f64 {
    1.0
}

/// Authored conditional bonus. Recognized and reported, but it does not alter damage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalMultiplier {
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}
