//! Per-event damage resolution.
//!
//! Hits compose, in order: the base motion multiplier (phase override or the
//! character's own), a hit override that replaces it outright, and the
//! stacking-buff multiplier on top. Damage is
//! `max(1, floor(base_atk × attack_multiplier × multiplier − effective_defense))`.
//! Extra-hit rules fire after the main hit and produce their own entries.

use crate::combat::schedule::{Event, EventKind, HitEvent};
use crate::data::character::{MotionMultiplier, ResolvedCharacter};
use crate::data::mechanics::{ExtraHit, Mechanics, Periodic, StackingBuff};

pub const DEFAULT_BASE_ATK: f64 = 1000.0;
pub const DEFAULT_TARGET_DEFENSE: f64 = 200.0;

/// Stat snapshot taken once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveStats {
    pub base_atk: f64,
    /// `attack_multiplier × attack_scaling_factor`.
    pub attack_multiplier: f64,
    pub defense_multiplier: f64,
    pub motion_multiplier: MotionMultiplier,
    pub target_defense: f64,
    /// `target_defense × target_def_multiplier`.
    pub effective_defense: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RuntimeCounters {
    pub hit_count: u32,
    pub elapsed_ms: f64,
}

/// Mutable state owned by a single calculation.
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub character: &'a ResolvedCharacter,
    pub state: &'a str,
    pub stats: EffectiveStats,
    pub runtime: RuntimeCounters,
}

impl<'a> RunContext<'a> {
    pub fn new(character: &'a ResolvedCharacter, state: &'a str, base_atk: f64, target_defense: f64) -> Self {
        let stats = EffectiveStats {
            base_atk,
            attack_multiplier: character.stats.composed_attack_multiplier(),
            defense_multiplier: character.stats.defense_multiplier(),
            motion_multiplier: character.base_action.motion_multiplier(),
            target_defense,
            effective_defense: target_defense * character.mechanics.target_defense_scale(),
        };
        Self {
            character,
            state,
            stats,
            runtime: RuntimeCounters::default(),
        }
    }

    pub fn mechanics(&self) -> &'a Mechanics {
        &self.character.mechanics
    }

    /// Floored damage for a multiplier against the cached effective defense; never below 1.
    pub fn damage_for(&self, multiplier: f64) -> u64 {
        let raw = (self.stats.base_atk * self.stats.attack_multiplier * multiplier
            - self.stats.effective_defense)
            .floor();
        if raw >= 1.0 {
            raw as u64
        } else {
            1
        }
    }
}

/// One bonus-hit entry produced by an extra-hit rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraDamage {
    pub damage: u64,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub damage: u64,
    pub note: String,
    /// Bonus entries, logged ahead of the event's own entry.
    pub extras: Vec<ExtraDamage>,
}

pub fn resolve(event: &Event<'_>, context: &mut RunContext<'_>) -> Resolution {
    context.runtime.elapsed_ms = event.time_ms;
    match &event.kind {
        EventKind::Hit(hit) => resolve_hit(hit, context),
        EventKind::Periodic(periodic) => resolve_periodic(periodic, context),
    }
}

fn resolve_hit(hit: &HitEvent<'_>, context: &mut RunContext<'_>) -> Resolution {
    context.runtime.hit_count += 1;
    let mechanics = context.mechanics();
    let mut note = String::new();

    let mut multiplier = match mechanics.hit_override(hit.hit_index) {
        Some(value) => {
            note.push_str(&format!("(Hit {} Override)", hit.hit_index));
            value
        }
        None => hit
            .phase
            .and_then(|phase| phase.motion_multiplier.as_ref())
            .unwrap_or(&context.stats.motion_multiplier)
            .for_hit(hit.hit_index),
    };

    if let Some(buff) = mechanics.stacking_buff() {
        let (stack_multiplier, stacks) = buff.multiplier_for(context.runtime.hit_count);
        if matches!(buff, StackingBuff::Linear { .. }) && stacks > 0 {
            note.push_str(&format!(" (Stack x{stack_multiplier:.2})"));
        }
        multiplier *= stack_multiplier;
    }

    let damage = context.damage_for(multiplier);

    let mut extras = Vec::new();
    for rule in mechanics.extra_hits.as_deref().unwrap_or_default() {
        if rule.fires_on(hit.hit_index) {
            push_extra_hits(rule, context, &mut extras, &mut note);
        }
    }

    Resolution {
        damage,
        note,
        extras,
    }
}

fn push_extra_hits(rule: &ExtraHit, context: &RunContext<'_>, extras: &mut Vec<ExtraDamage>, note: &mut String) {
    let repetitions = rule.repetitions();
    let damage = context.damage_for(rule.multiplier);
    for k in 1..=repetitions {
        let entry_note = if repetitions > 1 {
            format!("{} ({k}/{repetitions})", rule.name)
        } else {
            rule.name.clone()
        };
        extras.push(ExtraDamage {
            damage,
            note: entry_note,
        });
    }
    if repetitions > 1 {
        note.push_str(&format!(" + {}(x{repetitions})", rule.name));
    } else {
        note.push_str(&format!(" + {}", rule.name));
    }
}

fn resolve_periodic(periodic: &Periodic, context: &RunContext<'_>) -> Resolution {
    Resolution {
        damage: context.damage_for(periodic.multiplier),
        note: periodic.name.clone(),
        extras: Vec::new(),
    }
}
