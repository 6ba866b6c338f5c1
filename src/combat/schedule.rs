//! Event timeline generation from a character's pitch schedule.
//!
//! A virtual clock walks cycle by cycle. Each cycle emits one hit per pitch
//! offset that lies inside the cycle and inside the simulated window. Phased
//! schedules advance after their repeat count and stop once exhausted.
//! Periodic ticks are generated independently and merged with a stable sort,
//! so events sharing a timestamp keep their generation order (main-schedule
//! hits before ticks).
//!
//! Generation is bounded: explicit windows are clamped to [`MAX_DURATION_MS`],
//! a run stops after [`MAX_CYCLES`] cycles or [`MAX_EVENTS`] events, and a
//! cycle too short to move the clock ends the run. Each cut is reported as a
//! [`ScheduleDiagnostic`] alongside the partial timeline.

use std::fmt;

use tracing::warn;

use crate::data::character::{Phase, Pitch, ResolvedCharacter};
use crate::data::mechanics::{Mechanics, Periodic};

/// Longest window a calculation may request: one simulated hour.
pub const MAX_DURATION_MS: f64 = 3_600_000.0;
/// Upper bound on cycles walked by one run.
pub const MAX_CYCLES: u64 = 250_000;
/// Upper bound on hit plus periodic events in one timeline.
pub const MAX_EVENTS: usize = 250_000;

/// Simulated time window for one calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationWindow {
    pub limit_ms: f64,
    /// Run exactly one cycle regardless of `limit_ms`.
    pub single_cycle: bool,
    /// Requested window when it exceeded [`MAX_DURATION_MS`].
    pub clamped_from_ms: Option<f64>,
}

impl SimulationWindow {
    pub fn duration_ms(requested_ms: f64) -> Self {
        let clamped = requested_ms > MAX_DURATION_MS;
        Self {
            limit_ms: requested_ms.min(MAX_DURATION_MS),
            single_cycle: false,
            clamped_from_ms: clamped.then_some(requested_ms),
        }
    }

    /// One combo loop: the window is the first effective cycle length.
    pub fn single_cycle(character: &ResolvedCharacter, mechanics: &Mechanics) -> Self {
        Self {
            limit_ms: first_cycle_pitch(character, mechanics).cycle_length(),
            single_cycle: true,
            clamped_from_ms: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitEvent<'a> {
    /// 1-based position of the offset in its pitch.
    pub hit_index: u32,
    pub cycle_start_ms: f64,
    pub cycle: u64,
    pub phase: Option<&'a Phase>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind<'a> {
    Hit(HitEvent<'a>),
    Periodic(&'a Periodic),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event<'a> {
    pub time_ms: f64,
    pub kind: EventKind<'a>,
}

impl Event<'_> {
    pub fn hit_index(&self) -> Option<u32> {
        match &self.kind {
            EventKind::Hit(hit) => Some(hit.hit_index),
            EventKind::Periodic(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleDiagnostic {
    /// Cycle length <= 0; generation stopped at this cycle.
    MalformedCycle {
        cycle: u64,
        phase: Option<usize>,
        cycle_length: f64,
    },
    DurationClamped {
        requested_ms: f64,
        limit_ms: f64,
    },
    CycleLimit {
        cycles: u64,
        at_ms: f64,
    },
    EventLimit {
        events: usize,
        at_ms: f64,
    },
    /// Adding the cycle length no longer advances the clock.
    StalledClock {
        cycle: u64,
        at_ms: f64,
        cycle_length: f64,
    },
}

impl fmt::Display for ScheduleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedCycle {
                cycle,
                phase: Some(phase),
                cycle_length,
            } => write!(
                f,
                "cycle length {cycle_length} ms in phase {phase} (cycle {cycle}) is not positive; schedule aborted"
            ),
            Self::MalformedCycle {
                cycle,
                phase: None,
                cycle_length,
            } => write!(
                f,
                "cycle length {cycle_length} ms (cycle {cycle}) is not positive; schedule aborted"
            ),
            Self::DurationClamped {
                requested_ms,
                limit_ms,
            } => write!(
                f,
                "requested duration {requested_ms} ms exceeds the {limit_ms} ms limit; window clamped"
            ),
            Self::CycleLimit { cycles, at_ms } => write!(
                f,
                "cycle limit of {cycles} reached at {at_ms} ms; schedule truncated"
            ),
            Self::EventLimit { events, at_ms } => write!(
                f,
                "event limit of {events} reached at {at_ms} ms; schedule truncated"
            ),
            Self::StalledClock {
                cycle,
                at_ms,
                cycle_length,
            } => write!(
                f,
                "cycle length {cycle_length} ms no longer advances the clock at {at_ms} ms (cycle {cycle}); schedule truncated"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule<'a> {
    pub events: Vec<Event<'a>>,
    pub diagnostics: Vec<ScheduleDiagnostic>,
}

/// Pitch of the first cycle: first non-exhausted phase, else the static pitch.
fn first_cycle_pitch(character: &ResolvedCharacter, mechanics: &Mechanics) -> Pitch {
    let scale = mechanics.cycle_time_scale();
    match character.base_action.phases() {
        Some(phases) => PhaseCursor::new(phases)
            .current()
            .map(|(_, phase)| phase.pitch.scaled(scale))
            .unwrap_or_else(|| phases[0].pitch.scaled(scale)),
        None => character.base_action.static_pitch().scaled(scale),
    }
}

/// Walks a phase list, skipping phases whose repeat count is already spent.
struct PhaseCursor<'a> {
    phases: &'a [Phase],
    index: usize,
    cycles_in_phase: u64,
}

impl<'a> PhaseCursor<'a> {
    fn new(phases: &'a [Phase]) -> Self {
        Self {
            phases,
            index: 0,
            cycles_in_phase: 0,
        }
    }

    fn current(&mut self) -> Option<(usize, &'a Phase)> {
        while let Some(phase) = self.phases.get(self.index) {
            match phase.repeat_limit() {
                Some(limit) if self.cycles_in_phase >= limit => {
                    self.index += 1;
                    self.cycles_in_phase = 0;
                }
                _ => return Some((self.index, phase)),
            }
        }
        None
    }

    fn complete_cycle(&mut self) {
        self.cycles_in_phase += 1;
    }
}

pub fn schedule<'a>(
    character: &'a ResolvedCharacter,
    mechanics: &'a Mechanics,
    window: SimulationWindow,
) -> Schedule<'a> {
    let mut schedule = Schedule::default();
    if let Some(requested_ms) = window.clamped_from_ms {
        schedule.diagnostics.push(ScheduleDiagnostic::DurationClamped {
            requested_ms,
            limit_ms: window.limit_ms,
        });
    }
    schedule_hits(character, mechanics, window, &mut schedule);
    schedule_periodic(mechanics, window, &mut schedule);
    schedule
        .events
        .sort_by(|left, right| left.time_ms.total_cmp(&right.time_ms));
    schedule
}

fn schedule_hits<'a>(
    character: &'a ResolvedCharacter,
    mechanics: &Mechanics,
    window: SimulationWindow,
    schedule: &mut Schedule<'a>,
) {
    let scale = mechanics.cycle_time_scale();
    let static_pitch = character.base_action.static_pitch().scaled(scale);
    let mut phases = character.base_action.phases().map(PhaseCursor::new);

    let mut t = 0.0_f64;
    let mut cycle = 0_u64;
    while t < window.limit_ms || (window.single_cycle && cycle == 0) {
        if cycle >= MAX_CYCLES {
            truncate(
                character,
                schedule,
                ScheduleDiagnostic::CycleLimit {
                    cycles: MAX_CYCLES,
                    at_ms: t,
                },
            );
            return;
        }
        let (pitch, phase) = match phases.as_mut() {
            Some(cursor) => match cursor.current() {
                Some((index, phase)) => (phase.pitch.scaled(scale), Some((index, phase))),
                None => break,
            },
            None => (static_pitch.clone(), None),
        };

        let cycle_length = pitch.cycle_length();
        if !(cycle_length > 0.0) {
            let diagnostic = ScheduleDiagnostic::MalformedCycle {
                cycle,
                phase: phase.map(|(index, _)| index),
                cycle_length,
            };
            warn!(character = %character.name, %diagnostic, "malformed schedule");
            schedule.diagnostics.push(diagnostic);
            break;
        }

        for (hit_index, offset) in pitch.offsets() {
            if offset > cycle_length {
                continue;
            }
            let time_ms = t + offset;
            if time_ms <= window.limit_ms {
                if schedule.events.len() >= MAX_EVENTS {
                    truncate(
                        character,
                        schedule,
                        ScheduleDiagnostic::EventLimit {
                            events: MAX_EVENTS,
                            at_ms: time_ms,
                        },
                    );
                    return;
                }
                schedule.events.push(Event {
                    time_ms,
                    kind: EventKind::Hit(HitEvent {
                        hit_index,
                        cycle_start_ms: t,
                        cycle,
                        phase: phase.map(|(_, phase)| phase),
                    }),
                });
            }
        }

        let next = t + cycle_length;
        if next <= t {
            truncate(
                character,
                schedule,
                ScheduleDiagnostic::StalledClock {
                    cycle,
                    at_ms: t,
                    cycle_length,
                },
            );
            return;
        }
        t = next;
        cycle += 1;
        if let Some(cursor) = phases.as_mut() {
            cursor.complete_cycle();
        }
        if window.single_cycle {
            break;
        }
    }
}

fn truncate(character: &ResolvedCharacter, schedule: &mut Schedule<'_>, diagnostic: ScheduleDiagnostic) {
    warn!(character = %character.name, %diagnostic, "schedule truncated");
    schedule.diagnostics.push(diagnostic);
}

fn schedule_periodic<'a>(mechanics: &'a Mechanics, window: SimulationWindow, schedule: &mut Schedule<'a>) {
    let Some(periodic) = mechanics.periodic.as_ref() else {
        return;
    };
    if !(periodic.interval > 0.0) {
        return;
    }
    let mut tick = 1_u64;
    loop {
        let time_ms = periodic.interval * tick as f64;
        if time_ms > window.limit_ms {
            break;
        }
        if schedule.events.len() >= MAX_EVENTS {
            let reported = schedule
                .diagnostics
                .iter()
                .any(|diagnostic| matches!(diagnostic, ScheduleDiagnostic::EventLimit { .. }));
            if !reported {
                warn!(interval = periodic.interval, "periodic ticks truncated at event limit");
                schedule.diagnostics.push(ScheduleDiagnostic::EventLimit {
                    events: MAX_EVENTS,
                    at_ms: time_ms,
                });
            }
            break;
        }
        schedule.events.push(Event {
            time_ms,
            kind: EventKind::Periodic(periodic),
        });
        tick += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::character::{BaseAction, CharacterRecord};

    fn character(base_action: BaseAction, mechanics: Mechanics) -> ResolvedCharacter {
        ResolvedCharacter::from_record(&CharacterRecord {
            id: "test".to_string(),
            name: "Test".to_string(),
            base_action,
            mechanics,
            ..CharacterRecord::default()
        })
    }

    fn pitch_action(pitch: &[f64]) -> BaseAction {
        BaseAction {
            pitch: Some(Pitch(pitch.to_vec())),
            ..BaseAction::default()
        }
    }

    fn phase(pitch: &[f64], repeat: i64) -> Phase {
        Phase {
            name: None,
            pitch: Pitch(pitch.to_vec()),
            motion_multiplier: None,
            repeat: Some(repeat),
        }
    }

    fn hit_times(schedule: &Schedule<'_>) -> Vec<f64> {
        schedule
            .events
            .iter()
            .filter(|event| matches!(event.kind, EventKind::Hit(_)))
            .map(|event| event.time_ms)
            .collect()
    }

    #[test]
    fn flat_pitch_repeats_every_cycle() {
        let c = character(pitch_action(&[1000.0, 300.0, 700.0]), Mechanics::default());
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(3000.0));
        assert_eq!(
            hit_times(&s),
            vec![300.0, 700.0, 1300.0, 1700.0, 2300.0, 2700.0]
        );
        assert!(s.diagnostics.is_empty());
    }

    #[test]
    fn offsets_past_cycle_end_are_skipped() {
        let c = character(pitch_action(&[1000.0, 400.0, 1200.0, 900.0]), Mechanics::default());
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(1000.0));
        let indices: Vec<_> = s.events.iter().filter_map(Event::hit_index).collect();
        assert_eq!(indices, vec![1, 3]);
    }

    #[test]
    fn hits_past_window_are_not_emitted() {
        let c = character(pitch_action(&[1000.0, 300.0, 700.0]), Mechanics::default());
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(1500.0));
        assert_eq!(hit_times(&s), vec![300.0, 700.0, 1300.0]);
    }

    #[test]
    fn missing_pitch_defaults_to_one_second_cycle_with_no_hits() {
        let c = character(BaseAction::default(), Mechanics::default());
        let window = SimulationWindow::single_cycle(&c, &c.mechanics);
        assert_eq!(window.limit_ms, 1000.0);
        let s = schedule(&c, &c.mechanics, window);
        assert!(s.events.is_empty());
        assert!(s.diagnostics.is_empty());
    }

    #[test]
    fn single_cycle_window_emits_one_loop() {
        let c = character(pitch_action(&[800.0, 200.0, 800.0]), Mechanics::default());
        let window = SimulationWindow::single_cycle(&c, &c.mechanics);
        let s = schedule(&c, &c.mechanics, window);
        assert_eq!(hit_times(&s), vec![200.0, 800.0]);
    }

    #[test]
    fn zero_cycle_length_aborts_with_diagnostic() {
        let c = character(pitch_action(&[0.0, 100.0]), Mechanics::default());
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(3000.0));
        assert!(s.events.is_empty());
        assert_eq!(
            s.diagnostics,
            vec![ScheduleDiagnostic::MalformedCycle {
                cycle: 0,
                phase: None,
                cycle_length: 0.0
            }]
        );

        let window = SimulationWindow::single_cycle(&c, &c.mechanics);
        let s = schedule(&c, &c.mechanics, window);
        assert_eq!(s.diagnostics.len(), 1);
    }

    #[test]
    fn speed_modifier_scales_offsets_and_cycle() {
        let mechanics: Mechanics =
            serde_json::from_str(r#"{"speed_modifier": {"multiplier": 0.5}}"#).unwrap();
        let c = character(pitch_action(&[1000.0, 400.0]), mechanics);
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(1000.0));
        assert_eq!(hit_times(&s), vec![200.0, 700.0]);
    }

    #[test]
    fn phases_advance_after_repeat_and_stop_when_exhausted() {
        let action = BaseAction {
            phases: Some(vec![phase(&[500.0, 100.0], 2), phase(&[1000.0, 600.0], 1)]),
            ..BaseAction::default()
        };
        let c = character(action, Mechanics::default());
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(10_000.0));
        assert_eq!(hit_times(&s), vec![100.0, 600.0, 1600.0]);
        let phases: Vec<_> = s
            .events
            .iter()
            .map(|event| match event.kind {
                EventKind::Hit(hit) => hit.phase.map(|p| p.pitch.cycle_length()),
                EventKind::Periodic(_) => None,
            })
            .collect();
        assert_eq!(phases, vec![Some(500.0), Some(500.0), Some(1000.0)]);
    }

    #[test]
    fn infinite_phase_runs_to_window_end() {
        let action = BaseAction {
            phases: Some(vec![phase(&[500.0, 100.0], 1), phase(&[500.0, 250.0], -1)]),
            ..BaseAction::default()
        };
        let c = character(action, Mechanics::default());
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(2000.0));
        assert_eq!(hit_times(&s), vec![100.0, 750.0, 1250.0, 1750.0]);
    }

    #[test]
    fn exhausted_phase_list_yields_no_hits() {
        let action = BaseAction {
            phases: Some(vec![phase(&[500.0, 100.0], 0), phase(&[500.0, 200.0], 0)]),
            ..BaseAction::default()
        };
        let c = character(action, Mechanics::default());
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(2000.0));
        assert!(s.events.is_empty());
    }

    #[test]
    fn periodic_ticks_include_window_end() {
        let mechanics: Mechanics =
            serde_json::from_str(r#"{"periodic": {"interval": 500, "multiplier": 0.4, "name": "drone"}}"#)
                .unwrap();
        let c = character(pitch_action(&[1000.0, 500.0]), mechanics);
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(2000.0));
        let ticks: Vec<_> = s
            .events
            .iter()
            .filter(|event| matches!(event.kind, EventKind::Periodic(_)))
            .map(|event| event.time_ms)
            .collect();
        assert_eq!(ticks, vec![500.0, 1000.0, 1500.0, 2000.0]);

        // Equal timestamps keep generation order: the hit at 500 precedes the tick at 500.
        assert!(matches!(s.events[0].kind, EventKind::Hit(_)));
        assert!(matches!(s.events[1].kind, EventKind::Periodic(_)));
    }

    #[test]
    fn speed_modifier_scales_phase_pitches() {
        let mechanics: Mechanics =
            serde_json::from_str(r#"{"speed_modifier": {"multiplier": 0.5}}"#).unwrap();
        let action = BaseAction {
            phases: Some(vec![phase(&[500.0, 100.0], 1), phase(&[1000.0, 400.0], -1)]),
            ..BaseAction::default()
        };
        let c = character(action, mechanics);
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(1000.0));
        assert_eq!(hit_times(&s), vec![50.0, 450.0, 950.0]);

        let window = SimulationWindow::single_cycle(&c, &c.mechanics);
        assert_eq!(window.limit_ms, 250.0);
        assert_eq!(hit_times(&schedule(&c, &c.mechanics, window)), vec![50.0]);
    }

    #[test]
    fn oversized_duration_is_clamped() {
        let c = character(pitch_action(&[1000.0]), Mechanics::default());
        let window = SimulationWindow::duration_ms(1.0e18);
        assert_eq!(window.limit_ms, MAX_DURATION_MS);
        let s = schedule(&c, &c.mechanics, window);
        assert!(s.events.is_empty());
        assert_eq!(
            s.diagnostics,
            vec![ScheduleDiagnostic::DurationClamped {
                requested_ms: 1.0e18,
                limit_ms: MAX_DURATION_MS
            }]
        );
        assert_eq!(SimulationWindow::duration_ms(3000.0).clamped_from_ms, None);
    }

    #[test]
    fn cycle_limit_stops_empty_cycles() {
        let c = character(pitch_action(&[10.0]), Mechanics::default());
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(MAX_DURATION_MS));
        assert!(s.events.is_empty());
        assert_eq!(
            s.diagnostics,
            vec![ScheduleDiagnostic::CycleLimit {
                cycles: MAX_CYCLES,
                at_ms: 2_500_000.0
            }]
        );
    }

    #[test]
    fn event_limit_truncates_dense_schedules() {
        let c = character(pitch_action(&[10.0, 3.0, 7.0]), Mechanics::default());
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(MAX_DURATION_MS));
        assert_eq!(s.events.len(), MAX_EVENTS);
        assert_eq!(
            s.diagnostics,
            vec![ScheduleDiagnostic::EventLimit {
                events: MAX_EVENTS,
                at_ms: 1_250_003.0
            }]
        );
    }

    #[test]
    fn periodic_ticks_stop_at_event_limit() {
        let mechanics: Mechanics =
            serde_json::from_str(r#"{"periodic": {"interval": 1, "name": "swarm"}}"#).unwrap();
        let c = character(pitch_action(&[1000.0]), mechanics);
        let s = schedule(&c, &c.mechanics, SimulationWindow::duration_ms(MAX_DURATION_MS));
        assert_eq!(s.events.len(), MAX_EVENTS);
        assert_eq!(s.diagnostics.len(), 1);
        assert!(matches!(s.diagnostics[0], ScheduleDiagnostic::EventLimit { .. }));
    }

    #[test]
    fn cycle_that_cannot_advance_clock_ends_run() {
        let action = BaseAction {
            phases: Some(vec![phase(&[1.0e17], 1), phase(&[1.0, 0.5], -1)]),
            ..BaseAction::default()
        };
        let c = character(action, Mechanics::default());
        let window = SimulationWindow {
            limit_ms: f64::MAX,
            single_cycle: false,
            clamped_from_ms: None,
        };
        let s = schedule(&c, &c.mechanics, window);
        assert_eq!(
            s.diagnostics,
            vec![ScheduleDiagnostic::StalledClock {
                cycle: 1,
                at_ms: 1.0e17,
                cycle_length: 1.0
            }]
        );
        assert_eq!(s.events.len(), 1);
    }
}
