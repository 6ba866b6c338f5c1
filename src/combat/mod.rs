pub mod engine;
pub mod export_csv;
pub mod report;
pub mod resolver;
pub mod schedule;

pub use engine::{
    calculate, serialize_report_json, CalculateError, CalculateOptions, CalculateRequest,
    NORMAL_STATE,
};
pub use export_csv::{hits_to_csv_string, write_hits_csv, ExportError};
pub use report::{DamageReport, HitKind, HitRecord, ReportBuilder};
pub use resolver::{
    resolve, EffectiveStats, ExtraDamage, Resolution, RunContext, RuntimeCounters,
    DEFAULT_BASE_ATK, DEFAULT_TARGET_DEFENSE,
};
pub use schedule::{
    schedule, Event, EventKind, HitEvent, Schedule, ScheduleDiagnostic, SimulationWindow,
    MAX_CYCLES, MAX_DURATION_MS, MAX_EVENTS,
};
