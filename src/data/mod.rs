pub mod character;
pub mod loader;
pub mod mechanics;
pub mod repository;

pub use character::{
    BaseAction, CharacterRecord, MotionMultiplier, Phase, Pitch, ResolvedCharacter, Stats,
    VariantOverlay, DEFAULT_CYCLE_MS,
};
pub use loader::{load_dataset, load_repository, DatasetError, DEFAULT_DATASET_PATH};
pub use mechanics::{
    ConditionalMultiplier, ExtraHit, HitCountBuff, MechanicKind, Mechanics, Periodic,
    SpeedModifier, StackThreshold, StackingBuff, StateEvolution, TriggerHitIndex,
    MAX_EXTRA_HIT_REPETITIONS,
};
pub use repository::{CharacterRepository, RepositoryError};
