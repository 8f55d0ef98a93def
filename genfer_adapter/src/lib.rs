//! genfer_adapter
//!
//! Outside-world facing layer for `genfer_core`.
//!
//! Responsibilities:
//! - turn first names, sport categories and photos into `SignalRecord`s
//! - raise context flags the collaborators detect (ambiguous names, suspect teams)
//! - skip inference when a profile states its gender
//! - invoke the core engine, one profile or a batch
//!
//! Non-goals:
//! - no IO (lookup tables and photo models are handed in)
//! - no async
//! - no fusion policy (lives in core)

pub mod adapter;
pub mod pipeline;

pub use adapter::{
    Quality,
    ReliabilityScale,
    Collected,
    NameStats,
    NameTable,
    name_signal,
    SportEntry,
    SportTable,
    sport_signal,
    PhotoRef,
    PhotoEstimate,
    PhotoModel,
    PhotoModelError,
    StubPhotoModel,
    photo_signal,
};

pub use pipeline::{
    Profile,
    ExplicitGender,
    ProfileOutcome,
    ProfileReport,
    CollectedSignals,
    FusionPipeline,
};
