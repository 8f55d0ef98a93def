pub mod signal;
pub mod context;
pub mod error;
pub mod cfg;

pub mod weights;
pub mod aggregate;
pub mod result;
pub mod resolve;
pub mod engine;

pub use signal::{Gender, SignalSource, Distribution, SignalRecord};
pub use context::InferenceContext;
pub use error::{FusionError, FusionResult, ConfigError};
pub use cfg::{FusionCfg, SourcePriors, ContextFactors, ConfidenceCfg};

pub use weights::{WeightAssignment, assign_weights, adjustment};
pub use aggregate::{Blend, combine, agreement, confidence};
pub use result::{InferenceResult, Contribution, Resolution};
pub use resolve::{resolve, override_candidate};
pub use engine::{InferenceEngine, validate_record};
