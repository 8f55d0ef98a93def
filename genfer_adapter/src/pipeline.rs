//! Profile pipeline.
//!
//! The outside-world facing layer around `genfer_core`:
//! - respects an explicit gender instead of inferring one
//! - runs the name, sport and photo collaborators
//! - merges their context flags with the profile's own
//! - calls the core engine
//!
//! No IO. No async. Batch runs are sequential and return reports sorted by profile id.

use genfer_core::{FusionResult, InferenceContext, InferenceEngine, InferenceResult, SignalRecord};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::adapter::{
    name_signal, photo_signal, sport_signal, NameTable, PhotoModel, PhotoRef, ReliabilityScale, SportTable,
};

/// One person to run inference for.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub id: String,
    pub first_name: Option<String>,
    pub sport_category: Option<String>,
    pub photo: Option<PhotoRef>,
    /// Gender as stated by the person, if any. When set, nothing is inferred.
    pub gender: Option<String>,
    pub group_photo: bool,
    pub low_quality_photo: bool,
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_first_name(mut self, name: impl Into<String>) -> Self {
        self.first_name = Some(name.into());
        self
    }

    pub fn with_sport_category(mut self, category: impl Into<String>) -> Self {
        self.sport_category = Some(category.into());
        self
    }

    pub fn with_photo(mut self, photo: impl Into<String>) -> Self {
        self.photo = Some(PhotoRef::new(photo));
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = Some(gender.into());
        self
    }

    fn context(&self) -> InferenceContext {
        InferenceContext {
            group_photo: self.group_photo,
            low_quality_photo: self.low_quality_photo,
            ..Default::default()
        }
    }
}

/// A gender the person stated themselves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplicitGender {
    Male,
    Female,
    /// Any other self-description (e.g. non-binary), kept verbatim.
    Other(String),
}

impl ExplicitGender {
    /// `male`/`m` and `female`/`f` (any case); other non-empty values pass through.
    pub fn parse(raw: &str) -> Option<Self> {
        let v = raw.trim();
        if v.is_empty() {
            return None;
        }
        match v.to_ascii_lowercase().as_str() {
            "male" | "m" => Some(ExplicitGender::Male),
            "female" | "f" => Some(ExplicitGender::Female),
            _ => Some(ExplicitGender::Other(v.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileOutcome {
    /// Inference skipped; the stated gender stands.
    Explicit(ExplicitGender),
    Inferred(InferenceResult),
}

/// Per-profile entry of a batch run.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileReport {
    pub id: String,
    pub outcome: FusionResult<ProfileOutcome>,
}

/// The three records a profile produced, plus the merged context.
#[derive(Clone, Debug, PartialEq)]
pub struct CollectedSignals {
    pub name: SignalRecord,
    pub sport: SignalRecord,
    pub photo: SignalRecord,
    pub context: InferenceContext,
}

/// Collaborators wired to one engine.
pub struct FusionPipeline<M> {
    engine: InferenceEngine,
    names: NameTable,
    sports: SportTable,
    photo_model: M,
    scale: ReliabilityScale,
}

impl<M: PhotoModel> FusionPipeline<M> {
    pub fn new(engine: InferenceEngine, names: NameTable, sports: SportTable, photo_model: M) -> Self {
        Self {
            engine,
            names,
            sports,
            photo_model,
            scale: ReliabilityScale::default(),
        }
    }

    pub fn with_reliability_scale(mut self, scale: ReliabilityScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Run the collaborators without fusing. Useful for "why" tooling.
    pub fn collect(&self, profile: &Profile) -> CollectedSignals {
        let name = name_signal(&self.names, profile.first_name.as_deref(), &self.scale);
        let sport = sport_signal(&self.sports, profile.sport_category.as_deref(), &self.scale);
        let photo = photo_signal(&self.photo_model, profile.photo.as_ref(), &self.scale);

        let context = profile
            .context()
            .merge(name.context)
            .merge(sport.context)
            .merge(photo.context);

        debug!(
            profile = %profile.id,
            name_present = name.record.present,
            sport_present = sport.record.present,
            photo_present = photo.record.present,
            "signals collected"
        );

        CollectedSignals {
            name: name.record,
            sport: sport.record,
            photo: photo.record,
            context,
        }
    }

    /// Explicit gender wins outright; otherwise collect and fuse.
    pub fn run(&self, profile: &Profile) -> FusionResult<ProfileOutcome> {
        if let Some(explicit) = profile.gender.as_deref().and_then(ExplicitGender::parse) {
            info!(profile = %profile.id, "explicit gender present, inference skipped");
            return Ok(ProfileOutcome::Explicit(explicit));
        }

        let c = self.collect(profile);
        let result = self
            .engine
            .infer(Some(&c.name), Some(&c.sport), Some(&c.photo), &c.context)?;
        Ok(ProfileOutcome::Inferred(result))
    }

    /// Run every profile. One failing profile does not stop the others.
    ///
    /// Deterministic: reports are sorted by profile id (stable for duplicate ids).
    pub fn run_batch(&self, profiles: &[Profile]) -> Vec<ProfileReport> {
        let mut out: Vec<ProfileReport> = profiles
            .iter()
            .map(|p| ProfileReport {
                id: p.id.clone(),
                outcome: self.run(p),
            })
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}
