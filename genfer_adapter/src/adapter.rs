//! Signal collaborators: turn raw profile fields into `genfer_core::SignalRecord`s.
//!
//! This module stays small and policy-light:
//! - No IO (tables are built by the caller)
//! - No async
//! - No fusion rules (those live in core)
//!
//! Photo classification sits behind the `PhotoModel` trait so products can plug in a
//! real model, a closure, or the provided `StubPhotoModel`.

use std::collections::HashMap;

use genfer_core::{Distribution, Gender, InferenceContext, SignalRecord, SignalSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Coarse quality label reported by a collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    High,
    Medium,
    Low,
}

/// Maps a `Quality` label onto a reliability in [0,1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReliabilityScale {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for ReliabilityScale {
    fn default() -> Self {
        Self {
            high: 0.9,
            medium: 0.6,
            low: 0.2,
        }
    }
}

impl ReliabilityScale {
    #[inline]
    pub fn reliability(&self, quality: Quality) -> f64 {
        let r = match quality {
            Quality::High => self.high,
            Quality::Medium => self.medium,
            Quality::Low => self.low,
        };
        if r.is_finite() {
            r.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// A collaborator's record plus any context flags it wants raised.
#[derive(Clone, Debug, PartialEq)]
pub struct Collected {
    pub record: SignalRecord,
    pub context: InferenceContext,
}

impl Collected {
    fn plain(record: SignalRecord) -> Self {
        Self {
            record,
            context: InferenceContext::default(),
        }
    }
}

#[inline]
fn table_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// ---------------------------------------------------------------------
// Name signal
// ---------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NameStats {
    pub p_male: f64,
    pub p_female: f64,
}

/// First name -> observed gender split. Keys are trimmed and lowercased.
#[derive(Clone, Debug)]
pub struct NameTable {
    entries: HashMap<String, NameStats>,
    /// Names whose |p_male - p_female| falls below this are ambiguous.
    pub ambiguity_margin: f64,
}

impl Default for NameTable {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            ambiguity_margin: 0.2,
        }
    }
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, p_male, p_female)` rows.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, f64, f64)>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for (name, p_male, p_female) in rows {
            table.insert(name.as_ref(), p_male, p_female);
        }
        table
    }

    pub fn insert(&mut self, name: &str, p_male: f64, p_female: f64) {
        self.entries.insert(table_key(name), NameStats { p_male, p_female });
    }

    pub fn lookup(&self, name: &str) -> Option<&NameStats> {
        self.entries.get(&table_key(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Look the first name up. Missing or unknown names yield an absent record.
pub fn name_signal(table: &NameTable, first_name: Option<&str>, scale: &ReliabilityScale) -> Collected {
    let absent = |note: &str| Collected::plain(SignalRecord::absent(SignalSource::Name).with_note(note));

    let name = match first_name.map(str::trim) {
        Some(n) if !n.is_empty() => n,
        _ => return absent("missing_name"),
    };
    let Some(stats) = table.lookup(name) else {
        return absent("name_not_found");
    };

    let valid = stats.p_male.is_finite() && stats.p_female.is_finite() && stats.p_male >= 0.0 && stats.p_female >= 0.0;
    let dist = if valid {
        Distribution::binary(stats.p_male, stats.p_female).normalized()
    } else {
        None
    };
    let Some(distribution) = dist else {
        warn!(first_name = name, p_male = stats.p_male, p_female = stats.p_female, "unusable name table row");
        return absent("name_stats_invalid");
    };

    let ambiguous = (distribution.male - distribution.female).abs() < table.ambiguity_margin;
    let quality = if ambiguous { Quality::Medium } else { Quality::High };
    let record = SignalRecord::present(SignalSource::Name, distribution, scale.reliability(quality))
        .with_note(if ambiguous { "ambiguous_name" } else { "name_found" });

    Collected {
        record,
        context: InferenceContext {
            ambiguous_name: ambiguous,
            ..Default::default()
        },
    }
}

// ---------------------------------------------------------------------
// Sport signal
// ---------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SportEntry {
    pub distribution: Distribution,
    pub quality: Quality,
    /// The category is a placeholder; its team assignment is not trusted.
    #[serde(default)]
    pub suspect: bool,
}

/// Sport category -> gender association. Keys are trimmed and lowercased.
#[derive(Clone, Debug, Default)]
pub struct SportTable {
    entries: HashMap<String, SportEntry>,
}

impl SportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-gender teams, neutral mixed categories, and a suspect `unknown`.
    pub fn standard() -> Self {
        let mut t = Self::new();
        let single = |g| SportEntry {
            distribution: Distribution::certain(g),
            quality: Quality::High,
            suspect: false,
        };
        let neutral = SportEntry {
            distribution: Distribution::binary(0.5, 0.5),
            quality: Quality::Medium,
            suspect: false,
        };

        t.insert("male", single(Gender::Male));
        t.insert("female", single(Gender::Female));
        for category in ["mixed", "coed", "neutral"] {
            t.insert(category, neutral);
        }
        t.insert("unknown", SportEntry { suspect: true, ..neutral });
        t
    }

    pub fn insert(&mut self, category: &str, entry: SportEntry) {
        self.entries.insert(table_key(category), entry);
    }

    pub fn lookup(&self, category: &str) -> Option<&SportEntry> {
        self.entries.get(&table_key(category))
    }
}

/// Look the sport category up. Missing or unrecognized categories yield an absent record.
pub fn sport_signal(table: &SportTable, category: Option<&str>, scale: &ReliabilityScale) -> Collected {
    let absent = |note: &str| Collected::plain(SignalRecord::absent(SignalSource::Sport).with_note(note));

    let category = match category.map(str::trim) {
        Some(c) if !c.is_empty() => c,
        _ => return absent("missing_sport_category"),
    };
    let Some(entry) = table.lookup(category) else {
        return absent("unrecognized_sport_category");
    };
    let Some(distribution) = entry.distribution.normalized() else {
        return absent("sport_entry_invalid");
    };

    let record = SignalRecord::present(SignalSource::Sport, distribution, scale.reliability(entry.quality))
        .with_note(table_key(category));

    Collected {
        record,
        context: InferenceContext {
            suspect_team_assignment: entry.suspect,
            ..Default::default()
        },
    }
}

// ---------------------------------------------------------------------
// Photo signal
// ---------------------------------------------------------------------

/// Reference to a photo the model can load (path, URI, object key...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

impl PhotoRef {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// What a photo model reports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoEstimate {
    pub p_male: f64,
    pub p_female: f64,
    pub quality: Quality,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhotoModelError {
    #[error("photo model unavailable: {0}")]
    Unavailable(String),

    #[error("photo model returned malformed output: {0}")]
    Malformed(String),
}

/// Trait: classify one photo. The fusion core never sees the model itself.
pub trait PhotoModel {
    fn classify(&self, photo: &PhotoRef) -> Result<PhotoEstimate, PhotoModelError>;
}

impl<F> PhotoModel for F
where
    F: Fn(&PhotoRef) -> Result<PhotoEstimate, PhotoModelError>,
{
    fn classify(&self, photo: &PhotoRef) -> Result<PhotoEstimate, PhotoModelError> {
        self(photo)
    }
}

/// Fixed-answer model for tests and demos. `None` behaves like an unreachable model.
#[derive(Clone, Debug, Default)]
pub struct StubPhotoModel {
    pub estimate: Option<PhotoEstimate>,
}

impl StubPhotoModel {
    pub fn new(estimate: PhotoEstimate) -> Self {
        Self { estimate: Some(estimate) }
    }

    pub fn unavailable() -> Self {
        Self { estimate: None }
    }
}

impl PhotoModel for StubPhotoModel {
    fn classify(&self, _photo: &PhotoRef) -> Result<PhotoEstimate, PhotoModelError> {
        self.estimate
            .clone()
            .ok_or_else(|| PhotoModelError::Unavailable("stub has no estimate".to_string()))
    }
}

/// Classify the photo if there is one. Model failures degrade to an absent record.
pub fn photo_signal<M>(model: &M, photo: Option<&PhotoRef>, scale: &ReliabilityScale) -> Collected
where
    M: PhotoModel + ?Sized,
{
    let absent = |note: &str| Collected::plain(SignalRecord::absent(SignalSource::Photo).with_note(note));

    let Some(photo) = photo else {
        return absent("no_photo");
    };

    let est = match model.classify(photo) {
        Ok(est) => est,
        Err(e) => {
            warn!(photo = photo.as_str(), error = %e, "photo model failed");
            return absent("model_failed");
        }
    };

    let valid = est.p_male.is_finite() && est.p_female.is_finite() && est.p_male >= 0.0 && est.p_female >= 0.0;
    let dist = if valid {
        Distribution::binary(est.p_male, est.p_female).normalized()
    } else {
        None
    };
    let Some(distribution) = dist else {
        warn!(photo = photo.as_str(), p_male = est.p_male, p_female = est.p_female, "unusable photo estimate");
        return absent("model_output_invalid");
    };

    let mut record = SignalRecord::present(SignalSource::Photo, distribution, scale.reliability(est.quality));
    if !est.notes.is_empty() {
        record = record.with_note(est.notes);
    }
    Collected::plain(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_clamps_out_of_range_values() {
        let scale = ReliabilityScale { high: 1.4, medium: f64::NAN, low: -0.1 };
        assert_eq!(scale.reliability(Quality::High), 1.0);
        assert_eq!(scale.reliability(Quality::Medium), 0.0);
        assert_eq!(scale.reliability(Quality::Low), 0.0);
    }

    #[test]
    fn table_keys_are_case_and_space_insensitive() {
        let t = NameTable::from_rows([("  Maria ", 0.02, 0.98)]);
        assert!(t.lookup("maria").is_some());
        assert!(t.lookup("MARIA").is_some());
        assert_eq!(t.len(), 1);
    }
}
