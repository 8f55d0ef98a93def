//genfer_core/signal.rs

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Gender category a distribution assigns mass to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unknown];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which collaborator produced a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Name,
    Sport,
    Photo,
}

impl SignalSource {
    /// Fixed source order. Used for iteration and for override ties.
    pub const ALL: [SignalSource; 3] = [SignalSource::Name, SignalSource::Sport, SignalSource::Photo];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            SignalSource::Name => 0,
            SignalSource::Sport => 1,
            SignalSource::Photo => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSource::Name => "name",
            SignalSource::Sport => "sport",
            SignalSource::Photo => "photo",
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Probability mass over {male, female, unknown}.
///
/// Every category always has a value; a category a producer does not
/// mention is simply 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    #[serde(default)]
    pub male: f64,
    #[serde(default)]
    pub female: f64,
    #[serde(default)]
    pub unknown: f64,
}

impl Distribution {
    pub const fn new(male: f64, female: f64, unknown: f64) -> Self {
        Self { male, female, unknown }
    }

    /// Male/female split with no unknown mass.
    pub const fn binary(p_male: f64, p_female: f64) -> Self {
        Self::new(p_male, p_female, 0.0)
    }

    /// All mass on one category.
    pub const fn certain(gender: Gender) -> Self {
        match gender {
            Gender::Male => Self::new(1.0, 0.0, 0.0),
            Gender::Female => Self::new(0.0, 1.0, 0.0),
            Gender::Unknown => Self::new(0.0, 0.0, 1.0),
        }
    }

    #[inline]
    pub fn get(&self, gender: Gender) -> f64 {
        match gender {
            Gender::Male => self.male,
            Gender::Female => self.female,
            Gender::Unknown => self.unknown,
        }
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, gender: Gender) -> &mut f64 {
        match gender {
            Gender::Male => &mut self.male,
            Gender::Female => &mut self.female,
            Gender::Unknown => &mut self.unknown,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Gender, f64)> + '_ {
        Gender::ALL.into_iter().map(move |g| (g, self.get(g)))
    }

    pub fn total(&self) -> f64 {
        self.male + self.female + self.unknown
    }

    /// Largest single probability.
    pub fn top(&self) -> f64 {
        self.male.max(self.female).max(self.unknown)
    }

    /// Rescale so the categories sum to 1. `None` when there is no mass to rescale.
    pub fn normalized(&self) -> Option<Self> {
        let total = self.total();
        if !total.is_finite() || total <= 0.0 {
            return None;
        }
        Some(Self::new(self.male / total, self.female / total, self.unknown / total))
    }

    /// Most probable category.
    ///
    /// Categories within `eps` of each other count as equal; the earlier
    /// one in `order` wins. Never depends on anything but the inputs.
    pub fn argmax(&self, order: &[Gender; 3], eps: f64) -> Gender {
        let mut best = order[0];
        for &g in &order[1..] {
            if self.get(g) > self.get(best) + eps {
                best = g;
            }
        }
        best
    }

    /// Highest probability among the categories other than `winner`.
    pub fn runner_up(&self, winner: Gender) -> f64 {
        self.iter()
            .filter(|(g, _)| *g != winner)
            .map(|(_, p)| p)
            .fold(0.0, f64::max)
    }
}

impl Index<Gender> for Distribution {
    type Output = f64;

    fn index(&self, gender: Gender) -> &f64 {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
            Gender::Unknown => &self.unknown,
        }
    }
}

/// One normalized signal, as handed to the fusion engine.
///
/// An absent record always carries `{unknown: 1.0}` and zero reliability;
/// use [`SignalRecord::absent`] to build one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub source: SignalSource,
    pub distribution: Distribution,
    /// Trust in this particular instance, in [0,1].
    pub reliability: f64,
    pub present: bool,
    /// Why the collaborator produced this record (e.g. `name_not_found`).
    /// Informational only; fusion never reads it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SignalRecord {
    pub fn present(source: SignalSource, distribution: Distribution, reliability: f64) -> Self {
        Self {
            source,
            distribution,
            reliability,
            present: true,
            note: None,
        }
    }

    pub fn absent(source: SignalSource) -> Self {
        Self {
            source,
            distribution: Distribution::certain(Gender::Unknown),
            reliability: 0.0,
            present: false,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
