use std::collections::BTreeMap;

use serde::Serialize;

use crate::signal::{Distribution, Gender, SignalRecord, SignalSource};
use crate::weights::WeightAssignment;

/// How much one source pushed toward `blended_gender`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Contribution {
    pub weight: f64,
    /// The source's own probability for the blended winner (0 when absent).
    pub probability: f64,
    /// `weight * probability`
    pub contribution: f64,
    /// Collaborator note carried over from the record (e.g. `name_not_found`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Which path produced the final distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Resolution {
    Blended,
    Overridden(SignalSource),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InferenceResult {
    pub distribution: Distribution,
    /// What the fusion picked, before abstention. Attribution is computed toward it.
    pub blended_gender: Gender,
    /// `blended_gender`, or unknown when the result abstained.
    pub inferred_gender: Gender,
    pub confidence: f64,
    /// Per-source explanation toward `blended_gender`, keyed in source order.
    /// Always has all three sources.
    pub attribution: BTreeMap<SignalSource, Contribution>,
    pub weights: WeightAssignment,
    pub override_source: Option<SignalSource>,
    /// Confidence fell below `min_confidence`; `inferred_gender` was forced to unknown.
    pub abstained: bool,
}

impl InferenceResult {
    /// Package a distribution with attribution computed toward `winner`.
    pub(crate) fn assemble(
        distribution: Distribution,
        winner: Gender,
        confidence: f64,
        weights: WeightAssignment,
        records: &[SignalRecord],
        override_source: Option<SignalSource>,
    ) -> Self {
        let mut attribution = BTreeMap::new();
        for source in SignalSource::ALL {
            let rec = records.iter().find(|r| r.source == source);
            let probability = rec
                .filter(|r| r.present)
                .map(|r| r.distribution.get(winner))
                .unwrap_or(0.0);
            let weight = weights.get(source);
            attribution.insert(
                source,
                Contribution {
                    weight,
                    probability,
                    contribution: weight * probability,
                    note: rec.and_then(|r| r.note.clone()),
                },
            );
        }

        Self {
            distribution,
            blended_gender: winner,
            inferred_gender: winner,
            confidence,
            attribution,
            weights,
            override_source,
            abstained: false,
        }
    }

    pub fn override_applied(&self) -> bool {
        self.override_source.is_some()
    }

    pub fn resolution(&self) -> Resolution {
        match self.override_source {
            Some(source) => Resolution::Overridden(source),
            None => Resolution::Blended,
        }
    }

    /// Source with the largest contribution toward `blended_gender`; earlier sources win ties.
    pub fn dominant_source(&self) -> Option<SignalSource> {
        let mut best: Option<(SignalSource, f64)> = None;
        for (source, c) in &self.attribution {
            if c.contribution <= 0.0 {
                continue;
            }
            match best {
                Some((_, b)) if b >= c.contribution => {}
                _ => best = Some((*source, c.contribution)),
            }
        }
        best.map(|(s, _)| s)
    }
}
