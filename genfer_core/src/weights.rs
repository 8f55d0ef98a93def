use serde::Serialize;
use tracing::{debug, warn};

use crate::cfg::FusionCfg;
use crate::context::InferenceContext;
use crate::error::{FusionError, FusionResult};
use crate::signal::{SignalRecord, SignalSource};

// ---------------------------------------------------------------------
// Weight assignment: priors, contextual decay, renormalization over the
// signals that are actually present.
// ---------------------------------------------------------------------

/// Weight per source. Present weights sum to 1; absent sources are 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct WeightAssignment {
    name: f64,
    sport: f64,
    photo: f64,
}

impl WeightAssignment {
    /// All weight on one source.
    pub fn sole(source: SignalSource) -> Self {
        let mut w = Self::default();
        *w.slot_mut(source) = 1.0;
        w
    }

    #[inline]
    pub fn get(&self, source: SignalSource) -> f64 {
        match source {
            SignalSource::Name => self.name,
            SignalSource::Sport => self.sport,
            SignalSource::Photo => self.photo,
        }
    }

    #[inline]
    fn slot_mut(&mut self, source: SignalSource) -> &mut f64 {
        match source {
            SignalSource::Name => &mut self.name,
            SignalSource::Sport => &mut self.sport,
            SignalSource::Photo => &mut self.photo,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalSource, f64)> + '_ {
        SignalSource::ALL.into_iter().map(move |s| (s, self.get(s)))
    }

    pub fn total(&self) -> f64 {
        self.name + self.sport + self.photo
    }
}

/// Combined multiplier for one present record.
///
/// Rules, in order (all multiplicative):
///   1. reliability below `reliability_floor` -> `reliability_decay`
///   2. own male or female probability at or above `boost_certainty` -> `boost_factor`
///      (unknown mass never counts as discriminative)
///   3. context flags for the record's source
pub fn adjustment(rec: &SignalRecord, ctx: &InferenceContext, cfg: &FusionCfg) -> f64 {
    let mut m = 1.0_f64;

    if rec.reliability < cfg.reliability_floor {
        m *= cfg.reliability_decay;
    }

    if rec.distribution.male.max(rec.distribution.female) >= cfg.boost_certainty {
        m *= cfg.boost_factor;
    }

    let f = &cfg.context;
    match rec.source {
        SignalSource::Sport => {
            if ctx.suspect_team_assignment {
                m *= f.suspect_team;
            }
        }
        SignalSource::Photo => {
            if ctx.group_photo {
                m *= f.group_photo;
            }
            if ctx.low_quality_photo {
                m *= f.low_quality_photo;
            }
        }
        SignalSource::Name => {
            if ctx.ambiguous_name {
                m *= f.ambiguous_name;
            }
        }
    }

    m
}

/// Assign a weight to every source.
///
/// Records are expected to carry distinct sources (the inference engine
/// enforces this). Fails with `InsufficientSignals` when nothing is present.
pub fn assign_weights(
    records: &[SignalRecord],
    ctx: &InferenceContext,
    cfg: &FusionCfg,
) -> FusionResult<WeightAssignment> {
    let mut w = WeightAssignment::default();
    let mut present = 0usize;

    for rec in records.iter().filter(|r| r.present) {
        present += 1;
        let raw = cfg.priors.get(rec.source) * adjustment(rec, ctx, cfg);
        *w.slot_mut(rec.source) = if raw.is_finite() { raw.max(0.0) } else { 0.0 };
    }

    if present == 0 {
        return Err(FusionError::InsufficientSignals);
    }

    let total = w.total();
    if total > 0.0 && total.is_finite() {
        for source in SignalSource::ALL {
            *w.slot_mut(source) /= total;
        }
    } else {
        // Every present prior was zeroed out; fall back to an even split.
        warn!(present, "all present weights collapsed to zero, splitting evenly");
        let share = 1.0 / present as f64;
        for rec in records.iter().filter(|r| r.present) {
            *w.slot_mut(rec.source) = share;
        }
    }

    debug!(weights = ?w, "weights assigned");
    Ok(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Distribution;

    #[test]
    fn low_reliability_is_decayed() {
        let cfg = FusionCfg::default();
        let rec = SignalRecord::present(SignalSource::Name, Distribution::binary(0.6, 0.4), 0.3);
        assert!((adjustment(&rec, &InferenceContext::default(), &cfg) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn context_flags_only_touch_their_source() {
        let cfg = FusionCfg::default();
        let ctx = InferenceContext { group_photo: true, ..Default::default() };
        let name = SignalRecord::present(SignalSource::Name, Distribution::binary(0.6, 0.4), 0.8);
        let photo = SignalRecord::present(SignalSource::Photo, Distribution::binary(0.6, 0.4), 0.8);
        assert_eq!(adjustment(&name, &ctx, &cfg), 1.0);
        assert!((adjustment(&photo, &ctx, &cfg) - 0.05).abs() < 1e-12);
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn decisive_signal_is_boosted() {
        let cfg = FusionCfg::default();
        let ctx = InferenceContext::default();
        let sharp = SignalRecord::present(SignalSource::Name, Distribution::binary(0.95, 0.05), 0.8);
        let soft = SignalRecord::present(SignalSource::Name, Distribution::binary(0.6, 0.4), 0.8);
        let ratio = adjustment(&sharp, &ctx, &cfg) / adjustment(&soft, &ctx, &cfg);
        assert!(approx(ratio, cfg.boost_factor));

        // boost_certainty is inclusive
        let edge = SignalRecord::present(SignalSource::Name, Distribution::binary(0.9, 0.1), 0.8);
        assert!(approx(adjustment(&edge, &ctx, &cfg), cfg.boost_factor));
    }

    #[test]
    fn unknown_mass_is_not_boosted() {
        let cfg = FusionCfg::default();
        let ctx = InferenceContext::default();
        let unsure = SignalRecord::present(SignalSource::Photo, Distribution::new(0.02, 0.03, 0.95), 0.8);
        let coin = SignalRecord::present(SignalSource::Photo, Distribution::binary(0.5, 0.5), 0.8);
        assert_eq!(adjustment(&unsure, &ctx, &cfg), 1.0);
        assert_eq!(adjustment(&coin, &ctx, &cfg), 1.0);
    }

    #[test]
    fn each_context_factor_scales_its_source() {
        let cfg = FusionCfg::default();
        let f = cfg.context;
        let flat = Distribution::binary(0.6, 0.4);
        let name = SignalRecord::present(SignalSource::Name, flat, 0.8);
        let sport = SignalRecord::present(SignalSource::Sport, flat, 0.8);
        let photo = SignalRecord::present(SignalSource::Photo, flat, 0.8);

        let suspect = InferenceContext { suspect_team_assignment: true, ..Default::default() };
        assert!(approx(adjustment(&sport, &suspect, &cfg), f.suspect_team));
        assert_eq!(adjustment(&name, &suspect, &cfg), 1.0);

        let blurry = InferenceContext { low_quality_photo: true, ..Default::default() };
        assert!(approx(adjustment(&photo, &blurry, &cfg), f.low_quality_photo));
        assert_eq!(adjustment(&sport, &blurry, &cfg), 1.0);

        let ambiguous = InferenceContext { ambiguous_name: true, ..Default::default() };
        assert!(approx(adjustment(&name, &ambiguous, &cfg), f.ambiguous_name));
        assert_eq!(adjustment(&photo, &ambiguous, &cfg), 1.0);
    }

    #[test]
    fn all_rules_multiply() {
        let cfg = FusionCfg::default();
        let f = cfg.context;
        let ctx = InferenceContext {
            suspect_team_assignment: true,
            group_photo: true,
            low_quality_photo: true,
            ambiguous_name: true,
        };

        let photo = SignalRecord::present(SignalSource::Photo, Distribution::binary(0.95, 0.05), 0.3);
        let expected = cfg.reliability_decay * cfg.boost_factor * f.group_photo * f.low_quality_photo;
        assert!(approx(adjustment(&photo, &ctx, &cfg), expected));

        let name = SignalRecord::present(SignalSource::Name, Distribution::binary(0.6, 0.4), 0.8);
        assert!(approx(adjustment(&name, &ctx, &cfg), f.ambiguous_name));
    }

    #[test]
    fn suspect_team_moves_weight_to_name() {
        let cfg = FusionCfg::default();
        let flat = Distribution::binary(0.5, 0.5);
        let records = [
            SignalRecord::present(SignalSource::Name, Distribution::binary(0.6, 0.4), 0.8),
            SignalRecord::present(SignalSource::Sport, flat, 0.8),
            SignalRecord::absent(SignalSource::Photo),
        ];

        let plain = assign_weights(&records, &InferenceContext::default(), &cfg).unwrap();
        assert!(approx(plain.get(SignalSource::Name), 0.4 / 0.7));

        let suspect = InferenceContext { suspect_team_assignment: true, ..Default::default() };
        let w = assign_weights(&records, &suspect, &cfg).unwrap();
        let sport_raw = 0.3 * cfg.context.suspect_team;
        assert!(approx(w.get(SignalSource::Sport), sport_raw / (0.4 + sport_raw)));
        assert!(approx(w.total(), 1.0));
    }

    #[test]
    fn zeroed_weights_split_evenly() {
        let mut cfg = FusionCfg::default();
        cfg.reliability_decay = 0.0;
        let records = [
            SignalRecord::present(SignalSource::Name, Distribution::binary(0.6, 0.4), 0.1),
            SignalRecord::present(SignalSource::Sport, Distribution::binary(0.3, 0.7), 0.1),
            SignalRecord::absent(SignalSource::Photo),
        ];
        let w = assign_weights(&records, &InferenceContext::default(), &cfg).unwrap();
        assert_eq!(w.get(SignalSource::Name), 0.5);
        assert_eq!(w.get(SignalSource::Sport), 0.5);
        assert_eq!(w.get(SignalSource::Photo), 0.0);
    }
}
