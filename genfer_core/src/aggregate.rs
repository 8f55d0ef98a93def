use serde::Serialize;
use tracing::debug;

use crate::cfg::FusionCfg;
use crate::signal::{Distribution, Gender, SignalRecord};
use crate::weights::WeightAssignment;

/// Aggregator output before any override is considered.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Blend {
    pub distribution: Distribution,
    pub winner: Gender,
    pub confidence: f64,
}

/// Weighted cross-signal agreement on `winner`, in [0,1].
///
/// 1 minus the weight-weighted variance of each present signal's own
/// probability for `winner`, scaled by the largest possible variance (0.25).
pub fn agreement(records: &[SignalRecord], weights: &WeightAssignment, winner: Gender) -> f64 {
    let mut sum_w = 0.0_f64;
    let mut sum_q = 0.0_f64;
    for rec in records.iter().filter(|r| r.present) {
        let w = weights.get(rec.source);
        if w <= 0.0 {
            continue;
        }
        sum_w += w;
        sum_q += w * rec.distribution.get(winner);
    }
    if sum_w <= 0.0 {
        return 1.0;
    }
    let mean = sum_q / sum_w;

    let mut var = 0.0_f64;
    for rec in records.iter().filter(|r| r.present) {
        let w = weights.get(rec.source);
        if w <= 0.0 {
            continue;
        }
        let d = rec.distribution.get(winner) - mean;
        var += w * d * d;
    }
    var /= sum_w;

    (1.0 - var / 0.25).clamp(0.0, 1.0)
}

/// Confidence from concentration, lead over the runner-up, and agreement.
pub fn confidence(distribution: &Distribution, winner: Gender, agreement: f64, cfg: &FusionCfg) -> f64 {
    let top = distribution.get(winner);
    let margin = (top - distribution.runner_up(winner)).max(0.0);
    let bonus = cfg.confidence.agreement_bonus * agreement * margin * (1.0 - top);
    (top + bonus).clamp(0.0, 1.0)
}

/// Blend present signals by weight, renormalize, and score the result.
pub fn combine(records: &[SignalRecord], weights: &WeightAssignment, cfg: &FusionCfg) -> Blend {
    let mut acc = Distribution::default();
    for rec in records.iter().filter(|r| r.present) {
        let w = weights.get(rec.source);
        if w <= 0.0 {
            continue;
        }
        for g in Gender::ALL {
            *acc.slot_mut(g) += w * rec.distribution.get(g);
        }
    }

    let distribution = acc
        .normalized()
        .unwrap_or(Distribution::certain(Gender::Unknown));
    let winner = distribution.argmax(&cfg.tie_order, cfg.tie_epsilon);
    let agree = agreement(records, weights, winner);
    let confidence = confidence(&distribution, winner, agree, cfg);

    debug!(
        male = distribution.male,
        female = distribution.female,
        unknown = distribution.unknown,
        winner = %winner,
        agreement = agree,
        confidence,
        "signals blended"
    );

    Blend {
        distribution,
        winner,
        confidence,
    }
}
