//genfer_core/resolve.rs

use tracing::info;

use crate::cfg::FusionCfg;
use crate::result::InferenceResult;
use crate::signal::SignalRecord;
use crate::weights::WeightAssignment;

/// The present signal certain enough to replace the blend, if any.
///
/// Needs reliability above `override_reliability` and a top probability
/// above `override_certainty`. Among several, the most reliable wins; equal
/// reliability goes to whichever comes first in `records`.
pub fn override_candidate<'a>(records: &'a [SignalRecord], cfg: &FusionCfg) -> Option<&'a SignalRecord> {
    let mut best: Option<&SignalRecord> = None;
    for rec in records {
        let certain = rec.present
            && rec.reliability > cfg.override_reliability
            && rec.distribution.top() > cfg.override_certainty;
        if !certain {
            continue;
        }
        match best {
            Some(b) if b.reliability >= rec.reliability => {}
            _ => best = Some(rec),
        }
    }
    best
}

/// Blended -> Overridden, or pass the blend through unchanged.
pub fn resolve(records: &[SignalRecord], blended: InferenceResult, cfg: &FusionCfg) -> InferenceResult {
    let Some(rec) = override_candidate(records, cfg) else {
        return blended;
    };

    let winner = rec.distribution.argmax(&cfg.tie_order, cfg.tie_epsilon);
    info!(
        source = %rec.source,
        reliability = rec.reliability,
        winner = %winner,
        "override applied"
    );

    InferenceResult::assemble(
        rec.distribution,
        winner,
        rec.reliability,
        WeightAssignment::sole(rec.source),
        records,
        Some(rec.source),
    )
}
