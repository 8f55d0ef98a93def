//genfer_core/engine.rs

use crate::aggregate::combine;
use crate::cfg::FusionCfg;
use crate::context::InferenceContext;
use crate::error::{ConfigError, FusionError, FusionResult};
use crate::resolve::resolve;
use crate::result::InferenceResult;
use crate::signal::{Distribution, Gender, SignalRecord, SignalSource};
use crate::weights::assign_weights;

fn invalid(signal: SignalSource, reason: String) -> FusionError {
    FusionError::InvalidSignal { signal, reason }
}

/// Reject a record the fusion stages cannot trust.
pub fn validate_record(rec: &SignalRecord, sum_tolerance: f64) -> FusionResult<()> {
    for (g, p) in rec.distribution.iter() {
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return Err(invalid(rec.source, format!("probability for {g} out of range: {p}")));
        }
    }

    let total = rec.distribution.total();
    if (total - 1.0).abs() > sum_tolerance {
        return Err(invalid(rec.source, format!("distribution sums to {total}, expected 1")));
    }

    if !rec.reliability.is_finite() || !(0.0..=1.0).contains(&rec.reliability) {
        return Err(invalid(rec.source, format!("reliability out of range: {}", rec.reliability)));
    }

    if !rec.present {
        let unknown_only = Distribution::certain(Gender::Unknown);
        let drift = rec
            .distribution
            .iter()
            .map(|(g, p)| (p - unknown_only.get(g)).abs())
            .fold(0.0, f64::max);
        if drift > sum_tolerance || rec.reliability != 0.0 {
            return Err(invalid(
                rec.source,
                "absent record must carry {unknown: 1.0} and zero reliability".to_string(),
            ));
        }
    }

    Ok(())
}

fn slot(expected: SignalSource, rec: Option<&SignalRecord>) -> FusionResult<SignalRecord> {
    match rec {
        None => Ok(SignalRecord::absent(expected)),
        Some(r) if r.source != expected => Err(invalid(
            expected,
            format!("{} record supplied in the {} slot", r.source, expected),
        )),
        Some(r) => Ok(r.clone()),
    }
}

/// Fusion entry point: weights, blend, override, in that order.
///
/// Holds only an immutable config, so one engine can be shared across
/// threads and called concurrently.
#[derive(Clone, Debug)]
pub struct InferenceEngine {
    cfg: FusionCfg,
}

impl InferenceEngine {
    /// Validate `cfg` once; a bad config never reaches `infer`.
    pub fn new(cfg: FusionCfg) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn cfg(&self) -> &FusionCfg {
        &self.cfg
    }

    /// Infer from up to one record per source. A `None` slot is an absent signal.
    pub fn infer(
        &self,
        name: Option<&SignalRecord>,
        sport: Option<&SignalRecord>,
        photo: Option<&SignalRecord>,
        ctx: &InferenceContext,
    ) -> FusionResult<InferenceResult> {
        let records = [
            slot(SignalSource::Name, name)?,
            slot(SignalSource::Sport, sport)?,
            slot(SignalSource::Photo, photo)?,
        ];
        self.fuse(&records, ctx)
    }

    /// Same as [`infer`](Self::infer) for an unordered list. Each source may appear at most once.
    pub fn infer_records(&self, records: &[SignalRecord], ctx: &InferenceContext) -> FusionResult<InferenceResult> {
        let mut slots: [Option<&SignalRecord>; 3] = [None; 3];
        for rec in records {
            let i = rec.source.index();
            if slots[i].is_some() {
                return Err(invalid(rec.source, "more than one record for this source".to_string()));
            }
            slots[i] = Some(rec);
        }
        self.infer(slots[0], slots[1], slots[2], ctx)
    }

    // `records` is in source order, which override ties rely on.
    fn fuse(&self, records: &[SignalRecord; 3], ctx: &InferenceContext) -> FusionResult<InferenceResult> {
        let cfg = &self.cfg;
        for rec in records {
            validate_record(rec, cfg.sum_tolerance)?;
        }

        let weights = assign_weights(records, ctx, cfg)?;
        let blend = combine(records, &weights, cfg);
        let blended = InferenceResult::assemble(
            blend.distribution,
            blend.winner,
            blend.confidence,
            weights,
            records,
            None,
        );

        let mut result = resolve(records, blended, cfg);

        if let Some(min) = cfg.min_confidence {
            if result.confidence < min {
                // blended_gender and attribution keep explaining what the fusion saw
                result.inferred_gender = Gender::Unknown;
                result.abstained = true;
            }
        }

        Ok(result)
    }
}
