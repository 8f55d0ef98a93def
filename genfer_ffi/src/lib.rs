#![allow(clippy::missing_safety_doc)]

use std::os::raw::c_char;
use std::ptr;

use genfer_core::{
    ConfidenceCfg, Distribution, FusionCfg, FusionError, Gender, InferenceContext, InferenceEngine, InferenceResult,
    SignalRecord, SignalSource, SourcePriors,
};
use tracing::warn;

/// FFI ABI version for genfer_ffi.
///
/// Bump this when any `#[repr(C)]` struct layout or exported function signature changes.
pub const GENFER_FFI_VERSION: u32 = 2;

#[no_mangle]
pub extern "C" fn genfer_ffi_version() -> u32 {
    GENFER_FFI_VERSION
}

// Return codes carried in `GfResult::rc`.
pub const GF_OK: i32 = 0;
pub const GF_ERR_NULL_HANDLE: i32 = -1;
pub const GF_ERR_INVALID_SIGNAL: i32 = -2;
pub const GF_ERR_INSUFFICIENT_SIGNALS: i32 = -3;

/// Opaque handle exposed over FFI.
pub struct GfEngine {
    inner: InferenceEngine,
}

/// Gender codes: 0 = male, 1 = female, 2 = unknown.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GfGender {
    Male = 0,
    Female = 1,
    Unknown = 2,
}

/// One signal. `present == 0` means absent; the other fields are then ignored.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct GfSignal {
    pub present: u8,
    pub p_male: f64,
    pub p_female: f64,
    pub p_unknown: f64,
    pub reliability: f64,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct GfContext {
    pub suspect_team_assignment: u8,
    pub group_photo: u8,
    pub low_quality_photo: u8,
    pub ambiguous_name: u8,
}

/// Engine cfg for FFI (keep it minimal; context factors stay at their defaults).
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct GfCfg {
    pub prior_name: f64,
    pub prior_sport: f64,
    pub prior_photo: f64,
    pub reliability_floor: f64,
    pub reliability_decay: f64,
    pub boost_certainty: f64,
    pub boost_factor: f64,
    pub override_reliability: f64,
    pub override_certainty: f64,
    pub agreement_bonus: f64,
    pub min_confidence: f64, // < 0 means None
    /// Gender codes in tie-break order.
    pub tie_order: [u8; 3],
}

/// Result of one inference.
///
/// Per-source arrays are indexed name = 0, sport = 1, photo = 2.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct GfResult {
    pub rc: i32,
    /// Offending source for `GF_ERR_INVALID_SIGNAL`, else -1.
    pub failed_source: i32,

    pub inferred: GfGender,
    /// Argmax before abstention; `contributions` point toward it.
    pub blended: GfGender,
    pub p_male: f64,
    pub p_female: f64,
    pub p_unknown: f64,
    pub confidence: f64,

    /// Source index that overrode the blend, or -1.
    pub override_source: i32,
    pub abstained: u8,

    pub weights: [f64; 3],
    pub contributions: [f64; 3],
}

impl GfResult {
    fn failed(rc: i32, failed_source: i32) -> Self {
        Self {
            rc,
            failed_source,
            inferred: GfGender::Unknown,
            blended: GfGender::Unknown,
            p_male: 0.0,
            p_female: 0.0,
            p_unknown: 0.0,
            confidence: 0.0,
            override_source: -1,
            abstained: 0,
            weights: [0.0; 3],
            contributions: [0.0; 3],
        }
    }
}

fn gender_to_ffi(g: Gender) -> GfGender {
    match g {
        Gender::Male => GfGender::Male,
        Gender::Female => GfGender::Female,
        Gender::Unknown => GfGender::Unknown,
    }
}

fn gender_from_code(code: u8) -> Option<Gender> {
    match code {
        0 => Some(Gender::Male),
        1 => Some(Gender::Female),
        2 => Some(Gender::Unknown),
        _ => None,
    }
}

#[no_mangle]
pub extern "C" fn genfer_cfg_default() -> GfCfg {
    let d = FusionCfg::default();
    let code = |g: Gender| gender_to_ffi(g) as u8;
    GfCfg {
        prior_name: d.priors.name,
        prior_sport: d.priors.sport,
        prior_photo: d.priors.photo,
        reliability_floor: d.reliability_floor,
        reliability_decay: d.reliability_decay,
        boost_certainty: d.boost_certainty,
        boost_factor: d.boost_factor,
        override_reliability: d.override_reliability,
        override_certainty: d.override_certainty,
        agreement_bonus: d.confidence.agreement_bonus,
        min_confidence: d.min_confidence.unwrap_or(-1.0),
        tie_order: [code(d.tie_order[0]), code(d.tie_order[1]), code(d.tie_order[2])],
    }
}

fn cfg_from_ffi(c: GfCfg) -> Option<FusionCfg> {
    let tie_order = [
        gender_from_code(c.tie_order[0])?,
        gender_from_code(c.tie_order[1])?,
        gender_from_code(c.tie_order[2])?,
    ];
    Some(FusionCfg {
        priors: SourcePriors {
            name: c.prior_name,
            sport: c.prior_sport,
            photo: c.prior_photo,
        },
        reliability_floor: c.reliability_floor,
        reliability_decay: c.reliability_decay,
        boost_certainty: c.boost_certainty,
        boost_factor: c.boost_factor,
        override_reliability: c.override_reliability,
        override_certainty: c.override_certainty,
        confidence: ConfidenceCfg {
            agreement_bonus: c.agreement_bonus,
        },
        min_confidence: if c.min_confidence < 0.0 { None } else { Some(c.min_confidence) },
        tie_order,
        ..FusionCfg::default()
    })
}

fn signal_from_ffi(source: SignalSource, s: Option<&GfSignal>) -> Option<SignalRecord> {
    let s = s?;
    if s.present == 0 {
        return Some(SignalRecord::absent(source));
    }
    Some(SignalRecord::present(
        source,
        Distribution::new(s.p_male, s.p_female, s.p_unknown),
        s.reliability,
    ))
}

fn result_to_ffi(r: &InferenceResult) -> GfResult {
    let mut weights = [0.0; 3];
    let mut contributions = [0.0; 3];
    for source in SignalSource::ALL {
        weights[source.index()] = r.weights.get(source);
        contributions[source.index()] = r.attribution.get(&source).map(|c| c.contribution).unwrap_or(0.0);
    }

    GfResult {
        rc: GF_OK,
        failed_source: -1,
        inferred: gender_to_ffi(r.inferred_gender),
        blended: gender_to_ffi(r.blended_gender),
        p_male: r.distribution.male,
        p_female: r.distribution.female,
        p_unknown: r.distribution.unknown,
        confidence: r.confidence,
        override_source: r.override_source.map(|s| s.index() as i32).unwrap_or(-1),
        abstained: r.abstained as u8,
        weights,
        contributions,
    }
}

/// Create an engine handle. Returns null when `cfg` is invalid.
///
/// A null `cfg` selects the defaults. The handle holds only immutable config,
/// so it may be used from several threads at once.
#[no_mangle]
pub unsafe extern "C" fn genfer_engine_new(cfg: *const GfCfg) -> *mut GfEngine {
    let cfg = if cfg.is_null() {
        FusionCfg::default()
    } else {
        match cfg_from_ffi(*cfg) {
            Some(c) => c,
            None => {
                warn!("rejected ffi cfg: bad tie_order code");
                return ptr::null_mut();
            }
        }
    };

    match InferenceEngine::new(cfg) {
        Ok(inner) => Box::into_raw(Box::new(GfEngine { inner })),
        Err(e) => {
            warn!(error = %e, "rejected ffi cfg");
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn genfer_engine_free(h: *mut GfEngine) {
    if !h.is_null() {
        drop(Box::from_raw(h));
    }
}

/// Run one inference. Null signal pointers are absent signals; a null `ctx` raises no flags.
#[no_mangle]
pub unsafe extern "C" fn genfer_infer(
    h: *const GfEngine,
    name: *const GfSignal,
    sport: *const GfSignal,
    photo: *const GfSignal,
    ctx: *const GfContext,
) -> GfResult {
    if h.is_null() {
        return GfResult::failed(GF_ERR_NULL_HANDLE, -1);
    }
    let handle = &*h;

    let name = signal_from_ffi(SignalSource::Name, name.as_ref());
    let sport = signal_from_ffi(SignalSource::Sport, sport.as_ref());
    let photo = signal_from_ffi(SignalSource::Photo, photo.as_ref());

    let c = ctx.as_ref().copied().unwrap_or_default();
    let ctx = InferenceContext {
        suspect_team_assignment: c.suspect_team_assignment != 0,
        group_photo: c.group_photo != 0,
        low_quality_photo: c.low_quality_photo != 0,
        ambiguous_name: c.ambiguous_name != 0,
    };

    match handle.inner.infer(name.as_ref(), sport.as_ref(), photo.as_ref(), &ctx) {
        Ok(r) => result_to_ffi(&r),
        Err(FusionError::InvalidSignal { signal, .. }) => {
            GfResult::failed(GF_ERR_INVALID_SIGNAL, signal.index() as i32)
        }
        Err(FusionError::InsufficientSignals) => GfResult::failed(GF_ERR_INSUFFICIENT_SIGNALS, -1),
    }
}

/// Static, NUL-terminated description of a return code. Never free it.
#[no_mangle]
pub extern "C" fn genfer_rc_message(rc: i32) -> *const c_char {
    let msg: &'static [u8] = match rc {
        GF_OK => b"ok\0",
        GF_ERR_NULL_HANDLE => b"null engine handle\0",
        GF_ERR_INVALID_SIGNAL => b"invalid signal\0",
        GF_ERR_INSUFFICIENT_SIGNALS => b"insufficient signals: every signal is absent\0",
        _ => b"unknown return code\0",
    };
    msg.as_ptr() as *const c_char
}
