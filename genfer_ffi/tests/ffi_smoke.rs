//! FFI smoke tests.
//!
//! These tests call the exported `extern "C"` functions directly (as an external consumer would),
//! to validate:
//! - ABI surface compiles and links
//! - handle allocation/free symmetry
//! - error codes for bad input

use std::ffi::CStr;
use std::ptr;

use genfer_ffi::*;

fn signal(p_male: f64, p_female: f64, reliability: f64) -> GfSignal {
    GfSignal {
        present: 1,
        p_male,
        p_female,
        p_unknown: 0.0,
        reliability,
    }
}

#[test]
fn ffi_version_and_default_cfg() {
    assert_eq!(genfer_ffi_version(), GENFER_FFI_VERSION);

    let cfg = genfer_cfg_default();
    assert!((cfg.prior_name + cfg.prior_sport + cfg.prior_photo - 1.0).abs() < 1e-9);
    assert_eq!(cfg.tie_order, [0, 1, 2]);
    // min_confidence default is -1 (None)
    assert!(cfg.min_confidence < 0.0);
}

#[test]
fn ffi_infer_and_free() {
    let cfg = genfer_cfg_default();
    let h = unsafe { genfer_engine_new(&cfg) };
    assert!(!h.is_null());

    let name = signal(0.6, 0.4, 0.5);
    let sport = signal(0.3, 0.7, 0.8);
    let r = unsafe { genfer_infer(h, &name, &sport, ptr::null(), ptr::null()) };

    assert_eq!(r.rc, GF_OK);
    assert_eq!(r.inferred, GfGender::Female);
    assert!((r.p_male + r.p_female + r.p_unknown - 1.0).abs() < 1e-9);
    assert!((r.weights[0] - 0.4).abs() < 1e-9);
    assert!((r.weights[1] - 0.6).abs() < 1e-9);
    assert_eq!(r.weights[2], 0.0);
    assert_eq!(r.override_source, -1);

    unsafe { genfer_engine_free(h) };
}

#[test]
fn ffi_override_reports_source() {
    let h = unsafe { genfer_engine_new(ptr::null()) };
    let name = signal(0.9, 0.1, 0.95);
    let r = unsafe { genfer_infer(h, &name, ptr::null(), ptr::null(), ptr::null()) };
    assert_eq!(r.rc, GF_OK);
    assert_eq!(r.override_source, 0);
    assert_eq!(r.confidence, 0.95);
    assert_eq!(r.inferred, GfGender::Male);
    unsafe { genfer_engine_free(h) };
}

#[test]
fn ffi_error_codes() {
    let h = unsafe { genfer_engine_new(ptr::null()) };

    let r = unsafe { genfer_infer(h, ptr::null(), ptr::null(), ptr::null(), ptr::null()) };
    assert_eq!(r.rc, GF_ERR_INSUFFICIENT_SIGNALS);

    let absent = GfSignal::default();
    let r = unsafe { genfer_infer(h, &absent, &absent, &absent, ptr::null()) };
    assert_eq!(r.rc, GF_ERR_INSUFFICIENT_SIGNALS);

    let bad = signal(0.7, 0.7, 0.5);
    let r = unsafe { genfer_infer(h, ptr::null(), ptr::null(), &bad, ptr::null()) };
    assert_eq!(r.rc, GF_ERR_INVALID_SIGNAL);
    assert_eq!(r.failed_source, 2);

    let r = unsafe { genfer_infer(ptr::null(), &bad, ptr::null(), ptr::null(), ptr::null()) };
    assert_eq!(r.rc, GF_ERR_NULL_HANDLE);

    let msg = unsafe { CStr::from_ptr(genfer_rc_message(GF_ERR_INSUFFICIENT_SIGNALS)) };
    assert!(msg.to_str().unwrap().starts_with("insufficient signals"));

    unsafe { genfer_engine_free(h) };
}

#[test]
fn ffi_rejects_invalid_cfg() {
    let mut cfg = genfer_cfg_default();
    cfg.tie_order = [0, 0, 2];
    assert!(unsafe { genfer_engine_new(&cfg) }.is_null());

    let mut cfg = genfer_cfg_default();
    cfg.tie_order = [7, 1, 2];
    assert!(unsafe { genfer_engine_new(&cfg) }.is_null());

    let mut cfg = genfer_cfg_default();
    cfg.prior_photo = -0.3;
    assert!(unsafe { genfer_engine_new(&cfg) }.is_null());
}

#[test]
fn ffi_context_flags() {
    let h = unsafe { genfer_engine_new(ptr::null()) };
    let name = signal(0.8, 0.2, 0.8);
    let photo = signal(0.2, 0.8, 0.8);

    let plain = unsafe { genfer_infer(h, &name, ptr::null(), &photo, ptr::null()) };
    let ctx = GfContext { group_photo: 1, ..Default::default() };
    let grouped = unsafe { genfer_infer(h, &name, ptr::null(), &photo, &ctx) };

    assert!(grouped.weights[2] < plain.weights[2]);
    unsafe { genfer_engine_free(h) };
}

#[test]
fn ffi_abstention_keeps_blended_gender() {
    let mut cfg = genfer_cfg_default();
    cfg.min_confidence = 0.7;
    let h = unsafe { genfer_engine_new(&cfg) };
    assert!(!h.is_null());

    let name = signal(0.6, 0.4, 0.5);
    let sport = signal(0.3, 0.7, 0.8);
    let r = unsafe { genfer_infer(h, &name, &sport, ptr::null(), ptr::null()) };

    assert_eq!(r.rc, GF_OK);
    assert_eq!(r.abstained, 1);
    assert_eq!(r.inferred, GfGender::Unknown);
    assert_eq!(r.blended, GfGender::Female);
    assert!((r.contributions[1] - 0.6 * 0.7).abs() < 1e-9);

    unsafe { genfer_engine_free(h) };
}
