//! C FFI boundary for labcalc
//!
//! This crate provides C-compatible functions for calling the calculators from
//! a C/C++ host or a WebAssembly shim behind the web widgets.

mod logging;
mod types;

pub use types::*;

use labcalc_core::{
    diagnostics::chi_square_critical,
    fit_probit,
    pharmacokinetics::{auc_trapezoidal, AucMethod},
    transform::probit,
    CalcError, Calculation, DoseResponseObservation, ToxicityClass,
};
use std::ffi::CStr;
use tracing::warn;

/// Convert CalcError to ErrorCode
fn error_to_code(err: &CalcError) -> ErrorCode {
    match err {
        CalcError::InsufficientData { .. } => ErrorCode::InsufficientData,
        CalcError::EmptyInput { .. } => ErrorCode::InvalidInput,
        CalcError::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
        CalcError::InvalidValue { .. } => ErrorCode::InvalidInput,
        CalcError::InvalidConfidenceLevel(_) => ErrorCode::InvalidInput,
        CalcError::ProbabilityOutOfRange(_) => ErrorCode::ProbabilityOutOfRange,
        CalcError::DegenerateRegression => ErrorCode::DegenerateRegression,
        CalcError::ZeroSlope => ErrorCode::ZeroSlope,
        CalcError::DoseOutOfRange { .. } => ErrorCode::DoseOutOfRange,
        CalcError::Distribution(_) => ErrorCode::InternalError,
        CalcError::Serialization(_) => ErrorCode::SerializationError,
    }
}

unsafe fn set_error(out_error: *mut LabcalcError, code: ErrorCode, msg: &str) {
    if !out_error.is_null() {
        (*out_error).set(code, msg);
    }
}

/// Build observation rows from three parallel arrays
///
/// A blank sample size blanks the whole row.
fn build_observations(
    doses: &[f64],
    responses: &[f64],
    sample_sizes: &[f64],
) -> Result<Vec<DoseResponseObservation>, CalcError> {
    if doses.len() != responses.len() {
        return Err(CalcError::DimensionMismatch {
            left: "doses",
            left_len: doses.len(),
            right: "responses",
            right_len: responses.len(),
        });
    }
    if doses.len() != sample_sizes.len() {
        return Err(CalcError::DimensionMismatch {
            left: "doses",
            left_len: doses.len(),
            right: "sample_sizes",
            right_len: sample_sizes.len(),
        });
    }

    doses
        .iter()
        .zip(responses)
        .zip(sample_sizes)
        .map(|((&dose, &response), &n)| {
            if n.is_nan() {
                return Ok(DoseResponseObservation::new(f64::NAN, f64::NAN, 0));
            }
            if n < 1.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
                return Err(CalcError::InvalidValue {
                    field: "sample_size",
                    message: format!("{} (must be a positive whole number)", n),
                });
            }
            Ok(DoseResponseObservation::new(dose, response, n as u32))
        })
        .collect()
}

/// Run a probit analysis
///
/// # Arguments
/// * `doses` - Doses, one per row
/// * `responses` - Response percentages in [0, 100]
/// * `sample_sizes` - Group sizes (whole numbers)
/// * `options` - Analysis options
/// * `out_result` - Output result
/// * `out_error` - Error information
///
/// # Safety
/// - the three arrays must be valid DataArray structs
/// - `out_result` must be a valid pointer
/// - `out_error` must be a valid pointer or null
///
/// # Returns
/// `true` on success, `false` on error (check `out_error` for details)
#[no_mangle]
pub unsafe extern "C" fn labcalc_probit_fit(
    doses: DataArray,
    responses: DataArray,
    sample_sizes: DataArray,
    options: ProbitOptionsFFI,
    out_result: *mut ProbitResultFFI,
    out_error: *mut LabcalcError,
) -> bool {
    if !out_error.is_null() {
        *out_error = LabcalcError::success();
    }

    if out_result.is_null() {
        set_error(out_error, ErrorCode::InvalidInput, "out_result is NULL");
        return false;
    }

    let Some(opts) = options.to_options() else {
        set_error(out_error, ErrorCode::InvalidInput, "Unknown option code");
        return false;
    };

    let dose_vec = doses.to_vec();
    let response_vec = responses.to_vec();
    let size_vec = sample_sizes.to_vec();

    // Call the core function with panic catching
    let fit_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let observations = build_observations(&dose_vec, &response_vec, &size_vec)?;
        fit_probit(&observations, &opts)
    }));

    let fit_result = match fit_result {
        Ok(r) => r,
        Err(_) => {
            warn!("panic inside probit fit");
            set_error(out_error, ErrorCode::InternalError, "Internal panic in probit fit");
            return false;
        }
    };

    match fit_result {
        Ok(result) => {
            *out_result = ProbitResultFFI {
                intercept: result.intercept,
                slope: result.slope,
                ld50: result.ld50,
                log_ld50: result.log_ld50,
                log_ld50_std_error: result.log_ld50_std_error,
                ci_lower: result.confidence_interval.lower,
                ci_upper: result.confidence_interval.upper,
                confidence_level: result.confidence_interval.level,
                chi_square: result.chi_square,
                degrees_of_freedom: result.degrees_of_freedom,
                chi_square_critical: result.chi_square_critical,
                chi_square_p_value: result.chi_square_p_value,
                adequate_fit: result.adequate_fit,
                heterogeneity: result.heterogeneity,
                classification: result.classification.rank(),
                n_observations: result.n_observations,
                n_excluded: result.n_excluded,
            };
            true
        }
        Err(e) => {
            set_error(out_error, error_to_code(&e), &e.to_string());
            false
        }
    }
}

/// Probit (normal quantile + 5) of a proportion
///
/// # Safety
/// - `out_probit` must be a valid pointer
/// - `out_error` must be a valid pointer or null
#[no_mangle]
pub unsafe extern "C" fn labcalc_probit_transform(
    p: f64,
    out_probit: *mut f64,
    out_error: *mut LabcalcError,
) -> bool {
    if !out_error.is_null() {
        *out_error = LabcalcError::success();
    }

    if out_probit.is_null() {
        set_error(out_error, ErrorCode::InvalidInput, "out_probit is NULL");
        return false;
    }

    match probit(p) {
        Ok(value) => {
            *out_probit = value;
            true
        }
        Err(e) => {
            set_error(out_error, error_to_code(&e), &e.to_string());
            false
        }
    }
}

/// Toxicity class rank for an LD50 in mg/kg (0 = extremely toxic, 4 = practically non-toxic)
///
/// # Returns
/// The rank, or -1 if `ld50` is not a positive number
#[no_mangle]
pub extern "C" fn labcalc_classify_ld50(ld50: f64) -> i32 {
    if ld50.is_nan() || ld50 <= 0.0 {
        return -1;
    }
    ToxicityClass::from_ld50(ld50).rank() as i32
}

/// Tabulated 95% chi-square critical value
///
/// # Returns
/// The critical value, or NaN if `df` is 0
#[no_mangle]
pub extern "C" fn labcalc_chi_square_critical(df: usize) -> f64 {
    if df == 0 {
        return f64::NAN;
    }
    chi_square_critical(df)
}

/// Trapezoidal AUC of a concentration-time profile
///
/// # Safety
/// - `times` and `concentrations` must be valid DataArray structs
/// - `out_auc` must be a valid pointer
/// - `out_error` must be a valid pointer or null
#[no_mangle]
pub unsafe extern "C" fn labcalc_auc_trapezoidal(
    times: DataArray,
    concentrations: DataArray,
    log_down: bool,
    out_auc: *mut f64,
    out_error: *mut LabcalcError,
) -> bool {
    if !out_error.is_null() {
        *out_error = LabcalcError::success();
    }

    if out_auc.is_null() {
        set_error(out_error, ErrorCode::InvalidInput, "out_auc is NULL");
        return false;
    }

    let method = if log_down {
        AucMethod::LinearUpLogDown
    } else {
        AucMethod::Linear
    };

    match auc_trapezoidal(&times.to_vec(), &concentrations.to_vec(), method) {
        Ok(auc) => {
            *out_auc = auc;
            true
        }
        Err(e) => {
            set_error(out_error, error_to_code(&e), &e.to_string());
            false
        }
    }
}

/// Evaluate a JSON calculator request and return the JSON result
///
/// The request is a `Calculation` object tagged by `"calculator"`; the result is
/// the matching `CalculationOutput`.
///
/// # Safety
/// - `request` must be a valid NUL-terminated UTF-8 string
/// - `out_json` must be a valid pointer; on success it receives a string that
///   must be released with `labcalc_free_string`
/// - `out_error` must be a valid pointer or null
#[no_mangle]
pub unsafe extern "C" fn labcalc_calculate_json(
    request: *const libc::c_char,
    out_json: *mut *mut libc::c_char,
    out_error: *mut LabcalcError,
) -> bool {
    if !out_error.is_null() {
        *out_error = LabcalcError::success();
    }

    if request.is_null() || out_json.is_null() {
        set_error(out_error, ErrorCode::InvalidInput, "request or out_json is NULL");
        return false;
    }
    *out_json = std::ptr::null_mut();

    let response = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        calculate_json(CStr::from_ptr(request))
    }));

    let json = match response {
        Ok(Ok(json)) => json,
        Ok(Err(e)) => {
            set_error(out_error, error_to_code(&e), &e.to_string());
            return false;
        }
        Err(_) => {
            warn!("panic inside JSON calculation");
            set_error(out_error, ErrorCode::InternalError, "Internal panic in calculation");
            return false;
        }
    };

    let bytes = json.as_bytes();
    let ptr = libc::malloc(bytes.len() + 1) as *mut libc::c_char;
    if ptr.is_null() {
        set_error(out_error, ErrorCode::AllocationFailure, "Failed to allocate result string");
        return false;
    }
    std::ptr::copy_nonoverlapping(bytes.as_ptr() as *const libc::c_char, ptr, bytes.len());
    *ptr.add(bytes.len()) = 0;
    *out_json = ptr;
    true
}

fn calculate_json(request: &CStr) -> Result<String, CalcError> {
    let text = request
        .to_str()
        .map_err(|e| CalcError::Serialization(e.to_string()))?;
    let calculation: Calculation =
        serde_json::from_str(text).map_err(|e| CalcError::Serialization(e.to_string()))?;
    let output = calculation.evaluate()?;
    serde_json::to_string(&output).map_err(|e| CalcError::Serialization(e.to_string()))
}

/// Free a string returned by labcalc_calculate_json
///
/// # Safety
/// `s` must be NULL or a pointer previously returned through `out_json`
#[no_mangle]
pub unsafe extern "C" fn labcalc_free_string(s: *mut libc::c_char) {
    if !s.is_null() {
        libc::free(s as *mut libc::c_void);
    }
}

/// Get library version string
#[no_mangle]
pub extern "C" fn labcalc_version() -> *const libc::c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const libc::c_char
}

/// Install the stderr log formatter (filter from `LABCALC_LOG`)
///
/// # Returns
/// `true` if this call installed the subscriber
#[no_mangle]
pub extern "C" fn labcalc_init_logging() -> bool {
    logging::init()
}
