//! `#[repr(C)]` types shared with the host

use labcalc_core::{BackTransform, CriticalValue, ExtremeResponsePolicy, ProbitOptions};
use libc::c_char;

/// Status reported through `LabcalcError::code`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    InvalidInput = 1,
    InsufficientData = 2,
    DegenerateRegression = 3,
    ZeroSlope = 4,
    ProbabilityOutOfRange = 5,
    DimensionMismatch = 6,
    AllocationFailure = 7,
    SerializationError = 8,
    DoseOutOfRange = 9,
    InternalError = 99,
}

/// Capacity of `LabcalcError::message`, including the NUL terminator
pub const ERROR_MESSAGE_CAPACITY: usize = 256;

/// Out-parameter filled by every fallible `labcalc_*` call
#[repr(C)]
pub struct LabcalcError {
    pub code: ErrorCode,
    /// NUL-terminated UTF-8, truncated on a character boundary
    pub message: [c_char; ERROR_MESSAGE_CAPACITY],
}

impl LabcalcError {
    pub fn success() -> Self {
        Self {
            code: ErrorCode::Success,
            message: [0; ERROR_MESSAGE_CAPACITY],
        }
    }

    /// Record a failure, keeping as much of `msg` as fits
    pub fn set(&mut self, code: ErrorCode, msg: &str) {
        self.code = code;
        let mut len = msg.len().min(ERROR_MESSAGE_CAPACITY - 1);
        while !msg.is_char_boundary(len) {
            len -= 1;
        }
        for (slot, &byte) in self.message.iter_mut().zip(&msg.as_bytes()[..len]) {
            *slot = byte as c_char;
        }
        self.message[len] = 0;
    }

    /// The stored message as a Rust string
    pub fn message(&self) -> String {
        let bytes: Vec<u8> = self
            .message
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// One column of widget input
///
/// `validity` is an optional packed bitmap, least significant bit first; a
/// cleared bit marks a blank field. A null bitmap means every field was
/// filled in.
#[repr(C)]
pub struct DataArray {
    pub data: *const f64,
    pub validity: *const u8,
    pub len: usize,
}

impl DataArray {
    /// Field `i`, or `None` when it was left blank
    ///
    /// # Safety
    /// `i < len`, `data` points at `len` values and a non-null `validity`
    /// covers `len` bits.
    pub unsafe fn get(&self, i: usize) -> Option<f64> {
        let filled = self.validity.is_null() || *self.validity.add(i / 8) & (1 << (i % 8)) != 0;
        filled.then(|| *self.data.add(i))
    }

    /// Copy the column out, blanks as NaN; a null `data` pointer reads as empty
    ///
    /// # Safety
    /// Same as [`DataArray::get`] for every index below `len`.
    pub unsafe fn to_vec(&self) -> Vec<f64> {
        if self.data.is_null() {
            return Vec::new();
        }
        (0..self.len)
            .map(|i| self.get(i).unwrap_or(f64::NAN))
            .collect()
    }
}

/// Extreme response policy codes
pub const EXTREME_EXCLUDE: u8 = 0;
pub const EXTREME_CORRECT: u8 = 1;
pub const EXTREME_REJECT: u8 = 2;

/// Critical value codes
pub const CRITICAL_FIXED: u8 = 0;
pub const CRITICAL_NORMAL: u8 = 1;
pub const CRITICAL_STUDENT_T: u8 = 2;

/// Options for probit analysis
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ProbitOptionsFFI {
    /// EXTREME_EXCLUDE, EXTREME_CORRECT or EXTREME_REJECT
    pub extreme_responses: u8,
    /// Use the logistic back-transform for goodness-of-fit
    pub logistic_back_transform: bool,
    /// CRITICAL_FIXED, CRITICAL_NORMAL or CRITICAL_STUDENT_T
    pub critical_value_kind: u8,
    /// Multiplier used with CRITICAL_FIXED
    pub fixed_critical_value: f64,
    pub confidence_level: f64,
}

impl Default for ProbitOptionsFFI {
    fn default() -> Self {
        Self {
            extreme_responses: EXTREME_EXCLUDE,
            logistic_back_transform: false,
            critical_value_kind: CRITICAL_FIXED,
            fixed_critical_value: 1.96,
            confidence_level: 0.95,
        }
    }
}

impl ProbitOptionsFFI {
    /// Convert to core options; `None` for an unknown code
    pub fn to_options(&self) -> Option<ProbitOptions> {
        let extreme_responses = match self.extreme_responses {
            EXTREME_EXCLUDE => ExtremeResponsePolicy::Exclude,
            EXTREME_CORRECT => ExtremeResponsePolicy::Correct,
            EXTREME_REJECT => ExtremeResponsePolicy::Reject,
            _ => return None,
        };
        let critical_value = match self.critical_value_kind {
            CRITICAL_FIXED => CriticalValue::Fixed(self.fixed_critical_value),
            CRITICAL_NORMAL => CriticalValue::Normal,
            CRITICAL_STUDENT_T => CriticalValue::StudentT,
            _ => return None,
        };
        Some(ProbitOptions {
            extreme_responses,
            back_transform: if self.logistic_back_transform {
                BackTransform::Logistic
            } else {
                BackTransform::Normal
            },
            critical_value,
            confidence_level: self.confidence_level,
        })
    }
}

/// Probit analysis result
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ProbitResultFFI {
    pub intercept: f64,
    pub slope: f64,
    pub ld50: f64,
    pub log_ld50: f64,
    pub log_ld50_std_error: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub confidence_level: f64,
    pub chi_square: f64,
    pub degrees_of_freedom: usize,
    pub chi_square_critical: f64,
    pub chi_square_p_value: f64,
    pub adequate_fit: bool,
    pub heterogeneity: f64,
    /// Toxicity class rank, 0 = extremely toxic
    pub classification: u8,
    pub n_observations: usize,
    pub n_excluded: usize,
}

impl Default for ProbitResultFFI {
    fn default() -> Self {
        Self {
            intercept: f64::NAN,
            slope: f64::NAN,
            ld50: f64::NAN,
            log_ld50: f64::NAN,
            log_ld50_std_error: f64::NAN,
            ci_lower: f64::NAN,
            ci_upper: f64::NAN,
            confidence_level: f64::NAN,
            chi_square: f64::NAN,
            degrees_of_freedom: 0,
            chi_square_critical: f64::NAN,
            chi_square_p_value: f64::NAN,
            adequate_fit: false,
            heterogeneity: f64::NAN,
            classification: 0,
            n_observations: 0,
            n_excluded: 0,
        }
    }
}
