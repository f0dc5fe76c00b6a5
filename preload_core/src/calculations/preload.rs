//! # Preload Engine
//!
//! Screw preload from tightening/removal torque per the Wadhwani-Hess model.
//!
//! ## Formulas
//!
//! - Preload (Equation 3): `P = (Tt - Tr) · π / p`
//! - Final torque (Equation 6): `Ti = (p · Tt · P_desired) / (π · (Tt - Tr))`
//! - Final torque, ratio form: `Ti = Tt · (P_desired / P_initial)`
//!
//! where `Tt` is tightening torque (N·cm), `Tr` is removal torque (N·cm),
//! `p` is thread pitch (cm) and `P` is preload (N).
//!
//! ## Example
//!
//! ```rust
//! use preload_core::calculations::preload::{calculate_final_torque, calculate_preload};
//!
//! let initial = calculate_preload(25.0, 21.4, 0.04).unwrap();
//! let final_torque = calculate_final_torque(25.0, 21.4, initial, 400.0, 0.04).unwrap();
//! assert!(final_torque > 25.0);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::catalog::ScrewSpec;
use crate::errors::{finite_result, require_finite, CalcError, CalcResult};

/// Published preload uncertainty of the Wadhwani-Hess method (percent)
pub const WADHWANI_HESS_UNCERTAINTY_PERCENT: f64 = 9.0;

/// Conventional torque-method uncertainty for lubricated screws (percent)
pub const CONVENTIONAL_LUBRICATED_UNCERTAINTY_PERCENT: f64 = 25.0;

/// Conventional torque-method uncertainty for dry screws (percent)
pub const CONVENTIONAL_DRY_UNCERTAINTY_PERCENT: f64 = 35.0;

/// A tightening/removal torque pair measured on one screw.
///
/// ## JSON Example
///
/// ```json
/// {
///   "tightening_torque_ncm": 35.0,
///   "removal_torque_ncm": 29.5,
///   "thread_pitch_cm": 0.04
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorqueMeasurement {
    /// Torque applied to seat the screw (N·cm)
    pub tightening_torque_ncm: f64,

    /// Torque measured when first loosening the screw (N·cm)
    pub removal_torque_ncm: f64,

    /// Axial distance between adjacent threads (cm)
    pub thread_pitch_cm: f64,
}

impl TorqueMeasurement {
    /// Create a validated measurement.
    pub fn new(tightening_torque_ncm: f64, removal_torque_ncm: f64, thread_pitch_cm: f64) -> CalcResult<Self> {
        let measurement = TorqueMeasurement {
            tightening_torque_ncm,
            removal_torque_ncm,
            thread_pitch_cm,
        };
        measurement.validate()?;
        Ok(measurement)
    }

    /// Build a measurement for a catalog screw; the pitch is taken from the
    /// screw record and converted from mm to cm.
    pub fn from_screw(screw: &ScrewSpec, tightening_torque_ncm: f64, removal_torque_ncm: f64) -> CalcResult<Self> {
        Self::new(tightening_torque_ncm, removal_torque_ncm, screw.thread_pitch_cm())
    }

    /// Validate input parameters.
    ///
    /// Checks run in a fixed order so the reported field is deterministic.
    pub fn validate(&self) -> CalcResult<()> {
        require_finite("tightening_torque_ncm", self.tightening_torque_ncm)?;
        require_finite("removal_torque_ncm", self.removal_torque_ncm)?;
        require_finite("thread_pitch_cm", self.thread_pitch_cm)?;

        if self.tightening_torque_ncm <= 0.0 {
            return Err(CalcError::validation(
                "tightening_torque_ncm",
                self.tightening_torque_ncm.to_string(),
                "Tightening torque must be greater than zero",
            ));
        }
        if self.thread_pitch_cm <= 0.0 {
            return Err(CalcError::validation(
                "thread_pitch_cm",
                self.thread_pitch_cm.to_string(),
                "Thread pitch must be greater than zero",
            ));
        }
        if self.removal_torque_ncm < 0.0 {
            return Err(CalcError::validation(
                "removal_torque_ncm",
                self.removal_torque_ncm.to_string(),
                "Removal torque cannot be negative",
            ));
        }
        if self.removal_torque_ncm >= self.tightening_torque_ncm {
            return Err(CalcError::validation(
                "removal_torque_ncm",
                self.removal_torque_ncm.to_string(),
                format!(
                    "Removal torque must be less than tightening torque ({})",
                    self.tightening_torque_ncm
                ),
            ));
        }
        Ok(())
    }

    /// Torque difference `Tt - Tr` (N·cm)
    pub fn torque_difference_ncm(&self) -> f64 {
        self.tightening_torque_ncm - self.removal_torque_ncm
    }

    /// Preload for this measurement.
    pub fn preload(&self) -> CalcResult<PreloadResult> {
        let preload_n = calculate_preload(
            self.tightening_torque_ncm,
            self.removal_torque_ncm,
            self.thread_pitch_cm,
        )?;
        Ok(PreloadResult { preload_n })
    }
}

/// Result of the preload formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreloadResult {
    /// Axial clamping force (N)
    pub preload_n: f64,
}

/// Which form of the final torque equation to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalTorqueMethod {
    /// Equation 6, evaluated from the torque pair and pitch
    #[default]
    Exact,
    /// `Tt · (P_desired / P_initial)`
    Ratio,
}

/// Request for the torque needed to reach a target preload.
///
/// `initial_preload_n` is expected to come from [`calculate_preload`] on the
/// same measurement; it is not cross-checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalTorqueRequest {
    pub measurement: TorqueMeasurement,
    pub initial_preload_n: f64,
    pub desired_preload_n: f64,
    #[serde(default)]
    pub method: FinalTorqueMethod,
}

impl FinalTorqueRequest {
    /// Build a request whose initial preload is derived from the measurement,
    /// so the two can never disagree.
    pub fn from_measurement(
        measurement: TorqueMeasurement,
        desired_preload_n: f64,
        method: FinalTorqueMethod,
    ) -> CalcResult<Self> {
        let initial = measurement.preload()?;
        Ok(FinalTorqueRequest {
            measurement,
            initial_preload_n: initial.preload_n,
            desired_preload_n,
            method,
        })
    }

    pub fn calculate(&self) -> CalcResult<FinalTorqueResult> {
        let m = &self.measurement;
        let final_torque_ncm = calculate_final_torque_with(
            self.method,
            m.tightening_torque_ncm,
            m.removal_torque_ncm,
            self.initial_preload_n,
            self.desired_preload_n,
            m.thread_pitch_cm,
        )?;
        Ok(FinalTorqueResult {
            final_torque_ncm,
            torque_increase_ncm: final_torque_ncm - m.tightening_torque_ncm,
            preload_ratio: self.desired_preload_n / self.initial_preload_n,
        })
    }
}

/// Result of a final torque calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalTorqueResult {
    /// Tightening torque required for the desired preload (N·cm)
    pub final_torque_ncm: f64,
    /// Change relative to the initial tightening torque (N·cm)
    pub torque_increase_ncm: f64,
    /// Desired preload / initial preload
    pub preload_ratio: f64,
}

/// Preload from a tightening/removal torque pair (Equation 3).
///
/// # Arguments
///
/// * `tightening_torque` - Initial tightening torque (N·cm), > 0
/// * `removal_torque` - Measured removal torque (N·cm), ≥ 0 and < tightening
/// * `thread_pitch` - Thread pitch (cm), > 0
///
/// # Returns
///
/// * `Ok(f64)` - Preload in newtons, unrounded
/// * `Err(CalcError::Validation)` - If any precondition fails
pub fn calculate_preload(tightening_torque: f64, removal_torque: f64, thread_pitch: f64) -> CalcResult<f64> {
    let measurement = TorqueMeasurement {
        tightening_torque_ncm: tightening_torque,
        removal_torque_ncm: removal_torque,
        thread_pitch_cm: thread_pitch,
    };
    measurement.validate()?;

    let preload = finite_result(
        "preload",
        (tightening_torque - removal_torque) * PI / thread_pitch,
    )?;

    tracing::debug!(tightening_torque, removal_torque, thread_pitch, preload, "calculated preload");
    Ok(preload)
}

/// Final tightening torque for a desired preload, Equation 6.
///
/// See [`calculate_final_torque_with`] for the error contract.
pub fn calculate_final_torque(
    initial_tightening_torque: f64,
    initial_removal_torque: f64,
    initial_preload: f64,
    desired_preload: f64,
    thread_pitch: f64,
) -> CalcResult<f64> {
    calculate_final_torque_with(
        FinalTorqueMethod::Exact,
        initial_tightening_torque,
        initial_removal_torque,
        initial_preload,
        desired_preload,
        thread_pitch,
    )
}

/// Final tightening torque for a desired preload using the chosen method.
///
/// Both methods reject the same inputs:
///
/// * `Err(CalcError::Validation)` - measurement preconditions, non-positive
///   desired preload, negative initial preload
/// * `Err(CalcError::Domain)` - initial preload of exactly zero
pub fn calculate_final_torque_with(
    method: FinalTorqueMethod,
    initial_tightening_torque: f64,
    initial_removal_torque: f64,
    initial_preload: f64,
    desired_preload: f64,
    thread_pitch: f64,
) -> CalcResult<f64> {
    let measurement = TorqueMeasurement {
        tightening_torque_ncm: initial_tightening_torque,
        removal_torque_ncm: initial_removal_torque,
        thread_pitch_cm: thread_pitch,
    };
    measurement.validate()?;

    require_finite("desired_preload_n", desired_preload)?;
    if desired_preload <= 0.0 {
        return Err(CalcError::validation(
            "desired_preload_n",
            desired_preload.to_string(),
            "Desired preload must be greater than zero",
        ));
    }

    require_finite("initial_preload_n", initial_preload)?;
    if initial_preload == 0.0 {
        return Err(CalcError::domain(
            "final torque",
            "initial preload is zero, so no torque can scale it to the desired preload",
        ));
    }
    if initial_preload < 0.0 {
        return Err(CalcError::validation(
            "initial_preload_n",
            initial_preload.to_string(),
            "Initial preload cannot be negative",
        ));
    }

    let tt = initial_tightening_torque;
    let final_torque = match method {
        FinalTorqueMethod::Exact => {
            (thread_pitch * tt * desired_preload) / (PI * measurement.torque_difference_ncm())
        }
        FinalTorqueMethod::Ratio => tt * (desired_preload / initial_preload),
    };
    let final_torque = finite_result("final torque", final_torque)?;

    tracing::debug!(?method, initial_preload, desired_preload, final_torque, "calculated final torque");
    Ok(final_torque)
}

/// Self-loosening component of torque, `(Tt - Tr) / 2` (N·cm).
pub fn estimate_self_loosening(measurement: &TorqueMeasurement) -> CalcResult<f64> {
    measurement.validate()?;
    Ok(measurement.torque_difference_ncm() / 2.0)
}

/// Primary locking component of torque, `(Tt + Tr) / 2` (N·cm).
pub fn estimate_primary_locking(measurement: &TorqueMeasurement) -> CalcResult<f64> {
    measurement.validate()?;
    Ok((measurement.tightening_torque_ncm + measurement.removal_torque_ncm) / 2.0)
}

/// Preload estimation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreloadMethod {
    /// Torque-coefficient (K-factor) estimate, `P = T / (K·d)`
    Conventional,
    /// Torque-difference model, `P = (Tt - Tr)·π / p`
    WadhwaniHess,
}

impl PreloadMethod {
    pub fn display_name(&self) -> &'static str {
        match self {
            PreloadMethod::Conventional => "Conventional",
            PreloadMethod::WadhwaniHess => "Wadhwani-Hess",
        }
    }
}

impl std::fmt::Display for PreloadMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Expected preload uncertainty of a method (percent).
///
/// Lubrication only affects the conventional method.
pub fn preload_uncertainty_percent(method: PreloadMethod, lubricated: bool) -> f64 {
    match method {
        PreloadMethod::WadhwaniHess => WADHWANI_HESS_UNCERTAINTY_PERCENT,
        PreloadMethod::Conventional if lubricated => CONVENTIONAL_LUBRICATED_UNCERTAINTY_PERCENT,
        PreloadMethod::Conventional => CONVENTIONAL_DRY_UNCERTAINTY_PERCENT,
    }
}

/// Lower/upper bound pair for a preload estimate (N).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreloadRange {
    pub min_n: f64,
    pub max_n: f64,
}

impl PreloadRange {
    /// Check if a value lies within the range (bounds inclusive)
    pub fn contains(&self, preload_n: f64) -> bool {
        self.min_n <= preload_n && preload_n <= self.max_n
    }

    pub fn width_n(&self) -> f64 {
        self.max_n - self.min_n
    }
}

/// Preload range implied by an uncertainty percentage.
pub fn calculate_preload_range(preload: f64, uncertainty_percent: f64) -> CalcResult<PreloadRange> {
    require_finite("preload_n", preload)?;
    require_finite("uncertainty_percent", uncertainty_percent)?;
    if preload < 0.0 {
        return Err(CalcError::validation(
            "preload_n",
            preload.to_string(),
            "Preload cannot be negative",
        ));
    }
    if !(0.0..100.0).contains(&uncertainty_percent) {
        return Err(CalcError::validation(
            "uncertainty_percent",
            uncertainty_percent.to_string(),
            "Uncertainty must be in [0, 100)",
        ));
    }

    let factor = uncertainty_percent / 100.0;
    Ok(PreloadRange {
        min_n: preload * (1.0 - factor),
        max_n: preload * (1.0 + factor),
    })
}
