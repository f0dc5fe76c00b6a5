//! # Torque/Stress Engine
//!
//! Conventional torque-to-preload estimate, screw stress, safety factor and
//! risk classification.
//!
//! ## Formulas
//!
//! - Conventional preload: `P = T / (K · d)` (T in N·cm, d in cm)
//! - Stress: `σ = P / A` with `A = π/4 · d²` (d in mm, σ in MPa)
//! - Tensile stress diameter: `d_t = d - 0.9382 · p` (mm)
//! - Safety factor: `SF = yield / σ`
//!
//! The stress area ignores thread-root stress concentration. Comparative
//! figures depend on this simplified area, so it is kept as is.
//!
//! ## Example
//!
//! ```rust
//! use preload_core::calculations::torque::{assess_stress, estimate_conventional_preload, RiskLevel};
//!
//! let preload = estimate_conventional_preload(35.0, 0.04, 0.16, 0.2, 0.2).unwrap();
//! assert!((preload - 875.0).abs() < 1e-9);
//!
//! // 2.0 mm screw, 0.4 mm pitch: tensile stress diameter 1.62472 mm
//! let assessment = assess_stress(preload, 1.62472, 880.0).unwrap();
//! assert_eq!(assessment.risk_level, RiskLevel::Medium);
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::calculations::preload::{
    calculate_preload_range, preload_uncertainty_percent, PreloadMethod, PreloadRange,
    CONVENTIONAL_DRY_UNCERTAINTY_PERCENT, CONVENTIONAL_LUBRICATED_UNCERTAINTY_PERCENT,
};
use crate::errors::{finite_result, require_finite, CalcError, CalcResult};
use crate::units::{Newtons, SqMm};

/// Safety factor at or above which risk is Low
pub const LOW_RISK_MIN_SAFETY_FACTOR: f64 = 2.5;

/// Safety factor at or above which risk is Medium (below it: High)
pub const MEDIUM_RISK_MIN_SAFETY_FACTOR: f64 = 1.5;

/// Pitch coefficient of the ISO tensile stress diameter, `d - 0.9382·p`
pub const TENSILE_DIAMETER_PITCH_COEFFICIENT: f64 = 0.9382;

fn require_positive(field: &str, value: f64) -> CalcResult<()> {
    require_finite(field, value)?;
    if value <= 0.0 {
        return Err(CalcError::validation(field, value.to_string(), "Value must be greater than zero"));
    }
    Ok(())
}

fn require_unit_interval(field: &str, value: f64) -> CalcResult<()> {
    require_positive(field, value)?;
    if value > 1.0 {
        return Err(CalcError::validation(field, value.to_string(), "Value must be in (0, 1]"));
    }
    Ok(())
}

/// Preload estimated from tightening torque with the K-factor relation.
///
/// # Arguments
///
/// * `torque` - Tightening torque (N·cm)
/// * `thread_pitch` - Thread pitch (cm); validated, not used by the relation
/// * `coefficient_of_friction` - Thread friction μ in (0, 1]; validated, folded into K
/// * `k_factor` - Nut factor K in (0, 1]
/// * `screw_diameter` - Nominal screw diameter (cm)
pub fn estimate_conventional_preload(
    torque: f64,
    thread_pitch: f64,
    coefficient_of_friction: f64,
    k_factor: f64,
    screw_diameter: f64,
) -> CalcResult<f64> {
    require_positive("torque_ncm", torque)?;
    require_positive("thread_pitch_cm", thread_pitch)?;
    require_unit_interval("coefficient_of_friction", coefficient_of_friction)?;
    require_unit_interval("k_factor", k_factor)?;
    require_positive("screw_diameter_cm", screw_diameter)?;

    let preload = finite_result("conventional preload", torque / (k_factor * screw_diameter))?;
    tracing::debug!(torque, k_factor, screw_diameter, preload, "estimated conventional preload");
    Ok(preload)
}

/// Cross-sectional area `π/4 · d²` (mm²).
pub fn circular_area_mm2(diameter_mm: f64) -> CalcResult<f64> {
    require_positive("minor_diameter_mm", diameter_mm)?;
    Ok(PI / 4.0 * diameter_mm * diameter_mm)
}

/// Axial stress in the screw shank (MPa).
pub fn calculate_stress(preload_newtons: f64, screw_minor_diameter_mm: f64) -> CalcResult<f64> {
    require_finite("preload_n", preload_newtons)?;
    if preload_newtons < 0.0 {
        return Err(CalcError::validation(
            "preload_n",
            preload_newtons.to_string(),
            "Preload cannot be negative",
        ));
    }
    let area = circular_area_mm2(screw_minor_diameter_mm)?;
    let stress = Newtons(preload_newtons) / SqMm(area);
    finite_result("stress", stress.value())
}

/// Effective tensile stress diameter `d - 0.9382·p` (mm).
pub fn tensile_stress_diameter_mm(nominal_diameter_mm: f64, thread_pitch_mm: f64) -> CalcResult<f64> {
    require_positive("nominal_diameter_mm", nominal_diameter_mm)?;
    require_positive("thread_pitch_mm", thread_pitch_mm)?;

    let effective = nominal_diameter_mm - TENSILE_DIAMETER_PITCH_COEFFICIENT * thread_pitch_mm;
    if effective <= 0.0 {
        return Err(CalcError::domain(
            "tensile stress diameter",
            format!(
                "pitch {} mm is too coarse for a {} mm screw",
                thread_pitch_mm, nominal_diameter_mm
            ),
        ));
    }
    Ok(effective)
}

/// Tensile stress area `π/4 · (d - 0.9382·p)²` (mm²).
pub fn tensile_stress_area_mm2(nominal_diameter_mm: f64, thread_pitch_mm: f64) -> CalcResult<f64> {
    circular_area_mm2(tensile_stress_diameter_mm(nominal_diameter_mm, thread_pitch_mm)?)
}

/// Ratio of yield strength to stress.
pub fn calculate_safety_factor(yield_strength_mpa: f64, stress_mpa: f64) -> CalcResult<f64> {
    require_positive("yield_strength_mpa", yield_strength_mpa)?;
    require_finite("stress_mpa", stress_mpa)?;
    if stress_mpa <= 0.0 {
        return Err(CalcError::domain(
            "safety factor",
            format!("stress must be positive to divide by, got {}", stress_mpa),
        ));
    }
    finite_result("safety factor", yield_strength_mpa / stress_mpa)
}

/// Discrete failure risk derived from the safety factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    pub fn display_name(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// Clinical recommendation shown next to the level
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Safe for use with standard protocol",
            RiskLevel::Medium => "Safe for use, but consider more frequent check-ups",
            RiskLevel::High => "Not recommended, consider alternative implant system or reduced loading",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Classify a safety factor. Lower bounds are inclusive; NaN maps to High.
///
/// Expects the output of [`calculate_safety_factor`], which is always
/// positive and finite. A negative factor is a caller bug and trips a debug
/// assertion.
pub fn classify_risk(safety_factor: f64) -> RiskLevel {
    debug_assert!(
        safety_factor >= 0.0 || safety_factor.is_nan(),
        "negative safety factor {}",
        safety_factor
    );
    if safety_factor >= LOW_RISK_MIN_SAFETY_FACTOR {
        RiskLevel::Low
    } else if safety_factor >= MEDIUM_RISK_MIN_SAFETY_FACTOR {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

/// Stress, safety factor and risk for one preload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressAssessment {
    pub stress_mpa: f64,
    pub safety_factor: f64,
    pub risk_level: RiskLevel,
}

impl StressAssessment {
    /// Check if stress stays below yield
    pub fn below_yield(&self) -> bool {
        self.safety_factor > 1.0
    }
}

/// Stress → safety factor → risk in one call.
pub fn assess_stress(
    preload_newtons: f64,
    screw_minor_diameter_mm: f64,
    yield_strength_mpa: f64,
) -> CalcResult<StressAssessment> {
    let stress_mpa = calculate_stress(preload_newtons, screw_minor_diameter_mm)?;
    let safety_factor = calculate_safety_factor(yield_strength_mpa, stress_mpa)?;
    let risk_level = classify_risk(safety_factor);

    tracing::debug!(stress_mpa, safety_factor, risk = %risk_level, "assessed screw stress");
    Ok(StressAssessment {
        stress_mpa,
        safety_factor,
        risk_level,
    })
}

/// Manufacturer torque tolerance band (N·cm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorqueRange {
    pub min: f64,
    pub max: f64,
}

impl TorqueRange {
    pub fn contains(&self, torque_ncm: f64) -> bool {
        self.min <= torque_ncm && torque_ncm <= self.max
    }
}

/// Achievable torque range around a nominal value: ±25% lubricated, ±35% dry.
pub fn calculate_torque_range(nominal_torque: f64, lubricated: bool) -> CalcResult<TorqueRange> {
    require_positive("nominal_torque_ncm", nominal_torque)?;
    let percent = if lubricated {
        CONVENTIONAL_LUBRICATED_UNCERTAINTY_PERCENT
    } else {
        CONVENTIONAL_DRY_UNCERTAINTY_PERCENT
    };
    let factor = percent / 100.0;
    Ok(TorqueRange {
        min: nominal_torque * (1.0 - factor),
        max: nominal_torque * (1.0 + factor),
    })
}

/// Conventional (K-factor) preload request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConventionalPreloadInput {
    pub torque_ncm: f64,
    pub thread_pitch_cm: f64,
    pub coefficient_of_friction: f64,
    pub k_factor: f64,
    pub screw_diameter_cm: f64,
    #[serde(default)]
    pub lubricated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConventionalPreloadResult {
    pub preload_n: f64,
    pub uncertainty_percent: f64,
    pub range: PreloadRange,
}

impl ConventionalPreloadInput {
    pub fn calculate(&self) -> CalcResult<ConventionalPreloadResult> {
        let preload_n = estimate_conventional_preload(
            self.torque_ncm,
            self.thread_pitch_cm,
            self.coefficient_of_friction,
            self.k_factor,
            self.screw_diameter_cm,
        )?;
        let uncertainty_percent = preload_uncertainty_percent(PreloadMethod::Conventional, self.lubricated);
        Ok(ConventionalPreloadResult {
            preload_n,
            uncertainty_percent,
            range: calculate_preload_range(preload_n, uncertainty_percent)?,
        })
    }
}

/// Diameter the stress is taken over.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressDiameter {
    /// A known minor (root) diameter
    Minor { diameter_mm: f64 },
    /// Tensile stress diameter derived from nominal diameter and pitch
    Thread {
        nominal_diameter_mm: f64,
        thread_pitch_mm: f64,
    },
}

impl StressDiameter {
    pub fn resolve_mm(&self) -> CalcResult<f64> {
        match *self {
            StressDiameter::Minor { diameter_mm } => {
                require_positive("minor_diameter_mm", diameter_mm)?;
                Ok(diameter_mm)
            }
            StressDiameter::Thread {
                nominal_diameter_mm,
                thread_pitch_mm,
            } => tensile_stress_diameter_mm(nominal_diameter_mm, thread_pitch_mm),
        }
    }
}

/// Stress assessment request.
///
/// ## JSON Example
///
/// ```json
/// {
///   "preload_n": 875.0,
///   "diameter": { "thread": { "nominal_diameter_mm": 2.0, "thread_pitch_mm": 0.4 } },
///   "yield_strength_mpa": 880.0
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressInput {
    pub preload_n: f64,
    pub diameter: StressDiameter,
    pub yield_strength_mpa: f64,
}

impl StressInput {
    pub fn calculate(&self) -> CalcResult<StressAssessment> {
        assess_stress(self.preload_n, self.diameter.resolve_mm()?, self.yield_strength_mpa)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_preload() {
        // 35 N·cm / (0.2 * 0.2 cm) = 875 N
        let preload = estimate_conventional_preload(35.0, 0.04, 0.16, 0.2, 0.2).unwrap();
        assert!((preload - 875.0).abs() < 1e-9);
    }

    #[test]
    fn test_conventional_preload_validation() {
        assert!(estimate_conventional_preload(0.0, 0.04, 0.16, 0.2, 0.2).unwrap_err().is_validation());
        assert!(estimate_conventional_preload(35.0, 0.0, 0.16, 0.2, 0.2).unwrap_err().is_validation());
        assert!(estimate_conventional_preload(35.0, 0.04, 1.2, 0.2, 0.2).unwrap_err().is_validation());
        assert!(estimate_conventional_preload(35.0, 0.04, 0.16, 0.0, 0.2).unwrap_err().is_validation());
        assert!(estimate_conventional_preload(35.0, 0.04, 0.16, 1.5, 0.2).unwrap_err().is_validation());
        assert!(estimate_conventional_preload(35.0, 0.04, 0.16, 0.2, -0.2).unwrap_err().is_validation());
        // Upper bound of (0, 1] is inclusive
        assert!(estimate_conventional_preload(35.0, 0.04, 1.0, 1.0, 0.2).is_ok());
    }

    #[test]
    fn test_stress_simplified_area() {
        // A = π/4 · 2² = π mm²
        let stress = calculate_stress(PI * 100.0, 2.0).unwrap();
        assert!((stress - 100.0).abs() < 1e-9);
        assert!(calculate_stress(100.0, 0.0).unwrap_err().is_validation());
        assert!(calculate_stress(-1.0, 2.0).unwrap_err().is_validation());
    }

    #[test]
    fn test_tensile_stress_area() {
        // d = 2.0 mm, p = 0.4 mm → d_t = 1.62472, A = 2.0733 mm²
        let area = tensile_stress_area_mm2(2.0, 0.4).unwrap();
        assert!((area - 2.0733).abs() < 1e-3);

        let err = tensile_stress_diameter_mm(0.3, 0.4).unwrap_err();
        assert!(err.is_domain());
    }

    #[test]
    fn test_safety_factor() {
        assert!((calculate_safety_factor(880.0, 440.0).unwrap() - 2.0).abs() < 1e-12);
        assert!(calculate_safety_factor(880.0, 0.0).unwrap_err().is_domain());
        assert!(calculate_safety_factor(880.0, -3.0).unwrap_err().is_domain());
        assert!(calculate_safety_factor(0.0, 100.0).unwrap_err().is_validation());
    }

    #[test]
    fn test_risk_thresholds() {
        assert_eq!(classify_risk(2.5), RiskLevel::Low);
        assert_eq!(classify_risk(2.4999), RiskLevel::Medium);
        assert_eq!(classify_risk(1.5), RiskLevel::Medium);
        assert_eq!(classify_risk(1.4999), RiskLevel::High);
        assert_eq!(classify_risk(10.0), RiskLevel::Low);
        assert_eq!(classify_risk(0.0), RiskLevel::High);
        assert_eq!(classify_risk(f64::NAN), RiskLevel::High);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "negative safety factor")]
    fn test_negative_safety_factor_is_a_bug() {
        classify_risk(-1.0);
    }

    #[test]
    fn test_assess_stress() {
        let assessment = assess_stress(400.0, 1.62472, 880.0).unwrap();
        // 400 / 2.0733 = 192.9 MPa, SF = 4.56
        assert!((assessment.stress_mpa - 192.9).abs() < 0.1);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert!(assessment.below_yield());

        assert!(assess_stress(0.0, 2.0, 880.0).unwrap_err().is_domain());
    }

    #[test]
    fn test_torque_range() {
        let dry = calculate_torque_range(35.0, false).unwrap();
        assert!((dry.min - 22.75).abs() < 1e-9);
        assert!((dry.max - 47.25).abs() < 1e-9);

        let lube = calculate_torque_range(35.0, true).unwrap();
        assert!((lube.min - 26.25).abs() < 1e-9);
        assert!(lube.contains(35.0));
    }

    #[test]
    fn test_risk_serialization() {
        let json = serde_json::to_string(&RiskLevel::Medium).unwrap();
        assert_eq!(json, "\"Medium\"");
        assert!(RiskLevel::High.recommendation().starts_with("Not recommended"));
    }

    #[test]
    fn test_conventional_input() {
        let input = ConventionalPreloadInput {
            torque_ncm: 35.0,
            thread_pitch_cm: 0.04,
            coefficient_of_friction: 0.16,
            k_factor: 0.2,
            screw_diameter_cm: 0.2,
            lubricated: true,
        };
        let result = input.calculate().unwrap();
        assert!((result.preload_n - 875.0).abs() < 1e-9);
        assert_eq!(result.uncertainty_percent, 25.0);
        assert!((result.range.min_n - 656.25).abs() < 1e-9);
    }

    #[test]
    fn test_stress_input_diameters() {
        let json = r#"{
            "preload_n": 875.0,
            "diameter": {"thread": {"nominal_diameter_mm": 2.0, "thread_pitch_mm": 0.4}},
            "yield_strength_mpa": 880.0
        }"#;
        let input: StressInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.calculate().unwrap().risk_level, RiskLevel::Medium);

        let minor = StressInput {
            diameter: StressDiameter::Minor { diameter_mm: 2.0 },
            ..input
        };
        assert_eq!(minor.calculate().unwrap().risk_level, RiskLevel::Low);

        let coarse = StressDiameter::Thread {
            nominal_diameter_mm: 1.0,
            thread_pitch_mm: 1.2,
        };
        assert!(coarse.resolve_mm().unwrap_err().is_domain());
    }
}
